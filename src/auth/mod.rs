//! Bearer-token verification. Tokens are issued elsewhere; this service only
//! checks them and extracts the user id.

mod claims;
mod jwt;

pub use claims::{Claims, TokenKind};
pub use jwt::{AuthUser, JwtKeys};
