pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod foods;
pub mod meals;
pub mod profile;
pub mod state;
