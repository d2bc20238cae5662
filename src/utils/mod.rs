pub mod config;
pub mod cookies;
