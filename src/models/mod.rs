// Data models shared by services and handlers

pub mod cart;
pub mod content;
pub mod errors;
pub mod user;
