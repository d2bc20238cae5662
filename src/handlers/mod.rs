// HTTP request handlers module
// Each handler validates its input, makes one store call and answers with JSON

pub mod account;
pub mod auth;
pub mod cart;
pub mod comments;
pub mod health;
pub mod hero_images;
pub mod images;
pub mod pages;
pub mod payment;
pub mod upload;
