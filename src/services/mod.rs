// Business logic services module
// This module contains the core business logic services

pub mod access_control;
pub mod accounts;
pub mod cart;
pub mod cart_state;
pub mod database;
pub mod file_storage;
pub mod password;
pub mod session_manager;
