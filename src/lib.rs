pub mod amount;
pub mod bot;
pub mod config;
pub mod constants;
pub mod database;
pub mod engine;
pub mod error;
pub mod expenses;
pub mod locks;
pub mod models;
pub mod state;
pub mod store;
pub mod users;
pub mod utils;
