pub mod api;
pub mod config;
pub mod error;
pub mod inventory;
pub mod orders;
pub mod persistence;
pub mod reviews;
pub mod store;
pub mod types;
