//! HTTP surface: router, auth extractors and handlers.

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod extract;
pub mod orders;
pub mod pagination;
pub mod reviews;
pub mod routes;
