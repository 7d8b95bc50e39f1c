pub mod account;
pub mod catalog;
pub mod order;
pub mod review;
