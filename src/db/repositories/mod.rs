pub mod account;
pub mod cache;
