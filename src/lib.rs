pub mod accounts;
pub mod auction;
pub mod bidding;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod listing_store;
pub mod query;
