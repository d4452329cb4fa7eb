pub mod config;
pub mod exchange;
pub mod grid;
pub mod models;
pub mod overlap;
pub mod session;
pub mod store;
pub mod viewport;
