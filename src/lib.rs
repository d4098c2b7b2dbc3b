pub mod config;
pub mod error;
pub mod identity;
pub mod review;
pub mod routes;
pub mod state;
pub mod store;
