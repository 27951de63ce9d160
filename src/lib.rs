// Library for the binary and for integration tests

pub mod client;
pub mod config;
pub mod models;
pub mod projector;
pub mod routes;
pub mod scheduler;
pub mod store;
pub mod sync;
pub mod version;
