pub mod config;
pub mod database;
pub mod openapi;
pub mod request_logging;
pub mod search;
