pub mod api;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod funding;
