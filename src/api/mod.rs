pub mod client;
pub mod envelope;
pub mod models;

pub use client::{ApiClient, PaymentApi};
pub use envelope::{normalize, ApiResponse};
