pub mod client;
pub mod error;

// Re-export the main types
pub use client::{PublicHttpClient, RetryPolicy};
pub use error::HttpError;
