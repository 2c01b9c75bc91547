pub mod client;
pub mod error;
pub mod types;

pub use client::AppleMediaClient;
pub use error::SearchError;
