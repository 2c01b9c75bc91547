pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod scheduler;
pub mod session;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use error::EncoreError;
pub use models::{MetadataRecord, Song, TrackKey};
pub use scheduler::{Availability, CycleReport, Pause, Scheduler};
pub use session::{Activity, Button, PresenceService, PublishOutcome};
