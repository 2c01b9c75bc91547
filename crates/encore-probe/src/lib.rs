//! Player probing: querying the local media player, checking which host
//! processes are alive, and turning the player's raw answers into typed
//! playback samples.

pub mod error;
pub mod identity;
pub mod model;
pub mod monitor;
pub mod platform;

use std::future::Future;

pub use error::{ParseError, ProbeError};
pub use identity::{parse_compact, parse_extended, parse_track_fields, CompactSample, RawTrackFields};
pub use model::{PlaybackSample, Track, TransportState};
pub use monitor::{HostMonitor, PgrepMonitor};
pub use platform::AppleMusicProbe;

/// Narrow interface to the media player.
///
/// Every call returns the player's raw answer; parsing happens in
/// [`identity`], never in the adapter. Tuples are fields joined by `", "` in
/// a fixed order.
pub trait PlayerProbe: Send + Sync {
    /// Cheap poll: `trackID, position, transportState`.
    fn poll_compact(&self) -> impl Future<Output = Result<String, ProbeError>> + Send;

    /// Full poll: `name, artist, album, year, duration, position, transportState`.
    fn poll_extended(&self) -> impl Future<Output = Result<String, ProbeError>> + Send;

    /// Descriptive fields of the current track, one query per text field.
    fn poll_track_fields(&self) -> impl Future<Output = Result<RawTrackFields, ProbeError>> + Send;
}
