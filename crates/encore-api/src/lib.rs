//! Remote metadata search: artwork and share links for a track.

pub mod apple;
pub mod traits;

pub use apple::{AppleMediaClient, SearchError};
pub use traits::{ArtistMatch, MetadataService, SongMatch};
