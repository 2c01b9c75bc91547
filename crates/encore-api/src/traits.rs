//! Trait definitions for metadata search services.
//!
//! The resolver only sees these types, so tests can swap in a scripted
//! service and production can swap storefronts or providers.

use std::future::Future;

/// A remote catalogue that can be searched for songs and artists.
pub trait MetadataService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Best song match for a free-text term. `Ok(None)` means the service
    /// affirmatively found nothing.
    fn search_song(
        &self,
        term: &str,
    ) -> impl Future<Output = Result<Option<SongMatch>, Self::Error>> + Send;

    /// Best artist match for a free-text term.
    fn search_artist(
        &self,
        term: &str,
    ) -> impl Future<Output = Result<Option<ArtistMatch>, Self::Error>> + Send;
}

/// A song search hit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SongMatch {
    /// Catalogue id, used for share-link aggregators.
    pub id: String,
    /// Artwork URL, possibly templated with `{w}` / `{h}`.
    pub artwork_url: Option<String>,
    /// Canonical share URL.
    pub share_url: Option<String>,
}

/// An artist search hit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArtistMatch {
    pub id: String,
    pub artwork_url: Option<String>,
}
