use serde::Deserialize;

use crate::traits::{ArtistMatch, SongMatch};

// ── Search responses ────────────────────────────────────────────

/// Top-level search payload. Each requested type gets its own page; a
/// type with no hits is omitted entirely.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub songs: Option<ResultPage>,
    #[serde(default)]
    pub artists: Option<ResultPage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultPage {
    #[serde(default)]
    pub data: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct Attributes {
    pub url: Option<String>,
    pub artwork: Option<Artwork>,
}

#[derive(Debug, Deserialize)]
pub struct Artwork {
    pub url: Option<String>,
}

// ── Conversions ─────────────────────────────────────────────────

impl Resource {
    fn artwork_url(&self) -> Option<String> {
        self.attributes
            .artwork
            .as_ref()
            .and_then(|a| a.url.clone())
            .filter(|u| !u.is_empty())
    }

    pub fn into_song_match(self) -> SongMatch {
        SongMatch {
            artwork_url: self.artwork_url(),
            share_url: self.attributes.url.filter(|u| !u.is_empty()),
            id: self.id,
        }
    }

    pub fn into_artist_match(self) -> ArtistMatch {
        ArtistMatch {
            artwork_url: self.artwork_url(),
            id: self.id,
        }
    }
}

impl SearchResponse {
    pub fn first_song(self) -> Option<SongMatch> {
        self.songs?
            .data
            .into_iter()
            .next()
            .map(Resource::into_song_match)
    }

    pub fn first_artist(self) -> Option<ArtistMatch> {
        self.artists?
            .data
            .into_iter()
            .next()
            .map(Resource::into_artist_match)
    }
}
