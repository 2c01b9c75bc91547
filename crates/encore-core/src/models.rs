use serde::{Deserialize, Serialize};

use encore_probe::Track;

use crate::normalize;

/// Base URL of the share-link aggregator, followed by the catalogue id.
const SONG_LINK_BASE: &str = "https://song.link/i/";

/// Identity used to tell tracks apart between cycles.
///
/// Prefers the player's numeric id; players without one fall back to the
/// normalized `(artist, album, title)` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKey {
    Id(i64),
    Tags(String),
}

impl TrackKey {
    pub fn of(track: &Track) -> Self {
        match track.id {
            Some(id) => Self::Id(id),
            None => Self::Tags(normalize::metadata_key(
                &track.artist,
                &track.album,
                &track.name,
            )),
        }
    }
}

impl std::fmt::Display for TrackKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Tags(key) => write!(f, "{key}"),
        }
    }
}

/// Remote-derived enrichment for a track. Every field is optional: an all-`None`
/// record is a valid "the service knows nothing about this" answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub share_id: Option<String>,
    pub album_artwork_url: Option<String>,
    pub artist_artwork_url: Option<String>,
    pub share_url: Option<String>,
}

impl MetadataRecord {
    pub fn is_empty(&self) -> bool {
        self.share_id.is_none()
            && self.album_artwork_url.is_none()
            && self.artist_artwork_url.is_none()
            && self.share_url.is_none()
    }

    /// Aggregator link covering every streaming service, if the catalogue id is known.
    pub fn song_link(&self) -> Option<String> {
        self.share_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| format!("{SONG_LINK_BASE}{id}"))
    }
}

/// A fully resolved track: player fields plus enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub track: Track,
    pub metadata: MetadataRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefers_numeric_id() {
        let track = Track {
            id: Some(42),
            name: "So What".into(),
            ..Track::default()
        };
        assert_eq!(TrackKey::of(&track), TrackKey::Id(42));
    }

    #[test]
    fn test_key_falls_back_to_tags() {
        let a = Track {
            name: "So What".into(),
            artist: "Miles Davis".into(),
            album: "Kind of Blue".into(),
            ..Track::default()
        };
        let b = Track {
            name: "so what".into(),
            artist: "MILES DAVIS".into(),
            album: "Kind Of Blue".into(),
            ..Track::default()
        };
        assert_eq!(TrackKey::of(&a), TrackKey::of(&b));
        assert!(matches!(TrackKey::of(&a), TrackKey::Tags(_)));
    }

    #[test]
    fn test_song_link() {
        let record = MetadataRecord {
            share_id: Some("268443097".into()),
            ..MetadataRecord::default()
        };
        assert_eq!(
            record.song_link().as_deref(),
            Some("https://song.link/i/268443097")
        );
        assert_eq!(MetadataRecord::default().song_link(), None);
        assert!(MetadataRecord::default().is_empty());
        assert!(!record.is_empty());
    }
}
