//! Cache-aside metadata resolution.
//!
//! Flow: normalized key → cache namespaces → remote lookups for whatever is
//! missing → write-through of each successful lookup. A failed lookup never
//! touches the cache; an affirmative "no results" is cached like any answer.

use tracing::debug;

use encore_api::{MetadataService, SongMatch};

use crate::cache::{MetadataCache, ShareLink};
use crate::config::MetadataConfig;
use crate::error::EncoreError;
use crate::models::{MetadataRecord, Song};
use crate::normalize;

/// How the resolver shapes what it fetches.
#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// Square edge, in pixels, substituted into templated artwork URLs.
    pub artwork_size: u32,
    /// Whether to look up artist artwork at all.
    pub artist_artwork: bool,
}

impl ResolverOptions {
    pub fn from_config(config: &MetadataConfig) -> Self {
        Self {
            artwork_size: config.artwork_size,
            artist_artwork: config.artist_artwork,
        }
    }
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            artwork_size: 512,
            artist_artwork: true,
        }
    }
}

pub struct MetadataResolver<S> {
    service: S,
    cache: MetadataCache,
    options: ResolverOptions,
}

impl<S: MetadataService> MetadataResolver<S> {
    pub fn new(service: S, cache: MetadataCache, options: ResolverOptions) -> Self {
        Self {
            service,
            cache,
            options,
        }
    }

    /// Resolve artwork and share links for a track.
    #[tracing::instrument(name = "resolve", skip(self))]
    pub async fn resolve(
        &mut self,
        artist: &str,
        album: &str,
        title: &str,
    ) -> Result<MetadataRecord, EncoreError> {
        let key = normalize::metadata_key(artist, album, title);
        let artist_key = normalize::artist_key(artist);
        let cached = self.cache.lookup(&key, &artist_key);

        let song_part = match (cached.album_artwork, cached.share) {
            (Some(artwork), Some(share)) => Some((artwork, share)),
            _ => None,
        };
        let artist_part = if self.options.artist_artwork {
            cached.artist_artwork
        } else {
            Some(None)
        };

        if let (Some((artwork, share)), Some(artist_artwork)) = (&song_part, &artist_part) {
            debug!(key = %key, "got song info from cache");
            return Ok(build_record(
                artwork.clone(),
                share.clone(),
                artist_artwork.clone(),
            ));
        }

        let need_song = song_part.is_none();
        let need_artist = artist_part.is_none();
        let term = normalize::search_term(artist, album, title);
        let service = &self.service;

        let (song_res, artist_res) = tokio::join!(
            async {
                if need_song {
                    Some(service.search_song(&term).await)
                } else {
                    None
                }
            },
            async {
                if need_artist {
                    Some(service.search_artist(artist).await)
                } else {
                    None
                }
            },
        );

        let mut failures = Vec::new();

        let (album_artwork, share) = match (song_part, song_res) {
            (Some(cached), _) => cached,
            (None, Some(Ok(hit))) => {
                if hit.is_none() {
                    debug!(key = %key, "no song matches, caching empty record");
                }
                let (artwork, share) = self.song_fields(hit);
                self.cache
                    .set_song_fields(&key, artwork.clone(), share.clone());
                (artwork, share)
            }
            (None, Some(Err(e))) => {
                failures.push(format!("song search: {e}"));
                (None, ShareLink::default())
            }
            (None, None) => (None, ShareLink::default()),
        };

        let artist_artwork = match (artist_part, artist_res) {
            (Some(cached), _) => cached,
            (None, Some(Ok(hit))) => {
                let artwork = hit
                    .and_then(|a| a.artwork_url)
                    .map(|url| instantiate_artwork(&url, self.options.artwork_size));
                self.cache.set_artist_artwork(&artist_key, artwork.clone());
                artwork
            }
            (None, Some(Err(e))) => {
                failures.push(format!("artist search: {e}"));
                None
            }
            (None, None) => None,
        };

        if !failures.is_empty() {
            return Err(EncoreError::MetadataFetch(failures.join("; ")));
        }

        Ok(build_record(album_artwork, share, artist_artwork))
    }

    /// Full song record for a numeric player id, if still fresh.
    pub fn cached_song(&mut self, id: i64) -> Option<Song> {
        let song = self.cache.song(id);
        if song.is_some() {
            debug!(track_id = id, "got song from cache");
        }
        song
    }

    /// Remember a fully resolved song under its numeric id.
    pub fn remember_song(&mut self, song: &Song) {
        if let Some(id) = song.track.id {
            self.cache.set_song(id, song.clone());
        }
    }

    /// Sweep expired entries from every namespace.
    pub fn purge_expired(&mut self) -> usize {
        self.cache.purge_expired()
    }

    fn song_fields(&self, hit: Option<SongMatch>) -> (Option<String>, ShareLink) {
        match hit {
            Some(m) => (
                m.artwork_url
                    .map(|url| instantiate_artwork(&url, self.options.artwork_size)),
                ShareLink {
                    id: Some(m.id).filter(|id| !id.is_empty()),
                    url: m.share_url,
                },
            ),
            None => (None, ShareLink::default()),
        }
    }
}

fn build_record(
    album_artwork: Option<String>,
    share: ShareLink,
    artist_artwork: Option<String>,
) -> MetadataRecord {
    MetadataRecord {
        share_id: share.id,
        album_artwork_url: album_artwork,
        artist_artwork_url: artist_artwork,
        share_url: share.url,
    }
}

/// Fill the `{w}` / `{h}` (and `{f}` format) placeholders of a templated
/// artwork URL with a square size.
pub fn instantiate_artwork(url: &str, size: u32) -> String {
    let size = size.to_string();
    url.replace("{w}", &size)
        .replace("{h}", &size)
        .replace("{f}", "jpg")
}
