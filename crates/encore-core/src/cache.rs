//! TTL caches for resolved metadata.
//!
//! Expiry is checked on read: an entry whose deadline has passed is dropped
//! and reported as absent. [`MetadataCache::purge_expired`] sweeps the rest.
//! Time comes from `tokio::time::Instant` so paused-clock tests can advance it.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::Song;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A key/value map whose entries expire after a per-write TTL.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a live value, evicting it instead if it has expired.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn set(&mut self, key: K, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| now < e.expires_at);
        before - self.entries.len()
    }

    /// Number of stored entries, including any not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Share link for a song; both parts come from the same search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareLink {
    pub id: Option<String>,
    pub url: Option<String>,
}

/// What the cache could answer for one lookup. `None` in a slot means a miss
/// for that namespace; `Some(None)` means a cached "nothing found".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedParts {
    pub album_artwork: Option<Option<String>>,
    pub share: Option<ShareLink>,
    pub artist_artwork: Option<Option<String>>,
}

/// Independent namespaces for song records, album artwork, artist artwork,
/// and share links.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    songs: TtlCache<i64, Song>,
    album_artwork: TtlCache<String, Option<String>>,
    artist_artwork: TtlCache<String, Option<String>>,
    share: TtlCache<String, ShareLink>,
    record_ttl: Duration,
    song_ttl: Duration,
}

impl MetadataCache {
    /// `record_ttl` applies to remote-derived fields, `song_ttl` to full
    /// song records keyed by the player's numeric id.
    pub fn new(record_ttl: Duration, song_ttl: Duration) -> Self {
        Self {
            songs: TtlCache::new(),
            album_artwork: TtlCache::new(),
            artist_artwork: TtlCache::new(),
            share: TtlCache::new(),
            record_ttl,
            song_ttl,
        }
    }

    pub fn song(&mut self, id: i64) -> Option<Song> {
        self.songs.get(&id)
    }

    pub fn set_song(&mut self, id: i64, song: Song) {
        self.songs.set(id, song, self.song_ttl);
    }

    /// Read every namespace for a song key and its artist key.
    pub fn lookup(&mut self, key: &str, artist_key: &str) -> CachedParts {
        CachedParts {
            album_artwork: self.album_artwork.get(key),
            share: self.share.get(key),
            artist_artwork: self.artist_artwork.get(artist_key),
        }
    }

    /// Store the fields of one song search.
    pub fn set_song_fields(&mut self, key: &str, album_artwork: Option<String>, share: ShareLink) {
        self.album_artwork
            .set(key.to_string(), album_artwork, self.record_ttl);
        self.share.set(key.to_string(), share, self.record_ttl);
    }

    pub fn set_artist_artwork(&mut self, artist_key: &str, artwork: Option<String>) {
        self.artist_artwork
            .set(artist_key.to_string(), artwork, self.record_ttl);
    }

    pub fn purge_expired(&mut self) -> usize {
        self.songs.purge_expired()
            + self.album_artwork.purge_expired()
            + self.artist_artwork.purge_expired()
            + self.share.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetadataRecord;
    use encore_probe::Track;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn test_entry_live_until_deadline() {
        let mut cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("a".into(), 1, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("a"), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("a"), None);
        // Lazily evicted on that read.
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_deadline() {
        let mut cache: TtlCache<&'static str, u32> = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("a", 2, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let mut cache: TtlCache<u8, u8> = TtlCache::new();
        cache.set(1, 1, Duration::from_secs(5));
        cache.set(2, 2, Duration::from_secs(50));
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&2), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_namespaces_expire_independently() {
        let mut cache = MetadataCache::new(HOUR, 24 * HOUR);
        cache.set_song_fields(
            "k",
            Some("https://art/album.jpg".into()),
            ShareLink {
                id: Some("1".into()),
                url: Some("https://share".into()),
            },
        );
        tokio::time::advance(Duration::from_secs(1800)).await;
        cache.set_artist_artwork("artist", Some("https://art/artist.jpg".into()));

        tokio::time::advance(Duration::from_secs(1800)).await;
        let parts = cache.lookup("k", "artist");
        assert_eq!(parts.album_artwork, None);
        assert_eq!(parts.share, None);
        assert_eq!(
            parts.artist_artwork,
            Some(Some("https://art/artist.jpg".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_song_namespace_uses_song_ttl() {
        let mut cache = MetadataCache::new(HOUR, 24 * HOUR);
        let song = Song {
            track: Track {
                id: Some(7),
                name: "Freddie Freeloader".into(),
                ..Track::default()
            },
            metadata: MetadataRecord::default(),
        };
        cache.set_song(7, song.clone());

        tokio::time::advance(2 * HOUR).await;
        assert_eq!(cache.song(7), Some(song));

        tokio::time::advance(22 * HOUR).await;
        assert_eq!(cache.song(7), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_nothing_is_a_hit() {
        let mut cache = MetadataCache::new(HOUR, HOUR);
        cache.set_song_fields("k", None, ShareLink::default());
        let parts = cache.lookup("k", "a");
        assert_eq!(parts.album_artwork, Some(None));
        assert_eq!(parts.share, Some(ShareLink::default()));
        assert_eq!(parts.artist_artwork, None);
    }
}
