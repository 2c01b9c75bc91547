//! Cache key normalization for track metadata lookups.
//!
//! Every cache read and write goes through [`metadata_key`] / [`artist_key`],
//! so two spellings that differ only in case, width, or spacing share one
//! cache slot.

use unicode_normalization::UnicodeNormalization;
use url::form_urlencoded;

/// Key for the per-song namespaces: `artist album title`, normalized and
/// form-encoded.
pub fn metadata_key(artist: &str, album: &str, title: &str) -> String {
    encode(&[artist, album, title])
}

/// Key for the artist artwork namespace.
pub fn artist_key(artist: &str) -> String {
    encode(&[artist])
}

/// Free-text search term for the remote service. Not normalized: the
/// service does its own matching and prefers the original spelling.
pub fn search_term(artist: &str, album: &str, title: &str) -> String {
    [artist, album, title]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn encode(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|p| normalize_part(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    form_urlencoded::byte_serialize(joined.as_bytes()).collect()
}

/// NFKC, lowercase, collapse runs of whitespace.
fn normalize_part(s: &str) -> String {
    let folded = s.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
