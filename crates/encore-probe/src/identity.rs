//! Track identity resolution: raw player tuples into [`PlaybackSample`]s.
//!
//! The player answers with fields joined by [`FIELD_SEPARATOR`] in a fixed
//! order. Fields are indexed positionally, so any deviation in field count
//! is a hard failure rather than a best-effort guess.

use crate::error::ParseError;
use crate::model::{PlaybackSample, Track, TransportState};

/// Separator between fields in every probe answer.
pub const FIELD_SEPARATOR: &str = ", ";

const COMPACT_FIELDS: usize = 3;
const EXTENDED_FIELDS: usize = 7;
const YEAR_DURATION_FIELDS: usize = 2;

/// Result of the cheap poll: enough to decide whether anything changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompactSample {
    pub track_id: i64,
    pub position: f64,
    pub state: TransportState,
}

impl CompactSample {
    /// Promote to a full sample carrying the given track.
    pub fn with_track(self, track: Track) -> PlaybackSample {
        PlaybackSample {
            track: Track {
                id: Some(self.track_id),
                ..track
            },
            position: self.position,
            state: self.state,
        }
    }

    /// A sample with no descriptive fields, for non-playing states.
    pub fn bare(self) -> PlaybackSample {
        self.with_track(Track::default())
    }
}

/// Parse `trackID, position, transportState`.
pub fn parse_compact(raw: &str) -> Result<CompactSample, ParseError> {
    let fields = split_fields(raw, COMPACT_FIELDS)?;
    Ok(CompactSample {
        track_id: parse_int(fields[0], "track id")?,
        position: parse_float(fields[1], "position")?,
        state: parse_state(fields[2])?,
    })
}

/// Parse `name, artist, album, year, duration, position, transportState`.
///
/// Descriptive fields are only read when the state is `Playing`; other
/// states yield an empty [`Track`].
pub fn parse_extended(raw: &str) -> Result<PlaybackSample, ParseError> {
    let fields = split_fields(raw, EXTENDED_FIELDS)?;
    let position = parse_float(fields[5], "position")?;
    let state = parse_state(fields[6])?;

    if !state.is_playing() {
        return Ok(PlaybackSample {
            track: Track::default(),
            position,
            state,
        });
    }

    Ok(PlaybackSample {
        track: Track {
            id: None,
            name: fields[0].to_string(),
            artist: fields[1].to_string(),
            album: fields[2].to_string(),
            year: parse_year(fields[3])?,
            duration: Some(parse_float(fields[4], "duration")?),
        },
        position,
        state,
    })
}

/// Descriptive fields of the current track, each fetched on its own so a
/// separator inside a name cannot shift the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrackFields {
    pub name: String,
    pub artist: String,
    pub album: String,
    /// `year, duration`
    pub year_duration: String,
}

/// Build a [`Track`] from separately fetched fields. Only `year, duration`
/// is split.
pub fn parse_track_fields(raw: &RawTrackFields) -> Result<Track, ParseError> {
    let fields = split_fields(&raw.year_duration, YEAR_DURATION_FIELDS)?;
    Ok(Track {
        id: None,
        name: raw.name.trim().to_string(),
        artist: raw.artist.trim().to_string(),
        album: raw.album.trim().to_string(),
        year: parse_year(fields[0])?,
        duration: Some(parse_float(fields[1], "duration")?),
    })
}

/// Split on [`FIELD_SEPARATOR`], requiring exactly `expected` fields.
pub fn split_fields(raw: &str, expected: usize) -> Result<Vec<&str>, ParseError> {
    let raw = raw.trim();
    let fields: Vec<&str> = if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(FIELD_SEPARATOR).collect()
    };

    if fields.len() != expected {
        return Err(ParseError::FieldCount {
            expected,
            found: fields.len(),
            raw: raw.to_string(),
        });
    }
    Ok(fields)
}

fn parse_int(value: &str, field: &'static str) -> Result<i64, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::MissingField(field));
    }
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// The player reports 0 for an unknown year.
fn parse_year(value: &str) -> Result<Option<i32>, ParseError> {
    let year = parse_int(value, "year")?;
    let year = i32::try_from(year).map_err(|_| ParseError::InvalidNumber {
        field: "year",
        value: value.trim().to_string(),
    })?;
    Ok((year > 0).then_some(year))
}

fn parse_float(value: &str, field: &'static str) -> Result<f64, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::MissingField(field));
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_state(value: &str) -> Result<TransportState, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::MissingField("transport state"));
    }
    TransportState::from_player_str(value)
        .ok_or_else(|| ParseError::UnknownState(value.to_string()))
}
