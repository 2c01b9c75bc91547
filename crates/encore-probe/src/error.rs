use std::time::Duration;

use thiserror::Error;

/// Malformed player output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found} in {raw:?}")]
    FieldCount {
        expected: usize,
        found: usize,
        raw: String,
    },

    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unknown transport state: {0:?}")]
    UnknownState(String),
}

/// Errors from querying the media player.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The player is not running or has no current track.
    #[error("player unavailable: {0}")]
    Unavailable(String),

    #[error("probe failed: {0}")]
    Transient(String),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed probe output: {0}")]
    Malformed(#[from] ParseError),
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        // A missing scripting host means there is no player to talk to.
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::Unavailable(e.to_string())
        } else {
            Self::Transient(e.to_string())
        }
    }
}
