use encore_probe::{ParseError, ProbeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncoreError {
    /// The player is not running or has nothing loaded.
    #[error("player unavailable: {0}")]
    ProbeUnavailable(String),

    #[error("probe failed: {0}")]
    Probe(String),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("metadata fetch failed: {0}")]
    MetadataFetch(String),

    #[error("publish failed: {0}")]
    Publish(String),

    /// The presence session could not be established at all.
    #[error("login failed: {0}")]
    Login(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncoreError {
    /// Only a failed login stops the process; everything else is retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Login(_))
    }

    /// Whether the player itself is gone, as opposed to a hiccup.
    pub fn is_player_gone(&self) -> bool {
        matches!(self, Self::ProbeUnavailable(_))
    }
}

impl From<ProbeError> for EncoreError {
    fn from(e: ProbeError) -> Self {
        match e {
            ProbeError::Unavailable(msg) => Self::ProbeUnavailable(msg),
            ProbeError::Malformed(parse) => Self::Parse(parse),
            other => Self::Probe(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_errors_keep_their_class() {
        let e: EncoreError = ProbeError::Unavailable("no track".into()).into();
        assert!(e.is_player_gone());
        assert!(!e.is_fatal());

        let e: EncoreError = ProbeError::Malformed(ParseError::MissingField("position")).into();
        assert!(matches!(e, EncoreError::Parse(_)));

        let e: EncoreError = ProbeError::Timeout(std::time::Duration::from_secs(3)).into();
        assert!(matches!(e, EncoreError::Probe(_)));
    }

    #[test]
    fn test_only_login_is_fatal() {
        assert!(EncoreError::Login("denied".into()).is_fatal());
        assert!(!EncoreError::Publish("rejected".into()).is_fatal());
        assert!(!EncoreError::MetadataFetch("503".into()).is_fatal());
    }
}
