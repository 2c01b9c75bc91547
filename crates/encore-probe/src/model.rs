use serde::{Deserialize, Serialize};

/// Player transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    Playing,
    Paused,
    Stopped,
    /// Seeking states such as fast forwarding or rewinding.
    Other,
}

impl TransportState {
    /// Map the player's state word. Unknown words yield `None`.
    pub fn from_player_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playing" => Some(Self::Playing),
            "paused" => Some(Self::Paused),
            "stopped" => Some(Self::Stopped),
            "fast forwarding" | "rewinding" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::Stopped => write!(f, "stopped"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A track as reported by the player.
///
/// Only `id` is guaranteed for non-playing samples; the descriptive fields
/// are empty unless the sample was taken while playing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Player-local numeric id, when the player exposes one.
    pub id: Option<i64>,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub year: Option<i32>,
    /// Length in seconds.
    pub duration: Option<f64>,
}

/// One observation of the player, taken fresh every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSample {
    pub track: Track,
    /// Playhead in seconds.
    pub position: f64,
    pub state: TransportState,
}

impl PlaybackSample {
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }
}
