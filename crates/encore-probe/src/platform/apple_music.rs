//! Apple Music probe over AppleScript (`osascript`).

use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info};

use super::run_with_timeout;
use crate::error::ProbeError;
use crate::identity::RawTrackFields;
use crate::PlayerProbe;

const COMPACT_SCRIPT: &str =
    "get {database id} of current track & {player position, player state}";
const EXTENDED_SCRIPT: &str = "get {name, artist, album, year, duration} of current track \
                               & {player position, player state}";
const NAME_SCRIPT: &str = "get {name} of current track";
const ARTIST_SCRIPT: &str = "get {artist} of current track";
const ALBUM_SCRIPT: &str = "get {album} of current track";
const YEAR_DURATION_SCRIPT: &str = "get {year, duration} of current track";

/// "Can't get current track": nothing is loaded in the player.
const ERR_NO_CURRENT_TRACK: i32 = -1728;
/// "Application isn't running".
const ERR_APP_NOT_RUNNING: i32 = -600;

/// Queries the Music app through `osascript`.
pub struct AppleMusicProbe {
    app_name: String,
    timeout: Duration,
}

impl AppleMusicProbe {
    pub fn new(app_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            app_name: app_name.into(),
            timeout,
        }
    }

    async fn tell(&self, statement: &str) -> Result<String, ProbeError> {
        let started = Instant::now();

        let mut cmd = Command::new("osascript");
        cmd.arg("-e")
            .arg(format!("tell application \"{}\"", self.app_name))
            .arg("-e")
            .arg(statement)
            .arg("-e")
            .arg("end tell");

        let output = run_with_timeout(cmd, self.timeout).await?;
        info!(took = ?started.elapsed(), "got info");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(raw = %stdout, "player answered");
        Ok(stdout)
    }
}

impl PlayerProbe for AppleMusicProbe {
    async fn poll_compact(&self) -> Result<String, ProbeError> {
        self.tell(COMPACT_SCRIPT).await
    }

    async fn poll_extended(&self) -> Result<String, ProbeError> {
        self.tell(EXTENDED_SCRIPT).await
    }

    async fn poll_track_fields(&self) -> Result<RawTrackFields, ProbeError> {
        Ok(RawTrackFields {
            name: self.tell(NAME_SCRIPT).await?,
            artist: self.tell(ARTIST_SCRIPT).await?,
            album: self.tell(ALBUM_SCRIPT).await?,
            year_duration: self.tell(YEAR_DURATION_SCRIPT).await?,
        })
    }
}

/// Map an `osascript` failure onto the probe error taxonomy.
fn classify_failure(stderr: &str) -> ProbeError {
    match applescript_error_code(stderr) {
        Some(ERR_NO_CURRENT_TRACK) | Some(ERR_APP_NOT_RUNNING) => {
            ProbeError::Unavailable(stderr.to_string())
        }
        _ => ProbeError::Transient(stderr.to_string()),
    }
}

/// Extract the numeric code osascript appends to errors, e.g. `... (-1728)`.
fn applescript_error_code(stderr: &str) -> Option<i32> {
    let stderr = stderr.trim_end();
    let open = stderr.rfind('(')?;
    let inner = stderr[open + 1..].strip_suffix(')')?;
    inner.trim().parse().ok()
}
