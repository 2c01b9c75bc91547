//! Presence session lifecycle and publish deduplication.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PresenceConfig;
use crate::error::EncoreError;
use crate::models::{Song, TrackKey};

/// Narrow interface to the external presence/status service.
pub trait PresenceService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a session for an application.
    fn login(&self, application_id: &str)
        -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Replace the current status.
    fn set_activity(&self, activity: Activity)
        -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Clear the status and close the session.
    fn logout(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Status payload pushed to the presence service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub state: String,
    pub details: String,
    pub large_image: String,
    pub large_text: String,
    pub small_image: String,
    pub small_text: String,
    /// Unix seconds at which the track notionally started.
    pub start_timestamp: i64,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub url: String,
}

/// Connection state. Dedup bookkeeping only exists while connected, so a
/// fresh connection always publishes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected {
        last_track: TrackKey,
        last_position: f64,
    },
}

/// What to do with a new sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Same track, playhead moved forward: nothing new to report.
    Skip,
    Publish,
}

impl SessionState {
    /// The dedup rule. A sample continues the reported track when the id
    /// matches and the playhead has not moved backwards by more than
    /// `seek_tolerance` seconds.
    pub fn decide(&self, track: &TrackKey, position: f64, seek_tolerance: f64) -> Decision {
        match self {
            Self::Connected {
                last_track,
                last_position,
            } if last_track == track && position >= last_position - seek_tolerance => {
                Decision::Skip
            }
            _ => Decision::Publish,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// Result of a publish attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishOutcome {
    Skipped,
    Published,
}

/// Payload and dedup settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub application_id: String,
    pub buttons: bool,
    pub fallback_image: String,
    pub small_image: String,
    pub seek_tolerance_secs: f64,
}

impl SessionOptions {
    pub fn from_config(config: &PresenceConfig) -> Self {
        Self {
            application_id: config.application_id.clone(),
            buttons: config.buttons,
            fallback_image: config.fallback_image.clone(),
            small_image: config.small_image.clone(),
            seek_tolerance_secs: config.seek_tolerance_secs,
        }
    }
}

/// Owns the presence connection and the dedup state.
pub struct PresenceSession<P> {
    service: P,
    state: SessionState,
    options: SessionOptions,
}

impl<P: PresenceService> PresenceSession<P> {
    pub fn new(service: P, options: SessionOptions) -> Self {
        Self {
            service,
            state: SessionState::Disconnected,
            options,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Report a playing song, connecting first if needed.
    ///
    /// Dedup state advances before the service call, so a rejected update is
    /// not retried until the track changes or the playhead moves back.
    #[tracing::instrument(name = "publish", skip(self, song, now), fields(track = %song.track.name))]
    pub async fn publish(
        &mut self,
        song: &Song,
        position: f64,
        now: DateTime<Utc>,
    ) -> Result<PublishOutcome, EncoreError> {
        let key = TrackKey::of(&song.track);

        if self
            .state
            .decide(&key, position, self.options.seek_tolerance_secs)
            == Decision::Skip
        {
            debug!(track_id = %key, position, "ongoing activity, ignoring");
            return Ok(PublishOutcome::Skipped);
        }

        match &self.state {
            SessionState::Connected {
                last_track,
                last_position,
            } => debug!(
                last_track_id = %last_track,
                track_id = %key,
                last_position,
                position,
                "new event"
            ),
            SessionState::Disconnected => {
                self.service
                    .login(&self.options.application_id)
                    .await
                    .map_err(|e| EncoreError::Login(e.to_string()))?;
                info!("connected to presence service");
            }
        }

        self.state = SessionState::Connected {
            last_track: key,
            last_position: position,
        };

        let activity = build_activity(song, position, now, &self.options)?;
        self.service
            .set_activity(activity)
            .await
            .map_err(|e| EncoreError::Publish(e.to_string()))?;

        warn!(
            song = %song.track.name,
            album = %song.track.album,
            artist = %song.track.artist,
            year = ?song.track.year,
            duration = ?song.track.duration,
            position,
            songlink = ?song.metadata.song_link(),
            "now playing"
        );
        Ok(PublishOutcome::Published)
    }

    /// Tear the session down. Returns whether there was one to tear down.
    pub async fn stop(&mut self) -> bool {
        if !self.state.is_connected() {
            return false;
        }
        if let Err(e) = self.service.logout().await {
            warn!(error = %e, "presence logout failed");
        }
        self.state = SessionState::Disconnected;
        info!("presence session closed");
        true
    }
}

/// Build the status payload for a song at a playhead position. Fails when
/// the position puts the start time outside the representable range.
pub fn build_activity(
    song: &Song,
    position: f64,
    now: DateTime<Utc>,
    options: &SessionOptions,
) -> Result<Activity, EncoreError> {
    let track = &song.track;
    let meta = &song.metadata;

    let start = chrono::Duration::try_milliseconds((position * 1000.0) as i64)
        .and_then(|elapsed| now.checked_sub_signed(elapsed))
        .ok_or_else(|| EncoreError::Publish(format!("playhead position {position} out of range")))?;

    let mut buttons = Vec::new();
    if options.buttons {
        if let Some(url) = &meta.share_url {
            buttons.push(Button {
                label: "Listen on Apple Music".into(),
                url: url.clone(),
            });
        }
        if let Some(url) = meta.song_link() {
            buttons.push(Button {
                label: "View on SongLink".into(),
                url,
            });
        }
    }

    Ok(Activity {
        state: format!("by {} ({})", track.artist, track.album),
        details: track.name.clone(),
        large_image: meta
            .album_artwork_url
            .clone()
            .unwrap_or_else(|| options.fallback_image.clone()),
        large_text: track.name.clone(),
        small_image: meta
            .artist_artwork_url
            .clone()
            .unwrap_or_else(|| options.small_image.clone()),
        small_text: format!("{} by {} ({})", track.name, track.artist, track.album),
        start_timestamp: start.timestamp(),
        buttons,
    })
}
