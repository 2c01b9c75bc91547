//! The poll loop: availability checks, probing, resolution, publishing, and
//! the sleep policy between cycles.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use encore_api::MetadataService;
use encore_probe::{
    parse_compact, parse_extended, parse_track_fields, HostMonitor, PlaybackSample, PlayerProbe,
    Track,
};

use crate::cache::MetadataCache;
use crate::config::{AppConfig, ProbeMode};
use crate::error::EncoreError;
use crate::models::{MetadataRecord, Song};
use crate::resolver::{MetadataResolver, ResolverOptions};
use crate::session::{PresenceService, PresenceSession, PublishOutcome, SessionOptions};

/// Whether the loop can poll at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    AppUnavailable,
    PeerUnavailable,
    Polling,
}

/// How long to wait before the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pause {
    Short,
    Long,
}

/// What one cycle saw and did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub availability: Availability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<PlaybackSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PublishOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub pause: Pause,
}

impl CycleReport {
    fn new(availability: Availability, pause: Pause) -> Self {
        Self {
            availability,
            sample: None,
            metadata: None,
            outcome: None,
            error: None,
            pause,
        }
    }
}

/// Result of probing while polling.
enum Polled {
    Idle(PlaybackSample),
    Playing { song: Song, sample: PlaybackSample },
}

/// Timing and policy knobs, lifted out of [`AppConfig`].
#[derive(Debug, Clone)]
struct LoopOptions {
    app_name: String,
    mode: ProbeMode,
    metadata_enabled: bool,
    teardown_on_error: bool,
    short_sleep: Duration,
    long_sleep: Duration,
}

pub struct Scheduler<P, H, M, S> {
    probe: P,
    host: H,
    resolver: MetadataResolver<M>,
    session: PresenceSession<S>,
    options: LoopOptions,
}

impl<P, H, M, S> Scheduler<P, H, M, S>
where
    P: PlayerProbe,
    H: HostMonitor,
    M: MetadataService,
    S: PresenceService,
{
    pub fn new(config: &AppConfig, probe: P, host: H, metadata: M, presence: S) -> Self {
        let cache = MetadataCache::new(
            Duration::from_secs(config.metadata.record_ttl_secs),
            Duration::from_secs(config.metadata.song_ttl_secs),
        );
        Self {
            probe,
            host,
            resolver: MetadataResolver::new(
                metadata,
                cache,
                ResolverOptions::from_config(&config.metadata),
            ),
            session: PresenceSession::new(presence, SessionOptions::from_config(&config.presence)),
            options: LoopOptions {
                app_name: config.player.app_name.clone(),
                mode: config.player.mode,
                metadata_enabled: config.metadata.enabled,
                teardown_on_error: config.general.teardown_on_error,
                short_sleep: config.short_sleep(),
                long_sleep: config.long_sleep(),
            },
        }
    }

    pub fn session(&self) -> &PresenceSession<S> {
        &self.session
    }

    pub fn pause_duration(&self, pause: Pause) -> Duration {
        match pause {
            Pause::Short => self.options.short_sleep,
            Pause::Long => self.options.long_sleep,
        }
    }

    /// Run cycles until `shutdown` resolves or a fatal error occurs. The
    /// presence session is closed on the way out either way.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), EncoreError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(mode = ?self.options.mode, "starting poll loop");

        let result = loop {
            let pause = match self.cycle().await {
                Ok(report) => report.pause,
                Err(e) => break Err(e),
            };
            let sleep = self.pause_duration(pause);
            debug!(?sleep, "sleeping");

            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                }
                _ = tokio::time::sleep(sleep) => {}
            }
        };

        self.teardown().await;
        result
    }

    /// One pass of the loop. Only a fatal error is returned as `Err`; every
    /// transient failure is logged and folded into the report.
    #[tracing::instrument(name = "cycle", skip(self))]
    pub async fn cycle(&mut self) -> Result<CycleReport, EncoreError> {
        let purged = self.resolver.purge_expired();
        if purged > 0 {
            debug!(purged, "swept expired cache entries");
        }

        if !self.host.app_running().await {
            warn!(app = %self.options.app_name, "player is not running");
            self.teardown().await;
            return Ok(CycleReport::new(Availability::AppUnavailable, Pause::Long));
        }
        if !self.host.peer_running().await {
            warn!("presence peer is not running");
            self.teardown().await;
            return Ok(CycleReport::new(Availability::PeerUnavailable, Pause::Long));
        }

        let mut report = CycleReport::new(Availability::Polling, Pause::Short);

        match self.poll().await {
            Ok(Polled::Idle(sample)) => {
                debug!(state = %sample.state, "not playing");
                self.teardown().await;
                report.sample = Some(sample);
            }
            Ok(Polled::Playing { song, sample }) => {
                match self.session.publish(&song, sample.position, Utc::now()).await {
                    Ok(outcome) => report.outcome = Some(outcome),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        error!(error = %e, "failed to update presence");
                        report.error = Some(e.to_string());
                    }
                }
                report.sample = Some(sample);
                report.metadata = Some(song.metadata);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) if e.is_player_gone() => {
                warn!(error = %e, "player stopped answering");
                self.teardown().await;
                report.error = Some(e.to_string());
                report.pause = Pause::Long;
            }
            Err(e) => {
                error!(error = %e, "cycle failed");
                if self.options.teardown_on_error {
                    self.teardown().await;
                }
                report.error = Some(e.to_string());
            }
        }

        Ok(report)
    }

    async fn poll(&mut self) -> Result<Polled, EncoreError> {
        match self.options.mode {
            ProbeMode::Compact => self.poll_compact().await,
            ProbeMode::Extended => {
                let sample = parse_extended(&self.probe.poll_extended().await?)?;
                if !sample.is_playing() {
                    return Ok(Polled::Idle(sample));
                }
                let song = self.enrich(sample.track.clone()).await?;
                Ok(Polled::Playing { song, sample })
            }
        }
    }

    /// Cheap poll first; the track fields and the metadata lookups only run
    /// on a song-cache miss.
    async fn poll_compact(&mut self) -> Result<Polled, EncoreError> {
        let compact = parse_compact(&self.probe.poll_compact().await?)?;
        if !compact.state.is_playing() {
            return Ok(Polled::Idle(compact.bare()));
        }

        if let Some(song) = self.resolver.cached_song(compact.track_id) {
            let sample = compact.with_track(song.track.clone());
            return Ok(Polled::Playing { song, sample });
        }

        let track = parse_track_fields(&self.probe.poll_track_fields().await?)?;
        let sample = compact.with_track(track);
        let song = self.enrich(sample.track.clone()).await?;
        self.resolver.remember_song(&song);
        Ok(Polled::Playing { song, sample })
    }

    async fn enrich(&mut self, track: Track) -> Result<Song, EncoreError> {
        let metadata = if self.options.metadata_enabled {
            self.resolver
                .resolve(&track.artist, &track.album, &track.name)
                .await?
        } else {
            MetadataRecord::default()
        };
        Ok(Song { track, metadata })
    }

    /// Close the presence session if one is open.
    pub async fn teardown(&mut self) {
        if self.session.stop().await {
            debug!("cleared presence");
        }
    }
}
