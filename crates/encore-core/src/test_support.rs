//! In-memory doubles for the player, host, metadata, and presence seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use encore_api::{ArtistMatch, MetadataService, SongMatch};
use encore_probe::{HostMonitor, PlayerProbe, ProbeError, RawTrackFields, Track};

use crate::models::{MetadataRecord, Song};
use crate::session::{Activity, PresenceService};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

/// A Kind of Blue track with no enrichment.
pub fn song(id: i64, name: &str) -> Song {
    Song {
        track: Track {
            id: Some(id),
            name: name.into(),
            artist: "Miles Davis".into(),
            album: "Kind of Blue".into(),
            year: Some(1959),
            duration: Some(545.0),
        },
        metadata: MetadataRecord::default(),
    }
}

/// Separately fetched fields for a Kind of Blue track.
pub fn kind_of_blue_fields(name: &str) -> RawTrackFields {
    RawTrackFields {
        name: name.into(),
        artist: "Miles Davis".into(),
        album: "Kind of Blue".into(),
        year_duration: "1959, 545.0".into(),
    }
}

// -- metadata --

#[derive(Default)]
struct CatalogState {
    song: Option<SongMatch>,
    artist: Option<ArtistMatch>,
    fail_songs: bool,
    fail_artists: bool,
    song_calls: usize,
    artist_calls: usize,
}

/// Catalogue that answers every song term with one fixed hit.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl FakeCatalog {
    pub fn with_kind_of_blue() -> Self {
        let catalog = Self::default();
        {
            let mut state = catalog.state.lock().unwrap();
            state.song = Some(SongMatch {
                id: "268443097".into(),
                artwork_url: Some("https://art.example/album/{w}x{h}bb.jpg".into()),
                share_url: Some("https://music.apple.com/us/song/268443097".into()),
            });
            state.artist = Some(ArtistMatch {
                id: "44984".into(),
                artwork_url: Some("https://art.example/artist/{w}x{h}cc.jpg".into()),
            });
        }
        catalog
    }

    pub fn song_calls(&self) -> usize {
        self.state.lock().unwrap().song_calls
    }

    pub fn artist_calls(&self) -> usize {
        self.state.lock().unwrap().artist_calls
    }

    pub fn set_song_share_url(&self, url: &str) {
        if let Some(song) = self.state.lock().unwrap().song.as_mut() {
            song.share_url = Some(url.into());
        }
    }

    pub fn fail_songs(&self, fail: bool) {
        self.state.lock().unwrap().fail_songs = fail;
    }

    pub fn fail_artists(&self, fail: bool) {
        self.state.lock().unwrap().fail_artists = fail;
    }
}

impl MetadataService for FakeCatalog {
    type Error = FakeError;

    async fn search_song(&self, _term: &str) -> Result<Option<SongMatch>, FakeError> {
        let mut state = self.state.lock().unwrap();
        state.song_calls += 1;
        if state.fail_songs {
            return Err(FakeError("song search unavailable".into()));
        }
        Ok(state.song.clone())
    }

    async fn search_artist(&self, artist: &str) -> Result<Option<ArtistMatch>, FakeError> {
        let mut state = self.state.lock().unwrap();
        state.artist_calls += 1;
        if state.fail_artists {
            return Err(FakeError(format!("artist search for {artist} unavailable")));
        }
        Ok(state.artist.clone())
    }
}

// -- player --

#[derive(Default)]
struct ProbeState {
    compact: VecDeque<Result<String, ProbeError>>,
    extended: VecDeque<Result<String, ProbeError>>,
    fields: VecDeque<Result<RawTrackFields, ProbeError>>,
    compact_calls: usize,
    extended_calls: usize,
    fields_calls: usize,
}

/// Player that replays queued answers. An empty queue is a transient error.
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl ScriptedProbe {
    pub fn push_compact(&self, answer: Result<&str, ProbeError>) {
        self.state
            .lock()
            .unwrap()
            .compact
            .push_back(answer.map(str::to_string));
    }

    pub fn push_extended(&self, answer: Result<&str, ProbeError>) {
        self.state
            .lock()
            .unwrap()
            .extended
            .push_back(answer.map(str::to_string));
    }

    pub fn push_fields(&self, answer: Result<RawTrackFields, ProbeError>) {
        self.state.lock().unwrap().fields.push_back(answer);
    }

    pub fn compact_calls(&self) -> usize {
        self.state.lock().unwrap().compact_calls
    }

    pub fn extended_calls(&self) -> usize {
        self.state.lock().unwrap().extended_calls
    }

    pub fn fields_calls(&self) -> usize {
        self.state.lock().unwrap().fields_calls
    }
}

impl PlayerProbe for ScriptedProbe {
    async fn poll_compact(&self) -> Result<String, ProbeError> {
        let mut state = self.state.lock().unwrap();
        state.compact_calls += 1;
        state
            .compact
            .pop_front()
            .unwrap_or_else(|| Err(ProbeError::Transient("compact script exhausted".into())))
    }

    async fn poll_extended(&self) -> Result<String, ProbeError> {
        let mut state = self.state.lock().unwrap();
        state.extended_calls += 1;
        state
            .extended
            .pop_front()
            .unwrap_or_else(|| Err(ProbeError::Transient("extended script exhausted".into())))
    }

    async fn poll_track_fields(&self) -> Result<RawTrackFields, ProbeError> {
        let mut state = self.state.lock().unwrap();
        state.fields_calls += 1;
        state
            .fields
            .pop_front()
            .unwrap_or_else(|| Err(ProbeError::Transient("track fields script exhausted".into())))
    }
}

// -- host --

#[derive(Clone)]
pub struct FakeHost {
    app: Arc<AtomicBool>,
    peer: Arc<AtomicBool>,
    app_checks: Arc<AtomicUsize>,
}

impl FakeHost {
    pub fn running() -> Self {
        Self {
            app: Arc::new(AtomicBool::new(true)),
            peer: Arc::new(AtomicBool::new(true)),
            app_checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times the player process was checked.
    pub fn app_checks(&self) -> usize {
        self.app_checks.load(Ordering::SeqCst)
    }

    pub fn set_app(&self, running: bool) {
        self.app.store(running, Ordering::SeqCst);
    }

    pub fn set_peer(&self, running: bool) {
        self.peer.store(running, Ordering::SeqCst);
    }
}

impl HostMonitor for FakeHost {
    async fn app_running(&self) -> bool {
        self.app_checks.fetch_add(1, Ordering::SeqCst);
        self.app.load(Ordering::SeqCst)
    }

    async fn peer_running(&self) -> bool {
        self.peer.load(Ordering::SeqCst)
    }
}

// -- presence --

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceCall {
    Login(String),
    SetActivity,
    Logout,
}

#[derive(Default)]
struct PresenceState {
    calls: Vec<PresenceCall>,
    activities: Vec<Activity>,
}

/// Presence service that records every call.
#[derive(Clone, Default)]
pub struct RecordingPresence {
    state: Arc<Mutex<PresenceState>>,
    fail_login: Arc<AtomicBool>,
    fail_publish: Arc<AtomicBool>,
    logins: Arc<AtomicUsize>,
}

impl RecordingPresence {
    pub fn fail_login(&self, fail: bool) {
        self.fail_login.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PresenceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Activities that were accepted.
    pub fn activities(&self) -> Vec<Activity> {
        self.state.lock().unwrap().activities.clone()
    }

    /// Successful logins.
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

impl PresenceService for RecordingPresence {
    type Error = FakeError;

    async fn login(&self, application_id: &str) -> Result<(), FakeError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(PresenceCall::Login(application_id.into()));
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(FakeError("presence peer refused the handshake".into()));
        }
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_activity(&self, activity: Activity) -> Result<(), FakeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PresenceCall::SetActivity);
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(FakeError("presence pipe closed".into()));
        }
        state.activities.push(activity);
        Ok(())
    }

    async fn logout(&self) -> Result<(), FakeError> {
        self.state.lock().unwrap().calls.push(PresenceCall::Logout);
        Ok(())
    }
}
