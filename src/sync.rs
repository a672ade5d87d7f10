//! Keeps the playback cache in step with the remote service.


use std::future::pending;

use futures::future::LocalBoxFuture;
use tracing::{debug, info, warn};

use crate::{
    cache::{PlaybackCache, PlaybackState},
    error::{ErrorKind, ServiceError},
    output::Transition,
    service::{CurrentSong, PlaybackService},
};

pub type FetchResult = Result<CurrentSong, ServiceError>;

/// Why a fetch was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTrigger {
    /// Regular cadence
    Tick,
    /// Out-of-cadence refresh after a skip
    Forced,
}

/// Owns the cache and the single status fetch slot.
#[derive(Default)]
pub struct PollSynchronizer {
    cache: PlaybackCache,
    in_flight: Option<LocalBoxFuture<'static, FetchResult>>,
}

impl PollSynchronizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn cache(&self) -> &PlaybackCache {
        &self.cache
    }

    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        self.cache.state()
    }

    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a status fetch unless one is already outstanding.
    ///
    /// Returns whether a fetch was started.
    pub fn begin(&mut self, service: &impl PlaybackService, trigger: PollTrigger) -> bool {
        if self.is_fetching() {
            debug!(?trigger, "Previous status fetch still outstanding, skipping");
            return false;
        }
        self.in_flight = Some(service.current_song());
        true
    }

    /// Wait for the outstanding fetch. Pends forever when there is none.
    ///
    /// Cancel safe: dropping this future leaves the fetch in its slot.
    pub async fn completion(&mut self) -> FetchResult {
        let Some(fetch) = self.in_flight.as_mut() else {
            return pending().await;
        };
        let result = fetch.await;
        self.in_flight = None;
        result
    }

    /// Drop the outstanding fetch; whatever it would have returned is discarded.
    pub fn cancel(&mut self) {
        if self.in_flight.take().is_some() {
            debug!("Discarding outstanding status fetch");
        }
    }

    /// Fold a fetch result into the cache and report what changed.
    pub fn apply(&mut self, result: FetchResult) -> Vec<Transition> {
        match result {
            Err(e) => match e.fetch_kind() {
                ErrorKind::AuthRequired => {
                    info!("Playback service requires login");
                    self.cache.auth_required();
                    vec![Transition::NeedsLogin]
                }
                _ => {
                    warn!(%e, "Failed to fetch current song");
                    self.cache.connection_lost();
                    vec![Transition::ConnectionLost]
                }
            },
            Ok(CurrentSong::NothingPlaying) => {
                if self.cache.state().has_track() {
                    info!("Playback stopped");
                }
                self.cache.clear();
                vec![Transition::NoTrack]
            }
            Ok(CurrentSong::Playing(track)) => {
                let changed = self.cache.replace(track);
                let state = self.cache.state();
                if changed {
                    info!(
                        id = ?state.track_id,
                        name = %state.track_name,
                        is_playing = state.is_playing,
                        "Track changed"
                    );
                    vec![Transition::TrackChanged, Transition::StateRefreshed]
                } else {
                    debug!(is_playing = state.is_playing, "Track unchanged");
                    vec![Transition::StateRefreshed]
                }
            }
        }
    }
}
