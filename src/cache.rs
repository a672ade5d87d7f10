//! The last observed playback state.

use crate::{error::ErrorKind, service::Track};

/// Everything the widget knows about the remote player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Stable id of the current track, `None` when nothing is playing
    pub track_id: Option<String>,
    pub track_name: String,
    pub artist_names: Vec<String>,
    pub is_playing: bool,
    /// The last poll told us to log in again
    pub auth_required: bool,
    /// Set when the last poll failed, cleared by the next success
    pub last_error: Option<ErrorKind>,
}

impl PlaybackState {
    #[must_use]
    pub const fn has_track(&self) -> bool {
        self.track_id.is_some()
    }

    /// Artist names joined for display.
    #[must_use]
    pub fn artists(&self) -> String {
        self.artist_names.join(", ")
    }
}

/// Holds exactly one [`PlaybackState`] and knows when a new track shows up.
#[derive(Debug, Default)]
pub struct PlaybackCache {
    state: PlaybackState,
}

impl PlaybackCache {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub fn track_id(&self) -> Option<&str> {
        self.state.track_id.as_deref()
    }

    /// Whether `id` differs from the cached track, counting "nothing cached" as different.
    #[must_use]
    pub fn is_new_track(&self, id: &str) -> bool {
        self.track_id() != Some(id)
    }

    /// The service could not be reached: forget the track, remember why.
    pub fn connection_lost(&mut self) {
        let auth_required = self.state.auth_required;
        self.state = PlaybackState {
            auth_required,
            last_error: Some(ErrorKind::ConnectionError),
            ..PlaybackState::default()
        };
    }

    /// The service wants a login. The track is left as it was.
    pub fn auth_required(&mut self) {
        self.state.auth_required = true;
        self.state.last_error = Some(ErrorKind::AuthRequired);
    }

    /// Nothing is playing.
    pub fn clear(&mut self) {
        self.state = PlaybackState::default();
    }

    /// Replace the state with a freshly observed track.
    ///
    /// Returns `true` when the track id changed.
    pub fn replace(&mut self, track: Track) -> bool {
        let changed = self.is_new_track(&track.id);
        self.state = PlaybackState {
            track_id: Some(track.id),
            track_name: track.name,
            artist_names: track.artists,
            is_playing: track.is_playing,
            auth_required: false,
            last_error: None,
        };
        changed
    }
}
