//! Client side of the remote playback service.

use std::time::Duration;

use futures::future::{FutureExt as _, LocalBoxFuture};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::ServiceError;

/// Body the service sends when the player is idle
const NOTHING_PLAYING: &str = "No song currently playing";
const UNKNOWN_SONG: &str = "Unknown Song";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A track as reported by the service, with placeholders already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub is_playing: bool,
}

/// Successful answer to a status fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentSong {
    NothingPlaying,
    Playing(Track),
}

/// The operations the widget needs from the playback service.
///
/// Futures are `'static` so the event loop can park them in its own slots and
/// drop them on teardown.
pub trait PlaybackService {
    fn current_song(&self) -> LocalBoxFuture<'static, Result<CurrentSong, ServiceError>>;
    fn skip_next(&self) -> LocalBoxFuture<'static, Result<(), ServiceError>>;
    /// Where the user goes to log in again
    fn login_url(&self) -> String;
}

#[derive(Debug, Deserialize)]
struct CurrentSongBody {
    message: Option<String>,
    item: Option<Item>,
    is_playing: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: Option<String>,
    uri: Option<String>,
    name: Option<String>,
    #[serde(default)]
    artists: Option<Vec<Artist>>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: Option<String>,
}

impl Item {
    fn into_track(self, is_playing: bool) -> Track {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_SONG.to_owned());
        let mut artists: Vec<String> = self
            .artists
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .filter(|n| !n.is_empty())
            .collect();
        if artists.is_empty() {
            artists.push(UNKNOWN_ARTIST.to_owned());
        }
        // Local files have no catalogue id
        let id = self
            .id
            .or(self.uri)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{name}\u{1f}{}", artists.join("\u{1f}")));
        Track {
            id,
            name,
            artists,
            is_playing,
        }
    }
}

impl From<CurrentSongBody> for CurrentSong {
    fn from(body: CurrentSongBody) -> Self {
        if body.message.as_deref() == Some(NOTHING_PLAYING) {
            return Self::NothingPlaying;
        }
        match body.item {
            Some(item) => Self::Playing(item.into_track(body.is_playing.unwrap_or(false))),
            None => Self::NothingPlaying,
        }
    }
}

/// [`PlaybackService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlaybackService {
    client: Client,
    base_url: String,
}

impl HttpPlaybackService {
    /// Create a client for the service at `base_url`; every request gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

impl PlaybackService for HttpPlaybackService {
    fn current_song(&self) -> LocalBoxFuture<'static, Result<CurrentSong, ServiceError>> {
        let request = self.client.get(self.endpoint("current-song"));
        async move {
            let response = request.send().await?;
            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                return Err(ServiceError::Unauthorized);
            }
            if !status.is_success() {
                return Err(ServiceError::Status(status));
            }
            let body: CurrentSongBody = response.json().await?;
            debug!(?body, "Status fetched");
            Ok(body.into())
        }
        .boxed_local()
    }

    fn skip_next(&self) -> LocalBoxFuture<'static, Result<(), ServiceError>> {
        let request = self.client.post(self.endpoint("skip-next"));
        async move {
            let response = request.send().await?;
            match response.status() {
                StatusCode::UNAUTHORIZED => Err(ServiceError::Unauthorized),
                s if s.is_success() => Ok(()),
                s => Err(ServiceError::Status(s)),
            }
        }
        .boxed_local()
    }

    fn login_url(&self) -> String {
        self.endpoint("login")
    }
}
