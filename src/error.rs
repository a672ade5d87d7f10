use reqwest::StatusCode;
use thiserror::Error;

/// The kinds of failure the widget recovers from locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The status fetch could not complete.
    ConnectionError,
    /// The playback service demands a (re)login.
    AuthRequired,
    /// A skip command was rejected or never arrived.
    SkipFailed,
}

/// Failure talking to the playback service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("playback service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("playback service requires login")]
    Unauthorized,
    #[error("playback service answered with status {0}")]
    Status(StatusCode),
}

impl ServiceError {
    /// How a failed status fetch is surfaced.
    #[must_use]
    pub const fn fetch_kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::AuthRequired,
            Self::Transport(_) | Self::Status(_) => ErrorKind::ConnectionError,
        }
    }
}
