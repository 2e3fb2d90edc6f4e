//! Error types for the radio station

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Track error: {0}")]
    Track(#[from] TrackError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Frame header errors
///
/// `InvalidHeader` is the regular end-of-audio signal for a track, not a
/// failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid frame header: {0:#010x}")]
    InvalidHeader(u32),
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Socket bind failed: {0}")]
    BindFailed(String),

    #[error("Accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    #[error("Send failed: {0}")]
    SendFailed(#[source] std::io::Error),
}

/// Track errors
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Track unavailable: {path}: {source}")]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Track too short: {path} ({len} bytes)")]
    TooShort { path: PathBuf, len: u64 },

    #[error("Track list is empty")]
    EmptyTrackList,

    #[error("Failed to read track list: {0}")]
    ListUnreadable(#[source] std::io::Error),
}

impl Error {
    /// Whether the station should skip to another track rather than drop
    /// the connection.
    pub fn is_track_skip(&self) -> bool {
        matches!(
            self,
            Error::Track(TrackError::FileUnavailable { .. } | TrackError::TooShort { .. })
        )
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
