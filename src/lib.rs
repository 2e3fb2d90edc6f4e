//! # Random Radio
//!
//! A minimal broadcast server that streams randomly chosen MP3 tracks to
//! every connected client at real-time speed.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                    StationServer (network::server)                    │
//! │        TCP listener, one tokio task per accepted connection           │
//! └───────────────┬──────────────────────────────────┬───────────────────┘
//!                 │                                  │
//!                 ▼                                  ▼
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │   Station (connection 0)     │   │   Station (connection 1)     │
//! │  preamble, then forever:     │   │  own selector, own pacer     │
//! │  pick random track ──┐       │   │            ...               │
//! └──────────────────────┼───────┘   └──────────────────────────────┘
//!                        ▼
//! ┌──────────────────────────────┐        ┌─────────────────────────┐
//! │ TrackStreamer (tracks)       │───────▶│ FrameHeader (codec)     │
//! │ 128-byte trailer, then       │        │ decode, frame size,     │
//! │ frame by frame, cap 1148     │◀───────│ frame duration          │
//! └──────────────┬───────────────┘        └─────────────────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │ Pacer (network::pacer)       │
//! │ deadline = origin + Σ dur    │──────▶ client socket
//! └──────────────────────────────┘
//! ```
//!
//! The track list is the only value shared between connections, and it is
//! immutable after startup.

pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod station;
pub mod tracks;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default TCP port for the stream
    pub const DEFAULT_PORT: u16 = 8080;

    /// Default listen backlog
    pub const DEFAULT_BACKLOG: u32 = 128;

    /// Default `icy-name` header
    pub const DEFAULT_STATION_NAME: &str = "urs' radio";

    /// Default `genre` header
    pub const DEFAULT_GENRE: &str = "Mix";

    /// Bitrate announced in the `icy-bitrate` header
    pub const ICY_BITRATE: u32 = 128;

    /// Length of the end-of-file block sent before a track's frames
    pub const TRAILER_LEN: u64 = 128;

    /// Frames streamed from one track before moving on
    pub const MAX_FRAMES_PER_TRACK: usize = 1148;
}
