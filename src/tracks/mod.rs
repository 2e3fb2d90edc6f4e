//! Track list and per-track streaming

pub mod list;
pub mod streamer;

pub use list::{RandomSelector, TrackList, TrackSelector};
pub use streamer::{TrackEnd, TrackStreamer, TrackSummary};
