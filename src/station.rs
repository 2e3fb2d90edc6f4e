//! Per-connection station loop
//!
//! A [`Station`] writes the response preamble once, then plays randomly
//! chosen tracks back to back for as long as the sink accepts bytes. Its
//! [`Pacer`] lives for the whole connection, so track changes do not
//! restart the real-time schedule.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::config::StationConfig;
use crate::constants::ICY_BITRATE;
use crate::error::{NetworkError, Result};
use crate::network::{Pacer, PacerStats};
use crate::tracks::{TrackList, TrackSelector, TrackStreamer, TrackSummary};

/// Pause once every track in the list has failed since the last good one
const ALL_SKIPPED_BACKOFF: Duration = Duration::from_secs(1);

/// Response head sent before the audio stream
pub fn preamble(name: &str, genre: &str) -> String {
    format!(
        "HTTP/1.0 200 OK\r\n\
         Content-Type: audio/mpeg\r\n\
         icy-name: {name}\r\n\
         icy-bitrate: {ICY_BITRATE}\r\n\
         genre: {genre}\r\n\
         \r\n"
    )
}

/// One connection's playback state
pub struct Station<S> {
    tracks: Arc<TrackList>,
    streamer: TrackStreamer,
    selector: S,
    pacer: Pacer,
    preamble: String,
    stats: StationStats,
    /// Indices that failed since the last track that played
    failed: HashSet<usize>,
}

impl<S: TrackSelector> Station<S> {
    pub fn new(tracks: Arc<TrackList>, config: &StationConfig, selector: S) -> Self {
        Self {
            tracks,
            streamer: TrackStreamer::new(config.max_frames_per_track),
            selector,
            pacer: Pacer::new(),
            preamble: preamble(&config.name, &config.genre),
            stats: StationStats::default(),
            failed: HashSet::new(),
        }
    }

    /// Stream until the sink fails.
    ///
    /// Never returns `Ok`; the error is the one that ended the connection.
    pub async fn run<W>(&mut self, sink: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        sink.write_all(self.preamble.as_bytes())
            .await
            .map_err(NetworkError::SendFailed)?;
        self.stats.bytes_sent += self.preamble.len() as u64;

        loop {
            self.play_next(sink).await?;
        }
    }

    /// Pick a track and stream it.
    ///
    /// Returns `Ok(None)` when the chosen track could not be played.
    pub async fn play_next<W>(&mut self, sink: &mut W) -> Result<Option<TrackSummary>>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let (index, path) = self.tracks.choose(&mut self.selector);
        info!("play {} (#{})", path.display(), index);

        match self.streamer.stream(path, sink, &mut self.pacer).await {
            Ok(summary) => {
                self.failed.clear();
                self.stats.tracks_played += 1;
                self.stats.frames_sent += summary.frames as u64;
                self.stats.bytes_sent += summary.bytes;
                Ok(Some(summary))
            }
            Err(e) if e.is_track_skip() => {
                warn!("Skipping track: {}", e);
                self.stats.tracks_skipped += 1;
                self.failed.insert(index);
                if self.failed.len() >= self.tracks.len() {
                    warn!("All {} tracks unplayable, backing off", self.failed.len());
                    self.failed.clear();
                    tokio::time::sleep(ALL_SKIPPED_BACKOFF).await;
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    pub fn stats(&self) -> StationStats {
        StationStats {
            pacer: self.pacer.stats(),
            ..self.stats
        }
    }
}

/// Connection statistics
#[derive(Debug, Clone, Copy)]
pub struct StationStats {
    pub tracks_played: u64,
    pub tracks_skipped: u64,
    pub frames_sent: u64,
    /// Preamble, trailer blocks and frames
    pub bytes_sent: u64,
    pub pacer: PacerStats,
}

impl Default for StationStats {
    fn default() -> Self {
        Self {
            tracks_played: 0,
            tracks_skipped: 0,
            frames_sent: 0,
            bytes_sent: 0,
            pacer: Pacer::new().stats(),
        }
    }
}
