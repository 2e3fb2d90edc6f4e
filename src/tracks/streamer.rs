//! Frame-by-frame track streaming
//!
//! A track goes out as its last 128 bytes (the ID3v1 tag region), sent
//! unpaced, followed by its frames from the start of the file, each handed
//! to the connection's [`Pacer`]. Streaming stops at the first invalid
//! header, at end of file, or after the per-track frame cap.

use std::io::{self, SeekFrom};
use std::path::Path;

use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::codec::{Frame, FrameHeader, HEADER_LEN};
use crate::constants::{MAX_FRAMES_PER_TRACK, TRAILER_LEN};
use crate::error::{NetworkError, Result, TrackError};
use crate::network::Pacer;

/// Why a track stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// Next four bytes were not a frame header (tag data, garbage)
    InvalidHeader,
    /// End of file, possibly in the middle of a frame
    ShortRead,
    /// Per-track frame cap reached
    FrameCap,
    /// The file failed mid-read
    ReadError,
}

/// Outcome of one streamed track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
    pub frames: usize,
    /// Bytes written to the sink, trailer block included
    pub bytes: u64,
    pub end: TrackEnd,
}

/// Streams single tracks to a sink
#[derive(Debug, Clone)]
pub struct TrackStreamer {
    max_frames: usize,
}

impl Default for TrackStreamer {
    fn default() -> Self {
        Self::new(MAX_FRAMES_PER_TRACK)
    }
}

impl TrackStreamer {
    pub fn new(max_frames: usize) -> Self {
        Self { max_frames }
    }

    /// Stream the track at `path` into `sink`.
    ///
    /// Returns [`TrackError::FileUnavailable`] or [`TrackError::TooShort`]
    /// before anything is written when the file cannot be used, and
    /// [`NetworkError::SendFailed`] when the sink breaks.
    pub async fn stream<W>(
        &self,
        path: &Path,
        sink: &mut W,
        pacer: &mut Pacer,
    ) -> Result<TrackSummary>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let unavailable = |source: io::Error| TrackError::FileUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).await.map_err(unavailable)?;
        let len = file.metadata().await.map_err(unavailable)?.len();
        if len < TRAILER_LEN {
            return Err(TrackError::TooShort {
                path: path.to_path_buf(),
                len,
            }
            .into());
        }

        let mut trailer = [0u8; TRAILER_LEN as usize];
        file.seek(SeekFrom::Start(len - TRAILER_LEN))
            .await
            .map_err(unavailable)?;
        file.read_exact(&mut trailer).await.map_err(unavailable)?;
        sink.write_all(&trailer)
            .await
            .map_err(NetworkError::SendFailed)?;

        let mut summary = TrackSummary {
            frames: 0,
            bytes: TRAILER_LEN,
            end: TrackEnd::ReadError,
        };

        if let Err(e) = file.seek(SeekFrom::Start(0)).await {
            warn!("Rewind failed on {}: {}", path.display(), e);
            return Ok(summary);
        }

        let mut reader = BufReader::new(file);
        summary.end = loop {
            if summary.frames >= self.max_frames {
                break TrackEnd::FrameCap;
            }

            let mut head = [0u8; HEADER_LEN];
            match read_full(&mut reader, &mut head).await {
                Ok(HEADER_LEN) => {}
                Ok(_) => break TrackEnd::ShortRead,
                Err(e) => {
                    warn!("Read failed on {}: {}", path.display(), e);
                    break TrackEnd::ReadError;
                }
            }

            let header = match FrameHeader::decode(head) {
                Ok(header) => header,
                Err(e) => {
                    debug!("{}: {} after {} frames", path.display(), e, summary.frames);
                    break TrackEnd::InvalidHeader;
                }
            };

            let mut data = BytesMut::zeroed(header.frame_size());
            data[..HEADER_LEN].copy_from_slice(&head);
            let read = match read_full(&mut reader, &mut data[HEADER_LEN..]).await {
                Ok(n) => n,
                Err(e) => {
                    warn!("Read failed on {}: {}", path.display(), e);
                    break TrackEnd::ReadError;
                }
            };
            data.truncate(HEADER_LEN + read);

            let frame = Frame::new(header, data);
            pacer
                .emit(sink, &frame)
                .await
                .map_err(NetworkError::SendFailed)?;

            summary.frames += 1;
            summary.bytes += frame.len() as u64;

            if frame.is_truncated() {
                break TrackEnd::ShortRead;
            }
        };

        debug!(
            "{}: {} frames, {} bytes, {:?}",
            path.display(),
            summary.frames,
            summary.bytes,
            summary.end
        );
        Ok(summary)
    }
}

/// Fill `buf` as far as the reader allows; fewer bytes means end of file.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
