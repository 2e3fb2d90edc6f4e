//! Test helpers: synthetic tracks and a sink that breaks after a byte budget

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use tempfile::TempDir;
use tokio::io::AsyncWrite;

use crate::codec::FrameHeader;
use crate::tracks::TrackSelector;

pub(crate) const CD_HEADER: FrameHeader = FrameHeader {
    sample_rate: 44100,
    bitrate_kbps: 128,
    padding: false,
};

pub(crate) const SMALL_HEADER: FrameHeader = FrameHeader {
    sample_rate: 22050,
    bitrate_kbps: 8,
    padding: false,
};

/// One complete frame with its payload filled with `fill`
pub(crate) fn frame_bytes(header: FrameHeader, fill: u8) -> Vec<u8> {
    let mut frame = vec![fill; header.frame_size()];
    frame[..4].copy_from_slice(&header.encode().unwrap());
    frame
}

/// A 128-byte ID3v1 tag
pub(crate) fn id3v1_tag(title: &str) -> Vec<u8> {
    let mut tag = vec![0u8; 128];
    tag[..3].copy_from_slice(b"TAG");
    let title = title.as_bytes();
    let n = title.len().min(30);
    tag[3..3 + n].copy_from_slice(&title[..n]);
    tag
}

/// `frames` frames followed by an ID3v1 tag
pub(crate) fn track_bytes(header: FrameHeader, frames: usize, title: &str) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..frames {
        data.extend(frame_bytes(header, (i % 251) as u8));
    }
    data.extend(id3v1_tag(title));
    data
}

pub(crate) fn write_track(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// In-memory sink that accepts `limit` bytes, then fails like a closed socket
pub(crate) struct LimitedSink {
    pub data: Vec<u8>,
    limit: usize,
}

impl LimitedSink {
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
        }
    }
}

impl AsyncWrite for LimitedSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let room = this.limit - this.data.len();
        if room == 0 && !buf.is_empty() {
            return Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)));
        }
        let n = room.min(buf.len());
        this.data.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Replays a fixed sequence of indices, wrapping around
#[derive(Debug, Clone)]
pub(crate) struct ScriptedSelector {
    script: Vec<usize>,
    position: usize,
}

impl ScriptedSelector {
    pub fn new(script: Vec<usize>) -> Self {
        assert!(!script.is_empty(), "script must not be empty");
        Self { script, position: 0 }
    }
}

impl TrackSelector for ScriptedSelector {
    fn next_index(&mut self, len: usize) -> usize {
        let index = self.script[self.position % self.script.len()];
        self.position += 1;
        index % len
    }
}

#[test]
fn test_scripted_selector_wraps() {
    let mut selector = ScriptedSelector::new(vec![1, 1, 0]);
    let picks: Vec<_> = (0..6).map(|_| selector.next_index(2)).collect();
    assert_eq!(picks, vec![1, 1, 0, 1, 1, 0]);
}
