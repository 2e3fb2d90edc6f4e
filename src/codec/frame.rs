//! Frame size and duration

use bytes::{Bytes, BytesMut};

use super::header::FrameHeader;

/// Samples per Layer III frame
pub const SAMPLES_PER_FRAME: u64 = 1152;

/// Size of the frame header in bytes
pub const HEADER_LEN: usize = 4;

impl FrameHeader {
    /// Total frame length in bytes, header included.
    ///
    /// Evaluated left to right with truncating integer division; frame
    /// boundaries in the byte stream depend on the exact result.
    pub fn frame_size(&self) -> usize {
        let bytes = u64::from(self.bitrate_kbps) * 1000 / 8 * SAMPLES_PER_FRAME
            / u64::from(self.sample_rate)
            + u64::from(self.padding);
        bytes as usize
    }

    /// Real-time playback duration of one frame, in microseconds.
    pub fn duration_micros(&self) -> u64 {
        1_000_000 * SAMPLES_PER_FRAME / u64::from(self.sample_rate)
    }

    /// Payload length following the header.
    pub fn payload_len(&self) -> usize {
        self.frame_size().saturating_sub(HEADER_LEN)
    }
}

/// One frame as read from a track: header bytes followed by the payload.
///
/// The payload may be shorter than the header announces when the file
/// ends mid-frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub header: FrameHeader,
    data: Bytes,
}

impl Frame {
    pub fn new(header: FrameHeader, data: BytesMut) -> Self {
        Self {
            header,
            data: data.freeze(),
        }
    }

    /// Header and payload, ready to be written in one call
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the payload was cut short by end of file
    pub fn is_truncated(&self) -> bool {
        self.data.len() < self.header.frame_size()
    }

    pub fn duration_micros(&self) -> u64 {
        self.header.duration_micros()
    }
}
