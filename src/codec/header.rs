//! MPEG audio frame header decoding
//!
//! Only Layer III headers of the MPEG-1 and MPEG-2 families are accepted.
//! Anything else, including trailing tag data at the end of a file, decodes
//! as [`CodecError::InvalidHeader`].

use crate::error::CodecError;

/// Top 12 bits of the header word
const SYNC_MASK: u32 = 0xFFF0_0000;

/// Version field value for MPEG-1 (table column 0)
const VERSION_MPEG1: u32 = 3;

/// Lowest accepted version field value (MPEG-2)
const VERSION_MIN: u32 = 2;

/// Layer field value for Layer III
const LAYER_III: u32 = 1;

/// Bitrates in kbps, indexed by `[bitrate_index][column]`
const BITRATE_TABLE: [[Option<u32>; 2]; 16] = [
    [None, None],
    [Some(32), Some(8)],
    [Some(40), Some(16)],
    [Some(48), Some(24)],
    [Some(56), Some(32)],
    [Some(64), Some(40)],
    [Some(80), Some(48)],
    [Some(96), Some(56)],
    [Some(112), Some(64)],
    [Some(128), Some(80)],
    [Some(160), Some(96)],
    [Some(192), Some(112)],
    [Some(224), Some(128)],
    [Some(256), Some(144)],
    [Some(320), Some(160)],
    [None, None],
];

/// Sample rates in Hz, indexed by `[sample_rate_index][column]`
const SAMPLE_RATE_TABLE: [[Option<u32>; 2]; 4] = [
    [Some(44100), Some(22050)],
    [Some(48000), Some(24000)],
    [Some(32000), Some(16000)],
    [None, None],
];

/// Decoded frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bitrate in kbps
    pub bitrate_kbps: u32,
    /// Padding flag (one extra byte in the frame)
    pub padding: bool,
}

impl FrameHeader {
    /// Decode the 4 header bytes (big-endian).
    pub fn decode(bytes: [u8; 4]) -> Result<Self, CodecError> {
        let word = u32::from_be_bytes(bytes);
        if word & SYNC_MASK != SYNC_MASK {
            return Err(CodecError::InvalidHeader(word));
        }

        let version = (word >> 19) & 0x3;
        let layer = (word >> 17) & 0x3;
        let bitrate_index = ((word >> 12) & 0xF) as usize;
        let sample_rate_index = ((word >> 10) & 0x3) as usize;
        let padding = (word >> 9) & 0x1 == 1;

        if version < VERSION_MIN || layer != LAYER_III {
            return Err(CodecError::InvalidHeader(word));
        }

        let column = Self::column(version);
        let bitrate_kbps =
            BITRATE_TABLE[bitrate_index][column].ok_or(CodecError::InvalidHeader(word))?;
        let sample_rate =
            SAMPLE_RATE_TABLE[sample_rate_index][column].ok_or(CodecError::InvalidHeader(word))?;

        Ok(Self {
            sample_rate,
            bitrate_kbps,
            padding,
        })
    }

    /// Encode back into header bytes.
    ///
    /// Returns `None` when the bitrate/sample-rate pair is not in the same
    /// table column. Fields the decoder ignores (protection, mode, emphasis)
    /// are written as zero.
    pub fn encode(&self) -> Option<[u8; 4]> {
        for (column, version) in [(0usize, VERSION_MPEG1), (1, VERSION_MIN)] {
            let rate_index = SAMPLE_RATE_TABLE
                .iter()
                .position(|row| row[column] == Some(self.sample_rate));
            let bitrate_index = BITRATE_TABLE
                .iter()
                .position(|row| row[column] == Some(self.bitrate_kbps));

            if let (Some(rate_index), Some(bitrate_index)) = (rate_index, bitrate_index) {
                let word = SYNC_MASK
                    | version << 19
                    | LAYER_III << 17
                    | (bitrate_index as u32) << 12
                    | (rate_index as u32) << 10
                    | u32::from(self.padding) << 9;
                return Some(word.to_be_bytes());
            }
        }
        None
    }

    /// Every header the decoder accepts, one per table combination.
    pub fn all_valid() -> impl Iterator<Item = FrameHeader> {
        (0..2usize).flat_map(|column| {
            SAMPLE_RATE_TABLE
                .into_iter()
                .filter_map(move |row| row[column])
                .flat_map(move |sample_rate| {
                    BITRATE_TABLE
                        .into_iter()
                        .filter_map(move |row| row[column])
                        .flat_map(move |bitrate_kbps| {
                            [false, true].into_iter().map(move |padding| FrameHeader {
                                sample_rate,
                                bitrate_kbps,
                                padding,
                            })
                        })
                })
        })
    }

    fn column(version: u32) -> usize {
        if version == VERSION_MPEG1 {
            0
        } else {
            1
        }
    }
}
