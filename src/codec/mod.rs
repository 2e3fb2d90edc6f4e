//! MPEG audio frame parsing
//!
//! Decodes Layer III frame headers and derives each frame's byte length
//! and real-time duration from them.

pub mod header;
pub mod frame;

pub use header::FrameHeader;
pub use frame::{Frame, HEADER_LEN, SAMPLES_PER_FRAME};
