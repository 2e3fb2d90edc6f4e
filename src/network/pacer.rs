//! Real-time frame pacing
//!
//! Each connection owns one [`Pacer`]. The first frame fixes the origin;
//! every later frame is due at `origin + sum(previous frame durations)`.
//! Deadlines are never re-derived from the current time, so write latency
//! or a late wakeup on one frame does not shift any later deadline.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::codec::Frame;

/// Per-connection pacing clock
#[derive(Debug, Default)]
pub struct Pacer {
    /// Set on the first paced frame
    origin: Option<Instant>,
    /// Sum of the durations of all frames paced so far
    scheduled_micros: u64,
    frames: u64,
    late_frames: u64,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instant of the first paced frame
    pub fn origin(&self) -> Option<Instant> {
        self.origin
    }

    /// Deadline of the next frame, `None` until the first frame is paced
    pub fn next_deadline(&self) -> Option<Instant> {
        self.origin
            .map(|origin| origin + Duration::from_micros(self.scheduled_micros))
    }

    /// Schedule one frame of `duration_micros` at `now`.
    ///
    /// Returns how long to wait before emitting it, or `None` to emit
    /// right away. The schedule advances by `duration_micros` either way.
    pub fn schedule(&mut self, now: Instant, duration_micros: u64) -> Option<Duration> {
        let wait = match self.next_deadline() {
            None => {
                self.origin = Some(now);
                None
            }
            Some(deadline) if deadline > now => Some(deadline - now),
            Some(deadline) => {
                if deadline < now {
                    self.late_frames += 1;
                }
                None
            }
        };

        self.scheduled_micros += duration_micros;
        self.frames += 1;
        wait
    }

    /// Wait for the frame's deadline, then write it in one call.
    pub async fn emit<W>(&mut self, sink: &mut W, frame: &Frame) -> io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let now = Instant::now();
        if let Some(wait) = self.schedule(now, frame.duration_micros()) {
            tokio::time::sleep_until(now + wait).await;
        }
        sink.write_all(frame.as_bytes()).await
    }

    pub fn stats(&self) -> PacerStats {
        PacerStats {
            frames: self.frames,
            late_frames: self.late_frames,
            scheduled: Duration::from_micros(self.scheduled_micros),
        }
    }
}

/// Pacer statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacerStats {
    pub frames: u64,
    /// Frames emitted after their deadline had already passed
    pub late_frames: u64,
    /// Total real time covered by the paced frames
    pub scheduled: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FrameHeader;
    use bytes::BytesMut;

    const FRAME_MICROS: u64 = 26_122;

    fn test_frame() -> Frame {
        let header = FrameHeader {
            sample_rate: 44100,
            bitrate_kbps: 128,
            padding: false,
        };
        let mut data = BytesMut::zeroed(header.frame_size());
        data[..4].copy_from_slice(&header.encode().unwrap());
        Frame::new(header, data)
    }

    #[test]
    fn test_first_frame_does_not_wait() {
        let mut pacer = Pacer::new();
        assert!(pacer.next_deadline().is_none());

        let now = Instant::now();
        assert_eq!(pacer.schedule(now, FRAME_MICROS), None);
        assert_eq!(pacer.origin(), Some(now));
        assert_eq!(
            pacer.next_deadline(),
            Some(now + Duration::from_micros(FRAME_MICROS))
        );
    }

    #[test]
    fn test_no_drift_over_ten_thousand_frames() {
        let mut pacer = Pacer::new();
        let start = Instant::now();
        let mut now = start;

        for k in 0..10_000u64 {
            let wait = pacer.schedule(now, FRAME_MICROS);
            if k == 0 {
                assert_eq!(wait, None);
            } else {
                assert_eq!(wait, Some(Duration::from_micros(FRAME_MICROS)));
            }
            now += wait.unwrap_or_default();
            assert_eq!(now, start + Duration::from_micros(k * FRAME_MICROS));
            assert_eq!(
                pacer.next_deadline(),
                Some(start + Duration::from_micros((k + 1) * FRAME_MICROS))
            );
        }
        assert_eq!(pacer.stats().late_frames, 0);
    }

    #[test]
    fn test_behind_schedule_emits_immediately_and_keeps_ladder() {
        let mut pacer = Pacer::new();
        let start = Instant::now();
        pacer.schedule(start, FRAME_MICROS);

        // Stall for five frames worth of time
        let stalled = start + Duration::from_micros(5 * FRAME_MICROS);
        assert_eq!(pacer.schedule(stalled, FRAME_MICROS), None);
        assert_eq!(pacer.schedule(stalled, FRAME_MICROS), None);

        // Deadlines stay on the initial ladder, not rebased to `stalled`
        assert_eq!(
            pacer.next_deadline(),
            Some(start + Duration::from_micros(3 * FRAME_MICROS))
        );
        assert_eq!(pacer.stats().late_frames, 2);

        // Catching up to the ladder resumes waiting
        for _ in 0..3 {
            pacer.schedule(stalled, FRAME_MICROS);
        }
        assert_eq!(
            pacer.schedule(stalled, FRAME_MICROS),
            Some(Duration::from_micros(FRAME_MICROS))
        );
    }

    #[test]
    fn test_mixed_durations_accumulate_exactly() {
        let mut pacer = Pacer::new();
        let start = Instant::now();
        let durations = [26_122u64, 24_000, 36_000, 52_244];

        let mut total = 0;
        for d in durations.iter().cycle().take(4_000) {
            pacer.schedule(start, *d);
            total += d;
        }
        assert_eq!(
            pacer.next_deadline(),
            Some(start + Duration::from_micros(total))
        );
        assert_eq!(pacer.stats().scheduled, Duration::from_micros(total));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emit_paces_in_real_time() {
        let mut pacer = Pacer::new();
        let mut sink = Vec::<u8>::new();
        let frame = test_frame();
        let start = Instant::now();

        for _ in 0..100 {
            pacer.emit(&mut sink, &frame).await.unwrap();
        }

        assert_eq!(sink.len(), 100 * frame.len());

        // The last frame leaves at 99 frame durations after the first,
        // within the timer's millisecond granularity.
        let elapsed = start.elapsed();
        let expected = Duration::from_micros(99 * FRAME_MICROS);
        assert!(elapsed >= expected, "{:?} < {:?}", elapsed, expected);
        assert!(elapsed < expected + Duration::from_millis(2));
        assert_eq!(
            pacer.next_deadline(),
            Some(start + Duration::from_micros(100 * FRAME_MICROS))
        );
    }
}
