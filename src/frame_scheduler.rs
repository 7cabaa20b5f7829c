//! Frame pacing.
//!
//! Every protocol mandates a minimum interval between frame starts (wire time
//! plus reset gap). No timer is owned here: the caller passes the current
//! time and sleeps as it sees fit.

use embassy_time::{Duration, Instant};

/// Floor applied to every refresh interval.
pub const MIN_FRAME_DURATION: Duration = Duration::from_micros(100);

/// Tracks when the current frame started and when the next one may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTimer {
    frame_start: Option<Instant>,
    frame_min_duration: Duration,
}

impl RefreshTimer {
    pub const fn new(frame_min_duration: Duration) -> Self {
        Self {
            frame_start: None,
            frame_min_duration,
        }
    }

    pub fn from_micros(us: u32) -> Self {
        Self::new(Duration::from_micros(u64::from(us)))
    }

    pub const fn frame_min_duration(&self) -> Duration {
        self.frame_min_duration
    }

    pub fn set_frame_min_duration(&mut self, duration: Duration) {
        self.frame_min_duration = duration;
    }

    fn effective_duration(&self) -> Duration {
        if self.frame_min_duration < MIN_FRAME_DURATION {
            MIN_FRAME_DURATION
        } else {
            self.frame_min_duration
        }
    }

    /// Whether enough time has passed since the last frame start.
    pub fn can_refresh(&self, now: Instant) -> bool {
        match self.frame_start {
            None => true,
            Some(start) => now.saturating_duration_since(start) >= self.effective_duration(),
        }
    }

    pub fn mark_frame_start(&mut self, now: Instant) {
        self.frame_start = Some(now);
    }

    /// Forget the last frame so the next poll refreshes immediately.
    pub fn reset(&mut self) {
        self.frame_start = None;
    }

    /// Earliest instant the next frame may start.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.frame_start.map(|start| start + self.effective_duration())
    }

    /// How long to wait before the next frame, zero if it is due.
    pub fn sleep_duration(&self, now: Instant) -> Duration {
        match self.next_deadline() {
            Some(deadline) if deadline > now => deadline - now,
            _ => Duration::from_ticks(0),
        }
    }
}
