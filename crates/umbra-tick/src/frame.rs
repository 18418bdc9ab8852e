//! Wall-clock frame pacing.
//!
//! [`FrameLoop`] decides *when* the next simulation frame should run. It
//! never runs game code itself; the caller awaits
//! [`FrameLoop::wait_for_frame`] and then steps the simulation with the
//! returned fixed `dt`.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a frame wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePolicy {
    /// Forget the missed frames and schedule the next one from now.
    #[default]
    Skip,
    /// Keep the original cadence. The next frame is due one period after
    /// the missed deadline, which may already be in the past.
    Drop,
}

/// Settings for a [`FrameLoop`].
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Frames per second. Clamped to `1..=MAX_RATE_HZ`.
    pub rate_hz: u32,
    /// Late-frame handling.
    pub policy: FramePolicy,
    /// Upper bound (µs) of random delay added before the first frame.
    pub start_jitter_us: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            rate_hz: 30,
            policy: FramePolicy::default(),
            start_jitter_us: 1_000,
        }
    }
}

impl FrameConfig {
    /// Highest supported frame rate.
    pub const MAX_RATE_HZ: u32 = 128;

    /// Config for `rate_hz` with every other field defaulted.
    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    /// Returns a copy with `rate_hz` forced into the supported range.
    pub fn validated(mut self) -> Self {
        let clamped = self.rate_hz.clamp(1, Self::MAX_RATE_HZ);
        if clamped != self.rate_hz {
            warn!(
                requested = self.rate_hz,
                used = clamped,
                "frame rate out of range, clamping"
            );
            self.rate_hz = clamped;
        }
        self
    }

    /// Length of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Per-frame info and stats
// ---------------------------------------------------------------------------

/// Returned once per frame by [`FrameLoop::wait_for_frame`].
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Fixed simulation step. Always the configured frame duration.
    pub dt: Duration,
    /// `true` when the wake-up was more than 10% of a frame late.
    pub late: bool,
    /// Whole frames skipped because of lateness (`Skip` policy only).
    pub frames_skipped: u64,
}

/// Running totals kept by a [`FrameLoop`].
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Frames produced.
    pub frames: u64,
    /// Frames that woke up late.
    pub late_frames: u64,
    /// Frames dropped by the `Skip` policy.
    pub skipped_frames: u64,
}

// ---------------------------------------------------------------------------
// FrameLoop
// ---------------------------------------------------------------------------

/// Fixed-rate frame pacer on Tokio time.
pub struct FrameLoop {
    config: FrameConfig,
    period: Duration,
    frame: u64,
    next_due: Instant,
    paused: bool,
    stats: FrameStats,
}

impl FrameLoop {
    /// Creates a pacer. The first frame is due one period from now plus a
    /// random start jitter.
    pub fn new(config: FrameConfig) -> Self {
        let config = config.validated();
        let period = config.frame_duration();
        let jitter = if config.start_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.start_jitter_us))
        } else {
            Duration::ZERO
        };

        debug!(
            rate_hz = config.rate_hz,
            period_ms = period.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "frame loop created"
        );

        Self {
            config,
            period,
            frame: 0,
            next_due: Instant::now() + period + jitter,
            paused: false,
            stats: FrameStats::default(),
        }
    }

    /// Creates a pacer for `rate_hz` with default settings.
    pub fn with_rate(rate_hz: u32) -> Self {
        Self::new(FrameConfig::with_rate(rate_hz))
    }

    /// Waits for the next frame.
    ///
    /// While paused this future never resolves, which lets it sit in a
    /// `tokio::select!` next to a shutdown branch.
    pub async fn wait_for_frame(&mut self) -> FrameInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let due = self.next_due;
        time::sleep_until(due).await;

        let now = Instant::now();
        let behind = now.saturating_duration_since(due);
        let late = behind > self.period / 10;
        let mut frames_skipped = 0;

        self.next_due = match self.config.policy {
            FramePolicy::Skip => {
                if late {
                    frames_skipped = whole_periods(behind, self.period);
                    if frames_skipped > 0 {
                        warn!(
                            frame = self.frame + 1,
                            skipped = frames_skipped,
                            behind_ms = behind.as_secs_f64() * 1000.0,
                            "frame late, skipping ahead"
                        );
                    }
                }
                now + self.period
            }
            FramePolicy::Drop => {
                if late {
                    warn!(
                        frame = self.frame + 1,
                        behind_ms = behind.as_secs_f64() * 1000.0,
                        "frame late, keeping cadence"
                    );
                }
                due + self.period
            }
        };

        self.frame += 1;
        self.stats.frames += 1;
        self.stats.skipped_frames += frames_skipped;
        if late {
            self.stats.late_frames += 1;
        }

        trace!(frame = self.frame, late, "frame due");

        FrameInfo {
            frame: self.frame,
            dt: self.period,
            late,
            frames_skipped,
        }
    }

    /// Stops producing frames until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(frame = self.frame, "frame loop paused");
        }
    }

    /// Resumes after a pause. The next frame is due one period from now,
    /// so time spent paused is not replayed. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_due = Instant::now() + self.period;
            debug!(frame = self.frame, "frame loop resumed");
        }
    }

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Frames produced so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Configured rate after validation.
    pub fn rate_hz(&self) -> u32 {
        self.config.rate_hz
    }

    /// Fixed frame duration.
    pub fn frame_duration(&self) -> Duration {
        self.period
    }

    /// Running totals.
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }
}

fn whole_periods(behind: Duration, period: Duration) -> u64 {
    let period_ns = period.as_nanos().max(1);
    u64::try_from(behind.as_nanos() / period_ns).unwrap_or(u64::MAX)
}
