//! Frame scheduling for the cooperative render loop.
//!
//! The scheduler decides *when* a frame is due and how far along the
//! session is; it never draws anything itself. Timestamps are injected by
//! the caller (a vsync source in production, a synthetic sequence in tests),
//! and progress is always `elapsed_ms / total_ms`, so a slow or uneven frame
//! rate never stretches the recording.

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};

/// What the progress is normalized against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopCondition {
    /// Fixed animation length.
    FixedDuration { total_ms: f64 },
    /// Length of the source media being played back.
    MediaDuration { total_ms: f64 },
}

impl StopCondition {
    pub fn total_ms(&self) -> f64 {
        match self {
            Self::FixedDuration { total_ms } | Self::MediaDuration { total_ms } => *total_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SchedulerState {
    Idle,
    Running { started_at_ms: f64 },
    Stopped,
}

/// Result of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Render a frame at `progress`; stop afterwards when `is_last`.
    Frame {
        progress: f64,
        elapsed_ms: f64,
        frame_index: u64,
        is_last: bool,
    },
    /// The loop has ended; nothing to draw.
    Finished,
}

/// Start/stop/tick scheduler for one recording session.
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    condition: StopCondition,
    state: SchedulerState,
    last_elapsed_ms: f64,
    frames: u64,
}

impl AnimationScheduler {
    pub fn new(condition: StopCondition) -> Self {
        Self {
            condition,
            state: SchedulerState::Idle,
            last_elapsed_ms: 0.0,
            frames: 0,
        }
    }

    /// Scheduler for a fixed-length animation.
    pub fn for_animation(duration_ms: f64) -> Self {
        Self::new(StopCondition::FixedDuration {
            total_ms: duration_ms,
        })
    }

    /// Scheduler that follows a media source of `duration_secs`.
    pub fn for_media(duration_secs: f64) -> Self {
        Self::new(StopCondition::MediaDuration {
            total_ms: duration_secs * 1000.0,
        })
    }

    pub fn condition(&self) -> StopCondition {
        self.condition
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SchedulerState::Stopped
    }

    /// Frames handed out so far.
    pub fn frames_scheduled(&self) -> u64 {
        self.frames
    }

    /// Anchor the session at `now_ms`.
    pub fn start(&mut self, now_ms: f64) -> ClipdeckResult<()> {
        if self.state != SchedulerState::Idle {
            return Err(ClipdeckError::session("Scheduler was already started"));
        }
        self.state = SchedulerState::Running {
            started_at_ms: now_ms,
        };
        tracing::debug!(condition = ?self.condition, "Scheduler started");
        Ok(())
    }

    /// Advance to `now_ms` and report what to draw.
    pub fn tick(&mut self, now_ms: f64) -> Tick {
        let SchedulerState::Running { started_at_ms } = self.state else {
            return Tick::Finished;
        };

        // Timestamps going backwards count as no time passing.
        let elapsed_ms = (now_ms - started_at_ms).max(self.last_elapsed_ms);
        self.last_elapsed_ms = elapsed_ms;

        let total_ms = self.condition.total_ms();
        let progress = if total_ms <= 0.0 {
            1.0
        } else {
            (elapsed_ms / total_ms).min(1.0)
        };
        let is_last = progress >= 1.0;

        let frame_index = self.frames;
        self.frames += 1;
        if is_last {
            self.state = SchedulerState::Stopped;
            tracing::debug!(frames = self.frames, elapsed_ms, "Scheduler reached end");
        }

        Tick::Frame {
            progress,
            elapsed_ms,
            frame_index,
            is_last,
        }
    }

    /// Halt the loop. Returns false when it was not running.
    pub fn stop(&mut self) -> bool {
        if self.state == SchedulerState::Stopped {
            return false;
        }
        let was_running = self.is_running();
        self.state = SchedulerState::Stopped;
        was_running
    }

    /// Milliseconds elapsed at the most recent tick.
    pub fn elapsed_ms(&self) -> f64 {
        self.last_elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_of(tick: Tick) -> f64 {
        match tick {
            Tick::Frame { progress, .. } => progress,
            Tick::Finished => panic!("expected a frame"),
        }
    }

    #[test]
    fn test_progress_tracks_wall_clock_not_frames() {
        let mut scheduler = AnimationScheduler::for_animation(5000.0);
        scheduler.start(1000.0).unwrap();
        assert_eq!(progress_of(scheduler.tick(1000.0)), 0.0);
        // One slow frame covering half the animation.
        assert!((progress_of(scheduler.tick(3500.0)) - 0.5).abs() < 1e-12);
        assert_eq!(scheduler.frames_scheduled(), 2);
    }

    #[test]
    fn test_final_frame_is_rendered_then_finished() {
        let mut scheduler = AnimationScheduler::for_animation(100.0);
        scheduler.start(0.0).unwrap();
        match scheduler.tick(150.0) {
            Tick::Frame {
                progress, is_last, ..
            } => {
                assert_eq!(progress, 1.0);
                assert!(is_last);
            }
            Tick::Finished => panic!("final frame must be drawn"),
        }
        assert_eq!(scheduler.tick(200.0), Tick::Finished);
        assert!(scheduler.is_stopped());
    }

    #[test]
    fn test_backwards_timestamp_does_not_rewind() {
        let mut scheduler = AnimationScheduler::for_media(10.0);
        scheduler.start(0.0).unwrap();
        let a = progress_of(scheduler.tick(4000.0));
        let b = progress_of(scheduler.tick(3000.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut scheduler = AnimationScheduler::for_animation(1000.0);
        scheduler.start(0.0).unwrap();
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert_eq!(scheduler.tick(10.0), Tick::Finished);
        assert!(scheduler.start(0.0).is_err());
    }

    #[test]
    fn test_tick_before_start_is_finished() {
        let mut scheduler = AnimationScheduler::for_animation(1000.0);
        assert_eq!(scheduler.tick(0.0), Tick::Finished);
    }

    #[test]
    fn test_zero_duration_emits_single_last_frame() {
        let mut scheduler = AnimationScheduler::for_media(0.0);
        scheduler.start(0.0).unwrap();
        assert!(matches!(
            scheduler.tick(0.0),
            Tick::Frame { is_last: true, .. }
        ));
    }
}
