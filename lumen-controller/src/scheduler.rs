//! Frame pacing and the connect sequence
//!
//! The frame loop never recurses and never busy-waits: after each frame the
//! scheduler arms its single slot with the delay until the next one.
//!
//! # Timing
//!
//! ```text
//! start ──evaluate/push──▶ end      next frame
//!   │◀──── elapsed ────▶│◀── interval - elapsed ──▶│
//! ```
//!
//! Audio modes and overrun frames skip the wait and reschedule immediately.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::model::{Color, ControllerMode};
use crate::timer::TimerSlot;

#[derive(Debug)]
pub struct FrameScheduler {
    slot: TimerSlot,
    interval: Duration,
    immediate: Duration,
    lagging: bool,
}

impl FrameScheduler {
    pub fn new(interval: Duration, immediate: Duration) -> Self {
        Self {
            slot: TimerSlot::new(),
            interval,
            immediate,
            lagging: false,
        }
    }

    /// Start the loop with a frame right away
    pub fn start(&mut self, now: Instant) {
        self.lagging = false;
        self.slot.schedule_in(now, self.immediate);
    }

    /// Tear the loop down; idempotent
    pub fn stop(&mut self) -> bool {
        self.slot.cancel()
    }

    pub fn is_running(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn is_lagging(&self) -> bool {
        self.lagging
    }

    pub fn frame_due(&mut self, now: Instant) -> bool {
        self.slot.take_if_due(now)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.slot.deadline()
    }

    /// Delay before the next frame, given how long this one took
    pub fn next_delay(&mut self, mode: ControllerMode, elapsed: Duration) -> Duration {
        if elapsed > self.interval {
            warn!(
                "Frame took {:?} (budget {:?}), running behind; catching up",
                elapsed, self.interval
            );
            self.lagging = true;
            return self.immediate;
        }

        if self.lagging {
            info!("Frame timing back within budget");
            self.lagging = false;
        }

        if mode.is_audio() {
            self.immediate
        } else {
            self.interval - elapsed
        }
    }

    /// Arm the slot for the next frame
    pub fn schedule_next(&mut self, now: Instant, delay: Duration) {
        self.slot.schedule_in(now, delay);
    }
}

/// What the intro wants written next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroStep {
    /// Show this color and hold
    Show(Color),
    /// Sequence done; restore the target color and start the frame loop
    Restore,
}

/// The red/green/blue/black flash played on every (re)connect
#[derive(Debug)]
pub struct IntroSequence {
    colors: Vec<Color>,
    hold: Duration,
    next_index: usize,
    slot: TimerSlot,
}

impl IntroSequence {
    pub fn new(colors: Vec<Color>, hold: Duration) -> Self {
        Self {
            colors,
            hold,
            next_index: 0,
            slot: TimerSlot::new(),
        }
    }

    /// Rewind and fire the first step immediately
    pub fn start(&mut self, now: Instant) {
        self.next_index = 0;
        self.slot.schedule_in(now, Duration::ZERO);
    }

    pub fn stop(&mut self) -> bool {
        self.slot.cancel()
    }

    pub fn is_playing(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn step_due(&mut self, now: Instant) -> bool {
        self.slot.take_if_due(now)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.slot.deadline()
    }

    /// Produce the next step, arming the hold timer if more follow
    pub fn advance(&mut self, now: Instant) -> IntroStep {
        match self.colors.get(self.next_index).copied() {
            Some(color) => {
                self.next_index += 1;
                self.slot.schedule_in(now, self.hold);
                IntroStep::Show(color)
            }
            None => IntroStep::Restore,
        }
    }
}
