//! Configuration types for the lumen-controller crate
//!
//! This module defines the timing and buffering knobs of the controller:
//! frame cadence, door debounce and fade timing, and the introductory color
//! sequence played whenever the fixture (re)connects.

use std::time::Duration;

use crate::error::{ControllerError, Result};
use crate::model::{Color, ControllerMode};

/// Upper bound for every timer duration in the configuration
pub const MAX_TIMER_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for a `LightController`
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Nominal time between two frames
    /// Default: 50 ms (20 Hz)
    pub frame_interval: Duration,

    /// Delay used whenever the next frame should run "immediately"
    /// (audio modes and catch-up after an overrun)
    /// Default: zero
    pub immediate_delay: Duration,

    /// How long the door must stay closed before the fade-back starts
    /// Default: 10 seconds
    pub door_debounce: Duration,

    /// Interval between two fade-back steps
    /// Default: 100 ms
    pub fade_step: Duration,

    /// Hold time for each color of the introductory sequence
    /// Default: 250 ms
    pub intro_step: Duration,

    /// Colors flashed on (re)connect before the target color is restored
    /// Default: red, green, blue, black
    pub intro_sequence: Vec<Color>,

    /// Capacity of the broadcast channel feeding listeners
    /// Default: 64
    pub event_buffer_size: usize,

    /// Mode used when nothing has been persisted yet
    /// Default: autopilot
    pub initial_mode: ControllerMode,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(50),
            immediate_delay: Duration::ZERO,
            door_debounce: Duration::from_secs(10),
            fade_step: Duration::from_millis(100),
            intro_step: Duration::from_millis(250),
            intro_sequence: vec![Color::RED, Color::GREEN, Color::BLUE, Color::BLACK],
            event_buffer_size: 64,
            initial_mode: ControllerMode::AutoPilot,
        }
    }
}

impl ControllerConfig {
    /// Create a ControllerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Short debounce and intro, handy for demos and manual testing
    pub fn fast() -> Self {
        Self {
            door_debounce: Duration::from_secs(2),
            fade_step: Duration::from_millis(10),
            intro_step: Duration::from_millis(100),
            ..Default::default()
        }
    }

    /// Set the nominal frame interval
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set the door close debounce
    pub fn with_door_debounce(mut self, debounce: Duration) -> Self {
        self.door_debounce = debounce;
        self
    }

    /// Set the fade-back step interval
    pub fn with_fade_step(mut self, step: Duration) -> Self {
        self.fade_step = step;
        self
    }

    /// Set the introductory hold time
    pub fn with_intro_step(mut self, step: Duration) -> Self {
        self.intro_step = step;
        self
    }

    /// Set the delay used for "immediate" rescheduling
    pub fn with_immediate_delay(mut self, delay: Duration) -> Self {
        self.immediate_delay = delay;
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.frame_interval.is_zero() {
            return Err(ControllerError::Configuration(
                "Frame interval must be greater than 0".to_string(),
            ));
        }

        if self.fade_step.is_zero() {
            return Err(ControllerError::Configuration(
                "Fade step must be greater than 0".to_string(),
            ));
        }

        for (name, duration) in [
            ("Frame interval", self.frame_interval),
            ("Door debounce", self.door_debounce),
            ("Fade step", self.fade_step),
            ("Intro step", self.intro_step),
        ] {
            if duration > MAX_TIMER_DURATION {
                return Err(ControllerError::Configuration(format!(
                    "{} must not exceed {:?}",
                    name, MAX_TIMER_DURATION
                )));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(ControllerError::Configuration(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if !self.initial_mode.is_externally_selectable() {
            return Err(ControllerError::Configuration(format!(
                "Initial mode cannot be {}",
                self.initial_mode
            )));
        }

        if self.immediate_delay >= self.frame_interval {
            return Err(ControllerError::Configuration(
                "Immediate delay must be shorter than the frame interval".to_string(),
            ));
        }

        Ok(())
    }
}
