//! Door override bookkeeping
//!
//! Opening the door forces the fixture to full white. Closing it arms a
//! debounce; once the door has stayed shut long enough the output fades back
//! one unit per channel per step to the color that was showing before the
//! door opened, and the pre-door mode is restored.
//!
//! This type only tracks state and timers. The controller applies the
//! resulting mode changes and device writes.

use std::time::Duration;

use tokio::time::Instant;

use crate::model::{Color, ControllerMode};
use crate::timer::TimerSlot;

/// What was active when the door override began
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorEpisode {
    /// Mode to restore once the fade-back completes
    pub mode: ControllerMode,
    /// Color the fade-back relaxes toward
    pub color: Color,
}

/// One fade-back step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeStep {
    /// Intermediate color to push
    pub color: Color,
    /// Set on the last step, with the mode to restore
    pub finished: Option<ControllerMode>,
}

#[derive(Debug, Default)]
pub struct DoorController {
    episode: Option<DoorEpisode>,
    debounce: TimerSlot,
    fade: TimerSlot,
    cursor: Option<Color>,
}

impl DoorController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember what to return to, unless an episode is already running
    ///
    /// Re-opening the door mid-fade keeps the original snapshot; the
    /// intermediate fade color must never become the restore target.
    pub fn begin_episode(&mut self, mode: ControllerMode, color: Color) -> bool {
        if self.episode.is_some() {
            return false;
        }
        self.episode = Some(DoorEpisode { mode, color });
        true
    }

    /// End the episode and drop all door timers
    pub fn end_episode(&mut self) -> Option<DoorEpisode> {
        self.cancel_pending();
        self.episode.take()
    }

    /// Cancel the debounce and any running fade
    ///
    /// Returns whether anything was pending.
    pub fn cancel_pending(&mut self) -> bool {
        self.cursor = None;
        let debounce = self.debounce.cancel();
        let fade = self.fade.cancel();
        debounce || fade
    }

    /// (Re)start the close debounce
    pub fn arm_debounce(&mut self, now: Instant, delay: Duration) {
        self.debounce.schedule_in(now, delay);
    }

    pub fn debounce_due(&mut self, now: Instant) -> bool {
        self.debounce.take_if_due(now)
    }

    /// Start fading from `from` toward the episode color
    pub fn begin_fade(&mut self, now: Instant, from: Color, step: Duration) {
        self.cursor = Some(from);
        self.fade.schedule_in(now, step);
    }

    pub fn fade_due(&mut self, now: Instant) -> bool {
        self.fade.take_if_due(now)
    }

    /// Advance the fade by one unit per channel
    ///
    /// Schedules the following step unless the target has been reached, in
    /// which case the episode ends. Returns `None` when no fade is running.
    pub fn advance_fade(&mut self, now: Instant, step: Duration) -> Option<FadeStep> {
        let episode = self.episode?;
        let cursor = self.cursor?;

        let next = cursor.step_toward(episode.color);
        if next == episode.color {
            self.end_episode();
            return Some(FadeStep {
                color: next,
                finished: Some(episode.mode),
            });
        }

        self.cursor = Some(next);
        self.fade.schedule_in(now, step);
        Some(FadeStep {
            color: next,
            finished: None,
        })
    }

    pub fn is_debouncing(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.fade.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    #[test]
    fn test_episode_snapshot_is_kept_on_reentry() {
        let mut door = DoorController::new();

        assert!(door.begin_episode(ControllerMode::Manual, Color::new(1, 2, 3)));
        assert!(!door.begin_episode(ControllerMode::Door, Color::WHITE));

        assert_eq!(
            door.end_episode(),
            Some(DoorEpisode {
                mode: ControllerMode::Manual,
                color: Color::new(1, 2, 3)
            })
        );
    }

    #[test]
    fn test_fade_walks_each_channel_to_target() {
        let now = Instant::now();
        let mut door = DoorController::new();
        door.begin_episode(ControllerMode::Pattern, Color::new(253, 255, 250));
        door.begin_fade(now, Color::WHITE, STEP);

        let mut colors = Vec::new();
        let finished = loop {
            let step = door.advance_fade(now, STEP).unwrap();
            colors.push(step.color);
            if let Some(mode) = step.finished {
                break mode;
            }
        };

        assert_eq!(finished, ControllerMode::Pattern);
        assert_eq!(colors.len(), 5);
        assert_eq!(colors[0], Color::new(254, 255, 254));
        assert_eq!(colors[1], Color::new(253, 255, 253));
        assert_eq!(colors.last(), Some(&Color::new(253, 255, 250)));
        assert!(door.end_episode().is_none());
        assert!(!door.is_fading());
    }

    #[test]
    fn test_cancel_pending_is_idempotent() {
        let now = Instant::now();
        let mut door = DoorController::new();
        door.arm_debounce(now, Duration::from_secs(10));

        assert!(door.cancel_pending());
        assert!(!door.cancel_pending());
        assert!(door.next_deadline().is_none());
    }

    #[test]
    fn test_advance_without_fade_is_none() {
        let mut door = DoorController::new();
        door.begin_episode(ControllerMode::Manual, Color::BLACK);

        assert!(door.advance_fade(Instant::now(), STEP).is_none());
    }

    #[test]
    fn test_next_deadline_is_earliest() {
        let now = Instant::now();
        let mut door = DoorController::new();
        door.arm_debounce(now, Duration::from_secs(10));
        door.begin_fade(now, Color::WHITE, STEP);

        assert_eq!(door.next_deadline(), Some(now + STEP));
    }
}
