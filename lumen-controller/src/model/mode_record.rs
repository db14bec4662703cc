//! Current/previous mode bookkeeping

use serde::{Deserialize, Serialize};

use super::ControllerMode;

/// Outcome of a requested mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The mode actually changed
    Changed {
        from: ControllerMode,
        to: ControllerMode,
    },
    /// The requested mode was already active
    Unchanged(ControllerMode),
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        matches!(self, Transition::Changed { .. })
    }

    /// The mode in effect once the transition was applied
    pub fn current(&self) -> ControllerMode {
        match *self {
            Transition::Changed { to, .. } => to,
            Transition::Unchanged(mode) => mode,
        }
    }
}

/// The active mode plus the one that was active before the last real transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRecord {
    pub current: ControllerMode,
    pub previous: ControllerMode,
}

impl ModeRecord {
    pub fn new(initial: ControllerMode) -> Self {
        Self {
            current: initial,
            previous: initial,
        }
    }

    /// Apply a requested mode, updating `previous` only on a real transition
    pub fn transition(&mut self, requested: ControllerMode) -> Transition {
        if requested == self.current {
            return Transition::Unchanged(requested);
        }

        let from = self.current;
        self.previous = from;
        self.current = requested;
        Transition::Changed {
            from,
            to: requested,
        }
    }

    /// Switch `current` without touching `previous`
    ///
    /// Used for the door override, which must not become anyone's "previous".
    pub fn replace_current(&mut self, mode: ControllerMode) -> Transition {
        if mode == self.current {
            return Transition::Unchanged(mode);
        }

        let from = self.current;
        self.current = mode;
        Transition::Changed { from, to: mode }
    }
}

impl Default for ModeRecord {
    fn default() -> Self {
        Self::new(ControllerMode::default())
    }
}
