//! Target and last-pushed colors

use crate::model::Color;

/// The color that should be shown and the color the device last confirmed
///
/// `last_pushed` only moves when a write actually reached the device and
/// listeners, so a refused write is retried on the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorState {
    target: Color,
    last_pushed: Color,
}

impl ColorState {
    pub fn new(target: Color) -> Self {
        Self {
            target,
            last_pushed: Color::BLACK,
        }
    }

    pub fn target(&self) -> Color {
        self.target
    }

    pub fn last_pushed(&self) -> Color {
        self.last_pushed
    }

    pub fn set_target(&mut self, color: Color) {
        self.target = color;
    }

    /// Whether any channel of the target differs from the last push
    pub fn has_changed(&self) -> bool {
        self.target != self.last_pushed
    }

    /// Record that `color` reached the device
    pub fn mark_pushed(&mut self, color: Color) {
        self.last_pushed = color;
    }
}
