//! RGB color triple

use std::fmt;

use serde::{Deserialize, Serialize};

/// Three 8-bit channel intensities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from untrusted channel values, clamping each to `0..=255`
    pub fn clamped(r: i64, g: i64, b: i64) -> Self {
        Self {
            r: clamp_channel(r),
            g: clamp_channel(g),
            b: clamp_channel(b),
        }
    }

    /// Move every channel one unit toward `target`
    ///
    /// Channels are independent: one that already matches stays put while the
    /// others keep moving.
    pub fn step_toward(self, target: Color) -> Self {
        Self {
            r: step_channel(self.r, target.r),
            g: step_channel(self.g, target.g),
            b: step_channel(self.b, target.b),
        }
    }

    pub const fn as_tuple(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

fn clamp_channel(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}

fn step_channel(current: u8, target: u8) -> u8 {
    match current.cmp(&target) {
        std::cmp::Ordering::Greater => current - 1,
        std::cmp::Ordering::Less => current + 1,
        std::cmp::Ordering::Equal => current,
    }
}
