//! Stand-in pattern generator and audio engine
//!
//! The real fixture runs a scheduled pattern generator and an audio analysis
//! pipeline. The daemon ships time-driven stand-ins so every mode produces
//! visible output.

use std::f64::consts::TAU;
use std::time::Duration;

use lumen_controller::{AudioSource, Color, PatternSource};
use tokio::time::Instant;

/// Crossfades through a palette, holding each entry for `hold`
#[derive(Debug, Clone)]
pub struct PaletteCycle {
    palette: Vec<Color>,
    hold: Duration,
    started: Instant,
}

impl PaletteCycle {
    pub fn new(palette: Vec<Color>, hold: Duration) -> Self {
        Self {
            palette,
            hold,
            started: Instant::now(),
        }
    }

    /// Color `elapsed` into the cycle
    pub fn color_at(&self, elapsed: Duration) -> Color {
        let len = self.palette.len();
        if len == 0 || self.hold.is_zero() {
            return self.palette.first().copied().unwrap_or(Color::BLACK);
        }

        let position = elapsed.as_secs_f64() / self.hold.as_secs_f64();
        let index = position.floor() as usize % len;
        let from = self.palette[index];
        let to = self.palette[(index + 1) % len];
        mix(from, to, position.fract())
    }
}

impl Default for PaletteCycle {
    fn default() -> Self {
        Self::new(
            vec![
                Color::new(255, 96, 0),
                Color::new(200, 0, 120),
                Color::new(40, 0, 255),
                Color::new(0, 180, 160),
            ],
            Duration::from_secs(8),
        )
    }
}

impl PatternSource for PaletteCycle {
    fn current_color(&mut self) -> Color {
        self.color_at(self.started.elapsed())
    }
}

/// Pulses a base color like a steady beat
#[derive(Debug, Clone)]
pub struct Pulse {
    base: Color,
    period: Duration,
    started: Instant,
}

impl Pulse {
    pub fn new(base: Color, period: Duration) -> Self {
        Self {
            base,
            period,
            started: Instant::now(),
        }
    }

    /// Color `elapsed` into the pulse; black at each beat boundary
    pub fn color_at(&self, elapsed: Duration) -> Color {
        if self.period.is_zero() {
            return self.base;
        }
        let phase = (elapsed.as_secs_f64() / self.period.as_secs_f64()).fract();
        let level = 0.5 - 0.5 * (TAU * phase).cos();
        mix(Color::BLACK, self.base, level)
    }
}

impl Default for Pulse {
    /// 120 bpm
    fn default() -> Self {
        Self::new(Color::new(255, 0, 64), Duration::from_millis(500))
    }
}

impl AudioSource for Pulse {
    fn current_color(&mut self) -> Color {
        self.color_at(self.started.elapsed())
    }
}

/// Linear blend; `t` is clamped to `0.0..=1.0`
fn mix(from: Color, to: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as i64;
    Color::clamped(
        channel(from.r, to.r),
        channel(from.g, to.g),
        channel(from.b, to.b),
    )
}
