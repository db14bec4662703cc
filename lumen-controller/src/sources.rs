//! Color sources consulted by the change evaluator
//!
//! Both the autonomous pattern generator and the audio engine live outside
//! this crate. The controller only asks them for their current color once per
//! frame, so any `FnMut() -> Color` closure works as a source.

use crate::model::Color;

/// The autonomous pattern generator, read in autopilot mode
pub trait PatternSource: Send {
    /// Color the generator's internal schedule currently calls for
    fn current_color(&mut self) -> Color;
}

/// The live audio analysis engine, read in audio mode
pub trait AudioSource: Send {
    /// Color derived from the most recent audio analysis
    fn current_color(&mut self) -> Color;
}

impl<F> PatternSource for F
where
    F: FnMut() -> Color + Send,
{
    fn current_color(&mut self) -> Color {
        self()
    }
}

impl<F> AudioSource for F
where
    F: FnMut() -> Color + Send,
{
    fn current_color(&mut self) -> Color {
        self()
    }
}

/// A source that always reports the same color
#[derive(Debug, Clone, Copy, Default)]
pub struct SolidColor(pub Color);

impl PatternSource for SolidColor {
    fn current_color(&mut self) -> Color {
        self.0
    }
}

impl AudioSource for SolidColor {
    fn current_color(&mut self) -> Color {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_pattern(source: &mut dyn PatternSource) -> Color {
        source.current_color()
    }

    #[test]
    fn test_closure_is_a_pattern_source() {
        let mut level = 0u8;
        let mut source = move || {
            level = level.wrapping_add(10);
            Color::new(level, 0, 0)
        };

        assert_eq!(read_pattern(&mut source), Color::new(10, 0, 0));
        assert_eq!(read_pattern(&mut source), Color::new(20, 0, 0));
    }

    #[test]
    fn test_solid_color() {
        let mut source = SolidColor(Color::BLUE);
        assert_eq!(AudioSource::current_color(&mut source), Color::BLUE);
        assert_eq!(PatternSource::current_color(&mut source), Color::BLUE);
    }
}
