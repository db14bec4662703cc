//! Per-frame change detection
//!
//! Decides, for the active mode, whether this frame needs a device write and
//! which color it should carry.

use crate::color_state::ColorState;
use crate::device::LightDevice;
use crate::model::{Color, ControllerMode};
use crate::sources::{AudioSource, PatternSource};

/// Result of evaluating one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Nothing to write this frame
    Idle,
    /// `Color` reached the device and should be broadcast
    Pushed(Color),
}

/// Everything the evaluator may read or write during a frame
pub struct FrameContext<'a> {
    pub colors: &'a mut ColorState,
    pub device: &'a mut dyn LightDevice,
    pub pattern: &'a mut dyn PatternSource,
    pub audio: &'a mut dyn AudioSource,
}

/// Evaluate one frame for `mode`
///
/// - `Audio` / `AudioRaw`: always attempt a write through the device's
///   admission check; a refusal leaves `last_pushed` alone so the next frame
///   retries.
/// - `Door`: never writes; the door controller drives output itself.
/// - `AutoPilot`: refresh the target from the pattern generator, then compare.
/// - Everything else: write only when the target differs from the last push.
pub fn evaluate(mode: ControllerMode, ctx: FrameContext<'_>) -> Evaluation {
    match mode {
        ControllerMode::Door => Evaluation::Idle,
        ControllerMode::Audio | ControllerMode::AudioRaw => {
            if mode == ControllerMode::Audio {
                ctx.colors.set_target(ctx.audio.current_color());
            }
            let color = ctx.colors.target();
            if ctx.device.set_if_possible(color) {
                ctx.colors.mark_pushed(color);
                Evaluation::Pushed(color)
            } else {
                tracing::trace!("Device refused {} this frame", color);
                Evaluation::Idle
            }
        }
        ControllerMode::AutoPilot => {
            ctx.colors.set_target(ctx.pattern.current_color());
            push_if_changed(ctx.colors, ctx.device)
        }
        ControllerMode::Manual
        | ControllerMode::Pattern
        | ControllerMode::ManualForce
        | ControllerMode::ManualLocked => push_if_changed(ctx.colors, ctx.device),
    }
}

fn push_if_changed(colors: &mut ColorState, device: &mut dyn LightDevice) -> Evaluation {
    if !colors.has_changed() {
        return Evaluation::Idle;
    }
    let color = colors.target();
    device.set_rgb(color);
    colors.mark_pushed(color);
    Evaluation::Pushed(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SimulatedDevice;
    use crate::sources::SolidColor;

    struct Fixture {
        colors: ColorState,
        device: SimulatedDevice,
        pattern: SolidColor,
        audio: SolidColor,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                colors: ColorState::default(),
                device: SimulatedDevice::connected(),
                pattern: SolidColor(Color::GREEN),
                audio: SolidColor(Color::BLUE),
            }
        }

        fn run(&mut self, mode: ControllerMode) -> Evaluation {
            let mut device = self.device.clone();
            evaluate(
                mode,
                FrameContext {
                    colors: &mut self.colors,
                    device: &mut device,
                    pattern: &mut self.pattern,
                    audio: &mut self.audio,
                },
            )
        }
    }

    #[tokio::test]
    async fn test_manual_pushes_once_per_change() {
        let mut f = Fixture::new();
        f.colors.set_target(Color::new(10, 20, 30));

        assert_eq!(
            f.run(ControllerMode::Manual),
            Evaluation::Pushed(Color::new(10, 20, 30))
        );
        assert_eq!(f.run(ControllerMode::Manual), Evaluation::Idle);
        assert_eq!(f.run(ControllerMode::ManualLocked), Evaluation::Idle);
        assert_eq!(f.device.write_count(), 1);
    }

    #[tokio::test]
    async fn test_autopilot_pulls_from_pattern() {
        let mut f = Fixture::new();

        assert_eq!(
            f.run(ControllerMode::AutoPilot),
            Evaluation::Pushed(Color::GREEN)
        );
        assert_eq!(f.colors.target(), Color::GREEN);
        assert_eq!(f.run(ControllerMode::AutoPilot), Evaluation::Idle);
    }

    #[tokio::test]
    async fn test_door_never_pushes() {
        let mut f = Fixture::new();
        f.colors.set_target(Color::WHITE);

        assert_eq!(f.run(ControllerMode::Door), Evaluation::Idle);
        assert_eq!(f.device.write_count(), 0);
    }

    #[tokio::test]
    async fn test_audio_always_writes() {
        let mut f = Fixture::new();

        assert_eq!(f.run(ControllerMode::Audio), Evaluation::Pushed(Color::BLUE));
        assert_eq!(f.run(ControllerMode::Audio), Evaluation::Pushed(Color::BLUE));
        assert_eq!(f.device.write_count(), 2);
    }

    #[tokio::test]
    async fn test_audio_raw_uses_target() {
        let mut f = Fixture::new();
        f.colors.set_target(Color::new(9, 9, 9));

        assert_eq!(
            f.run(ControllerMode::AudioRaw),
            Evaluation::Pushed(Color::new(9, 9, 9))
        );
    }

    #[tokio::test]
    async fn test_refused_audio_write_is_retried() {
        let mut f = Fixture::new();
        f.device.refuse_conditional_writes(true);

        assert_eq!(f.run(ControllerMode::Audio), Evaluation::Idle);
        assert_eq!(f.colors.last_pushed(), Color::BLACK);

        f.device.refuse_conditional_writes(false);
        assert_eq!(f.run(ControllerMode::Audio), Evaluation::Pushed(Color::BLUE));
        assert_eq!(f.colors.last_pushed(), Color::BLUE);
    }
}
