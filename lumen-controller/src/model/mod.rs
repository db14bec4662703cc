//! Model types for lumen-controller

mod color;
mod mode;
mod mode_record;

pub use color::Color;
pub use mode::ControllerMode;
pub use mode_record::{ModeRecord, Transition};
