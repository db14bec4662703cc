//! Broadcast events delivered to every listener

use serde::{Deserialize, Serialize};

use crate::model::{Color, ControllerMode};

/// State announcements fanned out to all connected clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ControllerEvent {
    /// The active mode changed (or the door override was re-announced)
    ModeUpdate { mode: ControllerMode },
    /// A new color reached the device
    RgbUpdate { color: Color },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&ControllerEvent::ModeUpdate {
            mode: ControllerMode::ManualForce,
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"mode-update","mode":"manual-force"}"#);

        let json = serde_json::to_string(&ControllerEvent::RgbUpdate {
            color: Color::new(1, 2, 3),
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"rgb-update","color":{"r":1,"g":2,"b":3}}"#);
    }
}
