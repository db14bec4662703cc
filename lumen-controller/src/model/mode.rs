//! Controller mode enumeration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ControllerError;

/// Strategy currently governing how the fixture's output color is produced
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerMode {
    /// Autonomous pattern generator drives the output
    #[default]
    #[serde(rename = "autopilot")]
    AutoPilot,
    /// Client-provided color
    Manual,
    /// Client-selected pattern, driven from the target color
    Pattern,
    /// Live audio-reactive color
    Audio,
    /// Raw colors streamed by a privileged client at full rate
    AudioRaw,
    /// Manual color explicitly forced by a client
    ManualForce,
    /// Manual color that ignores the door sensor
    ManualLocked,
    /// Transient door override; never selectable by clients
    Door,
}

impl ControllerMode {
    /// Every defined mode, in declaration order
    pub const ALL: [ControllerMode; 8] = [
        ControllerMode::AutoPilot,
        ControllerMode::Manual,
        ControllerMode::Pattern,
        ControllerMode::Audio,
        ControllerMode::AudioRaw,
        ControllerMode::ManualForce,
        ControllerMode::ManualLocked,
        ControllerMode::Door,
    ];

    /// Wire name used in commands, broadcasts and persisted settings
    pub const fn as_str(&self) -> &'static str {
        match self {
            ControllerMode::AutoPilot => "autopilot",
            ControllerMode::Manual => "manual",
            ControllerMode::Pattern => "pattern",
            ControllerMode::Audio => "audio",
            ControllerMode::AudioRaw => "audio-raw",
            ControllerMode::ManualForce => "manual-force",
            ControllerMode::ManualLocked => "manual-locked",
            ControllerMode::Door => "door",
        }
    }

    /// Whether a client may request this mode
    pub const fn is_externally_selectable(&self) -> bool {
        !matches!(self, ControllerMode::Door)
    }

    /// Audio modes want the highest refresh rate rather than a fixed cadence
    pub const fn is_audio(&self) -> bool {
        matches!(self, ControllerMode::Audio | ControllerMode::AudioRaw)
    }

    /// User-driven modes that fall back to autopilot once nobody is watching
    pub const fn resets_when_unattended(&self) -> bool {
        matches!(self, ControllerMode::Manual | ControllerMode::ManualForce)
    }
}

impl fmt::Display for ControllerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControllerMode {
    type Err = ControllerError;

    /// Parse a wire name; matching is case-insensitive and accepts `_` for `-`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ControllerMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ControllerError::InvalidMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("autopilot", ControllerMode::AutoPilot)]
    #[case("MANUAL", ControllerMode::Manual)]
    #[case("pattern", ControllerMode::Pattern)]
    #[case("audio", ControllerMode::Audio)]
    #[case("audio-raw", ControllerMode::AudioRaw)]
    #[case("audio_raw", ControllerMode::AudioRaw)]
    #[case("Manual-Force", ControllerMode::ManualForce)]
    #[case(" manual-locked ", ControllerMode::ManualLocked)]
    #[case("door", ControllerMode::Door)]
    fn test_parse_wire_names(#[case] input: &str, #[case] expected: ControllerMode) {
        assert_eq!(input.parse::<ControllerMode>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("disco")]
    #[case("auto pilot")]
    #[case("manual-forced")]
    fn test_parse_rejects_unknown(#[case] input: &str) {
        match input.parse::<ControllerMode>() {
            Err(ControllerError::InvalidMode(name)) => assert_eq!(name, input),
            other => panic!("Expected InvalidMode, got {:?}", other),
        }
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for mode in ControllerMode::ALL {
            assert_eq!(mode.to_string().parse::<ControllerMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        for mode in ControllerMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
        }
    }

    #[test]
    fn test_only_door_is_internal() {
        let internal: Vec<_> = ControllerMode::ALL
            .into_iter()
            .filter(|m| !m.is_externally_selectable())
            .collect();
        assert_eq!(internal, vec![ControllerMode::Door]);
    }

    #[test]
    fn test_mode_classification() {
        assert!(ControllerMode::Audio.is_audio());
        assert!(ControllerMode::AudioRaw.is_audio());
        assert!(!ControllerMode::Manual.is_audio());

        assert!(ControllerMode::Manual.resets_when_unattended());
        assert!(ControllerMode::ManualForce.resets_when_unattended());
        assert!(!ControllerMode::ManualLocked.resets_when_unattended());
        assert!(!ControllerMode::AutoPilot.resets_when_unattended());
    }

    #[test]
    fn test_default() {
        assert_eq!(ControllerMode::default(), ControllerMode::AutoPilot);
    }

    proptest! {
        #[test]
        fn prop_unknown_names_are_rejected(name in "[a-z_-]{0,16}") {
            let normalized = name.replace('_', "-");
            let known = ControllerMode::ALL.iter().any(|m| m.as_str() == normalized);
            prop_assert_eq!(name.parse::<ControllerMode>().is_ok(), known);
        }
    }
}
