//! Error types for lumen-controller

use crate::model::ControllerMode;

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors surfaced to callers of the controller
///
/// None of these are fatal to the controller task itself: a rejected request
/// leaves all controller state untouched.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The requested mode name is not one of the defined modes
    #[error("Invalid mode: {0:?}")]
    InvalidMode(String),

    /// The mode exists but clients may not request it directly
    #[error("Mode {0} cannot be selected by clients")]
    ModeNotSelectable(ControllerMode),

    /// The requesting client has not authenticated
    #[error("Client is not authenticated")]
    Unauthenticated,

    /// The controller task has shut down
    #[error("Controller has been shut down")]
    ControllerClosed,

    /// Loading or saving the persisted mode failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<settings_store::SettingsError> for ControllerError {
    fn from(err: settings_store::SettingsError) -> Self {
        ControllerError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_error_display() {
        let error = ControllerError::InvalidMode("disco".to_string());
        assert_eq!(error.to_string(), "Invalid mode: \"disco\"");

        let error = ControllerError::ModeNotSelectable(ControllerMode::Door);
        assert_eq!(error.to_string(), "Mode door cannot be selected by clients");

        let error = ControllerError::Configuration("frame interval must be greater than 0".to_string());
        assert!(error.to_string().contains("frame interval"));
    }

    #[test]
    fn test_settings_error_converts_to_persistence() {
        let error: ControllerError = settings_store::SettingsError::NoConfigDir.into();
        assert!(matches!(error, ControllerError::Persistence(_)));
    }
}
