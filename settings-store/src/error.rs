//! Error types for settings-store

use std::path::PathBuf;

/// Result type for settings-store operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur while loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Reading, writing or renaming the settings file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored value could not be encoded or decoded
    #[error("Failed to (de)serialize settings at {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The platform has no per-user configuration directory
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}
