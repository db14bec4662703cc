//! Generic Settings Persistence
//!
//! A tiny, type-safe store that keeps one serde-serializable value in a JSON
//! file on disk.
//!
//! # Features
//!
//! - **Type-safe Storage**: one `JsonStore<T>` per settings type
//! - **Missing is not an error**: loading a file that does not exist yields `None`
//! - **Atomic Writes**: values are written to a sibling temp file and renamed into place
//! - **Platform paths**: `JsonStore::default_path` resolves the user config directory
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use settings_store::JsonStore;
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Settings {
//!     brightness: u8,
//! }
//!
//! let path = JsonStore::<Settings>::default_path("lumen", "settings.json")?;
//! let store = JsonStore::<Settings>::new(path);
//!
//! store.save(&Settings { brightness: 80 })?;
//! assert_eq!(store.load()?, Some(Settings { brightness: 80 }));
//! # Ok::<(), settings_store::SettingsError>(())
//! ```

pub mod error;
pub mod store;

pub use error::{Result, SettingsError};
pub use store::JsonStore;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Result, SettingsError};
    pub use crate::store::JsonStore;
}
