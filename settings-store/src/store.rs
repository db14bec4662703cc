//! File-backed JSON store
//!
//! `JsonStore<T>` owns a path and knows how to read and write one value of
//! type `T` there. It holds no cached copy: every `load` goes to disk, so the
//! file stays the single source of truth.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SettingsError};

/// JSON-file persistence for a single settings value
#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a store backed by `path`
    ///
    /// Nothing touches the filesystem until `load` or `save` is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Resolve `<config dir>/<app>/<file>` for the current user
    pub fn default_path(app: &str, file: &str) -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(base.join(app).join(file))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored value
    ///
    /// Returns `Ok(None)` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<T>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let value = serde_json::from_str(&contents).map_err(|source| SettingsError::Serialize {
            path: self.path.clone(),
            source,
        })?;

        Ok(Some(value))
    }

    /// Persist `value`, replacing whatever was stored before
    ///
    /// The JSON is written to `<file>.tmp` first and renamed over the target,
    /// so a crash mid-write never leaves a truncated file behind.
    pub fn save(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }

        let json = serde_json::to_string_pretty(value).map_err(|source| {
            SettingsError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json).map_err(|source| SettingsError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| self.io_error(source))?;

        tracing::trace!("Saved settings to {}", self.path.display());
        Ok(())
    }

    /// Remove the backing file; a missing file is not an error
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
