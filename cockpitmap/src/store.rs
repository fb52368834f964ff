//! Last-known-location persistence.
//!
//! Keeps the most recent valid fix as a small JSON file so a cold start can
//! paint the map near the vehicle before the first live fix arrives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{FixSource, GeoPoint, PositionFix};

/// Errors from the last-location store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid location file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredLocation {
    latitude: f64,
    longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bearing: Option<f64>,
    #[serde(default)]
    source: FixSource,
    #[serde(default)]
    timestamp_ms: u64,
}

/// JSON file holding the last valid fix.
#[derive(Debug, Clone)]
pub struct LastLocationStore {
    path: PathBuf,
}

impl LastLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored point.
    ///
    /// A missing file, or a stored zero-sentinel, reads as `None`.
    pub fn load(&self) -> Result<Option<GeoPoint>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let stored: StoredLocation =
            serde_json::from_str(&contents).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;

        let point = GeoPoint::new(stored.latitude, stored.longitude);
        Ok(point.is_valid().then_some(point))
    }

    /// Persist `fix`. Invalid fixes are skipped and return `Ok(false)`.
    pub fn save(&self, fix: &PositionFix) -> Result<bool, StoreError> {
        if !fix.is_valid() {
            return Ok(false);
        }
        let stored = StoredLocation {
            latitude: fix.point.latitude,
            longitude: fix.point.longitude,
            bearing: fix.bearing,
            source: fix.source.clone(),
            timestamp_ms: fix.timestamp_ms,
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(true)
    }
}
