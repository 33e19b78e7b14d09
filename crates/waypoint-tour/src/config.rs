#![forbid(unsafe_code)]

//! Tour tuning as data.
//!
//! [`TourConfig`] gathers placement dimensions, the retry budget, and the
//! navigation settle delay so hosts can load them from TOML or JSON instead
//! of recompiling.
//!
//! ```toml
//! # waypoint.toml
//! navigation_settle_ms = 80
//!
//! [placement]
//! tooltip_width = 360
//!
//! [retry]
//! max_retries = 10
//!
//! [retry.backoff]
//! kind = "fixed"
//! delay_ms = 250
//! ```
//!
//! Every field has a default, so `TourConfig::default()` and an empty file
//! produce the same behavior.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{self, Result, TourError};
use crate::placement::PlacementConfig;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    pub placement: PlacementConfig,
    pub retry: RetryPolicy,
    /// Delay between emitting a navigation and entering the next step.
    pub navigation_settle_ms: u64,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            placement: PlacementConfig::default(),
            retry: RetryPolicy::default(),
            navigation_settle_ms: 50,
        }
    }
}

impl TourConfig {
    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&error::read_to_string(path.as_ref())?)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&error::read_to_string(path.as_ref())?)
    }

    /// Load by file extension: `.json` as JSON, anything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Validate all parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.placement.validate();
        errors.extend(self.retry.validate());
        errors
    }

    /// `self` if valid, otherwise [`TourError::InvalidConfig`].
    pub fn validated(self) -> Result<Self> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(TourError::InvalidConfig { errors })
        }
    }
}
