//! # Engine Configuration
//!
//! Loaded once at startup, from TOML or from defaults.
//!
//! ```toml
//! save_key = "veil"
//! redraw_drained = true
//! drain_on_access = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{VeilError, VeilResult};

/// Default namespace of the persisted tracking document.
pub const DEFAULT_SAVE_KEY: &str = "veil";

/// Configuration for a [`crate::FibRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VeilConfig {
    /// Key the tracking document is stored under in each partition's save.
    pub save_key: String,
    /// Redraw every position drained from the pending queue.
    pub redraw_drained: bool,
    /// Drain the pending queue on every partition lookup instead of only when
    /// the partition's store is first built.
    pub drain_on_access: bool,
}

impl Default for VeilConfig {
    fn default() -> Self {
        Self {
            save_key: DEFAULT_SAVE_KEY.to_string(),
            redraw_drained: true,
            drain_on_access: false,
        }
    }
}

impl VeilConfig {
    /// Parses a TOML config. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VeilError::InvalidConfig`] on malformed TOML, unknown keys,
    /// or an empty save key.
    pub fn from_toml_str(text: &str) -> VeilResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| VeilError::InvalidConfig(e.to_string()))?;
        if config.save_key.is_empty() {
            return Err(VeilError::InvalidConfig("save_key must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`VeilError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> VeilResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            VeilError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}
