//! Engine configuration, read from `formwork.toml`.
//!
//! ```toml
//! [engine]
//! default_locale = "en"
//! hidden_values = "exclude"
//! assign_block_ids = true
//! ```

use formwork_types::Locale;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::RenderResult;

/// What happens to values of fields hidden by a visibility condition when
/// the form is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiddenValues {
    /// Hidden values are kept and submitted.
    #[default]
    Submit,
    /// Hidden values are left out of the submitted payload.
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Locale used for condition contexts when the resource has none.
    pub default_locale: Option<Locale>,
    pub hidden_values: HiddenValues,
    /// Write generated block ids into item data. When off, ids of items
    /// without one only live in the collection state.
    pub assign_block_ids: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_locale: None,
            hidden_values: HiddenValues::Submit,
            assign_block_ids: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

impl EngineConfig {
    /// Parses a config document.
    pub fn from_toml_str(contents: &str) -> RenderResult<Self> {
        Ok(toml::from_str::<ConfigFile>(contents)?.engine)
    }

    /// Loads the config at `path`. A missing or unreadable file falls back
    /// to the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded engine config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }
}
