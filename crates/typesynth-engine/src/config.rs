//! Elevation configuration
//!
//! Settings can be given in TOML, either standalone or as an `[elevation]`
//! table of a larger file:
//!
//! ```toml
//! [elevation]
//! platform_prefixes = ["java.", "javax.", "jdk.", "sun."]
//! bridge_infix = "$packageAccess$"
//! ```

use std::path::Path;

use serde::Deserialize;
use typesynth_ir::ScopeId;

use crate::error::ConfigError;

/// Scopes whose types are never bridged by default
pub const DEFAULT_PLATFORM_PREFIXES: &[&str] = &["java.", "javax.", "jdk.", "sun."];

/// Infix between the bridged type's name and the discriminator
pub const DEFAULT_BRIDGE_INFIX: &str = "$packageAccess$";

/// Settings for the visibility-elevation synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// Scope prefixes that are platform-reserved and never bridged
    pub platform_prefixes: Vec<String>,
    /// Text placed between the bridged type's name and the discriminator
    pub bridge_infix: String,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            platform_prefixes: DEFAULT_PLATFORM_PREFIXES.iter().map(|p| p.to_string()).collect(),
            bridge_infix: DEFAULT_BRIDGE_INFIX.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    elevation: Option<ElevationConfig>,
}

impl ElevationConfig {
    /// Parse from TOML; an `[elevation]` table takes precedence over top-level keys
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        match file.elevation {
            Some(config) => Ok(config),
            None => Ok(toml::from_str(content)?),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_platform_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platform_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether types in `scope` are platform-reserved
    pub fn is_platform_scope(&self, scope: &ScopeId) -> bool {
        scope.is_reserved(&self.platform_prefixes)
    }
}
