//! Engine configuration

use serde::Deserialize;
use timewarp_core::{TimewarpError, TimewarpResult};

/// How the engine decides its sync role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleConfig {
    /// Ask the host whether the document is top-level
    #[default]
    Auto,
    Top,
    Child,
}

/// Logging setup
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "timewarp=info".to_string(),
            json: false,
        }
    }
}

/// Engine configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Attribute that opts a subtree out of reconciliation
    pub exclusion_attribute: String,
    /// Realm guard preventing a second installation
    pub install_key: String,
    /// Sync role
    pub role: RoleConfig,
    /// Run the discovery pass every real frame
    pub poll: bool,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            exclusion_attribute: "data-timewarp-ignore".to_string(),
            install_key: "__timewarp_installed__".to_string(),
            role: RoleConfig::Auto,
            poll: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration for hosts that drive reconciliation passes themselves
    pub fn manual() -> Self {
        EngineConfig {
            poll: false,
            ..Self::default()
        }
    }

    /// Parse a configuration blob; missing fields take their defaults
    pub fn from_json(blob: &str) -> TimewarpResult<Self> {
        serde_json::from_str(blob).map_err(|e| TimewarpError::InvalidConfig(e.to_string()))
    }
}
