//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Markup placed between a description and what follows it
    /// (an embedded screenshot, or the failure text of a merged step)
    pub separator: String,

    /// Named visual styles for embedded screenshots
    pub styles: StyleConfig,

    /// Screenshot embedding settings
    pub embed: EmbedConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            separator: "<br>".to_string(),
            styles: StyleConfig::default(),
            embed: EmbedConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.styles.success.trim().is_empty() || self.styles.error.trim().is_empty() {
            return Err(Error::InvalidConfig("style names must not be empty".to_string()));
        }
        if self.embed.mime_type.trim().is_empty() {
            return Err(Error::InvalidConfig("embed.mime_type must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Style names used when embedding screenshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub success: String,
    pub error: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            success: "success".to_string(),
            error: "error".to_string(),
        }
    }
}

impl StyleConfig {
    pub fn for_passed(&self, passed: bool) -> &str {
        if passed {
            &self.success
        } else {
            &self.error
        }
    }
}

/// How screenshots are rendered into report markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// CSS max-width of the embedded image
    pub max_width: String,

    /// MIME type used in the data URI
    pub mime_type: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            max_width: "100%".to_string(),
            mime_type: "image/png".to_string(),
        }
    }
}
