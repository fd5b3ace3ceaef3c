//! Configuration module

use crate::archive::CreateOptions;
use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Archive creation defaults
    #[serde(default)]
    pub create: CreateConfig,
}

/// Archive creation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateConfig {
    /// Replace an existing archive instead of failing
    pub overwrite: bool,
    /// Deflate level (library default when absent)
    pub compression_level: Option<i64>,
    /// Store unix permissions of source files
    pub preserve_permissions: bool,
}

impl Default for CreateConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            compression_level: None,
            preserve_permissions: true,
        }
    }
}

impl From<&CreateConfig> for CreateOptions {
    fn from(config: &CreateConfig) -> Self {
        Self {
            compression_level: config.compression_level,
            preserve_permissions: config.preserve_permissions,
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        let zipkit_dir = config_dir.join("zipkit");
        if !zipkit_dir.exists() {
            fs::create_dir_all(&zipkit_dir)?;
        }

        Ok(zipkit_dir.join("config.toml"))
    }

    /// Get default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# zipkit configuration file

[create]
# Replace an existing archive instead of reporting that it already exists
overwrite = false
# Deflate level 1-9; leave unset for the library default
# compression_level = 6
# Store unix permission bits of source files
preserve_permissions = true
"#
        .to_string()
    }

    /// Load configuration from the default location, writing a default
    /// file first if none exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing a default file there if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            fs::write(path, Self::default_config_content())?;
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Set a single value from its `section.key` name and textual value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "create.overwrite" => self.create.overwrite = parse_value(key, value)?,
            "create.preserve_permissions" => {
                self.create.preserve_permissions = parse_value(key, value)?
            }
            "create.compression_level" => {
                self.create.compression_level = match value {
                    "" | "default" => None,
                    level => Some(parse_value(key, level)?),
                }
            }
            _ => return Err(Error::Config(format!("Unknown configuration key: {}", key))),
        }
        Ok(())
    }

    /// Load configuration or use defaults if loading fails
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Creation options derived from the `[create]` section
    pub fn create_options(&self) -> CreateOptions {
        CreateOptions::from(&self.create)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}
