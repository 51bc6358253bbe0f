//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GroupConfig;
use crate::config::validation::validate_config;
use crate::errors::ConfigurationError;

/// Load and validate a group configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GroupConfig, ConfigurationError> {
    let content = fs::read_to_string(path)?;
    let mut config: GroupConfig = toml::from_str(&content)?;
    validate_config(&mut config)?;
    Ok(config)
}
