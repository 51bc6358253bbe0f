//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce required identifiers before any config activity happens
//!
//! # Design Decisions
//! - Identifiers are normalized in place (trimmed) so derived keys never
//!   carry stray whitespace
//! - Topology-level validation (duplicates, role coverage) happens later,
//!   at snapshot build time

use crate::config::schema::GroupConfig;
use crate::errors::ConfigurationError;

/// Trim and check the required identifiers.
///
/// A value that is blank after trimming is an error, not merely absent.
pub fn validate_config(config: &mut GroupConfig) -> Result<(), ConfigurationError> {
    config.group_key = config.group_key.trim().to_string();
    if config.group_key.is_empty() {
        return Err(ConfigurationError::BlankGroupKey);
    }

    config.app_name = config.app_name.trim().to_string();
    if config.app_name.is_empty() {
        return Err(ConfigurationError::BlankAppName);
    }

    if let Some(unit) = config.unit_name.take() {
        let unit = unit.trim().to_string();
        config.unit_name = (!unit.is_empty()).then_some(unit);
    }

    Ok(())
}
