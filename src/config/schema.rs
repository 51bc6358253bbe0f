//! Configuration schema definitions.
//!
//! This module defines the settings for one replica group. All types derive
//! Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::topology::EngineKind;

/// Version stamped into the derived extra-configuration key. Bumped when
/// the extra-configuration payload format changes.
pub const CONFIG_VERSION: &str = "2.4.1";

/// Prefix of the derived primary configuration key.
pub const GROUP_KEY_PREFIX: &str = "group/";

/// Root configuration for a replica group.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GroupConfig {
    /// Logical group identifier (required, non-blank after trimming).
    pub group_key: String,

    /// Owning application name (required, non-blank after trimming).
    pub app_name: String,

    /// Deployment unit name, forwarded to monitoring integrations.
    pub unit_name: Option<String>,

    /// Local static topology descriptor
    /// (comma-separated `endpointKey:weightSpec` entries).
    pub topology: String,

    /// Engine kind applied when the provider factory does not override it.
    pub engine: EngineKind,

    /// Whether write-target tracing starts enabled.
    pub trace_write_target: bool,

    /// Acquisition retry settings.
    pub retry: RetryConfig,

    /// Reconfiguration settings.
    pub reload: ReloadConfig,
}

impl GroupConfig {
    /// Minimal config for programmatic construction.
    pub fn new(group_key: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    /// Primary key the remote descriptor source is subscribed with.
    pub fn full_group_key(&self) -> String {
        format!("{GROUP_KEY_PREFIX}{}", self.group_key)
    }

    /// Application-and-version-scoped extra configuration key.
    pub fn extra_config_key(&self) -> String {
        format!(
            "extra_config.group_v{CONFIG_VERSION}_{}.{}",
            self.group_key, self.app_name
        )
    }
}

/// Acquisition retry settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum acquisition attempts per request.
    pub max_attempts: u32,

    /// Per-attempt acquisition timeout in milliseconds; 0 disables it.
    pub acquire_timeout_ms: u64,

    /// Treat a write served by a non-preferred endpoint as a normal
    /// outcome. When false the failover is logged at warn level and
    /// callers detect it through the write-target tracker.
    pub auto_select_write: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            acquire_timeout_ms: 0,
            auto_select_write: false,
        }
    }
}

impl RetryConfig {
    pub fn acquire_timeout(&self) -> Option<Duration> {
        (self.acquire_timeout_ms > 0).then(|| Duration::from_millis(self.acquire_timeout_ms))
    }
}

/// Reconfiguration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Receive window for the first remote topology push, in seconds.
    pub receive_timeout_secs: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            receive_timeout_secs: 30,
        }
    }
}

impl ReloadConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }
}
