//! Error taxonomy for the replica group.
//!
//! # Design Decisions
//! - Configuration problems are fatal to initialization; no partial topology
//!   is ever published
//! - A missing remote push is a distinct error from an invalid one, so
//!   callers can tell "bad config" from "no config yet"
//! - Individual acquisition failures are recovered by the retry loop and
//!   only surface inside `ExhaustedRetriesError`, in attempt order

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::topology::Role;

/// Opaque error reported by a `ConnectionProvider`.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while validating settings or building a topology.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Group key missing or blank after trimming.
    #[error("group key must be non-blank")]
    BlankGroupKey,

    /// Application name missing or blank after trimming.
    #[error("application name must be non-blank")]
    BlankAppName,

    /// A descriptor entry could not be parsed.
    #[error("invalid descriptor entry '{entry}': {reason}")]
    InvalidDescriptor { entry: String, reason: String },

    /// The descriptor defined no endpoints at all.
    #[error("topology descriptor defines no endpoints")]
    EmptyDescriptor,

    /// The same endpoint key appeared twice within one role.
    #[error("duplicate endpoint '{key}' in {role} pool")]
    DuplicateEndpoint { key: String, role: Role },

    /// No endpoint with a positive weight for a required role.
    #[error("no {role}-capable endpoint with a positive weight")]
    NoCapableEndpoint { role: Role },

    /// The provider factory did not recognize an endpoint key.
    #[error("unknown endpoint key '{key}'")]
    UnknownEndpoint { key: String },

    /// The descriptor source closed before delivering a topology.
    #[error("descriptor source closed before delivering a topology")]
    SourceClosed,

    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file watcher could not be started.
    #[error("config watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// The external configuration push did not arrive within the receive window.
#[derive(Debug, Error)]
#[error("no topology received for '{key}' within {timeout:?}")]
pub struct ConfigurationTimeoutError {
    pub key: String,
    pub timeout: Duration,
}

/// A single failed acquisition attempt against one endpoint.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The endpoint's connection provider reported a failure.
    #[error("connection provider failed: {0}")]
    Provider(#[source] ProviderError),

    /// The attempt exceeded the per-attempt acquisition timeout.
    #[error("acquisition timed out after {0:?}")]
    Timeout(Duration),
}

/// One entry of an exhausted retry history.
#[derive(Debug)]
pub struct AttemptFailure {
    /// Endpoint the attempt was made against.
    pub endpoint: String,
    /// 1-based attempt number within the acquisition call.
    pub attempt: u32,
    /// What went wrong.
    pub error: AcquireError,
}

/// Every attempt failed, or the pool ran out of live candidates before the
/// attempt budget was spent. Carries the full per-attempt history.
#[derive(Debug)]
pub struct ExhaustedRetriesError {
    pub role: Role,
    pub attempts: Vec<AttemptFailure>,
}

impl fmt::Display for ExhaustedRetriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "{} acquisition failed: no live candidates", self.role);
        }
        write!(
            f,
            "{} acquisition failed after {} attempt(s): ",
            self.role,
            self.attempts.len()
        )?;
        for (i, failure) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "[{}] {}: {}", failure.attempt, failure.endpoint, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExhaustedRetriesError {}

/// Umbrella error for the group datasource surface.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    ConfigurationTimeout(#[from] ConfigurationTimeoutError),

    #[error(transparent)]
    ExhaustedRetries(#[from] ExhaustedRetriesError),

    /// Acquisition or introspection before `init`, or after `shutdown`.
    #[error("group datasource is not initialized")]
    NotInitialized,
}

/// Result alias for group datasource operations.
pub type GroupResult<T> = Result<T, GroupError>;
