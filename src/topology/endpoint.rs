//! Replica endpoint values and the provider seam.
//!
//! # Responsibilities
//! - Represent a single replica with its per-role weights and engine kind
//! - Define the capability interface a collaborator implements per replica
//! - Define the factory that maps descriptor keys to live providers

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Read or write capability classification of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Read,
    Write,
}

impl Role {
    /// Stable label used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Read => "read",
            Role::Write => "write",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database engine kind shared by every replica in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    MySql,
    Postgres,
    Oracle,
}

/// Credentials forwarded verbatim to a connection provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Capability interface implemented by each replica's connection source.
///
/// The group never looks behind this seam: pool sizing, sockets and
/// authentication are the collaborator's concern, and the group only
/// observes success or failure of `open_connection`.
pub trait ConnectionProvider: Send + Sync + 'static {
    /// The connection handle exposed to the application.
    type Connection: Send + 'static;
    /// Provider-specific failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open one connection, optionally with explicit credentials.
    fn open_connection<'a>(
        &'a self,
        credentials: Option<&'a Credentials>,
    ) -> BoxFuture<'a, Result<Self::Connection, Self::Error>>;
}

/// Maps endpoint keys from a topology descriptor to live providers.
///
/// Mirrors the caller-supplied fetcher of the local static configuration
/// path: the group hands it each key found in the descriptor and wires the
/// returned provider into the corresponding endpoint.
pub trait ProviderFactory<P: ConnectionProvider>: Send + Sync {
    /// Return the provider for `key`, or `None` if the key is unknown.
    fn provider(&self, key: &str) -> Option<Arc<P>>;

    /// Engine kind for `key`; the group-wide default applies when `None`.
    fn engine_kind(&self, _key: &str) -> Option<EngineKind> {
        None
    }
}

/// One replica within a group.
///
/// Immutable once built; the liveness flag lives in the pool entry that
/// holds this value, not here.
pub struct ReplicaEndpoint<P> {
    key: String,
    read_weight: u32,
    write_weight: u32,
    engine: EngineKind,
    provider: Arc<P>,
}

impl<P> ReplicaEndpoint<P> {
    pub fn new(
        key: impl Into<String>,
        read_weight: u32,
        write_weight: u32,
        engine: EngineKind,
        provider: Arc<P>,
    ) -> Self {
        Self {
            key: key.into(),
            read_weight,
            write_weight,
            engine,
            provider,
        }
    }

    /// Identifier, unique within a group.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Selection weight for the given role; 0 means not selectable.
    pub fn weight(&self, role: Role) -> u32 {
        match role {
            Role::Read => self.read_weight,
            Role::Write => self.write_weight,
        }
    }

    /// Whether the endpoint participates in the given role at all.
    pub fn supports(&self, role: Role) -> bool {
        self.weight(role) > 0
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }
}

impl<P> fmt::Debug for ReplicaEndpoint<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaEndpoint")
            .field("key", &self.key)
            .field("read_weight", &self.read_weight)
            .field("write_weight", &self.write_weight)
            .field("engine", &self.engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopProvider;

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::Read.to_string(), "read");
        assert_eq!(Role::Write.as_str(), "write");
    }

    #[test]
    fn test_endpoint_weights_and_support() {
        let ep = ReplicaEndpoint::new("db0", 10, 0, EngineKind::MySql, Arc::new(NoopProvider));
        assert_eq!(ep.weight(Role::Read), 10);
        assert_eq!(ep.weight(Role::Write), 0);
        assert!(ep.supports(Role::Read));
        assert!(!ep.supports(Role::Write));
    }

    #[test]
    fn test_engine_kind_default_is_mysql() {
        assert_eq!(EngineKind::default(), EngineKind::MySql);
    }
}
