//! Topology lifecycle: build, validate, publish, observe.
//!
//! # Data Flow
//! ```text
//! descriptor (local string, remote push, or reset)
//!     → build (validate, resolve providers, construct pools)
//!     → publish (single atomic pointer swap)
//!     → listeners notified with the new snapshot
//!
//! Concurrent acquisitions:
//!     current() → lock-free load of the live snapshot
//! ```
//!
//! # Design Decisions
//! - Readers never lock; the snapshot reference is swapped atomically
//! - Only one reconfiguration is in flight at a time (serialized by a lock
//!   that readers never touch)
//! - A failed build leaves the previous snapshot untouched

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;

use crate::config::descriptor::TopologyDescriptor;
use crate::errors::ConfigurationError;
use crate::observability::metrics;
use crate::topology::endpoint::{ConnectionProvider, EngineKind, ProviderFactory, ReplicaEndpoint, Role};
use crate::topology::pool::ReplicaPool;
use crate::topology::snapshot::TopologySnapshot;

/// Callback invoked synchronously after each publish, in registration
/// order. Listeners must not trigger a reconfiguration from inside the
/// callback.
pub type TopologyListener<P> = Box<dyn Fn(&Arc<TopologySnapshot<P>>) + Send + Sync>;

/// Holds the live snapshot behind an atomically swappable reference.
pub struct TopologyManager<P> {
    current: ArcSwapOption<TopologySnapshot<P>>,
    listeners: Mutex<Vec<TopologyListener<P>>>,
    /// Serializes build+publish; never taken on the read path.
    reload: Mutex<()>,
    version: AtomicU64,
}

impl<P> Default for TopologyManager<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> TopologyManager<P> {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            listeners: Mutex::new(Vec::new()),
            reload: Mutex::new(()),
            version: AtomicU64::new(0),
        }
    }

    /// Lock-free read of the live snapshot. `None` before the first
    /// successful publish and after `shutdown`.
    pub fn current(&self) -> Option<Arc<TopologySnapshot<P>>> {
        self.current.load_full()
    }

    /// Register a change listener. Existing listeners are kept; order of
    /// notification is registration order.
    pub fn add_listener(&self, listener: TopologyListener<P>) {
        self.listeners
            .lock()
            .expect("listener registry lock poisoned")
            .push(listener);
    }

    /// Release the held snapshot and all listeners.
    pub fn shutdown(&self) {
        self.current.store(None);
        self.listeners
            .lock()
            .expect("listener registry lock poisoned")
            .clear();
        tracing::info!("Topology manager shut down");
    }
}

impl<P: ConnectionProvider> TopologyManager<P> {
    /// Construct a snapshot from a descriptor without publishing it.
    ///
    /// Validates duplicate endpoint keys per role and that each role has at
    /// least one endpoint with a positive weight.
    pub fn build(
        &self,
        descriptor: &TopologyDescriptor,
        factory: &dyn ProviderFactory<P>,
        default_engine: EngineKind,
    ) -> Result<TopologySnapshot<P>, ConfigurationError> {
        if descriptor.entries.is_empty() {
            return Err(ConfigurationError::EmptyDescriptor);
        }

        for role in [Role::Read, Role::Write] {
            let mut seen = std::collections::HashSet::new();
            for entry in descriptor.entries.iter().filter(|e| entry_supports(e, role)) {
                if !seen.insert(entry.key.as_str()) {
                    return Err(ConfigurationError::DuplicateEndpoint {
                        key: entry.key.clone(),
                        role,
                    });
                }
            }
        }

        let mut endpoints = Vec::with_capacity(descriptor.entries.len());
        for entry in &descriptor.entries {
            let provider = factory
                .provider(&entry.key)
                .ok_or_else(|| ConfigurationError::UnknownEndpoint {
                    key: entry.key.clone(),
                })?;
            let engine = factory.engine_kind(&entry.key).unwrap_or(default_engine);
            endpoints.push(Arc::new(ReplicaEndpoint::new(
                entry.key.clone(),
                entry.read_weight,
                entry.write_weight,
                engine,
                provider,
            )));
        }

        let read = ReplicaPool::new(Role::Read, &endpoints);
        let write = ReplicaPool::new(Role::Write, &endpoints);
        for (role, pool) in [(Role::Read, &read), (Role::Write, &write)] {
            if pool.is_empty() {
                return Err(ConfigurationError::NoCapableEndpoint { role });
            }
        }

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TopologySnapshot::new(version, read, write))
    }

    /// Swap the live reference in one atomic store, then notify listeners.
    pub fn publish(&self, snapshot: TopologySnapshot<P>) -> Arc<TopologySnapshot<P>> {
        let read_len = snapshot.pool(Role::Read).len();
        let write_len = snapshot.pool(Role::Write).len();
        let snapshot = Arc::new(snapshot);
        self.current.store(Some(snapshot.clone()));

        tracing::info!(
            version = snapshot.version(),
            read_endpoints = read_len,
            write_endpoints = write_len,
            "Topology published"
        );
        metrics::record_reconfiguration(snapshot.version(), read_len, write_len);

        let listeners = self
            .listeners
            .lock()
            .expect("listener registry lock poisoned");
        for listener in listeners.iter() {
            listener(&snapshot);
        }
        snapshot
    }

    /// Build and publish under the reconfiguration lock.
    ///
    /// Acquisitions running against the previous snapshot are unaffected;
    /// the new snapshot takes effect for selections begun after the swap.
    pub fn reconfigure(
        &self,
        descriptor: &TopologyDescriptor,
        factory: &dyn ProviderFactory<P>,
        default_engine: EngineKind,
    ) -> Result<Arc<TopologySnapshot<P>>, ConfigurationError> {
        let _guard = self.reload.lock().expect("reload lock poisoned");
        let snapshot = self.build(descriptor, factory, default_engine)?;
        Ok(self.publish(snapshot))
    }
}

fn entry_supports(entry: &crate::config::descriptor::DescriptorEntry, role: Role) -> bool {
    match role {
        Role::Read => entry.read_weight > 0,
        Role::Write => entry.write_weight > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use futures_util::future::BoxFuture;

    use crate::topology::endpoint::Credentials;

    struct NoopProvider;

    impl ConnectionProvider for NoopProvider {
        type Connection = ();
        type Error = std::io::Error;

        fn open_connection<'a>(
            &'a self,
            _credentials: Option<&'a Credentials>,
        ) -> BoxFuture<'a, Result<(), std::io::Error>> {
            Box::pin(async { Ok(()) })
        }
    }

    struct AnyKeyFactory;

    impl ProviderFactory<NoopProvider> for AnyKeyFactory {
        fn provider(&self, _key: &str) -> Option<Arc<NoopProvider>> {
            Some(Arc::new(NoopProvider))
        }
    }

    fn descriptor(s: &str) -> TopologyDescriptor {
        TopologyDescriptor::parse(s).unwrap()
    }

    #[test]
    fn test_build_rejects_duplicate_in_role() {
        let manager = TopologyManager::<NoopProvider>::new();
        let err = manager
            .build(&descriptor("db0:10,db0:5"), &AnyKeyFactory, EngineKind::MySql)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::DuplicateEndpoint { key, role: Role::Read } if key == "db0"
        ));
    }

    #[test]
    fn test_build_allows_same_key_in_disjoint_roles() {
        let manager = TopologyManager::<NoopProvider>::new();
        let snapshot = manager
            .build(&descriptor("db0:r10,db0:w10"), &AnyKeyFactory, EngineKind::MySql)
            .unwrap();
        assert_eq!(snapshot.pool(Role::Read).len(), 1);
        assert_eq!(snapshot.pool(Role::Write).len(), 1);
    }

    #[test]
    fn test_build_requires_write_capable_endpoint() {
        let manager = TopologyManager::<NoopProvider>::new();
        let err = manager
            .build(&descriptor("db0:r10,db1:r5"), &AnyKeyFactory, EngineKind::MySql)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::NoCapableEndpoint { role: Role::Write }
        ));
    }

    #[test]
    fn test_build_rejects_unknown_endpoint_key() {
        struct NoneFactory;
        impl ProviderFactory<NoopProvider> for NoneFactory {
            fn provider(&self, _key: &str) -> Option<Arc<NoopProvider>> {
                None
            }
        }

        let manager = TopologyManager::<NoopProvider>::new();
        let err = manager
            .build(&descriptor("db0:10"), &NoneFactory, EngineKind::MySql)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownEndpoint { key } if key == "db0"));
    }

    #[test]
    fn test_publish_makes_snapshot_current_with_increasing_version() {
        let manager = TopologyManager::<NoopProvider>::new();
        assert!(manager.current().is_none());

        let first = manager
            .reconfigure(&descriptor("db0:10"), &AnyKeyFactory, EngineKind::MySql)
            .unwrap();
        let second = manager
            .reconfigure(&descriptor("db0:10,db1:5"), &AnyKeyFactory, EngineKind::MySql)
            .unwrap();

        assert!(second.version() > first.version());
        assert_eq!(
            manager.current().unwrap().version(),
            second.version()
        );
    }

    #[test]
    fn test_failed_build_keeps_previous_snapshot() {
        let manager = TopologyManager::<NoopProvider>::new();
        let published = manager
            .reconfigure(&descriptor("db0:10"), &AnyKeyFactory, EngineKind::MySql)
            .unwrap();

        let result = manager.reconfigure(&descriptor("db0:r10"), &AnyKeyFactory, EngineKind::MySql);
        assert!(result.is_err());
        assert_eq!(manager.current().unwrap().version(), published.version());
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let manager = TopologyManager::<NoopProvider>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let counter = Arc::new(AtomicUsize::new(0));

        for tag in ["first", "second"] {
            let order = order.clone();
            let counter = counter.clone();
            manager.add_listener(Box::new(move |snapshot| {
                let rank = counter.fetch_add(1, Ordering::SeqCst);
                order
                    .lock()
                    .unwrap()
                    .push((tag, rank, snapshot.version()));
            }));
        }

        manager
            .reconfigure(&descriptor("db0:10"), &AnyKeyFactory, EngineKind::MySql)
            .unwrap();

        let seen = order.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "first");
        assert_eq!(seen[1].0, "second");
        assert!(seen[0].1 < seen[1].1);
    }

    #[test]
    fn test_shutdown_releases_snapshot_and_listeners() {
        let manager = TopologyManager::<NoopProvider>::new();
        manager
            .reconfigure(&descriptor("db0:10"), &AnyKeyFactory, EngineKind::MySql)
            .unwrap();
        manager.add_listener(Box::new(|_| {}));

        manager.shutdown();
        assert!(manager.current().is_none());
        assert!(manager.listeners.lock().unwrap().is_empty());
    }
}
