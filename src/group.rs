//! The group datasource facade.
//!
//! # Responsibilities
//! - Wire config, topology manager, engine and tracker together
//! - Offer the caller surface: init (local or remote), acquire, reset,
//!   introspection, write-target tracing, shutdown
//! - Keep background reload tasks alive and stop them on shutdown

use std::path::Path;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use notify::RecommendedWatcher;
use tokio::task::JoinHandle;

use crate::config::descriptor::TopologyDescriptor;
use crate::config::schema::GroupConfig;
use crate::config::source::DescriptorSource;
use crate::config::validation::validate_config;
use crate::config::watcher::ConfigWatcher;
use crate::engine::acquire::SelectionAndRetryEngine;
use crate::engine::tracker::{ContextId, WriteTargetTracker};
use crate::errors::{ConfigurationError, ConfigurationTimeoutError, GroupError, GroupResult};
use crate::topology::endpoint::{ConnectionProvider, Credentials, ProviderFactory, Role};
use crate::topology::manager::TopologyManager;
use crate::topology::snapshot::TopologySnapshot;

/// A group of homogeneous database replicas behind one connection surface.
///
/// The group does not replicate data; it selects among replicas by weight
/// and priority, retries acquisition on failure, and hot-swaps the whole
/// topology without callers reconnecting.
///
/// ```ignore
/// let group = GroupDataSource::new(config, factory)?;
/// group.init_local()?;
/// let conn = group.get_connection();
/// let db = conn.read().await?;
/// ```
pub struct GroupDataSource<P: ConnectionProvider> {
    inner: Arc<GroupInner<P>>,
}

impl<P: ConnectionProvider> Clone for GroupDataSource<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct GroupInner<P: ConnectionProvider> {
    config: GroupConfig,
    factory: Arc<dyn ProviderFactory<P>>,
    manager: TopologyManager<P>,
    engine: SelectionAndRetryEngine,
    tracker: Arc<WriteTargetTracker>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    watchers: Mutex<Vec<RecommendedWatcher>>,
}

impl<P: ConnectionProvider> GroupDataSource<P> {
    /// Validate the configuration and assemble an uninitialized group.
    ///
    /// Identifier validation happens here, before any config activity.
    pub fn new(
        mut config: GroupConfig,
        factory: Arc<dyn ProviderFactory<P>>,
    ) -> Result<Self, ConfigurationError> {
        validate_config(&mut config)?;

        let tracker = Arc::new(WriteTargetTracker::new());
        if config.trace_write_target {
            tracker.enable();
        }
        let engine = SelectionAndRetryEngine::new(&config.retry, tracker.clone());

        Ok(Self {
            inner: Arc::new(GroupInner {
                config,
                factory,
                manager: TopologyManager::new(),
                engine,
                tracker,
                tasks: Mutex::new(Vec::new()),
                watchers: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Initialize from the local static descriptor in the configuration.
    pub fn init_local(&self) -> GroupResult<()> {
        self.reset_topology(&self.inner.config.topology)
    }

    /// Initialize from the remote descriptor source.
    ///
    /// Waits for the first push, bounded by the configured receive
    /// timeout; a missing push fails loudly instead of publishing a stale
    /// or empty topology. Later pushes reconfigure the group until
    /// shutdown.
    pub async fn init_remote(&self, source: &dyn DescriptorSource) -> GroupResult<()> {
        let key = self.inner.config.full_group_key();
        let mut rx = source.subscribe(&key);
        let window = self.inner.config.reload.receive_timeout();

        let first = tokio::time::timeout(window, rx.recv())
            .await
            .map_err(|_| ConfigurationTimeoutError {
                key: key.clone(),
                timeout: window,
            })?
            .ok_or(ConfigurationError::SourceClosed)?;
        self.reset_topology(&first)?;

        let group = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(descriptor) = rx.recv().await {
                if let Err(error) = group.reset_topology(&descriptor) {
                    tracing::error!(
                        error = %error,
                        "Rejected pushed topology, keeping current"
                    );
                }
            }
        });
        self.push_task(handle);
        Ok(())
    }

    /// Watch a config file and apply its topology on every change.
    ///
    /// Complements `init_remote` for deployments that ship topology as a
    /// file instead of a push channel.
    pub fn watch_config_file(&self, path: &Path) -> GroupResult<()> {
        let (watcher, mut rx) = ConfigWatcher::new(path);
        let handle = watcher.run().map_err(ConfigurationError::Watch)?;
        self.inner
            .watchers
            .lock()
            .expect("watcher registry lock poisoned")
            .push(handle);

        let group = self.clone();
        let task = tokio::spawn(async move {
            while let Some(config) = rx.recv().await {
                if let Err(error) = group.reset_topology(&config.topology) {
                    tracing::error!(
                        error = %error,
                        "Rejected reloaded topology, keeping current"
                    );
                }
            }
        });
        self.push_task(task);
        Ok(())
    }

    /// Force an immediate reconfiguration from a descriptor string.
    ///
    /// Privileged operation, mainly for tests and operational tooling.
    pub fn reset_topology(&self, descriptor: &str) -> GroupResult<()> {
        let parsed = TopologyDescriptor::parse(descriptor)?;
        self.inner
            .manager
            .reconfigure(&parsed, self.inner.factory.as_ref(), self.inner.config.engine)
            .map_err(GroupError::from)?;
        Ok(())
    }

    /// The live snapshot. Callers must not cache it across acquisitions or
    /// they lose hot-reload.
    pub fn current_topology(&self) -> GroupResult<Arc<TopologySnapshot<P>>> {
        self.inner.manager.current().ok_or(GroupError::NotInitialized)
    }

    /// Acquire a connection for `role` within the given caller context.
    pub async fn acquire(
        &self,
        role: Role,
        ctx: ContextId,
        credentials: Option<&Credentials>,
    ) -> GroupResult<P::Connection> {
        let snapshot = self.current_topology()?;
        self.inner
            .engine
            .acquire(&snapshot, role, ctx, credentials)
            .await
            .map_err(GroupError::from)
    }

    /// Acquire a read connection in a throwaway context.
    pub async fn acquire_read(&self) -> GroupResult<P::Connection> {
        let ctx = self.inner.tracker.new_context();
        let result = self.acquire(Role::Read, ctx, None).await;
        self.inner.tracker.release(ctx);
        result
    }

    /// Acquire a write connection in a throwaway context.
    ///
    /// Callers that need the write target afterwards should go through
    /// `get_connection` instead, which keeps a consumable context.
    pub async fn acquire_write(&self) -> GroupResult<P::Connection> {
        let ctx = self.inner.tracker.new_context();
        let result = self.acquire(Role::Write, ctx, None).await;
        self.inner.tracker.release(ctx);
        result
    }

    /// A role-undetermined connection wrapper; the role is fixed by the
    /// caller's eventual `read()` or `write()` call.
    pub fn get_connection(&self) -> GroupConnection<P> {
        GroupConnection::new(self.clone(), None)
    }

    /// Like `get_connection`, with explicit credentials forwarded to the
    /// provider.
    pub fn get_connection_with(&self, credentials: Credentials) -> GroupConnection<P> {
        GroupConnection::new(self.clone(), Some(credentials))
    }

    /// Endpoint identifier to provider map, in declaration order. Merges
    /// read and write pools when no role is given.
    pub fn endpoints(&self, role: Option<Role>) -> GroupResult<IndexMap<String, Arc<P>>> {
        Ok(self.current_topology()?.endpoints(role))
    }

    /// Register a topology change listener, invoked synchronously on every
    /// publish in registration order.
    pub fn add_topology_listener<F>(&self, listener: F)
    where
        F: Fn(&Arc<TopologySnapshot<P>>) + Send + Sync + 'static,
    {
        self.inner.manager.add_listener(Box::new(listener));
    }

    /// Toggle write-target tracing. Disabling discards pending targets.
    pub fn set_write_target_tracing(&self, enabled: bool) {
        if enabled {
            self.inner.tracker.enable();
        } else {
            self.inner.tracker.disable();
        }
        tracing::info!(enabled, "Write-target tracing toggled");
    }

    pub fn write_target_tracing_enabled(&self) -> bool {
        self.inner.tracker.is_enabled()
    }

    /// Mint a context for use with `acquire` and `consume_last_write_target`.
    pub fn new_context(&self) -> ContextId {
        self.inner.tracker.new_context()
    }

    /// Return and clear the endpoint that served the last traced write in
    /// `ctx`.
    pub fn consume_last_write_target(&self, ctx: ContextId) -> Option<String> {
        self.inner.tracker.consume(ctx)
    }

    pub fn group_key(&self) -> &str {
        &self.inner.config.group_key
    }

    pub fn app_name(&self) -> &str {
        &self.inner.config.app_name
    }

    pub fn unit_name(&self) -> Option<&str> {
        self.inner.config.unit_name.as_deref()
    }

    pub fn full_group_key(&self) -> String {
        self.inner.config.full_group_key()
    }

    pub fn extra_config_key(&self) -> String {
        self.inner.config.extra_config_key()
    }

    pub fn config(&self) -> &GroupConfig {
        &self.inner.config
    }

    /// Stop background reload tasks, release the snapshot and listeners.
    ///
    /// Connection providers are left untouched; their lifecycle belongs to
    /// the collaborator that supplied them.
    pub fn shutdown(&self) {
        for task in self
            .inner
            .tasks
            .lock()
            .expect("task registry lock poisoned")
            .drain(..)
        {
            task.abort();
        }
        self.inner
            .watchers
            .lock()
            .expect("watcher registry lock poisoned")
            .clear();
        self.inner.tracker.disable();
        self.inner.manager.shutdown();
        tracing::info!(group = %self.inner.config.group_key, "Group datasource shut down");
    }

    fn push_task(&self, handle: JoinHandle<()>) {
        self.inner
            .tasks
            .lock()
            .expect("task registry lock poisoned")
            .push(handle);
    }
}

/// A not-yet-acquired connection: the role is decided by whether the
/// caller ends up reading or writing.
///
/// Carries its own tracker context, so `last_write_target` observes
/// exactly the writes made through this wrapper.
pub struct GroupConnection<P: ConnectionProvider> {
    group: GroupDataSource<P>,
    ctx: ContextId,
    credentials: Option<Credentials>,
}

impl<P: ConnectionProvider> GroupConnection<P> {
    fn new(group: GroupDataSource<P>, credentials: Option<Credentials>) -> Self {
        let ctx = group.inner.tracker.new_context();
        Self {
            group,
            ctx,
            credentials,
        }
    }

    /// Acquire from the read pool.
    pub async fn read(&self) -> GroupResult<P::Connection> {
        self.group
            .acquire(Role::Read, self.ctx, self.credentials.as_ref())
            .await
    }

    /// Acquire from the write pool.
    pub async fn write(&self) -> GroupResult<P::Connection> {
        self.group
            .acquire(Role::Write, self.ctx, self.credentials.as_ref())
            .await
    }

    /// Return and clear the endpoint that served the last traced write.
    pub fn last_write_target(&self) -> Option<String> {
        self.group.consume_last_write_target(self.ctx)
    }

    pub fn context(&self) -> ContextId {
        self.ctx
    }
}

impl<P: ConnectionProvider> Drop for GroupConnection<P> {
    fn drop(&mut self) {
        self.group.inner.tracker.release(self.ctx);
    }
}
