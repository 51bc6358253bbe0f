//! Shared mock providers for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use replica_group::{ConnectionProvider, Credentials, ProviderFactory};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "replica_group=debug".into()),
        )
        .try_init();
}

/// Error returned by a failing mock provider.
#[derive(Debug, Error)]
#[error("mock provider '{0}' refused the connection")]
pub struct MockProviderError(pub String);

/// Connection handle handed out by the mock provider.
#[derive(Debug)]
pub struct MockConnection {
    pub endpoint: String,
    pub username: Option<String>,
}

/// A programmable connection provider: can fail a fixed number of opens,
/// fail permanently, and counts every open attempt.
pub struct MockProvider {
    key: String,
    fail_first: AtomicU32,
    always_fail: AtomicBool,
    opens: AtomicU32,
}

impl MockProvider {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            fail_first: AtomicU32::new(0),
            always_fail: AtomicBool::new(false),
            opens: AtomicU32::new(0),
        }
    }

    /// Fail the next `n` opens, then recover.
    pub fn fail_next(&self, n: u32) {
        self.fail_first.store(n, Ordering::SeqCst);
    }

    /// Fail every open until `fail_next(0)` or `set_healthy`.
    pub fn fail_always(&self) {
        self.always_fail.store(true, Ordering::SeqCst);
    }

    pub fn set_healthy(&self) {
        self.always_fail.store(false, Ordering::SeqCst);
        self.fail_first.store(0, Ordering::SeqCst);
    }

    /// Number of open attempts made against this provider.
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ConnectionProvider for MockProvider {
    type Connection = MockConnection;
    type Error = MockProviderError;

    fn open_connection<'a>(
        &'a self,
        credentials: Option<&'a Credentials>,
    ) -> BoxFuture<'a, Result<MockConnection, MockProviderError>> {
        Box::pin(async move {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.always_fail.load(Ordering::SeqCst) {
                return Err(MockProviderError(self.key.clone()));
            }
            let remaining = self.fail_first.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_first.store(remaining - 1, Ordering::SeqCst);
                return Err(MockProviderError(self.key.clone()));
            }
            Ok(MockConnection {
                endpoint: self.key.clone(),
                username: credentials.map(|c| c.username.clone()),
            })
        })
    }
}

/// Factory over a fixed set of mock providers.
pub struct MockFactory {
    providers: HashMap<String, Arc<MockProvider>>,
}

impl MockFactory {
    pub fn with_keys(keys: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            providers: keys
                .iter()
                .map(|&key| (key.to_string(), Arc::new(MockProvider::new(key))))
                .collect(),
        })
    }

    /// Direct handle to one of the providers, for failure injection.
    pub fn provider_named(&self, key: &str) -> Arc<MockProvider> {
        self.providers[key].clone()
    }
}

impl ProviderFactory<MockProvider> for MockFactory {
    fn provider(&self, key: &str) -> Option<Arc<MockProvider>> {
        self.providers.get(key).cloned()
    }
}
