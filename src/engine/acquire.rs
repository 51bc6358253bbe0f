//! Selection and bounded-retry acquisition.
//!
//! # Data Flow
//! ```text
//! acquire(snapshot, role)
//!     → pool.select(excluding) (weighted, priority-ordered)
//!     → provider.open_connection (optional per-attempt timeout)
//!     → success: record write target (if tracing), return connection
//!     → failure: exclude endpoint, log attempt, retry
//!     → budget spent or pool exhausted: ExhaustedRetriesError with the
//!       full attempt history
//! ```
//!
//! # Design Decisions
//! - The snapshot captured by the caller is used for the whole loop; the
//!   engine never mutates it
//! - A failed endpoint is excluded for this call only; persistent liveness
//!   belongs to an external health collaborator
//! - Pool exhaustion fails immediately instead of re-attempting excluded
//!   candidates

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::RetryConfig;
use crate::engine::tracker::{ContextId, WriteTargetTracker};
use crate::errors::{AcquireError, AttemptFailure, ExhaustedRetriesError};
use crate::observability::metrics;
use crate::topology::endpoint::{ConnectionProvider, Credentials, Role};
use crate::topology::pool::ReplicaPool;
use crate::topology::snapshot::TopologySnapshot;

/// Executes the selection and retry protocol against one snapshot.
pub struct SelectionAndRetryEngine {
    max_attempts: u32,
    acquire_timeout: Option<Duration>,
    auto_select_write: bool,
    tracker: Arc<WriteTargetTracker>,
}

impl SelectionAndRetryEngine {
    pub fn new(retry: &RetryConfig, tracker: Arc<WriteTargetTracker>) -> Self {
        Self {
            max_attempts: retry.max_attempts.max(1),
            acquire_timeout: retry.acquire_timeout(),
            auto_select_write: retry.auto_select_write,
            tracker,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Acquire a connection for `role` from `snapshot`.
    ///
    /// Walks candidates in selection order, excluding each failed endpoint
    /// for the remainder of the call, and gives up once the attempt budget
    /// is spent or no live candidate remains.
    pub async fn acquire<P: ConnectionProvider>(
        &self,
        snapshot: &TopologySnapshot<P>,
        role: Role,
        ctx: ContextId,
        credentials: Option<&Credentials>,
    ) -> Result<P::Connection, ExhaustedRetriesError> {
        let pool = snapshot.pool(role);
        let mut excluding: HashSet<String> = HashSet::new();
        let mut failures: Vec<AttemptFailure> = Vec::new();

        for attempt in 1..=self.max_attempts {
            let Some(entry) = pool.select(&excluding) else {
                // Fewer live candidates than the attempt budget; stop here.
                break;
            };
            let key = entry.endpoint().key();
            metrics::record_acquire_attempt(role, key);

            match self.open(entry.endpoint().provider(), credentials).await {
                Ok(connection) => {
                    if role == Role::Write {
                        self.tracker.record(ctx, key);
                        self.note_write_target(pool, key);
                    }
                    tracing::debug!(
                        endpoint = %key,
                        role = %role,
                        attempt,
                        version = snapshot.version(),
                        "Connection acquired"
                    );
                    metrics::record_acquire_success(role, key);
                    return Ok(connection);
                }
                Err(error) => {
                    tracing::warn!(
                        endpoint = %key,
                        role = %role,
                        attempt,
                        error = %error,
                        "Acquisition attempt failed"
                    );
                    metrics::record_acquire_failure(role, key);
                    excluding.insert(key.to_string());
                    failures.push(AttemptFailure {
                        endpoint: key.to_string(),
                        attempt,
                        error,
                    });
                }
            }
        }

        Err(ExhaustedRetriesError {
            role,
            attempts: failures,
        })
    }

    async fn open<P: ConnectionProvider>(
        &self,
        provider: &Arc<P>,
        credentials: Option<&Credentials>,
    ) -> Result<P::Connection, AcquireError> {
        let open = provider.open_connection(credentials);
        match self.acquire_timeout {
            Some(window) => match tokio::time::timeout(window, open).await {
                Ok(result) => result.map_err(|e| AcquireError::Provider(Box::new(e))),
                Err(_) => Err(AcquireError::Timeout(window)),
            },
            None => open.await.map_err(|e| AcquireError::Provider(Box::new(e))),
        }
    }

    fn note_write_target<P>(&self, pool: &ReplicaPool<P>, key: &str) {
        let Some(preferred) = pool.preferred() else {
            return;
        };
        let preferred = preferred.endpoint().key();
        if preferred == key {
            return;
        }
        if self.auto_select_write {
            tracing::debug!(endpoint = %key, preferred = %preferred, "Write served by fallback endpoint");
        } else {
            tracing::warn!(endpoint = %key, preferred = %preferred, "Write failed over from preferred endpoint");
        }
    }
}
