//! Replica topology subsystem.
//!
//! # Data Flow
//! ```text
//! topology descriptor
//!     → manager.rs (validate, resolve providers via factory)
//!     → endpoint.rs (immutable endpoint values)
//!     → pool.rs (one weighted pool per role, selection order fixed)
//!     → snapshot.rs (immutable read+write pair, versioned)
//!     → manager.rs (atomic swap of the live reference, notify listeners)
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable after publication; readers never lock
//! - Liveness flags ride alongside endpoints in pool entries, so health
//!   updates never rebuild or reorder a pool

pub mod endpoint;
pub mod manager;
pub mod pool;
pub mod snapshot;

pub use endpoint::{ConnectionProvider, Credentials, EngineKind, ProviderFactory, ReplicaEndpoint, Role};
pub use manager::{TopologyListener, TopologyManager};
pub use pool::{PoolEntry, ReplicaPool};
pub use snapshot::TopologySnapshot;
