//! Replica group datasource.
//!
//! Presents a set of homogeneous database replicas (a primary plus
//! standbys) as a single connection-providing endpoint. Callers never see
//! individual replicas; they ask for a read or a write connection and the
//! group picks the best-weighted healthy candidate, retries on another
//! replica if acquisition fails, and hot-swaps the whole topology at
//! runtime without anyone reconnecting.
//!
//! # Architecture Overview
//!
//! ```text
//!  caller ──► GroupDataSource ──► TopologySnapshot (atomic ref, arc-swap)
//!                 │                    │
//!                 │                    ├── read  ReplicaPool (weighted)
//!                 │                    └── write ReplicaPool (weighted)
//!                 │
//!                 ├──► SelectionAndRetryEngine (bounded retry, exclusion)
//!                 │        └──► ConnectionProvider (opaque, per replica)
//!                 │
//!                 └──► WriteTargetTracker (consume-once, per context)
//!
//!  descriptor pushes / config file ──► TopologyManager ──► new snapshot
//! ```
//!
//! Data replication between replicas happens beneath this crate; so does
//! per-replica pooling, which stays behind the [`ConnectionProvider`]
//! seam.

// Core subsystems
pub mod config;
pub mod topology;

// Acquisition
pub mod engine;

// Cross-cutting concerns
pub mod errors;
pub mod observability;

mod group;

pub use config::{DescriptorSource, GroupConfig, InMemoryDescriptorSource, TopologyDescriptor};
pub use engine::{ContextId, WriteTargetTracker};
pub use errors::{
    AcquireError, AttemptFailure, ConfigurationError, ConfigurationTimeoutError,
    ExhaustedRetriesError, GroupError, GroupResult,
};
pub use group::{GroupConnection, GroupDataSource};
pub use topology::{
    ConnectionProvider, Credentials, EngineKind, ProviderFactory, ReplicaEndpoint, ReplicaPool,
    Role, TopologyManager, TopologySnapshot,
};
