//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)                     remote push source
//!     → loader.rs (parse & deserialize)      → source.rs (DescriptorSource)
//!     → validation.rs (identifier checks)    → descriptor string
//!     → GroupConfig (validated)              → descriptor.rs (parse)
//!     → descriptor.rs (parse topology)
//!     → topology build + atomic snapshot swap
//!
//! On reload:
//!     watcher.rs detects file change
//!     → loader.rs loads new config
//!     → topology descriptor re-parsed
//!     → new snapshot published, callers unaffected mid-flight
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod descriptor;
pub mod loader;
pub mod schema;
pub mod source;
pub mod validation;
pub mod watcher;

pub use descriptor::{DescriptorEntry, TopologyDescriptor};
pub use schema::{GroupConfig, ReloadConfig, RetryConfig};
pub use source::{DescriptorSource, InMemoryDescriptorSource};
