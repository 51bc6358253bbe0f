//! Acquisition engine subsystem.
//!
//! # Data Flow
//! ```text
//! caller captures the live snapshot once
//!     → acquire.rs (weighted selection + bounded retry with exclusion)
//!     → tracker.rs (record winning write endpoint per caller context)
//!     → connection handed back, or ExhaustedRetriesError with history
//! ```
//!
//! # Design Decisions
//! - The engine is stateless between calls apart from the write-target
//!   registry; all topology state lives in the captured snapshot
//! - Failure marks are scoped to one acquisition call

pub mod acquire;
pub mod tracker;

pub use acquire::SelectionAndRetryEngine;
pub use tracker::{ContextId, WriteTargetTracker};
