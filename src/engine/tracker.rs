//! Write-target tracking.
//!
//! Records which endpoint most recently served a write for each logical
//! caller context, with consume-once reads. Callers use it to pin a
//! follow-up read to the replica that just accepted a write, e.g. for
//! audit-log inserts.
//!
//! # Design Decisions
//! - One slot per explicit context, never ambient per-thread state
//! - Enabling and disabling is a process-wide publication (SeqCst);
//!   disabling discards every pending value

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;

/// Identifies one logical caller context (typically one `GroupConnection`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

/// Process-wide write-target registry.
pub struct WriteTargetTracker {
    enabled: AtomicBool,
    slots: DashMap<ContextId, String>,
    next_context: AtomicU64,
}

impl Default for WriteTargetTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteTargetTracker {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            slots: DashMap::new(),
            next_context: AtomicU64::new(0),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Disable tracking and discard any pending recorded values.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.slots.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Mint a fresh context identifier.
    pub fn new_context(&self) -> ContextId {
        ContextId(self.next_context.fetch_add(1, Ordering::Relaxed))
    }

    /// Drop the slot of a finished context.
    pub fn release(&self, ctx: ContextId) {
        self.slots.remove(&ctx);
    }

    /// Record the endpoint that served a write. No-op while disabled.
    pub fn record(&self, ctx: ContextId, endpoint: &str) {
        if self.is_enabled() {
            self.slots.insert(ctx, endpoint.to_string());
        }
    }

    /// Return and clear the recorded endpoint for `ctx`.
    ///
    /// `None` when disabled, or when nothing was recorded since the last
    /// consume.
    pub fn consume(&self, ctx: ContextId) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        self.slots.remove(&ctx).map(|(_, endpoint)| endpoint)
    }
}
