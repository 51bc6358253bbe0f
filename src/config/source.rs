//! External descriptor push source.
//!
//! # Responsibilities
//! - Define the collaborator interface that delivers topology descriptor
//!   strings asynchronously, keyed by the derived group key
//! - Provide an in-process implementation for tests and embedding apps
//!   that manage descriptors themselves

use dashmap::DashMap;
use tokio::sync::mpsc;

/// Asynchronous push source for topology descriptor strings.
///
/// The group subscribes with its derived key (`group/<group_key>`). The
/// first value observed on the receiver is the initial topology; later
/// values reconfigure the group. Delivery of the first value is bounded by
/// the configured receive timeout.
pub trait DescriptorSource: Send + Sync {
    /// Subscribe to descriptor pushes for `key`.
    fn subscribe(&self, key: &str) -> mpsc::UnboundedReceiver<String>;
}

#[derive(Default)]
struct KeyState {
    last: Option<String>,
    subscribers: Vec<mpsc::UnboundedSender<String>>,
}

/// In-process descriptor source.
///
/// Remembers the last descriptor pushed per key and replays it to new
/// subscribers, so subscribe-then-push and push-then-subscribe both
/// deliver an initial topology.
#[derive(Default)]
pub struct InMemoryDescriptorSource {
    keys: DashMap<String, KeyState>,
}

impl InMemoryDescriptorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a descriptor for `key` to every live subscriber.
    pub fn push(&self, key: &str, descriptor: &str) {
        let mut state = self.keys.entry(key.to_string()).or_default();
        state.last = Some(descriptor.to_string());
        state
            .subscribers
            .retain(|tx| tx.send(descriptor.to_string()).is_ok());
    }
}

impl DescriptorSource for InMemoryDescriptorSource {
    fn subscribe(&self, key: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.keys.entry(key.to_string()).or_default();
        if let Some(last) = &state.last {
            let _ = tx.send(last.clone());
        }
        state.subscribers.push(tx);
        rx
    }
}
