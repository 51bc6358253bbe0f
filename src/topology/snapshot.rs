//! Immutable, versioned view of the full group topology.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::topology::endpoint::Role;
use crate::topology::pool::ReplicaPool;

/// One internally consistent pair of read and write pools.
///
/// Never mutated after publication. A caller that captured a reference keeps
/// a fully consistent view even while a replacement is being built.
pub struct TopologySnapshot<P> {
    version: u64,
    read: ReplicaPool<P>,
    write: ReplicaPool<P>,
}

impl<P> std::fmt::Debug for TopologySnapshot<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologySnapshot")
            .field("version", &self.version)
            .field("read", &self.read.len())
            .field("write", &self.write.len())
            .finish()
    }
}

impl<P> TopologySnapshot<P> {
    pub(crate) fn new(version: u64, read: ReplicaPool<P>, write: ReplicaPool<P>) -> Self {
        Self {
            version,
            read,
            write,
        }
    }

    /// Monotonically increasing across publishes within one manager.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn pool(&self, role: Role) -> &ReplicaPool<P> {
        match role {
            Role::Read => &self.read,
            Role::Write => &self.write,
        }
    }

    /// Endpoint identifier to provider map, in declaration order.
    ///
    /// With no role given, read and write pools are merged, read entries
    /// first and duplicate keys collapsed.
    pub fn endpoints(&self, role: Option<Role>) -> IndexMap<String, Arc<P>> {
        let mut map = IndexMap::new();
        let mut collect = |pool: &ReplicaPool<P>| {
            for entry in pool.entries() {
                let endpoint = entry.endpoint();
                map.entry(endpoint.key().to_string())
                    .or_insert_with(|| endpoint.provider().clone());
            }
        };
        match role {
            Some(Role::Read) => collect(&self.read),
            Some(Role::Write) => collect(&self.write),
            None => {
                collect(&self.read);
                collect(&self.write);
            }
        }
        map
    }
}
