//! Per-attempt node cache.
//!
//! A replica of the scheduler's node set, limited to what opportunistic
//! placement needs. It is fed by node events and may lag the scheduler;
//! add and remove are idempotent so duplicate events are harmless.
//!
//! Readers that make placement decisions go through [`NodeStore::read`]
//! so a concurrent removal waits for the decision to finish instead of
//! pulling a node out from under it.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use opal_core::{NodeId, NodeRecord};

/// Node identifier → node record, guarded for concurrent event and
/// allocate traffic.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: RwLock<HashMap<NodeId, NodeRecord>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from an existing node set.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeRecord>,
    {
        let map = nodes.into_iter().map(|n| (n.node_id.clone(), n)).collect();
        Self {
            nodes: RwLock::new(map),
        }
    }

    /// Insert or refresh a node. Returns `true` if the node was new.
    pub fn upsert(&self, node: &NodeRecord) -> bool {
        let mut nodes = self.nodes.write().expect("node store lock");
        match nodes.get_mut(&node.node_id) {
            Some(existing) => {
                existing.refresh_from(node);
                false
            }
            None => {
                nodes.insert(node.node_id.clone(), node.clone());
                true
            }
        }
    }

    /// Refresh a node that is already cached. Returns `false` (and does
    /// nothing) if the node is unknown.
    pub fn update(&self, node: &NodeRecord) -> bool {
        let mut nodes = self.nodes.write().expect("node store lock");
        match nodes.get_mut(&node.node_id) {
            Some(existing) => {
                existing.refresh_from(node);
                true
            }
            None => false,
        }
    }

    /// Remove a node. Returns `true` if it was present.
    pub fn remove(&self, node_id: &NodeId) -> bool {
        let mut nodes = self.nodes.write().expect("node store lock");
        nodes.remove(node_id).is_some()
    }

    pub fn len(&self) -> usize {
        let nodes = self.nodes.read().expect("node store lock");
        nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every cached record, in no particular order.
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        let nodes = self.nodes.read().expect("node store lock");
        nodes.values().cloned().collect()
    }

    /// Hold the read lock for the duration of a placement decision.
    pub fn read(&self) -> RwLockReadGuard<'_, HashMap<NodeId, NodeRecord>> {
        self.nodes.read().expect("node store lock")
    }
}
