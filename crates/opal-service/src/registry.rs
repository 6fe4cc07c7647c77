//! Registry of live application attempts and their contexts.
//!
//! Besides one `OpportunisticContainerContext` per registered attempt,
//! the registry keeps a cluster-wide replica of the node set. Node
//! events update the replica and then fan out to every live context;
//! a registering attempt's cache is seeded from the replica.
//!
//! Registration takes the registry write lock and event fan-out holds
//! the read lock, so an attempt either registers after an event (and
//! sees it in the replica) or before it (and receives it in fan-out).
//!
//! Finished attempts are remembered up to a retention bound, oldest
//! forgotten first. A forgotten attempt is treated as never registered.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use opal_allocator::{ContainerIdRange, NodeStore, OpportunisticContainerContext};
use opal_core::{ApplicationAttemptId, ContainerSizing, NodeRecord};

use crate::error::{ServiceError, ServiceResult};
use crate::events::NodeEvent;

/// Outcome of unregistering an attempt.
pub enum FinishOutcome {
    /// The attempt was live; its context has been released.
    Unregistered,
    /// The attempt had already been unregistered.
    AlreadyUnregistered,
    /// The attempt never registered.
    NotRegistered,
}

/// Default number of finished attempts remembered.
pub const DEFAULT_FINISHED_RETENTION: usize = 10_000;

struct Attempts {
    live: HashMap<ApplicationAttemptId, Arc<OpportunisticContainerContext>>,
    finished: HashSet<ApplicationAttemptId>,
    /// Finish order of `finished`, oldest first.
    finished_order: VecDeque<ApplicationAttemptId>,
    /// Registration sequence; 0 is reserved for guaranteed containers.
    next_sequence: u64,
}

impl Attempts {
    fn new() -> Self {
        Self {
            live: HashMap::new(),
            finished: HashSet::new(),
            finished_order: VecDeque::new(),
            next_sequence: 1,
        }
    }

    fn mark_finished(&mut self, attempt_id: ApplicationAttemptId, retention: usize) {
        if !self.finished.insert(attempt_id) {
            return;
        }
        self.finished_order.push_back(attempt_id);
        while self.finished_order.len() > retention {
            if let Some(oldest) = self.finished_order.pop_front() {
                self.finished.remove(&oldest);
                debug!(attempt_id = %oldest, "finished attempt forgotten");
            }
        }
    }
}

pub struct AttemptRegistry {
    attempts: RwLock<Attempts>,
    cluster_nodes: NodeStore,
    sizing: ContainerSizing,
    epoch: u64,
    finished_retention: usize,
    events_applied: AtomicU64,
}

impl AttemptRegistry {
    pub fn new(sizing: ContainerSizing, epoch: u64) -> Self {
        Self {
            attempts: RwLock::new(Attempts::new()),
            cluster_nodes: NodeStore::new(),
            sizing,
            epoch,
            finished_retention: DEFAULT_FINISHED_RETENTION,
            events_applied: AtomicU64::new(0),
        }
    }

    /// Bound on remembered finished attempts.
    pub fn with_finished_retention(mut self, retention: usize) -> Self {
        self.finished_retention = retention;
        self
    }

    pub fn sizing(&self) -> &ContainerSizing {
        &self.sizing
    }

    /// Create a context for a newly registered attempt.
    pub fn register(
        &self,
        attempt_id: ApplicationAttemptId,
    ) -> ServiceResult<Arc<OpportunisticContainerContext>> {
        let mut attempts = self.attempts.write().expect("attempt registry lock");
        if attempts.live.contains_key(&attempt_id) {
            return Err(ServiceError::AlreadyRegistered(attempt_id));
        }
        if attempts.finished.contains(&attempt_id) {
            return Err(ServiceError::AttemptFinished(attempt_id));
        }

        let sequence = attempts.next_sequence;
        let Some(ids) = ContainerIdRange::for_registration(self.epoch, sequence) else {
            warn!(%attempt_id, epoch = self.epoch, sequence, "container id space exhausted");
            return Err(ServiceError::ContainerIdsExhausted { epoch: self.epoch });
        };
        attempts.next_sequence = sequence + 1;
        let nodes = NodeStore::from_nodes(self.cluster_nodes.snapshot());
        let seeded = nodes.len();
        let ctx = Arc::new(OpportunisticContainerContext::new(
            attempt_id,
            ids,
            self.sizing,
            nodes,
        ));
        attempts.live.insert(attempt_id, ctx.clone());

        info!(
            %attempt_id,
            container_id_start = ids.start,
            seeded_nodes = seeded,
            "opportunistic context created"
        );
        Ok(ctx)
    }

    /// Look up the context of a registered attempt.
    pub fn get(&self, attempt_id: &ApplicationAttemptId) -> ServiceResult<Arc<OpportunisticContainerContext>> {
        let attempts = self.attempts.read().expect("attempt registry lock");
        if let Some(ctx) = attempts.live.get(attempt_id) {
            return Ok(ctx.clone());
        }
        if attempts.finished.contains(attempt_id) {
            Err(ServiceError::AttemptFinished(*attempt_id))
        } else {
            Err(ServiceError::NotRegistered(*attempt_id))
        }
    }

    /// Release an attempt's context. Repeated calls report
    /// [`FinishOutcome::AlreadyUnregistered`].
    pub fn finish(&self, attempt_id: &ApplicationAttemptId) -> FinishOutcome {
        let mut attempts = self.attempts.write().expect("attempt registry lock");
        match attempts.live.remove(attempt_id) {
            Some(ctx) => {
                attempts.mark_finished(*attempt_id, self.finished_retention);
                info!(%attempt_id, issued = ctx.issued_count(), "opportunistic context released");
                FinishOutcome::Unregistered
            }
            None if attempts.finished.contains(attempt_id) => FinishOutcome::AlreadyUnregistered,
            None => FinishOutcome::NotRegistered,
        }
    }

    /// Drop a context whose registration did not complete. The attempt
    /// may register again.
    pub fn discard(&self, attempt_id: &ApplicationAttemptId) {
        let mut attempts = self.attempts.write().expect("attempt registry lock");
        attempts.live.remove(attempt_id);
    }

    pub fn is_registered(&self, attempt_id: &ApplicationAttemptId) -> bool {
        let attempts = self.attempts.read().expect("attempt registry lock");
        attempts.live.contains_key(attempt_id)
    }

    pub fn live_attempts(&self) -> Vec<ApplicationAttemptId> {
        let attempts = self.attempts.read().expect("attempt registry lock");
        attempts.live.keys().copied().collect()
    }

    /// Apply one node event to the cluster replica and every live cache.
    pub fn apply(&self, event: &NodeEvent) {
        let attempts = self.attempts.read().expect("attempt registry lock");
        let changed = match event {
            NodeEvent::Added(node) => {
                self.cluster_nodes.upsert(node);
                for ctx in attempts.live.values() {
                    ctx.nodes().upsert(node);
                }
                true
            }
            NodeEvent::Updated(node) => {
                let known = self.cluster_nodes.update(node);
                for ctx in attempts.live.values() {
                    ctx.nodes().update(node);
                }
                known
            }
            NodeEvent::Removed(node_id) => {
                let known = self.cluster_nodes.remove(node_id);
                for ctx in attempts.live.values() {
                    ctx.nodes().remove(node_id);
                }
                known
            }
        };
        drop(attempts);

        self.events_applied.fetch_add(1, Ordering::Relaxed);
        debug!(event = event_kind(event), node = %event.node_id(), changed, "node event applied");
    }

    /// Total node events applied so far.
    pub fn events_applied(&self) -> u64 {
        self.events_applied.load(Ordering::Relaxed)
    }

    /// The service's cluster-wide node replica.
    pub fn cluster_nodes(&self) -> Vec<NodeRecord> {
        self.cluster_nodes.snapshot()
    }
}

fn event_kind(event: &NodeEvent) -> &'static str {
    match event {
        NodeEvent::Added(_) => "added",
        NodeEvent::Updated(_) => "updated",
        NodeEvent::Removed(_) => "removed",
    }
}
