//! Per-attempt opportunistic allocation state.
//!
//! One `OpportunisticContainerContext` exists for every registered
//! application attempt. It bundles the attempt's node cache, the
//! container-id counter, the sizing policy surfaced at registration,
//! and the rotation cursor used to break ranking ties.
//!
//! # Container id space
//!
//! ```text
//!  63            48 47                    24 23                     0
//! ┌────────────────┬────────────────────────┬────────────────────────┐
//! │     epoch      │  registration sequence │   per-attempt counter  │
//! └────────────────┴────────────────────────┴────────────────────────┘
//! ```
//!
//! Each registration receives its own block, so ids drawn by
//! concurrently running attempts never collide. Sequence 0 is left to
//! the central scheduler's guaranteed containers. Once the sequence
//! reaches [`MAX_REGISTRATIONS`] no further blocks can be handed out
//! under the current epoch.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use opal_core::{ApplicationAttemptId, Container, ContainerId, ContainerSizing};

use crate::cursor::RotationCursor;
use crate::node_store::NodeStore;

/// Bit offset of the epoch within a container id.
pub const EPOCH_SHIFT: u32 = 48;
/// Bit offset of the registration sequence within a container id.
pub const SEQUENCE_SHIFT: u32 = 24;

/// Largest epoch that fits the id layout.
pub const MAX_EPOCH: u64 = (1 << (64 - EPOCH_SHIFT)) - 1;
/// Registrations per epoch; sequences run from 1 to this value.
pub const MAX_REGISTRATIONS: u64 = (1 << (EPOCH_SHIFT - SEQUENCE_SHIFT)) - 1;

/// Half-open range of container ids reserved for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerIdRange {
    pub start: u64,
    pub end: u64,
}

impl ContainerIdRange {
    /// The block owned by the `sequence`-th registration under `epoch`.
    ///
    /// Returns `None` when the pair falls outside the id layout: sequence
    /// 0, a sequence above [`MAX_REGISTRATIONS`] or an epoch above
    /// [`MAX_EPOCH`].
    pub fn for_registration(epoch: u64, sequence: u64) -> Option<Self> {
        if epoch > MAX_EPOCH || sequence == 0 || sequence > MAX_REGISTRATIONS {
            return None;
        }
        let start = (epoch << EPOCH_SHIFT) | (sequence << SEQUENCE_SHIFT);
        Some(Self {
            start,
            end: start.saturating_add(1 << SEQUENCE_SHIFT),
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: u64) -> bool {
        (self.start..self.end).contains(&id)
    }
}

pub struct OpportunisticContainerContext {
    attempt_id: ApplicationAttemptId,
    nodes: NodeStore,
    ids: ContainerIdRange,
    next_id: AtomicU64,
    sizing: ContainerSizing,
    cursor: RotationCursor,
    /// Containers a distributed-scheduling AM placed on its own.
    self_placed: Mutex<HashMap<ContainerId, Container>>,
}

impl OpportunisticContainerContext {
    pub fn new(
        attempt_id: ApplicationAttemptId,
        ids: ContainerIdRange,
        sizing: ContainerSizing,
        nodes: NodeStore,
    ) -> Self {
        Self {
            attempt_id,
            nodes,
            ids,
            next_id: AtomicU64::new(ids.start),
            sizing,
            cursor: RotationCursor::new(),
            self_placed: Mutex::new(HashMap::new()),
        }
    }

    pub fn attempt_id(&self) -> ApplicationAttemptId {
        self.attempt_id
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    pub fn sizing(&self) -> &ContainerSizing {
        &self.sizing
    }

    pub fn cursor(&self) -> &RotationCursor {
        &self.cursor
    }

    pub fn container_id_range(&self) -> ContainerIdRange {
        self.ids
    }

    pub fn container_id_start(&self) -> u64 {
        self.ids.start
    }

    /// Draw the next container id, or `None` once the block is spent.
    pub fn next_container_id(&self) -> Option<ContainerId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if id >= self.ids.end {
            warn!(attempt_id = %self.attempt_id, "container id block exhausted");
            return None;
        }
        Some(ContainerId::new(self.attempt_id, id))
    }

    /// Number of ids handed out so far.
    pub fn issued_count(&self) -> u64 {
        self.next_id
            .load(Ordering::Relaxed)
            .min(self.ids.end)
            .saturating_sub(self.ids.start)
    }

    /// Record containers the AM placed itself. Returns how many were new.
    pub fn record_self_placed(&self, containers: &[Container]) -> usize {
        let mut placed = self.self_placed.lock().expect("self-placed lock");
        containers
            .iter()
            .filter(|c| placed.insert(c.id, (*c).clone()).is_none())
            .count()
    }

    pub fn self_placed_count(&self) -> usize {
        self.self_placed.lock().expect("self-placed lock").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::{ContainerToken, ExecutionType, NodeId, Resource};

    fn attempt() -> ApplicationAttemptId {
        ApplicationAttemptId::new(1000, 1, 1)
    }

    fn context(ids: ContainerIdRange) -> OpportunisticContainerContext {
        OpportunisticContainerContext::new(attempt(), ids, ContainerSizing::default(), NodeStore::new())
    }

    #[test]
    fn registration_blocks_are_disjoint() {
        let a = ContainerIdRange::for_registration(0, 1).unwrap();
        let b = ContainerIdRange::for_registration(0, 2).unwrap();
        let c = ContainerIdRange::for_registration(1, 1).unwrap();
        assert!(a.end <= b.start);
        assert!(!c.contains(a.start));
        assert!(!c.contains(b.start));
        assert_eq!(a.len(), 1 << SEQUENCE_SHIFT);
    }

    #[test]
    fn sequence_outside_layout_has_no_block() {
        assert!(ContainerIdRange::for_registration(0, 0).is_none());
        assert!(ContainerIdRange::for_registration(0, MAX_REGISTRATIONS + 1).is_none());
        assert!(ContainerIdRange::for_registration(MAX_EPOCH + 1, 1).is_none());

        let last = ContainerIdRange::for_registration(MAX_EPOCH, MAX_REGISTRATIONS).unwrap();
        let first = ContainerIdRange::for_registration(MAX_EPOCH, 1).unwrap();
        assert!(first.end <= last.start);
        assert_eq!(last.end, u64::MAX);
    }

    #[test]
    fn ids_start_at_block_start_and_increase() {
        let ids = ContainerIdRange::for_registration(0, 3).unwrap();
        let ctx = context(ids);
        assert_eq!(ctx.container_id_start(), ids.start);

        let first = ctx.next_container_id().unwrap();
        let second = ctx.next_container_id().unwrap();
        assert_eq!(first.id, ids.start);
        assert_eq!(second.id, ids.start + 1);
        assert_eq!(first.attempt_id, attempt());
        assert_eq!(ctx.issued_count(), 2);
    }

    #[test]
    fn exhausted_block_yields_none() {
        let ctx = context(ContainerIdRange { start: 10, end: 12 });
        assert!(ctx.next_container_id().is_some());
        assert!(ctx.next_container_id().is_some());
        assert!(ctx.next_container_id().is_none());
        assert_eq!(ctx.issued_count(), 2);
    }

    #[test]
    fn self_placed_containers_are_deduplicated() {
        let ctx = context(ContainerIdRange::for_registration(0, 1).unwrap());
        let container = Container {
            id: ContainerId::new(attempt(), 42),
            node_id: NodeId::new("h1", 1234),
            node_http_address: "h1:8042".to_string(),
            resource: Resource::new(1024, 1),
            priority: 1,
            execution_type: ExecutionType::Opportunistic,
            token: ContainerToken("t".to_string()),
        };

        assert_eq!(ctx.record_self_placed(&[container.clone()]), 1);
        assert_eq!(ctx.record_self_placed(&[container]), 0);
        assert_eq!(ctx.self_placed_count(), 1);
    }
}
