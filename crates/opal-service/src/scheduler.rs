//! The central scheduler, as seen from the AM service.
//!
//! The scheduler owns the authoritative node set, the attempts it has
//! launched, and every guaranteed-container decision. The AM service
//! only consults it through [`ClusterScheduler`].
//!
//! [`InMemoryScheduler`] is a small stand-in used by `opald standalone`
//! and by tests: first-fit placement over tracked node capacity, no
//! queues, no preemption.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use opal_allocator::ContainerTokenIssuer;
use opal_core::{
    ApplicationAttemptId, Container, ContainerId, ExecutionType, NodeId, NodeRecord, Resource,
    ResourceAsk,
};

use crate::events::{NodeEvent, NodeEventSender};

/// Errors raised by the central scheduler. Passed through to the AM
/// unchanged.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler rejected request: {0}")]
    Rejected(String),

    #[error("application attempt not known to scheduler: {0}")]
    UnknownAttempt(ApplicationAttemptId),

    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Lifecycle state of an application attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptState {
    Launched,
    Running,
    Finished,
    Failed,
    Killed,
}

impl AttemptState {
    pub fn is_live(&self) -> bool {
        matches!(self, AttemptState::Launched | AttemptState::Running)
    }
}

/// Final status reported by an AM when it unregisters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalApplicationStatus {
    #[default]
    Undefined,
    Succeeded,
    Failed,
    Killed,
}

/// What the scheduler knows about an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptInfo {
    pub queue: String,
    pub state: AttemptState,
}

/// Guaranteed-path collaborator.
pub trait ClusterScheduler: Send + Sync {
    fn attempt(&self, attempt_id: &ApplicationAttemptId) -> Option<AttemptInfo>;

    /// The AM for this attempt has registered.
    fn register_attempt(&self, attempt_id: &ApplicationAttemptId) -> SchedulerResult<()>;

    /// Place guaranteed asks and release containers the AM gave back.
    fn allocate(
        &self,
        attempt_id: &ApplicationAttemptId,
        asks: &[ResourceAsk],
        releases: &[ContainerId],
    ) -> SchedulerResult<Vec<Container>>;

    /// The AM for this attempt has unregistered. Must be idempotent.
    fn unregister_attempt(
        &self,
        attempt_id: &ApplicationAttemptId,
        final_status: FinalApplicationStatus,
    ) -> SchedulerResult<()>;

    fn num_cluster_nodes(&self) -> usize;

    /// Largest guaranteed container the cluster can grant.
    fn maximum_capability(&self) -> Resource;
}

// ── In-memory scheduler ────────────────────────────────────────────

#[derive(Default)]
struct Inner {
    nodes: HashMap<NodeId, NodeRecord>,
    used: HashMap<NodeId, Resource>,
    attempts: HashMap<ApplicationAttemptId, AttemptInfo>,
    next_container: HashMap<ApplicationAttemptId, u64>,
    granted: HashMap<ContainerId, (NodeId, Resource)>,
}

/// First-fit guaranteed scheduler over an in-memory node set.
///
/// Guaranteed container ids are drawn from the bottom of each attempt's
/// id space, below every opportunistic registration block.
pub struct InMemoryScheduler {
    inner: RwLock<Inner>,
    tokens: Arc<dyn ContainerTokenIssuer>,
    events: Option<NodeEventSender>,
}

impl InMemoryScheduler {
    pub fn new(tokens: Arc<dyn ContainerTokenIssuer>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            tokens,
            events: None,
        }
    }

    /// Publish node membership changes on `events`.
    pub fn with_events(mut self, events: NodeEventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Admit an application attempt into `queue`.
    pub fn submit_attempt(&self, attempt_id: ApplicationAttemptId, queue: &str) {
        let mut inner = self.inner.write().expect("scheduler lock");
        inner.attempts.insert(
            attempt_id,
            AttemptInfo {
                queue: queue.to_string(),
                state: AttemptState::Launched,
            },
        );
        info!(%attempt_id, queue, "attempt submitted");
    }

    pub fn set_attempt_state(&self, attempt_id: &ApplicationAttemptId, state: AttemptState) -> bool {
        let mut inner = self.inner.write().expect("scheduler lock");
        match inner.attempts.get_mut(attempt_id) {
            Some(info) => {
                info.state = state;
                true
            }
            None => false,
        }
    }

    pub async fn add_node(&self, node: NodeRecord) {
        {
            let mut inner = self.inner.write().expect("scheduler lock");
            inner.used.entry(node.node_id.clone()).or_default();
            inner.nodes.insert(node.node_id.clone(), node.clone());
        }
        info!(node = %node.node_id, capability = %node.capability, "node added");
        self.publish(NodeEvent::Added(node)).await;
    }

    /// Record a heartbeat. Unknown nodes are ignored.
    pub async fn update_node(&self, node: NodeRecord) -> bool {
        let known = {
            let mut inner = self.inner.write().expect("scheduler lock");
            match inner.nodes.get_mut(&node.node_id) {
                Some(existing) => {
                    existing.refresh_from(&node);
                    true
                }
                None => false,
            }
        };
        if known {
            self.publish(NodeEvent::Updated(node)).await;
        } else {
            warn!(node = %node.node_id, "heartbeat from unknown node");
        }
        known
    }

    pub async fn remove_node(&self, node_id: &NodeId) -> bool {
        let removed = {
            let mut inner = self.inner.write().expect("scheduler lock");
            inner.used.remove(node_id);
            inner.nodes.remove(node_id).is_some()
        };
        if removed {
            info!(node = %node_id, "node removed");
            self.publish(NodeEvent::Removed(node_id.clone())).await;
        }
        removed
    }

    pub fn nodes(&self) -> Vec<NodeRecord> {
        let inner = self.inner.read().expect("scheduler lock");
        inner.nodes.values().cloned().collect()
    }

    async fn publish(&self, event: NodeEvent) {
        if let Some(events) = &self.events {
            if events.send(event).await.is_err() {
                warn!("node event receiver dropped");
            }
        }
    }

    fn grant(
        &self,
        inner: &mut Inner,
        attempt_id: &ApplicationAttemptId,
        ask: &ResourceAsk,
    ) -> Option<Container> {
        let mut candidates: Vec<&NodeRecord> = inner
            .nodes
            .values()
            .filter(|n| ask.is_any() || n.node_id.host == ask.resource_name || ask.relax_locality)
            .collect();
        candidates.sort_by(|a, b| a.node_id.cmp(&b.node_id));

        let node = candidates.into_iter().find(|n| {
            let used = inner.used.get(&n.node_id).copied().unwrap_or_default();
            used.saturating_add(&ask.capability).fits_in(&n.capability)
        })?;
        let node_id = node.node_id.clone();
        let http_address = node.http_address.clone();

        let counter = inner.next_container.entry(*attempt_id).or_insert(1);
        let id = ContainerId::new(*attempt_id, *counter);
        *counter += 1;

        let used = inner.used.entry(node_id.clone()).or_default();
        *used = used.saturating_add(&ask.capability);
        inner.granted.insert(id, (node_id.clone(), ask.capability));

        let token = self
            .tokens
            .issue(&id, &node_id, &ask.capability, ExecutionType::Guaranteed);
        Some(Container {
            id,
            node_id,
            node_http_address: http_address,
            resource: ask.capability,
            priority: ask.priority,
            execution_type: ExecutionType::Guaranteed,
            token,
        })
    }

    fn release(inner: &mut Inner, container_id: &ContainerId) {
        if let Some((node_id, resource)) = inner.granted.remove(container_id) {
            if let Some(used) = inner.used.get_mut(&node_id) {
                *used = used.saturating_sub(&resource);
            }
            debug!(%container_id, node = %node_id, "container released");
        }
    }
}

impl ClusterScheduler for InMemoryScheduler {
    fn attempt(&self, attempt_id: &ApplicationAttemptId) -> Option<AttemptInfo> {
        let inner = self.inner.read().expect("scheduler lock");
        inner.attempts.get(attempt_id).cloned()
    }

    fn register_attempt(&self, attempt_id: &ApplicationAttemptId) -> SchedulerResult<()> {
        let mut inner = self.inner.write().expect("scheduler lock");
        let info = inner
            .attempts
            .get_mut(attempt_id)
            .ok_or(SchedulerError::UnknownAttempt(*attempt_id))?;
        info.state = AttemptState::Running;
        Ok(())
    }

    fn allocate(
        &self,
        attempt_id: &ApplicationAttemptId,
        asks: &[ResourceAsk],
        releases: &[ContainerId],
    ) -> SchedulerResult<Vec<Container>> {
        let mut inner = self.inner.write().expect("scheduler lock");
        if !inner.attempts.contains_key(attempt_id) {
            return Err(SchedulerError::UnknownAttempt(*attempt_id));
        }

        for container_id in releases {
            Self::release(&mut inner, container_id);
        }

        let mut granted = Vec::new();
        for ask in asks {
            for _ in 0..ask.num_containers {
                match self.grant(&mut inner, attempt_id, ask) {
                    Some(container) => granted.push(container),
                    None => break,
                }
            }
        }
        if !granted.is_empty() {
            debug!(%attempt_id, count = granted.len(), "guaranteed containers granted");
        }
        Ok(granted)
    }

    fn unregister_attempt(
        &self,
        attempt_id: &ApplicationAttemptId,
        final_status: FinalApplicationStatus,
    ) -> SchedulerResult<()> {
        let mut inner = self.inner.write().expect("scheduler lock");
        let owned: Vec<ContainerId> = inner
            .granted
            .keys()
            .filter(|id| id.attempt_id == *attempt_id)
            .copied()
            .collect();
        for container_id in &owned {
            Self::release(&mut inner, container_id);
        }

        let info = inner
            .attempts
            .get_mut(attempt_id)
            .ok_or(SchedulerError::UnknownAttempt(*attempt_id))?;
        info.state = match final_status {
            FinalApplicationStatus::Failed => AttemptState::Failed,
            FinalApplicationStatus::Killed => AttemptState::Killed,
            _ => AttemptState::Finished,
        };
        Ok(())
    }

    fn num_cluster_nodes(&self) -> usize {
        let inner = self.inner.read().expect("scheduler lock");
        inner.nodes.len()
    }

    fn maximum_capability(&self) -> Resource {
        let inner = self.inner.read().expect("scheduler lock");
        inner
            .nodes
            .values()
            .fold(Resource::default(), |max, n| Resource {
                memory_mb: max.memory_mb.max(n.capability.memory_mb),
                vcores: max.vcores.max(n.capability.vcores),
            })
    }
}
