//! Candidate filtering and least-loaded ordering.
//!
//! Nodes are ordered by:
//! - **Queue wait time** (ascending): the node's estimate of how long a
//!   newly queued opportunistic container waits before starting
//! - **Queue length** (ascending): containers already queued
//! - **Rotation**: ties on both are rotated by the attempt's cursor
//!
//! Unknown or negative estimates count as least loaded, so a freshly
//! added node that has not reported load yet is tried first.

use std::collections::HashMap;

use opal_core::{NodeId, NodeRecord, Resource, ResourceAsk};

/// Which nodes may receive a container.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter<'a> {
    /// Requested host; `None` matches every host.
    pub host: Option<&'a str>,
    /// Fall back to any host when the requested one is not cached.
    pub relax_locality: bool,
    /// Required node partition; `None` matches every partition.
    pub partition: Option<&'a str>,
    /// Node capability must fit this resource.
    pub min_capability: Option<Resource>,
}

impl<'a> CandidateFilter<'a> {
    /// Every cached node qualifies.
    pub fn any() -> Self {
        Self {
            relax_locality: true,
            ..Self::default()
        }
    }

    /// Filter for an ask whose container size is already normalized.
    ///
    /// An ask without a label expression only matches the default
    /// partition.
    pub fn for_ask(ask: &'a ResourceAsk, container: Resource) -> Self {
        Self {
            host: (!ask.is_any()).then_some(ask.resource_name.as_str()),
            relax_locality: ask.relax_locality,
            partition: Some(ask.node_label_expression.as_deref().unwrap_or("")),
            min_capability: Some(container),
        }
    }

    fn admits(&self, node: &NodeRecord, host: Option<&str>) -> bool {
        if let Some(host) = host {
            if node.node_id.host != host {
                return false;
            }
        }
        if let Some(partition) = self.partition {
            if node.partition != partition {
                return false;
            }
        }
        if let Some(min) = self.min_capability {
            if !min.fits_in(&node.capability) {
                return false;
            }
        }
        true
    }
}

/// Sort key: unknown or negative estimates collapse to -1 so they sort
/// before every reported load.
fn load_key(node: &NodeRecord) -> (i64, i64) {
    let wait = node.queue_wait_time_ms.max(-1);
    let queue = i64::from(node.queue_length).max(-1);
    (wait, queue)
}

/// Filter and order candidate nodes, best first, keeping at most `limit`.
///
/// `rotation` rotates each run of equally loaded nodes; callers pass the
/// attempt cursor's next value.
pub fn rank_nodes<'n>(
    nodes: &'n HashMap<NodeId, NodeRecord>,
    filter: &CandidateFilter<'_>,
    rotation: usize,
    limit: usize,
) -> Vec<&'n NodeRecord> {
    let mut candidates: Vec<&NodeRecord> = nodes
        .values()
        .filter(|n| filter.admits(n, filter.host))
        .collect();

    if candidates.is_empty() && filter.host.is_some() && filter.relax_locality {
        candidates = nodes.values().filter(|n| filter.admits(n, None)).collect();
    }

    // Node id as the last key makes the order independent of map iteration.
    candidates.sort_by(|a, b| {
        load_key(a)
            .cmp(&load_key(b))
            .then_with(|| a.node_id.cmp(&b.node_id))
    });

    let mut start = 0;
    while start < candidates.len() {
        let key = load_key(candidates[start]);
        let end = candidates[start..]
            .iter()
            .position(|n| load_key(n) != key)
            .map_or(candidates.len(), |offset| start + offset);
        let run = &mut candidates[start..end];
        let len = run.len();
        run.rotate_left(rotation % len);
        start = end;
    }

    candidates.truncate(limit);
    candidates
}
