//! Opportunistic allocator: turns asks into containers.
//!
//! For every opportunistic ask the allocator:
//! 1. Normalizes the requested size against the attempt's sizing policy
//! 2. Ranks the attempt's cached nodes (least loaded first, see `ranking`)
//! 3. Spreads the requested containers across the top-ranked nodes
//!
//! An ask with no qualifying node is left unsatisfied for this call; the
//! AM asks again on its next heartbeat.

use std::sync::Arc;

use tracing::{debug, info};

use opal_core::{Container, ExecutionType, RemoteNode, ResourceAsk};

use crate::context::OpportunisticContainerContext;
use crate::ranking::{CandidateFilter, rank_nodes};
use crate::token::ContainerTokenIssuer;

/// Containers placed per hold of the node cache read guard.
const PLACEMENT_BATCH: u32 = 64;

/// Tunables for the allocator.
#[derive(Debug, Clone)]
pub struct AllocatorSettings {
    /// How many of the least-loaded nodes are used per ask.
    pub nodes_used: usize,
    /// Cap on containers handed out per allocate call.
    pub max_allocations_per_call: u32,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            nodes_used: 10,
            max_allocations_per_call: 1000,
        }
    }
}

/// Result of one allocate pass.
#[derive(Debug, Default)]
pub struct AllocationOutcome {
    pub containers: Vec<Container>,
    /// Requested containers that could not be placed this time.
    pub unsatisfied: u64,
}

pub struct OpportunisticAllocator {
    settings: AllocatorSettings,
    tokens: Arc<dyn ContainerTokenIssuer>,
}

impl OpportunisticAllocator {
    pub fn new(settings: AllocatorSettings, tokens: Arc<dyn ContainerTokenIssuer>) -> Self {
        Self { settings, tokens }
    }

    /// Place every opportunistic ask in `asks`. Guaranteed asks are skipped.
    pub fn allocate(
        &self,
        ctx: &OpportunisticContainerContext,
        asks: &[ResourceAsk],
    ) -> AllocationOutcome {
        let mut budget = self.settings.max_allocations_per_call;
        let mut outcome = AllocationOutcome::default();

        for ask in asks.iter().filter(|a| a.is_opportunistic()) {
            let wanted = ask.num_containers.min(budget);
            outcome.unsatisfied += u64::from(ask.num_containers - wanted);
            if wanted == 0 {
                continue;
            }

            let placed = self.place_ask(ctx, ask, wanted, &mut outcome.containers);
            budget -= placed;
            outcome.unsatisfied += u64::from(wanted - placed);

            if placed < wanted {
                debug!(
                    attempt_id = %ctx.attempt_id(),
                    priority = ask.priority,
                    resource_name = %ask.resource_name,
                    wanted,
                    placed,
                    "opportunistic ask not fully satisfied"
                );
            }
        }

        if !outcome.containers.is_empty() || outcome.unsatisfied > 0 {
            info!(
                attempt_id = %ctx.attempt_id(),
                allocated = outcome.containers.len(),
                unsatisfied = outcome.unsatisfied,
                cached_nodes = ctx.nodes().len(),
                "opportunistic allocation"
            );
        }

        outcome
    }

    fn place_ask(
        &self,
        ctx: &OpportunisticContainerContext,
        ask: &ResourceAsk,
        wanted: u32,
        out: &mut Vec<Container>,
    ) -> u32 {
        let resource = ctx.sizing().normalize(ask.capability);
        let filter = CandidateFilter::for_ask(ask, resource);
        let rotation = ctx.cursor().advance();

        let mut placed = 0;
        while placed < wanted {
            let batch_end = wanted.min(placed.saturating_add(PLACEMENT_BATCH));

            // Node removals wait on this guard, so every chosen node is
            // still cached when its container is created. The guard is
            // dropped between batches.
            let nodes = ctx.nodes().read();
            let ranked = rank_nodes(&nodes, &filter, rotation, self.settings.nodes_used);
            if ranked.is_empty() {
                break;
            }

            while placed < batch_end {
                let node = ranked[placed as usize % ranked.len()];
                let Some(id) = ctx.next_container_id() else {
                    return placed;
                };
                let token = self
                    .tokens
                    .issue(&id, &node.node_id, &resource, ExecutionType::Opportunistic);
                debug!(container_id = %id, node = %node.node_id, %resource, "placed opportunistic container");
                out.push(Container {
                    id,
                    node_id: node.node_id.clone(),
                    node_http_address: node.http_address.clone(),
                    resource,
                    priority: ask.priority,
                    execution_type: ExecutionType::Opportunistic,
                    token,
                });
                placed += 1;
            }
        }
        placed
    }

    /// Least-loaded cached nodes, offered to distributed-scheduling AMs.
    pub fn nodes_for_scheduling(&self, ctx: &OpportunisticContainerContext) -> Vec<RemoteNode> {
        let nodes = ctx.nodes().read();
        rank_nodes(
            &nodes,
            &CandidateFilter::any(),
            ctx.cursor().advance(),
            self.settings.nodes_used,
        )
        .into_iter()
        .map(RemoteNode::from)
        .collect()
    }
}
