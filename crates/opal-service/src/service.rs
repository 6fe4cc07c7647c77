//! AM service facade: register / allocate / finish.
//!
//! Both AM protocols end up here. The facade:
//! - Validates the caller against the central scheduler's attempt state
//! - Creates and releases per-attempt opportunistic contexts
//! - Splits each allocate call into guaranteed asks (sent to the
//!   scheduler unchanged) and opportunistic asks (placed locally)
//! - Applies node events to every live attempt's node cache

use std::sync::Arc;

use tracing::{debug, info, warn};

use opal_allocator::{
    AllocatorSettings, ContainerTokenIssuer, OpportunisticAllocator, OpportunisticContainerContext,
};
use opal_core::{ApplicationAttemptId, Container, ExecutionType, OpalConfig, ResourceAsk};

use crate::error::{ServiceError, ServiceResult};
use crate::events::NodeEvent;
use crate::messages::{
    AllocateRequest, AllocateResponse, DistributedAllocateRequest, DistributedAllocateResponse,
    DistributedRegisterResponse, FinishRequest, FinishResponse, RegisterRequest, RegisterResponse,
};
use crate::registry::{AttemptRegistry, FinishOutcome};
use crate::scheduler::ClusterScheduler;

/// Default bound on `numContainers` for a single ask.
pub const DEFAULT_MAX_CONTAINERS_PER_ASK: u32 = 10_000;

pub struct AmService {
    scheduler: Arc<dyn ClusterScheduler>,
    allocator: OpportunisticAllocator,
    registry: AttemptRegistry,
    max_containers_per_ask: u32,
}

impl AmService {
    pub fn new(
        scheduler: Arc<dyn ClusterScheduler>,
        allocator: OpportunisticAllocator,
        registry: AttemptRegistry,
    ) -> Self {
        Self {
            scheduler,
            allocator,
            registry,
            max_containers_per_ask: DEFAULT_MAX_CONTAINERS_PER_ASK,
        }
    }

    /// Reject asks for more than `limit` containers.
    pub fn with_max_containers_per_ask(mut self, limit: u32) -> Self {
        self.max_containers_per_ask = limit;
        self
    }

    /// Build a service from the daemon configuration.
    pub fn from_config(
        config: &OpalConfig,
        scheduler: Arc<dyn ClusterScheduler>,
        tokens: Arc<dyn ContainerTokenIssuer>,
    ) -> Self {
        let settings = AllocatorSettings {
            nodes_used: config.allocation.nodes_used,
            max_allocations_per_call: config.allocation.max_allocations_per_call,
        };
        let registry = AttemptRegistry::new(config.sizing(), config.allocation.epoch)
            .with_finished_retention(config.allocation.finished_attempt_retention);
        Self::new(scheduler, OpportunisticAllocator::new(settings, tokens), registry)
            .with_max_containers_per_ask(config.allocation.max_containers_per_ask)
    }

    pub fn registry(&self) -> &AttemptRegistry {
        &self.registry
    }

    /// Context of a registered attempt, if any.
    pub fn context(&self, attempt_id: &ApplicationAttemptId) -> Option<Arc<OpportunisticContainerContext>> {
        self.registry.get(attempt_id).ok()
    }

    /// Apply a node event from the central scheduler.
    pub fn handle(&self, event: NodeEvent) {
        self.registry.apply(&event);
    }

    // ── Register ────────────────────────────────────────────────────

    pub fn register_application_master(&self, request: &RegisterRequest) -> ServiceResult<RegisterResponse> {
        self.register(request).map(|(response, _)| response)
    }

    pub fn register_for_distributed_scheduling(
        &self,
        request: &RegisterRequest,
    ) -> ServiceResult<DistributedRegisterResponse> {
        let (register_response, ctx) = self.register(request)?;
        let sizing = ctx.sizing();
        Ok(DistributedRegisterResponse {
            register_response,
            container_id_start: ctx.container_id_start(),
            min_container_resource: sizing.min,
            max_container_resource: sizing.max,
            incr_container_resource: sizing.incr,
        })
    }

    fn register(
        &self,
        request: &RegisterRequest,
    ) -> ServiceResult<(RegisterResponse, Arc<OpportunisticContainerContext>)> {
        let attempt_id = request.attempt_id;
        let info = self
            .scheduler
            .attempt(&attempt_id)
            .ok_or(ServiceError::UnknownAttempt(attempt_id))?;
        if !info.state.is_live() {
            return Err(ServiceError::AttemptNotLive {
                attempt_id,
                state: info.state,
            });
        }

        let ctx = self.registry.register(attempt_id)?;
        if let Err(e) = self.scheduler.register_attempt(&attempt_id) {
            self.registry.discard(&attempt_id);
            return Err(e.into());
        }

        info!(%attempt_id, queue = %info.queue, host = %request.host, "application master registered");
        Ok((
            RegisterResponse {
                queue: info.queue,
                maximum_capability: self.scheduler.maximum_capability(),
            },
            ctx,
        ))
    }

    // ── Allocate ────────────────────────────────────────────────────

    pub fn allocate(&self, request: &AllocateRequest) -> ServiceResult<AllocateResponse> {
        let ctx = self.registry.get(&request.attempt_id)?;
        self.allocate_with(&ctx, request)
    }

    pub fn allocate_for_distributed_scheduling(
        &self,
        request: &DistributedAllocateRequest,
    ) -> ServiceResult<DistributedAllocateResponse> {
        let attempt_id = request.allocate_request.attempt_id;
        let ctx = self.registry.get(&attempt_id)?;

        validate_self_placed(&attempt_id, &request.allocated_containers)?;
        let recorded = ctx.record_self_placed(&request.allocated_containers);
        if recorded > 0 {
            debug!(%attempt_id, recorded, "recorded AM-placed opportunistic containers");
        }

        let allocate_response = self.allocate_with(&ctx, &request.allocate_request)?;
        let nodes_for_scheduling = self.allocator.nodes_for_scheduling(&ctx);

        Ok(DistributedAllocateResponse {
            allocate_response,
            nodes_for_scheduling,
        })
    }

    fn allocate_with(
        &self,
        ctx: &OpportunisticContainerContext,
        request: &AllocateRequest,
    ) -> ServiceResult<AllocateResponse> {
        let attempt_id = request.attempt_id;
        validate_asks(&request.asks, self.max_containers_per_ask)?;

        let (opportunistic, guaranteed): (Vec<ResourceAsk>, Vec<ResourceAsk>) =
            request.asks.iter().cloned().partition(|a| a.is_opportunistic());

        let mut allocated = self
            .scheduler
            .allocate(&attempt_id, &guaranteed, &request.releases)?;
        let outcome = self.allocator.allocate(ctx, &opportunistic);
        allocated.extend(outcome.containers);

        debug!(
            %attempt_id,
            guaranteed_asks = guaranteed.len(),
            opportunistic_asks = opportunistic.len(),
            allocated = allocated.len(),
            "allocate handled"
        );

        Ok(AllocateResponse {
            allocated_containers: allocated,
            num_cluster_nodes: self.scheduler.num_cluster_nodes(),
        })
    }

    // ── Finish ──────────────────────────────────────────────────────

    pub fn finish_application_master(&self, request: &FinishRequest) -> ServiceResult<FinishResponse> {
        let attempt_id = request.attempt_id;

        if self.registry.is_registered(&attempt_id) {
            self.scheduler
                .unregister_attempt(&attempt_id, request.final_status)?;
        }

        match self.registry.finish(&attempt_id) {
            FinishOutcome::Unregistered => {
                info!(%attempt_id, final_status = ?request.final_status, "application master unregistered");
                Ok(FinishResponse { is_unregistered: true })
            }
            FinishOutcome::AlreadyUnregistered => {
                debug!(%attempt_id, "application master already unregistered");
                Ok(FinishResponse { is_unregistered: true })
            }
            FinishOutcome::NotRegistered => {
                if self.scheduler.attempt(&attempt_id).is_none() {
                    Err(ServiceError::UnknownAttempt(attempt_id))
                } else {
                    warn!(%attempt_id, "finish from unregistered application master");
                    Err(ServiceError::NotRegistered(attempt_id))
                }
            }
        }
    }
}

fn validate_asks(asks: &[ResourceAsk], max_containers_per_ask: u32) -> ServiceResult<()> {
    for ask in asks {
        if ask.resource_name.is_empty() {
            return Err(ServiceError::InvalidRequest("ask has an empty resource name".to_string()));
        }
        if ask.priority < 0 {
            return Err(ServiceError::InvalidRequest(format!(
                "ask priority must be non-negative, got {}",
                ask.priority
            )));
        }
        if ask.num_containers > 0 && ask.capability.is_zero() {
            return Err(ServiceError::InvalidRequest(format!(
                "ask at priority {} requests a zero-sized container",
                ask.priority
            )));
        }
        if ask.num_containers > max_containers_per_ask {
            return Err(ServiceError::InvalidRequest(format!(
                "ask at priority {} requests {} containers, limit is {max_containers_per_ask}",
                ask.priority, ask.num_containers
            )));
        }
    }
    Ok(())
}

fn validate_self_placed(attempt_id: &ApplicationAttemptId, containers: &[Container]) -> ServiceResult<()> {
    for container in containers {
        if container.execution_type != ExecutionType::Opportunistic {
            return Err(ServiceError::InvalidRequest(format!(
                "AM-placed container {} must be OPPORTUNISTIC, got {}",
                container.id, container.execution_type
            )));
        }
        if container.id.attempt_id != *attempt_id {
            return Err(ServiceError::InvalidRequest(format!(
                "AM-placed container {} does not belong to {attempt_id}",
                container.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use crate::events::{node_event_channel, run_node_events};
    use crate::scheduler::{AttemptState, FinalApplicationStatus, InMemoryScheduler, SchedulerError};
    use opal_allocator::DigestTokenIssuer;
    use opal_core::{ContainerId, ContainerSizing, ContainerToken, NodeId, NodeRecord, Resource};
    use tokio::sync::watch;

    const GB: u64 = 1024;

    fn attempt(n: u32) -> ApplicationAttemptId {
        ApplicationAttemptId::new(12345, n, 1)
    }

    fn node(host: &str) -> NodeRecord {
        NodeRecord::new(NodeId::new(host, 1234), format!("{host}:8042"), Resource::new(4 * GB, 8))
    }

    fn tokens() -> Arc<dyn ContainerTokenIssuer> {
        Arc::new(DigestTokenIssuer::new("test"))
    }

    fn setup() -> (Arc<InMemoryScheduler>, AmService) {
        let scheduler = Arc::new(InMemoryScheduler::new(tokens()));
        let service = AmService::from_config(&OpalConfig::default(), scheduler.clone(), tokens());
        (scheduler, service)
    }

    fn opp_ask(count: u32) -> ResourceAsk {
        ResourceAsk::new(1, "*", Resource::new(GB, 2), count).opportunistic(true)
    }

    fn cache_size(service: &AmService, id: ApplicationAttemptId) -> usize {
        service.context(&id).map(|ctx| ctx.nodes().len()).unwrap_or(0)
    }

    async fn registered(scheduler: &InMemoryScheduler, service: &AmService, id: ApplicationAttemptId) {
        scheduler.submit_attempt(id, "default");
        service
            .register_application_master(&RegisterRequest::new(id))
            .unwrap();
    }

    #[tokio::test]
    async fn node_removal_during_allocate_converges() {
        let (scheduler, service) = setup();
        scheduler.add_node(node("h1")).await;
        scheduler.add_node(node("h2")).await;
        registered(&scheduler, &service, attempt(1)).await;

        service.handle(NodeEvent::Added(node("h1")));
        service.handle(NodeEvent::Added(node("h2")));
        service.handle(NodeEvent::Updated(node("h1").with_load(-1, 100)));
        service.handle(NodeEvent::Updated(node("h2").with_load(-1, 100)));

        let ask = ResourceAsk::new(1, "*", Resource::new(GB, 1), 2);
        for _ in 0..10 {
            service
                .allocate(&AllocateRequest::new(attempt(1), vec![ask.clone()]))
                .unwrap();
            if cache_size(&service, attempt(1)) == 2 {
                break;
            }
        }
        assert_eq!(cache_size(&service, attempt(1)), 2);

        // Removed from the scheduler, event not yet delivered.
        scheduler.remove_node(&NodeId::new("h1", 1234)).await;
        for _ in 0..3 {
            service
                .allocate(&AllocateRequest::new(attempt(1), vec![opp_ask(2)]))
                .expect("allocate must survive undelivered node removal");
        }

        service.handle(NodeEvent::Removed(NodeId::new("h1", 1234)));
        for _ in 0..10 {
            let resp = service
                .allocate(&AllocateRequest::new(attempt(1), vec![opp_ask(2)]))
                .unwrap();
            assert!(resp.allocated_containers.iter().all(|c| c.node_id.host != "h1"));
            if cache_size(&service, attempt(1)) == 1 {
                break;
            }
        }
        assert_eq!(cache_size(&service, attempt(1)), 1);
    }

    #[tokio::test]
    async fn opportunistic_ask_lands_on_only_node() {
        let (scheduler, service) = setup();
        registered(&scheduler, &service, attempt(1)).await;
        service.handle(NodeEvent::Added(node("h1")));

        let resp = service
            .allocate(&AllocateRequest::new(attempt(1), vec![opp_ask(1)]))
            .unwrap();

        assert_eq!(resp.allocated_containers.len(), 1);
        let c = &resp.allocated_containers[0];
        assert_eq!(c.node_id.host, "h1");
        assert_eq!(c.execution_type, ExecutionType::Opportunistic);
    }

    #[tokio::test]
    async fn guaranteed_and_opportunistic_results_are_merged() {
        let (scheduler, service) = setup();
        scheduler.add_node(node("h1")).await;
        registered(&scheduler, &service, attempt(1)).await;

        let guaranteed = ResourceAsk::new(1, "*", Resource::new(GB, 1), 1);
        let resp = service
            .allocate(&AllocateRequest::new(attempt(1), vec![guaranteed, opp_ask(1)]))
            .unwrap();

        let types: HashSet<ExecutionType> =
            resp.allocated_containers.iter().map(|c| c.execution_type).collect();
        assert_eq!(resp.allocated_containers.len(), 2);
        assert!(types.contains(&ExecutionType::Guaranteed));
        assert!(types.contains(&ExecutionType::Opportunistic));
        assert_eq!(resp.num_cluster_nodes, 1);
    }

    #[tokio::test]
    async fn cluster_node_count_comes_from_scheduler() {
        let (scheduler, service) = setup();
        scheduler.add_node(node("h1")).await;
        scheduler.add_node(node("h2")).await;
        registered(&scheduler, &service, attempt(1)).await;

        // The service has seen no events, so its cache is empty.
        let resp = service
            .allocate(&AllocateRequest::new(attempt(1), vec![opp_ask(1)]))
            .unwrap();
        assert_eq!(resp.num_cluster_nodes, 2);
        assert!(resp.allocated_containers.is_empty());
    }

    #[test]
    fn register_rejects_unknown_attempt() {
        let (_, service) = setup();
        let err = service
            .register_application_master(&RegisterRequest::new(attempt(9)))
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownAttempt(_)));
    }

    #[test]
    fn register_rejects_dead_attempt() {
        let (scheduler, service) = setup();
        scheduler.submit_attempt(attempt(1), "default");
        scheduler.set_attempt_state(&attempt(1), AttemptState::Killed);

        let err = service
            .register_application_master(&RegisterRequest::new(attempt(1)))
            .unwrap_err();
        assert!(matches!(err, ServiceError::AttemptNotLive { .. }));
    }

    #[tokio::test]
    async fn distributed_register_reports_sizing_policy() {
        let (scheduler, service) = setup();
        scheduler.submit_attempt(attempt(1), "research");

        let resp = service
            .register_for_distributed_scheduling(&RegisterRequest::new(attempt(1)))
            .unwrap();

        let sizing = ContainerSizing::default();
        let ctx = service.context(&attempt(1)).unwrap();
        assert_eq!(resp.register_response.queue, "research");
        assert_eq!(resp.container_id_start, ctx.container_id_start());
        assert_eq!(resp.min_container_resource, sizing.min);
        assert_eq!(resp.max_container_resource, sizing.max);
        assert_eq!(resp.incr_container_resource, sizing.incr);
    }

    #[tokio::test]
    async fn distributed_allocate_offers_cached_nodes() {
        let (scheduler, service) = setup();
        scheduler.add_node(node("h1")).await;
        scheduler.submit_attempt(attempt(1), "default");
        service
            .register_for_distributed_scheduling(&RegisterRequest::new(attempt(1)))
            .unwrap();
        service.handle(NodeEvent::Added(node("h1")));
        service.handle(NodeEvent::Added(node("h2")));

        let asks = vec![
            ResourceAsk::new(1, "*", Resource::new(GB, 1), 1),
            ResourceAsk::new(2, "*", Resource::new(GB, 1), 1),
        ];
        let resp = service
            .allocate_for_distributed_scheduling(&DistributedAllocateRequest {
                allocate_request: AllocateRequest::new(attempt(1), asks),
                allocated_containers: vec![],
            })
            .unwrap();

        let cached: HashSet<String> = service
            .context(&attempt(1))
            .unwrap()
            .nodes()
            .snapshot()
            .into_iter()
            .map(|n| n.node_id.host)
            .collect();
        assert!(!resp.nodes_for_scheduling.is_empty());
        assert!(resp
            .nodes_for_scheduling
            .iter()
            .all(|n| cached.contains(&n.node_id.host)));
        assert_eq!(resp.allocate_response.allocated_containers.len(), 2);
    }

    #[tokio::test]
    async fn distributed_allocate_records_self_placed_containers() {
        let (scheduler, service) = setup();
        registered(&scheduler, &service, attempt(1)).await;

        let placed = Container {
            id: ContainerId::new(attempt(1), 3),
            node_id: NodeId::new("h1", 1234),
            node_http_address: "h1:8042".to_string(),
            resource: Resource::new(GB, 1),
            priority: 1,
            execution_type: ExecutionType::Opportunistic,
            token: ContainerToken("t".to_string()),
        };
        let mut request = DistributedAllocateRequest {
            allocate_request: AllocateRequest::new(attempt(1), vec![]),
            allocated_containers: vec![placed.clone()],
        };
        service.allocate_for_distributed_scheduling(&request).unwrap();
        assert_eq!(service.context(&attempt(1)).unwrap().self_placed_count(), 1);

        request.allocated_containers[0].execution_type = ExecutionType::Guaranteed;
        let err = service
            .allocate_for_distributed_scheduling(&request)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn allocate_requires_registration() {
        let (scheduler, service) = setup();
        scheduler.submit_attempt(attempt(1), "default");

        let err = service
            .allocate(&AllocateRequest::new(attempt(1), vec![opp_ask(1)]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotRegistered(_)));
    }

    #[tokio::test]
    async fn malformed_ask_is_rejected() {
        let (scheduler, service) = setup();
        registered(&scheduler, &service, attempt(1)).await;

        let zero = ResourceAsk::new(1, "*", Resource::new(0, 0), 1);
        let err = service
            .allocate(&AllocateRequest::new(attempt(1), vec![zero]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn oversized_ask_is_rejected() {
        let (scheduler, service) = setup();
        registered(&scheduler, &service, attempt(1)).await;
        service.handle(NodeEvent::Added(node("h1")));

        for count in [DEFAULT_MAX_CONTAINERS_PER_ASK + 1, u32::MAX] {
            let err = service
                .allocate(&AllocateRequest::new(attempt(1), vec![opp_ask(count), opp_ask(count)]))
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidRequest(_)));
        }
        assert_eq!(service.context(&attempt(1)).unwrap().issued_count(), 0);

        let resp = service
            .allocate(&AllocateRequest::new(attempt(1), vec![opp_ask(DEFAULT_MAX_CONTAINERS_PER_ASK)]))
            .unwrap();
        assert_eq!(resp.allocated_containers.len(), 1000);
    }

    #[tokio::test]
    async fn finish_is_idempotent() {
        let (scheduler, service) = setup();
        registered(&scheduler, &service, attempt(1)).await;

        let req = FinishRequest::new(attempt(1), FinalApplicationStatus::Succeeded);
        assert!(service.finish_application_master(&req).unwrap().is_unregistered);
        assert!(service.finish_application_master(&req).unwrap().is_unregistered);
        assert!(service.context(&attempt(1)).is_none());
        assert_eq!(
            scheduler.attempt(&attempt(1)).unwrap().state,
            AttemptState::Finished
        );
    }

    #[test]
    fn finish_without_registration_fails() {
        let (scheduler, service) = setup();
        scheduler.submit_attempt(attempt(1), "default");

        let req = FinishRequest::new(attempt(1), FinalApplicationStatus::Succeeded);
        assert!(matches!(
            service.finish_application_master(&req),
            Err(ServiceError::NotRegistered(_))
        ));
        let req = FinishRequest::new(attempt(2), FinalApplicationStatus::Succeeded);
        assert!(matches!(
            service.finish_application_master(&req),
            Err(ServiceError::UnknownAttempt(_))
        ));
    }

    #[tokio::test]
    async fn container_ids_do_not_collide_across_attempts() {
        let (scheduler, service) = setup();
        registered(&scheduler, &service, attempt(1)).await;
        registered(&scheduler, &service, attempt(2)).await;
        service.handle(NodeEvent::Added(node("h1")));

        let mut ids = HashSet::new();
        for id in [attempt(1), attempt(2)] {
            let resp = service
                .allocate(&AllocateRequest::new(id, vec![opp_ask(5)]))
                .unwrap();
            for c in resp.allocated_containers {
                assert!(ids.insert(c.id.id));
            }
        }
        assert_eq!(ids.len(), 10);
    }

    struct FailingScheduler;

    impl ClusterScheduler for FailingScheduler {
        fn attempt(&self, _: &ApplicationAttemptId) -> Option<crate::scheduler::AttemptInfo> {
            Some(crate::scheduler::AttemptInfo {
                queue: "default".to_string(),
                state: AttemptState::Running,
            })
        }
        fn register_attempt(&self, _: &ApplicationAttemptId) -> crate::scheduler::SchedulerResult<()> {
            Ok(())
        }
        fn allocate(
            &self,
            _: &ApplicationAttemptId,
            _: &[ResourceAsk],
            _: &[ContainerId],
        ) -> crate::scheduler::SchedulerResult<Vec<Container>> {
            Err(SchedulerError::Unavailable("queue full".to_string()))
        }
        fn unregister_attempt(
            &self,
            _: &ApplicationAttemptId,
            _: FinalApplicationStatus,
        ) -> crate::scheduler::SchedulerResult<()> {
            Ok(())
        }
        fn num_cluster_nodes(&self) -> usize {
            0
        }
        fn maximum_capability(&self) -> Resource {
            Resource::default()
        }
    }

    #[test]
    fn scheduler_errors_propagate_unchanged() {
        let service = AmService::from_config(&OpalConfig::default(), Arc::new(FailingScheduler), tokens());
        service
            .register_application_master(&RegisterRequest::new(attempt(1)))
            .unwrap();

        let err = service
            .allocate(&AllocateRequest::new(attempt(1), vec![]))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Scheduler(SchedulerError::Unavailable(_))));
        assert_eq!(err.to_string(), "scheduler unavailable: queue full");
    }

    #[tokio::test]
    async fn event_loop_applies_scheduler_events() {
        let (tx, rx) = node_event_channel(16);
        let scheduler = Arc::new(InMemoryScheduler::new(tokens()).with_events(tx));
        let service = Arc::new(AmService::from_config(
            &OpalConfig::default(),
            scheduler.clone(),
            tokens(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_node_events(service.clone(), rx, shutdown_rx));

        registered(&scheduler, &service, attempt(1)).await;
        scheduler.add_node(node("h1")).await;
        scheduler.add_node(node("h2")).await;
        scheduler.remove_node(&NodeId::new("h1", 1234)).await;

        for _ in 0..100 {
            if service.registry().events_applied() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(service.registry().events_applied(), 3);
        assert_eq!(cache_size(&service, attempt(1)), 1);

        let _ = shutdown_tx.send(true);
        handle.await.unwrap();
    }
}
