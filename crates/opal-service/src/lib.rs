//! opal-service: the AM service.
//!
//! Sits between application masters and the central scheduler:
//! - **`service`**: `AmService`, the register / allocate / finish facade
//! - **`registry`**: live attempts, their contexts, the cluster node replica
//! - **`events`**: node event channel and the loop that applies it
//! - **`scheduler`**: the `ClusterScheduler` seam and an in-memory scheduler
//! - **`messages`**: request/response types shared by both protocols

pub mod error;
pub mod events;
pub mod messages;
pub mod registry;
pub mod scheduler;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use events::{NodeEvent, NodeEventReceiver, NodeEventSender, node_event_channel, run_node_events};
pub use messages::*;
pub use registry::{AttemptRegistry, FinishOutcome};
pub use scheduler::{
    AttemptInfo, AttemptState, ClusterScheduler, FinalApplicationStatus, InMemoryScheduler,
    SchedulerError, SchedulerResult,
};
pub use service::AmService;
