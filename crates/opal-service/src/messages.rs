//! Request and response types shared by both AM protocols.

use serde::{Deserialize, Serialize};

use opal_core::{ApplicationAttemptId, Container, ContainerId, RemoteNode, Resource, ResourceAsk};

use crate::scheduler::FinalApplicationStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub attempt_id: ApplicationAttemptId,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub rpc_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
}

impl RegisterRequest {
    pub fn new(attempt_id: ApplicationAttemptId) -> Self {
        Self {
            attempt_id,
            host: String::new(),
            rpc_port: 0,
            tracking_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub queue: String,
    pub maximum_capability: Resource,
}

/// Registration response for distributed-scheduling AMs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributedRegisterResponse {
    pub register_response: RegisterResponse,
    pub container_id_start: u64,
    pub min_container_resource: Resource,
    pub max_container_resource: Resource,
    pub incr_container_resource: Resource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateRequest {
    pub attempt_id: ApplicationAttemptId,
    #[serde(default)]
    pub asks: Vec<ResourceAsk>,
    #[serde(default)]
    pub releases: Vec<ContainerId>,
}

impl AllocateRequest {
    pub fn new(attempt_id: ApplicationAttemptId, asks: Vec<ResourceAsk>) -> Self {
        Self {
            attempt_id,
            asks,
            releases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateResponse {
    pub allocated_containers: Vec<Container>,
    pub num_cluster_nodes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributedAllocateRequest {
    pub allocate_request: AllocateRequest,
    /// Opportunistic containers the AM already placed itself.
    #[serde(default)]
    pub allocated_containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributedAllocateResponse {
    pub allocate_response: AllocateResponse,
    pub nodes_for_scheduling: Vec<RemoteNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRequest {
    pub attempt_id: ApplicationAttemptId,
    #[serde(default)]
    pub final_status: FinalApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl FinishRequest {
    pub fn new(attempt_id: ApplicationAttemptId, final_status: FinalApplicationStatus) -> Self {
        Self {
            attempt_id,
            final_status,
            diagnostics: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    pub is_unregistered: bool,
}
