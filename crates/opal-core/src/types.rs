//! Domain types shared by the allocator, the service facade and the
//! RPC layer.
//!
//! Field names serialize in camelCase so JSON payloads read the same
//! as the protocol documentation (`containerIdStart`, `httpAddress`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource name that matches any node.
pub const ANY: &str = "*";

// ── Identifiers ───────────────────────────────────────────────────

/// A node manager endpoint, identified by host and RPC port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub host: String,
    pub port: u16,
}

impl NodeId {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Identifies one attempt of one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationAttemptId {
    /// Start time of the resource manager that issued the application id.
    pub cluster_timestamp: u64,
    pub app_id: u32,
    pub attempt: u32,
}

impl ApplicationAttemptId {
    pub fn new(cluster_timestamp: u64, app_id: u32, attempt: u32) -> Self {
        Self {
            cluster_timestamp,
            app_id,
            attempt,
        }
    }
}

impl fmt::Display for ApplicationAttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "appattempt_{}_{:04}_{:06}",
            self.cluster_timestamp, self.app_id, self.attempt
        )
    }
}

/// Identifies a container. Unique within the owning attempt's id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerId {
    pub attempt_id: ApplicationAttemptId,
    pub id: u64,
}

impl ContainerId {
    pub fn new(attempt_id: ApplicationAttemptId, id: u64) -> Self {
        Self { attempt_id, id }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "container_{}_{:04}_{:02}_{:06}",
            self.attempt_id.cluster_timestamp,
            self.attempt_id.app_id,
            self.attempt_id.attempt,
            self.id
        )
    }
}

// ── Resources ─────────────────────────────────────────────────────

/// A two-dimensional resource size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub memory_mb: u64,
    pub vcores: u32,
}

impl Resource {
    pub const fn new(memory_mb: u64, vcores: u32) -> Self {
        Self { memory_mb, vcores }
    }

    /// True if `self` fits inside `other` in every dimension.
    pub fn fits_in(&self, other: &Resource) -> bool {
        self.memory_mb <= other.memory_mb && self.vcores <= other.vcores
    }

    pub fn is_zero(&self) -> bool {
        self.memory_mb == 0 && self.vcores == 0
    }

    pub fn saturating_sub(&self, other: &Resource) -> Resource {
        Resource {
            memory_mb: self.memory_mb.saturating_sub(other.memory_mb),
            vcores: self.vcores.saturating_sub(other.vcores),
        }
    }

    pub fn saturating_add(&self, other: &Resource) -> Resource {
        Resource {
            memory_mb: self.memory_mb.saturating_add(other.memory_mb),
            vcores: self.vcores.saturating_add(other.vcores),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<memory:{}, vCores:{}>", self.memory_mb, self.vcores)
    }
}

// ── Asks ──────────────────────────────────────────────────────────

/// Execution guarantee of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    #[default]
    Guaranteed,
    Opportunistic,
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionType::Guaranteed => f.write_str("GUARANTEED"),
            ExecutionType::Opportunistic => f.write_str("OPPORTUNISTIC"),
        }
    }
}

/// Requested execution type for an ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTypeRequest {
    pub execution_type: ExecutionType,
    /// When set, the AM only accepts containers of exactly this type.
    #[serde(default)]
    pub enforce_execution_type: bool,
}

impl ExecutionTypeRequest {
    pub fn new(execution_type: ExecutionType, enforce_execution_type: bool) -> Self {
        Self {
            execution_type,
            enforce_execution_type,
        }
    }
}

/// A request for `num_containers` containers of one size at one priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAsk {
    pub priority: i32,
    /// `*` for any node, otherwise a host name.
    pub resource_name: String,
    pub capability: Resource,
    pub num_containers: u32,
    #[serde(default = "default_relax_locality")]
    pub relax_locality: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_label_expression: Option<String>,
    #[serde(default)]
    pub execution_type_request: ExecutionTypeRequest,
}

fn default_relax_locality() -> bool {
    true
}

impl ResourceAsk {
    /// A guaranteed ask with relaxed locality and no label.
    pub fn new(
        priority: i32,
        resource_name: impl Into<String>,
        capability: Resource,
        num_containers: u32,
    ) -> Self {
        Self {
            priority,
            resource_name: resource_name.into(),
            capability,
            num_containers,
            relax_locality: true,
            node_label_expression: None,
            execution_type_request: ExecutionTypeRequest::default(),
        }
    }

    /// Switch this ask to the opportunistic execution type.
    pub fn opportunistic(mut self, enforce: bool) -> Self {
        self.execution_type_request = ExecutionTypeRequest::new(ExecutionType::Opportunistic, enforce);
        self
    }

    pub fn with_relax_locality(mut self, relax: bool) -> Self {
        self.relax_locality = relax;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.node_label_expression = Some(label.into());
        self
    }

    pub fn is_opportunistic(&self) -> bool {
        self.execution_type_request.execution_type == ExecutionType::Opportunistic
    }

    /// True if the ask targets any node rather than a specific host.
    pub fn is_any(&self) -> bool {
        self.resource_name == ANY
    }
}

// ── Containers ────────────────────────────────────────────────────

/// Opaque launch token handed to the node manager with a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerToken(pub String);

/// A granted container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: ContainerId,
    pub node_id: NodeId,
    pub node_http_address: String,
    pub resource: Resource,
    pub priority: i32,
    pub execution_type: ExecutionType,
    pub token: ContainerToken,
}

// ── Nodes ─────────────────────────────────────────────────────────

/// A node as seen by the opportunistic allocator.
///
/// Load estimates come from node heartbeats; negative values mean the
/// node has not reported them yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub http_address: String,
    pub capability: Resource,
    #[serde(default = "unknown_load")]
    pub queue_length: i32,
    #[serde(default = "unknown_wait")]
    pub queue_wait_time_ms: i64,
    /// Node partition; empty for the default partition.
    #[serde(default)]
    pub partition: String,
}

fn unknown_load() -> i32 {
    -1
}

fn unknown_wait() -> i64 {
    -1
}

impl NodeRecord {
    /// A record in the default partition with unknown load.
    pub fn new(node_id: NodeId, http_address: impl Into<String>, capability: Resource) -> Self {
        Self {
            node_id,
            http_address: http_address.into(),
            capability,
            queue_length: -1,
            queue_wait_time_ms: -1,
            partition: String::new(),
        }
    }

    pub fn with_load(mut self, queue_wait_time_ms: i64, queue_length: i32) -> Self {
        self.queue_wait_time_ms = queue_wait_time_ms;
        self.queue_length = queue_length;
        self
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Copy every refreshable field from a newer report of the same node.
    pub fn refresh_from(&mut self, newer: &NodeRecord) {
        self.http_address.clone_from(&newer.http_address);
        self.capability = newer.capability;
        self.queue_length = newer.queue_length;
        self.queue_wait_time_ms = newer.queue_wait_time_ms;
        self.partition.clone_from(&newer.partition);
    }
}

/// A node offered to a distributed-scheduling AM for self-placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNode {
    pub node_id: NodeId,
    pub http_address: String,
}

impl From<&NodeRecord> for RemoteNode {
    fn from(node: &NodeRecord) -> Self {
        Self {
            node_id: node.node_id.clone(),
            http_address: node.http_address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt() -> ApplicationAttemptId {
        ApplicationAttemptId::new(12345, 1, 2)
    }

    #[test]
    fn ids_display_like_cluster_names() {
        assert_eq!(attempt().to_string(), "appattempt_12345_0001_000002");
        let cid = ContainerId::new(attempt(), 3);
        assert_eq!(cid.to_string(), "container_12345_0001_02_000003");
        assert_eq!(NodeId::new("h1", 1234).to_string(), "h1:1234");
    }

    #[test]
    fn resource_fits_in_checks_every_dimension() {
        let node = Resource::new(4096, 4);
        assert!(Resource::new(1024, 2).fits_in(&node));
        assert!(Resource::new(4096, 4).fits_in(&node));
        assert!(!Resource::new(8192, 1).fits_in(&node));
        assert!(!Resource::new(1024, 8).fits_in(&node));
    }

    #[test]
    fn ask_deserializes_with_defaults() {
        let json = r#"{
            "priority": 1,
            "resourceName": "*",
            "capability": {"memoryMb": 1024, "vcores": 2},
            "numContainers": 2
        }"#;
        let ask: ResourceAsk = serde_json::from_str(json).unwrap();
        assert!(ask.relax_locality);
        assert!(ask.is_any());
        assert!(!ask.is_opportunistic());
        assert_eq!(ask.node_label_expression, None);
    }

    #[test]
    fn execution_type_uses_upper_case_names() {
        let req = ExecutionTypeRequest::new(ExecutionType::Opportunistic, true);
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"OPPORTUNISTIC\""));
        assert!(json.contains("\"enforceExecutionType\":true"));
    }

    #[test]
    fn node_record_defaults_to_unknown_load() {
        let json = r#"{
            "nodeId": {"host": "h1", "port": 1234},
            "httpAddress": "h1:8042",
            "capability": {"memoryMb": 4096, "vcores": 8}
        }"#;
        let node: NodeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(node.queue_length, -1);
        assert_eq!(node.queue_wait_time_ms, -1);
        assert!(node.partition.is_empty());
    }

    #[test]
    fn refresh_keeps_identity() {
        let mut node = NodeRecord::new(NodeId::new("h1", 1234), "h1:8042", Resource::new(4096, 8));
        let newer = NodeRecord::new(NodeId::new("h1", 1234), "h1:8042", Resource::new(8192, 8))
            .with_load(100, 3);
        node.refresh_from(&newer);
        assert_eq!(node.node_id, NodeId::new("h1", 1234));
        assert_eq!(node.capability.memory_mb, 8192);
        assert_eq!(node.queue_wait_time_ms, 100);
        assert_eq!(node.queue_length, 3);
    }
}
