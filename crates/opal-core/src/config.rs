//! `opal.toml` configuration parser.
//!
//! Every section is optional; omitted values fall back to the defaults
//! documented on each field.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::sizing::ContainerSizing;
use crate::types::{ApplicationAttemptId, Resource};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpalConfig {
    pub server: ServerConfig,
    pub allocation: AllocationConfig,
    pub sizing: SizingConfig,
    pub distributed_scheduling: DistributedSchedulingConfig,
    pub events: EventsConfig,
    pub token: TokenConfig,
    pub standalone: StandaloneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8030,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// How many of the least-loaded nodes are considered per ask.
    pub nodes_used: usize,
    /// Cap on opportunistic containers handed out per allocate call.
    pub max_allocations_per_call: u32,
    /// Largest `numContainers` accepted on a single ask.
    pub max_containers_per_ask: u32,
    /// Finished attempts remembered for idempotent finish and
    /// re-registration checks; the oldest are forgotten first.
    pub finished_attempt_retention: usize,
    /// Resource manager epoch; the high bits of every container id start.
    pub epoch: u64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            nodes_used: 10,
            max_allocations_per_call: 1000,
            max_containers_per_ask: 10_000,
            finished_attempt_retention: 10_000,
            epoch: 0,
        }
    }
}

/// Epochs occupy the top 16 bits of a container id.
const MAX_EPOCH: u64 = 0xFFFF;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub min_memory_mb: u64,
    pub min_vcores: u32,
    pub max_memory_mb: u64,
    pub max_vcores: u32,
    pub incr_memory_mb: u64,
    pub incr_vcores: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        let sizing = ContainerSizing::default();
        Self {
            min_memory_mb: sizing.min.memory_mb,
            min_vcores: sizing.min.vcores,
            max_memory_mb: sizing.max.memory_mb,
            max_vcores: sizing.max.vcores,
            incr_memory_mb: sizing.incr.memory_mb,
            incr_vcores: sizing.incr.vcores,
        }
    }
}

impl SizingConfig {
    pub fn to_sizing(&self) -> ContainerSizing {
        ContainerSizing::new(
            Resource::new(self.min_memory_mb, self.min_vcores),
            Resource::new(self.max_memory_mb, self.max_vcores),
            Resource::new(self.incr_memory_mb, self.incr_vcores),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributedSchedulingConfig {
    /// Serve the distributed-scheduling protocol next to the standard one.
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Bound on queued node events awaiting the event loop.
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub secret: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "opal-container-token".to_string(),
        }
    }
}

/// In-memory scheduler seed used by `opald standalone`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StandaloneConfig {
    pub queue: String,
    pub nodes: Vec<StandaloneNode>,
    /// Attempts admitted at startup; AMs can only register for these.
    pub attempts: Vec<StandaloneAttempt>,
}

impl Default for StandaloneConfig {
    fn default() -> Self {
        Self {
            queue: "default".to_string(),
            nodes: Vec::new(),
            attempts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandaloneNode {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    pub memory_mb: u64,
    pub vcores: u32,
    #[serde(default)]
    pub partition: String,
}

fn default_http_port() -> u16 {
    8042
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandaloneAttempt {
    pub cluster_timestamp: u64,
    pub app_id: u32,
    #[serde(default = "first_attempt")]
    pub attempt: u32,
    /// Falls back to `standalone.queue`.
    #[serde(default)]
    pub queue: Option<String>,
}

fn first_attempt() -> u32 {
    1
}

impl StandaloneAttempt {
    pub fn attempt_id(&self) -> ApplicationAttemptId {
        ApplicationAttemptId::new(self.cluster_timestamp, self.app_id, self.attempt)
    }
}

impl OpalConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: OpalConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.sizing.to_sizing().validate()?;
        if self.allocation.nodes_used == 0 {
            return Err(ConfigError::Invalid("allocation.nodes_used must be > 0".to_string()));
        }
        if self.allocation.max_allocations_per_call == 0 {
            return Err(ConfigError::Invalid(
                "allocation.max_allocations_per_call must be > 0".to_string(),
            ));
        }
        if self.allocation.max_containers_per_ask == 0 {
            return Err(ConfigError::Invalid(
                "allocation.max_containers_per_ask must be > 0".to_string(),
            ));
        }
        if self.allocation.epoch > MAX_EPOCH {
            return Err(ConfigError::Invalid(format!(
                "allocation.epoch must be <= {MAX_EPOCH}, got {}",
                self.allocation.epoch
            )));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigError::Invalid("events.channel_capacity must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn sizing(&self) -> ContainerSizing {
        self.sizing.to_sizing()
    }
}
