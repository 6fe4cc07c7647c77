//! Protocol router.
//!
//! One endpoint, two protocols. A call names its protocol and method;
//! the router checks the pair and hands the payload to that protocol's
//! adapter.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use opal_service::AmService;

use crate::adapters::{DistributedAdapter, ProtocolAdapter, StandardAdapter};
use crate::error::{RpcError, RpcResult};
use crate::protocol::{Method, Protocol};

pub struct ProtocolRouter {
    service: Arc<AmService>,
    adapters: HashMap<Protocol, Box<dyn ProtocolAdapter>>,
}

impl ProtocolRouter {
    /// Serve the standard protocol, plus the distributed-scheduling
    /// protocol when `distributed_scheduling` is set.
    pub fn new(service: Arc<AmService>, distributed_scheduling: bool) -> Self {
        let mut adapters: HashMap<Protocol, Box<dyn ProtocolAdapter>> = HashMap::new();
        adapters.insert(Protocol::ApplicationMaster, Box::new(StandardAdapter));
        if distributed_scheduling {
            adapters.insert(Protocol::DistributedScheduling, Box::new(DistributedAdapter));
        }
        Self { service, adapters }
    }

    pub fn service(&self) -> &Arc<AmService> {
        &self.service
    }

    pub fn serves(&self, protocol: Protocol) -> bool {
        self.adapters.contains_key(&protocol)
    }

    /// Check a protocol/method pair without calling it.
    pub fn resolve(&self, protocol: &str, method: &str) -> RpcResult<(Protocol, Method)> {
        let protocol: Protocol = protocol.parse()?;
        if !self.serves(protocol) {
            return Err(RpcError::ProtocolDisabled(protocol));
        }
        let method: Method = method.parse()?;
        if !protocol.offers(method) {
            return Err(RpcError::MethodNotOffered { protocol, method });
        }
        Ok((protocol, method))
    }

    pub fn dispatch(&self, protocol: &str, method: &str, payload: Value) -> RpcResult<Value> {
        let (protocol, method) = self.resolve(protocol, method)?;
        let adapter = self
            .adapters
            .get(&protocol)
            .ok_or(RpcError::ProtocolDisabled(protocol))?;

        debug!(%protocol, %method, "dispatching call");
        adapter
            .call(&self.service, method, payload)
            .inspect_err(|e| warn!(%protocol, %method, error = %e, "call failed"))
    }
}
