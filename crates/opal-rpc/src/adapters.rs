//! Per-protocol adapters: decode the payload, call the facade, encode the
//! response.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use opal_service::AmService;

use crate::error::{RpcError, RpcResult};
use crate::protocol::{Method, Protocol};

pub trait ProtocolAdapter: Send + Sync {
    fn protocol(&self) -> Protocol;

    fn call(&self, service: &AmService, method: Method, payload: Value) -> RpcResult<Value>;
}

/// `ApplicationMasterProtocol`.
pub struct StandardAdapter;

impl ProtocolAdapter for StandardAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::ApplicationMaster
    }

    fn call(&self, service: &AmService, method: Method, payload: Value) -> RpcResult<Value> {
        match method {
            Method::RegisterApplicationMaster => {
                encode(&service.register_application_master(&decode(payload)?)?)
            }
            Method::Allocate => encode(&service.allocate(&decode(payload)?)?),
            Method::FinishApplicationMaster => {
                encode(&service.finish_application_master(&decode(payload)?)?)
            }
            other => Err(RpcError::MethodNotOffered {
                protocol: self.protocol(),
                method: other,
            }),
        }
    }
}

/// `DistributedSchedulingAMProtocol`. Standard methods are served with
/// the standard contract.
pub struct DistributedAdapter;

impl ProtocolAdapter for DistributedAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::DistributedScheduling
    }

    fn call(&self, service: &AmService, method: Method, payload: Value) -> RpcResult<Value> {
        match method {
            Method::RegisterForDistributedScheduling => {
                encode(&service.register_for_distributed_scheduling(&decode(payload)?)?)
            }
            Method::AllocateForDistributedScheduling => {
                encode(&service.allocate_for_distributed_scheduling(&decode(payload)?)?)
            }
            standard => StandardAdapter.call(service, standard, payload),
        }
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> RpcResult<T> {
    serde_json::from_value(payload).map_err(RpcError::Decode)
}

fn encode<T: Serialize>(response: &T) -> RpcResult<Value> {
    serde_json::to_value(response).map_err(RpcError::Encode)
}
