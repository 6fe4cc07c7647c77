//! Routing errors.

use axum::http::StatusCode;
use thiserror::Error;

use opal_service::{SchedulerError, ServiceError};

use crate::protocol::{Method, Protocol};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("method {method} is not offered by {protocol}")]
    MethodNotOffered { protocol: Protocol, method: Method },

    #[error("protocol {0} is disabled")]
    ProtocolDisabled(Protocol),

    #[error("malformed payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

pub type RpcResult<T> = Result<T, RpcError>;

impl RpcError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::UnknownProtocol(_) => "unknown_protocol",
            RpcError::UnknownMethod(_) => "unknown_method",
            RpcError::MethodNotOffered { .. } => "method_not_offered",
            RpcError::ProtocolDisabled(_) => "protocol_disabled",
            RpcError::Decode(_) => "malformed_payload",
            RpcError::Encode(_) => "internal",
            RpcError::Service(e) => match e {
                ServiceError::UnknownAttempt(_) => "unknown_attempt",
                ServiceError::AttemptNotLive { .. } => "attempt_not_live",
                ServiceError::AlreadyRegistered(_) => "already_registered",
                ServiceError::NotRegistered(_) => "not_registered",
                ServiceError::AttemptFinished(_) => "attempt_finished",
                ServiceError::ContainerIdsExhausted { .. } => "container_ids_exhausted",
                ServiceError::InvalidRequest(_) => "invalid_request",
                ServiceError::Scheduler(_) => "scheduler",
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RpcError::UnknownProtocol(_)
            | RpcError::UnknownMethod(_)
            | RpcError::MethodNotOffered { .. } => StatusCode::NOT_FOUND,
            RpcError::ProtocolDisabled(_) => StatusCode::NOT_IMPLEMENTED,
            RpcError::Decode(_) => StatusCode::BAD_REQUEST,
            RpcError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RpcError::Service(e) => match e {
                ServiceError::UnknownAttempt(_) => StatusCode::NOT_FOUND,
                ServiceError::AttemptNotLive { .. }
                | ServiceError::AlreadyRegistered(_)
                | ServiceError::NotRegistered(_) => StatusCode::CONFLICT,
                ServiceError::AttemptFinished(_) => StatusCode::GONE,
                ServiceError::ContainerIdsExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ServiceError::Scheduler(SchedulerError::UnknownAttempt(_)) => StatusCode::NOT_FOUND,
                ServiceError::Scheduler(SchedulerError::Rejected(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ServiceError::Scheduler(SchedulerError::Unavailable(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
        }
    }
}
