//! AM service error types.

use thiserror::Error;

use opal_core::ApplicationAttemptId;

use crate::scheduler::{AttemptState, SchedulerError};

/// Errors surfaced to application masters.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("application attempt not found: {0}")]
    UnknownAttempt(ApplicationAttemptId),

    #[error("application attempt {attempt_id} is not live (state: {state:?})")]
    AttemptNotLive {
        attempt_id: ApplicationAttemptId,
        state: AttemptState,
    },

    #[error("application master already registered: {0}")]
    AlreadyRegistered(ApplicationAttemptId),

    #[error("application master not registered: {0}")]
    NotRegistered(ApplicationAttemptId),

    #[error("application master already unregistered: {0}")]
    AttemptFinished(ApplicationAttemptId),

    #[error("no container id blocks left under epoch {epoch}")]
    ContainerIdsExhausted { epoch: u64 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
