//! Container launch tokens.
//!
//! The node manager only launches a container when presented with a
//! token it can verify. Issuance is a collaborator concern: the
//! allocator asks a [`ContainerTokenIssuer`] for every container it
//! synthesizes and treats the result as opaque.

use sha2::{Digest, Sha256};

use opal_core::{ContainerId, ContainerToken, ExecutionType, NodeId, Resource};

/// Issues launch tokens for containers.
pub trait ContainerTokenIssuer: Send + Sync {
    fn issue(
        &self,
        container_id: &ContainerId,
        node_id: &NodeId,
        resource: &Resource,
        execution_type: ExecutionType,
    ) -> ContainerToken;
}

/// Issues SHA-256 digests keyed by a shared secret.
pub struct DigestTokenIssuer {
    secret: String,
}

impl DigestTokenIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl ContainerTokenIssuer for DigestTokenIssuer {
    fn issue(
        &self,
        container_id: &ContainerId,
        node_id: &NodeId,
        resource: &Resource,
        execution_type: ExecutionType,
    ) -> ContainerToken {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(container_id.to_string().as_bytes());
        hasher.update(node_id.to_string().as_bytes());
        hasher.update(resource.to_string().as_bytes());
        hasher.update(execution_type.to_string().as_bytes());
        ContainerToken(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::ApplicationAttemptId;

    fn issue(issuer: &DigestTokenIssuer, id: u64) -> ContainerToken {
        issuer.issue(
            &ContainerId::new(ApplicationAttemptId::new(1, 1, 1), id),
            &NodeId::new("h1", 1234),
            &Resource::new(1024, 1),
            ExecutionType::Opportunistic,
        )
    }

    #[test]
    fn tokens_are_deterministic() {
        let issuer = DigestTokenIssuer::new("secret");
        assert_eq!(issue(&issuer, 1), issue(&issuer, 1));
        assert_eq!(issue(&issuer, 1).0.len(), 64);
    }

    #[test]
    fn tokens_differ_per_container_and_secret() {
        let a = DigestTokenIssuer::new("secret");
        let b = DigestTokenIssuer::new("other");
        assert_ne!(issue(&a, 1), issue(&a, 2));
        assert_ne!(issue(&a, 1), issue(&b, 1));
    }
}
