//! opal-allocator: opportunistic container placement.
//!
//! This crate owns the per-attempt state the fast allocation path reads
//! and the algorithm that turns opportunistic asks into containers. It
//! does NOT talk to the central scheduler (that's `opal-service`).
//!
//! # Components
//!
//! - **`node_store`**: per-attempt node cache, fed by node events
//! - **`cursor`**: round-robin rotation cursor for tie-breaking
//! - **`context`**: `OpportunisticContainerContext`, one per attempt
//! - **`ranking`**: candidate filtering and least-loaded ordering
//! - **`allocator`**: turns asks into containers over a context
//! - **`token`**: container launch token issuance

pub mod allocator;
pub mod context;
pub mod cursor;
pub mod node_store;
pub mod ranking;
pub mod token;

pub use allocator::{AllocationOutcome, AllocatorSettings, OpportunisticAllocator};
pub use context::{ContainerIdRange, MAX_EPOCH, MAX_REGISTRATIONS, OpportunisticContainerContext};
pub use cursor::RotationCursor;
pub use node_store::NodeStore;
pub use ranking::{CandidateFilter, rank_nodes};
pub use token::{ContainerTokenIssuer, DigestTokenIssuer};
