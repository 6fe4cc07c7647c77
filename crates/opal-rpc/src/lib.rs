//! opal-rpc: one endpoint for both AM protocols.
//!
//! A call names a protocol and a method. `ApplicationMasterProtocol`
//! offers register / allocate / finish; `DistributedSchedulingAMProtocol`
//! offers the same three plus the distributed-scheduling register and
//! allocate calls, and is only served when enabled in config.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/rpc/{protocol}/{method}` | Protocol call, JSON in and out |
//! | GET | `/healthz` | Liveness |

pub mod adapters;
pub mod error;
pub mod http;
pub mod protocol;
pub mod router;

pub use adapters::{DistributedAdapter, ProtocolAdapter, StandardAdapter};
pub use error::{RpcError, RpcResult};
pub use http::build_router;
pub use protocol::{Method, Protocol};
pub use router::ProtocolRouter;
