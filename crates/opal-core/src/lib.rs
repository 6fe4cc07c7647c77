//! opal-core: shared domain types for the Opal allocation service.
//!
//! Everything that crosses a crate boundary lives here: attempt and
//! container identifiers, resource sizes, resource asks, allocated
//! containers, node records, the container sizing policy, and the
//! daemon configuration file format.
//!
//! All types are `serde`-serializable so the RPC layer can carry them
//! as JSON without a separate wire model.

pub mod config;
pub mod error;
pub mod sizing;
pub mod types;

pub use config::OpalConfig;
pub use error::{ConfigError, ConfigResult};
pub use sizing::ContainerSizing;
pub use types::*;
