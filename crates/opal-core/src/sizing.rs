//! Container sizing policy for opportunistic containers.
//!
//! Every opportunistic container is normalized against a cluster-wide
//! `[min, max]` window and rounded up to a multiple of the increment.
//! A maximum that is not itself a multiple of the increment is rounded
//! down, so normalized sizes always land on an increment.
//! Distributed-scheduling AMs receive the same three values at
//! registration so they can size their own requests.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Resource;

/// Minimum, maximum and increment container resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSizing {
    pub min: Resource,
    pub max: Resource,
    pub incr: Resource,
}

impl Default for ContainerSizing {
    fn default() -> Self {
        Self {
            min: Resource::new(512, 1),
            max: Resource::new(2048, 4),
            incr: Resource::new(512, 1),
        }
    }
}

impl ContainerSizing {
    pub fn new(min: Resource, max: Resource, incr: Resource) -> Self {
        Self { min, max, incr }
    }

    /// Check that increments are non-zero and that the window holds at
    /// least one increment-aligned size.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.incr.memory_mb == 0 || self.incr.vcores == 0 {
            return Err(ConfigError::Invalid(format!(
                "container increment must be non-zero, got {}",
                self.incr
            )));
        }
        if !self.min.fits_in(&self.max) {
            return Err(ConfigError::Invalid(format!(
                "minimum container resource {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        let memory_fits = aligned_window(self.min.memory_mb, self.max.memory_mb, self.incr.memory_mb);
        let vcores_fits = aligned_window(
            u64::from(self.min.vcores),
            u64::from(self.max.vcores),
            u64::from(self.incr.vcores),
        );
        if !memory_fits || !vcores_fits {
            return Err(ConfigError::Invalid(format!(
                "no multiple of increment {} lies between {} and {}",
                self.incr, self.min, self.max
            )));
        }
        Ok(())
    }

    /// Normalize a requested resource: raise to the minimum, round up to
    /// the increment, then clamp to the largest increment multiple within
    /// the maximum.
    pub fn normalize(&self, requested: Resource) -> Resource {
        Resource {
            memory_mb: normalize_dim(
                requested.memory_mb,
                self.min.memory_mb,
                self.max.memory_mb,
                self.incr.memory_mb,
            ),
            vcores: normalize_dim(
                u64::from(requested.vcores),
                u64::from(self.min.vcores),
                u64::from(self.max.vcores),
                u64::from(self.incr.vcores),
            ) as u32,
        }
    }
}

fn round_up(value: u64, incr: u64) -> u64 {
    if incr == 0 {
        value
    } else {
        value.div_ceil(incr).saturating_mul(incr)
    }
}

fn round_down(value: u64, incr: u64) -> u64 {
    if incr == 0 { value } else { value / incr * incr }
}

fn aligned_window(min: u64, max: u64, incr: u64) -> bool {
    round_up(min, incr) <= round_down(max, incr)
}

fn normalize_dim(value: u64, min: u64, max: u64, incr: u64) -> u64 {
    round_up(value.max(min), incr).min(round_down(max, incr))
}
