//! Target resource limits for a container

use crate::quantity::{Quantity, QuantityError};
use std::fmt;
use thiserror::Error;

/// Resource names as they appear in a container's `resources.limits` map
pub const CPU: &str = "cpu";
pub const MEMORY: &str = "memory";

/// A limit value that failed to parse, tagged with the resource it was meant for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {resource} limit: {source}")]
pub struct LimitError {
    pub resource: &'static str,
    #[source]
    pub source: QuantityError,
}

/// CPU and memory limits to set on a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    pub cpu: Quantity,
    pub memory: Quantity,
}

impl ResourceLimits {
    /// Parse both limits, CPU first
    pub fn parse(cpu: &str, memory: &str) -> Result<Self, LimitError> {
        let cpu = Quantity::parse(cpu).map_err(|source| LimitError {
            resource: CPU,
            source,
        })?;
        let memory = Quantity::parse(memory).map_err(|source| LimitError {
            resource: MEMORY,
            source,
        })?;

        Ok(Self { cpu, memory })
    }

    /// `(resource name, quantity)` pairs in map order
    pub fn entries(&self) -> [(&'static str, &Quantity); 2] {
        [(CPU, &self.cpu), (MEMORY, &self.memory)]
    }
}

impl fmt::Display for ResourceLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu={} memory={}", self.cpu, self.memory)
    }
}
