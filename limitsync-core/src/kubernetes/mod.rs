//! Kubernetes integration
//!
//! - Cluster connection via kubeconfig
//! - Deployment get/replace behind the [`WorkloadRegistry`] seam

pub mod client;
pub mod error;
pub mod workloads;

pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use workloads::WorkloadRegistry;
