//! Kubernetes workload access
//!
//! The reconciler only ever reads and replaces whole Deployments, so that is
//! the entire surface of [`WorkloadRegistry`].

pub mod deployments;

use crate::kubernetes::error::K8sResult;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use std::sync::Arc;

/// Read and replace workload definitions - implement this for custom registries
#[async_trait]
pub trait WorkloadRegistry: Send + Sync {
    /// Fetch the live definition of a workload
    async fn get_workload(&self, namespace: &str, name: &str) -> K8sResult<Deployment>;

    /// Replace a workload with `definition`, returning what the registry stored
    async fn update_workload(
        &self,
        namespace: &str,
        name: &str,
        definition: &Deployment,
    ) -> K8sResult<Deployment>;
}

#[async_trait]
impl<T: WorkloadRegistry + ?Sized> WorkloadRegistry for Arc<T> {
    async fn get_workload(&self, namespace: &str, name: &str) -> K8sResult<Deployment> {
        (**self).get_workload(namespace, name).await
    }

    async fn update_workload(
        &self,
        namespace: &str,
        name: &str,
        definition: &Deployment,
    ) -> K8sResult<Deployment> {
        (**self).update_workload(namespace, name, definition).await
    }
}
