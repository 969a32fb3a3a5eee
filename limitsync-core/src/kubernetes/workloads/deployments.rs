//! Deployment operations
//!
//! Get and replace for Kubernetes Deployments.

use crate::kubernetes::client::K8sClient;
use crate::kubernetes::error::{K8sError, K8sResult};
use crate::kubernetes::workloads::WorkloadRegistry;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams};

const KIND: &str = "Deployment";

/// Get a single deployment
pub async fn get_deployment(
    client: &K8sClient,
    namespace: &str,
    name: &str,
) -> K8sResult<Deployment> {
    let deployments: Api<Deployment> = Api::namespaced(client.inner().clone(), namespace);

    deployments
        .get(name)
        .await
        .map_err(|e| K8sError::from_api(e, KIND, namespace, name))
}

/// Replace a deployment with a full definition
///
/// The definition's `resourceVersion` is sent along, so a copy that went
/// stale since it was fetched is rejected with a conflict.
pub async fn replace_deployment(
    client: &K8sClient,
    namespace: &str,
    name: &str,
    deployment: &Deployment,
) -> K8sResult<Deployment> {
    let deployments: Api<Deployment> = Api::namespaced(client.inner().clone(), namespace);

    deployments
        .replace(name, &PostParams::default(), deployment)
        .await
        .map_err(|e| K8sError::from_api(e, KIND, namespace, name))
}

#[async_trait]
impl WorkloadRegistry for K8sClient {
    async fn get_workload(&self, namespace: &str, name: &str) -> K8sResult<Deployment> {
        get_deployment(self, namespace, name).await
    }

    async fn update_workload(
        &self,
        namespace: &str,
        name: &str,
        definition: &Deployment,
    ) -> K8sResult<Deployment> {
        replace_deployment(self, namespace, name, definition).await
    }
}
