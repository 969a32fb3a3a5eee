//! Kubernetes error types
//!
//! Classifies kube-rs API failures so per-record status lines say what went wrong.

use std::time::Duration;
use thiserror::Error;

/// Kubernetes-specific errors
#[derive(Debug, Error)]
pub enum K8sError {
    /// Kubernetes resource not found
    #[error("Resource not found: {kind}/{name} in namespace {namespace}")]
    ResourceNotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource conflict, usually a stale resourceVersion
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rejected by API server validation
    #[error("Invalid: {0}")]
    Invalid(String),

    /// Error from kube-rs client
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Invalid kubeconfig
    #[error("Invalid kubeconfig: {0}")]
    InvalidKubeconfig(String),

    /// API call did not finish in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Abandoned because shutdown was requested
    #[error("Cancelled by shutdown request")]
    Cancelled,
}

impl K8sError {
    /// Map a kube-rs error for a named resource onto a specific variant
    pub fn from_api(err: kube::Error, kind: &str, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(response) => match response.code {
                404 => K8sError::ResourceNotFound {
                    kind: kind.to_string(),
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                },
                403 => K8sError::Forbidden(response.message),
                409 => K8sError::Conflict(response.message),
                422 => K8sError::Invalid(response.message),
                _ => K8sError::KubeError(kube::Error::Api(response)),
            },
            other => K8sError::KubeError(other),
        }
    }
}

/// Result type alias for Kubernetes operations
pub type K8sResult<T> = std::result::Result<T, K8sError>;
