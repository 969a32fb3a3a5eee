//! Bulk resource-limit updates for Kubernetes Deployments
//!
//! Reads `name,namespace,cpu,memory` rows and, for each one, fetches the
//! Deployment, sets the first container's limits and writes it back.

pub mod config;
pub mod kubernetes;
pub mod logging;
pub mod outcome;
pub mod reconciler;
pub mod records;
pub mod shutdown;

pub use config::{ConfigError, LimitsyncConfig};
pub use outcome::{FailureEntry, ReconcileError, RecordOutcome, RunSummary};
pub use reconciler::{apply_limits, Reconciler, DEFAULT_CALL_TIMEOUT};
pub use records::RecordSource;
pub use shutdown::ShutdownCoordinator;
