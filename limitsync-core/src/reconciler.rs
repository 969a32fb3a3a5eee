//! Reconciler
//!
//! Applies update records to the workload registry one at a time:
//! fetch the live Deployment, swap the first container's limits, replace it.
//! Any failure is confined to the record that caused it. Records are
//! reconciled strictly one after another, in input order.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use limitsync_common::{RecordError, ResourceLimits, UpdateRecord, WorkloadRef};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

use crate::kubernetes::{K8sError, K8sResult, WorkloadRegistry};
use crate::outcome::{ReconcileError, RecordOutcome, RunSummary};

/// Upper bound for a single registry call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// The Deployment's pod template has nothing to set limits on
#[derive(Debug, Error)]
#[error("pod template has no containers")]
pub struct MissingContainer;

/// Replace the limits of the first container in the pod template
///
/// The whole `limits` map is replaced by `{cpu, memory}`. Requests, the other
/// containers and every other field of the Deployment are left alone.
pub fn apply_limits(
    deployment: &mut Deployment,
    limits: &ResourceLimits,
) -> Result<(), MissingContainer> {
    let container = deployment
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
        .and_then(|pod| pod.containers.first_mut())
        .ok_or(MissingContainer)?;

    let limits: BTreeMap<String, Quantity> = limits
        .entries()
        .iter()
        .map(|(name, quantity)| (name.to_string(), Quantity(quantity.to_string())))
        .collect();

    container
        .resources
        .get_or_insert_with(ResourceRequirements::default)
        .limits = Some(limits);

    Ok(())
}

/// Applies update records against a [`WorkloadRegistry`]
pub struct Reconciler<R> {
    registry: R,
    call_timeout: Duration,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<R: WorkloadRegistry> Reconciler<R> {
    /// Create a reconciler owning the registry handle for the whole batch
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            shutdown: None,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Abandon in-flight calls and stop between records once this flips to `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Run one registry call under the timeout and the shutdown signal
    async fn bounded<T>(&self, call: impl Future<Output = K8sResult<T>>) -> K8sResult<T> {
        let timeout = self.call_timeout;

        tokio::select! {
            biased;
            result = tokio::time::timeout(timeout, call) => {
                result.unwrap_or_else(|_| Err(K8sError::Timeout(timeout)))
            }
            _ = shutdown_signalled(self.shutdown.clone()) => Err(K8sError::Cancelled),
        }
    }

    /// Fetch, mutate and write back a single record
    pub async fn reconcile_one(&self, record: &UpdateRecord) -> Result<WorkloadRef, ReconcileError> {
        let target = record.target();

        tracing::debug!(
            line = record.line,
            namespace = %target.namespace,
            deployment = %target.name,
            "Fetching deployment"
        );

        let mut deployment = self
            .bounded(self.registry.get_workload(&target.namespace, &target.name))
            .await
            .map_err(|source| ReconcileError::Fetch {
                target: target.clone(),
                source,
            })?;

        let limits = ResourceLimits::parse(&record.cpu_limit, &record.memory_limit).map_err(
            |source| ReconcileError::Limits {
                target: target.clone(),
                source,
            },
        )?;

        apply_limits(&mut deployment, &limits).map_err(|_| ReconcileError::NoContainers {
            target: target.clone(),
        })?;

        tracing::debug!(
            namespace = %target.namespace,
            deployment = %target.name,
            limits = %limits,
            "Writing back deployment"
        );

        self.bounded(
            self.registry
                .update_workload(&target.namespace, &target.name, &deployment),
        )
        .await
        .map_err(|source| ReconcileError::Update {
            target: target.clone(),
            source,
        })?;

        Ok(target)
    }

    /// Reconcile every record in order, reporting each outcome as it happens
    ///
    /// `on_outcome` is called once per row before the next row is read.
    pub async fn run<I, F>(&self, records: I, mut on_outcome: F) -> RunSummary
    where
        I: IntoIterator<Item = Result<UpdateRecord, RecordError>>,
        F: FnMut(&RecordOutcome),
    {
        let mut summary = RunSummary::new();
        let mut records = records.into_iter();

        loop {
            if self.shutdown_requested() {
                tracing::info!("Shutdown requested, not starting further records");
                summary.interrupted = true;
                break;
            }

            let Some(next) = records.next() else {
                break;
            };

            let outcome = match next {
                Ok(record) => match self.reconcile_one(&record).await {
                    Ok(target) => {
                        tracing::info!(
                            line = record.line,
                            namespace = %target.namespace,
                            deployment = %target.name,
                            "Deployment updated"
                        );
                        RecordOutcome::Updated {
                            line: record.line,
                            target,
                        }
                    }
                    Err(error) => {
                        tracing::info!(
                            line = record.line,
                            error = %error,
                            "Record failed"
                        );
                        RecordOutcome::Failed {
                            line: record.line,
                            error,
                        }
                    }
                },
                Err(err) if err.is_terminal() => {
                    tracing::info!(error = %err, "Input stream failed, stopping");
                    summary.input_error = Some(err.to_string());
                    break;
                }
                Err(err) => {
                    tracing::info!(error = %err, "Skipping malformed record");
                    RecordOutcome::Malformed(err)
                }
            };

            on_outcome(&outcome);
            summary.record(&outcome);

            if matches!(&outcome, RecordOutcome::Failed { error, .. } if error.is_cancelled()) {
                summary.interrupted = true;
                break;
            }
        }

        summary.finish();

        tracing::info!(
            total = summary.total,
            updated = summary.updated,
            failed = summary.failed,
            malformed = summary.malformed,
            interrupted = summary.interrupted,
            "Run finished"
        );

        summary
    }
}

/// Resolves once shutdown is requested; never resolves without a signal source
async fn shutdown_signalled(shutdown: Option<watch::Receiver<bool>>) {
    if let Some(mut rx) = shutdown {
        if rx.wait_for(|stop| *stop).await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}
