//! Per-record outcomes and the run summary built from them

use chrono::{DateTime, Utc};
use limitsync_common::{LimitError, RecordError, WorkloadRef};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::kubernetes::K8sError;

/// Why a single well-formed record could not be applied
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to get deployment {target}: {source}")]
    Fetch {
        target: WorkloadRef,
        #[source]
        source: K8sError,
    },

    #[error("Invalid {} limit for deployment {target}: {}", .source.resource, .source.source)]
    Limits {
        target: WorkloadRef,
        #[source]
        source: LimitError,
    },

    #[error("Deployment {target} has no containers")]
    NoContainers { target: WorkloadRef },

    #[error("Failed to update deployment {target}: {source}")]
    Update {
        target: WorkloadRef,
        #[source]
        source: K8sError,
    },
}

impl ReconcileError {
    pub fn target(&self) -> &WorkloadRef {
        match self {
            ReconcileError::Fetch { target, .. }
            | ReconcileError::Limits { target, .. }
            | ReconcileError::NoContainers { target }
            | ReconcileError::Update { target, .. } => target,
        }
    }

    /// The registry call was abandoned because shutdown was requested
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ReconcileError::Fetch {
                source: K8sError::Cancelled,
                ..
            } | ReconcileError::Update {
                source: K8sError::Cancelled,
                ..
            }
        )
    }
}

/// What happened to one input row
#[derive(Debug)]
pub enum RecordOutcome {
    Updated { line: u64, target: WorkloadRef },
    Failed { line: u64, error: ReconcileError },
    Malformed(RecordError),
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RecordOutcome::Updated { .. })
    }

    pub fn line(&self) -> Option<u64> {
        match self {
            RecordOutcome::Updated { line, .. } | RecordOutcome::Failed { line, .. } => Some(*line),
            RecordOutcome::Malformed(err) => err.line(),
        }
    }

    pub fn target(&self) -> Option<&WorkloadRef> {
        match self {
            RecordOutcome::Updated { target, .. } => Some(target),
            RecordOutcome::Failed { error, .. } => Some(error.target()),
            RecordOutcome::Malformed(_) => None,
        }
    }
}

/// The human-readable status line for this record
impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordOutcome::Updated { target, .. } => {
                write!(f, "Successfully updated deployment {}", target)
            }
            RecordOutcome::Failed { error, .. } => write!(f, "{}", error),
            RecordOutcome::Malformed(err) => write!(f, "{}", err),
        }
    }
}

/// A record that did not end in a successful update
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub line: Option<u64>,
    pub target: Option<WorkloadRef>,
    pub reason: String,
}

/// Totals for one pass over the input
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
    pub malformed: usize,
    /// Stopped early because shutdown was requested
    pub interrupted: bool,
    /// The input stream broke before it was fully read
    pub input_error: Option<String>,
    pub failures: Vec<FailureEntry>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total: 0,
            updated: 0,
            failed: 0,
            malformed: 0,
            interrupted: false,
            input_error: None,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.total += 1;

        match outcome {
            RecordOutcome::Updated { .. } => {
                self.updated += 1;
                return;
            }
            RecordOutcome::Failed { .. } => self.failed += 1,
            RecordOutcome::Malformed(_) => self.malformed += 1,
        }

        self.failures.push(FailureEntry {
            line: outcome.line(),
            target: outcome.target().cloned(),
            reason: outcome.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Anything short of every row being applied
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.malformed > 0 || self.interrupted || self.input_error.is_some()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limitsync_common::ResourceLimits;

    fn target() -> WorkloadRef {
        WorkloadRef::new("prod", "checkout")
    }

    #[test]
    fn test_status_lines() {
        let updated = RecordOutcome::Updated {
            line: 1,
            target: target(),
        };
        assert_eq!(
            updated.to_string(),
            "Successfully updated deployment checkout in namespace prod"
        );

        let fetch_failed = RecordOutcome::Failed {
            line: 2,
            error: ReconcileError::Fetch {
                target: WorkloadRef::new("prod", "ghost"),
                source: K8sError::ResourceNotFound {
                    kind: "Deployment".to_string(),
                    name: "ghost".to_string(),
                    namespace: "prod".to_string(),
                },
            },
        };
        assert_eq!(
            fetch_failed.to_string(),
            "Failed to get deployment ghost in namespace prod: Resource not found: Deployment/ghost in namespace prod"
        );

        let update_failed = RecordOutcome::Failed {
            line: 3,
            error: ReconcileError::Update {
                target: target(),
                source: K8sError::Conflict("object has been modified".to_string()),
            },
        };
        assert_eq!(
            update_failed.to_string(),
            "Failed to update deployment checkout in namespace prod: Conflict: object has been modified"
        );
    }

    #[test]
    fn test_limit_error_line() {
        let source = ResourceLimits::parse("1", "").unwrap_err();
        let outcome = RecordOutcome::Failed {
            line: 4,
            error: ReconcileError::Limits {
                target: target(),
                source,
            },
        };
        assert_eq!(
            outcome.to_string(),
            "Invalid memory limit for deployment checkout in namespace prod: quantity must not be empty"
        );
    }

    #[test]
    fn test_malformed_status_line() {
        let outcome = RecordOutcome::Malformed(RecordError::WrongFieldCount {
            line: 5,
            expected: 4,
            found: 3,
        });
        assert_eq!(
            outcome.to_string(),
            "record on line 5: wrong number of fields (expected 4, found 3)"
        );
        assert_eq!(outcome.line(), Some(5));
        assert!(outcome.target().is_none());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new();
        summary.record(&RecordOutcome::Updated {
            line: 1,
            target: target(),
        });
        summary.record(&RecordOutcome::Failed {
            line: 2,
            error: ReconcileError::NoContainers { target: target() },
        });
        summary.record(&RecordOutcome::Malformed(RecordError::MissingField {
            line: 3,
            field: "namespace",
        }));
        summary.finish();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].line, Some(2));
        assert_eq!(summary.failures[0].target, Some(target()));
        assert!(summary.has_failures());
        assert!(summary.duration().is_some());
    }

    #[test]
    fn test_clean_run_has_no_failures() {
        let mut summary = RunSummary::new();
        summary.record(&RecordOutcome::Updated {
            line: 1,
            target: target(),
        });
        assert!(!summary.has_failures());

        summary.interrupted = true;
        assert!(summary.has_failures());
    }

    #[test]
    fn test_cancelled_errors() {
        let err = ReconcileError::Update {
            target: target(),
            source: K8sError::Cancelled,
        };
        assert!(err.is_cancelled());

        let err = ReconcileError::NoContainers { target: target() };
        assert!(!err.is_cancelled());
    }
}
