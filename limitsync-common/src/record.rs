//! Update records read from the input file

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Deployment name, namespace, CPU limit, memory limit
pub const FIELDS_PER_RECORD: usize = 4;

/// Identifies a workload in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
}

impl WorkloadRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in namespace {}", self.name, self.namespace)
    }
}

/// One input row: the limits a single workload should end up with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Line the row started on (1-based)
    pub line: u64,
    pub workload_name: String,
    pub namespace: String,
    pub cpu_limit: String,
    pub memory_limit: String,
}

impl UpdateRecord {
    /// Build a record from the raw fields of one row
    pub fn from_fields<I, S>(line: u64, fields: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.len() != FIELDS_PER_RECORD {
            return Err(RecordError::WrongFieldCount {
                line,
                expected: FIELDS_PER_RECORD,
                found: fields.len(),
            });
        }

        let [workload_name, namespace, cpu_limit, memory_limit]: [String; FIELDS_PER_RECORD] =
            fields
                .try_into()
                .map_err(|_| RecordError::Malformed {
                    line,
                    message: "unexpected field layout".to_string(),
                })?;

        if workload_name.is_empty() {
            return Err(RecordError::MissingField {
                line,
                field: "deployment name",
            });
        }
        if namespace.is_empty() {
            return Err(RecordError::MissingField {
                line,
                field: "namespace",
            });
        }

        Ok(Self {
            line,
            workload_name,
            namespace,
            cpu_limit,
            memory_limit,
        })
    }

    pub fn target(&self) -> WorkloadRef {
        WorkloadRef::new(&self.namespace, &self.workload_name)
    }
}

/// A row that could not be turned into an [`UpdateRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record on line {line}: wrong number of fields (expected {expected}, found {found})")]
    WrongFieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("record on line {line}: empty {field}")]
    MissingField { line: u64, field: &'static str },

    #[error("record on line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("failed to read input: {0}")]
    Io(String),
}

impl RecordError {
    /// The input stream is broken and no further rows can be read
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordError::Io(_))
    }

    pub fn line(&self) -> Option<u64> {
        match self {
            RecordError::WrongFieldCount { line, .. }
            | RecordError::MissingField { line, .. }
            | RecordError::Malformed { line, .. } => Some(*line),
            RecordError::Io(_) => None,
        }
    }
}
