//! Types shared by the limitsync engine and command-line tool

pub mod limits;
pub mod quantity;
pub mod record;

pub use limits::{LimitError, ResourceLimits};
pub use quantity::{Quantity, QuantityError};
pub use record::{RecordError, UpdateRecord, WorkloadRef, FIELDS_PER_RECORD};
