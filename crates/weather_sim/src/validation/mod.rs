//! The validation contract as executable checks.
//!
//! `checks` holds the pure predicates, `log` the findings, `batch` the
//! chunked runner that applies the checks to a queue of region-hours, and
//! `suite` the whole-year scans built on top of it.

pub mod batch;
pub mod checks;
pub mod log;
pub mod suite;
mod tests;

pub use batch::{BatchJob, BatchProgress, BatchRunner, BatchStats};
pub use checks::{CheckKind, TransitionTracker};
pub use log::{LogEntry, Severity, ValidationLog};
pub use suite::{ValidationReport, ValidationSuite};
