//! reaper-sweep — grouped deletion of a terminated instance's resources.
//!
//! # Architecture
//!
//! ```text
//! cleanup message ──▶ Sweeper
//!                       │ load records for the instance (reaper-state)
//!                       │ stable-sort and group by service
//!                       │ resolve each group's DeleteFn (DeletionCatalog)
//!                       │ invoke per record, prune the record regardless
//!                       ▼
//!                   SweepReport
//! ```
//!
//! Deletion failures are per-record and recoverable: they are logged,
//! counted in the report, and the record is pruned anyway so the registry
//! converges on empty for a terminated instance. Only registry I/O
//! failures abort a sweep.

pub mod catalog;
pub mod error;
pub mod sweeper;
pub mod webhook;

pub use catalog::{DeleteArgs, DeleteFn, DeletionCatalog, OperationId};
pub use error::{SweepError, SweepResult};
pub use sweeper::{SweepReport, Sweeper};
pub use webhook::{webhook_delete, DEFAULT_TIMEOUT};
