//! Sweep error types.

use thiserror::Error;

/// Errors that can occur while sweeping an instance.
///
/// Individual delete failures are not errors: the sweeper records them in
/// the [`SweepReport`](crate::SweepReport) and keeps going. Only conditions
/// that prevent the sweep itself from proceeding surface here.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("cleanup message carries no instance id")]
    MissingInstanceId,

    #[error("registry error: {0}")]
    Registry(#[from] reaper_state::RegistryError),
}

pub type SweepResult<T> = Result<T, SweepError>;
