//! Failures the lifecycle and backup controllers surface to the caller.
//!
//! Anything not listed here is an external-command failure carried as
//! `anyhow::Error` and either logged-and-ignored or propagated by the step
//! that produced it.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("must be run as '{expected}' (currently '{actual}')")]
    IdentityMismatch { expected: String, actual: String },

    #[error("another controller holds the lock {path:?}")]
    LockHeld { path: PathBuf },

    #[error("session '{session}' appeared while starting; another start is in progress")]
    SessionRace { session: String },

    #[error("server did not come up after {attempts} attempts")]
    PollExhausted { attempts: u32 },

    #[error("server did not come up within {elapsed:?} ({attempts} attempts)")]
    PollTimedOut { attempts: u32, elapsed: Duration },

    #[error("startup poll cancelled after {attempts} attempts")]
    PollCancelled { attempts: u32 },

    #[error("failed to {action} {unit}: {detail}")]
    ServiceControl {
        action: &'static str,
        unit: String,
        detail: String,
    },
}
