//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{OPTION_COUNT, SnapshotError};

/// Errors emitted by the quiz engine and session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    EmptyBank,
    #[error("option {index} does not exist (expected 0..{OPTION_COUNT})")]
    InvalidOption { index: usize },
    #[error("no question is being presented")]
    NothingPresented,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
