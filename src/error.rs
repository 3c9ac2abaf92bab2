use thiserror::Error;

/// Hard failures surfaced by the walk controller.
///
/// Soft gating (unanswered checks, missing evidence) is never an error; it is
/// reported through [`crate::session::Advance::Blocked`] and
/// [`crate::session::FinalizeOutcome::Blocked`] so callers can show the
/// operator what is still missing.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Malformed or missing setup input. The walk is refused; nothing is
    /// persisted.
    #[error("invalid walk setup: {0}")]
    Validation(String),

    /// An operation was attempted outside its legal state, e.g. recording an
    /// answer on a completed walk or finalizing twice. Contract violation in
    /// the calling shell.
    #[error("operation not permitted: {0}")]
    InvalidState(String),
}

impl WalkError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WalkError::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        WalkError::InvalidState(msg.into())
    }
}

pub type WalkResult<T> = Result<T, WalkError>;
