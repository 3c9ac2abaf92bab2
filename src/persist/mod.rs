//! Snapshot model and restore policy for durable walk state.

pub mod restore;
pub mod snapshot;

pub use restore::{restore_decision, RestoreDecision};
pub use snapshot::{scrub, wrap_payload, WalkSnapshot, INLINE_PHOTO_LIMIT};
