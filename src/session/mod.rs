//! Walk session: in-memory state plus the controller that drives it.

pub mod state;
pub mod store;

pub use state::{Blocker, WalkState};
pub use store::{Advance, BeginWalk, FinalizeOutcome, PhotoSlot, WalkController};
