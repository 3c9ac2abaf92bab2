//! sitewalk: the session engine behind structured site inspections.
//!
//! An auditor walks a site answering yes/no checklists zone by zone. This
//! crate owns the resumable session state machine (cursor, answers, issue
//! ledger, evidence), the deterministic rating rules that turn answers into
//! GREEN/AMBER/RED or PASS/FAIL verdicts, and the local persistence that
//! lets a walk survive an app restart on the same day. Rendering, camera
//! hardware, and remote backends are the embedding shell's problem; they
//! talk to this crate through [`session::WalkController`], opaque photo
//! payloads, and [`export::ExportSink`].

pub mod checklist;
pub mod db;
pub mod error;
pub mod evidence;
pub mod export;
pub mod models;
pub mod persist;
pub mod rating;
pub mod sampling;
pub mod session;

pub use checklist::{ChecklistDefinition, Cursor, RoomPlan, TraversalShape, WalkKind};
pub use db::Database;
pub use error::{WalkError, WalkResult};
pub use export::{ExportDispatcher, ExportSink};
pub use models::{
    AnswerKey, CheckResult, CompletedWalk, EvidenceKey, Issue, IssueUpdate, Observation,
    ObservationCategory, PhotoRef, Remediation, RoomId, WalkStatus,
};
pub use rating::{rate_session, rate_zone, OverallRating, RatingPolicy, SessionShape, ZoneRating};
pub use session::{Advance, BeginWalk, Blocker, FinalizeOutcome, PhotoSlot, WalkController};
