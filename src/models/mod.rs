pub mod issue;
pub mod session;

pub use issue::{
    Issue, IssueUpdate, Observation, ObservationCategory, PhotoAttachment, PhotoRef, Remediation,
};
pub use session::{
    AnswerKey, CheckResult, CompletedWalk, EvidenceKey, ExitPhotoEntry, FinalRatings, RoomId,
    WalkStatus, ZoneRatingEntry,
};
