//! Walk-level data models: lifecycle status, answer keys, completed summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checklist::WalkKind;
use crate::models::issue::{Issue, Observation, PhotoRef};
use crate::rating::{OverallRating, ZoneRating};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WalkStatus {
    NotStarted,
    InProgress,
    Reviewing,
    Complete,
}

impl Default for WalkStatus {
    fn default() -> Self {
        WalkStatus::NotStarted
    }
}

impl WalkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkStatus::NotStarted => "NotStarted",
            WalkStatus::InProgress => "InProgress",
            WalkStatus::Reviewing => "Reviewing",
            WalkStatus::Complete => "Complete",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CheckResult {
    Pass,
    Fail,
}

impl CheckResult {
    pub fn is_fail(&self) -> bool {
        matches!(self, CheckResult::Fail)
    }
}

/// A room selected for this walk. Kept as two typed fields rather than a
/// `"{kind}_{name}"` string so a room name can never collide with a check id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct RoomId {
    pub kind: String,
    pub name: String,
}

impl RoomId {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.name)
    }
}

/// Composite key for a recorded answer: the check, optionally qualified by the
/// room it was answered in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    pub check_id: String,
    pub room: Option<RoomId>,
}

impl AnswerKey {
    pub fn zone_wide(check_id: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            room: None,
        }
    }

    pub fn in_room(check_id: impl Into<String>, room: RoomId) -> Self {
        Self {
            check_id: check_id.into(),
            room: Some(room),
        }
    }
}

/// Key for a proof-of-presence photo slot: the zone, optionally narrowed to a
/// single room for room-based walks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceKey {
    pub zone_id: String,
    pub room: Option<RoomId>,
}

impl EvidenceKey {
    pub fn zone(zone_id: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            room: None,
        }
    }

    pub fn room(zone_id: impl Into<String>, room: RoomId) -> Self {
        Self {
            zone_id: zone_id.into(),
            room: Some(room),
        }
    }
}

/// Final rating for a single zone, stamped at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRatingEntry {
    pub zone_id: String,
    pub rating: ZoneRating,
}

/// Ratings computed exactly once when the walk finalizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalRatings {
    pub zones: Vec<ZoneRatingEntry>,
    pub overall: OverallRating,
}

/// Read-only summary handed to export sinks after a walk finalizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedWalk {
    pub id: String,
    pub kind: WalkKind,
    pub site: String,
    pub inspector: String,
    pub inspector_email: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub ratings: FinalRatings,
    pub issues: Vec<Issue>,
    pub observations: Vec<Observation>,
    pub exit_photos: Vec<ExitPhotoEntry>,
}

/// One proof-of-presence photo in the completed summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitPhotoEntry {
    pub key: EvidenceKey,
    pub photo: PhotoRef,
}
