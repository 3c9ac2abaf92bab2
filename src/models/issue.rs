//! Issue and observation records collected while a walk is open.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::session::RoomId;

/// Reference to a photo payload. The bytes live either inline (small
/// payloads) or in the keyed blob table; the record only carries the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    pub key: String,
    pub byte_len: u64,
}

/// A photo as held in walk state: small payloads stay inline (base64 in the
/// snapshot), anything oversized is moved to the blob table before a snapshot
/// is handed to storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "storage")]
pub enum PhotoAttachment {
    Inline { key: String, data: String },
    Stored { photo: PhotoRef },
}

impl PhotoAttachment {
    pub fn key(&self) -> &str {
        match self {
            PhotoAttachment::Inline { key, .. } => key,
            PhotoAttachment::Stored { photo } => &photo.key,
        }
    }

    pub fn photo_ref(&self) -> PhotoRef {
        match self {
            PhotoAttachment::Inline { key, data } => PhotoRef {
                key: key.clone(),
                // base64 expands 3 bytes into 4 chars
                byte_len: (data.len() as u64 / 4) * 3,
            },
            PhotoAttachment::Stored { photo } => photo.clone(),
        }
    }
}

/// Who fixes an issue and by when. Feeds the amber test for walk kinds that
/// require remediation within a day limit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Remediation {
    pub owner: String,
    pub due: NaiveDate,
}

/// A documented failed check. Created explicitly by the operator after a
/// `Fail` answer; severity and the photo requirement are stamped from the
/// checklist definition at creation time and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub check_id: String,
    pub zone_id: String,
    pub room: Option<RoomId>,
    pub tier: u8,
    pub photo_required: bool,
    pub note: String,
    pub photos: Vec<PhotoAttachment>,
    pub remediation: Option<Remediation>,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    pub fn new(
        check_id: impl Into<String>,
        zone_id: impl Into<String>,
        room: Option<RoomId>,
        tier: u8,
        photo_required: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            check_id: check_id.into(),
            zone_id: zone_id.into(),
            room,
            tier,
            photo_required,
            note: String::new(),
            photos: Vec::new(),
            remediation: None,
            created_at,
        }
    }

    pub fn photo_refs(&self) -> Vec<PhotoRef> {
        self.photos.iter().map(PhotoAttachment::photo_ref).collect()
    }
}

/// Fields an operator can fill in on the evidence form. Merged into the
/// existing issue for the same check/room key: notes replace, remediation
/// replaces, photos are attached separately and only ever append.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub note: Option<String>,
    pub remediation: Option<Remediation>,
}

/// Category a cross-team observation is filed under. Ordering is the fixed
/// routing precedence; see [`crate::rating::routing`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ObservationCategory {
    Security,
    FireLifeSafety,
    RecreationSafety,
    Mechanical,
    Cleanliness,
    Structural,
}

impl ObservationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationCategory::Security => "Security",
            ObservationCategory::FireLifeSafety => "FireLifeSafety",
            ObservationCategory::RecreationSafety => "RecreationSafety",
            ObservationCategory::Mechanical => "Mechanical",
            ObservationCategory::Cleanliness => "Cleanliness",
            ObservationCategory::Structural => "Structural",
        }
    }
}

/// A finding that belongs to another team's domain. Not tied to a checklist
/// item; filed ad hoc at an observation stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    pub category: ObservationCategory,
    pub team: String,
    pub tier: u8,
    pub description: String,
    pub photos: Vec<PhotoAttachment>,
    pub created_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(
        category: ObservationCategory,
        team: impl Into<String>,
        tier: u8,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            team: team.into(),
            tier,
            description: description.into(),
            photos: Vec::new(),
            created_at,
        }
    }
}
