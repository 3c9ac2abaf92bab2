//! Serde snapshot of a walk, and the scrub pass that keeps oversized photo
//! payloads out of the snapshot row.
//!
//! The answers and exit-photo maps use composite struct keys in memory, so
//! the snapshot flattens them to entry lists that survive JSON.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checklist::{Cursor, RoomPlan};
use crate::models::issue::{Issue, Observation, PhotoAttachment, PhotoRef};
use crate::models::session::{
    AnswerKey, CheckResult, EvidenceKey, FinalRatings, WalkStatus,
};
use crate::session::state::WalkState;

/// Payloads at or below this size ride inside the snapshot as base64;
/// anything larger goes through the keyed blob channel.
pub const INLINE_PHOTO_LIMIT: usize = 48 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub key: AnswerKey,
    pub result: CheckResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitPhotoSlot {
    pub key: EvidenceKey,
    pub photo: PhotoAttachment,
}

/// Everything needed to resume a walk after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkSnapshot {
    pub id: String,
    pub status: WalkStatus,
    pub site: String,
    pub inspector: String,
    pub inspector_email: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cursor: Cursor,
    pub rooms: RoomPlan,
    pub answers: Vec<AnswerEntry>,
    pub issues: Vec<Issue>,
    pub observations: Vec<Observation>,
    pub exit_photos: Vec<ExitPhotoSlot>,
    pub final_ratings: Option<FinalRatings>,
}

impl From<&WalkState> for WalkSnapshot {
    fn from(state: &WalkState) -> Self {
        let mut answers: Vec<AnswerEntry> = state
            .answers
            .iter()
            .map(|(key, result)| AnswerEntry {
                key: key.clone(),
                result: *result,
            })
            .collect();
        // Stable row content for identical state.
        answers.sort_by(|a, b| {
            (&a.key.check_id, &a.key.room).cmp(&(&b.key.check_id, &b.key.room))
        });

        let mut exit_photos: Vec<ExitPhotoSlot> = state
            .exit_photos
            .iter()
            .map(|(key, photo)| ExitPhotoSlot {
                key: key.clone(),
                photo: photo.clone(),
            })
            .collect();
        exit_photos.sort_by(|a, b| {
            (&a.key.zone_id, &a.key.room).cmp(&(&b.key.zone_id, &b.key.room))
        });

        Self {
            id: state.id.clone(),
            status: state.status,
            site: state.site.clone(),
            inspector: state.inspector.clone(),
            inspector_email: state.inspector_email.clone(),
            started_at: state.started_at,
            ended_at: state.ended_at,
            cursor: state.cursor,
            rooms: state.rooms.clone(),
            answers,
            issues: state.issues.clone(),
            observations: state.observations.clone(),
            exit_photos,
            final_ratings: state.final_ratings.clone(),
        }
    }
}

impl WalkSnapshot {
    pub fn into_state(self) -> WalkState {
        WalkState {
            id: self.id,
            status: self.status,
            site: self.site,
            inspector: self.inspector,
            inspector_email: self.inspector_email,
            started_at: self.started_at,
            ended_at: self.ended_at,
            cursor: self.cursor,
            rooms: self.rooms,
            answers: self
                .answers
                .into_iter()
                .map(|entry| (entry.key, entry.result))
                .collect(),
            issues: self.issues,
            observations: self.observations,
            exit_photos: self
                .exit_photos
                .into_iter()
                .map(|slot| (slot.key, slot.photo))
                .collect(),
            final_ratings: self.final_ratings,
        }
    }
}

/// Wrap an incoming photo payload. Small payloads stay inline; oversized
/// ones come back with the bytes that must be written to the blob table.
/// Every call mints a fresh key, so a payload is owned by exactly the slot
/// it is attached to.
pub fn wrap_payload(payload: &[u8]) -> (PhotoAttachment, Option<(String, Vec<u8>)>) {
    let key = Uuid::new_v4().to_string();
    if payload.len() <= INLINE_PHOTO_LIMIT {
        (
            PhotoAttachment::Inline {
                key,
                data: BASE64.encode(payload),
            },
            None,
        )
    } else {
        (
            PhotoAttachment::Stored {
                photo: PhotoRef {
                    key: key.clone(),
                    byte_len: payload.len() as u64,
                },
            },
            Some((key, payload.to_vec())),
        )
    }
}

/// Replace any oversized inline payload with a stored reference, returning
/// the extracted blobs for the blob channel. Run on every snapshot before it
/// is handed to the snapshot repository.
pub fn scrub(snapshot: &mut WalkSnapshot) -> Vec<(String, Vec<u8>)> {
    let mut extracted = Vec::new();

    let mut scrub_one = |photo: &mut PhotoAttachment| {
        if let PhotoAttachment::Inline { key, data } = photo {
            let Ok(bytes) = BASE64.decode(data.as_bytes()) else {
                warn!("dropping undecodable inline photo {key}");
                return;
            };
            if bytes.len() > INLINE_PHOTO_LIMIT {
                let stored = PhotoAttachment::Stored {
                    photo: PhotoRef {
                        key: key.clone(),
                        byte_len: bytes.len() as u64,
                    },
                };
                extracted.push((key.clone(), bytes));
                *photo = stored;
            }
        }
    };

    for issue in &mut snapshot.issues {
        issue.photos.iter_mut().for_each(&mut scrub_one);
    }
    for observation in &mut snapshot.observations {
        observation.photos.iter_mut().for_each(&mut scrub_one);
    }
    for slot in &mut snapshot.exit_photos {
        scrub_one(&mut slot.photo);
    }

    extracted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::RoomId;

    #[test]
    fn state_round_trips_through_snapshot() {
        let mut state = WalkState::fresh();
        state.begin(
            "east-campus".into(),
            "Rowan".into(),
            "rowan@example.org".into(),
            RoomPlan::new(),
            Utc::now(),
        );
        state.set_answer(
            AnswerKey::in_room("c1", RoomId::new("classroom", "101")),
            CheckResult::Fail,
        );
        state.set_answer(AnswerKey::zone_wide("c2"), CheckResult::Pass);
        state.cursor.zone = 1;

        let snapshot = WalkSnapshot::from(&state);
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: WalkSnapshot = serde_json::from_str(&json).unwrap();
        let restored = restored.into_state();

        assert_eq!(restored.id, state.id);
        assert_eq!(restored.status, state.status);
        assert_eq!(restored.cursor, state.cursor);
        assert_eq!(restored.answers, state.answers);
        assert_eq!(restored.site, state.site);
    }

    #[test]
    fn small_payloads_stay_inline_and_large_ones_are_stored() {
        let (small, blob) = wrap_payload(&[1u8; 64]);
        assert!(matches!(small, PhotoAttachment::Inline { .. }));
        assert!(blob.is_none());

        let (large, blob) = wrap_payload(&vec![2u8; INLINE_PHOTO_LIMIT + 1]);
        let (key, bytes) = blob.expect("oversized payload must be extracted");
        assert_eq!(bytes.len(), INLINE_PHOTO_LIMIT + 1);
        match large {
            PhotoAttachment::Stored { photo } => {
                assert_eq!(photo.key, key);
                assert_eq!(photo.byte_len as usize, bytes.len());
            }
            PhotoAttachment::Inline { .. } => panic!("payload should not be inline"),
        }
    }

    #[test]
    fn scrub_moves_oversized_inline_photos_to_the_blob_channel() {
        let mut state = WalkState::fresh();
        state.begin(
            "east-campus".into(),
            "Rowan".into(),
            "rowan@example.org".into(),
            RoomPlan::new(),
            Utc::now(),
        );
        let oversized = BASE64.encode(vec![3u8; INLINE_PHOTO_LIMIT * 2]);
        state.exit_photos.insert(
            EvidenceKey::zone("gym"),
            PhotoAttachment::Inline {
                key: "big".into(),
                data: oversized,
            },
        );

        let mut snapshot = WalkSnapshot::from(&state);
        let blobs = scrub(&mut snapshot);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].0, "big");
        assert!(matches!(
            snapshot.exit_photos[0].photo,
            PhotoAttachment::Stored { .. }
        ));

        // Fresh keys per attachment keep photo ownership unambiguous.
        let (a, _) = wrap_payload(&[0u8; 8]);
        let (b, _) = wrap_payload(&[0u8; 8]);
        assert_ne!(a.key(), b.key());
    }
}
