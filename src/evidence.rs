//! Evidence policy: what a walk must document before it may finalize.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::checklist::Zone;
use crate::models::issue::{Issue, PhotoAttachment};
use crate::models::session::{AnswerKey, CheckResult, EvidenceKey, RoomId};
use crate::rating::{rate_zone, RatingPolicy, ZoneRating};

/// True when an issue carries everything the policy demands: a written
/// explanation, plus at least one photo when the failed check requires one.
pub fn issue_evidence_complete(issue: &Issue) -> bool {
    if issue.note.trim().is_empty() {
        return false;
    }
    if issue.photo_required && issue.photos.is_empty() {
        return false;
    }
    true
}

/// Gate for leaving `InProgress`/`Reviewing`: every issue in the ledger must
/// satisfy the evidence policy.
pub fn issues_satisfy_evidence_policy(issues: &[Issue]) -> bool {
    issues.iter().all(issue_evidence_complete)
}

/// Issues still missing evidence, for surfacing to the operator.
pub fn evidence_gaps(issues: &[Issue]) -> Vec<&Issue> {
    issues
        .iter()
        .filter(|i| !issue_evidence_complete(i))
        .collect()
}

/// True when this unit rates GREEN (computed without regard to the photo
/// itself) and no proof-of-presence photo has been recorded for it yet.
/// GREEN is the one rating with no issue evidence, so these kinds demand a
/// photo proving the unit was actually visited.
pub fn needs_exit_photo(
    zone: &Zone,
    unit_room: Option<&RoomId>,
    answers: &HashMap<AnswerKey, CheckResult>,
    issues: &[Issue],
    policy: &RatingPolicy,
    walk_date: NaiveDate,
    exit_photos: &HashMap<EvidenceKey, PhotoAttachment>,
) -> bool {
    if !zone.exit_photo_required {
        return false;
    }

    let key = match unit_room {
        Some(room) => EvidenceKey::room(zone.id.clone(), room.clone()),
        None => EvidenceKey::zone(zone.id.clone()),
    };
    if exit_photos.contains_key(&key) {
        return false;
    }

    let rooms: Vec<RoomId> = unit_room.cloned().into_iter().collect();
    let unit_issues: Vec<Issue> = issues
        .iter()
        .filter(|i| {
            i.zone_id == zone.id
                && match unit_room {
                    Some(room) => i.room.as_ref() == Some(room),
                    None => true,
                }
        })
        .cloned()
        .collect();

    rate_zone(zone, &rooms, answers, &unit_issues, policy, walk_date) == ZoneRating::Green
}

/// Clamp an operator note to the kind's length cap, on a char boundary.
pub fn clamp_note(note: &str, limit: usize) -> String {
    note.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{Check, Section, ZoneKind};
    use chrono::Utc;

    fn issue(note: &str, photo_required: bool, photo_count: usize) -> Issue {
        let mut issue = Issue::new("c1", "z1", None, 2, photo_required, Utc::now());
        issue.note = note.into();
        for n in 0..photo_count {
            issue.photos.push(PhotoAttachment::Stored {
                photo: crate::models::issue::PhotoRef {
                    key: format!("p{n}"),
                    byte_len: 10,
                },
            });
        }
        issue
    }

    #[test]
    fn policy_requires_note_and_conditional_photo() {
        assert!(issue_evidence_complete(&issue("broken hinge", false, 0)));
        assert!(issue_evidence_complete(&issue("broken hinge", true, 1)));
        assert!(!issue_evidence_complete(&issue("", false, 0)));
        assert!(!issue_evidence_complete(&issue("   ", false, 0)));
        assert!(!issue_evidence_complete(&issue("broken hinge", true, 0)));

        let issues = vec![issue("ok", false, 0), issue("needs photo", true, 0)];
        assert!(!issues_satisfy_evidence_policy(&issues));
        assert_eq!(evidence_gaps(&issues).len(), 1);
    }

    #[test]
    fn green_unit_without_photo_needs_one() {
        let zone = Zone {
            id: "gym".into(),
            name: "Gym".into(),
            kind: ZoneKind::Standard,
            sections: vec![Section {
                id: "s".into(),
                title: "s".into(),
                checks: vec![Check {
                    id: "c1".into(),
                    prompt: "c1".into(),
                    tier: 2,
                    instant_red: false,
                    photo_required: false,
                    optional: false,
                }],
            }],
            min_rooms: 0,
            exit_photo_required: true,
        };
        let mut answers = HashMap::new();
        answers.insert(AnswerKey::zone_wide("c1"), CheckResult::Pass);
        let policy = RatingPolicy::default();
        let walk_date = Utc::now().date_naive();
        let mut photos = HashMap::new();

        assert!(needs_exit_photo(
            &zone, None, &answers, &[], &policy, walk_date, &photos
        ));

        photos.insert(
            EvidenceKey::zone("gym"),
            PhotoAttachment::Stored {
                photo: crate::models::issue::PhotoRef {
                    key: "k".into(),
                    byte_len: 1,
                },
            },
        );
        assert!(!needs_exit_photo(
            &zone, None, &answers, &[], &policy, walk_date, &photos
        ));

        // A non-green unit never needs the exit photo.
        answers.insert(AnswerKey::zone_wide("c1"), CheckResult::Fail);
        let failing = vec![issue("dirty floor", false, 0)];
        let mut red_issue = failing[0].clone();
        red_issue.zone_id = "gym".into();
        assert!(!needs_exit_photo(
            &zone,
            None,
            &answers,
            &[red_issue],
            &policy,
            walk_date,
            &HashMap::new()
        ));
    }

    #[test]
    fn note_clamps_on_char_boundary() {
        assert_eq!(clamp_note("short", 100), "short");
        assert_eq!(clamp_note("abcdef", 3), "abc");
        // Multibyte input must not split a character.
        assert_eq!(clamp_note("héllo", 2), "hé");
    }
}
