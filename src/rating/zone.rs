//! Zone rating: pure mapping from answers and issues to GREEN/AMBER/RED.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::checklist::{Check, Zone, ZoneKind};
use crate::models::issue::Issue;
use crate::models::session::{AnswerKey, CheckResult, RoomId};
use crate::rating::config::RatingPolicy;

/// Severity of a zone. Ordering matters: RED dominates AMBER dominates GREEN.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ZoneRating {
    Green,
    Amber,
    Red,
}

impl ZoneRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneRating::Green => "GREEN",
            ZoneRating::Amber => "AMBER",
            ZoneRating::Red => "RED",
        }
    }
}

/// Every answer recorded for one check across the unit's rooms. A zone-wide
/// check reads the room-less key; a room-based zone reads one key per room,
/// so a single failing room drags the whole zone (worst room wins).
fn answers_for<'a>(
    check: &Check,
    rooms: &[RoomId],
    answers: &'a HashMap<AnswerKey, CheckResult>,
) -> Vec<Option<&'a CheckResult>> {
    if rooms.is_empty() {
        vec![answers.get(&AnswerKey::zone_wide(check.id.clone()))]
    } else {
        rooms
            .iter()
            .map(|room| answers.get(&AnswerKey::in_room(check.id.clone(), room.clone())))
            .collect()
    }
}

fn any_fail(check: &Check, rooms: &[RoomId], answers: &HashMap<AnswerKey, CheckResult>) -> bool {
    answers_for(check, rooms, answers)
        .into_iter()
        .flatten()
        .any(CheckResult::is_fail)
}

fn any_unanswered(
    check: &Check,
    rooms: &[RoomId],
    answers: &HashMap<AnswerKey, CheckResult>,
) -> bool {
    answers_for(check, rooms, answers)
        .into_iter()
        .any(|a| a.is_none())
}

fn remediation_in_order(issue: &Issue, walk_date: NaiveDate, day_limit: i64) -> bool {
    match &issue.remediation {
        Some(r) if !r.owner.trim().is_empty() => {
            let days = (r.due - walk_date).num_days();
            (0..=day_limit).contains(&days)
        }
        _ => false,
    }
}

/// Rate one zone. Never fails: a zone with unanswered required checks rates
/// least favorable (upstream gating keeps finalize unreachable in that case).
pub fn rate_zone(
    zone: &Zone,
    rooms: &[RoomId],
    answers: &HashMap<AnswerKey, CheckResult>,
    issues: &[Issue],
    policy: &RatingPolicy,
    walk_date: NaiveDate,
) -> ZoneRating {
    match zone.kind {
        ZoneKind::ObservationOnly => return ZoneRating::Green,
        ZoneKind::Governance => {
            let tier1_failed = zone
                .checks()
                .filter(|c| c.tier == 1 || c.instant_red)
                .any(|c| any_fail(c, rooms, answers));
            return if tier1_failed {
                ZoneRating::Red
            } else {
                ZoneRating::Green
            };
        }
        ZoneKind::Standard => {}
    }

    // An instant-red failure is absolute; nothing downgrades it.
    if zone
        .checks()
        .filter(|c| c.instant_red)
        .any(|c| any_fail(c, rooms, answers))
    {
        return ZoneRating::Red;
    }

    if zone
        .required_checks()
        .any(|c| any_unanswered(c, rooms, answers))
    {
        return ZoneRating::Red;
    }

    let zone_issues: Vec<&Issue> = issues.iter().filter(|i| i.zone_id == zone.id).collect();
    if zone_issues.is_empty() {
        return ZoneRating::Green;
    }

    let within_count = zone_issues.len() <= policy.amber_issue_limit;
    let within_remediation = match policy.remediation_day_limit {
        Some(limit) => zone_issues
            .iter()
            .all(|i| remediation_in_order(i, walk_date, limit)),
        None => true,
    };

    if within_count && within_remediation {
        ZoneRating::Amber
    } else {
        ZoneRating::Red
    }
}
