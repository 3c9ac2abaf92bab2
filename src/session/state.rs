//! In-memory walk state: the single authoritative copy of one inspection run.
//!
//! All mutation happens through the methods here; the controller wraps them
//! with validation, persistence, and export wiring. Methods are synchronous
//! and pure over their inputs so the whole state machine is testable without
//! storage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::checklist::{ChecklistDefinition, Cursor, RoomPlan, Traversal, TraversalShape, Zone};
use crate::evidence::{
    clamp_note, evidence_gaps, issues_satisfy_evidence_policy, needs_exit_photo,
};
use crate::models::issue::{
    Issue, IssueUpdate, Observation, ObservationCategory, PhotoAttachment,
};
use crate::models::session::{
    AnswerKey, CheckResult, CompletedWalk, EvidenceKey, ExitPhotoEntry, FinalRatings, RoomId,
    WalkStatus, ZoneRatingEntry,
};
use crate::rating::{rate_session, rate_zone, RatingPolicy};

/// Why a requested transition is currently refused. Soft: the operator fixes
/// the gap and retries, nothing is thrown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    UnansweredChecks { count: usize },
    EvidencePolicy { issues_missing: usize },
    ExitPhoto { key: EvidenceKey },
}

#[derive(Debug, Clone)]
pub struct WalkState {
    pub id: String,
    pub status: WalkStatus,
    pub site: String,
    pub inspector: String,
    pub inspector_email: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cursor: Cursor,
    pub rooms: RoomPlan,
    pub answers: HashMap<AnswerKey, CheckResult>,
    pub issues: Vec<Issue>,
    pub observations: Vec<Observation>,
    pub exit_photos: HashMap<EvidenceKey, PhotoAttachment>,
    pub final_ratings: Option<FinalRatings>,
}

impl Default for WalkState {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: WalkStatus::NotStarted,
            site: String::new(),
            inspector: String::new(),
            inspector_email: String::new(),
            started_at: Utc::now(),
            ended_at: None,
            cursor: Cursor::origin(),
            rooms: RoomPlan::new(),
            answers: HashMap::new(),
            issues: Vec::new(),
            observations: Vec::new(),
            exit_photos: HashMap::new(),
            final_ratings: None,
        }
    }
}

impl WalkState {
    pub fn fresh() -> Self {
        Self::default()
    }

    pub fn begin(
        &mut self,
        site: String,
        inspector: String,
        inspector_email: String,
        rooms: RoomPlan,
        started_at: DateTime<Utc>,
    ) {
        *self = Self {
            id: Uuid::new_v4().to_string(),
            status: WalkStatus::InProgress,
            site,
            inspector,
            inspector_email,
            started_at,
            rooms,
            ..Self::default()
        };
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, WalkStatus::InProgress | WalkStatus::Reviewing)
    }

    pub fn current_zone<'a>(&self, def: &'a ChecklistDefinition) -> &'a Zone {
        &def.zones[self.cursor.zone]
    }

    /// Room the cursor currently sits in, for room-qualified shapes.
    pub fn current_room(&self, def: &ChecklistDefinition) -> Option<RoomId> {
        match def.shape {
            TraversalShape::FlatZones => None,
            TraversalShape::ZonesWithRooms | TraversalShape::LinearStops => {
                let zone = self.current_zone(def);
                self.rooms.rooms_for(&zone.id).get(self.cursor.room).cloned()
            }
        }
    }

    pub fn set_answer(&mut self, key: AnswerKey, result: CheckResult) {
        self.answers.insert(key, result);
    }

    pub fn issue_for(&self, check_id: &str, room: Option<&RoomId>) -> Option<&Issue> {
        self.issues
            .iter()
            .find(|i| i.check_id == check_id && i.room.as_ref() == room)
    }

    /// Create the issue for a check/room key, or merge the update into the
    /// existing one. Severity tier and the photo requirement are stamped from
    /// the definition exactly once, at creation. Notes replace (clamped to
    /// the kind's cap); remediation replaces; photos only ever append via
    /// [`WalkState::attach_photo_to_issue`]. Re-failing an already documented
    /// check therefore never duplicates its issue.
    pub fn upsert_issue(
        &mut self,
        def: &ChecklistDefinition,
        check_id: &str,
        room: Option<RoomId>,
        update: IssueUpdate,
        note_limit: usize,
        now: DateTime<Utc>,
    ) -> Option<&Issue> {
        let existing = self
            .issues
            .iter()
            .position(|i| i.check_id == check_id && i.room == room);

        let idx = match existing {
            Some(idx) => idx,
            None => {
                let (zone, check) = def.find_check(check_id)?;
                self.issues.push(Issue::new(
                    check_id,
                    zone.id.clone(),
                    room,
                    check.tier,
                    check.photo_required,
                    now,
                ));
                self.issues.len() - 1
            }
        };

        let issue = &mut self.issues[idx];
        if let Some(note) = update.note {
            issue.note = clamp_note(&note, note_limit);
        }
        if let Some(remediation) = update.remediation {
            issue.remediation = Some(remediation);
        }
        Some(&self.issues[idx])
    }

    pub fn remove_issue(&mut self, issue_id: &str) -> bool {
        let before = self.issues.len();
        self.issues.retain(|i| i.id != issue_id);
        self.issues.len() != before
    }

    pub fn add_observation(
        &mut self,
        category: ObservationCategory,
        team: String,
        tier: u8,
        description: String,
        now: DateTime<Utc>,
    ) -> &Observation {
        self.observations
            .push(Observation::new(category, team, tier, description, now));
        self.observations.last().expect("just pushed")
    }

    pub fn attach_photo_to_issue(&mut self, issue_id: &str, photo: PhotoAttachment) -> bool {
        match self.issues.iter_mut().find(|i| i.id == issue_id) {
            Some(issue) => {
                issue.photos.push(photo);
                true
            }
            None => false,
        }
    }

    pub fn attach_photo_to_observation(
        &mut self,
        observation_id: &str,
        photo: PhotoAttachment,
    ) -> bool {
        match self
            .observations
            .iter_mut()
            .find(|o| o.id == observation_id)
        {
            Some(observation) => {
                observation.photos.push(photo);
                true
            }
            None => false,
        }
    }

    /// Record the proof-of-presence photo for a unit. One slot per unit; a
    /// retake replaces the previous photo.
    pub fn set_exit_photo(&mut self, key: EvidenceKey, photo: PhotoAttachment) {
        self.exit_photos.insert(key, photo);
    }

    /// Required checks of the current unit that have no recorded answer.
    fn unit_unanswered(&self, def: &ChecklistDefinition) -> usize {
        let zone = self.current_zone(def);
        match def.shape {
            TraversalShape::FlatZones => zone
                .required_checks()
                .filter(|c| {
                    !self
                        .answers
                        .contains_key(&AnswerKey::zone_wide(c.id.clone()))
                })
                .count(),
            TraversalShape::ZonesWithRooms => {
                let room = self.current_room(def);
                zone.required_checks()
                    .filter(|c| !self.answers.contains_key(&self.key_in(&c.id, &room)))
                    .count()
            }
            TraversalShape::LinearStops => {
                let room = self.current_room(def);
                match zone.checks().nth(self.cursor.check) {
                    Some(check) if !check.optional => {
                        if self.answers.contains_key(&self.key_in(&check.id, &room)) {
                            0
                        } else {
                            1
                        }
                    }
                    _ => 0,
                }
            }
        }
    }

    fn key_in(&self, check_id: &str, room: &Option<RoomId>) -> AnswerKey {
        AnswerKey {
            check_id: check_id.to_string(),
            room: room.clone(),
        }
    }

    /// True iff every non-optional check of the current traversal unit has a
    /// recorded answer.
    pub fn is_current_unit_complete(&self, def: &ChecklistDefinition) -> bool {
        self.unit_unanswered(def) == 0
    }

    /// Required answers still missing across the whole traversal.
    pub fn unanswered_required(&self, def: &ChecklistDefinition) -> usize {
        let mut missing = 0;
        for zone in &def.zones {
            let rooms = match def.shape {
                TraversalShape::FlatZones => Vec::new(),
                _ => self.rooms.rooms_for(&zone.id).to_vec(),
            };
            for check in zone.required_checks() {
                if rooms.is_empty() {
                    if !self
                        .answers
                        .contains_key(&AnswerKey::zone_wide(check.id.clone()))
                    {
                        missing += 1;
                    }
                } else {
                    for room in &rooms {
                        if !self
                            .answers
                            .contains_key(&AnswerKey::in_room(check.id.clone(), room.clone()))
                        {
                            missing += 1;
                        }
                    }
                }
            }
        }
        missing
    }

    /// Whatever currently prevents the cursor from moving forward out of the
    /// current unit, if anything.
    pub fn advance_blocker(
        &self,
        def: &ChecklistDefinition,
        policy: &RatingPolicy,
    ) -> Option<Blocker> {
        let unanswered = self.unit_unanswered(def);
        if unanswered > 0 {
            return Some(Blocker::UnansweredChecks { count: unanswered });
        }

        let traversal = Traversal::new(def, &self.rooms);
        if traversal.leaving_room(self.cursor) {
            let zone = self.current_zone(def);
            let room = self.current_room(def);
            if needs_exit_photo(
                zone,
                room.as_ref(),
                &self.answers,
                &self.issues,
                policy,
                self.started_at.date_naive(),
                &self.exit_photos,
            ) {
                let key = match room {
                    Some(room) => EvidenceKey::room(zone.id.clone(), room),
                    None => EvidenceKey::zone(zone.id.clone()),
                };
                return Some(Blocker::ExitPhoto { key });
            }
        }

        None
    }

    /// Whatever currently prevents finalization, if anything.
    pub fn finalize_blocker(
        &self,
        def: &ChecklistDefinition,
        policy: &RatingPolicy,
    ) -> Option<Blocker> {
        let missing = self.unanswered_required(def);
        if missing > 0 {
            return Some(Blocker::UnansweredChecks { count: missing });
        }

        if !issues_satisfy_evidence_policy(&self.issues) {
            return Some(Blocker::EvidencePolicy {
                issues_missing: evidence_gaps(&self.issues).len(),
            });
        }

        for zone in &def.zones {
            let rooms = match def.shape {
                TraversalShape::FlatZones => Vec::new(),
                _ => self.rooms.rooms_for(&zone.id).to_vec(),
            };
            let units: Vec<Option<RoomId>> = if rooms.is_empty() {
                vec![None]
            } else {
                rooms.into_iter().map(Some).collect()
            };
            for unit in units {
                if needs_exit_photo(
                    zone,
                    unit.as_ref(),
                    &self.answers,
                    &self.issues,
                    policy,
                    self.started_at.date_naive(),
                    &self.exit_photos,
                ) {
                    let key = match unit {
                        Some(room) => EvidenceKey::room(zone.id.clone(), room),
                        None => EvidenceKey::zone(zone.id.clone()),
                    };
                    return Some(Blocker::ExitPhoto { key });
                }
            }
        }

        None
    }

    /// Compute and stamp the final ratings. Pure over answers and issues;
    /// recomputing from the same inputs yields the same result.
    pub fn compute_final_ratings(
        &self,
        def: &ChecklistDefinition,
        policy: &RatingPolicy,
    ) -> FinalRatings {
        let walk_date = self.started_at.date_naive();
        let zones: Vec<ZoneRatingEntry> = def
            .zones
            .iter()
            .map(|zone| {
                let rooms = match def.shape {
                    TraversalShape::FlatZones => Vec::new(),
                    _ => self.rooms.rooms_for(&zone.id).to_vec(),
                };
                ZoneRatingEntry {
                    zone_id: zone.id.clone(),
                    rating: rate_zone(zone, &rooms, &self.answers, &self.issues, policy, walk_date),
                }
            })
            .collect();

        let ratings: Vec<_> = zones.iter().map(|z| z.rating).collect();
        let overall = rate_session(&ratings, &self.issues, policy);

        FinalRatings { zones, overall }
    }

    /// Build the read-only summary for export. Call after ratings are
    /// stamped and `ended_at` is set.
    pub fn to_completed(&self, def: &ChecklistDefinition) -> CompletedWalk {
        let ended_at = self.ended_at.unwrap_or(self.started_at);
        CompletedWalk {
            id: self.id.clone(),
            kind: def.kind,
            site: self.site.clone(),
            inspector: self.inspector.clone(),
            inspector_email: self.inspector_email.clone(),
            started_at: self.started_at,
            ended_at,
            duration_secs: (ended_at - self.started_at).num_seconds(),
            ratings: self
                .final_ratings
                .clone()
                .unwrap_or_else(|| self.compute_final_ratings(def, &RatingPolicy::for_kind(def.kind))),
            issues: self.issues.clone(),
            observations: self.observations.clone(),
            exit_photos: self
                .exit_photos
                .iter()
                .map(|(key, photo)| ExitPhotoEntry {
                    key: key.clone(),
                    photo: photo.photo_ref(),
                })
                .collect(),
        }
    }
}
