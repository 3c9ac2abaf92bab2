//! Walk controller: the operation surface the shell drives.
//!
//! Owns the in-memory state behind a mutex, validates caller input, and
//! mirrors every mutation into durable storage with fire-and-forget writes.
//! The in-memory state stays authoritative; a failed write is logged and the
//! operator never sees it.

use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::Mutex;

use crate::checklist::{ChecklistDefinition, Cursor, RoomPlan, Traversal};
use crate::db::{Database, SnapshotRow};
use crate::error::{WalkError, WalkResult};
use crate::export::ExportDispatcher;
use crate::models::issue::{Issue, IssueUpdate, Observation, ObservationCategory, PhotoRef};
use crate::models::session::{
    AnswerKey, CheckResult, CompletedWalk, EvidenceKey, RoomId, WalkStatus,
};
use crate::persist::{restore_decision, scrub, wrap_payload, RestoreDecision, WalkSnapshot};
use crate::rating::RatingPolicy;
use crate::session::state::{Blocker, WalkState};

/// Identity and room selection for a new walk.
#[derive(Debug, Clone)]
pub struct BeginWalk {
    pub site: String,
    pub inspector: String,
    pub inspector_email: String,
    pub rooms: RoomPlan,
}

/// Result of an advance request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(Cursor),
    /// The current unit is not done; fix the gap and retry.
    Blocked(Blocker),
    /// Already on the last unit. If the walk is fully answered the status has
    /// moved to `Reviewing`; call `finalize` next.
    EndOfWalk,
}

/// Result of a finalize request.
#[derive(Debug, Clone)]
pub enum FinalizeOutcome {
    Completed(CompletedWalk),
    Blocked(Blocker),
}

/// Where an incoming photo payload attaches.
#[derive(Debug, Clone)]
pub enum PhotoSlot {
    Issue { issue_id: String },
    Observation { observation_id: String },
    ExitEvidence { key: EvidenceKey },
}

pub struct WalkController {
    def: Arc<ChecklistDefinition>,
    policy: RatingPolicy,
    state: Arc<Mutex<WalkState>>,
    db: Database,
    exports: Arc<ExportDispatcher>,
}

fn plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

impl WalkController {
    /// Validate the definition, then restore a same-day unfinished walk from
    /// storage or start from an empty state.
    pub async fn open(
        def: ChecklistDefinition,
        db: Database,
        exports: ExportDispatcher,
    ) -> WalkResult<Self> {
        let policy = RatingPolicy::for_kind(def.kind);
        Self::open_with_policy(def, policy, db, exports).await
    }

    pub async fn open_with_policy(
        def: ChecklistDefinition,
        policy: RatingPolicy,
        db: Database,
        exports: ExportDispatcher,
    ) -> WalkResult<Self> {
        def.validate()?;

        let state = Self::restore(&def, &db).await;

        Ok(Self {
            def: Arc::new(def),
            policy,
            state: Arc::new(Mutex::new(state)),
            db,
            exports: Arc::new(exports),
        })
    }

    async fn restore(def: &ChecklistDefinition, db: &Database) -> WalkState {
        let row = match db.load_snapshot(def.kind).await {
            Ok(row) => row,
            Err(err) => {
                // Durability is best-effort in both directions.
                warn!("Could not read stored walk: {err:#}");
                return WalkState::fresh();
            }
        };

        let Some(row) = row else {
            return WalkState::fresh();
        };

        match restore_decision(row.started_at, Utc::now(), row.complete) {
            RestoreDecision::Resume => match serde_json::from_str::<WalkSnapshot>(&row.payload) {
                Ok(snapshot) => {
                    let state = snapshot.into_state();
                    let traversal = Traversal::new(def, &state.rooms);
                    if !traversal.in_bounds(state.cursor) {
                        warn!("Stored walk cursor is out of bounds; starting fresh");
                        return WalkState::fresh();
                    }
                    info!(
                        "Resumed {} walk {} started at {}",
                        def.kind.as_str(),
                        state.id,
                        state.started_at
                    );
                    state
                }
                Err(err) => {
                    warn!("Stored walk snapshot is unreadable: {err}");
                    WalkState::fresh()
                }
            },
            decision => {
                info!(
                    "Discarding stored {} walk ({:?})",
                    def.kind.as_str(),
                    decision
                );
                let kind = def.kind;
                db.execute_detached("discard stale walk", move |conn| {
                    conn.execute(
                        "DELETE FROM walk_snapshots WHERE kind = ?1",
                        rusqlite::params![kind.as_str()],
                    )?;
                    conn.execute(
                        "DELETE FROM photo_blobs WHERE walk_kind = ?1",
                        rusqlite::params![kind.as_str()],
                    )?;
                    Ok(())
                });
                WalkState::fresh()
            }
        }
    }

    pub fn definition(&self) -> &ChecklistDefinition {
        &self.def
    }

    pub fn policy(&self) -> &RatingPolicy {
        &self.policy
    }

    pub async fn state(&self) -> WalkState {
        self.state.lock().await.clone()
    }

    pub async fn status(&self) -> WalkStatus {
        self.state.lock().await.status
    }

    pub async fn cursor(&self) -> Cursor {
        self.state.lock().await.cursor
    }

    fn persist_locked(&self, state: &WalkState) {
        let mut snapshot = WalkSnapshot::from(state);
        for (key, bytes) in scrub(&mut snapshot) {
            self.db.store_photo_detached(key, self.def.kind, bytes);
        }

        match serde_json::to_string(&snapshot) {
            Ok(payload) => self.db.save_snapshot_detached(SnapshotRow {
                kind: self.def.kind,
                payload,
                started_at: state.started_at,
                complete: state.status == WalkStatus::Complete,
                updated_at: Utc::now(),
            }),
            Err(err) => error!("Could not serialize walk snapshot: {err}"),
        }
    }

    fn validate_begin(&self, input: &BeginWalk) -> WalkResult<()> {
        if input.site.trim().is_empty() {
            return Err(WalkError::validation("site is required"));
        }
        if input.inspector.trim().is_empty() {
            return Err(WalkError::validation("inspector name is required"));
        }
        if !plausible_email(&input.inspector_email) {
            return Err(WalkError::validation(format!(
                "'{}' is not a usable email address",
                input.inspector_email
            )));
        }

        for zone in &self.def.zones {
            let assigned = input.rooms.rooms_for(&zone.id).len();
            if assigned < zone.min_rooms {
                return Err(WalkError::validation(format!(
                    "zone '{}' needs at least {} rooms, got {}",
                    zone.id, zone.min_rooms, assigned
                )));
            }
        }

        Ok(())
    }

    /// Start a new walk with the cursor on the first unit.
    pub async fn begin(&self, input: BeginWalk) -> WalkResult<String> {
        self.validate_begin(&input)?;

        let mut state = self.state.lock().await;
        if state.is_open() {
            return Err(WalkError::invalid_state(
                "a walk is already in progress; reset it first",
            ));
        }

        state.begin(
            input.site,
            input.inspector,
            input.inspector_email,
            input.rooms,
            Utc::now(),
        );
        self.persist_locked(&state);
        info!(
            "Started {} walk {} at {}",
            self.def.kind.as_str(),
            state.id,
            state.site
        );
        Ok(state.id.clone())
    }

    fn require_open(state: &WalkState) -> WalkResult<()> {
        if state.is_open() {
            Ok(())
        } else {
            Err(WalkError::invalid_state(format!(
                "walk is {}",
                state.status.as_str()
            )))
        }
    }

    /// Record a pass/fail answer. Recording never touches the issue ledger:
    /// a fail is documented via `upsert_issue` once the operator has filled
    /// the evidence form, and a pass leaves any existing issue in place until
    /// `remove_issue` is called.
    pub async fn record_answer(
        &self,
        check_id: &str,
        room: Option<RoomId>,
        result: CheckResult,
    ) -> WalkResult<()> {
        let mut state = self.state.lock().await;
        Self::require_open(&state)?;

        let (zone, _check) = self
            .def
            .find_check(check_id)
            .ok_or_else(|| WalkError::validation(format!("unknown check '{check_id}'")))?;

        if let Some(room) = &room {
            if !state.rooms.rooms_for(&zone.id).contains(room) {
                return Err(WalkError::validation(format!(
                    "room '{}' is not part of zone '{}'",
                    room.label(),
                    zone.id
                )));
            }
        }

        let key = AnswerKey {
            check_id: check_id.to_string(),
            room,
        };
        state.set_answer(key, result);
        self.persist_locked(&state);
        Ok(())
    }

    /// Create or update the issue documenting a failed check.
    pub async fn upsert_issue(
        &self,
        check_id: &str,
        room: Option<RoomId>,
        update: IssueUpdate,
    ) -> WalkResult<Issue> {
        let mut state = self.state.lock().await;
        Self::require_open(&state)?;

        let issue = state
            .upsert_issue(
                &self.def,
                check_id,
                room,
                update,
                self.policy.note_limit,
                Utc::now(),
            )
            .ok_or_else(|| WalkError::validation(format!("unknown check '{check_id}'")))?
            .clone();
        self.persist_locked(&state);
        Ok(issue)
    }

    /// Drop an issue, typically after the operator reversed a fail to a pass.
    pub async fn remove_issue(&self, issue_id: &str) -> WalkResult<bool> {
        let mut state = self.state.lock().await;
        Self::require_open(&state)?;

        let removed = state.remove_issue(issue_id);
        if removed {
            self.persist_locked(&state);
        }
        Ok(removed)
    }

    /// File a cross-team observation at the current stop.
    pub async fn record_observation(
        &self,
        category: ObservationCategory,
        team: &str,
        tier: u8,
        description: &str,
    ) -> WalkResult<Observation> {
        let mut state = self.state.lock().await;
        Self::require_open(&state)?;

        if description.trim().is_empty() {
            return Err(WalkError::validation("observation needs a description"));
        }

        let description =
            crate::evidence::clamp_note(description, self.policy.note_limit);
        let observation = state
            .add_observation(category, team.to_string(), tier, description, Utc::now())
            .clone();
        self.persist_locked(&state);
        Ok(observation)
    }

    /// Attach a photo payload to an issue, an observation, or a unit's
    /// proof-of-presence slot. The payload is opaque; oversized ones move to
    /// the blob table immediately.
    pub async fn attach_photo(&self, slot: PhotoSlot, payload: &[u8]) -> WalkResult<PhotoRef> {
        if payload.is_empty() {
            return Err(WalkError::validation("photo payload is empty"));
        }

        let mut state = self.state.lock().await;
        Self::require_open(&state)?;

        let (attachment, blob) = wrap_payload(payload);
        let photo_ref = attachment.photo_ref();

        let attached = match &slot {
            PhotoSlot::Issue { issue_id } => state.attach_photo_to_issue(issue_id, attachment),
            PhotoSlot::Observation { observation_id } => {
                state.attach_photo_to_observation(observation_id, attachment)
            }
            PhotoSlot::ExitEvidence { key } => {
                state.set_exit_photo(key.clone(), attachment);
                true
            }
        };
        if !attached {
            return Err(WalkError::validation("photo target does not exist"));
        }

        if let Some((key, bytes)) = blob {
            self.db.store_photo_detached(key, self.def.kind, bytes);
        }
        self.persist_locked(&state);
        Ok(photo_ref)
    }

    pub async fn is_current_unit_complete(&self) -> bool {
        let state = self.state.lock().await;
        state.is_current_unit_complete(&self.def)
    }

    /// Move the cursor one unit forward, subject to completion and
    /// exit-photo gating.
    pub async fn advance(&self) -> WalkResult<Advance> {
        let mut state = self.state.lock().await;
        Self::require_open(&state)?;

        if let Some(blocker) = state.advance_blocker(&self.def, &self.policy) {
            return Ok(Advance::Blocked(blocker));
        }

        let traversal = Traversal::new(&self.def, &state.rooms);
        match traversal.advance(state.cursor) {
            Some(next) => {
                state.cursor = next;
                self.persist_locked(&state);
                Ok(Advance::Moved(next))
            }
            None => {
                if state.status == WalkStatus::InProgress
                    && state.finalize_blocker(&self.def, &self.policy).is_none()
                {
                    state.status = WalkStatus::Reviewing;
                    self.persist_locked(&state);
                }
                Ok(Advance::EndOfWalk)
            }
        }
    }

    /// Move the cursor one unit back; a no-op at the first unit. Stepping
    /// back out of review reopens the walk.
    pub async fn retreat(&self) -> WalkResult<Cursor> {
        let mut state = self.state.lock().await;
        Self::require_open(&state)?;

        if state.status == WalkStatus::Reviewing {
            state.status = WalkStatus::InProgress;
        }
        let traversal = Traversal::new(&self.def, &state.rooms);
        let previous = traversal.retreat(state.cursor);
        if previous != state.cursor {
            state.cursor = previous;
        }
        self.persist_locked(&state);
        Ok(previous)
    }

    /// Complete the walk: compute final ratings, stamp the end time, persist,
    /// and hand the summary to the export sinks. Callable exactly once.
    pub async fn finalize(&self) -> WalkResult<FinalizeOutcome> {
        let mut state = self.state.lock().await;
        match state.status {
            WalkStatus::Complete => {
                return Err(WalkError::invalid_state("walk is already finalized"))
            }
            WalkStatus::NotStarted => {
                return Err(WalkError::invalid_state("walk has not been started"))
            }
            WalkStatus::InProgress | WalkStatus::Reviewing => {}
        }

        if let Some(blocker) = state.finalize_blocker(&self.def, &self.policy) {
            return Ok(FinalizeOutcome::Blocked(blocker));
        }

        state.final_ratings = Some(state.compute_final_ratings(&self.def, &self.policy));
        state.ended_at = Some(Utc::now());
        state.status = WalkStatus::Complete;

        let completed = state.to_completed(&self.def);

        // The final snapshot is the one write worth waiting for; losing it
        // would resurrect a finished walk on the next restore check.
        let mut snapshot = WalkSnapshot::from(&*state);
        for (key, bytes) in scrub(&mut snapshot) {
            self.db.store_photo_detached(key, self.def.kind, bytes);
        }
        match serde_json::to_string(&snapshot) {
            Ok(payload) => {
                let row = SnapshotRow {
                    kind: self.def.kind,
                    payload,
                    started_at: state.started_at,
                    complete: true,
                    updated_at: Utc::now(),
                };
                if let Err(err) = self.db.save_snapshot(row).await {
                    warn!("Final snapshot write failed: {err:#}");
                }
            }
            Err(err) => error!("Could not serialize final snapshot: {err}"),
        }

        drop(state);

        info!(
            "Finalized {} walk {} ({})",
            self.def.kind.as_str(),
            completed.id,
            completed.ratings.overall.as_str()
        );
        self.exports.dispatch(&completed);

        Ok(FinalizeOutcome::Completed(completed))
    }

    /// Abandon the current walk: clear persisted state and return to an
    /// empty session. Distinct from finalize; nothing is exported.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = WalkState::fresh();

        if let Err(err) = self.db.clear_snapshot(self.def.kind).await {
            warn!("Could not clear stored walk: {err:#}");
        }
        if let Err(err) = self.db.delete_photos_for_walk(self.def.kind).await {
            warn!("Could not clear stored photos: {err:#}");
        }
    }
}
