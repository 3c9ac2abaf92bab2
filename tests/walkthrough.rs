//! End-to-end walks: begin, answer, document, advance, finalize, export.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use sitewalk::checklist::{Check, ChecklistDefinition, Section, Zone, ZoneKind};
use sitewalk::models::IssueUpdate;
use sitewalk::persist::INLINE_PHOTO_LIMIT;
use sitewalk::sampling::sample_rooms;
use sitewalk::{
    Advance, BeginWalk, Blocker, CheckResult, CompletedWalk, Database, EvidenceKey,
    ExportDispatcher, ExportSink, FinalizeOutcome, OverallRating, PhotoSlot, Remediation, RoomId,
    RoomPlan, TraversalShape, WalkController, WalkKind, ZoneRating,
};

fn check(id: &str, tier: u8, instant_red: bool, photo_required: bool) -> Check {
    Check {
        id: id.into(),
        prompt: format!("Is {id} in order?"),
        tier,
        instant_red,
        photo_required,
        optional: false,
    }
}

fn zone(id: &str, exit_photo: bool, checks: Vec<Check>) -> Zone {
    Zone {
        id: id.into(),
        name: id.to_uppercase(),
        kind: ZoneKind::Standard,
        sections: vec![Section {
            id: format!("{id}-main"),
            title: "Main".into(),
            checks,
        }],
        min_rooms: 0,
        exit_photo_required: exit_photo,
    }
}

fn begin_input(rooms: RoomPlan) -> BeginWalk {
    BeginWalk {
        site: "north-campus".into(),
        inspector: "Avery".into(),
        inspector_email: "avery@example.org".into(),
        rooms,
    }
}

struct Capture(Arc<Mutex<Vec<CompletedWalk>>>);

impl ExportSink for Capture {
    fn name(&self) -> &'static str {
        "capture"
    }
    fn deliver(&self, walk: &CompletedWalk) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(walk.clone());
        Ok(())
    }
}

#[tokio::test]
async fn room_based_walk_rates_worst_room_and_collects_exit_photos() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path().join("walks.sqlite3")).unwrap();

    let mut def = ChecklistDefinition::new(
        WalkKind::DailyClean,
        vec![
            zone("classrooms", true, vec![check("floors", 2, false, false)]),
            zone("hallways", false, vec![check("lockers", 3, false, false)]),
        ],
    );
    def.shape = TraversalShape::ZonesWithRooms;

    let exported = Arc::new(Mutex::new(Vec::new()));
    let controller = WalkController::open(
        def,
        db,
        ExportDispatcher::new(vec![Box::new(Capture(exported.clone()))]),
    )
    .await
    .unwrap();

    let room_a = RoomId::new("classroom", "101");
    let room_b = RoomId::new("classroom", "102");
    let mut rooms = RoomPlan::new();
    rooms.assign("classrooms", vec![room_a.clone(), room_b.clone()]);
    controller.begin(begin_input(rooms)).await.unwrap();

    // Room A fails, gets documented; room B passes clean.
    controller
        .record_answer("floors", Some(room_a.clone()), CheckResult::Fail)
        .await
        .unwrap();
    controller
        .upsert_issue(
            "floors",
            Some(room_a.clone()),
            IssueUpdate {
                note: Some("spill never mopped".into()),
                remediation: None,
            },
        )
        .await
        .unwrap();
    assert!(matches!(
        controller.advance().await.unwrap(),
        Advance::Moved(_)
    ));

    controller
        .record_answer("floors", Some(room_b.clone()), CheckResult::Pass)
        .await
        .unwrap();

    // Room B rates green, so leaving it demands a proof-of-presence photo.
    match controller.advance().await.unwrap() {
        Advance::Blocked(Blocker::ExitPhoto { key }) => {
            assert_eq!(key, EvidenceKey::room("classrooms", room_b.clone()));
        }
        other => panic!("expected exit-photo block, got {other:?}"),
    }
    controller
        .attach_photo(
            PhotoSlot::ExitEvidence {
                key: EvidenceKey::room("classrooms", room_b.clone()),
            },
            &[0xFF, 0xD8, 0xFF, 0xE0],
        )
        .await
        .unwrap();
    assert!(matches!(
        controller.advance().await.unwrap(),
        Advance::Moved(_)
    ));

    controller
        .record_answer("lockers", None, CheckResult::Pass)
        .await
        .unwrap();
    assert!(matches!(
        controller.advance().await.unwrap(),
        Advance::EndOfWalk
    ));

    let completed = match controller.finalize().await.unwrap() {
        FinalizeOutcome::Completed(completed) => completed,
        other => panic!("expected completion, got {other:?}"),
    };

    // One failing room drags the whole zone off green.
    let classroom_rating = completed
        .ratings
        .zones
        .iter()
        .find(|z| z.zone_id == "classrooms")
        .unwrap()
        .rating;
    assert_eq!(classroom_rating, ZoneRating::Amber);

    // 1 of 2 zones green misses the 85% bar.
    assert_eq!(completed.ratings.overall, OverallRating::Fail);
    assert_eq!(exported.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn instant_red_failure_fails_the_session_despite_green_majority() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path().join("walks.sqlite3")).unwrap();

    let mut zones = vec![zone(
        "entrance",
        false,
        vec![
            check("doors-secured", 1, true, false),
            check("signage", 3, false, false),
            check("lighting", 3, false, false),
        ],
    )];
    for n in 1..=7 {
        zones.push(zone(
            &format!("wing-{n}"),
            false,
            vec![check(&format!("wing-{n}-tidy"), 3, false, false)],
        ));
    }
    let def = ChecklistDefinition::new(WalkKind::Security, zones);

    let controller = WalkController::open(def, db, ExportDispatcher::default())
        .await
        .unwrap();
    controller.begin(begin_input(RoomPlan::new())).await.unwrap();

    controller
        .record_answer("doors-secured", None, CheckResult::Fail)
        .await
        .unwrap();
    controller
        .record_answer("signage", None, CheckResult::Pass)
        .await
        .unwrap();
    controller
        .record_answer("lighting", None, CheckResult::Pass)
        .await
        .unwrap();
    controller
        .upsert_issue(
            "doors-secured",
            None,
            IssueUpdate {
                note: Some("main entrance wide open, no staff present".into()),
                remediation: Some(Remediation {
                    owner: "security-lead".into(),
                    due: Utc::now().date_naive() + chrono::Duration::days(1),
                }),
            },
        )
        .await
        .unwrap();

    for n in 1..=7 {
        controller.advance().await.unwrap();
        controller
            .record_answer(&format!("wing-{n}-tidy"), None, CheckResult::Pass)
            .await
            .unwrap();
    }
    assert!(matches!(
        controller.advance().await.unwrap(),
        Advance::EndOfWalk
    ));

    let completed = match controller.finalize().await.unwrap() {
        FinalizeOutcome::Completed(completed) => completed,
        other => panic!("expected completion, got {other:?}"),
    };

    let entrance = completed
        .ratings
        .zones
        .iter()
        .find(|z| z.zone_id == "entrance")
        .unwrap();
    assert_eq!(entrance.rating, ZoneRating::Red);

    // 7 of 8 zones green clears 85%, but the tier-1 issue fails the session.
    assert_eq!(completed.ratings.overall, OverallRating::Fail);
}

#[tokio::test]
async fn oversight_walk_steps_sampled_rooms_check_by_check() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path().join("walks.sqlite3")).unwrap();

    let mut def = ChecklistDefinition::new(
        WalkKind::Oversight,
        vec![
            zone(
                "stop-classrooms",
                false,
                vec![
                    check("boards-clean", 3, false, false),
                    check("bins-emptied", 3, false, false),
                ],
            ),
            zone("stop-office", false, vec![check("desk-clear", 3, false, false)]),
        ],
    );
    def.shape = TraversalShape::LinearStops;

    let pool: Vec<RoomId> = (1..=6)
        .map(|n| RoomId::new("classroom", format!("{n:03}")))
        .collect();
    let mut rng = StdRng::seed_from_u64(11);
    let sampled = sample_rooms(&pool, 2, &mut rng);
    assert_eq!(sampled.len(), 2);

    let mut rooms = RoomPlan::new();
    rooms.assign("stop-classrooms", sampled.clone());

    let controller = WalkController::open(def, db, ExportDispatcher::default())
        .await
        .unwrap();
    controller.begin(begin_input(rooms)).await.unwrap();

    // 2 checks x 2 sampled rooms + 1 office check.
    for room in &sampled {
        for check_id in ["boards-clean", "bins-emptied"] {
            controller
                .record_answer(check_id, Some(room.clone()), CheckResult::Pass)
                .await
                .unwrap();
            let step = controller.advance().await.unwrap();
            assert!(
                matches!(step, Advance::Moved(_) | Advance::EndOfWalk),
                "got {step:?}"
            );
        }
    }
    controller
        .record_answer("desk-clear", None, CheckResult::Pass)
        .await
        .unwrap();
    assert!(matches!(
        controller.advance().await.unwrap(),
        Advance::EndOfWalk
    ));

    let completed = match controller.finalize().await.unwrap() {
        FinalizeOutcome::Completed(completed) => completed,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(completed.ratings.overall, OverallRating::Green);
}

#[tokio::test]
async fn oversized_photos_land_in_the_blob_table_not_the_snapshot() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path().join("walks.sqlite3")).unwrap();

    let def = ChecklistDefinition::new(
        WalkKind::Mechanical,
        vec![zone("plant", false, vec![check("boiler", 2, false, true)])],
    );

    let controller = WalkController::open(def, db.clone(), ExportDispatcher::default())
        .await
        .unwrap();
    controller.begin(begin_input(RoomPlan::new())).await.unwrap();

    controller
        .record_answer("boiler", None, CheckResult::Fail)
        .await
        .unwrap();
    let issue = controller
        .upsert_issue(
            "boiler",
            None,
            IssueUpdate {
                note: Some("pressure relief valve weeping".into()),
                remediation: Some(Remediation {
                    owner: "plant-ops".into(),
                    due: Utc::now().date_naive() + chrono::Duration::days(30),
                }),
            },
        )
        .await
        .unwrap();

    let payload = vec![0xABu8; INLINE_PHOTO_LIMIT * 2];
    let photo = controller
        .attach_photo(PhotoSlot::Issue { issue_id: issue.id.clone() }, &payload)
        .await
        .unwrap();
    assert_eq!(photo.byte_len as usize, payload.len());

    // The payload is retrievable through the blob channel by its key.
    let stored = db.load_photo(&photo.key).await.unwrap().unwrap();
    assert_eq!(stored.bytes.len(), payload.len());

    // The snapshot row carries only the reference.
    let row = db.load_snapshot(WalkKind::Mechanical).await.unwrap().unwrap();
    assert!(row.payload.contains(&photo.key));
    assert!(row.payload.len() < payload.len());
}
