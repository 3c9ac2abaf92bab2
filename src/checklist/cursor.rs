//! Traversal cursor: the operator's position inside a checklist definition.
//!
//! The cursor is a plain index triple; what a "step" means depends on the
//! definition's [`TraversalShape`]. All stepping goes through [`Traversal`]
//! so a cursor can never leave the definition's bounds.

use serde::{Deserialize, Serialize};

use crate::checklist::{ChecklistDefinition, RoomPlan, TraversalShape};

/// Position inside the traversal. Fields that a shape does not use stay 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub zone: usize,
    pub room: usize,
    pub check: usize,
}

impl Cursor {
    pub fn origin() -> Self {
        Self::default()
    }
}

/// Bounded stepping over one definition plus the walk's room assignments.
pub struct Traversal<'a> {
    def: &'a ChecklistDefinition,
    plan: &'a RoomPlan,
}

impl<'a> Traversal<'a> {
    pub fn new(def: &'a ChecklistDefinition, plan: &'a RoomPlan) -> Self {
        Self { def, plan }
    }

    fn room_count(&self, zone_idx: usize) -> usize {
        let zone = &self.def.zones[zone_idx];
        match self.def.shape {
            TraversalShape::FlatZones => 1,
            // A stop without sampled rooms is walked once.
            TraversalShape::ZonesWithRooms | TraversalShape::LinearStops => {
                self.plan.rooms_for(&zone.id).len().max(1)
            }
        }
    }

    fn check_count(&self, zone_idx: usize) -> usize {
        match self.def.shape {
            TraversalShape::LinearStops => self.def.zones[zone_idx].check_count().max(1),
            _ => 1,
        }
    }

    pub fn in_bounds(&self, c: Cursor) -> bool {
        c.zone < self.def.zones.len()
            && c.room < self.room_count(c.zone)
            && c.check < self.check_count(c.zone)
    }

    /// Next position, or `None` when the cursor sits on the last step (the
    /// caller must finalize instead of advancing).
    pub fn advance(&self, c: Cursor) -> Option<Cursor> {
        debug_assert!(self.in_bounds(c));

        if c.check + 1 < self.check_count(c.zone) {
            return Some(Cursor {
                check: c.check + 1,
                ..c
            });
        }
        if c.room + 1 < self.room_count(c.zone) {
            return Some(Cursor {
                zone: c.zone,
                room: c.room + 1,
                check: 0,
            });
        }
        if c.zone + 1 < self.def.zones.len() {
            return Some(Cursor {
                zone: c.zone + 1,
                room: 0,
                check: 0,
            });
        }
        None
    }

    /// Previous position; stepping back from the origin is a no-op.
    pub fn retreat(&self, c: Cursor) -> Cursor {
        debug_assert!(self.in_bounds(c));

        if c.check > 0 {
            return Cursor {
                check: c.check - 1,
                ..c
            };
        }
        if c.room > 0 {
            let room = c.room - 1;
            return Cursor {
                zone: c.zone,
                room,
                check: self.check_count(c.zone) - 1,
            };
        }
        if c.zone > 0 {
            let zone = c.zone - 1;
            let room = self.room_count(zone) - 1;
            return Cursor {
                zone,
                room,
                check: self.check_count(zone) - 1,
            };
        }
        c
    }

    pub fn is_last(&self, c: Cursor) -> bool {
        self.advance(c).is_none()
    }

    /// True when advancing from this position leaves the current zone (or the
    /// walk entirely). Exit-photo gating applies at these boundaries.
    pub fn leaving_zone(&self, c: Cursor) -> bool {
        match self.advance(c) {
            Some(next) => next.zone != c.zone,
            None => true,
        }
    }

    /// True when advancing from this position leaves the current room slot.
    pub fn leaving_room(&self, c: Cursor) -> bool {
        match self.advance(c) {
            Some(next) => next.zone != c.zone || next.room != c.room,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{Check, Section, WalkKind, Zone, ZoneKind};
    use crate::models::session::RoomId;

    fn check(id: &str) -> Check {
        Check {
            id: id.into(),
            prompt: id.into(),
            tier: 2,
            instant_red: false,
            photo_required: false,
            optional: false,
        }
    }

    fn zone(id: &str, check_ids: &[&str]) -> Zone {
        Zone {
            id: id.into(),
            name: id.into(),
            kind: ZoneKind::Standard,
            sections: vec![Section {
                id: format!("{id}-s"),
                title: id.into(),
                checks: check_ids.iter().map(|c| check(c)).collect(),
            }],
            min_rooms: 0,
            exit_photo_required: false,
        }
    }

    fn flat_def() -> ChecklistDefinition {
        ChecklistDefinition::new(
            WalkKind::Security,
            vec![zone("a", &["a1", "a2"]), zone("b", &["b1"])],
        )
    }

    #[test]
    fn flat_zones_step_zone_by_zone() {
        let def = flat_def();
        let plan = RoomPlan::new();
        let t = Traversal::new(&def, &plan);

        let c = Cursor::origin();
        let c = t.advance(c).unwrap();
        assert_eq!(c.zone, 1);
        assert!(t.is_last(c));
        assert_eq!(t.advance(c), None);
    }

    #[test]
    fn retreat_never_underflows() {
        let def = flat_def();
        let plan = RoomPlan::new();
        let t = Traversal::new(&def, &plan);

        let origin = Cursor::origin();
        assert_eq!(t.retreat(origin), origin);

        let forward = t.advance(origin).unwrap();
        assert_eq!(t.retreat(forward), origin);
    }

    #[test]
    fn rooms_step_before_zones() {
        let mut def = flat_def();
        def.shape = TraversalShape::ZonesWithRooms;
        let mut plan = RoomPlan::new();
        plan.assign(
            "a",
            vec![
                RoomId::new("classroom", "101"),
                RoomId::new("classroom", "102"),
            ],
        );
        plan.assign("b", vec![RoomId::new("office", "front")]);
        let t = Traversal::new(&def, &plan);

        let c = Cursor::origin();
        let c = t.advance(c).unwrap();
        assert_eq!((c.zone, c.room), (0, 1));
        let c = t.advance(c).unwrap();
        assert_eq!((c.zone, c.room), (1, 0));
        assert!(t.is_last(c));

        let back = t.retreat(c);
        assert_eq!((back.zone, back.room), (0, 1));
    }

    #[test]
    fn linear_stops_step_check_by_check_per_sampled_room() {
        let mut def = ChecklistDefinition::new(
            WalkKind::Oversight,
            vec![zone("stop1", &["s1a", "s1b"]), zone("stop2", &["s2a"])],
        );
        def.shape = TraversalShape::LinearStops;
        let mut plan = RoomPlan::new();
        plan.assign(
            "stop1",
            vec![RoomId::new("classroom", "201"), RoomId::new("classroom", "202")],
        );
        let t = Traversal::new(&def, &plan);

        // stop1 has 2 checks x 2 sampled rooms, stop2 has 1 check, no rooms.
        let mut c = Cursor::origin();
        let mut steps = 1;
        while let Some(next) = t.advance(c) {
            assert!(t.in_bounds(next));
            c = next;
            steps += 1;
        }
        assert_eq!(steps, 2 * 2 + 1);
        assert_eq!((c.zone, c.room, c.check), (1, 0, 0));
    }

    #[test]
    fn zone_and_room_boundaries_are_detected() {
        let mut def = flat_def();
        def.shape = TraversalShape::ZonesWithRooms;
        let mut plan = RoomPlan::new();
        plan.assign("a", vec![RoomId::new("r", "1"), RoomId::new("r", "2")]);
        let t = Traversal::new(&def, &plan);

        let first_room = Cursor::origin();
        assert!(t.leaving_room(first_room));
        assert!(!t.leaving_zone(first_room));

        let last_room = t.advance(first_room).unwrap();
        assert!(t.leaving_zone(last_room));
    }
}
