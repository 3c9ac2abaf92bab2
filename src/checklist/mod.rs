//! Checklist definitions: the immutable tree a walk traverses.
//!
//! A definition is supplied by the hosting application (the question wording
//! and zone layout are reference data, not code). The engine only relies on
//! the structure and the per-check metadata carried here.

pub mod cursor;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{WalkError, WalkResult};
use crate::models::session::RoomId;

pub use cursor::{Cursor, Traversal};

/// The named checklist types. Each is an instance of the same abstract
/// traversal and rating shapes with its own thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum WalkKind {
    DailyClean,
    BuildingGrounds,
    Security,
    Mechanical,
    HealthSafety,
    FoodSafety,
    Oversight,
}

impl WalkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkKind::DailyClean => "DailyClean",
            WalkKind::BuildingGrounds => "BuildingGrounds",
            WalkKind::Security => "Security",
            WalkKind::Mechanical => "Mechanical",
            WalkKind::HealthSafety => "HealthSafety",
            WalkKind::FoodSafety => "FoodSafety",
            WalkKind::Oversight => "Oversight",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "DailyClean" => Some(WalkKind::DailyClean),
            "BuildingGrounds" => Some(WalkKind::BuildingGrounds),
            "Security" => Some(WalkKind::Security),
            "Mechanical" => Some(WalkKind::Mechanical),
            "HealthSafety" => Some(WalkKind::HealthSafety),
            "FoodSafety" => Some(WalkKind::FoodSafety),
            "Oversight" => Some(WalkKind::Oversight),
            _ => None,
        }
    }

    pub fn all() -> [WalkKind; 7] {
        [
            WalkKind::DailyClean,
            WalkKind::BuildingGrounds,
            WalkKind::Security,
            WalkKind::Mechanical,
            WalkKind::HealthSafety,
            WalkKind::FoodSafety,
            WalkKind::Oversight,
        ]
    }

    /// Traversal shape this kind uses unless the definition overrides it.
    pub fn default_shape(&self) -> TraversalShape {
        match self {
            WalkKind::DailyClean => TraversalShape::ZonesWithRooms,
            WalkKind::Oversight => TraversalShape::LinearStops,
            _ => TraversalShape::FlatZones,
        }
    }
}

/// How the cursor steps through the definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TraversalShape {
    /// One step per zone; checks inside a zone are answered in any order.
    FlatZones,
    /// One step per selected room, then the next zone.
    ZonesWithRooms,
    /// One step per check inside a stop, optionally repeated per sampled
    /// room, then the next stop.
    LinearStops,
}

/// A single yes/no question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: String,
    pub prompt: String,
    /// Severity tier, 1 = most severe.
    pub tier: u8,
    /// A failed answer forces the enclosing zone to RED, no compensation.
    #[serde(default)]
    pub instant_red: bool,
    /// An issue documenting a failure of this check must carry a photo.
    #[serde(default)]
    pub photo_required: bool,
    /// May be left unanswered without affecting completion or rating.
    #[serde(default)]
    pub optional: bool,
}

/// Optional grouping of checks inside a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub checks: Vec<Check>,
}

/// Rating semantics of a zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ZoneKind {
    /// Rated from its check answers and issues.
    Standard,
    /// Pure routing stop for cross-team observations; always GREEN.
    ObservationOnly,
    /// Rated only by its own checks under the tier-1-forces-red rule; no
    /// amber band.
    Governance,
}

impl Default for ZoneKind {
    fn default() -> Self {
        ZoneKind::Standard
    }
}

/// A top-level traversal unit: a physical area or, for linear walks, a stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: ZoneKind,
    pub sections: Vec<Section>,
    /// Minimum rooms that must be selected for this zone (room-based shapes).
    #[serde(default)]
    pub min_rooms: usize,
    /// A GREEN rating here requires a proof-of-presence photo before the
    /// operator may move on.
    #[serde(default)]
    pub exit_photo_required: bool,
}

impl Zone {
    pub fn checks(&self) -> impl Iterator<Item = &Check> {
        self.sections.iter().flat_map(|s| s.checks.iter())
    }

    pub fn required_checks(&self) -> impl Iterator<Item = &Check> {
        self.checks().filter(|c| !c.optional)
    }

    pub fn check(&self, check_id: &str) -> Option<&Check> {
        self.checks().find(|c| c.id == check_id)
    }

    pub fn check_count(&self) -> usize {
        self.checks().count()
    }
}

/// Rooms selected for each zone of one walk. Site-specific input, validated
/// against the definition's minimum counts at `begin`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlan {
    by_zone: HashMap<String, Vec<RoomId>>,
}

impl RoomPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, zone_id: impl Into<String>, rooms: Vec<RoomId>) {
        self.by_zone.insert(zone_id.into(), rooms);
    }

    pub fn rooms_for(&self, zone_id: &str) -> &[RoomId] {
        self.by_zone.get(zone_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_zone.values().all(Vec::is_empty)
    }
}

/// The immutable tree a walk traverses. Never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistDefinition {
    pub kind: WalkKind,
    pub shape: TraversalShape,
    pub zones: Vec<Zone>,
}

impl ChecklistDefinition {
    pub fn new(kind: WalkKind, zones: Vec<Zone>) -> Self {
        Self {
            kind,
            shape: kind.default_shape(),
            zones,
        }
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }

    /// Locate a check anywhere in the tree, with its owning zone.
    pub fn find_check(&self, check_id: &str) -> Option<(&Zone, &Check)> {
        self.zones
            .iter()
            .find_map(|z| z.check(check_id).map(|c| (z, c)))
    }

    /// One-time structural validation of an externally supplied tree.
    pub fn validate(&self) -> WalkResult<()> {
        if self.zones.is_empty() {
            return Err(WalkError::validation("checklist has no zones"));
        }

        let mut zone_ids = HashSet::new();
        let mut check_ids = HashSet::new();
        for zone in &self.zones {
            if zone.id.trim().is_empty() {
                return Err(WalkError::validation("zone with empty id"));
            }
            if !zone_ids.insert(zone.id.as_str()) {
                return Err(WalkError::validation(format!(
                    "duplicate zone id '{}'",
                    zone.id
                )));
            }
            if zone.kind == ZoneKind::Standard && zone.check_count() == 0 {
                return Err(WalkError::validation(format!(
                    "zone '{}' has no checks",
                    zone.id
                )));
            }
            for check in zone.checks() {
                if check.id.trim().is_empty() {
                    return Err(WalkError::validation(format!(
                        "check with empty id in zone '{}'",
                        zone.id
                    )));
                }
                if !check_ids.insert(check.id.as_str()) {
                    return Err(WalkError::validation(format!(
                        "duplicate check id '{}'",
                        check.id
                    )));
                }
                if check.tier == 0 {
                    return Err(WalkError::validation(format!(
                        "check '{}' has tier 0; tiers start at 1",
                        check.id
                    )));
                }
            }
        }

        Ok(())
    }
}
