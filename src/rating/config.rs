//! Per-kind rating policy: thresholds and the session-level rating shape.
//!
//! Some walk kinds rate the session as the fraction of GREEN zones against a
//! threshold, others take the worst zone rating with a global issue cap. The
//! divergence is intentional per-kind policy, so both live behind one
//! declared parameter instead of being unified.

use serde::{Deserialize, Serialize};

use crate::checklist::WalkKind;

/// How the overall session rating is derived from zone ratings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "shape")]
pub enum SessionShape {
    /// PASS requires the GREEN-zone fraction to meet the threshold and zero
    /// tier-1 issues anywhere in the session.
    PercentGreen { min_green_fraction: f64 },
    /// Overall equals the most severe zone rating; exceeding the open-issue
    /// cap forces RED outright.
    WorstOf { open_issue_cap: usize },
}

/// Tunable thresholds for one walk kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingPolicy {
    pub shape: SessionShape,
    /// Zone issue count above this is RED; at or below (with remediation in
    /// order) is AMBER.
    pub amber_issue_limit: usize,
    /// When set, AMBER additionally requires every zone issue to name a
    /// remediation owner with a due date within this many days of the walk.
    pub remediation_day_limit: Option<i64>,
    /// Issue notes are clamped to this many characters.
    pub note_limit: usize,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            shape: SessionShape::PercentGreen {
                min_green_fraction: 0.85,
            },
            amber_issue_limit: 3,
            remediation_day_limit: None,
            note_limit: 250,
        }
    }
}

impl RatingPolicy {
    pub fn for_kind(kind: WalkKind) -> Self {
        match kind {
            WalkKind::DailyClean => Self::default(),
            WalkKind::BuildingGrounds => Self {
                shape: SessionShape::WorstOf { open_issue_cap: 12 },
                amber_issue_limit: 4,
                remediation_day_limit: Some(45),
                note_limit: 500,
            },
            WalkKind::Security => Self {
                shape: SessionShape::PercentGreen {
                    min_green_fraction: 0.85,
                },
                amber_issue_limit: 2,
                remediation_day_limit: Some(30),
                note_limit: 300,
            },
            WalkKind::Mechanical => Self {
                shape: SessionShape::WorstOf { open_issue_cap: 10 },
                amber_issue_limit: 3,
                remediation_day_limit: Some(45),
                note_limit: 400,
            },
            WalkKind::HealthSafety => Self {
                shape: SessionShape::PercentGreen {
                    min_green_fraction: 0.85,
                },
                amber_issue_limit: 2,
                remediation_day_limit: Some(30),
                note_limit: 300,
            },
            WalkKind::FoodSafety => Self {
                shape: SessionShape::PercentGreen {
                    min_green_fraction: 0.85,
                },
                amber_issue_limit: 1,
                remediation_day_limit: Some(30),
                note_limit: 200,
            },
            WalkKind::Oversight => Self {
                shape: SessionShape::WorstOf { open_issue_cap: 6 },
                amber_issue_limit: 2,
                remediation_day_limit: None,
                note_limit: 100,
            },
        }
    }
}
