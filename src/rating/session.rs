//! Session rating: folds zone ratings and the issue ledger into one verdict.

use serde::{Deserialize, Serialize};

use crate::models::issue::Issue;
use crate::rating::config::{RatingPolicy, SessionShape};
use crate::rating::zone::ZoneRating;

/// Overall verdict for a walk. Percentage-shaped kinds report PASS/FAIL;
/// worst-of kinds report the dominant RAG colour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OverallRating {
    Pass,
    Fail,
    Green,
    Amber,
    Red,
}

impl OverallRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallRating::Pass => "PASS",
            OverallRating::Fail => "FAIL",
            OverallRating::Green => "GREEN",
            OverallRating::Amber => "AMBER",
            OverallRating::Red => "RED",
        }
    }

    pub fn is_favorable(&self) -> bool {
        matches!(self, OverallRating::Pass | OverallRating::Green)
    }
}

impl From<ZoneRating> for OverallRating {
    fn from(rating: ZoneRating) -> Self {
        match rating {
            ZoneRating::Green => OverallRating::Green,
            ZoneRating::Amber => OverallRating::Amber,
            ZoneRating::Red => OverallRating::Red,
        }
    }
}

/// Derive the overall rating. Pure: same inputs, same verdict.
pub fn rate_session(
    zone_ratings: &[ZoneRating],
    issues: &[Issue],
    policy: &RatingPolicy,
) -> OverallRating {
    match policy.shape {
        SessionShape::PercentGreen { min_green_fraction } => {
            if zone_ratings.is_empty() {
                return OverallRating::Fail;
            }
            let any_tier1 = issues.iter().any(|i| i.tier == 1);
            let greens = zone_ratings
                .iter()
                .filter(|r| **r == ZoneRating::Green)
                .count();
            let fraction = greens as f64 / zone_ratings.len() as f64;
            if fraction >= min_green_fraction && !any_tier1 {
                OverallRating::Pass
            } else {
                OverallRating::Fail
            }
        }
        SessionShape::WorstOf { open_issue_cap } => {
            if issues.len() > open_issue_cap {
                return OverallRating::Red;
            }
            zone_ratings
                .iter()
                .max()
                .copied()
                .unwrap_or(ZoneRating::Green)
                .into()
        }
    }
}
