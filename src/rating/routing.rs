//! Cross-team observation routing precedence.
//!
//! When a finding could plausibly sit in more than one category it resolves
//! to the most safety-critical one. The ordering is a hand-authored static
//! total order; structural findings only flag a report, they never open a
//! remediation ticket directly.

use crate::models::issue::ObservationCategory;

/// Precedence rank; lower resolves first.
pub fn precedence(category: ObservationCategory) -> u8 {
    match category {
        ObservationCategory::Security => 0,
        ObservationCategory::FireLifeSafety => 1,
        ObservationCategory::RecreationSafety => 2,
        ObservationCategory::Mechanical => 3,
        ObservationCategory::Cleanliness => 4,
        ObservationCategory::Structural => 5,
    }
}

/// Whether filing under this category opens a remediation ticket.
pub fn opens_ticket(category: ObservationCategory) -> bool {
    category != ObservationCategory::Structural
}

/// Resolve a set of plausible categories to the one the finding is filed
/// under. `None` only for an empty candidate list.
pub fn resolve(candidates: &[ObservationCategory]) -> Option<ObservationCategory> {
    candidates.iter().copied().min_by_key(|c| precedence(*c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_a_strict_total_order() {
        let all = [
            ObservationCategory::Security,
            ObservationCategory::FireLifeSafety,
            ObservationCategory::RecreationSafety,
            ObservationCategory::Mechanical,
            ObservationCategory::Cleanliness,
            ObservationCategory::Structural,
        ];
        let mut ranks: Vec<u8> = all.iter().map(|c| precedence(*c)).collect();
        ranks.sort_unstable();
        ranks.dedup();
        assert_eq!(ranks.len(), all.len());
    }

    #[test]
    fn safety_critical_wins() {
        let resolved = resolve(&[
            ObservationCategory::Cleanliness,
            ObservationCategory::Security,
            ObservationCategory::Mechanical,
        ]);
        assert_eq!(resolved, Some(ObservationCategory::Security));
    }

    #[test]
    fn structural_is_last_and_report_only() {
        let resolved = resolve(&[
            ObservationCategory::Structural,
            ObservationCategory::Cleanliness,
        ]);
        assert_eq!(resolved, Some(ObservationCategory::Cleanliness));
        assert!(!opens_ticket(ObservationCategory::Structural));
        assert!(opens_ticket(ObservationCategory::Security));
    }

    #[test]
    fn empty_candidates_resolve_to_none() {
        assert_eq!(resolve(&[]), None);
    }
}
