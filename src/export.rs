//! Post-finalize export boundary.
//!
//! Sinks (remote database save, ticket creation, outbound mail) receive the
//! finalized summary once. Delivery is best-effort: a failing sink is logged
//! and skipped, the walk itself stays complete. Retry policy belongs to the
//! surrounding shell, not here.

use anyhow::Result;
use log::{error, info};

use crate::models::session::CompletedWalk;

pub trait ExportSink: Send + Sync {
    fn name(&self) -> &'static str;
    fn deliver(&self, walk: &CompletedWalk) -> Result<()>;
}

#[derive(Default)]
pub struct ExportDispatcher {
    sinks: Vec<Box<dyn ExportSink>>,
}

impl ExportDispatcher {
    pub fn new(sinks: Vec<Box<dyn ExportSink>>) -> Self {
        Self { sinks }
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Hand the summary to every sink. Returns how many deliveries succeeded.
    pub fn dispatch(&self, walk: &CompletedWalk) -> usize {
        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.deliver(walk) {
                Ok(()) => {
                    delivered += 1;
                    info!("Exported walk {} via {}", walk.id, sink.name());
                }
                Err(err) => {
                    error!("Export via {} failed: {err:#}", sink.name());
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::WalkKind;
    use crate::models::session::FinalRatings;
    use crate::rating::OverallRating;
    use anyhow::anyhow;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn walk() -> CompletedWalk {
        let now = Utc::now();
        CompletedWalk {
            id: "w1".into(),
            kind: WalkKind::Security,
            site: "campus".into(),
            inspector: "Avery".into(),
            inspector_email: "avery@example.org".into(),
            started_at: now,
            ended_at: now,
            duration_secs: 0,
            ratings: FinalRatings {
                zones: vec![],
                overall: OverallRating::Pass,
            },
            issues: vec![],
            observations: vec![],
            exit_photos: vec![],
        }
    }

    struct Counting(Arc<AtomicUsize>);
    impl ExportSink for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn deliver(&self, _walk: &CompletedWalk) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;
    impl ExportSink for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn deliver(&self, _walk: &CompletedWalk) -> Result<()> {
            Err(anyhow!("remote unavailable"))
        }
    }

    #[test]
    fn failing_sink_does_not_stop_the_others() {
        let count = Arc::new(AtomicUsize::new(0));
        let dispatcher = ExportDispatcher::new(vec![
            Box::new(Failing),
            Box::new(Counting(count.clone())),
        ]);

        let delivered = dispatcher.dispatch(&walk());
        assert_eq!(delivered, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
