//! Recompute scheduling
//!
//! Tracks whether the installed envelope still matches the source and
//! viewport, and drives the [`PeaksComputer`] so that at most one pass is in
//! flight:
//!
//! ```text
//! Idle --invalidate--> Stale --tick--> Recomputing --result--> Idle
//!                                           |
//!                                 invalidate: pending = true
//!                                 (result then re-enters Stale)
//! ```
//!
//! Any number of invalidations while a pass is running collapse into one
//! follow-up pass. Results are tagged with the source generation; a pass
//! that finishes after its source was replaced is dropped.

use std::sync::Arc;

use scrubline_core::source::AudioSource;

use super::error::OverviewError;
use super::peaks_computer::{EnvelopeSnapshot, PeaksComputeRequest, PeaksComputer};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeState {
    /// Installed envelope is current (or there is nothing to show)
    Idle,
    /// A recompute is needed and will be dispatched on the next tick
    Stale,
    /// A pass is running on the worker
    Recomputing,
}

/// What a tick produced
#[derive(Debug)]
pub enum PassOutcome {
    /// A pass completed; install the snapshot
    Completed(EnvelopeSnapshot),
    /// A pass completed with nothing to build (zero width or empty file)
    Empty,
    /// A pass failed; keep whatever is installed
    Failed(OverviewError),
}

/// Owner of the recompute state machine
pub struct RecomputeScheduler {
    computer: PeaksComputer,
    state: RecomputeState,
    /// Invalidation received while `Recomputing`
    pending: bool,
    source: Option<Arc<dyn AudioSource>>,
    /// Bumped whenever the source is replaced
    generation: u64,
    width: usize,
    padding: f64,
    passes_dispatched: u64,
}

impl RecomputeScheduler {
    pub fn new(padding: f64) -> Self {
        Self {
            computer: PeaksComputer::spawn(),
            state: RecomputeState::Idle,
            pending: false,
            source: None,
            generation: 0,
            width: 0,
            padding,
            passes_dispatched: 0,
        }
    }

    pub fn state(&self) -> RecomputeState {
        self.state
    }

    /// Whether a follow-up pass is queued behind the running one
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total passes handed to the worker so far
    pub fn passes_dispatched(&self) -> u64 {
        self.passes_dispatched
    }

    /// Replace the source (or clear it with `None`) and invalidate
    pub fn set_source(&mut self, source: Option<Arc<dyn AudioSource>>) {
        self.source = source;
        self.generation += 1;
        self.invalidate();
    }

    /// Record a new viewport width; invalidates only if it changed
    pub fn set_width(&mut self, width: usize) {
        if width != self.width {
            self.width = width;
            self.invalidate();
        }
    }

    pub fn set_padding(&mut self, padding: f64) {
        if padding != self.padding {
            self.padding = padding;
            self.invalidate();
        }
    }

    /// Mark the installed envelope stale
    ///
    /// While a pass is running this only sets the pending flag.
    pub fn invalidate(&mut self) {
        match self.state {
            RecomputeState::Idle => self.state = RecomputeState::Stale,
            RecomputeState::Stale => {}
            RecomputeState::Recomputing => {
                if !self.pending {
                    log::debug!("RecomputeScheduler: invalidated mid-pass, coalescing");
                }
                self.pending = true;
            }
        }
    }

    /// Advance the state machine; call once per display tick
    ///
    /// Collects a finished pass first, then dispatches a new one if stale, so
    /// a coalesced follow-up starts in the same tick its predecessor ends.
    pub fn tick(&mut self) -> Option<PassOutcome> {
        let outcome = match self.state {
            RecomputeState::Recomputing => self.collect(),
            _ => None,
        };

        if self.state == RecomputeState::Stale {
            if let Some(failure) = self.dispatch() {
                return Some(failure);
            }
        }
        outcome
    }

    fn collect(&mut self) -> Option<PassOutcome> {
        let result = match self.computer.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return None,
            Err(e) => {
                self.state = RecomputeState::Idle;
                self.pending = false;
                return Some(PassOutcome::Failed(e));
            }
        };

        self.state = if self.pending {
            RecomputeState::Stale
        } else {
            RecomputeState::Idle
        };
        self.pending = false;

        if result.generation != self.generation {
            log::debug!(
                "RecomputeScheduler: dropping result for replaced source (generation {} != {})",
                result.generation,
                self.generation
            );
            return None;
        }

        Some(match result.outcome {
            Ok(Some(snapshot)) => PassOutcome::Completed(snapshot),
            Ok(None) => PassOutcome::Empty,
            Err(e) => PassOutcome::Failed(e.into()),
        })
    }

    fn dispatch(&mut self) -> Option<PassOutcome> {
        let Some(source) = self.source.clone() else {
            self.state = RecomputeState::Idle;
            return None;
        };

        let request = PeaksComputeRequest {
            generation: self.generation,
            source,
            width: self.width,
            padding: self.padding,
        };
        log::debug!("RecomputeScheduler: dispatching {:?}", request);

        match self.computer.compute(request) {
            Ok(()) => {
                self.state = RecomputeState::Recomputing;
                self.passes_dispatched += 1;
                None
            }
            Err(e) => {
                self.state = RecomputeState::Idle;
                Some(PassOutcome::Failed(e))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_sources::GatedSource;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};

    /// Tick until the scheduler is idle, collecting every outcome
    fn run_until_idle(scheduler: &mut RecomputeScheduler) -> Vec<PassOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut outcomes = Vec::new();
        loop {
            if let Some(outcome) = scheduler.tick() {
                outcomes.push(outcome);
            }
            if scheduler.state() == RecomputeState::Idle {
                return outcomes;
            }
            assert!(Instant::now() < deadline, "scheduler never went idle");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn wait_for_passes(source: &GatedSource, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while source.passes() < n {
            assert!(Instant::now() < deadline, "pass {} never started", n);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_idle_to_stale_to_recomputing_to_idle() {
        let source = Arc::new(GatedSource::new(100));
        source.release();
        let mut scheduler = RecomputeScheduler::new(0.3);
        assert_eq!(scheduler.state(), RecomputeState::Idle);

        scheduler.set_width(10);
        scheduler.set_source(Some(source.clone()));
        assert_eq!(scheduler.state(), RecomputeState::Stale);

        assert!(scheduler.tick().is_none());
        assert_eq!(scheduler.state(), RecomputeState::Recomputing);

        let outcomes = run_until_idle(&mut scheduler);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            PassOutcome::Completed(snapshot) => assert_eq!(snapshot.envelope.columns(), 10),
            other => panic!("expected completed pass, got {:?}", other),
        }
        assert_eq!(scheduler.passes_dispatched(), 1);
    }

    #[test]
    fn test_invalidations_while_recomputing_coalesce_into_one_pass() {
        let source = Arc::new(GatedSource::new(1000));
        let mut scheduler = RecomputeScheduler::new(0.3);
        scheduler.set_width(100);
        scheduler.set_source(Some(source.clone()));
        scheduler.tick();
        wait_for_passes(&source, 1);

        for width in [120, 140, 160, 180, 200] {
            scheduler.set_width(width);
            scheduler.invalidate();
        }
        assert_eq!(scheduler.state(), RecomputeState::Recomputing);
        assert!(scheduler.has_pending());

        source.release();
        let outcomes = run_until_idle(&mut scheduler);

        assert_eq!(source.passes(), 2, "five invalidations, one extra pass");
        assert_eq!(scheduler.passes_dispatched(), 2);
        let last = outcomes.iter().rev().find_map(|o| match o {
            PassOutcome::Completed(s) => Some(s.envelope.width()),
            _ => None,
        });
        assert_eq!(last, Some(200), "follow-up pass uses the latest width");
    }

    #[test]
    fn test_result_for_replaced_source_is_dropped() {
        let old = Arc::new(GatedSource::new(500));
        let new = Arc::new(GatedSource::new(40));
        new.release();

        let mut scheduler = RecomputeScheduler::new(0.3);
        scheduler.set_width(20);
        scheduler.set_source(Some(old.clone()));
        scheduler.tick();
        wait_for_passes(&old, 1);

        scheduler.set_source(Some(new.clone()));
        old.release();
        let outcomes = run_until_idle(&mut scheduler);

        let completed: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                PassOutcome::Completed(s) => Some(s.envelope.increment()),
                _ => None,
            })
            .collect();
        // 40 frames / 20 columns; the old source would have been 25
        assert_eq!(completed, vec![2]);
    }

    #[test]
    fn test_failed_pass_returns_to_idle() {
        let source = Arc::new(GatedSource::new(100));
        source.fail.store(true, Ordering::SeqCst);
        source.release();

        let mut scheduler = RecomputeScheduler::new(0.3);
        scheduler.set_width(10);
        scheduler.set_source(Some(source.clone()));
        let outcomes = run_until_idle(&mut scheduler);

        assert!(matches!(
            outcomes.as_slice(),
            [PassOutcome::Failed(OverviewError::Source(_))]
        ));
        assert_eq!(scheduler.state(), RecomputeState::Idle);
    }

    #[test]
    fn test_zero_width_pass_is_empty() {
        let source = Arc::new(GatedSource::new(100));
        source.release();
        let mut scheduler = RecomputeScheduler::new(0.3);
        scheduler.set_source(Some(source.clone()));

        let outcomes = run_until_idle(&mut scheduler);
        assert!(matches!(outcomes.as_slice(), [PassOutcome::Empty]));
        assert_eq!(source.passes(), 0, "no scan for a zero-width viewport");
    }

    #[test]
    fn test_no_source_goes_straight_to_idle() {
        let mut scheduler = RecomputeScheduler::new(0.3);
        scheduler.set_width(100);
        assert_eq!(scheduler.state(), RecomputeState::Stale);
        assert!(scheduler.tick().is_none());
        assert_eq!(scheduler.state(), RecomputeState::Idle);
        assert_eq!(scheduler.passes_dispatched(), 0);
    }

    #[test]
    fn test_unchanged_width_does_not_invalidate() {
        let mut scheduler = RecomputeScheduler::new(0.3);
        scheduler.set_width(100);
        scheduler.tick();
        scheduler.set_width(100);
        assert_eq!(scheduler.state(), RecomputeState::Idle);
    }
}
