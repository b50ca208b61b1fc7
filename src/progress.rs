//! Job stages, progress counters and state snapshots.
//!
//! Counters are lock-free and only ever increase. The published stage sits behind a mutex
//! and only moves forward. A `JobState` is computed by reading the stage under its lock and
//! then the relevant counters without it, so a snapshot taken across a stage transition may
//! pair the new stage with a slightly stale percentage.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{lock, EngineError};

/// The pipeline phase a job is understood to be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Undefined,
    Map,
    Shuffle,
    Reduce,
}

/// A point-in-time view of a job's progress. `percentage` is in [0; 100].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JobState {
    pub stage: Stage,
    pub percentage: f32,
}

/// The published stage of a job.
pub struct StageCell {
    stage: Mutex<Stage>,
}

impl StageCell {
    pub fn new() -> StageCell {
        StageCell { stage: Mutex::new(Stage::Undefined) }
    }

    /// Moves the job to `stage` unless it already is at or past it.
    pub fn publish(&self, stage: Stage) -> Result<(), EngineError> {
        let mut current = lock(&self.stage, "stage")?;
        if stage > *current {
            *current = stage;
        }
        Ok(())
    }

    pub fn get(&self) -> Result<Stage, EngineError> {
        Ok(*lock(&self.stage, "stage")?)
    }
}

/// Shared progress counters of one job.
pub struct ProgressCounters {
    input_len: usize,
    // Next input index to hand out; overshoots input_len by up to one per worker.
    map_claimed: AtomicUsize,
    intermediate_total: AtomicUsize,
    shuffled: AtomicUsize,
    // Next grouped run to hand out.
    next_run: AtomicUsize,
    grouped_total: AtomicUsize,
    reduced: AtomicUsize,
}

fn percent(done: usize, total: usize) -> f32 {
    if total == 0 {
        return 100.0;
    }
    let p = done.min(total) as f64 / total as f64 * 100.0;
    p as f32
}

impl ProgressCounters {
    pub fn new(input_len: usize) -> ProgressCounters {
        ProgressCounters {
            input_len: input_len,
            map_claimed: AtomicUsize::new(0),
            intermediate_total: AtomicUsize::new(0),
            shuffled: AtomicUsize::new(0),
            next_run: AtomicUsize::new(0),
            grouped_total: AtomicUsize::new(0),
            reduced: AtomicUsize::new(0),
        }
    }

    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Claims the next input index. Indices >= `input_len()` mean the input is exhausted.
    pub fn claim_input(&self) -> usize {
        self.map_claimed.fetch_add(1, Ordering::AcqRel)
    }

    pub fn publish_intermediate_total(&self, n: usize) {
        self.intermediate_total.store(n, Ordering::Release);
    }

    pub fn intermediate_total(&self) -> usize {
        self.intermediate_total.load(Ordering::Acquire)
    }

    pub fn record_shuffled(&self) {
        self.shuffled.fetch_add(1, Ordering::AcqRel);
    }

    pub fn shuffled(&self) -> usize {
        self.shuffled.load(Ordering::Acquire)
    }

    pub fn publish_grouped_total(&self, n: usize) {
        self.grouped_total.store(n, Ordering::Release);
    }

    pub fn grouped_total(&self) -> usize {
        self.grouped_total.load(Ordering::Acquire)
    }

    /// Claims the next grouped run. Indices past the run count mean there is nothing left.
    pub fn claim_run(&self) -> usize {
        self.next_run.fetch_add(1, Ordering::AcqRel)
    }

    pub fn record_reduced(&self, n: usize) {
        self.reduced.fetch_add(n, Ordering::AcqRel);
    }

    pub fn reduced(&self) -> usize {
        self.reduced.load(Ordering::Acquire)
    }

    pub fn percentage(&self, stage: Stage) -> f32 {
        match stage {
            Stage::Undefined => 0.0,
            Stage::Map => percent(self.map_claimed.load(Ordering::Acquire), self.input_len),
            Stage::Shuffle => percent(self.shuffled(), self.intermediate_total()),
            Stage::Reduce => percent(self.reduced(), self.grouped_total()),
        }
    }

    /// Reads `stage` under its lock, then the counters without it.
    pub fn snapshot(&self, stage: &StageCell) -> Result<JobState, EngineError> {
        let stage = stage.get()?;
        Ok(JobState {
            stage: stage,
            percentage: self.percentage(stage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_only_moves_forward() {
        let cell = StageCell::new();
        assert_eq!(cell.get().unwrap(), Stage::Undefined);
        cell.publish(Stage::Shuffle).unwrap();
        cell.publish(Stage::Map).unwrap();
        assert_eq!(cell.get().unwrap(), Stage::Shuffle);
        cell.publish(Stage::Reduce).unwrap();
        assert_eq!(cell.get().unwrap(), Stage::Reduce);
    }

    #[test]
    fn test_map_percentage_is_clamped() {
        let c = ProgressCounters::new(4);
        assert_eq!(c.percentage(Stage::Map), 0.0);
        c.claim_input();
        assert_eq!(c.percentage(Stage::Map), 25.0);
        for _ in 0..10 {
            c.claim_input();
        }
        assert_eq!(c.percentage(Stage::Map), 100.0);
    }

    #[test]
    fn test_zero_denominators() {
        let c = ProgressCounters::new(0);
        assert_eq!(c.percentage(Stage::Undefined), 0.0);
        assert_eq!(c.percentage(Stage::Map), 100.0);
        assert_eq!(c.percentage(Stage::Shuffle), 100.0);
        assert_eq!(c.percentage(Stage::Reduce), 100.0);
    }

    #[test]
    fn test_shuffle_and_reduce_percentages() {
        let c = ProgressCounters::new(2);
        c.publish_intermediate_total(8);
        for _ in 0..2 {
            c.record_shuffled();
        }
        assert_eq!(c.percentage(Stage::Shuffle), 25.0);

        c.publish_grouped_total(8);
        c.record_reduced(6);
        assert_eq!(c.percentage(Stage::Reduce), 75.0);
        c.record_reduced(2);
        assert_eq!(c.percentage(Stage::Reduce), 100.0);
    }

    #[test]
    fn test_claims_are_unique() {
        let c = ProgressCounters::new(3);
        let claims: Vec<usize> = (0..5).map(|_| c.claim_input()).collect();
        assert_eq!(claims, vec![0, 1, 2, 3, 4]);
        assert_eq!(c.claim_run(), 0);
        assert_eq!(c.claim_run(), 1);
    }

    #[test]
    fn test_snapshot() {
        let c = ProgressCounters::new(2);
        let cell = StageCell::new();
        assert_eq!(
            c.snapshot(&cell).unwrap(),
            JobState { stage: Stage::Undefined, percentage: 0.0 }
        );
        cell.publish(Stage::Map).unwrap();
        c.claim_input();
        assert_eq!(
            c.snapshot(&cell).unwrap(),
            JobState { stage: Stage::Map, percentage: 50.0 }
        );
    }
}
