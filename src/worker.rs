//! The per-thread pipeline every worker runs through.
//!
//! Map → Sort → Barrier1 → (Shuffle | Wait) → Barrier2 → Reduce → Done
//!
//! All workers pass through the same states; only the shuffle depends on the worker id.
//! Barrier1 guarantees every partition is sorted before the leader reads them all; Barrier2
//! guarantees the grouped runs are published before anybody starts reducing.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::debug;

use crate::controller::JobContext;
use crate::error::EngineError;
use crate::map::{MapPartition, MapStats};
use crate::mapreducer::{MapReducer, MidRecord};
use crate::progress::Stage;
use crate::reduce::{ReducePartition, ReduceStats};
use crate::shard_merge::group_sorted_partitions;

/// The worker that performs the shuffle.
pub const SHUFFLE_LEADER: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Map,
    Sort,
    Barrier1,
    ShuffleOrWait,
    Barrier2,
    Reduce,
    Done,
}

/// What one worker did over the whole pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker: usize,
    pub map: MapStats,
    pub reduce: ReduceStats,
}

/// Runs `f` for `worker`, turning a panic that escapes it into an error.
pub fn guarded<F>(worker: usize, f: F) -> Result<(), EngineError>
where
    F: FnOnce() -> Result<(), EngineError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(res) => res,
        Err(_) => Err(EngineError::WorkerPanicked { worker: worker }),
    }
}

pub struct Worker<MR: MapReducer> {
    id: usize,
    ctx: Arc<JobContext<MR>>,
}

impl<MR: MapReducer> Worker<MR> {
    pub fn new(id: usize, ctx: Arc<JobContext<MR>>) -> Worker<MR> {
        Worker { id: id, ctx: ctx }
    }

    pub fn is_leader(&self) -> bool {
        self.id == SHUFFLE_LEADER
    }

    /// Drives this worker from Map to Done.
    pub fn run(self) -> Result<(), EngineError> {
        let mut stats = WorkerStats {
            worker: self.id,
            ..WorkerStats::default()
        };
        let mut state = WorkerState::Map;
        while state != WorkerState::Done {
            state = self.step(state, &mut stats)?;
        }
        self.ctx.worker_done(stats);
        Ok(())
    }

    /// Like `run()`, but a panic inside the pipeline (e.g. in a user callback) is reported as
    /// `WorkerPanicked` instead of unwinding out of the thread.
    pub fn run_guarded(self) -> Result<(), EngineError> {
        let id = self.id;
        guarded(id, move || self.run())
    }

    /// Executes `state` and returns the state that follows it.
    fn step(&self, state: WorkerState, stats: &mut WorkerStats) -> Result<WorkerState, EngineError> {
        debug!(worker = self.id, ?state, "entering state");
        let next = match state {
            WorkerState::Map => {
                stats.map = MapPartition::new(&self.ctx, self.id).run()?;
                WorkerState::Sort
            }
            WorkerState::Sort => {
                self.ctx.store.sort_partition(self.id)?;
                WorkerState::Barrier1
            }
            WorkerState::Barrier1 => {
                self.ctx.barrier.arrive()?;
                WorkerState::ShuffleOrWait
            }
            WorkerState::ShuffleOrWait => {
                if self.is_leader() {
                    self.shuffle()?;
                }
                WorkerState::Barrier2
            }
            WorkerState::Barrier2 => {
                self.ctx.barrier.arrive()?;
                WorkerState::Reduce
            }
            WorkerState::Reduce => {
                stats.reduce = ReducePartition::new(&self.ctx, self.id).run()?;
                WorkerState::Done
            }
            WorkerState::Done => WorkerState::Done,
        };
        Ok(next)
    }

    /// Merges all sorted partitions into grouped runs and publishes them.
    fn shuffle(&self) -> Result<(), EngineError> {
        let ctx = &self.ctx;

        let mut partitions: Vec<Vec<MidRecord<MR>>> = ctx.store.take_partitions()?;
        let total: usize = partitions.iter().map(Vec::len).sum();
        // Denominator first, so nobody observes the Shuffle stage against a zero total.
        ctx.counters.publish_intermediate_total(total);
        ctx.stage.publish(Stage::Shuffle)?;

        let runs = group_sorted_partitions(&mut partitions, || ctx.counters.record_shuffled());
        let grouped: usize = runs.iter().map(Vec::len).sum();
        debug_assert_eq!(grouped, total);

        debug!(worker = self.id, records = grouped, groups = runs.len(), "shuffle done");
        ctx.counters.publish_grouped_total(grouped);
        ctx.store.publish_runs(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_passes_results_through() {
        assert!(guarded(0, || Ok(())).is_ok());
        match guarded(2, || Err(EngineError::Poisoned { what: "run" })) {
            Err(EngineError::Poisoned { what }) => assert_eq!(what, "run"),
            _ => panic!("expected the closure's own error"),
        }
    }

    #[test]
    fn test_guarded_catches_panics() {
        match guarded(3, || panic!("callback failed")) {
            Err(EngineError::WorkerPanicked { worker }) => assert_eq!(worker, 3),
            _ => panic!("expected WorkerPanicked"),
        }
    }
}
