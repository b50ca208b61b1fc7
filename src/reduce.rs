//! Implements the Reduce phase.
//!

use tracing::{debug, trace};

use crate::controller::JobContext;
use crate::error::EngineError;
use crate::mapreducer::MapReducer;
use crate::progress::Stage;
use crate::record_types::ReduceEmitter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReduceStats {
    pub groups: usize,
    pub records: usize,
    pub emitted: usize,
}

/// The reduce phase as seen by one worker. Grouped runs are claimed one at a time through a
/// shared counter; a claimed run is taken out of the store, handed to reduce() and dropped.
/// The progress counter is advanced by the run's record count, not by one, because reduce
/// progress is measured in records.
pub struct ReducePartition<'a, MR: MapReducer> {
    ctx: &'a JobContext<MR>,
    worker: usize,
}

impl<'a, MR: MapReducer> ReducePartition<'a, MR> {
    pub fn new(ctx: &'a JobContext<MR>, worker: usize) -> ReducePartition<'a, MR> {
        ReducePartition {
            ctx: ctx,
            worker: worker,
        }
    }

    pub fn run(self) -> Result<ReduceStats, EngineError> {
        self.ctx.stage.publish(Stage::Reduce)?;

        let mut emitter = ReduceEmitter::new(&self.ctx.output);
        let runs = self.ctx.store.run_count();
        let mut stats = ReduceStats::default();

        loop {
            let index = self.ctx.counters.claim_run();
            if index >= runs {
                break;
            }
            // Claims are exclusive, so the slot is always still full.
            let group = match self.ctx.store.take_run(index)? {
                None => continue,
                Some(g) => g,
            };
            trace!(worker = self.worker, index, size = group.len(), "reducing group");
            self.ctx.mr.reduce(&mut emitter, &group);
            self.ctx.counters.record_reduced(group.len());

            stats.groups += 1;
            stats.records += group.len();
        }

        stats.emitted = emitter.emitted();
        debug!(worker = self.worker, groups = stats.groups, records = stats.records, "reduce phase done");
        Ok(stats)
    }
}
