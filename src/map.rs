//! Implements the Map phase.
//!

use tracing::{debug, trace};

use crate::controller::JobContext;
use crate::error::EngineError;
use crate::mapreducer::MapReducer;
use crate::progress::Stage;
use crate::record_types::MapEmitter;

/// What one worker did during the map phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
    pub mapped: usize,
    pub emitted: usize,
}

/// The map phase as seen by one worker. Input records are not assigned up front: every worker
/// keeps claiming the next unclaimed index until the input is exhausted, so faster workers
/// process more records. Everything the worker's map() calls emit ends up in its own partition.
pub struct MapPartition<'a, MR: MapReducer> {
    ctx: &'a JobContext<MR>,
    worker: usize,
}

impl<'a, MR: MapReducer> MapPartition<'a, MR> {
    pub fn new(ctx: &'a JobContext<MR>, worker: usize) -> MapPartition<'a, MR> {
        MapPartition {
            ctx: ctx,
            worker: worker,
        }
    }

    pub fn run(self) -> Result<MapStats, EngineError> {
        self.ctx.stage.publish(Stage::Map)?;

        let mut emitter = MapEmitter::new(self.ctx.store.partition(self.worker));
        let mut mapped = 0;

        loop {
            let index = self.ctx.counters.claim_input();
            let record = match self.ctx.input.get(index) {
                None => break,
                Some(r) => r,
            };
            trace!(worker = self.worker, index, "mapping input record");
            self.ctx.mr.map(&mut emitter, &record.key, &record.value);
            mapped += 1;
        }

        let stats = MapStats {
            mapped: mapped,
            emitted: emitter.emitted(),
        };
        debug!(worker = self.worker, mapped = stats.mapped, emitted = stats.emitted, "map phase done");
        Ok(stats)
    }
}
