//! Controls the execution of a mapreduce job.
//!
//! `JobHandle::launch()` spawns the workers and returns immediately. The handle can then be
//! polled for progress from any thread, joined any number of times, and finally closed, which
//! yields the output.

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};

use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::barrier::Barrier;
use crate::error::{fatal, lock, EngineError};
use crate::intermediate::IntermediateStore;
use crate::mapreducer::{InRecord, MapReducer, OutRecord};
use crate::parameters::JobParameters;
use crate::progress::{JobState, ProgressCounters, StageCell};
use crate::worker::{Worker, WorkerStats};

/// Everything the workers of one job share.
pub struct JobContext<MR: MapReducer> {
    pub mr: MR,
    pub input: Arc<[InRecord<MR>]>,
    pub output: Mutex<Vec<OutRecord<MR>>>,
    pub store: IntermediateStore<MR::MidKey, MR::MidValue>,
    pub counters: ProgressCounters,
    pub stage: StageCell,
    pub barrier: Barrier,

    finished_workers: AtomicUsize,
    worker_stats: Vec<OnceLock<WorkerStats>>,
    started_at: OffsetDateTime,
    finished_at: OnceLock<OffsetDateTime>,
}

impl<MR: MapReducer> JobContext<MR> {
    fn new(mr: MR, input: Arc<[InRecord<MR>]>, params: &JobParameters) -> Result<Self, EngineError> {
        let barrier = Barrier::new(params.threads)?;
        Ok(JobContext {
            mr: mr,
            counters: ProgressCounters::new(input.len()),
            input: input,
            output: Mutex::new(Vec::new()),
            store: IntermediateStore::new(params.threads, params.partition_prealloc_size),
            stage: StageCell::new(),
            barrier: barrier,
            finished_workers: AtomicUsize::new(0),
            worker_stats: (0..params.threads).map(|_| OnceLock::new()).collect(),
            started_at: OffsetDateTime::now_utc(),
            finished_at: OnceLock::new(),
        })
    }

    /// Called by every worker once it reaches Done.
    pub fn worker_done(&self, stats: WorkerStats) {
        let _ = self.worker_stats[stats.worker].set(stats);
        if self.finished_workers.fetch_add(1, Ordering::AcqRel) + 1 == self.barrier.participants() {
            let _ = self.finished_at.set(OffsetDateTime::now_utc());
        }
    }

    fn all_done(&self) -> bool {
        self.finished_workers.load(Ordering::Acquire) == self.barrier.participants()
    }

    fn elapsed(&self) -> Duration {
        match self.finished_at.get() {
            Some(t) => *t - self.started_at,
            None => OffsetDateTime::now_utc() - self.started_at,
        }
    }
}

/// Counts describing a finished job.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSummary {
    pub input_records: usize,
    pub intermediate_records: usize,
    pub groups: usize,
    pub reduced_records: usize,
    pub output_records: usize,
    pub elapsed: Duration,
    /// One entry per worker, ordered by worker id.
    pub workers: Vec<WorkerStats>,
}

/// Handle to a running (or finished) job.
pub struct JobHandle<MR: MapReducer> {
    ctx: Arc<JobContext<MR>>,
    // Taken by the first join(); concurrent joiners wait on the mutex until it is done.
    threads: Mutex<Option<Vec<JoinHandle<()>>>>,
    joined: AtomicBool,
}

impl<MR: MapReducer> JobHandle<MR> {
    /// Starts a job on `threads` worker threads with otherwise default parameters.
    pub fn launch<In: Into<Arc<[InRecord<MR>]>>>(mr: MR, input: In, threads: usize) -> JobHandle<MR> {
        JobHandle::launch_with(mr, input, &JobParameters::new().set_threads(threads))
    }

    /// Starts a job and returns without waiting for it. Worker 0 is the shuffle leader.
    pub fn launch_with<In: Into<Arc<[InRecord<MR>]>>>(
        mr: MR,
        input: In,
        params: &JobParameters,
    ) -> JobHandle<MR> {
        let ctx = match JobContext::new(mr, input.into(), params) {
            Ok(ctx) => Arc::new(ctx),
            Err(e) => fatal(e),
        };
        info!(threads = params.threads, input_records = ctx.input.len(), "launching job");

        let mut threads = Vec::with_capacity(params.threads);
        for id in 0..params.threads {
            let worker = Worker::new(id, ctx.clone());
            let spawned = thread::Builder::new()
                .name(params.thread_name(id))
                .spawn(move || {
                    if let Err(e) = worker.run_guarded() {
                        fatal(e)
                    }
                });
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(e) => fatal(EngineError::ThreadSpawn {
                    worker: id,
                    source: e,
                }),
            }
        }

        JobHandle {
            ctx: ctx,
            threads: Mutex::new(Some(threads)),
            joined: AtomicBool::new(false),
        }
    }

    /// Current stage and progress. The percentage is read after the stage, without holding the
    /// stage lock; around a stage transition it may lag behind.
    pub fn get_state(&self) -> JobState {
        match self.ctx.counters.snapshot(&self.ctx.stage) {
            Ok(state) => state,
            Err(e) => fatal(e),
        }
    }

    /// True once every worker has finished its pipeline. Does not block.
    pub fn is_done(&self) -> bool {
        self.ctx.all_done()
    }

    /// Blocks until all workers have terminated. Can be called repeatedly and from several
    /// threads at once; the worker threads are joined exactly once.
    pub fn join(&self) {
        if self.joined.load(Ordering::Acquire) {
            return;
        }
        let mut threads = match lock(&self.threads, "threads") {
            Ok(t) => t,
            Err(e) => fatal(e),
        };
        if let Some(handles) = threads.take() {
            for (id, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    fatal(EngineError::WorkerPanicked { worker: id });
                }
            }
            self.joined.store(true, Ordering::Release);
            info!(elapsed = %self.ctx.elapsed(), "job finished");
        }
    }

    /// Waits for the job and describes what it did.
    pub fn summary(&self) -> JobSummary {
        self.join();
        let output_records = match lock(&self.ctx.output, "output") {
            Ok(out) => out.len(),
            Err(e) => fatal(e),
        };
        JobSummary {
            input_records: self.ctx.counters.input_len(),
            intermediate_records: self.ctx.counters.intermediate_total(),
            groups: self.ctx.store.run_count(),
            reduced_records: self.ctx.counters.reduced(),
            output_records: output_records,
            elapsed: self.ctx.elapsed(),
            workers: self
                .ctx
                .worker_stats
                .iter()
                .filter_map(|s| s.get().copied())
                .collect(),
        }
    }

    /// Waits for the job, releases its resources and returns the output records. Their order
    /// is unspecified.
    pub fn close(self) -> Vec<OutRecord<MR>> {
        self.join();
        let output = match lock(&self.ctx.output, "output") {
            Ok(mut out) => mem::take(&mut *out),
            Err(e) => fatal(e),
        };
        output
    }
}

impl<MR: MapReducer> Drop for JobHandle<MR> {
    fn drop(&mut self) {
        // Never tear down shared state under running workers.
        if !thread::panicking() {
            self.join();
        }
    }
}
