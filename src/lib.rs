//! Runs a mapreduce job inside one process on a fixed number of worker threads.
//!
//! Every worker maps the input records it claims into its own partition and sorts that
//! partition. After a barrier, worker 0 merges all partitions into groups of records sharing a
//! key; after a second barrier, all workers claim and reduce those groups. The caller keeps a
//! `JobHandle` for polling progress, waiting and collecting the output.
//!
//! ```
//! use lockstepmr::{ClosureMapReducer, JobHandle, MapEmitter, Record, ReduceEmitter};
//!
//! fn mapper(e: &mut MapEmitter<String, u64>, _: &usize, line: &String) {
//!     for w in line.split_whitespace() {
//!         e.emit(String::from(w), 1);
//!     }
//! }
//!
//! fn reducer(e: &mut ReduceEmitter<String, u64>, group: &[Record<String, u64>]) {
//!     e.emit(group[0].key.clone(), group.iter().map(|r| r.value).sum());
//! }
//!
//! let input = vec![Record::new(0usize, String::from("a b a"))];
//! let job = JobHandle::launch(ClosureMapReducer::new(mapper, reducer), input, 2);
//! let mut counts = job.close();
//! counts.sort_by(|a, b| a.key.cmp(&b.key));
//! assert_eq!(counts, vec![Record::new(String::from("a"), 2), Record::new(String::from("b"), 1)]);
//! ```

pub mod barrier;
pub mod closure_mr;
pub mod controller;
pub mod error;
pub mod intermediate;
pub mod map;
pub mod mapreducer;
pub mod parameters;
pub mod progress;
pub mod record_types;
pub mod reduce;
pub mod shard_merge;
pub mod sort;
pub mod worker;

pub use closure_mr::ClosureMapReducer;
pub use controller::{JobHandle, JobSummary};
pub use error::EngineError;
pub use mapreducer::MapReducer;
pub use parameters::JobParameters;
pub use progress::{JobState, Stage};
pub use record_types::{MapEmitter, Record, ReduceEmitter};
