//! The MapReducer trait and associated types.

use crate::record_types::{MapEmitter, Record, ReduceEmitter};

/// A job's client: the map() and reduce() functions plus the record types flowing between
/// them. Both methods are called concurrently from different worker threads.
pub trait MapReducer: Send + Sync + 'static {
    type InKey: Send + Sync + 'static;
    type InValue: Send + Sync + 'static;
    /// Intermediate records are sorted and grouped by this key.
    type MidKey: Ord + Send + 'static;
    type MidValue: Send + 'static;
    type OutKey: Send + 'static;
    type OutValue: Send + 'static;

    /// Takes one input <key,value> pair and an emitter.
    /// The emitter is used to yield intermediate records; it may be called any number of times.
    fn map(
        &self,
        em: &mut MapEmitter<Self::MidKey, Self::MidValue>,
        key: &Self::InKey,
        value: &Self::InValue,
    );

    /// Takes all intermediate records sharing one key and emits zero or more output records.
    fn reduce(
        &self,
        em: &mut ReduceEmitter<Self::OutKey, Self::OutValue>,
        group: &[Record<Self::MidKey, Self::MidValue>],
    );
}

pub type InRecord<MR> = Record<<MR as MapReducer>::InKey, <MR as MapReducer>::InValue>;
pub type MidRecord<MR> = Record<<MR as MapReducer>::MidKey, <MR as MapReducer>::MidValue>;
pub type OutRecord<MR> = Record<<MR as MapReducer>::OutKey, <MR as MapReducer>::OutValue>;
