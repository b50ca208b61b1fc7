//! A MapReducer that uses supplied map()/reduce() functions.

use crate::mapreducer::MapReducer;
use crate::record_types::{MapEmitter, Record, ReduceEmitter};

/// Map() function type. The MapEmitter argument is used to emit intermediate records.
pub type MapperF<K1, V1, K2, V2> = fn(&mut MapEmitter<K2, V2>, &K1, &V1);
/// Reduce() function type. The ReduceEmitter argument is used to emit output records.
pub type ReducerF<K2, V2, K3, V3> = fn(&mut ReduceEmitter<K3, V3>, &[Record<K2, V2>]);

/// This type implements the MapReducer trait. You can use it to provide your own functions to a
/// job. If you need state shared between calls, implement MapReducer on your own type instead.
pub struct ClosureMapReducer<K1, V1, K2, V2, K3, V3> {
    mapper: MapperF<K1, V1, K2, V2>,
    reducer: ReducerF<K2, V2, K3, V3>,
}

impl<K1, V1, K2, V2, K3, V3> Clone for ClosureMapReducer<K1, V1, K2, V2, K3, V3> {
    fn clone(&self) -> Self {
        ClosureMapReducer {
            mapper: self.mapper,
            reducer: self.reducer,
        }
    }
}

impl<K1, V1, K2, V2, K3, V3> ClosureMapReducer<K1, V1, K2, V2, K3, V3> {
    /// Create a new MapReducer from the supplied functions.
    pub fn new(mapper: MapperF<K1, V1, K2, V2>, reducer: ReducerF<K2, V2, K3, V3>) -> Self {
        ClosureMapReducer {
            mapper: mapper,
            reducer: reducer,
        }
    }
}

impl<K1, V1, K2, V2, K3, V3> MapReducer for ClosureMapReducer<K1, V1, K2, V2, K3, V3>
where
    K1: Send + Sync + 'static,
    V1: Send + Sync + 'static,
    K2: Ord + Send + 'static,
    V2: Send + 'static,
    K3: Send + 'static,
    V3: Send + 'static,
{
    type InKey = K1;
    type InValue = V1;
    type MidKey = K2;
    type MidValue = V2;
    type OutKey = K3;
    type OutValue = V3;

    fn map(&self, em: &mut MapEmitter<K2, V2>, key: &K1, value: &V1) {
        (self.mapper)(em, key, value)
    }

    fn reduce(&self, em: &mut ReduceEmitter<K3, V3>, group: &[Record<K2, V2>]) {
        (self.reducer)(em, group)
    }
}
