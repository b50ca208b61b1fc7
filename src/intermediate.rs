//! Holds map output between the phases: one partition per worker while mapping and sorting,
//! then the grouped runs produced by the shuffle until they are reduced.

use std::mem;
use std::sync::{Mutex, OnceLock};

use crate::error::{lock, EngineError};
use crate::record_types::Record;
use crate::sort::sort_by_key;

pub struct IntermediateStore<K, V> {
    partitions: Vec<Mutex<Vec<Record<K, V>>>>,
    // Written once by the shuffle leader; every slot is emptied by exactly one reducer.
    runs: OnceLock<Vec<Mutex<Option<Vec<Record<K, V>>>>>>,
}

impl<K: Ord, V> IntermediateStore<K, V> {
    pub fn new(workers: usize, prealloc: usize) -> IntermediateStore<K, V> {
        IntermediateStore {
            partitions: (0..workers)
                .map(|_| Mutex::new(Vec::with_capacity(prealloc)))
                .collect(),
            runs: OnceLock::new(),
        }
    }

    /// The partition owned by `worker`; map emitters append to it.
    pub fn partition(&self, worker: usize) -> &Mutex<Vec<Record<K, V>>> {
        &self.partitions[worker]
    }

    pub fn sort_partition(&self, worker: usize) -> Result<usize, EngineError> {
        let mut part = lock(&self.partitions[worker], "partition")?;
        sort_by_key(&mut part);
        Ok(part.len())
    }

    /// Moves the contents of all partitions out, leaving them empty.
    pub fn take_partitions(&self) -> Result<Vec<Vec<Record<K, V>>>, EngineError> {
        let mut taken = Vec::with_capacity(self.partitions.len());
        for p in &self.partitions {
            taken.push(mem::take(&mut *lock(p, "partition")?));
        }
        Ok(taken)
    }

    pub fn publish_runs(&self, runs: Vec<Vec<Record<K, V>>>) -> Result<(), EngineError> {
        let slots = runs.into_iter().map(|r| Mutex::new(Some(r))).collect();
        self.runs
            .set(slots)
            .map_err(|_| EngineError::RunsAlreadyPublished)
    }

    /// Number of grouped runs; 0 before they are published.
    pub fn run_count(&self) -> usize {
        self.runs.get().map_or(0, |r| r.len())
    }

    /// Takes run `index` out of the store. Returns None if the index is out of range or the run
    /// was already taken.
    pub fn take_run(&self, index: usize) -> Result<Option<Vec<Record<K, V>>>, EngineError> {
        match self.runs.get().and_then(|r| r.get(index)) {
            None => Ok(None),
            Some(slot) => Ok(lock(slot, "run")?.take()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_types::MapEmitter;

    #[test]
    fn test_partitions_sort_and_drain() {
        let store = IntermediateStore::new(2, 4);
        {
            let mut e = MapEmitter::new(store.partition(1));
            e.emit(3, "c");
            e.emit(1, "a");
        }
        assert_eq!(store.sort_partition(1).unwrap(), 2);
        assert_eq!(store.sort_partition(0).unwrap(), 0);

        let parts = store.take_partitions().unwrap();
        assert!(parts[0].is_empty());
        assert_eq!(parts[1], vec![Record::new(1, "a"), Record::new(3, "c")]);
        assert!(store.partition(1).lock().unwrap().is_empty());
    }

    #[test]
    fn test_runs_are_taken_once() {
        let store: IntermediateStore<i32, ()> = IntermediateStore::new(1, 0);
        assert_eq!(store.run_count(), 0);
        assert!(store.take_run(0).unwrap().is_none());

        store
            .publish_runs(vec![vec![Record::new(2, ())], vec![Record::new(1, ()); 3]])
            .unwrap();
        assert_eq!(store.run_count(), 2);
        assert_eq!(store.take_run(1).unwrap().map(|r| r.len()), Some(3));
        assert!(store.take_run(1).unwrap().is_none());
        assert!(store.take_run(2).unwrap().is_none());

        match store.publish_runs(vec![]) {
            Err(EngineError::RunsAlreadyPublished) => (),
            _ => panic!("second publication must fail"),
        }
    }
}
