use std::sync::Mutex;

use crate::error::{fatal, lock};

/// A (key,value) pair. Used for input, intermediate and output records alike.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Record<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Record<K, V> {
    pub fn new(key: K, value: V) -> Record<K, V> {
        Record {
            key: key,
            value: value,
        }
    }
}

impl<K, V> From<(K, V)> for Record<K, V> {
    fn from((key, value): (K, V)) -> Record<K, V> {
        Record::new(key, value)
    }
}

/// Emitter handed to map(); appends to the calling worker's intermediate partition.
pub struct MapEmitter<'a, K, V> {
    partition: &'a Mutex<Vec<Record<K, V>>>,
    emitted: usize,
}

impl<'a, K, V> MapEmitter<'a, K, V> {
    pub fn new(partition: &'a Mutex<Vec<Record<K, V>>>) -> MapEmitter<'a, K, V> {
        MapEmitter {
            partition: partition,
            emitted: 0,
        }
    }

    pub fn emit(&mut self, key: K, value: V) {
        match lock(self.partition, "partition") {
            Ok(mut part) => part.push(Record::new(key, value)),
            Err(e) => fatal(e),
        }
        self.emitted += 1;
    }

    /// How many records went through this emitter.
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

/// Emitter handed to reduce(); appends to the job's shared output.
pub struct ReduceEmitter<'a, K, V> {
    output: &'a Mutex<Vec<Record<K, V>>>,
    emitted: usize,
}

impl<'a, K, V> ReduceEmitter<'a, K, V> {
    pub fn new(output: &'a Mutex<Vec<Record<K, V>>>) -> ReduceEmitter<'a, K, V> {
        ReduceEmitter {
            output: output,
            emitted: 0,
        }
    }

    pub fn emit(&mut self, key: K, value: V) {
        match lock(self.output, "output") {
            Ok(mut out) => out.push(Record::new(key, value)),
            Err(e) => fatal(e),
        }
        self.emitted += 1;
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_emitter_appends_in_order() {
        let part = Mutex::new(Vec::new());
        let mut e = MapEmitter::new(&part);
        e.emit("b", 1);
        e.emit("a", 2);
        assert_eq!(e.emitted(), 2);
        assert_eq!(
            part.into_inner().unwrap(),
            vec![Record::new("b", 1), Record::new("a", 2)]
        );
    }

    #[test]
    fn test_reduce_emitters_share_output() {
        let out = Mutex::new(Vec::new());
        {
            let mut e1 = ReduceEmitter::new(&out);
            let mut e2 = ReduceEmitter::new(&out);
            e1.emit(String::from("x"), 1u64);
            e2.emit(String::from("y"), 2u64);
            assert_eq!(e1.emitted(), 1);
        }
        assert_eq!(out.into_inner().unwrap().len(), 2);
    }

    #[test]
    fn test_from_tuple() {
        let r: Record<&str, i32> = ("k", 3).into();
        assert_eq!(r.key, "k");
        assert_eq!(r.value, 3);
    }
}
