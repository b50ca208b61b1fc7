//! Ordering of intermediate records.

use std::cmp::Ordering;

use crate::record_types::Record;

/// Two keys belong to the same group iff neither is less than the other.
#[inline]
pub fn keys_equal<K: Ord>(a: &K, b: &K) -> bool {
    a.cmp(b) == Ordering::Equal
}

/// Sorts records ascending by key. Stable, so records with equal keys keep their emission
/// order.
pub fn sort_by_key<K: Ord, V>(records: &mut [Record<K, V>]) {
    records.sort_by(|a, b| a.key.cmp(&b.key));
}
