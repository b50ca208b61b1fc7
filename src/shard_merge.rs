//! The shuffle step: merges the sorted per-worker partitions into groups of records sharing
//! one key.
//!
//! Every partition is sorted ascending, so the back of each partition holds its largest
//! remaining key and the largest key overall sits at the back of some partition. Repeatedly
//! taking that key and popping all equal records off every partition's back yields the groups
//! in descending key order without any further comparisons against the rest of the data.

use crate::record_types::Record;
use crate::sort::keys_equal;

/// Index of the partition whose back holds the largest key, or None if all are empty.
fn max_back<K: Ord, V>(partitions: &[Vec<Record<K, V>>]) -> Option<usize> {
    let mut best: Option<(usize, &K)> = None;
    for (i, part) in partitions.iter().enumerate() {
        if let Some(r) = part.last() {
            match best {
                Some((_, k)) if r.key <= *k => (),
                _ => best = Some((i, &r.key)),
            }
        }
    }
    best.map(|(i, _)| i)
}

/// Drains `partitions` (each sorted ascending by key) into groups of equal-keyed records.
/// `on_move` is called once per record moved. Groups come out in descending key order; the
/// total number of records is preserved.
pub fn group_sorted_partitions<K: Ord, V, F: FnMut()>(
    partitions: &mut [Vec<Record<K, V>>],
    mut on_move: F,
) -> Vec<Vec<Record<K, V>>> {
    let mut groups = Vec::new();

    while let Some(first) = max_back(partitions) {
        let mut group = Vec::new();
        if let Some(r) = partitions[first].pop() {
            group.push(r);
            on_move();
        }

        for part in partitions.iter_mut() {
            while part
                .last()
                .map_or(false, |r| keys_equal(&r.key, &group[0].key))
            {
                if let Some(r) = part.pop() {
                    group.push(r);
                    on_move();
                }
            }
        }
        groups.push(group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::sort_by_key;

    fn partition(keys: &[i32]) -> Vec<Record<i32, usize>> {
        let mut p: Vec<_> = keys.iter().enumerate().map(|(i, k)| Record::new(*k, i)).collect();
        sort_by_key(&mut p);
        p
    }

    #[test]
    fn test_groups_are_complete_and_descending() {
        let mut parts = vec![
            partition(&[1, 4, 5, 5, 9]),
            partition(&[2, 2, 5, 9, 11]),
            partition(&[]),
            partition(&[5, 8, 11, 11]),
        ];
        let total: usize = parts.iter().map(|p| p.len()).sum();
        let mut moved = 0;

        let groups = group_sorted_partitions(&mut parts, || moved += 1);

        assert_eq!(moved, total);
        assert!(parts.iter().all(|p| p.is_empty()));
        assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), total);

        let keys: Vec<i32> = groups.iter().map(|g| g[0].key).collect();
        assert_eq!(keys, vec![11, 9, 8, 5, 4, 2, 1]);
        for g in &groups {
            assert!(g.iter().all(|r| r.key == g[0].key));
        }
        let fives = groups.iter().find(|g| g[0].key == 5).unwrap();
        assert_eq!(fives.len(), 4);
    }

    #[test]
    fn test_first_partition_empty_or_smaller() {
        // The largest key is not at the back of partition 0.
        let mut parts = vec![partition(&[1]), partition(&[1, 3]), partition(&[3])];
        let groups = group_sorted_partitions(&mut parts, || ());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 2);
    }

    #[test]
    fn test_no_partitions() {
        let mut parts: Vec<Vec<Record<i32, ()>>> = vec![vec![], vec![]];
        assert!(group_sorted_partitions(&mut parts, || ()).is_empty());
        let mut none: Vec<Vec<Record<i32, ()>>> = vec![];
        assert!(group_sorted_partitions(&mut none, || ()).is_empty());
    }
}
