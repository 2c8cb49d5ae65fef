use crate::kmlib::Element;
use std::ops::Range;

/// One worker's contiguous piece of the dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shard {
    pub elements: Vec<Element>,
    /// Global dataset index of each local element
    pub ids: Vec<usize>,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn global_id(&self, local: usize) -> usize {
        self.ids[local]
    }
}

/// Number of elements `rank` owns. Every worker gets `n / workers` except the
/// last, which also takes the remainder.
pub fn shard_len(n: usize, workers: usize, rank: usize) -> usize {
    let each = n / workers;
    if rank + 1 == workers {
        n - each * (workers - 1)
    } else {
        each
    }
}

pub fn shard_bounds(n: usize, workers: usize, rank: usize) -> Range<usize> {
    let start = rank * (n / workers);
    start..start + shard_len(n, workers, rank)
}

/// Split the coordinator's dataset into one shard per worker, in rank order
pub fn partition(dataset: &[Element], workers: usize) -> Vec<Shard> {
    (0..workers)
        .map(|rank| {
            let bounds = shard_bounds(dataset.len(), workers, rank);
            Shard {
                elements: dataset[bounds.clone()].to_vec(),
                ids: bounds.collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_the_last_worker() {
        for &(n, p) in &[(8, 2), (10, 3), (7, 7), (100, 6), (5, 1), (13, 4)] {
            let sizes: Vec<usize> = (0..p).map(|r| shard_len(n, p, r)).collect();
            for &size in &sizes[..p - 1] {
                assert_eq!(size, n / p, "n={} p={}", n, p);
            }
            assert_eq!(sizes[p - 1], n - (p - 1) * (n / p), "n={} p={}", n, p);
            assert_eq!(sizes.iter().sum::<usize>(), n);
        }
    }

    #[test]
    fn more_workers_than_elements() {
        let sizes: Vec<usize> = (0..5).map(|r| shard_len(3, 5, r)).collect();
        assert_eq!(sizes, vec![0, 0, 0, 0, 3]);
    }

    #[test]
    fn shards_keep_global_ids() {
        let data: Vec<Element> = (0..10u8).map(|i| vec![i * 10, i]).collect();
        let shards = partition(&data, 3);
        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0].ids, vec![0, 1, 2]);
        assert_eq!(shards[1].ids, vec![3, 4, 5]);
        assert_eq!(shards[2].ids, vec![6, 7, 8, 9]);
        for shard in &shards {
            for (local, element) in shard.elements.iter().enumerate() {
                assert_eq!(element, &data[shard.global_id(local)]);
            }
        }
    }
}
