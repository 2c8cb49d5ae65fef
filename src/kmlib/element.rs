use serde::{Deserialize, Serialize};

/// A single fixed-dimension data point. Every channel lives in 0..=255.
pub type Element = Vec<u8>;
pub type Clusters = Vec<Cluster>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cluster {
    pub centroid: Element,
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn new(centroid: Element) -> Self {
        Self {
            centroid,
            members: Vec::new(),
        }
    }
}

// Equality means the same centroid, regardless of members
impl PartialEq for Cluster {
    fn eq(&self, other: &Self) -> bool {
        self.centroid == other.centroid
    }
}

impl Eq for Cluster {}

/// Running mean of one cluster as seen by one worker (or by the coordinator mid-merge)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialCentroid {
    pub centroid: Element,
    pub count: usize,
}

impl PartialCentroid {
    pub fn empty(dim: usize) -> Self {
        Self {
            centroid: vec![0; dim],
            count: 0,
        }
    }

    /// Fold `count` elements whose mean is `values` into this running mean
    pub fn absorb(&mut self, values: &[u8], count: usize) {
        update_centroid(&mut self.centroid, self.count, values, count);
        self.count += count;
    }
}

/// Incremental weighted mean, truncated back into the u8 domain after every step.
///
/// # Parameters
/// - `centroid`: The running mean, updated in place.
/// - `count`: How many elements `centroid` already represents.
/// - `incoming`: Mean of the elements being added.
/// - `incoming_count`: How many elements `incoming` represents.
///
/// Adding zero elements leaves `centroid` untouched. The arithmetic is exact
/// integer math, so the only loss is the truncation itself; applying a sequence
/// of updates in a different order can therefore give a different answer.
pub fn update_centroid(centroid: &mut [u8], count: usize, incoming: &[u8], incoming_count: usize) {
    if incoming_count == 0 {
        return;
    }
    let total = (count + incoming_count) as u128;
    for (cur, &new) in centroid.iter_mut().zip(incoming) {
        let sum = (*cur as u128) * (count as u128) + (new as u128) * (incoming_count as u128);
        // A weighted mean of u8 values cannot leave the u8 range
        *cur = (sum / total) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_update_truncates() {
        let mut c = vec![10, 200];
        update_centroid(&mut c, 3, &[11, 0], 1);
        // (30 + 11) / 4 = 10.25, (600 + 0) / 4 = 150
        assert_eq!(c, vec![10, 150]);
    }

    #[test]
    fn empty_update_is_a_noop() {
        let mut c = vec![7, 8, 9];
        update_centroid(&mut c, 0, &[1, 2, 3], 0);
        assert_eq!(c, vec![7, 8, 9]);
    }

    #[test]
    fn first_absorb_takes_the_values() {
        let mut p = PartialCentroid::empty(2);
        p.absorb(&[250, 3], 5);
        assert_eq!(p.centroid, vec![250, 3]);
        assert_eq!(p.count, 5);
    }

    #[test]
    fn large_counts_do_not_overflow() {
        let mut p = PartialCentroid::empty(1);
        p.absorb(&[255], usize::MAX / 4);
        p.absorb(&[255], usize::MAX / 4);
        assert_eq!(p.centroid, vec![255]);
    }

    #[test]
    fn cluster_equality_ignores_members() {
        let mut a = Cluster::new(vec![1, 2]);
        let b = Cluster::new(vec![1, 2]);
        a.members = vec![4, 5, 6];
        assert_eq!(a, b);
        assert_ne!(a, Cluster::new(vec![1, 3]));
    }
}
