use crate::kmlib::{Element, KmError, KmResult};
use clap::ValueEnum;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Picks the starting centroids. Only ever called on the coordinator.
pub trait CentroidSeeder: Send + Sync {
    fn select(&self, data: &[Element], k: usize) -> KmResult<Vec<Element>>;
}

/// Uniform sample of k distinct elements
#[derive(Debug, Clone, Default)]
pub struct RandomSample {
    seed: Option<u64>,
}

impl RandomSample {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }
}

impl CentroidSeeder for RandomSample {
    fn select(&self, data: &[Element], k: usize) -> KmResult<Vec<Element>> {
        if k > data.len() {
            return Err(KmError::TooManyClusters { k, n: data.len() });
        }
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let picked = rand::seq::index::sample(&mut rng, data.len(), k);
        debug!("seeding from elements {:?}", picked);
        Ok(picked.into_iter().map(|idx| data[idx].clone()).collect())
    }
}

/// Deterministic: the middle element of each of k equal segments.
/// Spreads well over data that is already sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spread;

impl CentroidSeeder for Spread {
    fn select(&self, data: &[Element], k: usize) -> KmResult<Vec<Element>> {
        if k == 0 {
            return Err(KmError::ZeroClusters);
        }
        if k > data.len() {
            return Err(KmError::TooManyClusters { k, n: data.len() });
        }
        let segment_size = data.len() / k;
        Ok((0..k)
            .map(|i| data[i * segment_size + segment_size / 2].clone())
            .collect())
    }
}

#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedKind {
    #[default]
    Random,
    Spread,
}

impl SeedKind {
    pub fn build(self, seed: Option<u64>) -> Arc<dyn CentroidSeeder> {
        match self {
            SeedKind::Random => Arc::new(RandomSample::new(seed)),
            SeedKind::Spread => Arc::new(Spread),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ramp(n: usize) -> Vec<Element> {
        (0..n).map(|i| vec![i as u8]).collect()
    }

    #[test]
    fn random_sample_has_no_repeats() {
        let data = ramp(50);
        let seeds = RandomSample::new(None).select(&data, 20).unwrap();
        let unique: HashSet<_> = seeds.iter().collect();
        assert_eq!(seeds.len(), 20);
        assert_eq!(unique.len(), 20);
        assert!(seeds.iter().all(|s| data.contains(s)));
    }

    #[test]
    fn random_sample_is_reproducible_with_a_seed() {
        let data = ramp(100);
        let a = RandomSample::new(Some(42)).select(&data, 5).unwrap();
        let b = RandomSample::new(Some(42)).select(&data, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn whole_dataset_can_be_sampled() {
        let data = ramp(4);
        let mut seeds = RandomSample::new(Some(1)).select(&data, 4).unwrap();
        seeds.sort();
        assert_eq!(seeds, data);
    }

    #[test]
    fn too_many_clusters() {
        let data = ramp(3);
        assert!(matches!(
            RandomSample::new(None).select(&data, 4),
            Err(KmError::TooManyClusters { k: 4, n: 3 })
        ));
        assert!(matches!(
            Spread.select(&data, 4),
            Err(KmError::TooManyClusters { k: 4, n: 3 })
        ));
    }

    #[test]
    fn spread_takes_segment_middles() {
        let data = ramp(8);
        assert_eq!(Spread.select(&data, 2).unwrap(), vec![vec![2], vec![6]]);
        assert_eq!(Spread.select(&data, 8).unwrap(), data);
    }
}
