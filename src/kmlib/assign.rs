use crate::kmlib::{DistanceMetric, Element, KmError, KmResult, PartialCentroid, Shard};
use ndarray::Array2;
use ordered_float::OrderedFloat;

/// Dense `elements × k` table of distances for one worker's shard
pub struct DistanceTable {
    table: Array2<f64>,
}

impl DistanceTable {
    pub fn new(rows: usize, k: usize) -> Self {
        Self {
            table: Array2::zeros((rows, k)),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.table.dim()
    }

    pub fn get(&self, element: usize, centroid: usize) -> f64 {
        self.table[[element, centroid]]
    }

    /// Recompute every cell against the current centroids
    pub fn update(
        &mut self,
        shard: &Shard,
        centroids: &[Element],
        metric: &dyn DistanceMetric,
    ) -> KmResult<()> {
        for ((element, centroid), cell) in self.table.indexed_iter_mut() {
            let dist = metric.distance(&shard.elements[element], &centroids[centroid]);
            if dist.is_nan() {
                return Err(KmError::NonNumericDistance { element, centroid });
            }
            *cell = dist;
        }
        Ok(())
    }

    /// Closest centroid for a row. Ties go to the lowest centroid index.
    pub fn nearest(&self, element: usize) -> usize {
        self.table
            .row(element)
            .iter()
            .enumerate()
            .min_by_key(|&(_, &dist)| OrderedFloat(dist))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }
}

/// A worker's view of the clusters after one assignment pass
#[derive(Debug, Clone)]
pub struct LocalClusters {
    /// Local shard positions per cluster
    pub members: Vec<Vec<usize>>,
    pub partials: Vec<PartialCentroid>,
}

impl LocalClusters {
    pub fn empty(k: usize, dim: usize) -> Self {
        Self {
            members: vec![Vec::new(); k],
            partials: vec![PartialCentroid::empty(dim); k],
        }
    }

    pub fn assigned(&self) -> usize {
        self.members.iter().map(Vec::len).sum()
    }

    /// Member lists translated to dataset-wide ids
    pub fn global_members(&self, shard: &Shard) -> Vec<Vec<usize>> {
        self.members
            .iter()
            .map(|locals| locals.iter().map(|&i| shard.global_id(i)).collect())
            .collect()
    }
}

/// Put every element of the shard into its nearest cluster, folding it into
/// that cluster's running mean as it goes.
pub fn assign(shard: &Shard, table: &DistanceTable, k: usize, dim: usize) -> LocalClusters {
    let mut local = LocalClusters::empty(k, dim);
    for (idx, element) in shard.elements.iter().enumerate() {
        let nearest = table.nearest(idx);
        local.partials[nearest].absorb(element, 1);
        local.members[nearest].push(idx);
    }
    local
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmlib::{partition, Euclidean};

    fn shard_of(values: &[Element]) -> Shard {
        partition(values, 1).pop().unwrap()
    }

    #[test]
    fn table_is_shard_by_k() {
        let shard = shard_of(&[vec![0, 0], vec![3, 4], vec![6, 8]]);
        let centroids = vec![vec![0, 0], vec![6, 8]];
        let mut table = DistanceTable::new(shard.len(), centroids.len());
        table.update(&shard, &centroids, &Euclidean).unwrap();
        assert_eq!(table.shape(), (3, 2));
        assert_eq!(table.get(1, 0), 5.0);
        assert_eq!(table.get(1, 1), 5.0);
        assert_eq!(table.get(2, 0), 10.0);
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        // 5 is equidistant from 0 and 10, and from the duplicate 10
        let shard = shard_of(&[vec![5], vec![10]]);
        let centroids = vec![vec![0], vec![10], vec![10]];
        let mut table = DistanceTable::new(shard.len(), centroids.len());
        table.update(&shard, &centroids, &Euclidean).unwrap();
        assert_eq!(table.nearest(0), 0);
        assert_eq!(table.nearest(1), 1);
    }

    #[test]
    fn every_element_lands_once() {
        let values: Vec<Element> = (0..37u8).map(|i| vec![i.wrapping_mul(7), i]).collect();
        let shard = shard_of(&values);
        let centroids = vec![vec![0, 0], vec![128, 18], vec![255, 36]];
        let mut table = DistanceTable::new(shard.len(), centroids.len());
        table.update(&shard, &centroids, &Euclidean).unwrap();
        let local = assign(&shard, &table, 3, 2);
        assert_eq!(local.assigned(), shard.len());
        assert_eq!(
            local.partials.iter().map(|p| p.count).sum::<usize>(),
            shard.len()
        );
    }

    #[test]
    fn running_mean_and_global_ids() {
        let data: Vec<Element> = vec![vec![50], vec![0], vec![1], vec![2], vec![250]];
        let shard = partition(&data, 2).pop().unwrap();
        assert_eq!(shard.ids, vec![2, 3, 4]);
        let centroids = vec![vec![0], vec![255]];
        let mut table = DistanceTable::new(shard.len(), 2);
        table.update(&shard, &centroids, &Euclidean).unwrap();
        let local = assign(&shard, &table, 2, 1);
        // 1, then (1 + 2) / 2 truncated
        assert_eq!(
            local.partials[0],
            PartialCentroid {
                centroid: vec![1],
                count: 2
            }
        );
        assert_eq!(
            local.partials[1],
            PartialCentroid {
                centroid: vec![250],
                count: 1
            }
        );
        assert_eq!(local.global_members(&shard), vec![vec![2, 3], vec![4]]);
    }

    #[test]
    fn empty_cluster_reports_zero_count() {
        let shard = shard_of(&[vec![1], vec![2]]);
        let centroids = vec![vec![0], vec![200]];
        let mut table = DistanceTable::new(shard.len(), 2);
        table.update(&shard, &centroids, &Euclidean).unwrap();
        let local = assign(&shard, &table, 2, 1);
        assert_eq!(local.partials[1].count, 0);
        assert!(local.members[1].is_empty());
    }

    #[test]
    fn nan_distance_aborts() {
        let shard = shard_of(&[vec![1], vec![2]]);
        let centroids = vec![vec![0]];
        let broken = |a: &[u8], _: &[u8]| if a[0] == 2 { f64::NAN } else { 0.0 };
        let mut table = DistanceTable::new(shard.len(), 1);
        assert!(matches!(
            table.update(&shard, &centroids, &broken),
            Err(KmError::NonNumericDistance {
                element: 1,
                centroid: 0
            })
        ));
    }
}
