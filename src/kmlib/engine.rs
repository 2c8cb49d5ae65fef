use crate::kmlib::{
    aggregate, assign, merge_memberships, partition, shard_len, CentroidSeeder, Clusters,
    Collective, DistanceMetric, DistanceTable, Element, KmError, KmResult, LocalClusters, Shard,
    COORDINATOR,
};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const MAX_GENERATIONS: usize = 300;

/// Fixed parameters of a run, identical on every worker
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KmConfig {
    pub k: usize,
    pub dim: usize,
    pub workers: usize,
    pub max_generations: usize,
}

impl KmConfig {
    pub fn new(k: usize, dim: usize, workers: usize) -> Self {
        Self {
            k,
            dim,
            workers,
            max_generations: MAX_GENERATIONS,
        }
    }

    pub fn with_max_generations(mut self, max_generations: usize) -> Self {
        self.max_generations = max_generations;
        self
    }

    /// Checks that do not need the data itself, plus `k <= n`
    pub fn validate(&self, n: usize) -> KmResult<()> {
        if self.k == 0 {
            return Err(KmError::ZeroClusters);
        }
        if self.dim == 0 {
            return Err(KmError::ZeroDimension);
        }
        if self.workers == 0 {
            return Err(KmError::NoWorkers);
        }
        if self.max_generations == 0 {
            return Err(KmError::ZeroGenerations);
        }
        if self.k > n {
            return Err(KmError::TooManyClusters { k: self.k, n });
        }
        if self.workers > n {
            warn!(
                "{} workers for {} elements, some shards will be empty",
                self.workers, n
            );
        }
        Ok(())
    }

    /// Full check of a dataset against this configuration
    pub fn check_dataset(&self, data: &[Element]) -> KmResult<()> {
        self.validate(data.len())?;
        match data.iter().position(|e| e.len() != self.dim) {
            Some(index) => Err(KmError::DimensionMismatch {
                index,
                expected: self.dim,
                found: data[index].len(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Iterating,
    Converged,
    Capped,
}

/// What a worker knows when `fit` returns
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: RunState,
    pub generations: usize,
    /// Only the coordinator holds the final clusters
    pub clusters: Option<Clusters>,
}

/// One worker's half of a sharded k-means run.
///
/// Every worker of the group builds its own `KMeans` with the same
/// configuration and calls [`KMeans::fit`] with its collective endpoint. The
/// coordinator also passes the dataset. The rounds run in lock-step:
/// assign locally, gather partial centroids at the coordinator, broadcast the
/// merged centroids back, and stop once a round leaves them unchanged or after
/// `max_generations` rounds.
pub struct KMeans {
    config: KmConfig,
    metric: Arc<dyn DistanceMetric>,
    seeder: Arc<dyn CentroidSeeder>,
    state: RunState,
    centroids: Vec<Element>,
    progress: Option<ProgressBar>,
}

impl KMeans {
    pub fn new(
        config: KmConfig,
        metric: Arc<dyn DistanceMetric>,
        seeder: Arc<dyn CentroidSeeder>,
    ) -> Self {
        Self {
            config,
            metric,
            seeder,
            state: RunState::Initializing,
            centroids: Vec::new(),
            progress: None,
        }
    }

    /// Tick this bar once per generation
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn centroids(&self) -> &[Element] {
        &self.centroids
    }

    /// Run the whole job on this worker. `dataset` is read on the coordinator only.
    pub fn fit<C: Collective>(
        &mut self,
        comm: &C,
        dataset: Option<&[Element]>,
    ) -> KmResult<Outcome> {
        let rank = comm.rank();
        let coordinator = comm.is_coordinator();
        self.state = RunState::Initializing;

        // Coordinator-side checks, shared so nobody waits on a run that won't happen
        let data = if coordinator { dataset } else { None };
        let checked = coordinator.then(|| {
            data.ok_or(KmError::MissingDataset)
                .and_then(|d| self.check_job(comm, d))
        });
        let n: usize = share(comm, checked)?;
        debug!("rank {} joined a run over {} elements", rank, n);

        let shard = self.distribute(comm, data)?;
        if shard.len() != shard_len(n, comm.size(), rank) {
            return Err(KmError::Collective {
                op: "scatter",
                rank,
                reason: format!("received {} elements", shard.len()),
            });
        }
        let mut table = DistanceTable::new(shard.len(), self.config.k);

        let seeds = data.map(|d| self.seeder.select(d, self.config.k));
        self.synchronize(comm, seeds)?;

        self.state = RunState::Iterating;
        let mut local = LocalClusters::empty(self.config.k, self.config.dim);
        let mut generations = 0;
        while generations < self.config.max_generations {
            debug!("{} working on generation {}", rank, generations);
            table.update(&shard, &self.centroids, self.metric.as_ref())?;
            local = assign(&shard, &table, self.config.k, self.config.dim);

            let previous = self.centroids.clone();
            let merged = self.combine(comm, &local)?;
            self.synchronize(comm, merged)?;
            generations += 1;

            if let Some(ref bar) = self.progress {
                bar.inc(1);
            }
            if previous == self.centroids {
                self.state = RunState::Converged;
                break;
            }
        }

        if self.state != RunState::Converged {
            self.state = RunState::Capped;
            if coordinator {
                warn!(
                    "centroids still moving after {} generations",
                    self.config.max_generations
                );
            }
        }
        if let Some(ref bar) = self.progress {
            bar.finish();
        }

        let clusters = self.collect(comm, &local, &shard)?;
        if coordinator {
            info!("{:?} after {} generations", self.state, generations);
        }

        Ok(Outcome {
            state: self.state,
            generations,
            clusters,
        })
    }

    fn check_job<C: Collective>(&self, comm: &C, data: &[Element]) -> KmResult<usize> {
        if comm.size() != self.config.workers {
            return Err(KmError::WorkerMismatch {
                expected: self.config.workers,
                found: comm.size(),
            });
        }
        self.config.check_dataset(data)?;
        Ok(data.len())
    }

    /// Partitioner: each worker blocks until it holds its shard
    fn distribute<C: Collective>(&self, comm: &C, data: Option<&[Element]>) -> KmResult<Shard> {
        let shard = comm.scatter(COORDINATOR, data.map(|d| partition(d, comm.size())))?;
        debug!("rank {} holds {} elements", comm.rank(), shard.len());
        Ok(shard)
    }

    /// Centroid synchronizer: overwrite every worker's centroids with the coordinator's
    fn synchronize<C: Collective>(
        &mut self,
        comm: &C,
        centroids: Option<KmResult<Vec<Element>>>,
    ) -> KmResult<()> {
        let centroids = share(comm, centroids)?;
        if centroids.len() != self.config.k {
            return Err(KmError::Collective {
                op: "broadcast",
                rank: comm.rank(),
                reason: format!("received {} centroids", centroids.len()),
            });
        }
        if let Some(index) = centroids.iter().position(|c| c.len() != self.config.dim) {
            return Err(KmError::DimensionMismatch {
                index,
                expected: self.config.dim,
                found: centroids[index].len(),
            });
        }
        trace!("rank {} centroids {:?}", comm.rank(), centroids);
        self.centroids = centroids;
        Ok(())
    }

    /// Centroid aggregator: the coordinator gets `Some` merged centroids
    fn combine<C: Collective>(
        &self,
        comm: &C,
        local: &LocalClusters,
    ) -> KmResult<Option<KmResult<Vec<Element>>>> {
        let reports = comm.gather(COORDINATOR, local.partials.clone())?;
        Ok(reports.map(|reports| {
            aggregate(&self.centroids, &reports).map(|merged| {
                debug!(
                    "cluster sizes {:?}",
                    merged.iter().map(|p| p.count).collect::<Vec<_>>()
                );
                merged.into_iter().map(|p| p.centroid).collect()
            })
        }))
    }

    /// Result collector: last memberships as global ids, merged on the coordinator
    fn collect<C: Collective>(
        &self,
        comm: &C,
        local: &LocalClusters,
        shard: &Shard,
    ) -> KmResult<Option<Clusters>> {
        let reports = comm.gather(COORDINATOR, local.global_members(shard))?;
        reports
            .map(|reports| merge_memberships(&self.centroids, reports))
            .transpose()
    }
}

/// Broadcast a coordinator-side result. A coordinator error is sent as an
/// abort so the other workers return instead of waiting on the next collective.
fn share<C, T>(comm: &C, local: Option<KmResult<T>>) -> KmResult<T>
where
    C: Collective,
    T: Clone + Send + 'static,
{
    match local {
        Some(Ok(value)) => comm
            .broadcast(COORDINATOR, Some(Some(value)))?
            .ok_or(KmError::Aborted),
        Some(Err(e)) => {
            comm.broadcast::<Option<T>>(COORDINATOR, Some(None))?;
            Err(e)
        }
        None => comm
            .broadcast::<Option<T>>(COORDINATOR, None)?
            .ok_or(KmError::Aborted),
    }
}
