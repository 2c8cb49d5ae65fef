use crate::kmlib::{
    CentroidSeeder, ChannelCollective, Collective, DistanceMetric, Element, KMeans, KmConfig,
    KmError, KmResult, Outcome, COORDINATOR,
};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Run a job on `config.workers` threads joined by an in-process collective group.
///
/// The configuration and dataset are checked before any worker starts. Returns
/// the coordinator's outcome, or the error that brought the run down: when one
/// worker fails, the others fail too once they notice it has gone, and those
/// follow-on errors are only reported if nothing more specific was raised.
pub fn run_local(
    dataset: Vec<Element>,
    config: KmConfig,
    metric: Arc<dyn DistanceMetric>,
    seeder: Arc<dyn CentroidSeeder>,
    progress: Option<ProgressBar>,
) -> KmResult<Outcome> {
    config.check_dataset(&dataset)?;

    info!("spawning {} workers", config.workers);
    let mut dataset = Some(dataset);
    let task_handles: Vec<JoinHandle<KmResult<Outcome>>> = ChannelCollective::group(config.workers)
        .into_iter()
        .map(|comm| {
            let m_data = if comm.is_coordinator() {
                dataset.take()
            } else {
                None
            };
            let mut m_engine = KMeans::new(config.clone(), metric.clone(), seeder.clone());
            if comm.is_coordinator() {
                if let Some(ref bar) = progress {
                    m_engine = m_engine.with_progress(bar.clone());
                }
            }
            thread::Builder::new()
                .name(format!("worker-{}", comm.rank()))
                .spawn(move || m_engine.fit(&comm, m_data.as_deref()))
        })
        .collect::<Result<_, _>>()?;

    let mut outcome = None;
    let mut failure: Option<KmError> = None;
    for (rank, handle) in task_handles.into_iter().enumerate() {
        let result = handle.join().unwrap_or(Err(KmError::WorkerPanic(rank)));
        match result {
            Ok(m_outcome) => {
                if rank == COORDINATOR {
                    outcome = Some(m_outcome);
                }
            }
            Err(e) => {
                debug!("worker {} stopped: {}", rank, e);
                // Keep the first error that isn't just fallout from another worker
                let replace = match failure {
                    None => true,
                    Some(ref prev) => prev.is_cascade() && !e.is_cascade(),
                };
                if replace {
                    failure = Some(e);
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => outcome.ok_or(KmError::MissingResult),
    }
}
