use crate::kmlib::{Element, KmError, KmResult, PartialCentroid};

/// Merge every worker's partial centroids into the next global centroids.
///
/// # Parameters
/// - `previous`: The centroids this round started from.
/// - `reports`: One report per worker, in rank order, each holding `k` partials.
///
/// # Returns
/// The merged partial for each cluster. A cluster that no worker fed keeps
/// its previous centroid and a count of zero.
///
/// Reports are folded in rank order with the truncating incremental mean, so
/// the result is deterministic for a given worker count but is not always the
/// exact mean; folding the same partials in another order can differ by one.
pub fn aggregate(
    previous: &[Element],
    reports: &[Vec<PartialCentroid>],
) -> KmResult<Vec<PartialCentroid>> {
    let k = previous.len();
    for (rank, report) in reports.iter().enumerate() {
        if report.len() != k {
            return Err(KmError::Collective {
                op: "aggregate",
                rank,
                reason: format!("reported {} clusters, expected {}", report.len(), k),
            });
        }
    }

    Ok(previous
        .iter()
        .enumerate()
        .map(|(cluster, old)| {
            let mut merged = PartialCentroid::empty(old.len());
            for report in reports {
                let part = &report[cluster];
                merged.absorb(&part.centroid, part.count);
            }
            if merged.count == 0 {
                trace!("cluster {} is empty this round", cluster);
                merged.centroid.clone_from(old);
            }
            merged
        })
        .collect())
}
