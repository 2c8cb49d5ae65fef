use crate::kmlib::{Cluster, Clusters, Element, KmError, KmResult};

/// Build the final clusters from the authoritative centroids and every
/// worker's member lists (global ids, one list per cluster, rank order)
pub fn merge_memberships(
    centroids: &[Element],
    reports: Vec<Vec<Vec<usize>>>,
) -> KmResult<Clusters> {
    let k = centroids.len();
    if let Some((rank, report)) = reports.iter().enumerate().find(|(_, r)| r.len() != k) {
        return Err(KmError::Collective {
            op: "collect",
            rank,
            reason: format!("reported {} clusters, expected {}", report.len(), k),
        });
    }

    let mut clusters: Clusters = centroids.iter().cloned().map(Cluster::new).collect();
    for report in reports {
        for (cluster, members) in clusters.iter_mut().zip(report) {
            cluster.members.extend(members);
        }
    }
    Ok(clusters)
}
