use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Distance between an element (first) and a centroid (second).
/// Smaller is closer. Shared by every worker thread of a run.
pub trait DistanceMetric: Send + Sync {
    fn distance(&self, a: &[u8], b: &[u8]) -> f64;
}

impl<F> DistanceMetric for F
where
    F: Fn(&[u8], &[u8]) -> f64 + Send + Sync,
{
    fn distance(&self, a: &[u8], b: &[u8]) -> f64 {
        self(a, b)
    }
}

/// Square root of the summed squared per-dimension differences
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl DistanceMetric for Euclidean {
    fn distance(&self, a: &[u8], b: &[u8]) -> f64 {
        SquaredEuclidean.distance(a, b).sqrt()
    }
}

/// Euclidean without the square root. Picks the same nearest centroid.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl DistanceMetric for SquaredEuclidean {
    fn distance(&self, a: &[u8], b: &[u8]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| (x as f64 - y as f64).powi(2))
            .sum::<f64>()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl DistanceMetric for Manhattan {
    fn distance(&self, a: &[u8], b: &[u8]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| (x as f64 - y as f64).abs())
            .sum::<f64>()
    }
}

#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricKind {
    #[default]
    Euclidean,
    SqEuclidean,
    Manhattan,
}

impl MetricKind {
    pub fn build(self) -> Arc<dyn DistanceMetric> {
        match self {
            MetricKind::Euclidean => Arc::new(Euclidean),
            MetricKind::SqEuclidean => Arc::new(SquaredEuclidean),
            MetricKind::Manhattan => Arc::new(Manhattan),
        }
    }
}
