use crate::kmlib::{KmConfig, MetricKind, SeedKind, MAX_GENERATIONS};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Clone, Debug)]
#[command(name = "shardmeans")]
#[command(about = "K-means clustering over sharded, cooperating workers")]
#[command(version)]
pub struct ArgParser {
    #[command(flatten)]
    pub io: IOParams,

    #[command(flatten)]
    pub km: KMParams,
}

#[derive(clap::Args, Clone, Debug)]
pub struct IOParams {
    /// Dataset, one element per line
    #[arg(short, long, help_heading = "I/O")]
    pub input: PathBuf,

    /// Output JSON (default stdout)
    #[arg(short, long, help_heading = "I/O")]
    pub output: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, default_value_t = false, help_heading = "I/O")]
    pub debug: bool,
}

#[derive(clap::Args, Serialize, Deserialize, Clone, Debug)]
pub struct KMParams {
    /// Number of clusters
    #[arg(short, long, help_heading = "Clustering")]
    pub k: usize,

    /// Number of cooperating workers
    #[arg(short, long, default_value_t = 1, help_heading = "Clustering")]
    pub workers: usize,

    /// Stop after this many generations even if centroids still move
    #[arg(long, default_value_t = MAX_GENERATIONS, help_heading = "Clustering")]
    pub max_generations: usize,

    /// Distance between elements and centroids
    #[arg(long, value_enum, default_value_t = MetricKind::Euclidean, help_heading = "Clustering")]
    pub metric: MetricKind,

    /// How the starting centroids are picked
    #[arg(long, value_enum, default_value_t = SeedKind::Random, help_heading = "Clustering")]
    pub seeding: SeedKind,

    /// Random seed for reproducible starting centroids
    #[arg(long, help_heading = "Clustering")]
    pub seed: Option<u64>,

    /// Element dimension (default: length of the first element)
    #[arg(long, help_heading = "Clustering")]
    pub dim: Option<usize>,
}

impl KMParams {
    pub fn config(&self, dim: usize) -> KmConfig {
        KmConfig::new(self.k, dim, self.workers).with_max_generations(self.max_generations)
    }
}

impl ArgParser {
    /// Validate command line arguments
    pub fn validate(&self) -> bool {
        let mut is_ok = validate_file(&self.io.input, "--input");

        if self.km.k < 1 {
            error!("-k must be at least 1");
            is_ok = false;
        }

        if self.km.workers < 1 {
            error!("--workers must be at least 1");
            is_ok = false;
        }

        if self.km.max_generations < 1 {
            error!("--max-generations must be at least 1");
            is_ok = false;
        }

        if self.km.dim == Some(0) {
            error!("--dim must be at least 1");
            is_ok = false;
        }

        if self.km.seed.is_some() && self.km.seeding != SeedKind::Random {
            warn!("--seed only affects --seeding random");
        }

        is_ok
    }
}

/// Helper function to validate a file's existence and type
fn validate_file(path: &Path, label: &str) -> bool {
    if !path.exists() {
        error!("{} does not exist", label);
        return false;
    }
    if !path.is_file() {
        error!("{} is not a file", label);
        return false;
    }
    true
}
