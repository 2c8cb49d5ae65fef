mod aggregate;
pub use crate::kmlib::aggregate::aggregate;

mod assign;
pub use crate::kmlib::assign::{assign, DistanceTable, LocalClusters};

mod cli;
pub use crate::kmlib::cli::{ArgParser, IOParams, KMParams};

mod collective;
pub use crate::kmlib::collective::{ChannelCollective, Collective, COORDINATOR};

mod collector;
pub use crate::kmlib::collector::merge_memberships;

mod dataset;
pub use crate::kmlib::dataset::{parse_dataset, read_dataset, write_report, RunReport};

mod element;
pub use crate::kmlib::element::{update_centroid, Cluster, Clusters, Element, PartialCentroid};

mod engine;
pub use crate::kmlib::engine::{KMeans, KmConfig, Outcome, RunState, MAX_GENERATIONS};

mod errors;
pub use crate::kmlib::errors::{KmError, KmResult};

mod metrics;
pub use crate::kmlib::metrics::{
    DistanceMetric, Euclidean, Manhattan, MetricKind, SquaredEuclidean,
};

mod partition;
pub use crate::kmlib::partition::{partition, shard_bounds, shard_len, Shard};

mod runner;
pub use crate::kmlib::runner::run_local;

mod seeding;
pub use crate::kmlib::seeding::{CentroidSeeder, RandomSample, SeedKind, Spread};
