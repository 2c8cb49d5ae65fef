use thiserror::Error;

#[derive(Error, Debug)]
pub enum KmError {
    #[error("k must be at least 1")]
    ZeroClusters,

    #[error("dimension must be at least 1")]
    ZeroDimension,

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("max generations must be at least 1")]
    ZeroGenerations,

    #[error("k ({k}) exceeds the number of elements ({n})")]
    TooManyClusters { k: usize, n: usize },

    #[error("configured for {expected} workers but the collective group has {found}")]
    WorkerMismatch { expected: usize, found: usize },

    #[error("element {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("coordinator was not given a dataset")]
    MissingDataset,

    #[error("coordinator aborted the run")]
    Aborted,

    #[error("{op} failed on rank {rank}: {reason}")]
    Collective {
        op: &'static str,
        rank: usize,
        reason: String,
    },

    #[error("distance between element {element} and centroid {centroid} is not a number")]
    NonNumericDistance { element: usize, centroid: usize },

    #[error("worker {0} panicked")]
    WorkerPanic(usize),

    #[error("coordinator finished without a result")]
    MissingResult,

    #[error("malformed dataset line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl KmError {
    /// Errors a worker raises only because some peer failed first
    pub fn is_cascade(&self) -> bool {
        matches!(self, KmError::Collective { .. } | KmError::Aborted)
    }
}

pub type KmResult<T> = Result<T, KmError>;
