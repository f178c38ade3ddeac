use thiserror::Error;

/// Errors reported by this crate.
///
/// Empty clusters and datasets without any points are not errors, they are
/// handled by [`IterationEngine::iterate`](crate::IterationEngine::iterate) as documented there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KMeansError {
    #[error("there should be at least one cluster")]
    NoClusters,
    #[error("centroids have {centroids} dimensions, but the dataset has {dataset}")]
    DimensionMismatch { dataset: usize, centroids: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Convenient alias for results produced by this crate.
pub type Result<R> = std::result::Result<R, KMeansError>;
