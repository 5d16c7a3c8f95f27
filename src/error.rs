use ndarray::{ArrayBase, Data, Ix2};
use thiserror::Error;

use crate::CHANNELS;

/// Problems a caller can detect before handing buffers to the engine.
#[derive(Debug, Error)]
pub enum KMeansError {
    #[error("at least one cluster is required")]
    NoClusters,
    #[error("{n_clusters} clusters requested but only {n_points} points given")]
    TooManyClusters { n_clusters: usize, n_points: usize },
    #[error("points must have {expected} channels, found {found}")]
    ChannelMismatch { expected: usize, found: usize },
    #[error("{what} has {found} rows, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, KMeansError>;

/// Checks the preconditions the engine relies on: `1 <= n_clusters <= n_points`
/// and exactly [`CHANNELS`] columns.
pub fn validate<S>(points: &ArrayBase<S, Ix2>, n_clusters: usize) -> Result<()>
where
    S: Data<Elem = f64>,
{
    if points.ncols() != CHANNELS {
        return Err(KMeansError::ChannelMismatch {
            expected: CHANNELS,
            found: points.ncols(),
        });
    }
    if n_clusters == 0 {
        return Err(KMeansError::NoClusters);
    }
    if n_clusters > points.nrows() {
        return Err(KMeansError::TooManyClusters {
            n_clusters,
            n_points: points.nrows(),
        });
    }
    Ok(())
}
