//! Nearest-centroid clustering of 3-channel color samples.
//!
//! Points are the rows of an `N x 3` [`ndarray`] array. The engine seeds a
//! `K x 3` centroid table from the points, then alternates an assignment
//! pass, empty-cluster repair and a centroid update until no label changes
//! or the iteration cap is reached. The same loop runs either sequentially
//! or on a [`rayon`] worker pool.
//!
//! ```
//! use ndarray::{array, Array2};
//! use pixmeans::KMeans;
//!
//! let points = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [250.0, 250.0, 250.0]];
//! let mut centroids = Array2::<f64>::zeros((2, 3));
//! let mut labels = vec![0usize; points.nrows()];
//!
//! let kmeans = KMeans::new(2).with_seed(7);
//! let result = kmeans.cluster(&points, &mut centroids, &mut labels);
//! assert!(result.iterations >= 1);
//! assert!(labels.iter().all(|&label| label < 2));
//! ```

#[macro_use]
extern crate log;

mod accumulator;
mod distance;
mod error;
mod init;
mod kmeans;

pub use crate::distance::{find_closest_centroid, pixel_dist};
pub use crate::error::{validate, KMeansError, Result};
pub use crate::init::init_centroids;
pub use crate::kmeans::{cluster_sizes, recolor, Convergence, Execution, KMeans, PhaseTimings};

/// Number of components in every feature vector.
pub const CHANNELS: usize = 3;

/// Iteration cap used when the caller does not pick one.
pub const DEFAULT_MAX_ITERS: usize = 10_000;
