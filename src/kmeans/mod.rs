use std::time::{Duration, Instant};

use ndarray::{Array1, Array2, ArrayBase, ArrayView2, ArrayViewMut2, Data, DataMut, Ix2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::accumulator::Accumulator;
use crate::error::{validate, KMeansError, Result};
use crate::init::init_centroids;
use crate::{CHANNELS, DEFAULT_MAX_ITERS};

mod assign;
mod repair;
mod update;


use self::assign::{assign_labels, par_assign_labels};
use self::repair::repair_empty_clusters;
use self::update::update_centroids;

/// How the assignment pass and the furthest-point search are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Sequential,
    /// On the rayon pool; a dedicated pool when [`KMeans::threads`] is set.
    Parallel,
}

/// Wall time spent in each phase over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimings {
    pub init: Duration,
    pub assign: Duration,
    pub repair: Duration,
    pub update: Duration,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// Completed passes, including the last one.
    pub iterations: usize,
    /// `true` when the last assignment pass moved no point, `false` when the
    /// iteration cap stopped the run.
    pub converged: bool,
    /// Empty clusters repaired over all passes.
    pub repaired: usize,
    pub timings: PhaseTimings,
}

/// Parameters for the clustering engine.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iters: usize,
    /// Seed for drawing the initial centroids.
    pub seed: u64,
    /// Worker count for parallel runs; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for KMeans {
    fn default() -> Self {
        KMeans::new(8)
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        KMeans {
            n_clusters,
            max_iters: DEFAULT_MAX_ITERS,
            seed: 0,
            threads: None,
        }
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Clusters `points` sequentially.
    ///
    /// `centroids` must be `n_clusters x 3`; its contents are replaced by
    /// seeded random draws from `points` before iterating. `labels` must hold
    /// one entry per point and is read as the previous assignment, so pass
    /// zeros for a cold start.
    ///
    /// # Panics
    ///
    /// When the buffers have the wrong shape or `n_clusters` is not in
    /// `1..=points.nrows()`. Use [`validate`] at the call site to rule these
    /// out beforehand.
    pub fn cluster<S1, S2>(
        &self,
        points: &ArrayBase<S1, Ix2>,
        centroids: &mut ArrayBase<S2, Ix2>,
        labels: &mut [usize],
    ) -> Convergence
    where
        S1: Data<Elem = f64>,
        S2: DataMut<Elem = f64>,
    {
        if let Err(err) = self.check(points, centroids, labels) {
            panic!("invalid clustering input: {}", err);
        }
        let points = points.view();
        let mut centroids = centroids.view_mut();
        self.seeded_run(&points, &mut centroids, labels, Execution::Sequential)
    }

    /// Parallel form of [`KMeans::cluster`]. Given the same seed and inputs it
    /// starts from the same centroids; results agree with the sequential
    /// form up to floating point summation order.
    pub fn cluster_parallel<S1, S2>(
        &self,
        points: &ArrayBase<S1, Ix2>,
        centroids: &mut ArrayBase<S2, Ix2>,
        labels: &mut [usize],
    ) -> Result<Convergence>
    where
        S1: Data<Elem = f64>,
        S2: DataMut<Elem = f64>,
    {
        self.check(points, centroids, labels)?;
        let points = points.view();
        let mut centroids = centroids.view_mut();
        self.install(|| self.seeded_run(&points, &mut centroids, labels, Execution::Parallel))
    }

    /// Iterates from the centroids already in `centroids`, skipping the
    /// random draw.
    pub fn cluster_from<S1, S2>(
        &self,
        points: &ArrayBase<S1, Ix2>,
        centroids: &mut ArrayBase<S2, Ix2>,
        labels: &mut [usize],
        execution: Execution,
    ) -> Result<Convergence>
    where
        S1: Data<Elem = f64>,
        S2: DataMut<Elem = f64>,
    {
        self.check(points, centroids, labels)?;
        let points = points.view();
        let mut centroids = centroids.view_mut();
        match execution {
            Execution::Sequential => Ok(self.converge(&points, &mut centroids, labels, execution)),
            Execution::Parallel => {
                self.install(|| self.converge(&points, &mut centroids, labels, execution))
            }
        }
    }

    /// Allocates the centroid table and labels, clusters sequentially and
    /// returns both.
    pub fn fit_predict<S>(
        &self,
        points: &ArrayBase<S, Ix2>,
    ) -> Result<(Array2<f64>, Array1<usize>)>
    where
        S: Data<Elem = f64>,
    {
        validate(points, self.n_clusters)?;
        let mut centroids = Array2::<f64>::zeros((self.n_clusters, CHANNELS));
        let mut labels = vec![0; points.nrows()];
        self.cluster(points, &mut centroids, &mut labels);
        Ok((centroids, Array1::from(labels)))
    }

    fn check<S1, S2>(
        &self,
        points: &ArrayBase<S1, Ix2>,
        centroids: &ArrayBase<S2, Ix2>,
        labels: &[usize],
    ) -> Result<()>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
    {
        validate(points, self.n_clusters)?;
        if centroids.ncols() != CHANNELS {
            return Err(KMeansError::ChannelMismatch {
                expected: CHANNELS,
                found: centroids.ncols(),
            });
        }
        if centroids.nrows() != self.n_clusters {
            return Err(KMeansError::ShapeMismatch {
                what: "centroid table",
                expected: self.n_clusters,
                found: centroids.nrows(),
            });
        }
        if labels.len() != points.nrows() {
            return Err(KMeansError::ShapeMismatch {
                what: "label array",
                expected: points.nrows(),
                found: labels.len(),
            });
        }
        Ok(())
    }

    /// Runs `op` on a dedicated pool of `threads` workers, or on the current
    /// pool when no worker count is set.
    fn install<T, F>(&self, op: F) -> Result<T>
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        match self.threads {
            None => Ok(op()),
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                Ok(pool.install(op))
            }
        }
    }

    fn seeded_run(
        &self,
        points: &ArrayView2<f64>,
        centroids: &mut ArrayViewMut2<f64>,
        labels: &mut [usize],
        execution: Execution,
    ) -> Convergence {
        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.seed);
        init_centroids(points, centroids, &mut rng);
        let init = start.elapsed();

        let mut result = self.converge(points, centroids, labels, execution);
        result.timings.init = init;
        result
    }

    /// Assignment, repair and update until a pass moves no point or
    /// `max_iters` passes have run.
    fn converge(
        &self,
        points: &ArrayView2<f64>,
        centroids: &mut ArrayViewMut2<f64>,
        labels: &mut [usize],
        execution: Execution,
    ) -> Convergence {
        debug!(
            "clustering {} points into {} clusters ({:?}, at most {} passes)",
            points.nrows(),
            self.n_clusters,
            execution,
            self.max_iters
        );

        let mut acc = Accumulator::new(self.n_clusters);
        let mut timings = PhaseTimings::default();
        let mut iterations = 0;
        let mut repaired = 0;
        let mut converged = false;

        while iterations < self.max_iters {
            iterations += 1;

            let start = Instant::now();
            let changed = match execution {
                Execution::Sequential => {
                    assign_labels(points, &centroids.view(), labels, &mut acc)
                }
                Execution::Parallel => {
                    par_assign_labels(points, &centroids.view(), labels, &mut acc)
                }
            };
            timings.assign += start.elapsed();

            let start = Instant::now();
            let n_repaired = repair_empty_clusters(points, centroids, labels, &mut acc, execution);
            repaired += n_repaired;
            timings.repair += start.elapsed();
            debug_assert_eq!(acc.total(), points.nrows());

            let start = Instant::now();
            update_centroids(centroids, &mut acc);
            timings.update += start.elapsed();

            trace!(
                "pass {}: changed={} repaired={}",
                iterations,
                changed,
                n_repaired
            );
            if !changed {
                converged = true;
                break;
            }
        }

        if converged {
            debug!("converged after {} passes", iterations);
        } else {
            warn!("stopped at the {} pass cap without converging", self.max_iters);
        }

        Convergence {
            iterations,
            converged,
            repaired,
            timings,
        }
    }
}

/// Number of points carrying each label.
pub fn cluster_sizes(labels: &[usize], n_clusters: usize) -> Vec<usize> {
    let mut counts = vec![0; n_clusters];
    labels.iter().for_each(|&label| {
        counts[label] += 1;
    });
    counts
}

/// Replaces every point by its centroid, giving the quantized colors.
pub fn recolor<S>(centroids: &ArrayBase<S, Ix2>, labels: &[usize]) -> Array2<f64>
where
    S: Data<Elem = f64>,
{
    Array2::from_shape_fn((labels.len(), CHANNELS), |(i, c)| centroids[[labels[i], c]])
}
