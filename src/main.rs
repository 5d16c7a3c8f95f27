extern crate pretty_env_logger;

#[macro_use]
extern crate log;

use std::time::Instant;

use clap::{Parser, ValueEnum};
use ndarray::{Array2, Axis};
use ndarray_rand::RandomExt;
use rand::distributions::Uniform;
use rand::prelude::*;
use rand_distr::{Normal, NormalError};

use pixmeans::{cluster_sizes, recolor, validate, Convergence, KMeans, DEFAULT_MAX_ITERS};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sequential,
    Parallel,
    Both,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "pixmeans")]
#[command(about = "k-means color clustering over synthetic pixel samples")]
#[command(version)]
struct Args {
    /// Number of color samples to generate
    #[arg(long, default_value_t = 100_000)]
    samples: usize,

    /// Number of clusters
    #[arg(short = 'k', long, default_value_t = 8)]
    clusters: usize,

    /// Number of color blobs the samples are drawn around
    #[arg(long, default_value_t = 6)]
    blobs: usize,

    /// Maximum passes before giving up on convergence
    #[arg(long, default_value_t = DEFAULT_MAX_ITERS)]
    max_iters: usize,

    /// Seed for both the samples and the initial centroids
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Worker threads for the parallel run (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Which implementation(s) to run
    #[arg(long, value_enum, default_value_t = Mode::Both)]
    mode: Mode,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

impl Args {
    fn validate(&self) -> bool {
        let mut is_ok = true;
        if self.samples == 0 {
            error!("--samples must be at least 1");
            is_ok = false;
        }
        if self.blobs == 0 {
            error!("--blobs must be at least 1");
            is_ok = false;
        }
        if self.threads == Some(0) {
            error!("--threads must be at least 1");
            is_ok = false;
        }
        is_ok
    }
}

/// Color samples around `n_blobs` random centers, clamped to the 8-bit
/// channel range.
fn generate_color_samples(
    n_samples: usize,
    n_blobs: usize,
    rng: &mut StdRng,
) -> Result<Array2<f64>, NormalError> {
    let channel = Uniform::new(0.0f64, 255.0);
    let centers = Array2::random_using((n_blobs, 3), channel, rng);
    let noise = Normal::new(0.0, 12.0)?;
    let mut samples = Array2::random_using((n_samples, 3), noise, rng);

    let blob = Uniform::new(0, n_blobs);
    for mut row in samples.axis_iter_mut(Axis(0)) {
        let center = centers.row(blob.sample(rng));
        row.zip_mut_with(&center, |v, &c| *v = (*v + c).clamp(0.0, 255.0));
    }
    Ok(samples)
}

fn report(
    name: &str,
    result: &Convergence,
    centroids: &Array2<f64>,
    labels: &[usize],
    points: &Array2<f64>,
) {
    info!(
        "{}: {} passes, converged={}, {} empty clusters repaired",
        name, result.iterations, result.converged, result.repaired
    );
    debug!("{} phase timings: {:#?}", name, result.timings);

    let sizes = cluster_sizes(labels, centroids.nrows());
    for (i, (c, size)) in centroids.axis_iter(Axis(0)).zip(&sizes).enumerate() {
        info!(
            "  cluster {:>3}: {:>8} samples  ({:6.1}, {:6.1}, {:6.1})",
            i, size, c[0], c[1], c[2]
        );
    }

    let quantized = recolor(centroids, labels);
    let mse = (points - &quantized).mapv(|v| v * v).mean().unwrap_or(0.0);
    info!("{}: quantization mse {:.3}", name, mse);
}

fn main() {
    let args = Args::parse();
    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    pretty_env_logger::formatted_timed_builder()
        .filter_level(level)
        .init();

    info!("starting");
    debug!("params: {:#?}", args);
    if !args.validate() {
        error!("please fix arguments");
        std::process::exit(1);
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let points = match generate_color_samples(args.samples, args.blobs, &mut rng) {
        Ok(points) => points,
        Err(e) => {
            error!("unable to build sample distribution: {}", e);
            std::process::exit(1);
        }
    };
    info!("generated {} color samples around {} blobs", points.nrows(), args.blobs);

    if let Err(e) = validate(&points, args.clusters) {
        error!("{}", e);
        std::process::exit(1);
    }

    let mut kmeans = KMeans::new(args.clusters)
        .with_max_iters(args.max_iters)
        .with_seed(args.seed);
    kmeans.threads = args.threads;

    let mut sequential = None;
    if matches!(args.mode, Mode::Sequential | Mode::Both) {
        let mut centroids = Array2::<f64>::zeros((args.clusters, 3));
        let mut labels = vec![0; points.nrows()];
        let start = Instant::now();
        let result = kmeans.cluster(&points, &mut centroids, &mut labels);
        info!("sequential run took {:.3?}", start.elapsed());
        report("sequential", &result, &centroids, &labels, &points);
        sequential = Some((centroids, labels));
    }

    if matches!(args.mode, Mode::Parallel | Mode::Both) {
        let mut centroids = Array2::<f64>::zeros((args.clusters, 3));
        let mut labels = vec![0; points.nrows()];
        let start = Instant::now();
        let result = match kmeans.cluster_parallel(&points, &mut centroids, &mut labels) {
            Ok(result) => result,
            Err(e) => {
                error!("parallel run failed: {}", e);
                std::process::exit(1);
            }
        };
        info!(
            "parallel run on {} threads took {:.3?}",
            args.threads.unwrap_or_else(rayon::current_num_threads),
            start.elapsed()
        );
        report("parallel", &result, &centroids, &labels, &points);

        if let Some((seq_centroids, seq_labels)) = &sequential {
            let agree = seq_labels.iter().zip(&labels).filter(|(a, b)| a == b).count();
            let max_shift = (seq_centroids - &centroids)
                .iter()
                .fold(0.0f64, |m, v| m.max(v.abs()));
            info!(
                "sequential vs parallel: {}/{} labels agree, max centroid difference {:.3e}",
                agree,
                labels.len(),
                max_shift
            );
        }
    }

    info!("finished");
}
