use approx::{assert_relative_eq, relative_eq};
use ndarray::{Array2, Axis};
use pixmeans::{cluster_sizes, Execution, KMeans};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};

/// Color samples scattered around `n_blobs` well separated centers.
fn blobs(n_samples: usize, n_blobs: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 4.0).unwrap();
    let pick = Uniform::new(0, n_blobs);
    let centers: Vec<[f64; 3]> = (0..n_blobs)
        .map(|b| {
            let base = 30.0 + 60.0 * b as f64;
            [base, 255.0 - base, base / 2.0]
        })
        .collect();

    let mut points = Array2::<f64>::zeros((n_samples, 3));
    for mut row in points.axis_iter_mut(Axis(0)) {
        let center = centers[pick.sample(&mut rng)];
        for (value, c) in row.iter_mut().zip(center) {
            *value = c + noise.sample(&mut rng);
        }
    }
    points
}

fn member_mean(points: &Array2<f64>, labels: &[usize], cluster: usize) -> [f64; 3] {
    let mut sum = [0.0; 3];
    let mut count = 0;
    for (row, &label) in points.rows().into_iter().zip(labels) {
        if label == cluster {
            for (s, v) in sum.iter_mut().zip(row.iter()) {
                *s += v;
            }
            count += 1;
        }
    }
    sum.map(|s| s / count as f64)
}

#[test]
fn parallel_matches_sequential() {
    let points = blobs(3000, 4, 17);
    let initial = points.select(Axis(0), &[0, 1, 2, 3, 4]);

    let mut seq_centroids = initial.clone();
    let mut seq_labels = vec![0; points.nrows()];
    let seq = KMeans::new(5)
        .cluster_from(&points, &mut seq_centroids, &mut seq_labels, Execution::Sequential)
        .unwrap();

    let mut par_centroids = initial.clone();
    let mut par_labels = vec![0; points.nrows()];
    let par = KMeans::new(5)
        .with_threads(4)
        .cluster_from(&points, &mut par_centroids, &mut par_labels, Execution::Parallel)
        .unwrap();

    assert!(seq.converged && par.converged);
    assert_eq!(seq.iterations, par.iterations);
    assert_eq!(seq_labels, par_labels);
    for (&a, &b) in seq_centroids.iter().zip(par_centroids.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn seeded_runs_repeat() {
    let points = blobs(500, 3, 2);
    let run = || {
        let mut centroids = Array2::<f64>::zeros((3, 3));
        let mut labels = vec![0; points.nrows()];
        KMeans::new(3)
            .with_seed(42)
            .cluster(&points, &mut centroids, &mut labels);
        (centroids, labels)
    };
    assert_eq!(run(), run());
}

#[test]
fn as_many_clusters_as_points() {
    let points = blobs(12, 3, 8);
    let mut centroids = Array2::<f64>::zeros((12, 3));
    let mut labels = vec![0; 12];

    let result = KMeans::new(12)
        .with_seed(3)
        .cluster(&points, &mut centroids, &mut labels);

    assert!(result.converged);
    assert_eq!(cluster_sizes(&labels, 12), vec![1; 12]);
    for (i, &label) in labels.iter().enumerate() {
        for (&c, &p) in centroids.row(label).iter().zip(points.row(i).iter()) {
            assert_relative_eq!(c, p, epsilon = 1e-9);
        }
    }
}

proptest! {
    #[test]
    fn every_cluster_keeps_a_member(
        raw in proptest::collection::vec(0.0f64..255.0, 3usize..120),
        k in 1usize..12,
        seed in any::<u64>(),
        parallel in any::<bool>(),
    ) {
        let n = raw.len() / 3;
        prop_assume!(k <= n);
        let points = Array2::from_shape_vec((n, 3), raw[..n * 3].to_vec()).unwrap();
        let mut centroids = Array2::<f64>::zeros((k, 3));
        let mut labels = vec![0; n];

        let kmeans = KMeans::new(k).with_seed(seed).with_max_iters(500);
        if parallel {
            kmeans.cluster_parallel(&points, &mut centroids, &mut labels).unwrap();
        } else {
            kmeans.cluster(&points, &mut centroids, &mut labels);
        }

        let sizes = cluster_sizes(&labels, k);
        prop_assert_eq!(sizes.iter().sum::<usize>(), n);
        prop_assert!(sizes.iter().all(|&size| size >= 1), "sizes {:?}", sizes);

        for cluster in 0..k {
            let mean = member_mean(&points, &labels, cluster);
            for (c, m) in centroids.row(cluster).iter().zip(mean) {
                prop_assert!(
                    relative_eq!(*c, m, epsilon = 1e-9, max_relative = 1e-9),
                    "cluster {}: centroid {} vs mean {}", cluster, c, m
                );
            }
        }
    }
}
