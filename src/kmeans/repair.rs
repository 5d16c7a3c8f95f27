use std::sync::{Mutex, PoisonError};

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut2};
use rayon::prelude::*;

use super::Execution;
use crate::accumulator::Accumulator;
use crate::distance::pixel_dist;

/// Gives every empty cluster one point, in ascending cluster order.
///
/// For each empty cluster the current largest other cluster donates the
/// member furthest from its centroid. Counts are re-read for every empty
/// cluster, so an earlier repair can change which cluster donates next.
/// Returns the number of clusters repaired.
///
/// # Panics
///
/// When an empty cluster has no donor, which needs more clusters than
/// points, or when the counts disagree with `labels`.
pub(crate) fn repair_empty_clusters(
    points: &ArrayView2<f64>,
    centroids: &mut ArrayViewMut2<f64>,
    labels: &mut [usize],
    acc: &mut Accumulator,
    execution: Execution,
) -> usize {
    let mut repaired = 0;
    let mut from = 0;
    while let Some(empty) = acc.next_empty(from) {
        from = empty + 1;

        let Some(largest) = acc.largest_except(empty) else {
            panic!("no cluster can donate a point to empty cluster {}", empty);
        };

        let furthest = {
            let centroid = centroids.row(largest);
            match execution {
                Execution::Sequential => furthest_point(points, labels, largest, &centroid),
                Execution::Parallel => par_furthest_point(points, labels, largest, &centroid),
            }
        };
        let Some(furthest) = furthest else {
            panic!(
                "cluster {} counts {} members but no label points at it",
                largest, acc.counts[largest]
            );
        };

        let x = points.row(furthest);
        centroids.row_mut(empty).assign(&x);
        labels[furthest] = empty;
        acc.seed(empty, &x);
        acc.remove(largest, &x);
        repaired += 1;

        debug!(
            "cluster {} was empty, moved point {} over from cluster {}",
            empty, furthest, largest
        );
    }
    repaired
}

/// Member of `cluster` furthest from `centroid`; ties keep the first found.
fn furthest_point(
    points: &ArrayView2<f64>,
    labels: &[usize],
    cluster: usize,
    centroid: &ArrayView1<f64>,
) -> Option<usize> {
    let mut furthest = None;
    let mut max_dist = f64::NEG_INFINITY;
    for (j, (x, &label)) in points.rows().into_iter().zip(labels).enumerate() {
        if label != cluster {
            continue;
        }
        let dist = pixel_dist(&x, centroid);
        if dist > max_dist {
            furthest = Some(j);
            max_dist = dist;
        }
    }
    furthest
}

/// Parallel [`furthest_point`]. Splits keep a local best and publish it to a
/// shared pair under a lock. Among exactly tied points the winner depends on
/// which split publishes first.
fn par_furthest_point(
    points: &ArrayView2<f64>,
    labels: &[usize],
    cluster: usize,
    centroid: &ArrayView1<f64>,
) -> Option<usize> {
    let best: Mutex<Option<(usize, f64)>> = Mutex::new(None);

    labels
        .par_iter()
        .enumerate()
        .filter(|&(_, &label)| label == cluster)
        .fold(
            || None,
            |local: Option<(usize, f64)>, (j, _)| {
                let dist = pixel_dist(&points.row(j), centroid);
                if further(local, dist) {
                    Some((j, dist))
                } else {
                    local
                }
            },
        )
        .for_each(|local| {
            if let Some((j, dist)) = local {
                let mut best = best.lock().unwrap_or_else(PoisonError::into_inner);
                if further(*best, dist) {
                    *best = Some((j, dist));
                }
            }
        });

    best.into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .map(|(j, _)| j)
}

fn further(current: Option<(usize, f64)>, dist: f64) -> bool {
    current.map_or(true, |(_, max_dist)| dist > max_dist)
}
