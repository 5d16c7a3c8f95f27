use ndarray::ArrayView2;
use rayon::prelude::*;

use crate::accumulator::Accumulator;
use crate::distance::find_closest_centroid;

/// Moves every point to its closest centroid and sums it into `acc`.
/// Returns whether any label changed.
pub(crate) fn assign_labels(
    points: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &mut [usize],
    acc: &mut Accumulator,
) -> bool {
    let mut changed = false;
    for (x, label) in points.rows().into_iter().zip(labels.iter_mut()) {
        let closest = find_closest_centroid(&x, centroids);
        if closest != *label {
            *label = closest;
            changed = true;
        }
        acc.add(closest, &x);
    }
    changed
}

/// Same as [`assign_labels`] on the current rayon pool. Each split folds into
/// its own accumulator and change flag; the partials are summed and OR-ed
/// once all splits have joined.
pub(crate) fn par_assign_labels(
    points: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    labels: &mut [usize],
    acc: &mut Accumulator,
) -> bool {
    let n_clusters = acc.n_clusters();
    let (partial, changed) = labels
        .par_iter_mut()
        .enumerate()
        .fold(
            || (Accumulator::new(n_clusters), false),
            |(mut part, changed), (i, label)| {
                let x = points.row(i);
                let closest = find_closest_centroid(&x, centroids);
                let moved = closest != *label;
                if moved {
                    *label = closest;
                }
                part.add(closest, &x);
                (part, changed || moved)
            },
        )
        .reduce(
            || (Accumulator::new(n_clusters), false),
            |(a, a_changed), (b, b_changed)| (a.merge(b), a_changed || b_changed),
        );
    acc.absorb(&partial);
    changed
}
