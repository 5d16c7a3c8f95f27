use ndarray::ArrayViewMut2;

use crate::accumulator::Accumulator;

/// Moves each centroid to the mean of its members, then clears the
/// accumulator for the next pass. Runs after repair, so every cluster has
/// at least one member; a cluster without members keeps its position.
pub(crate) fn update_centroids(centroids: &mut ArrayViewMut2<f64>, acc: &mut Accumulator) {
    for (i, mut c) in centroids.rows_mut().into_iter().enumerate() {
        acc.mean_into(i, &mut c);
    }
    acc.clear();
}
