use ndarray::{ArrayBase, Data, DataMut, Ix2};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Fills every centroid slot with a point drawn uniformly at random, with
/// replacement, so two slots may start on the same point.
///
/// Does nothing when there are no points to draw from.
pub fn init_centroids<S1, S2, R>(
    points: &ArrayBase<S1, Ix2>,
    centroids: &mut ArrayBase<S2, Ix2>,
    rng: &mut R,
) where
    S1: Data<Elem = f64>,
    S2: DataMut<Elem = f64>,
    R: Rng + ?Sized,
{
    let n_samples = points.nrows();
    if n_samples == 0 {
        return;
    }
    let dist = Uniform::new(0, n_samples);
    for mut c in centroids.rows_mut() {
        let idx = dist.sample(rng);
        c.assign(&points.row(idx));
    }
}
