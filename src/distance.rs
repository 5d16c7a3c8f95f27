use ndarray::{ArrayBase, Data, Ix1, Ix2};

/// Euclidean distance between two color samples.
pub fn pixel_dist<S1, S2>(x: &ArrayBase<S1, Ix1>, y: &ArrayBase<S2, Ix1>) -> f64
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    x.iter()
        .zip(y.iter())
        .map(|(&a, &b)| {
            let d = a - b;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Index of the centroid closest to `x`.
///
/// Ties go to the lowest index: a later centroid only wins when it is
/// strictly closer than every centroid before it.
pub fn find_closest_centroid<S1, S2>(
    x: &ArrayBase<S1, Ix1>,
    centroids: &ArrayBase<S2, Ix2>,
) -> usize
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    let mut min_dist = f64::MAX;
    let mut min_j = 0;
    for (j, c) in centroids.rows().into_iter().enumerate() {
        let dist = pixel_dist(x, &c);
        if dist < min_dist {
            min_dist = dist;
            min_j = j;
        }
    }
    min_j
}
