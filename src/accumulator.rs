use ndarray::{Array2, ArrayBase, Data, DataMut, Ix1};

use crate::CHANNELS;

/// Running per-cluster coordinate sums and member counts for one pass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Accumulator {
    pub sums: Array2<f64>,
    pub counts: Vec<usize>,
}

impl Accumulator {
    pub fn new(n_clusters: usize) -> Self {
        Accumulator {
            sums: Array2::zeros((n_clusters, CHANNELS)),
            counts: vec![0; n_clusters],
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.counts.len()
    }

    /// Adds a point to cluster `label`.
    pub fn add<S>(&mut self, label: usize, x: &ArrayBase<S, Ix1>)
    where
        S: Data<Elem = f64>,
    {
        self.sums.row_mut(label).zip_mut_with(x, |a, &b| *a += b);
        self.counts[label] += 1;
    }

    /// Takes a point back out of cluster `label`.
    pub fn remove<S>(&mut self, label: usize, x: &ArrayBase<S, Ix1>)
    where
        S: Data<Elem = f64>,
    {
        self.sums.row_mut(label).zip_mut_with(x, |a, &b| *a -= b);
        self.counts[label] -= 1;
    }

    /// Makes `x` the only member of cluster `label`.
    pub fn seed<S>(&mut self, label: usize, x: &ArrayBase<S, Ix1>)
    where
        S: Data<Elem = f64>,
    {
        self.sums.row_mut(label).assign(x);
        self.counts[label] = 1;
    }

    /// Combines two partial accumulations. Order of the operands only
    /// affects floating point rounding.
    pub fn merge(mut self, other: Accumulator) -> Accumulator {
        self.absorb(&other);
        self
    }

    pub fn absorb(&mut self, other: &Accumulator) {
        self.sums += &other.sums;
        for (a, &b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
    }

    /// Writes the mean of cluster `label` into `out`. Returns `false` and
    /// leaves `out` untouched when the cluster has no members.
    pub fn mean_into<S>(&self, label: usize, out: &mut ArrayBase<S, Ix1>) -> bool
    where
        S: DataMut<Elem = f64>,
    {
        let n = self.counts[label];
        if n == 0 {
            return false;
        }
        out.assign(&self.sums.row(label));
        out.mapv_inplace(|v| v / n as f64);
        true
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Index of the first empty cluster at or after `from`.
    pub fn next_empty(&self, from: usize) -> Option<usize> {
        (from..self.n_clusters()).find(|&i| self.counts[i] == 0)
    }

    /// Cluster other than `skip` with the most members; ties keep the lowest
    /// index. `None` when every other cluster is empty.
    pub fn largest_except(&self, skip: usize) -> Option<usize> {
        let mut largest = None;
        let mut largest_count = 0;
        for (j, &count) in self.counts.iter().enumerate() {
            if j == skip {
                continue;
            }
            if count > largest_count {
                largest = Some(j);
                largest_count = count;
            }
        }
        largest
    }

    pub fn clear(&mut self) {
        self.sums.fill(0.0);
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}

/// Recomputes the accumulation for a given labelling from scratch.
#[cfg(test)]
pub(crate) fn accumulate<S>(
    points: &ArrayBase<S, ndarray::Ix2>,
    labels: &[usize],
    n_clusters: usize,
) -> Accumulator
where
    S: Data<Elem = f64>,
{
    let mut acc = Accumulator::new(n_clusters);
    ndarray::Zip::from(points.rows())
        .and(labels)
        .for_each(|x, &label| acc.add(label, &x));
    acc
}
