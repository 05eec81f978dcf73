use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::cmp::Ordering;

/// A ranked set of points with their fitness values.
///
/// The same structure holds the whole population, a complex and a simplex;
/// only the number of rows differs. Rows of `points` are parameter vectors and
/// `fitness[i]` is the objective value of row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    /// Point coordinates, one row per point.
    pub points: Array2<f64>,
    /// Objective values, one per row.
    pub fitness: Array1<f64>,
}

/// Population of `npt = ngs * npg` points.
pub type Population = PointSet;

impl PointSet {
    /// Creates a set of `len` zero points in `nopt` dimensions with `+inf` fitness.
    pub fn zeros(len: usize, nopt: usize) -> Self {
        Self {
            points: Array2::zeros((len, nopt)),
            fitness: Array1::from_elem(len, f64::INFINITY),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.fitness.len()
    }

    /// True when the set has no points.
    pub fn is_empty(&self) -> bool {
        self.fitness.is_empty()
    }

    /// Coordinates of point `i`.
    pub fn point(&self, i: usize) -> ArrayView1<'_, f64> {
        self.points.row(i)
    }

    /// Overwrites point `i` and its fitness.
    pub fn set(&mut self, i: usize, x: ArrayView1<'_, f64>, f: f64) {
        self.points.row_mut(i).assign(&x);
        self.fitness[i] = f;
    }

    /// Copies row `src` of `other` into row `dst` of `self`.
    pub fn copy_from(&mut self, dst: usize, other: &PointSet, src: usize) {
        self.points.row_mut(dst).assign(&other.points.row(src));
        self.fitness[dst] = other.fitness[src];
    }

    /// Best point and value (slot 0 once ranked).
    pub fn best(&self) -> (Array1<f64>, f64) {
        (self.points.row(0).to_owned(), self.fitness[0])
    }

    /// Sorts the set ascending by fitness.
    ///
    /// The sort is stable, so points with equal fitness keep their order.
    pub fn rank_points(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.fitness[a]
                .partial_cmp(&self.fitness[b])
                .unwrap_or(Ordering::Equal)
        });
        if order.iter().enumerate().all(|(i, &k)| i == k) {
            return;
        }
        self.points = self.points.select(Axis(0), &order);
        self.fitness = self.fitness.select(Axis(0), &order);
    }

    /// True when fitness values are in ascending order.
    pub fn is_ranked(&self) -> bool {
        self.fitness.windows(2).into_iter().all(|w| w[0] <= w[1])
    }
}
