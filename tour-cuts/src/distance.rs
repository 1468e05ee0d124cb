use geo::algorithm::euclidean_distance::EuclideanDistance;
use ndarray::Array2;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    coords::CoordinateSet,
    error::TspError,
    graph::{Edge, Node, Tour},
};

/// Pairwise distances between the cities of a [`CoordinateSet`].
///
/// Latitude and longitude are treated as plane coordinates, so distances are in
/// degrees and ignore the curvature of the earth. Only the upper triangle
/// `(min, max)` is stored; both orderings of a pair read the same entry.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    matrix: Array2<f64>,
}

impl DistanceMatrix {
    pub fn compute(coords: &CoordinateSet) -> Result<Self, TspError> {
        let n = coords.len();
        if n < 2 {
            return Err(TspError::Input(format!(
                "need at least 2 cities to compute distances, got {}",
                n
            )));
        }
        if let Some((city, coord)) = coords.iter().find(|(_, c)| !c.is_finite()) {
            return Err(TspError::Input(format!(
                "city {} has a non-finite coordinate ({}, {})",
                city,
                coord.lat(),
                coord.lng()
            )));
        }

        log::debug!("Computing {} pairwise distances.", n * (n - 1) / 2);

        let points: Vec<_> = coords.nodes().map(|n| coords.coordinate(n).to_point()).collect();
        let rows = (0..n)
            .into_par_iter()
            .map(|i| {
                (
                    i,
                    ((i + 1)..n)
                        .map(|j| points[i].euclidean_distance(&points[j]))
                        .collect::<Vec<f64>>(),
                )
            })
            .collect::<Vec<(usize, Vec<f64>)>>();

        let mut matrix = Array2::zeros((n, n));
        for (i, row) in rows {
            for (offset, d) in row.into_iter().enumerate() {
                matrix[[i, i + 1 + offset]] = d;
            }
        }

        Ok(DistanceMatrix { matrix })
    }

    /// Number of cities.
    pub fn n(&self) -> usize {
        self.matrix.nrows()
    }

    /// Distance between two distinct cities; `None` for a city with itself.
    pub fn get(&self, n1: Node, n2: Node) -> Option<f64> {
        if n1 == n2 || n1.id() >= self.n() || n2.id() >= self.n() {
            return None;
        }
        let x = n1.min(n2).id();
        let y = n1.max(n2).id();
        Some(self.matrix[[x, y]])
    }

    pub fn cost(&self, edge: Edge) -> f64 {
        self.matrix[[edge.first().id(), edge.second().id()]]
    }

    /// Length of the closed tour, including the edge back to its start.
    pub fn tour_length(&self, tour: &Tour) -> f64 {
        tour.edges().map(|e| self.cost(e)).sum()
    }
}
