use std::ops::Index;

use super::{nodes, Edge};

/// Stores one value per unordered pair of distinct nodes.
///
/// Pairs are laid out in a lower triangle, so an edge is looked up by the same
/// slot no matter in which order its endpoints are given.
#[derive(Debug, Clone)]
pub struct EdgeIndex<T> {
    n: usize,
    values: Vec<T>,
}

impl<T> EdgeIndex<T> {
    /// Builds the index for `n` nodes, calling `init` once per edge in slot order.
    pub fn build<F>(n: usize, mut init: F) -> Self
    where
        F: FnMut(Edge) -> T,
    {
        let values = all_edges(n).map(|edge| init(edge)).collect();
        Self { n, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Edge, &T)> + '_ {
        all_edges(self.n).zip(self.values.iter())
    }
}

impl<T> Index<Edge> for EdgeIndex<T> {
    type Output = T;

    fn index(&self, edge: Edge) -> &Self::Output {
        &self.values[slot(edge)]
    }
}

/// Every unordered pair of `v0..v{n-1}`, in slot order.
pub fn all_edges(n: usize) -> impl Iterator<Item = Edge> {
    nodes(n).flat_map(move |second| nodes(second.id()).map(move |first| Edge::new(first, second)))
}

fn slot(edge: Edge) -> usize {
    let j = edge.second().id();
    j * (j - 1) / 2 + edge.first().id()
}
