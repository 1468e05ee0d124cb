use super::{Edge, Node};

/// A closed tour. Every node appears exactly once; the edge back from the last
/// node to the first one is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    nodes: Vec<Node>,
}

impl IntoIterator for Tour {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tour {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl Tour {
    pub(crate) fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        self.nodes.as_slice()
    }

    pub fn first(&self) -> Option<Node> {
        self.nodes.first().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The edges of the tour including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let n = self.nodes.len();
        let count = if n > 1 { n } else { 0 };
        (0..count).map(move |i| Edge::new(self.nodes[i], self.nodes[(i + 1) % n]))
    }
}

#[cfg(test)]
mod test_tour {
    use super::*;

    #[test]
    fn test_edges_wrap_around() {
        let tour = Tour::new(vec![0.into(), 2.into(), 1.into(), 3.into()]);
        let edges: Vec<Edge> = tour.edges().collect();
        assert_eq!(
            edges,
            vec![
                Edge::from((0, 2)),
                Edge::from((2, 1)),
                Edge::from((1, 3)),
                Edge::from((3, 0)),
            ]
        );
    }
}
