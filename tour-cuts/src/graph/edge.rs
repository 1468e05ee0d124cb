use super::Node;

/// An undirected edge between two distinct nodes. The endpoints are stored in
/// canonical order, so `Edge::new(a, b) == Edge::new(b, a)`.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    first: Node,
    second: Node,
}

impl Edge {
    pub fn new(a: Node, b: Node) -> Self {
        debug_assert_ne!(a, b, "an edge needs two distinct endpoints");
        if a < b {
            Edge {
                first: a,
                second: b,
            }
        } else {
            Edge {
                first: b,
                second: a,
            }
        }
    }

    /// The endpoint with the smaller id.
    pub fn first(&self) -> Node {
        self.first
    }

    /// The endpoint with the larger id.
    pub fn second(&self) -> Node {
        self.second
    }
}

impl From<(usize, usize)> for Edge {
    fn from(pair: (usize, usize)) -> Self {
        Edge::new(pair.0.into(), pair.1.into())
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}
