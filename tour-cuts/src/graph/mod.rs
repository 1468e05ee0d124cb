mod edge;
mod index;
mod node;
mod tour;

pub use edge::Edge;
pub use index::{all_edges, EdgeIndex};
pub use node::{nodes, Node};
pub use tour::Tour;

/// Adjacency lists of a candidate edge set.
///
/// In a well-formed candidate every node has at most two neighbours, but
/// nothing here relies on it.
#[derive(Debug, Clone)]
pub struct CandidateGraph {
    adj: Vec<Vec<Node>>,
}

impl CandidateGraph {
    pub fn from_edges<I>(n: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = Edge>,
    {
        let mut adj = vec![Vec::with_capacity(2); n];
        for edge in edges {
            adj[edge.first().id()].push(edge.second());
            adj[edge.second().id()].push(edge.first());
        }
        Self { adj }
    }

    pub fn n(&self) -> usize {
        self.adj.len()
    }

    pub fn neighbors(&self, node: Node) -> &[Node] {
        &self.adj[node.id()]
    }

    pub fn degree(&self, node: Node) -> usize {
        self.adj[node.id()].len()
    }
}
