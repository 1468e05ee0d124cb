use std::fmt;

use serde::Serialize;

/// A city inside a solve. It is identified by its position in the coordinate set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Node(usize);

impl Node {
    pub fn new(id: usize) -> Self {
        Node(id)
    }

    pub fn id(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<usize> for Node {
    fn from(id: usize) -> Self {
        Node(id)
    }
}

/// All nodes `v0, ..., v{n-1}` of a solve with `n` cities.
pub fn nodes(n: usize) -> impl Iterator<Item = Node> {
    (0..n).map(Node)
}
