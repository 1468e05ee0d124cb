use crate::{
    graph::{CandidateGraph, Edge, EdgeIndex, Node},
    milp::{CandidateStatus, CutPool, LazyConstraintHandler, LinearConstraint, Relation, VarId},
    subtour::smallest_component,
};

/// Values above this count as a selected edge.
pub const SELECTION_THRESHOLD: f64 = 0.5;

/// Rejects integer candidates made of several disjoint cycles.
///
/// For a candidate whose selected edges split into more than one component,
/// the smallest component `S` is cut off with `sum(x_ij : i, j in S) <= |S| - 1`.
/// A tour through all cities uses at most `|S| - 1` edges inside any proper
/// subset, so the cut never removes a tour.
pub struct SubtourEliminator<'a> {
    nodes: &'a [Node],
    variables: &'a EdgeIndex<VarId>,
}

impl<'a> SubtourEliminator<'a> {
    pub fn new(nodes: &'a [Node], variables: &'a EdgeIndex<VarId>) -> Self {
        Self { nodes, variables }
    }

    /// Edges whose variable is selected in `values`.
    pub fn selected_edges<'b>(&'b self, values: &'b [f64]) -> impl Iterator<Item = Edge> + 'b {
        self.variables
            .iter()
            .filter(move |(_, var)| values[var.index()] > SELECTION_THRESHOLD)
            .map(|(edge, _)| edge)
    }

    /// The cut forbidding a cycle on exactly the nodes of `component`.
    pub fn elimination_cut(&self, component: &[Node]) -> LinearConstraint {
        let mut terms = Vec::with_capacity(component.len() * (component.len() - 1) / 2);
        for (k, &a) in component.iter().enumerate() {
            for &b in &component[k + 1..] {
                terms.push((self.variables[Edge::new(a, b)], 1.0));
            }
        }
        LinearConstraint::new(terms, Relation::Le, (component.len() - 1) as f64)
    }
}

impl<'a> LazyConstraintHandler for SubtourEliminator<'a> {
    fn on_candidate(&mut self, values: &[f64], pool: &mut CutPool) -> CandidateStatus {
        let graph = CandidateGraph::from_edges(self.nodes.len(), self.selected_edges(values));
        let component = smallest_component(&graph);

        if component.len() == self.nodes.len() {
            return CandidateStatus::Accepted;
        }

        log::debug!(
            "Subtour through {} of {} cities, adding cut #{}.",
            component.len(),
            self.nodes.len(),
            pool.len() + 1
        );
        pool.push(self.elimination_cut(&component));
        CandidateStatus::CutAdded
    }
}
