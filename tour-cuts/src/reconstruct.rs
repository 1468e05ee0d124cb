use crate::{
    error::TspError,
    graph::{nodes, CandidateGraph, Edge, Node, Tour},
};

/// Turns the selected edges of a final solution into an ordered tour.
///
/// The edges must form a single cycle through all `n` nodes. The walk starts at
/// `v0` and always continues to the neighbour it did not come from. Any other
/// shape of edge set is reported as [`TspError::Reconstruction`]; a partial
/// tour is never returned.
pub fn tour_from_edges(n: usize, edges: &[Edge]) -> Result<Tour, TspError> {
    if n == 0 {
        return Err(TspError::Reconstruction("no cities".to_string()));
    }
    if let Some(edge) = edges.iter().find(|e| e.second().id() >= n) {
        return Err(TspError::Reconstruction(format!(
            "edge {} references an unknown city",
            edge
        )));
    }

    let graph = CandidateGraph::from_edges(n, edges.iter().copied());
    if let Some(node) = nodes(n).find(|&v| graph.degree(v) != 2) {
        return Err(TspError::Reconstruction(format!(
            "{} has {} selected edges, expected 2",
            node,
            graph.degree(node)
        )));
    }

    let start = Node::new(0);
    let mut tour = vec![start];
    let mut prev: Option<Node> = None;
    let mut current = start;

    loop {
        let adj = graph.neighbors(current);
        let next = if Some(adj[0]) != prev { adj[0] } else { adj[1] };
        if next == start {
            break;
        }
        if tour.len() == n {
            return Err(TspError::Reconstruction(format!(
                "walk exceeded {} cities without closing",
                n
            )));
        }
        tour.push(next);
        prev = Some(current);
        current = next;
    }

    if tour.len() != n {
        return Err(TspError::Reconstruction(format!(
            "cycle through {} closes after {} of {} cities",
            start,
            tour.len(),
            n
        )));
    }

    Ok(Tour::new(tour))
}
