use fixedbitset::FixedBitSet;

use crate::graph::{nodes, CandidateGraph, Node};

/// Partitions the nodes of a candidate graph into connected components.
///
/// Components are reported in the order of their smallest node. Runs in time
/// linear in the number of nodes plus edges.
pub fn components(graph: &CandidateGraph) -> Vec<Vec<Node>> {
    let mut visited = FixedBitSet::with_capacity(graph.n());
    let mut components = vec![];

    for start in nodes(graph.n()) {
        if visited.contains(start.id()) {
            continue;
        }
        components.push(walk_component(graph, start, &mut visited));
    }

    components
}

/// The component with the fewest nodes. On equal sizes the first one found wins.
///
/// If the result contains every node, the candidate is connected.
pub fn smallest_component(graph: &CandidateGraph) -> Vec<Node> {
    let mut visited = FixedBitSet::with_capacity(graph.n());
    let mut smallest: Option<Vec<Node>> = None;

    for start in nodes(graph.n()) {
        if visited.contains(start.id()) {
            continue;
        }
        let component = walk_component(graph, start, &mut visited);
        log::trace!("Component of {} has {} nodes.", start, component.len());
        match &smallest {
            Some(s) if s.len() <= component.len() => {}
            _ => smallest = Some(component),
        }
    }

    smallest.unwrap_or_default()
}

fn walk_component(graph: &CandidateGraph, start: Node, visited: &mut FixedBitSet) -> Vec<Node> {
    let mut component = vec![];
    let mut stack = vec![start];
    visited.insert(start.id());
    while let Some(node) = stack.pop() {
        component.push(node);
        for &n in graph.neighbors(node) {
            if !visited.contains(n.id()) {
                visited.insert(n.id());
                stack.push(n);
            }
        }
    }
    component
}
