use std::{
    cmp::Ordering,
    time::{Duration, Instant},
};

use binary_heap_plus::BinaryHeap;
use compare::Compare;
use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Solution, Variable};

use super::{
    CandidateStatus, CutPool, LazyConstraintHandler, LinearConstraint, MilpEngine, Relation,
    TerminalStatus, VarId,
};

#[derive(Debug, Clone)]
pub struct BranchAndCutOptions {
    /// A relaxation value within this distance of 0 or 1 counts as integral.
    pub integrality_tolerance: f64,
    /// A node whose bound is within this distance of the incumbent is pruned.
    pub pruning_tolerance: f64,
}

impl Default for BranchAndCutOptions {
    fn default() -> Self {
        BranchAndCutOptions {
            integrality_tolerance: 1e-6,
            pruning_tolerance: 1e-9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchAndCutStats {
    pub nodes: usize,
    pub lp_solves: usize,
    pub candidates: usize,
    pub cuts: usize,
}

#[derive(Debug, Clone)]
struct Var {
    name: String,
    objective: f64,
}

#[derive(Debug, Clone)]
struct Incumbent {
    values: Vec<f64>,
    objective: f64,
}

/// An open node of the search tree: the relaxation with some variables fixed.
#[derive(Debug, Clone)]
struct SearchNode {
    id: usize,
    fixings: Vec<(VarId, f64)>,
    bound: f64,
}

/// Orders the queue so that the node with the lowest bound is popped first.
/// Among equal bounds the older node wins.
struct BoundComp;

impl Compare<SearchNode> for BoundComp {
    fn compare(&self, l: &SearchNode, r: &SearchNode) -> Ordering {
        r.bound
            .partial_cmp(&l.bound)
            .unwrap_or(Ordering::Equal)
            .then(r.id.cmp(&l.id))
    }
}

enum NodeOutcome {
    Pruned,
    TimedOut,
    Unbounded,
    Integral(Incumbent),
    Branch { var: VarId, bound: f64 },
}

/// A best-bound branch-and-cut engine for binary programs.
///
/// Every node solves the LP relaxation with `minilp`, including all cuts found
/// so far. Integral relaxation solutions are handed to the lazy constraint
/// handler; a rejected candidate's cut is added to the node's LP right away and
/// the node is solved again.
#[derive(Debug, Clone, Default)]
pub struct BranchAndCutEngine {
    vars: Vec<Var>,
    constraints: Vec<LinearConstraint>,
    cuts: CutPool,
    options: BranchAndCutOptions,
    incumbent: Option<Incumbent>,
    stats: BranchAndCutStats,
}

impl BranchAndCutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BranchAndCutOptions) -> Self {
        BranchAndCutEngine {
            options,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> BranchAndCutStats {
        self.stats
    }

    fn build_problem(&self, fixings: &[(VarId, f64)]) -> (Problem, Vec<Variable>) {
        let mut bounds = vec![(0.0, 1.0); self.vars.len()];
        for (var, value) in fixings {
            bounds[var.index()] = (*value, *value);
        }

        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let lp_vars: Vec<Variable> = self
            .vars
            .iter()
            .zip(bounds)
            .map(|(var, bound)| problem.add_var(var.objective, bound))
            .collect();

        for constraint in self.constraints.iter().chain(self.cuts.iter()) {
            let (expr, op, rhs) = lp_constraint(constraint, &lp_vars);
            problem.add_constraint(expr, op, rhs);
        }

        (problem, lp_vars)
    }

    fn is_pruned(&self, bound: f64) -> bool {
        match &self.incumbent {
            Some(incumbent) => bound >= incumbent.objective - self.options.pruning_tolerance,
            None => false,
        }
    }

    /// The variable whose value is closest to 1/2, if any value is fractional.
    fn most_fractional(&self, values: &[f64]) -> Option<VarId> {
        let mut best: Option<(VarId, f64)> = None;
        for (i, v) in values.iter().enumerate() {
            let distance = (v - v.round()).abs();
            if distance <= self.options.integrality_tolerance {
                continue;
            }
            match best {
                Some((_, d)) if d >= distance => {}
                _ => best = Some((VarId::new(i), distance)),
            }
        }
        best.map(|(var, _)| var)
    }

    fn objective_of(&self, values: &[f64]) -> f64 {
        self.vars
            .iter()
            .zip(values)
            .map(|(var, value)| var.objective * value)
            .sum()
    }

    fn process(
        &mut self,
        node: &SearchNode,
        handler: &mut dyn LazyConstraintHandler,
        deadline: Option<Instant>,
    ) -> NodeOutcome {
        let (problem, lp_vars) = self.build_problem(&node.fixings);
        self.stats.lp_solves += 1;
        let mut solution = match problem.solve() {
            Ok(solution) => solution,
            Err(minilp::Error::Infeasible) => return NodeOutcome::Pruned,
            Err(minilp::Error::Unbounded) => return NodeOutcome::Unbounded,
        };

        loop {
            let bound = solution.objective();
            if self.is_pruned(bound) {
                return NodeOutcome::Pruned;
            }

            let values: Vec<f64> = lp_vars.iter().map(|v| solution[*v]).collect();
            if let Some(var) = self.most_fractional(&values) {
                return NodeOutcome::Branch { var, bound };
            }

            let rounded: Vec<f64> = values.iter().map(|v| v.round()).collect();
            self.stats.candidates += 1;
            match handler.on_candidate(&rounded, &mut self.cuts) {
                CandidateStatus::Accepted => {
                    let objective = self.objective_of(&rounded);
                    return NodeOutcome::Integral(Incumbent {
                        values: rounded,
                        objective,
                    });
                }
                CandidateStatus::CutAdded => {
                    self.stats.cuts += 1;
                    if deadline.map_or(false, |d| Instant::now() >= d) {
                        return NodeOutcome::TimedOut;
                    }
                    solution = match self.resolve_with_last_cut(solution, &lp_vars) {
                        Some(solution) => solution,
                        None => return NodeOutcome::Pruned,
                    };
                }
            }
        }
    }

    fn resolve_with_last_cut(&mut self, solution: Solution, lp_vars: &[Variable]) -> Option<Solution> {
        let cut = self.cuts.last()?;
        let (expr, op, rhs) = lp_constraint(cut, lp_vars);
        self.stats.lp_solves += 1;
        solution.add_constraint(expr, op, rhs).ok()
    }
}

fn lp_constraint(
    constraint: &LinearConstraint,
    lp_vars: &[Variable],
) -> (LinearExpr, ComparisonOp, f64) {
    let mut expr = LinearExpr::empty();
    for (var, coef) in constraint.terms() {
        expr.add(lp_vars[var.index()], *coef);
    }
    let op = match constraint.relation() {
        Relation::Le => ComparisonOp::Le,
        Relation::Eq => ComparisonOp::Eq,
        Relation::Ge => ComparisonOp::Ge,
    };
    (expr, op, constraint.rhs())
}

impl MilpEngine for BranchAndCutEngine {
    fn add_binary_var(&mut self, name: &str, objective: f64) -> VarId {
        self.vars.push(Var {
            name: name.to_string(),
            objective,
        });
        VarId::new(self.vars.len() - 1)
    }

    fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    fn optimize(
        &mut self,
        handler: &mut dyn LazyConstraintHandler,
        time_limit: Option<Duration>,
    ) -> TerminalStatus {
        let deadline = time_limit.map(|limit| Instant::now() + limit);
        self.incumbent = None;
        self.cuts.clear();
        self.stats = BranchAndCutStats::default();

        log::info!(
            "Branch-and-cut on {} variables and {} constraints.",
            self.vars.len(),
            self.constraints.len()
        );

        let root = SearchNode {
            id: 0,
            fixings: vec![],
            bound: f64::NEG_INFINITY,
        };
        let mut next_id = 1;
        let mut queue = BinaryHeap::from_vec_cmp(vec![root], BoundComp);

        while let Some(node) = queue.pop() {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                log::warn!(
                    "Time limit reached after {} nodes, {} open.",
                    self.stats.nodes,
                    queue.len() + 1
                );
                return TerminalStatus::TimeLimit;
            }
            if self.is_pruned(node.bound) {
                continue;
            }

            self.stats.nodes += 1;
            log::trace!(
                "Node {} with {} fixings, bound {}.",
                node.id,
                node.fixings.len(),
                node.bound
            );

            match self.process(&node, handler, deadline) {
                NodeOutcome::Pruned => {}
                NodeOutcome::TimedOut => {
                    log::warn!(
                        "Time limit reached at node {}, {} open.",
                        node.id,
                        queue.len()
                    );
                    return TerminalStatus::TimeLimit;
                }
                NodeOutcome::Unbounded => return TerminalStatus::Unbounded,
                NodeOutcome::Integral(incumbent) => {
                    let improves = self
                        .incumbent
                        .as_ref()
                        .map_or(true, |current| incumbent.objective < current.objective);
                    if improves {
                        log::debug!(
                            "New incumbent {} at node {}.",
                            incumbent.objective,
                            node.id
                        );
                        self.incumbent = Some(incumbent);
                    }
                }
                NodeOutcome::Branch { var, bound } => {
                    log::trace!(
                        "Branching on {} at bound {}.",
                        self.vars[var.index()].name,
                        bound
                    );
                    for value in &[1.0, 0.0] {
                        let mut fixings = node.fixings.clone();
                        fixings.push((var, *value));
                        queue.push(SearchNode {
                            id: next_id,
                            fixings,
                            bound,
                        });
                        next_id += 1;
                    }
                }
            }
        }

        log::info!(
            "Search finished: {} nodes, {} LP solves, {} cuts.",
            self.stats.nodes,
            self.stats.lp_solves,
            self.stats.cuts
        );

        if self.incumbent.is_some() {
            TerminalStatus::Optimal
        } else {
            TerminalStatus::Infeasible
        }
    }

    fn values(&self) -> Option<&[f64]> {
        self.incumbent.as_ref().map(|i| i.values.as_slice())
    }

    fn objective_value(&self) -> Option<f64> {
        self.incumbent.as_ref().map(|i| i.objective)
    }

    fn cut_pool(&self) -> &CutPool {
        &self.cuts
    }
}
