//! The narrow interface through which the tour model talks to a MILP engine.
//!
//! An engine knows binary variables, linear constraints and a lazy constraint
//! handler that is consulted on every integer-feasible candidate it finds.

mod branch_cut;
mod external;

use std::{fmt, time::Duration};

use serde::Serialize;

pub use self::branch_cut::{BranchAndCutEngine, BranchAndCutOptions, BranchAndCutStats};
pub use self::external::{ExternalSolver, LpModelerEngine};

/// Tolerance used when checking whether a constraint holds.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// A variable registered with an engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn new(index: usize) -> Self {
        VarId(index)
    }

    /// Position of the variable in a value slice returned by the engine.
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    Le,
    Eq,
    Ge,
}

/// `sum(coef * var) <relation> rhs`
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    terms: Vec<(VarId, f64)>,
    relation: Relation,
    rhs: f64,
}

impl LinearConstraint {
    pub fn new(terms: Vec<(VarId, f64)>, relation: Relation, rhs: f64) -> Self {
        Self {
            terms,
            relation,
            rhs,
        }
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn lhs_value(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values[var.index()])
            .sum()
    }

    pub fn is_satisfied_by(&self, values: &[f64]) -> bool {
        let lhs = self.lhs_value(values);
        match self.relation {
            Relation::Le => lhs <= self.rhs + FEASIBILITY_TOLERANCE,
            Relation::Eq => (lhs - self.rhs).abs() <= FEASIBILITY_TOLERANCE,
            Relation::Ge => lhs >= self.rhs - FEASIBILITY_TOLERANCE,
        }
    }
}

/// Constraints added during search. They are global: once pushed, every later
/// relaxation of the engine has to respect them.
#[derive(Clone, Debug, Default)]
pub struct CutPool {
    cuts: Vec<LinearConstraint>,
}

impl CutPool {
    pub fn push(&mut self, cut: LinearConstraint) {
        self.cuts.push(cut);
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn last(&self) -> Option<&LinearConstraint> {
        self.cuts.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LinearConstraint> {
        self.cuts.iter()
    }

    pub fn clear(&mut self) {
        self.cuts.clear();
    }
}

impl<'a> IntoIterator for &'a CutPool {
    type Item = &'a LinearConstraint;
    type IntoIter = std::slice::Iter<'a, LinearConstraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.cuts.iter()
    }
}

/// What a lazy constraint handler decided about a candidate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CandidateStatus {
    /// The candidate is a valid solution.
    Accepted,
    /// The candidate was rejected and a cut excluding it was pushed to the pool.
    CutAdded,
}

/// Called by an engine for every integer-feasible candidate.
///
/// `values` holds one value per variable, indexed by [`VarId::index`]. The
/// engine hands out the pool by exclusive reference, so calls never overlap.
pub trait LazyConstraintHandler {
    fn on_candidate(&mut self, values: &[f64], pool: &mut CutPool) -> CandidateStatus;
}

/// How an engine run ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TerminalStatus {
    Optimal,
    SubOptimal,
    /// The time limit was hit. Values are available only if a feasible
    /// solution was found before.
    TimeLimit,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminalStatus::Optimal => "OPTIMAL",
            TerminalStatus::SubOptimal => "SUBOPTIMAL",
            TerminalStatus::TimeLimit => "TIME_LIMIT",
            TerminalStatus::Infeasible => "INFEASIBLE",
            TerminalStatus::Unbounded => "UNBOUNDED",
            TerminalStatus::NotSolved => "NOT_SOLVED",
        };
        write!(f, "{}", name)
    }
}

/// A minimizing MILP engine over binary variables.
pub trait MilpEngine {
    fn add_binary_var(&mut self, name: &str, objective: f64) -> VarId;

    fn add_constraint(&mut self, constraint: LinearConstraint);

    /// Runs the search to termination. `handler` is consulted on every integer
    /// candidate; `time_limit` is the only way to stop a run early.
    fn optimize(
        &mut self,
        handler: &mut dyn LazyConstraintHandler,
        time_limit: Option<Duration>,
    ) -> TerminalStatus;

    /// Values of the best solution found by the last run.
    fn values(&self) -> Option<&[f64]>;

    /// Objective of the best solution found by the last run.
    fn objective_value(&self) -> Option<f64>;

    /// Cuts added by the lazy handler during the last run.
    fn cut_pool(&self) -> &CutPool;
}
