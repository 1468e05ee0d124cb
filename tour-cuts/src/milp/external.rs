use std::{
    collections::HashMap,
    str::FromStr,
    time::{Duration, Instant},
};

use lp_modeler::dsl::*;
use lp_modeler::solvers::{CbcSolver, GurobiSolver, SolverTrait, Status};

use super::{
    CandidateStatus, CutPool, LazyConstraintHandler, LinearConstraint, MilpEngine, Relation,
    TerminalStatus, VarId,
};

/// The solver binary an [`LpModelerEngine`] calls.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExternalSolver {
    Cbc,
    Gurobi,
}

impl Default for ExternalSolver {
    fn default() -> Self {
        ExternalSolver::Cbc
    }
}

impl FromStr for ExternalSolver {
    type Err = String;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "cbc" => Ok(ExternalSolver::Cbc),
            "gurobi" => Ok(ExternalSolver::Gurobi),
            _ => Err(format!("unknown external solver '{}'", name)),
        }
    }
}

/// Runs the model on an external ILP solver through `lp-modeler`.
///
/// The solver binaries offer no callback, so lazy constraints are applied
/// between runs: solve to integer optimality, show the solution to the handler,
/// add its cut and solve again. The first solution the handler accepts is
/// optimal for the full model. The time limit is checked between runs.
#[derive(Debug, Clone)]
pub struct LpModelerEngine {
    solver: ExternalSolver,
    vars: Vec<(LpBinary, f64)>,
    constraints: Vec<LinearConstraint>,
    cuts: CutPool,
    solution: Option<(Vec<f64>, f64)>,
    rounds: usize,
}

impl LpModelerEngine {
    pub fn new(solver: ExternalSolver) -> Self {
        Self {
            solver,
            vars: vec![],
            constraints: vec![],
            cuts: CutPool::default(),
            solution: None,
            rounds: 0,
        }
    }

    /// Number of solver runs of the last optimization.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    fn objective_of(&self, values: &[f64]) -> f64 {
        self.vars
            .iter()
            .zip(values)
            .map(|((_, cost), value)| cost * value)
            .sum()
    }
}

fn build_problem(
    vars: &[(LpBinary, f64)],
    constraints: &[LinearConstraint],
    cuts: &CutPool,
) -> LpProblem {
    let mut problem = LpProblem::new("tour", LpObjective::Minimize);

    let objective: Vec<LpExpression> = vars
        .iter()
        .map(|(var, cost)| (*cost as f32) * var)
        .collect();
    problem += objective.sum();

    for constraint in constraints.iter().chain(cuts.iter()) {
        let lhs: Vec<LpExpression> = constraint
            .terms()
            .iter()
            .map(|(v, coef)| (*coef as f32) * &vars[v.index()].0)
            .collect();
        let rhs = constraint.rhs() as f32;
        problem += match constraint.relation() {
            Relation::Le => lhs.sum().le(rhs),
            Relation::Eq => lhs.sum().equal(rhs),
            Relation::Ge => lhs.sum().ge(rhs),
        };
    }

    problem
}

fn terminal_status(status: &Status) -> TerminalStatus {
    match status {
        Status::Optimal => TerminalStatus::Optimal,
        Status::SubOptimal => TerminalStatus::SubOptimal,
        Status::Infeasible => TerminalStatus::Infeasible,
        Status::Unbounded => TerminalStatus::Unbounded,
        Status::NotSolved => TerminalStatus::NotSolved,
    }
}

/// Reads one value per variable from a solver result. Variables at zero may
/// be missing from the result map.
fn read_values(vars: &[(LpBinary, f64)], results: &HashMap<String, f32>) -> Vec<f64> {
    vars.iter()
        .map(|(var, _)| match results.get(&var.name) {
            Some(&value) => (value as f64).round(),
            None => 0.0,
        })
        .collect()
}

fn run_solver(
    solver: ExternalSolver,
    vars: &[(LpBinary, f64)],
    problem: &LpProblem,
) -> (TerminalStatus, Option<Vec<f64>>) {
    let result = match solver {
        ExternalSolver::Cbc => CbcSolver::new().run(problem),
        ExternalSolver::Gurobi => GurobiSolver::new().run(problem),
    };

    match result {
        Ok(solution) => (
            terminal_status(&solution.status),
            Some(read_values(vars, &solution.results)),
        ),
        Err(msg) => {
            log::error!("External solver failed: {}", msg);
            (TerminalStatus::NotSolved, None)
        }
    }
}

/// Solves rounds until the handler accepts a candidate.
///
/// `solve_round` sees the cuts collected so far and returns the status and
/// values of one solver run. Only optimal and suboptimal runs are shown to the
/// handler; any other status ends the loop. The deadline is checked after each
/// new cut. Returns the final status, the accepted values and the number of
/// rounds.
fn cut_rounds<F>(
    mut solve_round: F,
    handler: &mut dyn LazyConstraintHandler,
    cuts: &mut CutPool,
    deadline: Option<Instant>,
) -> (TerminalStatus, Option<Vec<f64>>, usize)
where
    F: FnMut(&CutPool) -> (TerminalStatus, Option<Vec<f64>>),
{
    let mut rounds = 0;
    loop {
        rounds += 1;
        log::info!("Solver round {} with {} cuts.", rounds, cuts.len());

        let (status, values) = match solve_round(cuts) {
            (TerminalStatus::Optimal, Some(values)) => (TerminalStatus::Optimal, values),
            (TerminalStatus::SubOptimal, Some(values)) => (TerminalStatus::SubOptimal, values),
            (status, _) => return (status, None, rounds),
        };

        match handler.on_candidate(&values, cuts) {
            CandidateStatus::Accepted => return (status, Some(values), rounds),
            CandidateStatus::CutAdded => {
                if deadline.map_or(false, |d| Instant::now() >= d) {
                    log::warn!("Time limit reached after {} rounds.", rounds);
                    return (TerminalStatus::TimeLimit, None, rounds);
                }
            }
        }
    }
}

impl MilpEngine for LpModelerEngine {
    fn add_binary_var(&mut self, name: &str, objective: f64) -> VarId {
        self.vars.push((LpBinary::new(name), objective));
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
        self.solution = None;
        self.cuts.clear();

        log::info!("Calling {:?} on {} variables.", self.solver, self.vars.len());
        let solver = self.solver;
        let vars = &self.vars;
        let constraints = &self.constraints;
        let (status, values, rounds) = cut_rounds(
            |cuts| run_solver(solver, vars, &build_problem(vars, constraints, cuts)),
            handler,
            &mut self.cuts,
            deadline,
        );

        self.rounds = rounds;
        if let Some(values) = values {
            let objective = self.objective_of(&values);
            self.solution = Some((values, objective));
        }
        status
    }

    fn values(&self) -> Option<&[f64]> {
        self.solution.as_ref().map(|(values, _)| values.as_slice())
    }

    fn objective_value(&self) -> Option<f64> {
        self.solution.as_ref().map(|(_, objective)| *objective)
    }

    fn cut_pool(&self) -> &CutPool {
        &self.cuts
    }
}

#[cfg(test)]
mod test_external {
    use super::*;

    struct AcceptAll;

    impl LazyConstraintHandler for AcceptAll {
        fn on_candidate(&mut self, _: &[f64], _: &mut CutPool) -> CandidateStatus {
            CandidateStatus::Accepted
        }
    }

    /// Rejects candidates that pick variables 0 and 1 together.
    struct Conflict;

    impl LazyConstraintHandler for Conflict {
        fn on_candidate(&mut self, values: &[f64], pool: &mut CutPool) -> CandidateStatus {
            if values[0] + values[1] > 1.5 {
                pool.push(LinearConstraint::new(
                    vec![(VarId::new(0), 1.0), (VarId::new(1), 1.0)],
                    Relation::Le,
                    1.0,
                ));
                CandidateStatus::CutAdded
            } else {
                CandidateStatus::Accepted
            }
        }
    }

    #[test]
    fn test_parse_solver() {
        assert_eq!("cbc".parse::<ExternalSolver>(), Ok(ExternalSolver::Cbc));
        assert_eq!("gurobi".parse::<ExternalSolver>(), Ok(ExternalSolver::Gurobi));
        assert!("glpk".parse::<ExternalSolver>().is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(terminal_status(&Status::Optimal), TerminalStatus::Optimal);
        assert_eq!(terminal_status(&Status::SubOptimal), TerminalStatus::SubOptimal);
        assert_eq!(terminal_status(&Status::Infeasible), TerminalStatus::Infeasible);
        assert_eq!(terminal_status(&Status::Unbounded), TerminalStatus::Unbounded);
        assert_eq!(terminal_status(&Status::NotSolved), TerminalStatus::NotSolved);
    }

    #[test]
    fn test_missing_variables_read_as_zero() {
        let vars = vec![
            (LpBinary::new("x_0_1"), 1.0),
            (LpBinary::new("x_0_2"), 1.0),
            (LpBinary::new("x_1_2"), 1.0),
        ];
        let mut results = HashMap::new();
        results.insert("x_0_1".to_string(), 1.0f32);
        results.insert("x_1_2".to_string(), 0.9999f32);

        assert_eq!(read_values(&vars, &results), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_cut_then_accept() {
        let candidates = vec![vec![1.0, 1.0, 0.0], vec![1.0, 0.0, 1.0]];
        let mut seen_cuts = vec![];
        let mut cuts = CutPool::default();

        let (status, values, rounds) = cut_rounds(
            |pool| {
                seen_cuts.push(pool.len());
                let next = candidates[seen_cuts.len() - 1].clone();
                (TerminalStatus::Optimal, Some(next))
            },
            &mut Conflict,
            &mut cuts,
            None,
        );

        assert_eq!(status, TerminalStatus::Optimal);
        assert_eq!(values, Some(vec![1.0, 0.0, 1.0]));
        assert_eq!(rounds, 2);
        assert_eq!(cuts.len(), 1);
        // The second run already sees the cut of the first one.
        assert_eq!(seen_cuts, vec![0, 1]);
    }

    #[test]
    fn test_suboptimal_run_keeps_status() {
        let mut cuts = CutPool::default();
        let (status, values, _) = cut_rounds(
            |_| (TerminalStatus::SubOptimal, Some(vec![1.0, 0.0])),
            &mut AcceptAll,
            &mut cuts,
            None,
        );
        assert_eq!(status, TerminalStatus::SubOptimal);
        assert_eq!(values, Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_failed_run_ends_loop() {
        let mut cuts = CutPool::default();
        let (status, values, rounds) = cut_rounds(
            |_| (TerminalStatus::Infeasible, None),
            &mut AcceptAll,
            &mut cuts,
            None,
        );
        assert_eq!(status, TerminalStatus::Infeasible);
        assert_eq!(values, None);
        assert_eq!(rounds, 1);

        let (status, values, _) = cut_rounds(
            |_| (TerminalStatus::NotSolved, None),
            &mut AcceptAll,
            &mut cuts,
            None,
        );
        assert_eq!(status, TerminalStatus::NotSolved);
        assert_eq!(values, None);
    }

    #[test]
    fn test_deadline_after_cut() {
        let mut cuts = CutPool::default();
        let deadline = Some(Instant::now());

        let (status, values, rounds) = cut_rounds(
            |_| (TerminalStatus::Optimal, Some(vec![1.0, 1.0])),
            &mut Conflict,
            &mut cuts,
            deadline,
        );
        assert_eq!(status, TerminalStatus::TimeLimit);
        assert_eq!(values, None);
        assert_eq!(rounds, 1);
        assert_eq!(cuts.len(), 1);
    }

    /// Needs the `cbc` binary on the path.
    #[test]
    #[ignore]
    fn test_cbc_round_trip() {
        let mut engine = LpModelerEngine::new(ExternalSolver::Cbc);
        let x = engine.add_binary_var("x", 1.0);
        let y = engine.add_binary_var("y", 2.0);
        engine.add_constraint(LinearConstraint::new(
            vec![(x, 1.0), (y, 1.0)],
            Relation::Eq,
            1.0,
        ));

        assert_eq!(engine.optimize(&mut AcceptAll, None), TerminalStatus::Optimal);
        assert_eq!(engine.values(), Some(&[1.0, 0.0][..]));
    }
}
