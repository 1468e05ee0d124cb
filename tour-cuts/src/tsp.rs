use std::time::Duration;

use crate::{
    coords::{City, CoordinateSet},
    cuts::{SubtourEliminator, SELECTION_THRESHOLD},
    distance::DistanceMatrix,
    error::TspError,
    graph::{Edge, EdgeIndex, Node, Tour},
    milp::{BranchAndCutEngine, LinearConstraint, MilpEngine, Relation, TerminalStatus, VarId},
    reconstruct::tour_from_edges,
};

#[derive(Debug, Clone, Default)]
pub struct SolverOptions {
    /// Wall-clock budget handed to the engine. `None` runs to optimality.
    pub time_limit: Option<Duration>,
}

impl SolverOptions {
    pub fn with_time_limit(time_limit: Option<Duration>) -> Self {
        SolverOptions { time_limit }
    }
}

/// The result of a successful solve.
#[derive(Debug, Clone)]
pub struct SolvedTour {
    tour: Tour,
    cities: Vec<City>,
    objective: f64,
    status: TerminalStatus,
}

impl SolvedTour {
    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    /// The cities in tour order, starting with the first city of the input.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Total length in the units of [`DistanceMatrix`], as reported by the engine.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn status(&self) -> TerminalStatus {
        self.status
    }

    /// Whether the tour is proven minimal. Tours accepted under any other
    /// status are valid but possibly longer than necessary.
    pub fn is_optimal(&self) -> bool {
        self.status == TerminalStatus::Optimal
    }
}

/// Computes a shortest tour through all cities with the built-in branch-and-cut
/// engine.
pub fn solve(coords: &CoordinateSet, time_limit: Option<Duration>) -> Result<SolvedTour, TspError> {
    let mut engine = BranchAndCutEngine::new();
    solve_with(&mut engine, coords, &SolverOptions::with_time_limit(time_limit))
}

/// Builds the tour model on a fresh `engine`, runs it with subtour elimination
/// and extracts the tour.
///
/// The model has one binary variable per pair of cities, weighted by distance,
/// and requires every city to have exactly two selected edges. Connectivity is
/// enforced lazily by [`SubtourEliminator`].
pub fn solve_with<E>(
    engine: &mut E,
    coords: &CoordinateSet,
    options: &SolverOptions,
) -> Result<SolvedTour, TspError>
where
    E: MilpEngine,
{
    let n = coords.len();
    if n < 3 {
        return Err(TspError::Input(format!(
            "need at least 3 cities to form a tour, got {}",
            n
        )));
    }

    log::info!("Start computing an exact tour through {} cities.", n);

    let distances = DistanceMatrix::compute(coords)?;
    let nodes: Vec<Node> = coords.nodes().collect();

    let variables: EdgeIndex<VarId> = EdgeIndex::build(n, |edge| {
        engine.add_binary_var(
            &format!("x_{}_{}", edge.first().id(), edge.second().id()),
            distances.cost(edge),
        )
    });

    for &node in &nodes {
        let incident = nodes
            .iter()
            .filter(|&&other| other != node)
            .map(|&other| (variables[Edge::new(node, other)], 1.0))
            .collect();
        engine.add_constraint(LinearConstraint::new(incident, Relation::Eq, 2.0));
    }

    log::info!(
        "Model has {} edge variables and {} degree constraints.",
        variables.len(),
        n
    );

    let mut eliminator = SubtourEliminator::new(&nodes, &variables);
    let status = engine.optimize(&mut eliminator, options.time_limit);
    log::info!(
        "Engine finished with status {} after {} subtour cuts.",
        status,
        engine.cut_pool().len()
    );

    let values = match status {
        TerminalStatus::Optimal | TerminalStatus::SubOptimal | TerminalStatus::TimeLimit => {
            engine.values().ok_or(TspError::SolverTermination(status))?
        }
        _ => return Err(TspError::SolverTermination(status)),
    };

    let selected: Vec<Edge> = variables
        .iter()
        .filter(|(_, var)| values[var.index()] > SELECTION_THRESHOLD)
        .map(|(edge, _)| edge)
        .collect();
    let tour = tour_from_edges(n, &selected)?;

    let objective = engine
        .objective_value()
        .unwrap_or_else(|| distances.tour_length(&tour));

    if status != TerminalStatus::Optimal {
        log::warn!(
            "Tour of length {} accepted with status {}; it is not proven optimal.",
            objective,
            status
        );
    } else {
        log::info!("Optimal tour of length {}.", objective);
    }

    let cities = tour.nodes().iter().map(|&v| coords.city(v).clone()).collect();
    Ok(SolvedTour {
        tour,
        cities,
        objective,
        status,
    })
}

#[cfg(test)]
mod test_tsp {
    use super::*;
    use crate::milp::{CutPool, LazyConstraintHandler};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const EPS: f64 = 1e-6;

    fn random_coords(k: usize, seed: u64) -> CoordinateSet {
        let mut rng = StdRng::seed_from_u64(seed);
        CoordinateSet::from_pairs((0..k).map(|i| {
            (
                format!("c{}", i),
                (rng.gen_range(47.0..55.0), rng.gen_range(6.0..15.0)),
            )
        }))
        .unwrap()
    }

    /// Shortest tour by trying every order that starts at `v0`.
    fn brute_force(distances: &DistanceMatrix) -> f64 {
        fn extend(
            distances: &DistanceMatrix,
            path: &mut Vec<usize>,
            used: &mut Vec<bool>,
            length: f64,
            best: &mut f64,
        ) {
            let n = distances.n();
            let last = *path.last().unwrap();
            if path.len() == n {
                let total = length + distances.get(Node::new(last), Node::new(0)).unwrap();
                if total < *best {
                    *best = total;
                }
                return;
            }
            for next in 1..n {
                if !used[next] {
                    used[next] = true;
                    path.push(next);
                    let step = distances.get(Node::new(last), Node::new(next)).unwrap();
                    extend(distances, path, used, length + step, best);
                    path.pop();
                    used[next] = false;
                }
            }
        }

        let mut best = f64::INFINITY;
        let mut used = vec![false; distances.n()];
        used[0] = true;
        extend(distances, &mut vec![0], &mut used, 0.0, &mut best);
        best
    }

    fn assert_permutation(solved: &SolvedTour, coords: &CoordinateSet) {
        let mut ids: Vec<usize> = solved.tour().into_iter().map(|v| v.id()).collect();
        ids.sort();
        assert_eq!(ids, (0..coords.len()).collect::<Vec<usize>>());
        assert_eq!(solved.cities().len(), coords.len());
    }

    #[test]
    fn test_unit_square() {
        let coords = CoordinateSet::from_pairs(vec![
            ("A", (0.0, 0.0)),
            ("B", (0.0, 1.0)),
            ("C", (1.0, 1.0)),
            ("D", (1.0, 0.0)),
        ])
        .unwrap();

        let solved = solve(&coords, None).unwrap();
        assert!(solved.is_optimal());
        assert!((solved.objective() - 4.0).abs() < EPS);

        let order: Vec<&str> = solved.cities().iter().map(|c| c.as_str()).collect();
        assert!(order == vec!["A", "B", "C", "D"] || order == vec!["A", "D", "C", "B"]);
    }

    #[test]
    fn test_triangle() {
        let coords =
            CoordinateSet::from_pairs(vec![("a", (0.0, 0.0)), ("b", (3.0, 0.0)), ("c", (0.0, 4.0))])
                .unwrap();

        let solved = solve(&coords, None).unwrap();
        assert!(solved.is_optimal());
        assert!((solved.objective() - 12.0).abs() < EPS);
        assert_permutation(&solved, &coords);
    }

    #[test]
    fn test_random_instances_match_brute_force() {
        for k in 3..=8 {
            let coords = random_coords(k, 17 + k as u64);
            let distances = DistanceMatrix::compute(&coords).unwrap();

            let solved = solve(&coords, None).unwrap();
            assert!(solved.is_optimal());
            assert_permutation(&solved, &coords);
            assert!((solved.objective() - distances.tour_length(solved.tour())).abs() < EPS);
            assert!((solved.objective() - brute_force(&distances)).abs() < EPS);
        }
    }

    #[test]
    fn test_larger_instances() {
        for &(k, seed) in &[(10, 3), (12, 5)] {
            let coords = random_coords(k, seed);
            let distances = DistanceMatrix::compute(&coords).unwrap();

            let solved = solve(&coords, None).unwrap();
            assert!(solved.is_optimal());
            assert_permutation(&solved, &coords);
            assert!((solved.objective() - distances.tour_length(solved.tour())).abs() < EPS);
        }
    }

    #[test]
    fn test_repeated_solves_agree() {
        let coords = random_coords(9, 42);
        let first = solve(&coords, None).unwrap();
        let second = solve(&coords, None).unwrap();
        assert!((first.objective() - second.objective()).abs() < EPS);
    }

    #[test]
    fn test_cuts_never_exclude_the_optimum() {
        // Two far apart clusters force subtour cuts.
        let coords = CoordinateSet::from_pairs(vec![
            ("a1", (0.0, 0.0)),
            ("a2", (0.0, 1.0)),
            ("a3", (1.0, 0.5)),
            ("b1", (20.0, 0.0)),
            ("b2", (20.0, 1.0)),
            ("b3", (21.0, 0.5)),
            ("b4", (21.0, 1.5)),
        ])
        .unwrap();

        let mut engine = BranchAndCutEngine::new();
        let solved = solve_with(&mut engine, &coords, &SolverOptions::default()).unwrap();
        assert!(solved.is_optimal());
        assert!(!engine.cut_pool().is_empty());

        let values = engine.values().unwrap();
        for cut in engine.cut_pool() {
            assert!(cut.lhs_value(values) <= cut.rhs() + EPS);
        }
    }

    #[test]
    fn test_too_few_cities() {
        let coords = CoordinateSet::from_pairs(vec![("a", (0.0, 0.0)), ("b", (1.0, 1.0))]).unwrap();
        assert!(matches!(solve(&coords, None), Err(TspError::Input(_))));
    }

    /// An engine that ends every run with a fixed status and fixed values.
    struct ScriptedEngine {
        vars: usize,
        status: TerminalStatus,
        values: Option<Vec<f64>>,
        cuts: CutPool,
    }

    impl ScriptedEngine {
        fn new(status: TerminalStatus, values: Option<Vec<f64>>) -> Self {
            ScriptedEngine {
                vars: 0,
                status,
                values,
                cuts: CutPool::default(),
            }
        }
    }

    impl MilpEngine for ScriptedEngine {
        fn add_binary_var(&mut self, _name: &str, _objective: f64) -> VarId {
            self.vars += 1;
            VarId::new(self.vars - 1)
        }

        fn add_constraint(&mut self, _constraint: LinearConstraint) {}

        fn optimize(
            &mut self,
            _handler: &mut dyn LazyConstraintHandler,
            _time_limit: Option<Duration>,
        ) -> TerminalStatus {
            self.status
        }

        fn values(&self) -> Option<&[f64]> {
            self.values.as_deref()
        }

        fn objective_value(&self) -> Option<f64> {
            None
        }

        fn cut_pool(&self) -> &CutPool {
            &self.cuts
        }
    }

    fn square() -> CoordinateSet {
        CoordinateSet::from_pairs(vec![
            ("A", (0.0, 0.0)),
            ("B", (0.0, 1.0)),
            ("C", (1.0, 1.0)),
            ("D", (1.0, 0.0)),
        ])
        .unwrap()
    }

    /// Values for the four-city square in slot order 01, 02, 12, 03, 13, 23.
    fn square_values(selected: &[usize]) -> Vec<f64> {
        let mut values = vec![0.0; 6];
        for &slot in selected {
            values[slot] = 1.0;
        }
        values
    }

    #[test]
    fn test_infeasible_is_fatal() {
        let mut engine = ScriptedEngine::new(TerminalStatus::Infeasible, None);
        let result = solve_with(&mut engine, &square(), &SolverOptions::default());
        assert_eq!(
            result.unwrap_err(),
            TspError::SolverTermination(TerminalStatus::Infeasible)
        );
    }

    #[test]
    fn test_time_limit_without_solution_is_fatal() {
        let mut engine = ScriptedEngine::new(TerminalStatus::TimeLimit, None);
        let result = solve_with(&mut engine, &square(), &SolverOptions::default());
        assert_eq!(
            result.unwrap_err(),
            TspError::SolverTermination(TerminalStatus::TimeLimit)
        );
    }

    #[test]
    fn test_time_limit_with_solution_is_accepted() {
        // A-B, B-C, C-D, D-A
        let values = square_values(&[0, 2, 3, 5]);
        let mut engine = ScriptedEngine::new(TerminalStatus::TimeLimit, Some(values));

        let solved = solve_with(&mut engine, &square(), &SolverOptions::default()).unwrap();
        assert!(!solved.is_optimal());
        assert_eq!(solved.status(), TerminalStatus::TimeLimit);
        assert!((solved.objective() - 4.0).abs() < EPS);
    }

    /// Runs the branch-and-cut engine to the end but reports that the time
    /// limit hit right after its last candidate.
    struct LateEngine {
        inner: BranchAndCutEngine,
    }

    impl MilpEngine for LateEngine {
        fn add_binary_var(&mut self, name: &str, objective: f64) -> VarId {
            self.inner.add_binary_var(name, objective)
        }

        fn add_constraint(&mut self, constraint: LinearConstraint) {
            self.inner.add_constraint(constraint)
        }

        fn optimize(
            &mut self,
            handler: &mut dyn LazyConstraintHandler,
            _time_limit: Option<Duration>,
        ) -> TerminalStatus {
            match self.inner.optimize(handler, None) {
                TerminalStatus::Optimal => TerminalStatus::TimeLimit,
                status => status,
            }
        }

        fn values(&self) -> Option<&[f64]> {
            self.inner.values()
        }

        fn objective_value(&self) -> Option<f64> {
            self.inner.objective_value()
        }

        fn cut_pool(&self) -> &CutPool {
            self.inner.cut_pool()
        }
    }

    #[test]
    fn test_time_limit_keeps_engine_tour() {
        let coords = random_coords(7, 11);
        let distances = DistanceMatrix::compute(&coords).unwrap();
        let mut engine = LateEngine {
            inner: BranchAndCutEngine::new(),
        };

        let options = SolverOptions::with_time_limit(Some(Duration::from_secs(60)));
        let solved = solve_with(&mut engine, &coords, &options).unwrap();
        assert!(!solved.is_optimal());
        assert_eq!(solved.status(), TerminalStatus::TimeLimit);
        assert_permutation(&solved, &coords);
        assert!((solved.objective() - distances.tour_length(solved.tour())).abs() < EPS);
    }

    #[test]
    fn test_malformed_solution_is_fatal() {
        // A-B, B-C, C-D only: A and D are left with one edge.
        let values = square_values(&[0, 2, 5]);
        let mut engine = ScriptedEngine::new(TerminalStatus::Optimal, Some(values));

        let result = solve_with(&mut engine, &square(), &SolverOptions::default());
        assert!(matches!(result, Err(TspError::Reconstruction(_))));
    }
}
