pub mod coords;
pub mod cuts;
pub mod distance;
pub mod error;
pub mod graph;
pub mod milp;
pub mod reconstruct;
pub mod subtour;
pub mod tsp;

pub use coords::{City, Coordinate, CoordinateSet};
pub use distance::DistanceMatrix;
pub use error::TspError;
pub use graph::{Edge, Node, Tour};
pub use milp::{
    BranchAndCutEngine, ExternalSolver, LpModelerEngine, MilpEngine, TerminalStatus,
};
pub use tsp::{solve, solve_with, SolvedTour, SolverOptions};
