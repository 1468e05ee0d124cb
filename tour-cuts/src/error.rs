use std::{error::Error, fmt};

use crate::milp::TerminalStatus;

/// Everything that can go wrong while computing a tour.
#[derive(Debug, Clone, PartialEq)]
pub enum TspError {
    /// The coordinate set cannot be turned into a model.
    Input(String),
    /// The engine stopped without a usable solution.
    SolverTermination(TerminalStatus),
    /// The selected edges do not form one cycle through all cities.
    Reconstruction(String),
}

impl fmt::Display for TspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TspError::Input(msg) => write!(f, "invalid input: {}", msg),
            TspError::SolverTermination(status) => {
                write!(f, "solver terminated with status {}", status)
            }
            TspError::Reconstruction(msg) => write!(f, "cannot reconstruct tour: {}", msg),
        }
    }
}

impl Error for TspError {}
