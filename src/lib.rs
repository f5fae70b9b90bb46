pub mod formula;
mod solver;

#[cfg(test)]
mod brute_force;

/// The answer to a satisfiability query.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum SatResult {
    /// A total assignment satisfying every clause.
    Satisfiable(Model),
    Unsatisfiable,
    /// The search was abandoned by an [`Interrupt`] before reaching an answer.
    Unknown,
}

impl SatResult {
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, SatResult::Unsatisfiable)
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            SatResult::Satisfiable(model) => Some(model),
            _ => None,
        }
    }
}

pub use formula::{Clause, ClauseId, Formula, Literal, Model, Variable};
pub use solver::{solve, DecisionBudget, Interrupt, NoInterrupt, Solver, SolverStats};
