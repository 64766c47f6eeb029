use serde::{Deserialize, Serialize};

use crate::knapsack::ProblemSolutionPair;

/// Monetary transfer recorded on chain. Every transaction is tied to the
/// problem whose bounty it settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub problem_block_height: i64,
}

impl Transaction {
    /// Bounty payment from the problem's poster to the winning solver.
    pub fn reward(pair: &ProblemSolutionPair) -> Self {
        Self {
            from: pair.problem.address.clone(),
            to: pair.solution.address.clone(),
            amount: pair.problem.bounty,
            problem_block_height: pair.solution.problem_block_height,
        }
    }
}
