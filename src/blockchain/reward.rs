use log::{error, info};

use super::{Blockchain, NUMBER_OF_BLOCKS_TO_SOLUTION};
use crate::knapsack::ProblemSolutionPair;
use crate::transaction::Transaction;

impl Blockchain {
    /// Append bounty payments for every problem that has aged out of the
    /// window. Each payment shifts the window by one block, so this stops
    /// once the oldest block is no longer an expired problem with a solution.
    pub(super) fn settle_rewards(&mut self) {
        while let Some(pair) = self.check_for_expired_problem() {
            let tx = Transaction::reward(&pair);
            let result = match self.generate_transaction_block(tx) {
                Ok(block) => self.append(block),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => info!(
                    "REWARD - paid {} from {} to {} for problem #{}",
                    pair.problem.bounty,
                    pair.problem.address,
                    pair.solution.address,
                    pair.solution.problem_block_height
                ),
                Err(e) => {
                    error!(
                        "REWARD - failed to pay bounty for problem #{}: {}",
                        pair.solution.problem_block_height, e
                    );
                    break;
                }
            }
        }
    }

    /// If the oldest block of a full window is a problem, its solution
    /// period is over: pair it with the first solution for it in the window.
    pub fn check_for_expired_problem(&self) -> Option<ProblemSolutionPair> {
        if self.len() < NUMBER_OF_BLOCKS_TO_SOLUTION {
            return None;
        }

        let (oldest, rest) = self.active_window().split_first()?;
        let problem = oldest.data.as_problem()?;

        let solution = rest
            .iter()
            .filter_map(|b| b.data.as_solution())
            .find(|s| s.problem_block_height == oldest.height)?;

        Some(ProblemSolutionPair {
            problem: problem.clone(),
            solution: solution.clone(),
        })
    }
}
