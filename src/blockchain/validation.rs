//! Admission rules per block kind. Read-only against the chain.

use std::collections::HashSet;

use super::{BlockData, Blockchain, NUMBER_OF_BLOCKS_TO_SOLUTION, ValidationError};
use crate::knapsack::{
    KnapsackProblem, KnapsackProposedSolution, sum_selected_value, sum_selected_weight,
    sum_weights,
};
use crate::transaction::Transaction;

pub fn validate_block_data(data: &BlockData, bc: &Blockchain) -> Result<(), ValidationError> {
    match data {
        BlockData::Transaction(tx) => validate_transaction(tx, bc),
        BlockData::Problem(problem) => validate_problem(problem),
        BlockData::Solution(solution) => validate_proposed_solution(solution, bc),
    }
}

/// Sender solvency is not checked; balances may go negative.
pub fn validate_transaction(tx: &Transaction, bc: &Blockchain) -> Result<(), ValidationError> {
    // negated so NaN is rejected too
    if !(tx.amount > 0.0) {
        return Err(ValidationError::InvalidAmount(tx.amount));
    }
    if tx.from.is_empty() || tx.to.is_empty() {
        return Err(ValidationError::MissingTransactionAddress);
    }
    if bc.find_open_problems().is_empty() {
        return Err(ValidationError::NoOpenProblems);
    }

    let height = tx.problem_block_height;
    let block = bc
        .get_block(height)
        .map_err(|_| ValidationError::InvalidProblemHeight(height))?;
    if block.data.as_problem().is_none() {
        return Err(ValidationError::NotAProblem(height));
    }

    let window_start = bc.active_window().first().map_or(0, |b| b.height);
    if height < window_start {
        return Err(ValidationError::ExpiredProblem(height));
    }
    Ok(())
}

pub fn validate_problem(problem: &KnapsackProblem) -> Result<(), ValidationError> {
    if !(problem.bounty >= 1.0) {
        return Err(ValidationError::BountyTooLow(problem.bounty));
    }
    if problem.items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    if problem.address.is_empty() {
        return Err(ValidationError::MissingProblemAddress);
    }
    if problem.capacity < 1 {
        return Err(ValidationError::CapacityTooLow(problem.capacity));
    }
    if let Some(index) = problem
        .items
        .iter()
        .position(|item| item.weight <= 0 || item.value <= 0)
    {
        return Err(ValidationError::NonPositiveItem { index });
    }

    // taking every item would fit: nothing to optimize
    let total_weight = sum_weights(problem).ok_or(ValidationError::SumOverflow("weight"))?;
    if total_weight <= problem.capacity {
        return Err(ValidationError::TrivialProblem {
            total_weight,
            capacity: problem.capacity,
        });
    }
    Ok(())
}

pub fn validate_proposed_solution(
    solution: &KnapsackProposedSolution,
    bc: &Blockchain,
) -> Result<(), ValidationError> {
    let len = bc.len();
    let height = solution.problem_block_height;
    if height >= len as i64 {
        return Err(ValidationError::SolutionHeightTooHigh { height, len });
    }
    if height < len as i64 - NUMBER_OF_BLOCKS_TO_SOLUTION as i64 {
        return Err(ValidationError::SolutionHeightTooLow { height });
    }

    if solution.item_indexes.is_empty() {
        return Err(ValidationError::NoSolutionItems);
    }
    if solution.address.is_empty() {
        return Err(ValidationError::MissingSolutionAddress);
    }
    let mut seen = HashSet::with_capacity(solution.item_indexes.len());
    if !solution.item_indexes.iter().all(|i| seen.insert(*i)) {
        return Err(ValidationError::DuplicateIndexes);
    }

    let problem = bc
        .get_block(height)
        .map_err(|_| ValidationError::InvalidProblemHeight(height))?
        .data
        .as_problem()
        .ok_or(ValidationError::NotAProblem(height))?;

    let item_count = problem.items.len();
    if let Some(&index) = solution
        .item_indexes
        .iter()
        .find(|&&i| i < 0 || i >= item_count as i64)
    {
        return Err(ValidationError::IndexOutOfRange {
            index,
            len: item_count,
        });
    }

    let weight = sum_selected_weight(problem, &solution.item_indexes)
        .ok_or(ValidationError::SumOverflow("weight"))?;
    if weight > problem.capacity {
        return Err(ValidationError::CapacityExceeded {
            weight,
            capacity: problem.capacity,
        });
    }

    let actual = sum_selected_value(problem, &solution.item_indexes)
        .ok_or(ValidationError::SumOverflow("value"))?;
    if actual != solution.value {
        return Err(ValidationError::ValueMismatch {
            declared: solution.value,
            actual,
        });
    }

    // earlier solutions win ties
    let best = bc
        .active_window()
        .iter()
        .filter_map(|b| b.data.as_solution())
        .filter(|s| s.problem_block_height == height)
        .map(|s| s.value)
        .max();
    if let Some(best) = best.filter(|&best| best >= solution.value) {
        return Err(ValidationError::NotBestSolution {
            value: solution.value,
            best,
        });
    }
    Ok(())
}
