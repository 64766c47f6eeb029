use serde::{Deserialize, Serialize};

/// A single knapsack item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub weight: i64,
    pub value: i64,
}

/// A bounty-bearing 0/1 knapsack instance posted to the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnapsackProblem {
    pub items: Vec<Item>,
    pub capacity: i64,
    pub bounty: f64,
    /// Address the bounty is paid from.
    pub address: String,
}

/// A proposed item selection for the problem stored at `problem_block_height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnapsackProposedSolution {
    #[serde(rename = "items")]
    pub item_indexes: Vec<i64>,
    pub problem_block_height: i64,
    /// Declared total value of the selection (the quantity being maximized).
    pub value: i64,
    /// Address the bounty is paid to.
    pub address: String,
}

/// Problem paired with the solution that wins its bounty. Only built while
/// evaluating expiry, never stored on chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSolutionPair {
    pub problem: KnapsackProblem,
    pub solution: KnapsackProposedSolution,
}

impl KnapsackProblem {
    /// The fixed instance carried by the genesis block: 20 items with
    /// weight = value = 1..=20 and a capacity of two thirds the total weight.
    pub fn reference_instance() -> Self {
        let items: Vec<Item> = (1..=20).map(|i| Item { weight: i, value: i }).collect();
        let mut problem = Self {
            items,
            capacity: 0,
            bounty: 1.0,
            address: String::from("0x0"),
        };
        problem.capacity = sum_weights(&problem).unwrap_or_default() * 2 / 3;
        problem
    }
}

/// Sum of every item weight in the problem, `None` on overflow.
pub fn sum_weights(problem: &KnapsackProblem) -> Option<i64> {
    checked_sum(problem.items.iter().map(|item| item.weight))
}

/// Total weight of the selected items, `None` on overflow. Indexes are
/// expected to be valid; anything that does not address an item contributes
/// nothing.
pub fn sum_selected_weight(problem: &KnapsackProblem, indexes: &[i64]) -> Option<i64> {
    checked_sum(selected(problem, indexes).map(|item| item.weight))
}

/// Total value of the selected items, same contract as
/// [`sum_selected_weight`].
pub fn sum_selected_value(problem: &KnapsackProblem, indexes: &[i64]) -> Option<i64> {
    checked_sum(selected(problem, indexes).map(|item| item.value))
}

fn checked_sum(mut values: impl Iterator<Item = i64>) -> Option<i64> {
    values.try_fold(0i64, |acc, v| acc.checked_add(v))
}

fn selected<'a>(
    problem: &'a KnapsackProblem,
    indexes: &'a [i64],
) -> impl Iterator<Item = &'a Item> + 'a {
    indexes
        .iter()
        .filter_map(|&i| usize::try_from(i).ok())
        .filter_map(|i| problem.items.get(i))
}
