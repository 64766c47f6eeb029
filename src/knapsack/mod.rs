pub mod model;

pub use model::{
    Item, KnapsackProblem, KnapsackProposedSolution, ProblemSolutionPair, sum_selected_value,
    sum_selected_weight, sum_weights,
};
