use thiserror::Error;

use crate::ledger::LedgerError;

/// Admission rule a candidate block failed. One variant per rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    // transactions
    #[error("invalid transaction amount: {0}")]
    InvalidAmount(f64),
    #[error("invalid transaction address")]
    MissingTransactionAddress,
    #[error("no valid problems to solve")]
    NoOpenProblems,
    #[error("invalid problem block height: {0}")]
    InvalidProblemHeight(i64),
    #[error("block at height {0} does not contain a problem")]
    NotAProblem(i64),
    #[error("problem at block height {0} is expired")]
    ExpiredProblem(i64),

    // problems
    #[error("bounty too low: {0}")]
    BountyTooLow(f64),
    #[error("no items in problem")]
    NoItems,
    #[error("no address in problem")]
    MissingProblemAddress,
    #[error("capacity too low: {0}")]
    CapacityTooLow(i64),
    #[error("item {index} has non-positive weight or value")]
    NonPositiveItem { index: usize },
    #[error(
        "total items weight {total_weight} does not exceed capacity {capacity}, trivial problem not allowed"
    )]
    TrivialProblem { total_weight: i64, capacity: i64 },

    // proposed solutions
    #[error("invalid proposed solution block height {height}, chain length is {len}")]
    SolutionHeightTooHigh { height: i64, len: usize },
    #[error("invalid proposed solution block height {height}, solution window closed")]
    SolutionHeightTooLow { height: i64 },
    #[error("no items in solution")]
    NoSolutionItems,
    #[error("no address in solution")]
    MissingSolutionAddress,
    #[error("duplicate item indexes")]
    DuplicateIndexes,
    #[error("invalid item index {index}, problem has {len} items")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("solution weight {weight} exceeds capacity {capacity}")]
    CapacityExceeded { weight: i64, capacity: i64 },
    #[error("solution value does not match: declared {declared}, actual {actual}")]
    ValueMismatch { declared: i64, actual: i64 },
    #[error("solution value {value} is not better than previous solution value {best}")]
    NotBestSolution { value: i64, best: i64 },

    // sums
    #[error("item {0} sum overflows")]
    SumOverflow(&'static str),

    // block envelope
    #[error("unknown block kind: {0}")]
    UnknownBlockKind(u8),
    #[error("block payload does not match block kind {0}")]
    PayloadMismatch(u8),
}

/// Errors surfaced by the chain store.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("block height mismatch: expected {expected}, got {actual}")]
    HeightMismatch { expected: i64, actual: i64 },
    #[error("previous hash mismatch at height {height}")]
    PrevHashMismatch { height: i64 },
    #[error("hash mismatch at height {height}")]
    HashMismatch { height: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("block height {height} out of range, chain length is {len}")]
    BlockOutOfRange { height: i64, len: usize },

    #[error("internal error: {0}")]
    Internal(#[from] serde_json::Error),
}

impl ChainError {
    /// Internal failures are not the submitter's fault.
    pub fn is_internal(&self) -> bool {
        matches!(self, ChainError::Internal(_))
    }
}
