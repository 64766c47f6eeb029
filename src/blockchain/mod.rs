pub mod block;
pub mod error;
pub mod model;
mod reward;
pub mod validation;

pub use block::{Block, BlockData, BlockKind};
pub use error::{ChainError, ValidationError};
pub use model::{Blockchain, ChainTip};

/// Number of most recent blocks during which a problem accepts solutions.
pub const NUMBER_OF_BLOCKS_TO_SOLUTION: usize = 10;
