use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::blockchain::{Blockchain, ChainError};

/// Shared application state. The ledger lives inside the blockchain, so one
/// lock covers both.
pub struct AppState {
    pub blockchain: RwLock<Blockchain>,
}

impl AppState {
    /// State seeded with a fresh chain holding only the genesis block.
    pub fn new() -> Result<Self, ChainError> {
        Ok(Self {
            blockchain: RwLock::new(Blockchain::new()?),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub ledger_consistent: bool,
}
