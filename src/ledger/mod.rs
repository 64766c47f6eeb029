use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::{Block, BlockData};
use crate::transaction::Transaction;

/// Balance an address holds the first time a transaction touches it.
/// Stands in for an initial coin distribution.
pub const ADDRESS_INITIAL_BALANCE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("cannot update ledger: block {height} is not a monetary transaction")]
    NotATransaction { height: i64 },
}

/// Address -> balance projection over the chain's transaction blocks.
///
/// Not a source of truth: it can always be rebuilt by replaying the chain.
/// No balance floor is enforced, so balances may go negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    address_to_balance: BTreeMap<String, f64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a freshly appended block. Only transaction blocks are accepted.
    pub fn update(&mut self, block: &Block) -> Result<(), LedgerError> {
        match &block.data {
            BlockData::Transaction(tx) => {
                self.apply_transaction(tx);
                Ok(())
            }
            _ => Err(LedgerError::NotATransaction {
                height: block.height,
            }),
        }
    }

    fn apply_transaction(&mut self, tx: &Transaction) {
        *self
            .address_to_balance
            .entry(tx.from.clone())
            .or_insert(ADDRESS_INITIAL_BALANCE) -= tx.amount;
        *self
            .address_to_balance
            .entry(tx.to.clone())
            .or_insert(ADDRESS_INITIAL_BALANCE) += tx.amount;
        debug!(
            "LEDGER - {} -> {} : {} (problem #{})",
            tx.from, tx.to, tx.amount, tx.problem_block_height
        );
    }

    /// Replay every transaction block in height order into a fresh ledger.
    pub fn rebuild_from_chain(blocks: &[Block]) -> Self {
        let mut ledger = Self::new();
        for tx in blocks.iter().filter_map(|b| b.data.as_transaction()) {
            ledger.apply_transaction(tx);
        }
        ledger
    }

    pub fn balance(&self, address: &str) -> Option<f64> {
        self.address_to_balance.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.address_to_balance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.address_to_balance.is_empty()
    }
}
