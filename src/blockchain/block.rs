use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ValidationError;
use crate::knapsack::{KnapsackProblem, KnapsackProposedSolution};
use crate::transaction::Transaction;

/// Wire tag of a block payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockKind {
    Transaction = 0,
    Problem = 1,
    Solution = 2,
}

/// Payload carried by a block: exactly one of the three kinds.
///
/// On the wire this is `{"type": <kind>, "<payload field>": {...}}`; decoding
/// rejects a tag that does not match the populated field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlockDataRepr", into = "BlockDataRepr")]
pub enum BlockData {
    Transaction(Transaction),
    Problem(KnapsackProblem),
    Solution(KnapsackProposedSolution),
}

impl BlockData {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockData::Transaction(_) => BlockKind::Transaction,
            BlockData::Problem(_) => BlockKind::Problem,
            BlockData::Solution(_) => BlockKind::Solution,
        }
    }

    pub fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            BlockData::Transaction(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn as_problem(&self) -> Option<&KnapsackProblem> {
        match self {
            BlockData::Problem(problem) => Some(problem),
            _ => None,
        }
    }

    pub fn as_solution(&self) -> Option<&KnapsackProposedSolution> {
        match self {
            BlockData::Solution(solution) => Some(solution),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BlockDataRepr {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction: Option<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    problem: Option<KnapsackProblem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proposed_solution: Option<KnapsackProposedSolution>,
}

impl TryFrom<BlockDataRepr> for BlockData {
    type Error = ValidationError;

    fn try_from(repr: BlockDataRepr) -> Result<Self, Self::Error> {
        let kind = repr.kind;
        match (
            kind,
            repr.transaction,
            repr.problem,
            repr.proposed_solution,
        ) {
            (0, Some(tx), None, None) => Ok(BlockData::Transaction(tx)),
            (1, None, Some(problem), None) => Ok(BlockData::Problem(problem)),
            (2, None, None, Some(solution)) => Ok(BlockData::Solution(solution)),
            (0..=2, ..) => Err(ValidationError::PayloadMismatch(kind)),
            _ => Err(ValidationError::UnknownBlockKind(kind)),
        }
    }
}

impl From<BlockData> for BlockDataRepr {
    fn from(data: BlockData) -> Self {
        let kind = data.kind() as u8;
        let mut repr = BlockDataRepr {
            kind,
            transaction: None,
            problem: None,
            proposed_solution: None,
        };
        match data {
            BlockData::Transaction(tx) => repr.transaction = Some(tx),
            BlockData::Problem(problem) => repr.problem = Some(problem),
            BlockData::Solution(solution) => repr.proposed_solution = Some(solution),
        }
        repr
    }
}

/// A single block of the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: i64,
    pub data: BlockData,
    pub hash: String,
    #[serde(rename = "prevhash")]
    pub prev_hash: String,
}

impl Block {
    /// Build a block and seal it with its hash.
    pub fn new(height: i64, prev_hash: String, data: BlockData) -> Result<Self, serde_json::Error> {
        let hash = calculate_hash(height, &prev_hash, &data)?;
        Ok(Self {
            height,
            data,
            hash,
            prev_hash,
        })
    }

    /// Recompute the hash from the block's content (excluding `hash`).
    pub fn compute_hash(&self) -> Result<String, serde_json::Error> {
        calculate_hash(self.height, &self.prev_hash, &self.data)
    }

    /// Whether the cached `hash` matches the content. Does NOT check linkage.
    pub fn has_valid_hash(&self) -> bool {
        self.compute_hash().is_ok_and(|h| h == self.hash)
    }
}

/// SHA-256 over `height:prev_hash:<data as JSON>`, hex encoded.
pub fn calculate_hash(
    height: i64,
    prev_hash: &str,
    data: &BlockData,
) -> Result<String, serde_json::Error> {
    let data_json = serde_json::to_string(data)?;
    let preimage = format!("{height}:{prev_hash}:{data_json}");
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
