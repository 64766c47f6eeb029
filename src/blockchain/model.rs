use log::{debug, info};

use super::{Block, BlockData, ChainError, NUMBER_OF_BLOCKS_TO_SOLUTION, validation};
use crate::knapsack::{KnapsackProblem, KnapsackProposedSolution};
use crate::ledger::Ledger;
use crate::transaction::Transaction;

/// Height and hash the next block must link to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTip {
    pub height: i64,
    pub hash: String,
}

impl ChainTip {
    /// Virtual predecessor of the genesis block.
    pub fn genesis_predecessor() -> Self {
        Self {
            height: -1,
            hash: String::new(),
        }
    }
}

/// In-memory append-only chain of problem, solution and transaction blocks,
/// together with the ledger derived from it.
#[derive(Debug, Default)]
pub struct Blockchain {
    chain: Vec<Block>,
    ledger: Ledger,
}

impl Blockchain {
    /// Initialize a new blockchain seeded with the genesis problem.
    pub fn new() -> Result<Self, ChainError> {
        let mut bc = Self::empty();
        let genesis = bc.generate_problem_block(KnapsackProblem::reference_instance())?;
        bc.add_block(genesis)?;
        Ok(bc)
    }

    /// A chain with no blocks at all, not even genesis.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Link target for the next block; the virtual genesis predecessor when
    /// the chain is empty.
    pub fn tip(&self) -> ChainTip {
        match self.last_block() {
            Some(block) => ChainTip {
                height: block.height,
                hash: block.hash.clone(),
            },
            None => ChainTip::genesis_predecessor(),
        }
    }

    pub fn get_block(&self, height: i64) -> Result<&Block, ChainError> {
        usize::try_from(height)
            .ok()
            .and_then(|i| self.chain.get(i))
            .ok_or(ChainError::BlockOutOfRange {
                height,
                len: self.chain.len(),
            })
    }

    /// The last `NUMBER_OF_BLOCKS_TO_SOLUTION` blocks (fewer on a short
    /// chain). Only problems inside this window accept solutions.
    pub fn active_window(&self) -> &[Block] {
        let start = self.chain.len().saturating_sub(NUMBER_OF_BLOCKS_TO_SOLUTION);
        &self.chain[start..]
    }

    /// Problem blocks still open to solutions, oldest first.
    pub fn find_open_problems(&self) -> Vec<&Block> {
        let problems: Vec<&Block> = self
            .active_window()
            .iter()
            .filter(|b| b.data.as_problem().is_some())
            .collect();
        debug!("Found {} open problems", problems.len());
        problems
    }

    pub fn generate_problem_block(&self, problem: KnapsackProblem) -> Result<Block, ChainError> {
        self.generate_block(BlockData::Problem(problem))
    }

    pub fn generate_proposed_solution_block(
        &self,
        solution: KnapsackProposedSolution,
    ) -> Result<Block, ChainError> {
        self.generate_block(BlockData::Solution(solution))
    }

    pub fn generate_transaction_block(&self, tx: Transaction) -> Result<Block, ChainError> {
        self.generate_block(BlockData::Transaction(tx))
    }

    fn generate_block(&self, data: BlockData) -> Result<Block, ChainError> {
        let tip = self.tip();
        debug!(
            "Generating block #{} of kind {:?}",
            tip.height + 1,
            data.kind()
        );
        Ok(Block::new(tip.height + 1, tip.hash, data)?)
    }

    /// Check that `candidate` extends the current tip and that its hash
    /// matches its content.
    pub fn check_chained(&self, candidate: &Block) -> Result<(), ChainError> {
        let tip = self.tip();
        if candidate.height != tip.height + 1 {
            return Err(ChainError::HeightMismatch {
                expected: tip.height + 1,
                actual: candidate.height,
            });
        }
        if candidate.prev_hash != tip.hash {
            return Err(ChainError::PrevHashMismatch {
                height: candidate.height,
            });
        }
        if candidate.compute_hash()? != candidate.hash {
            return Err(ChainError::HashMismatch {
                height: candidate.height,
            });
        }
        Ok(())
    }

    pub fn is_correctly_chained(&self, candidate: &Block) -> bool {
        self.check_chained(candidate).is_ok()
    }

    /// Validate and append `block`, then pay out any bounty whose solution
    /// window closed with this append.
    ///
    /// On error nothing changes. A failed reward payout is logged and does
    /// not turn a successful append into an error.
    pub fn add_block(&mut self, block: Block) -> Result<(), ChainError> {
        self.append(block)?;
        self.settle_rewards();
        Ok(())
    }

    /// Validate, apply to the ledger and push. No reward processing.
    pub(super) fn append(&mut self, block: Block) -> Result<(), ChainError> {
        self.check_chained(&block)?;
        validation::validate_block_data(&block.data, self)?;
        if let BlockData::Transaction(_) = block.data {
            self.ledger.update(&block)?;
        }
        info!(
            "CHAIN - appended block #{} ({:?}) hash={}",
            block.height,
            block.data.kind(),
            block.hash
        );
        self.chain.push(block);
        Ok(())
    }

    /// Re-verify height sequence, linkage and hashes from genesis.
    pub fn is_valid_chain(&self) -> bool {
        let mut prev = ChainTip::genesis_predecessor();
        for block in &self.chain {
            if block.height != prev.height + 1
                || block.prev_hash != prev.hash
                || !block.has_valid_hash()
            {
                return false;
            }
            prev = ChainTip {
                height: block.height,
                hash: block.hash.clone(),
            };
        }
        true
    }

    /// Whether the incrementally maintained ledger equals a full replay.
    pub fn is_ledger_consistent(&self) -> bool {
        Ledger::rebuild_from_chain(&self.chain) == self.ledger
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blockchain::{BlockKind, ValidationError};
    use crate::knapsack::Item;

    pub(crate) fn small_problem(address: &str) -> KnapsackProblem {
        KnapsackProblem {
            items: vec![
                Item { weight: 1, value: 1 },
                Item { weight: 2, value: 2 },
                Item { weight: 3, value: 3 },
            ],
            capacity: 4,
            bounty: 2.0,
            address: address.into(),
        }
    }

    pub(crate) fn solution(
        height: i64,
        indexes: &[i64],
        value: i64,
        address: &str,
    ) -> KnapsackProposedSolution {
        KnapsackProposedSolution {
            item_indexes: indexes.to_vec(),
            problem_block_height: height,
            value,
            address: address.into(),
        }
    }

    pub(crate) fn submit_problem(
        bc: &mut Blockchain,
        problem: KnapsackProblem,
    ) -> Result<i64, ChainError> {
        let block = bc.generate_problem_block(problem)?;
        let height = block.height;
        bc.add_block(block)?;
        Ok(height)
    }

    pub(crate) fn submit_solution(
        bc: &mut Blockchain,
        solution: KnapsackProposedSolution,
    ) -> Result<(), ChainError> {
        let block = bc.generate_proposed_solution_block(solution)?;
        bc.add_block(block)
    }

    fn filler(bc: &mut Blockchain) {
        submit_problem(bc, small_problem("F")).unwrap();
    }

    fn transactions(bc: &Blockchain) -> Vec<&Transaction> {
        bc.blocks()
            .iter()
            .filter_map(|b| b.data.as_transaction())
            .collect()
    }

    #[test]
    fn genesis_holds_reference_problem() {
        let bc = Blockchain::new().unwrap();
        assert_eq!(bc.len(), 1);
        let genesis = bc.get_block(0).unwrap();
        assert_eq!(genesis.height, 0);
        assert_eq!(genesis.prev_hash, "");
        let problem = genesis.data.as_problem().unwrap();
        assert_eq!(problem.items.len(), 20);
        assert_eq!(problem.capacity, 140);
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn empty_chain_tip_is_virtual_predecessor() {
        let bc = Blockchain::empty();
        assert!(bc.last_block().is_none());
        assert_eq!(bc.tip(), ChainTip::genesis_predecessor());
        assert!(bc.active_window().is_empty());
    }

    #[test]
    fn generated_block_links_to_tip() {
        let bc = Blockchain::new().unwrap();
        let block = bc.generate_problem_block(small_problem("A")).unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(block.prev_hash, bc.get_block(0).unwrap().hash);
        assert!(bc.is_correctly_chained(&block));
    }

    #[test]
    fn rejects_wrong_height() {
        let mut bc = Blockchain::new().unwrap();
        let mut block = bc.generate_problem_block(small_problem("A")).unwrap();
        block.height = 5;
        block.hash = block.compute_hash().unwrap();
        assert!(!bc.is_correctly_chained(&block));
        assert!(matches!(
            bc.add_block(block),
            Err(ChainError::HeightMismatch {
                expected: 1,
                actual: 5
            })
        ));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn rejects_wrong_prev_hash() {
        let mut bc = Blockchain::new().unwrap();
        let mut block = bc.generate_problem_block(small_problem("A")).unwrap();
        block.prev_hash = "bogus".into();
        block.hash = block.compute_hash().unwrap();
        assert!(!bc.is_correctly_chained(&block));
        assert!(matches!(
            bc.add_block(block),
            Err(ChainError::PrevHashMismatch { height: 1 })
        ));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn rejects_tampered_payload() {
        let mut bc = Blockchain::new().unwrap();
        let mut block = bc.generate_problem_block(small_problem("A")).unwrap();
        if let BlockData::Problem(p) = &mut block.data {
            p.bounty = 100.0;
        }
        assert!(!bc.is_correctly_chained(&block));
        assert!(matches!(
            bc.add_block(block),
            Err(ChainError::HashMismatch { height: 1 })
        ));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn get_block_out_of_range_is_an_error() {
        let bc = Blockchain::new().unwrap();
        assert!(matches!(
            bc.get_block(1),
            Err(ChainError::BlockOutOfRange { height: 1, len: 1 })
        ));
        assert!(matches!(
            bc.get_block(-1),
            Err(ChainError::BlockOutOfRange { height: -1, .. })
        ));
    }

    #[test]
    fn accepts_valid_problem() {
        let mut bc = Blockchain::new().unwrap();
        assert_eq!(submit_problem(&mut bc, small_problem("A")).unwrap(), 1);
        assert_eq!(bc.len(), 2);
        assert_eq!(bc.find_open_problems().len(), 2);
    }

    #[test]
    fn rejects_trivial_problem() {
        let mut bc = Blockchain::new().unwrap();
        let problem = KnapsackProblem {
            items: vec![Item { weight: 1, value: 1 }, Item { weight: 2, value: 2 }],
            capacity: 3,
            bounty: 2.0,
            address: "A".into(),
        };
        assert!(matches!(
            submit_problem(&mut bc, problem),
            Err(ChainError::Validation(ValidationError::TrivialProblem {
                total_weight: 3,
                capacity: 3
            }))
        ));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn solution_value_and_capacity_are_checked() {
        let mut bc = Blockchain::new().unwrap();
        let h = submit_problem(&mut bc, small_problem("A")).unwrap();

        assert!(matches!(
            submit_solution(&mut bc, solution(h, &[0, 2], 5, "S")),
            Err(ChainError::Validation(ValidationError::ValueMismatch {
                declared: 5,
                actual: 4
            }))
        ));
        assert!(matches!(
            submit_solution(&mut bc, solution(h, &[0, 1, 2], 6, "S")),
            Err(ChainError::Validation(ValidationError::CapacityExceeded {
                weight: 6,
                capacity: 4
            }))
        ));
        submit_solution(&mut bc, solution(h, &[0, 2], 4, "S")).unwrap();
        assert_eq!(bc.len(), 3);
    }

    #[test]
    fn worse_solution_is_rejected() {
        let mut bc = Blockchain::new().unwrap();
        let h = submit_problem(&mut bc, small_problem("A")).unwrap();
        submit_solution(&mut bc, solution(h, &[0, 2], 4, "S1")).unwrap();
        assert!(matches!(
            submit_solution(&mut bc, solution(h, &[2], 3, "S2")),
            Err(ChainError::Validation(ValidationError::NotBestSolution {
                value: 3,
                best: 4
            }))
        ));
    }

    #[test]
    fn better_solution_is_accepted_and_ties_lose() {
        let mut bc = Blockchain::new().unwrap();
        let h = submit_problem(&mut bc, small_problem("A")).unwrap();
        submit_solution(&mut bc, solution(h, &[2], 3, "S1")).unwrap();
        submit_solution(&mut bc, solution(h, &[0, 2], 4, "S2")).unwrap();
        assert!(matches!(
            submit_solution(&mut bc, solution(h, &[2, 0], 4, "S3")),
            Err(ChainError::Validation(ValidationError::NotBestSolution {
                value: 4,
                best: 4
            }))
        ));
        assert_eq!(bc.len(), 4);
    }

    #[test]
    fn solutions_for_other_problems_do_not_dominate() {
        let mut bc = Blockchain::new().unwrap();
        let h1 = submit_problem(&mut bc, small_problem("A")).unwrap();
        let h2 = submit_problem(&mut bc, small_problem("B")).unwrap();
        submit_solution(&mut bc, solution(h1, &[0, 2], 4, "S")).unwrap();
        submit_solution(&mut bc, solution(h2, &[0, 2], 4, "S")).unwrap();
    }

    #[test]
    fn bounty_is_paid_when_window_closes() {
        let mut bc = Blockchain::new().unwrap();
        let h = submit_problem(&mut bc, small_problem("A")).unwrap();
        submit_solution(&mut bc, solution(h, &[0, 2], 4, "S")).unwrap();

        // problem + solution + fillers = one full window
        for _ in 0..NUMBER_OF_BLOCKS_TO_SOLUTION - 3 {
            filler(&mut bc);
        }
        assert!(transactions(&bc).is_empty());
        assert_eq!(bc.len(), h as usize + NUMBER_OF_BLOCKS_TO_SOLUTION - 1);

        filler(&mut bc);
        let reward_height = (h as usize + NUMBER_OF_BLOCKS_TO_SOLUTION) as i64;
        assert_eq!(bc.len(), reward_height as usize + 1);

        let reward = bc.get_block(reward_height).unwrap();
        assert_eq!(reward.data.kind(), BlockKind::Transaction);
        let tx = reward.data.as_transaction().unwrap();
        assert_eq!(tx.amount, 2.0);
        assert_eq!(tx.from, "A");
        assert_eq!(tx.to, "S");
        assert_eq!(tx.problem_block_height, h);

        assert_eq!(bc.ledger().balance("A"), Some(998.0));
        assert_eq!(bc.ledger().balance("S"), Some(1002.0));
        assert!(bc.is_valid_chain());
        assert!(bc.is_ledger_consistent());

        // no second payout for the same problem
        filler(&mut bc);
        assert_eq!(transactions(&bc).len(), 1);
    }

    #[test]
    fn no_bounty_without_solution() {
        let mut bc = Blockchain::new().unwrap();
        submit_problem(&mut bc, small_problem("A")).unwrap();
        for _ in 0..2 * NUMBER_OF_BLOCKS_TO_SOLUTION {
            filler(&mut bc);
        }
        assert!(transactions(&bc).is_empty());
        assert!(bc.ledger().is_empty());
    }

    #[test]
    fn first_solution_wins_the_bounty() {
        let mut bc = Blockchain::new().unwrap();
        let h = submit_problem(&mut bc, small_problem("A")).unwrap();
        submit_solution(&mut bc, solution(h, &[2], 3, "S1")).unwrap();
        submit_solution(&mut bc, solution(h, &[0, 2], 4, "S2")).unwrap();
        while transactions(&bc).is_empty() {
            filler(&mut bc);
        }
        let txs = transactions(&bc);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to, "S1");
        assert_eq!(txs[0].from, "A");
    }

    #[test]
    fn failed_reward_does_not_fail_triggering_append() {
        let mut bc = Blockchain::new().unwrap();
        // a zero bounty cannot be admitted, so its payout is rejected too
        let mut problem = small_problem("A");
        problem.bounty = 0.0;
        let block = bc.generate_problem_block(problem).unwrap();
        let h = block.height;
        bc.chain.push(block);
        submit_solution(&mut bc, solution(h, &[0, 2], 4, "S")).unwrap();
        while bc.len() < h as usize + NUMBER_OF_BLOCKS_TO_SOLUTION - 1 {
            filler(&mut bc);
        }

        let before = bc.len();
        let block = bc.generate_problem_block(small_problem("F")).unwrap();
        assert!(bc.add_block(block).is_ok());
        assert_eq!(bc.len(), before + 1);
        assert!(transactions(&bc).is_empty());
        assert!(bc.ledger().is_empty());

        // the problem has left the window, nothing is retried
        filler(&mut bc);
        assert!(transactions(&bc).is_empty());
    }

    #[test]
    fn consecutive_expiries_settle_in_one_append() {
        let mut bc = Blockchain::new().unwrap();
        let h1 = submit_problem(&mut bc, small_problem("A")).unwrap();
        let h2 = submit_problem(&mut bc, small_problem("B")).unwrap();
        submit_solution(&mut bc, solution(h1, &[0, 2], 4, "S1")).unwrap();
        submit_solution(&mut bc, solution(h2, &[0, 2], 4, "S2")).unwrap();
        while bc.len() < h1 as usize + NUMBER_OF_BLOCKS_TO_SOLUTION - 1 {
            filler(&mut bc);
        }
        assert!(transactions(&bc).is_empty());

        filler(&mut bc);
        let txs = transactions(&bc);
        assert_eq!(txs.len(), 2);
        assert_eq!((txs[0].from.as_str(), txs[0].to.as_str()), ("A", "S1"));
        assert_eq!((txs[1].from.as_str(), txs[1].to.as_str()), ("B", "S2"));
        assert!(bc.is_ledger_consistent());
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn solution_outside_window_is_rejected() {
        let mut bc = Blockchain::new().unwrap();
        let h = submit_problem(&mut bc, small_problem("A")).unwrap();
        assert!(matches!(
            submit_solution(&mut bc, solution(h + 1, &[0], 1, "S")),
            Err(ChainError::Validation(ValidationError::SolutionHeightTooHigh { .. }))
        ));
        for _ in 0..NUMBER_OF_BLOCKS_TO_SOLUTION {
            filler(&mut bc);
        }
        assert!(matches!(
            submit_solution(&mut bc, solution(h, &[0, 2], 4, "S")),
            Err(ChainError::Validation(ValidationError::SolutionHeightTooLow { .. }))
        ));
    }

    #[test]
    fn transaction_needs_open_problem() {
        let mut bc = Blockchain::empty();
        let block = bc
            .generate_transaction_block(Transaction {
                from: "A".into(),
                to: "B".into(),
                amount: 1.0,
                problem_block_height: 0,
            })
            .unwrap();
        assert!(matches!(
            bc.add_block(block),
            Err(ChainError::Validation(ValidationError::NoOpenProblems))
        ));
        assert!(bc.is_empty());
        assert!(bc.ledger().is_empty());
    }

    #[test]
    fn direct_transaction_updates_ledger() {
        let mut bc = Blockchain::new().unwrap();
        let block = bc
            .generate_transaction_block(Transaction {
                from: "X".into(),
                to: "Y".into(),
                amount: 5.0,
                problem_block_height: 0,
            })
            .unwrap();
        bc.add_block(block).unwrap();
        assert_eq!(bc.ledger().balance("X"), Some(995.0));
        assert_eq!(bc.ledger().balance("Y"), Some(1005.0));
    }

    #[test]
    fn rejected_transaction_leaves_ledger_untouched() {
        let mut bc = Blockchain::new().unwrap();
        let h = submit_problem(&mut bc, small_problem("A")).unwrap();
        submit_solution(&mut bc, solution(h, &[0, 2], 4, "S")).unwrap();
        let block = bc
            .generate_transaction_block(Transaction {
                from: "X".into(),
                to: "Y".into(),
                amount: 5.0,
                problem_block_height: 2,
            })
            .unwrap();
        assert!(matches!(
            bc.add_block(block),
            Err(ChainError::Validation(ValidationError::NotAProblem(2)))
        ));
        assert!(bc.ledger().is_empty());
        assert_eq!(bc.len(), 3);
    }
}
