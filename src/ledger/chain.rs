use std::sync::Mutex;

use log::info;
use thiserror::Error;

use super::block::{Block, GENESIS_PREVIOUS_HASH};
use super::pow;
use super::store::{BlockStore, StoreError};
use super::transaction::Transaction;

/// Errors that can occur during chain operations
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid transaction signature")]
    InvalidSignature,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Chain tip missing from store")]
    MissingTip,
}

/// Outcome of a mine request
#[derive(Debug)]
pub enum MineOutcome {
    /// A block was sealed and persisted
    Mined(Block),

    /// The pending queue was empty; nothing changed
    NoPendingTransactions,
}

/// Orchestrates transaction intake, block assembly, sealing, and persistence
///
/// The pending queue and the store's tip are the only mutable state;
/// one lock serializes the submit and mine paths over both.
pub struct ChainController {
    store: BlockStore,
    pending: Mutex<Vec<Transaction>>,
}

impl ChainController {
    /// Creates a controller over an opened store
    pub fn new(store: BlockStore) -> Self {
        ChainController {
            store,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Queues a transaction for inclusion in the next block
    ///
    /// The signature is verified before acceptance; inclusion order in
    /// the next block follows submission order.
    pub fn submit_transaction(&self, transaction: Transaction) -> Result<(), ChainError> {
        if !transaction.verify() {
            return Err(ChainError::InvalidSignature);
        }

        self.pending.lock().unwrap().push(transaction);

        Ok(())
    }

    /// Assembles, seals, and persists a block from the pending queue
    ///
    /// An empty queue is a no-op outcome, not an error. The queue is
    /// cleared only once the sealed block has been persisted.
    pub fn mine(&self) -> Result<MineOutcome, ChainError> {
        let mut pending = self.pending.lock().unwrap();

        if pending.is_empty() {
            return Ok(MineOutcome::NoPendingTransactions);
        }

        let tip = self.store.get_tip()?.ok_or(ChainError::MissingTip)?;
        let candidate = Block::new(tip.index + 1, pending.clone(), tip.hash);

        info!("Mining block {}...", candidate.index);
        let sealed = pow::seal(candidate, self.store.difficulty());

        self.store.put_block(&sealed)?;
        pending.clear();

        info!("Block {} sealed: {}", sealed.index, sealed.hash);

        Ok(MineOutcome::Mined(sealed))
    }

    /// Recomputes whether the persisted chain is internally consistent
    pub fn validate_chain(&self) -> Result<bool, ChainError> {
        Ok(self.store.validate_chain()?)
    }

    /// Gets a block by its hash
    pub fn get_block(&self, hash: &str) -> Result<Option<Block>, ChainError> {
        Ok(self.store.get_block(hash)?)
    }

    /// The current chain tip
    pub fn tip(&self) -> Result<Block, ChainError> {
        self.store.get_tip()?.ok_or(ChainError::MissingTip)
    }

    /// All blocks from genesis to tip, in index order
    pub fn blocks(&self) -> Result<Vec<Block>, ChainError> {
        let mut blocks = Vec::new();
        let mut current = Some(self.tip()?);

        while let Some(block) = current {
            let previous_hash = block.previous_hash.clone();
            blocks.push(block);

            current = if previous_hash == GENESIS_PREVIOUS_HASH {
                None
            } else {
                self.store.get_block(&previous_hash)?
            };
        }

        blocks.reverse();

        Ok(blocks)
    }

    /// Snapshot of the pending queue
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pending.lock().unwrap().clone()
    }
}
