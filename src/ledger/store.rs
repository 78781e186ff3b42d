use std::path::Path;

use log::info;
use sled::{Batch, Db};
use thiserror::Error;

use super::block::{Block, GENESIS_PREVIOUS_HASH};
use super::pow;
use super::transaction::Transaction;

/// Reserved metadata key holding the hash of the current chain tip
const TIP_KEY: &[u8] = b"chain:tip";

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Persistent, hash-addressed storage for the chain
///
/// One keyspace holds two classes of entries: block records under their
/// literal hash string, and the tip pointer under a reserved key.
pub struct BlockStore {
    db: Db,
    difficulty: usize,
}

impl std::fmt::Debug for BlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStore")
            .field("difficulty", &self.difficulty)
            .finish()
    }
}

impl BlockStore {
    /// Opens (or creates) a store at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the database directory
    /// * `difficulty` - The difficulty this chain seals and validates against
    ///
    /// # Returns
    ///
    /// A new BlockStore instance with the genesis block in place
    pub fn open<P: AsRef<Path>>(path: P, difficulty: usize) -> Result<Self, StoreError> {
        let db = sled::open(path)?;

        let store = BlockStore { db, difficulty };
        store.ensure_genesis()?;

        Ok(store)
    }

    /// The difficulty this store seals and validates against
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Saves a block under its own hash and advances the tip pointer
    ///
    /// Both entries land in a single atomic batch.
    pub fn put_block(&self, block: &Block) -> Result<(), StoreError> {
        let value = serde_json::to_vec(block)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut batch = Batch::default();
        batch.insert(block.hash.as_bytes(), value);
        batch.insert(TIP_KEY, block.hash.as_bytes());

        self.db.apply_batch(batch)?;
        self.db.flush()?;

        Ok(())
    }

    /// Gets a block by its hash
    ///
    /// An unset key is a normal outcome, reported as `None`.
    pub fn get_block(&self, hash: &str) -> Result<Option<Block>, StoreError> {
        match self.db.get(hash.as_bytes())? {
            Some(value) => {
                let block: Block = serde_json::from_slice(&value)
                    .map_err(|e| StoreError::Deserialization(e.to_string()))?;

                Ok(Some(block))
            }
            None => Ok(None),
        }
    }

    /// Resolves the tip pointer to the current tip block
    pub fn get_tip(&self) -> Result<Option<Block>, StoreError> {
        match self.db.get(TIP_KEY)? {
            Some(value) => {
                let hash = String::from_utf8_lossy(&value).to_string();
                self.get_block(&hash)
            }
            None => Ok(None),
        }
    }

    /// Creates and seals the genesis block if the store has no tip yet
    ///
    /// Safe to call on every startup; a store that already has a tip is
    /// left untouched.
    pub fn ensure_genesis(&self) -> Result<(), StoreError> {
        if self.db.get(TIP_KEY)?.is_some() {
            return Ok(());
        }

        let genesis = Block::new(
            0,
            vec![Transaction::genesis()],
            GENESIS_PREVIOUS_HASH.to_string(),
        );
        let sealed = pow::seal(genesis, self.difficulty);

        info!("Created genesis block {}", sealed.hash);

        self.put_block(&sealed)
    }

    /// Walks the chain backward from the tip, re-checking every block
    ///
    /// Each step verifies the stored hash against a recomputation, the
    /// difficulty predicate, and the linkage to a previous block whose
    /// index is exactly one less. A missing tip, a dangling reference,
    /// or an undecodable record all report as `false`; only a walk that
    /// terminates cleanly at the genesis sentinel is `true`.
    pub fn validate_chain(&self) -> Result<bool, StoreError> {
        let mut current = match self.get_tip() {
            Ok(Some(block)) => block,
            Ok(None) | Err(StoreError::Deserialization(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        loop {
            if current.hash != current.calculate_hash() {
                return Ok(false);
            }

            if !pow::meets_difficulty(&current.hash, self.difficulty) {
                return Ok(false);
            }

            if current.previous_hash == GENESIS_PREVIOUS_HASH {
                return Ok(current.index == 0);
            }

            let previous = match self.get_block(&current.previous_hash) {
                Ok(Some(block)) => block,
                Ok(None) | Err(StoreError::Deserialization(_)) => return Ok(false),
                Err(e) => return Err(e),
            };

            if previous.index + 1 != current.index {
                return Ok(false);
            }

            current = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_DIFFICULTY: usize = 1;

    fn open_store() -> (BlockStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = BlockStore::open(dir.path(), TEST_DIFFICULTY).unwrap();

        (store, dir)
    }

    fn append_block(store: &BlockStore) -> Block {
        let tip = store.get_tip().unwrap().unwrap();
        let block = Block::new(tip.index + 1, vec![Transaction::genesis()], tip.hash);
        let sealed = pow::seal(block, TEST_DIFFICULTY);

        store.put_block(&sealed).unwrap();

        sealed
    }

    #[test]
    fn test_genesis_created_on_open() {
        let (store, _dir) = open_store();

        let tip = store.get_tip().unwrap().unwrap();

        assert_eq!(tip.index, 0);
        assert_eq!(tip.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(tip.transactions.len(), 1);
        assert_eq!(tip.transactions[0].sender_pubkey, "0");
        assert!(pow::meets_difficulty(&tip.hash, TEST_DIFFICULTY));
    }

    #[test]
    fn test_ensure_genesis_is_idempotent() {
        let (store, _dir) = open_store();
        let tip_before = store.get_tip().unwrap().unwrap();

        store.ensure_genesis().unwrap();

        let tip_after = store.get_tip().unwrap().unwrap();
        assert_eq!(tip_before.hash, tip_after.hash);
    }

    #[test]
    fn test_get_absent_block_is_none() {
        let (store, _dir) = open_store();

        assert!(store.get_block("no such hash").unwrap().is_none());
    }

    #[test]
    fn test_put_block_advances_tip() {
        let (store, _dir) = open_store();

        let sealed = append_block(&store);

        let fetched = store.get_block(&sealed.hash).unwrap().unwrap();
        assert_eq!(fetched.index, 1);
        assert_eq!(fetched.hash, sealed.hash);

        let tip = store.get_tip().unwrap().unwrap();
        assert_eq!(tip.hash, sealed.hash);
    }

    #[test]
    fn test_validate_chain_after_appends() {
        let (store, _dir) = open_store();

        append_block(&store);
        append_block(&store);

        assert!(store.validate_chain().unwrap());
    }

    #[test]
    fn test_tampered_block_invalidates_chain() {
        let (store, _dir) = open_store();

        let sealed = append_block(&store);
        assert!(store.validate_chain().unwrap());

        // Rewrite the stored record without resealing
        let mut tampered = sealed.clone();
        tampered.transactions.push(Transaction::new(
            "attacker".to_string(),
            "attacker".to_string(),
            100.0,
        ));
        store.put_block(&tampered).unwrap();

        assert!(!store.validate_chain().unwrap());
    }

    #[test]
    fn test_reopen_keeps_existing_chain() {
        let dir = TempDir::new().unwrap();

        let store = BlockStore::open(dir.path(), TEST_DIFFICULTY).unwrap();
        let genesis_hash = store.get_tip().unwrap().unwrap().hash;
        drop(store);

        let reopened = BlockStore::open(dir.path(), TEST_DIFFICULTY).unwrap();
        let tip = reopened.get_tip().unwrap().unwrap();

        assert_eq!(tip.hash, genesis_hash);
        assert!(reopened.validate_chain().unwrap());
    }

    #[test]
    fn test_stricter_difficulty_invalidates_history() {
        let dir = TempDir::new().unwrap();

        let store = BlockStore::open(dir.path(), 1).unwrap();
        drop(store);

        // Validation always re-checks against the currently configured
        // difficulty, so a chain sealed at 1 will not pass at 4 unless
        // the genesis hash happens to clear the higher bar too.
        let reopened = BlockStore::open(dir.path(), 4).unwrap();
        let tip = reopened.get_tip().unwrap().unwrap();

        assert_eq!(
            reopened.validate_chain().unwrap(),
            pow::meets_difficulty(&tip.hash, 4)
        );
    }
}
