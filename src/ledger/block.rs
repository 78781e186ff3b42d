use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::transaction::Transaction;

/// Previous-hash sentinel carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Represents a block in the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Index of the block in the chain
    pub index: u64,

    /// Assembly time, milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Transactions included in this block, in submission order
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block, "0" for genesis
    pub previous_hash: String,

    /// Nonce found by the proof-of-work search
    pub nonce: u64,

    /// Hash of the current block (assigned when sealed)
    pub hash: String,
}

impl Block {
    /// Assembles an unsealed candidate block
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `transactions` - The transactions to include in the block
    /// * `previous_hash` - The hash of the previous block
    ///
    /// # Returns
    ///
    /// A new Block instance, timestamped now, with nonce zero and an
    /// empty hash; sealing assigns the final nonce and hash
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        Block {
            index,
            timestamp: Utc::now().timestamp_millis(),
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        }
    }

    /// Calculates the canonical hash of the block
    ///
    /// Every field except `hash` participates. The fields are serialized
    /// as JSON with sorted keys (transactions as objects of their own
    /// fields, signature included); the digest is reproducible
    /// bit-for-bit for a given field state.
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block as a lowercase hexadecimal string
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();

        let block_data = serde_json::json!({
            "index": self.index,
            "nonce": self.nonce,
            "previous_hash": self.previous_hash,
            "timestamp": self.timestamp,
            "transactions": self.transactions,
        });

        let block_string = serde_json::to_string(&block_data).unwrap();

        hasher.update(block_string.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}
