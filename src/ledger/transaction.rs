use serde::{Deserialize, Serialize};

use super::crypto::{self, CryptoError};

/// Represents a transfer claim in the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's public key, hex-encoded
    pub sender_pubkey: String,

    /// Recipient's address, hex-encoded
    pub recipient_address: String,

    /// Amount being transferred
    pub amount: f64,

    /// Signature over the signable fields, hex-encoded; absent until signed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    /// Creates a new unsigned transaction
    ///
    /// # Arguments
    ///
    /// * `sender_pubkey` - The sender's hex-encoded public key
    /// * `recipient_address` - The recipient's hex-encoded address
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// A new Transaction instance
    pub fn new(sender_pubkey: String, recipient_address: String, amount: f64) -> Self {
        Transaction {
            sender_pubkey,
            recipient_address,
            amount,
            signature: None,
        }
    }

    /// Creates the sentinel transaction embedded in the genesis block
    pub fn genesis() -> Self {
        Transaction {
            sender_pubkey: "0".to_string(),
            recipient_address: "0".to_string(),
            amount: 0.0,
            signature: None,
        }
    }

    /// Canonical byte encoding of the signable fields
    ///
    /// Covers exactly sender, recipient, and amount; the signature field
    /// is excluded. Keys are emitted sorted, so the encoding does not
    /// depend on in-memory field order.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let data = serde_json::json!({
            "amount": self.amount,
            "recipient_address": self.recipient_address,
            "sender_pubkey": self.sender_pubkey,
        });

        serde_json::to_vec(&data).unwrap()
    }

    /// Signs the transaction with a hex-encoded private key
    ///
    /// Re-signing simply replaces the previous signature.
    pub fn sign(&mut self, private_key: &str) -> Result<(), CryptoError> {
        let signature = crypto::sign(private_key, &self.signable_bytes())?;
        self.signature = Some(signature);

        Ok(())
    }

    /// Verifies the signature against the sender's public key
    ///
    /// An unsigned transaction verifies as `false`, as does any decode
    /// failure of the key or signature.
    pub fn verify(&self) -> bool {
        let signature = match &self.signature {
            Some(signature) => signature,
            None => return false,
        };

        crypto::verify(&self.sender_pubkey, &self.signable_bytes(), signature)
    }
}
