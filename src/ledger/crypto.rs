use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Malformed key material: {0}")]
    KeyFormat(String),
}

/// Represents an ed25519 keypair used to produce transaction signatures
#[derive(Debug, Clone)]
pub struct Keypair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generates a new keypair from the system CSPRNG
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key = VerifyingKey::from(&signing_key);

        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuilds a keypair from a hex-encoded secret key
    pub fn from_secret_hex(secret: &str) -> Result<Self, CryptoError> {
        let signing_key = decode_signing_key(secret)?;
        let verifying_key = VerifyingKey::from(&signing_key);

        Ok(Keypair {
            signing_key,
            verifying_key,
        })
    }

    /// Gets the public key as a hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Exports the secret key as a hex string
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

/// Signs a message with a hex-encoded private key
///
/// # Arguments
///
/// * `private_key` - The hex-encoded ed25519 secret key
/// * `message` - The bytes to sign
///
/// # Returns
///
/// The hex-encoded signature, or a `KeyFormat` error if the private key
/// is malformed
pub fn sign(private_key: &str, message: &[u8]) -> Result<String, CryptoError> {
    let signing_key = decode_signing_key(private_key)?;
    let signature = signing_key.sign(message);

    Ok(hex::encode(signature.to_bytes()))
}

/// Verifies a hex-encoded signature against a message and public key
///
/// This never errors: a malformed key, a malformed signature, or a
/// cryptographic mismatch all report as `false`.
pub fn verify(public_key: &str, message: &[u8], signature: &str) -> bool {
    let verifying_key = match decode_verifying_key(public_key) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let signature_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let signature_bytes: [u8; 64] = match signature_bytes.try_into() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let signature = Signature::from_bytes(&signature_bytes);

    verifying_key.verify(message, &signature).is_ok()
}

/// Decodes a hex-encoded ed25519 secret key
fn decode_signing_key(private_key: &str) -> Result<SigningKey, CryptoError> {
    let bytes = hex::decode(private_key).map_err(|e| CryptoError::KeyFormat(e.to_string()))?;

    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::KeyFormat("private key must be 32 bytes".to_string()))?;

    Ok(SigningKey::from_bytes(&bytes))
}

/// Decodes a hex-encoded ed25519 public key
fn decode_verifying_key(public_key: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = hex::decode(public_key).map_err(|e| CryptoError::KeyFormat(e.to_string()))?;

    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::KeyFormat("public key must be 32 bytes".to_string()))?;

    VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::KeyFormat(e.to_string()))
}
