// crates/kamiyo-core/src/crypto.rs

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::KamiyoError;

/// Length of an ed25519 signature.
pub const SIGNATURE_BYTES: usize = 64;

/// Length of an ed25519 public key.
pub const PUBLIC_KEY_BYTES: usize = 32;

/// An ed25519 keypair for signing and verification.
///
/// The signing half never leaves this struct except through
/// [`Keypair::secret_bytes`]; `Debug` prints only the public key.
pub struct Keypair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Rebuild a keypair from a 32-byte secret seed. Takes ownership so the
    /// caller's copy can be dropped.
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&secret))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Get the public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_BYTES] {
        self.verifying_key.to_bytes()
    }

    /// Export the secret seed, e.g. for sealing into a key store.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message and return the signature bytes.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_BYTES] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verify a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_BYTES]) -> bool {
        let signature = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying_key.verify(message, &signature).is_ok()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

/// Verify an ed25519 signature.
///
/// Returns `Ok(true)` if the signature is valid for the given message and
/// public key, `Ok(false)` if it is not, and an error only when the public
/// key bytes are not a valid curve point.
pub fn verify_signature(
    public_key_bytes: &[u8; PUBLIC_KEY_BYTES],
    message: &[u8],
    signature_bytes: &[u8; SIGNATURE_BYTES],
) -> Result<bool, KamiyoError> {
    let verifying_key = VerifyingKey::from_bytes(public_key_bytes)
        .map_err(|e| KamiyoError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature = ed25519_dalek::Signature::from_bytes(signature_bytes);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Compute SHA-256 hash of the given bytes.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
