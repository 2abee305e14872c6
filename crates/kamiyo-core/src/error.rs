// crates/kamiyo-core/src/error.rs

use thiserror::Error;

/// Error type shared by every crate in the Kamiyo workspace.
///
/// Only structural failures live here: malformed buffers, corrupted
/// accumulator state, and misuse of the accumulator. Policy outcomes of
/// credential verification are returned as values, not errors.
#[derive(Debug, Error)]
pub enum KamiyoError {
    /// A fixed-width buffer had the wrong length.
    #[error("Invalid length for {what}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Bytes or text that do not encode a canonical field element.
    #[error("Invalid field element: {0}")]
    InvalidFieldElement(String),

    /// An exclusion proof was requested for a key that is in the accumulator.
    #[error("Key is blacklisted: {0}")]
    Blacklisted(String),

    /// Replaying an imported accumulator did not reproduce its stated root.
    #[error("root mismatch after import: expected {expected}, got {actual}")]
    RootMismatch { expected: String, actual: String },

    /// A commitment was requested before any reputation data was set.
    #[error("no rep data")]
    NoRepData,

    /// Hashing error (Poseidon parameter or arity misuse).
    #[error("Hash error: {0}")]
    Hash(String),

    /// Cryptographic error (key decoding, signing).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage layer error (snapshot files).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Settlement transport failure (network, simulation).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Inputs that are individually well-formed but inconsistent with each
    /// other (e.g. a credential bound to an older blacklist root).
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for KamiyoError {
    fn from(e: serde_json::Error) -> Self {
        KamiyoError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for KamiyoError {
    fn from(e: toml::de::Error) -> Self {
        KamiyoError::Config(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for KamiyoError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        KamiyoError::Crypto(e.to_string())
    }
}

impl From<light_poseidon::PoseidonError> for KamiyoError {
    fn from(e: light_poseidon::PoseidonError) -> Self {
        KamiyoError::Hash(e.to_string())
    }
}
