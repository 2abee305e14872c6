// crates/kamiyo-core/src/lib.rs
//
// kamiyo-core: Field elements, Poseidon hashing, signing helpers, and shared
// types for the Kamiyo reputation shield.
//
// This is the leaf crate that the accumulator, credential, and verifier
// crates depend on. It defines the uniform value type (a BN254 field
// element), the error type, configuration, and the collaborator traits.

pub mod config;
pub mod crypto;
pub mod error;
pub mod field;
pub mod reputation;
pub mod settlement;
pub mod time;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use kamiyo_core::FieldElement;`

pub use config::{AccumulatorConfig, AuthorityConfig, KamiyoConfig, VerifierConfig};
pub use crypto::Keypair;
pub use error::KamiyoError;
pub use field::{hash_one, hash_pair, poseidon, FieldElement, FIELD_BYTES};
pub use reputation::{ProverInput, RepData};
pub use settlement::{SimulationReport, SubmitReceipt};
pub use time::unix_now;
pub use traits::{ReputationSource, SettlementTransport};
