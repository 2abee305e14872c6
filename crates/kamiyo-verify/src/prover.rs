// crates/kamiyo-verify/src/prover.rs
//
// Seam to the external proving system. Proof bytes are opaque here; the
// verification target interprets them.

use kamiyo_accumulator::MerkleProof;
use kamiyo_core::{KamiyoError, ProverInput};

/// Produces proof byte strings for the two statements a combined check
/// carries.
pub trait ProofSystem: Send + Sync {
    /// Prove that the committed success rate meets `input.threshold`.
    fn prove_reputation(&self, input: &ProverInput) -> Result<Vec<u8>, KamiyoError>;

    /// Prove that `proof.key` is absent under `proof.root`.
    fn prove_exclusion(&self, proof: &MerkleProof) -> Result<Vec<u8>, KamiyoError>;
}
