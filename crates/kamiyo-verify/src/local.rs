// crates/kamiyo-verify/src/local.rs
//
// Stateless re-verification of accumulator proofs for parties that only
// hold a proof object. Must fold exactly as the accumulator does.

use kamiyo_accumulator::{MerkleProof, DEPTH};
use kamiyo_core::{hash_one, hash_pair, FieldElement, KamiyoError};

/// Returns true when the proof's siblings fold `H(key)` (or zero, for an
/// absence check) up to the proof's root. Malformed proofs are false.
pub fn local_verify_merkle(proof: &MerkleProof, expect_exists: bool) -> bool {
    match fold_root(proof, expect_exists) {
        Ok(root) => root == proof.root,
        Err(e) => {
            tracing::debug!("Rejected merkle proof for key {}: {}", proof.key, e);
            false
        }
    }
}

fn fold_root(proof: &MerkleProof, expect_exists: bool) -> Result<FieldElement, KamiyoError> {
    if proof.siblings.len() != DEPTH {
        return Err(KamiyoError::InvalidLength {
            what: "merkle proof siblings",
            expected: DEPTH,
            actual: proof.siblings.len(),
        });
    }
    let mut node = if expect_exists {
        hash_one(&proof.key)?
    } else {
        FieldElement::zero()
    };
    for (level, sibling) in proof.siblings.iter().enumerate() {
        node = match proof.key.bit(level) {
            false => hash_pair(&node, sibling)?,
            true => hash_pair(sibling, &node)?,
        };
    }
    Ok(node)
}
