// crates/kamiyo-accumulator/src/proof.rs

use serde::{Deserialize, Serialize};

use kamiyo_core::{hash_one, hash_pair, FieldElement, KamiyoError};

use crate::tree::DEPTH;

/// A self-contained membership or non-membership proof.
///
/// `siblings[i]` is the sibling hash at height `i` (leaf level first).
/// Verification never consults a live tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    pub root: FieldElement,
    pub key: FieldElement,
    pub siblings: Vec<FieldElement>,
    /// Whether the key was present when the proof was generated.
    pub exists: bool,
}

impl MerkleProof {
    /// Fold `leaf` up through the siblings and return the resulting root.
    ///
    /// At height `i`, a zero bit of the key puts the running hash on the
    /// left, a one bit puts it on the right.
    pub fn compute_root(&self, leaf: FieldElement) -> Result<FieldElement, KamiyoError> {
        if self.siblings.len() != DEPTH {
            return Err(KamiyoError::InvalidLength {
                what: "merkle proof siblings",
                expected: DEPTH,
                actual: self.siblings.len(),
            });
        }
        let mut current = leaf;
        for (height, sibling) in self.siblings.iter().enumerate() {
            current = if self.key.bit(height) {
                hash_pair(sibling, &current)?
            } else {
                hash_pair(&current, sibling)?
            };
        }
        Ok(current)
    }

    /// Check the proof against its own root.
    ///
    /// With `expect_exists` the leaf is `H(key)`; otherwise it is zero, which
    /// makes a passing proof a proof of absence.
    pub fn verify(&self, expect_exists: bool) -> bool {
        let leaf = if expect_exists {
            match hash_one(&self.key) {
                Ok(leaf) => leaf,
                Err(_) => return false,
            }
        } else {
            FieldElement::zero()
        };
        match self.compute_root(leaf) {
            Ok(root) => root == self.root,
            Err(_) => false,
        }
    }
}
