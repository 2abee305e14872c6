// crates/kamiyo-accumulator/src/accumulator.rs
//
// The blacklist accumulator: an entry registry kept in lockstep with a
// sparse Merkle tree.
//
// Membership queries hit the registry; proofs walk the tree. The root is a
// pure function of the set of keys present, independent of insertion order
// and of earlier removals.

use std::collections::HashMap;
use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kamiyo_core::{hash_one, AccumulatorConfig, FieldElement, KamiyoError};

use crate::proof::MerkleProof;
use crate::tree::SparseMerkleTree;

/// A blacklisted key and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorEntry {
    pub key: FieldElement,
    /// When the key was added (unix milliseconds on the wire).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Portable snapshot of an accumulator. `root` doubles as a checksum for
/// the entry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorExport {
    pub root: FieldElement,
    pub entries: Vec<AccumulatorEntry>,
}

/// Sparse-Merkle-tree accumulator over blacklisted keys.
///
/// Mutation (`add`/`remove`) requires `&mut self`; share it behind a lock
/// when proofs are served concurrently with updates.
#[derive(Debug, Clone)]
pub struct Accumulator {
    tree: SparseMerkleTree,
    entries: HashMap<FieldElement, AccumulatorEntry>,
    last_updated: Option<DateTime<Utc>>,
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Result<Self, KamiyoError> {
        Ok(Self {
            tree: SparseMerkleTree::new()?,
            entries: HashMap::new(),
            last_updated: None,
        })
    }

    pub fn root(&self) -> FieldElement {
        self.tree.root()
    }

    /// Number of keys present.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the last mutation that changed the root.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn entry(&self, key: &FieldElement) -> Option<&AccumulatorEntry> {
        self.entries.get(key)
    }

    /// All entries, oldest first (ties broken by key).
    pub fn entries(&self) -> Vec<&AccumulatorEntry> {
        let mut entries: Vec<&AccumulatorEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.key.cmp(&b.key)));
        entries
    }

    /// Insert `key`. Returns `Ok(false)` without touching the tree if the key
    /// is already present.
    pub fn add(&mut self, key: FieldElement, reason: Option<String>) -> Result<bool, KamiyoError> {
        self.add_at(key, reason, Utc::now())
    }

    fn add_at(
        &mut self,
        key: FieldElement,
        reason: Option<String>,
        added_at: DateTime<Utc>,
    ) -> Result<bool, KamiyoError> {
        if self.entries.contains_key(&key) {
            return Ok(false);
        }
        self.tree.set_leaf(&key, hash_one(&key)?)?;
        self.entries.insert(
            key,
            AccumulatorEntry {
                key,
                added_at,
                reason,
            },
        );
        self.last_updated = Some(Utc::now());
        tracing::debug!("Blacklisted key {} (root {})", key, self.root());
        Ok(true)
    }

    /// Remove `key`. Returns `Ok(false)` and leaves the root unchanged if the
    /// key is absent.
    pub fn remove(&mut self, key: &FieldElement) -> Result<bool, KamiyoError> {
        if !self.entries.contains_key(key) {
            return Ok(false);
        }
        self.tree.set_leaf(key, FieldElement::zero())?;
        self.entries.remove(key);
        self.last_updated = Some(Utc::now());
        tracing::debug!("Removed key {} from blacklist (root {})", key, self.root());
        Ok(true)
    }

    /// Registry lookup; does not walk the tree.
    pub fn contains(&self, key: &FieldElement) -> bool {
        self.entries.contains_key(key)
    }

    /// Proof for `key` against the current root, tagged with whether the key
    /// is present.
    pub fn proof(&self, key: &FieldElement) -> Result<MerkleProof, KamiyoError> {
        Ok(MerkleProof {
            root: self.root(),
            key: *key,
            siblings: self.tree.siblings(key)?,
            exists: self.contains(key),
        })
    }

    /// Non-membership proof for `key`. Fails with `Blacklisted` if the key is
    /// present, so a member can never obtain one by mistake.
    pub fn exclusion_proof(&self, key: &FieldElement) -> Result<MerkleProof, KamiyoError> {
        if self.contains(key) {
            tracing::warn!("Refused exclusion proof for blacklisted key {}", key);
            return Err(KamiyoError::Blacklisted(key.to_hex()));
        }
        self.proof(key)
    }

    /// Stateless proof check; the same computation a remote verifier runs.
    pub fn verify(proof: &MerkleProof, expect_exists: bool) -> bool {
        proof.verify(expect_exists)
    }

    pub fn export(&self) -> AccumulatorExport {
        AccumulatorExport {
            root: self.root(),
            entries: self.entries().into_iter().cloned().collect(),
        }
    }

    /// Rebuild an accumulator by replaying every entry, then require the
    /// replayed root to equal the exported one.
    pub fn import(data: &AccumulatorExport) -> Result<Self, KamiyoError> {
        let mut accumulator = Self::new()?;
        for entry in &data.entries {
            accumulator.add_at(entry.key, entry.reason.clone(), entry.added_at)?;
        }
        if accumulator.root() != data.root {
            tracing::warn!(
                "Import root mismatch: expected {}, replay produced {}",
                data.root,
                accumulator.root()
            );
            return Err(KamiyoError::RootMismatch {
                expected: data.root.to_hex(),
                actual: accumulator.root().to_hex(),
            });
        }
        accumulator.last_updated = data.entries.iter().map(|e| e.added_at).max();
        tracing::info!("Imported blacklist with {} entries", accumulator.size());
        Ok(accumulator)
    }

    pub fn to_json(&self) -> Result<String, KamiyoError> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    pub fn from_json(json: &str) -> Result<Self, KamiyoError> {
        let data: AccumulatorExport = serde_json::from_str(json)?;
        Self::import(&data)
    }

    /// Write the JSON export to `path`.
    pub fn save_to(&self, path: &str) -> Result<(), KamiyoError> {
        let json = self.to_json()?;
        fs::write(path, json)
            .map_err(|e| KamiyoError::Storage(format!("cannot write {}: {}", path, e)))
    }

    /// Read a JSON export from `path` and import it.
    pub fn load_from(path: &str) -> Result<Self, KamiyoError> {
        let json = fs::read_to_string(path)
            .map_err(|e| KamiyoError::Storage(format!("cannot read {}: {}", path, e)))?;
        Self::from_json(&json)
    }

    /// Save to the configured `export_path`.
    pub fn save(&self, config: &AccumulatorConfig) -> Result<(), KamiyoError> {
        self.save_to(export_path(config)?)
    }

    /// Load from the configured `export_path`.
    pub fn load(config: &AccumulatorConfig) -> Result<Self, KamiyoError> {
        Self::load_from(export_path(config)?)
    }
}

fn export_path(config: &AccumulatorConfig) -> Result<&str, KamiyoError> {
    config
        .export_path
        .as_deref()
        .ok_or_else(|| KamiyoError::Config("accumulator.export_path is not set".to_string()))
}
