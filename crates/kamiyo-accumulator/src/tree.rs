// crates/kamiyo-accumulator/src/tree.rs
//
// Fixed-depth sparse Merkle tree over the field key space.
//
// One level per key bit, 256 levels. Nodes are addressed by
// (height, key >> height): height 0 is the leaf row, height 256 the root.
// Only nodes that differ from the empty-subtree hash of their height are
// stored, so the stored map, not just the root, is a function of the set of
// non-empty leaves.

use std::collections::HashMap;
use std::sync::OnceLock;

use kamiyo_core::{hash_pair, FieldElement, KamiyoError};

/// Tree depth: one level per bit of a 256-bit key.
pub const DEPTH: usize = 256;

static EMPTY_HASHES: OnceLock<Vec<FieldElement>> = OnceLock::new();

/// Hashes of empty subtrees by height.
///
/// `empty[0]` is the zero element and `empty[i] = H(empty[i-1], empty[i-1])`,
/// so `empty[DEPTH]` is the root of an empty tree. Computed once per process.
pub fn empty_hashes() -> Result<&'static [FieldElement], KamiyoError> {
    if let Some(cached) = EMPTY_HASHES.get() {
        return Ok(cached);
    }
    let mut hashes = Vec::with_capacity(DEPTH + 1);
    hashes.push(FieldElement::zero());
    for height in 1..=DEPTH {
        let below = hashes[height - 1];
        hashes.push(hash_pair(&below, &below)?);
    }
    Ok(EMPTY_HASHES.get_or_init(|| hashes))
}

/// Address of a node: its height above the leaves and the key prefix
/// leading to it (the key shifted right by `height`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeIndex {
    height: u16,
    path: [u64; 4],
}

impl NodeIndex {
    fn on_path(key: &FieldElement, height: usize) -> Self {
        Self {
            height: height as u16,
            path: shift_right(key.limbs(), height),
        }
    }

    fn sibling(self) -> Self {
        let mut path = self.path;
        path[0] ^= 1;
        Self {
            height: self.height,
            path,
        }
    }
}

fn shift_right(limbs: [u64; 4], shift: usize) -> [u64; 4] {
    let words = shift / 64;
    let bits = shift % 64;
    let mut out = [0u64; 4];
    for (i, slot) in out.iter_mut().enumerate() {
        let src = i + words;
        if src >= limbs.len() {
            break;
        }
        let mut value = limbs[src] >> bits;
        if bits > 0 && src + 1 < limbs.len() {
            value |= limbs[src + 1] << (64 - bits);
        }
        *slot = value;
    }
    out
}

/// The tree itself: a root plus the sparse node map.
///
/// Not synchronized. Mutation rewrites nodes in place, so concurrent readers
/// need external locking or a clone taken before the write.
#[derive(Debug, Clone)]
pub struct SparseMerkleTree {
    nodes: HashMap<NodeIndex, FieldElement>,
    root: FieldElement,
}

impl SparseMerkleTree {
    /// Create an empty tree, whose root is `empty_hashes()[DEPTH]`.
    pub fn new() -> Result<Self, KamiyoError> {
        let empties = empty_hashes()?;
        Ok(Self {
            nodes: HashMap::new(),
            root: empties[DEPTH],
        })
    }

    pub fn root(&self) -> FieldElement {
        self.root
    }

    /// Number of stored (non-empty) nodes across all heights.
    pub fn stored_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Set the leaf at `key` to `leaf` and rehash the path up to the root.
    ///
    /// Exactly `DEPTH` node hashes are computed.
    pub fn set_leaf(&mut self, key: &FieldElement, leaf: FieldElement) -> Result<(), KamiyoError> {
        let empties = empty_hashes()?;
        let mut current = leaf;
        self.store(NodeIndex::on_path(key, 0), current, empties[0]);

        for height in 0..DEPTH {
            let sibling = self.node_or_empty(NodeIndex::on_path(key, height).sibling(), empties);
            current = if key.bit(height) {
                hash_pair(&sibling, &current)?
            } else {
                hash_pair(&current, &sibling)?
            };
            self.store(NodeIndex::on_path(key, height + 1), current, empties[height + 1]);
        }

        self.root = current;
        Ok(())
    }

    /// Sibling hashes along the path of `key`, leaf level first.
    pub fn siblings(&self, key: &FieldElement) -> Result<Vec<FieldElement>, KamiyoError> {
        let empties = empty_hashes()?;
        Ok((0..DEPTH)
            .map(|height| self.node_or_empty(NodeIndex::on_path(key, height).sibling(), empties))
            .collect())
    }

    fn node_or_empty(&self, index: NodeIndex, empties: &[FieldElement]) -> FieldElement {
        self.nodes
            .get(&index)
            .copied()
            .unwrap_or(empties[index.height as usize])
    }

    fn store(&mut self, index: NodeIndex, value: FieldElement, empty: FieldElement) {
        if value == empty {
            self.nodes.remove(&index);
        } else {
            self.nodes.insert(index, value);
        }
    }
}
