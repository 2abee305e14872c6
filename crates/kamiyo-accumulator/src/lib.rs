// crates/kamiyo-accumulator/src/lib.rs
//
// kamiyo-accumulator: Sparse Merkle tree blacklist with constant-size
// membership and exclusion proofs.
//
// Keys are field elements. Every proof carries 256 sibling hashes regardless
// of how many keys are blacklisted, and verifying one needs nothing but the
// proof itself.

pub mod accumulator;
pub mod proof;
pub mod tree;

pub use accumulator::{Accumulator, AccumulatorEntry, AccumulatorExport};
pub use proof::MerkleProof;
pub use tree::{empty_hashes, SparseMerkleTree, DEPTH};
