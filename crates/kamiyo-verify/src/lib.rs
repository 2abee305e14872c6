// crates/kamiyo-verify/src/lib.rs
//
// kamiyo-verify: wire framing for the external verification target,
// stateless accumulator-proof checks, and the transport-facing verifier.

pub mod encoder;
pub mod local;
pub mod prover;
pub mod verifier;

pub use encoder::{
    CombinedVerify, ProofEncoder, OP_COMBINED_VERIFY, OP_EXCLUSION_VERIFY, OP_REPUTATION_VERIFY,
};
pub use local::local_verify_merkle;
pub use prover::ProofSystem;
pub use verifier::{VerificationResult, Verifier};
