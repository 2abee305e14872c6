// crates/kamiyo-credential/src/lib.rs
//
// kamiyo-credential: Reputation commitments and the signed credential
// protocol.
//
// Raw counters go into a CommitmentEngine, which yields a blinded
// commitment. The CredentialAuthority binds that commitment, the current
// blacklist root, and a validity window under an ed25519 signature.

pub mod authority;
pub mod commitment;
pub mod credential;

pub use authority::{CredentialAuthority, CredentialCheck, RejectReason};
pub use commitment::CommitmentEngine;
pub use credential::{Credential, SignedCredential, CREDENTIAL_BYTES, SIGNED_CREDENTIAL_BYTES};
