// crates/kamiyo-core/src/reputation.rs
//
// Raw reputation counters and the witness handed to an external prover.
//
// The counters come from the escrow/dispute ledger; this workspace never
// scores them, it only commits to them and checks thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::FieldElement;

/// Raw reputation counters for one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepData {
    /// Escrows that settled successfully.
    pub successful: u64,
    /// All escrows the entity took part in.
    pub total: u64,
    pub disputes_won: u64,
    pub disputes_lost: u64,
}

impl RepData {
    pub fn new(successful: u64, total: u64, disputes_won: u64, disputes_lost: u64) -> Self {
        Self {
            successful,
            total,
            disputes_won,
            disputes_lost,
        }
    }
}

/// Private witness for a reputation-threshold proof.
///
/// This is the only structure that carries the raw counters together with
/// the blinding factor. It serializes (the prover needs it) but its `Debug`
/// output redacts the blinding factor.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProverInput {
    #[serde(flatten)]
    pub rep: RepData,
    pub blinding: FieldElement,
    pub agent_pk: FieldElement,
    pub threshold: u64,
}

impl fmt::Debug for ProverInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProverInput")
            .field("rep", &self.rep)
            .field("blinding", &"<redacted>")
            .field("agent_pk", &self.agent_pk)
            .field("threshold", &self.threshold)
            .finish()
    }
}
