// crates/kamiyo-core/src/settlement.rs
//
// Values exchanged with the settlement/transport collaborator.

use serde::{Deserialize, Serialize};

/// Acknowledgement returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Opaque transaction reference assigned by the target.
    pub signature: String,
    /// Slot (or block height) the submission landed in.
    pub slot: u64,
}

/// Outcome of a dry-run execution against the settlement target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub success: bool,
    /// Target-reported failure, if any.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
}
