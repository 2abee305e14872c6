// crates/kamiyo-core/src/traits.rs

use async_trait::async_trait;

use crate::error::KamiyoError;
use crate::field::FieldElement;
use crate::reputation::RepData;
use crate::settlement::{SimulationReport, SubmitReceipt};

/// Source of raw reputation counters (the escrow/dispute ledger).
///
/// Implemented outside this workspace, typically over RPC.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Fetch the counters for an entity. `Ok(None)` means the entity has no
    /// history yet.
    async fn fetch_rep(&self, agent_pk: &FieldElement) -> Result<Option<RepData>, KamiyoError>;
}

/// Transport to the external verification target.
///
/// Calls are independent request/response exchanges. Implementations own
/// retry and deadline policy; callers in this workspace never retry.
#[async_trait]
pub trait SettlementTransport: Send + Sync {
    /// Submit an encoded verification payload for execution.
    async fn submit(&self, payload: &[u8]) -> Result<SubmitReceipt, KamiyoError>;

    /// Execute the payload without committing it.
    async fn simulate(&self, payload: &[u8]) -> Result<SimulationReport, KamiyoError>;
}
