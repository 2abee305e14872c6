// crates/kamiyo-verify/src/verifier.rs
//
// Verifier: frames payloads with ProofEncoder and hands them to a
// SettlementTransport. One request per call; nothing here retries.

use serde::{Deserialize, Serialize};

use kamiyo_accumulator::{Accumulator, MerkleProof};
use kamiyo_core::{FieldElement, KamiyoError, SettlementTransport, SubmitReceipt, VerifierConfig};
use kamiyo_credential::{CommitmentEngine, SignedCredential};

use crate::encoder::ProofEncoder;
use crate::prover::ProofSystem;

/// Outcome of a remote verification. Transport failures land here as
/// `valid: false` with the message in `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl VerificationResult {
    fn transport_failure(message: String) -> Self {
        Self {
            valid: false,
            error: Some(message),
            logs: Vec::new(),
        }
    }
}

pub struct Verifier<T: SettlementTransport> {
    transport: T,
    encoder: ProofEncoder,
    target: String,
}

impl<T: SettlementTransport> Verifier<T> {
    pub fn new(transport: T, config: &VerifierConfig) -> Self {
        Self {
            transport,
            encoder: ProofEncoder::new(config),
            target: config.target.clone(),
        }
    }

    pub fn encoder(&self) -> &ProofEncoder {
        &self.encoder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Submit an encoded payload for execution. Errors are returned as-is.
    pub async fn submit(&self, payload: &[u8]) -> Result<SubmitReceipt, KamiyoError> {
        match self.transport.submit(payload).await {
            Ok(receipt) => {
                tracing::info!(
                    "Submitted {} byte payload to {} (ref {}, slot {})",
                    payload.len(),
                    self.target,
                    receipt.signature,
                    receipt.slot
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!("Submit to {} failed: {}", self.target, e);
                Err(e)
            }
        }
    }

    /// Dry-run an encoded payload against the target.
    pub async fn verify_remote(&self, payload: &[u8]) -> VerificationResult {
        match self.transport.simulate(payload).await {
            Ok(report) => {
                if !report.success {
                    tracing::debug!(
                        "Target {} rejected payload: {}",
                        self.target,
                        report.error.as_deref().unwrap_or("no error given")
                    );
                }
                VerificationResult {
                    valid: report.success,
                    error: report.error,
                    logs: report.logs,
                }
            }
            Err(e) => {
                tracing::warn!("Simulation on {} failed: {}", self.target, e);
                VerificationResult::transport_failure(e.to_string())
            }
        }
    }

    /// Encode and remotely check a reputation-threshold proof.
    pub async fn verify_reputation_remote(
        &self,
        proof: &[u8],
        agent_pk: &FieldElement,
        commitment: &FieldElement,
        threshold: u64,
    ) -> Result<VerificationResult, KamiyoError> {
        let payload = self
            .encoder
            .encode_reputation_verify(proof, agent_pk, commitment, threshold)?;
        Ok(self.verify_remote(&payload).await)
    }

    /// Encode and remotely check an exclusion proof.
    pub async fn verify_exclusion_remote(
        &self,
        proof: &[u8],
        merkle: &MerkleProof,
    ) -> Result<VerificationResult, KamiyoError> {
        let payload = self.encoder.encode_exclusion_from(proof, merkle)?;
        Ok(self.verify_remote(&payload).await)
    }

    /// Encode and remotely check a credential with its sub-proofs.
    pub async fn verify_combined_remote(
        &self,
        signed: &SignedCredential,
        threshold: u64,
        reputation_proof: Option<&[u8]>,
        exclusion_proof: Option<&[u8]>,
    ) -> Result<VerificationResult, KamiyoError> {
        let payload = self.encoder.encode_combined_verify(
            signed,
            threshold,
            reputation_proof,
            exclusion_proof,
        )?;
        Ok(self.verify_remote(&payload).await)
    }

    /// Build a combined payload for `signed`: proves the threshold from the
    /// engine's witness and the holder's absence from the blacklist.
    ///
    /// The engine must reproduce the credential's commitment and the
    /// accumulator must still have the root the credential was bound to.
    /// A blacklisted holder fails with `Blacklisted`.
    pub fn prepare_combined(
        &self,
        prover: &dyn ProofSystem,
        signed: &SignedCredential,
        engine: &CommitmentEngine,
        accumulator: &Accumulator,
        threshold: u64,
    ) -> Result<Vec<u8>, KamiyoError> {
        let credential = &signed.credential;
        let commitment = engine.commitment()?;
        if commitment != credential.rep_commitment {
            return Err(KamiyoError::InvalidState(format!(
                "engine commitment {} does not match credential commitment {}",
                commitment, credential.rep_commitment
            )));
        }

        let exclusion = accumulator.exclusion_proof(&credential.agent_pk)?;
        if exclusion.root != credential.blacklist_root {
            return Err(KamiyoError::InvalidState(format!(
                "credential bound to blacklist root {}, accumulator is at {}",
                credential.blacklist_root, exclusion.root
            )));
        }

        let input = engine
            .prover_input(threshold)
            .ok_or(KamiyoError::NoRepData)?;
        let reputation_proof = prover.prove_reputation(&input)?;
        let exclusion_proof = prover.prove_exclusion(&exclusion)?;

        self.encoder.encode_combined_verify(
            signed,
            threshold,
            Some(&reputation_proof),
            Some(&exclusion_proof),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kamiyo_core::SimulationReport;

    struct DownTransport;

    #[async_trait]
    impl SettlementTransport for DownTransport {
        async fn submit(&self, _payload: &[u8]) -> Result<SubmitReceipt, KamiyoError> {
            Err(KamiyoError::Transport("connection refused".to_string()))
        }

        async fn simulate(&self, _payload: &[u8]) -> Result<SimulationReport, KamiyoError> {
            Err(KamiyoError::Transport("connection refused".to_string()))
        }
    }

    struct RejectingTransport;

    #[async_trait]
    impl SettlementTransport for RejectingTransport {
        async fn submit(&self, _payload: &[u8]) -> Result<SubmitReceipt, KamiyoError> {
            Ok(SubmitReceipt {
                signature: "tx-1".to_string(),
                slot: 7,
            })
        }

        async fn simulate(&self, _payload: &[u8]) -> Result<SimulationReport, KamiyoError> {
            Ok(SimulationReport {
                success: false,
                error: Some("threshold not met".to_string()),
                logs: vec!["program log: verify".to_string()],
            })
        }
    }

    #[tokio::test]
    async fn test_transport_error_folds_into_result() {
        let verifier = Verifier::new(DownTransport, &VerifierConfig::default());
        let result = verifier.verify_remote(&[0x01]).await;
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_submit_error_is_returned() {
        let verifier = Verifier::new(DownTransport, &VerifierConfig::default());
        let err = verifier.submit(&[0x01]).await.unwrap_err();
        assert!(matches!(err, KamiyoError::Transport(_)));
    }

    #[tokio::test]
    async fn test_target_rejection_carries_logs() {
        let verifier = Verifier::new(RejectingTransport, &VerifierConfig::default());
        let result = verifier
            .verify_reputation_remote(
                &[1, 2, 3],
                &FieldElement::from_u64(1),
                &FieldElement::from_u64(2),
                80,
            )
            .await
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("threshold not met"));
        assert_eq!(result.logs, vec!["program log: verify".to_string()]);

        let receipt = verifier.submit(&[1]).await.unwrap();
        assert_eq!(receipt.slot, 7);
    }

    #[tokio::test]
    async fn test_oversized_proof_is_structural_not_transport() {
        let config = VerifierConfig {
            target: "test".to_string(),
            max_proof_bytes: 2,
        };
        let verifier = Verifier::new(RejectingTransport, &config);
        let result = verifier
            .verify_reputation_remote(
                &[0; 3],
                &FieldElement::from_u64(1),
                &FieldElement::from_u64(2),
                80,
            )
            .await;
        assert!(matches!(result, Err(KamiyoError::Serialization(_))));
    }

    #[test]
    fn test_result_json_omits_missing_error() {
        let result = VerificationResult {
            valid: true,
            error: None,
            logs: Vec::new(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"valid":true,"logs":[]}"#);
    }
}
