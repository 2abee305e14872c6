// crates/kamiyo-verify/tests/end_to_end.rs
//
// Integration tests for the full shield pipeline: ledger counters into a
// commitment, a credential bound to the live blacklist root, proof
// preparation, and a round trip through a mock settlement target.
//
// Collaborators (ledger, prover, transport) are small in-test structs.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use kamiyo_accumulator::Accumulator;
use kamiyo_core::{
    FieldElement, KamiyoError, Keypair, RepData, ReputationSource, SettlementTransport,
    SimulationReport, SubmitReceipt, VerifierConfig,
};
use kamiyo_credential::{CommitmentEngine, CredentialAuthority, RejectReason};
use kamiyo_verify::{
    local_verify_merkle, CombinedVerify, ProofSystem, Verifier, OP_COMBINED_VERIFY,
};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

struct Ledger(RepData);

#[async_trait]
impl ReputationSource for Ledger {
    async fn fetch_rep(&self, _agent_pk: &FieldElement) -> Result<Option<RepData>, KamiyoError> {
        Ok(Some(self.0))
    }
}

/// Emits recognisable proof bytes and refuses statements it cannot prove.
struct StubProver;

impl ProofSystem for StubProver {
    fn prove_reputation(&self, input: &kamiyo_core::ProverInput) -> Result<Vec<u8>, KamiyoError> {
        let rate = input.rep.successful * 100 / input.rep.total.max(1);
        if rate < input.threshold {
            return Err(KamiyoError::InvalidState("threshold not met".to_string()));
        }
        let mut proof = b"REP".to_vec();
        proof.extend_from_slice(&input.threshold.to_le_bytes());
        Ok(proof)
    }

    fn prove_exclusion(
        &self,
        proof: &kamiyo_accumulator::MerkleProof,
    ) -> Result<Vec<u8>, KamiyoError> {
        if !local_verify_merkle(proof, false) {
            return Err(KamiyoError::InvalidState("key is not absent".to_string()));
        }
        let mut out = b"EXC".to_vec();
        out.extend_from_slice(&proof.root.to_bytes());
        Ok(out)
    }
}

/// Accepts well-formed combined frames carrying both sub-proofs; records
/// every payload it sees.
#[derive(Clone, Default)]
struct MockTarget {
    seen: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockTarget {
    fn seen(&self) -> Vec<Vec<u8>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettlementTransport for MockTarget {
    async fn submit(&self, payload: &[u8]) -> Result<SubmitReceipt, KamiyoError> {
        let mut seen = self.seen.lock().unwrap();
        seen.push(payload.to_vec());
        Ok(SubmitReceipt {
            signature: format!("tx-{}", seen.len()),
            slot: 100 + seen.len() as u64,
        })
    }

    async fn simulate(&self, payload: &[u8]) -> Result<SimulationReport, KamiyoError> {
        self.seen.lock().unwrap().push(payload.to_vec());
        let report = match CombinedVerify::decode(payload) {
            Ok(frame) if !frame.reputation_proof.is_empty() && !frame.exclusion_proof.is_empty() => {
                SimulationReport {
                    success: true,
                    error: None,
                    logs: vec![format!("verified threshold {}", frame.threshold)],
                }
            }
            Ok(_) => SimulationReport {
                success: false,
                error: Some("missing sub-proof".to_string()),
                logs: Vec::new(),
            },
            Err(e) => SimulationReport {
                success: false,
                error: Some(e.to_string()),
                logs: Vec::new(),
            },
        };
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn blacklist() -> Accumulator {
    let mut acc = Accumulator::new().unwrap();
    for seed in [11u8, 22, 33] {
        let key = FieldElement::from_pubkey(&[seed; 32]);
        acc.add(key, Some(format!("fraud case {}", seed))).unwrap();
    }
    acc
}

async fn agent_engine(rep: RepData) -> CommitmentEngine {
    let agent = Keypair::generate();
    let mut engine = CommitmentEngine::new(FieldElement::from_pubkey(&agent.public_key_bytes()));
    assert!(engine.sync_from(&Ledger(rep)).await.unwrap());
    engine
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_pipeline_verifies_and_submits() {
    let acc = blacklist();
    let engine = agent_engine(RepData::new(80, 100, 3, 1)).await;
    let mut authority = CredentialAuthority::new(Keypair::generate());

    let signed = authority.issue_for(&engine, acc.root()).unwrap();
    assert!(authority.verify(&signed).unwrap().valid);
    assert_eq!(signed.credential.blacklist_root, acc.root());
    assert_eq!(signed.issuer, authority.issuer_public_key());

    let target = MockTarget::default();
    let verifier = Verifier::new(target.clone(), &VerifierConfig::default());
    let payload = verifier
        .prepare_combined(&StubProver, &signed, &engine, &acc, 75)
        .unwrap();
    assert_eq!(payload[0], OP_COMBINED_VERIFY);

    let frame = CombinedVerify::decode(&payload).unwrap();
    assert_eq!(frame.credential, signed.credential);
    assert_eq!(frame.threshold, 75);
    assert!(frame.reputation_proof.starts_with(b"REP"));
    assert_eq!(frame.exclusion_proof[3..], acc.root().to_bytes());
    assert_eq!(frame.signature, signed.signature);
    assert_eq!(frame.issuer, signed.issuer);

    let result = verifier.verify_remote(&payload).await;
    assert!(result.valid, "{:?}", result.error);
    assert_eq!(result.logs, vec!["verified threshold 75".to_string()]);

    let receipt = verifier.submit(&payload).await.unwrap();
    assert_eq!(receipt.signature, "tx-2");
    assert_eq!(target.seen(), vec![payload.clone(), payload]);
}

#[tokio::test]
async fn test_blacklisted_agent_cannot_prepare() {
    let mut acc = blacklist();
    let engine = agent_engine(RepData::new(95, 100, 0, 0)).await;
    let mut authority = CredentialAuthority::new(Keypair::generate());

    acc.add(engine.agent_pk(), Some("chargeback abuse".to_string()))
        .unwrap();
    let signed = authority.issue_for(&engine, acc.root()).unwrap();

    let verifier = Verifier::new(MockTarget::default(), &VerifierConfig::default());
    let err = verifier
        .prepare_combined(&StubProver, &signed, &engine, &acc, 50)
        .unwrap_err();
    assert!(matches!(err, KamiyoError::Blacklisted(_)));

    // Membership is provable instead.
    let proof = acc.proof(&engine.agent_pk()).unwrap();
    assert!(proof.exists);
    assert!(local_verify_merkle(&proof, true));
}

#[tokio::test]
async fn test_stale_root_and_foreign_commitment_are_rejected() {
    let mut acc = blacklist();
    let engine = agent_engine(RepData::new(80, 100, 0, 0)).await;
    let mut authority = CredentialAuthority::new(Keypair::generate());
    let signed = authority.issue_for(&engine, acc.root()).unwrap();
    let verifier = Verifier::new(MockTarget::default(), &VerifierConfig::default());

    // Same identity, different blinding: the commitment no longer matches.
    let mut other = CommitmentEngine::new(engine.agent_pk());
    other.set_rep(RepData::new(80, 100, 0, 0));
    let err = verifier
        .prepare_combined(&StubProver, &signed, &other, &acc, 50)
        .unwrap_err();
    assert!(matches!(err, KamiyoError::InvalidState(_)));

    // The blacklist moved on after issuance.
    acc.add(FieldElement::from_pubkey(&[44; 32]), None).unwrap();
    let err = verifier
        .prepare_combined(&StubProver, &signed, &engine, &acc, 50)
        .unwrap_err();
    assert!(matches!(err, KamiyoError::InvalidState(_)));

    // Re-issuing against the new root works again.
    let rebound = authority.issue_for(&engine, acc.root()).unwrap();
    assert!(verifier
        .prepare_combined(&StubProver, &rebound, &engine, &acc, 50)
        .is_ok());
}

#[tokio::test]
async fn test_remote_rejects_frame_without_proofs() {
    let acc = blacklist();
    let engine = agent_engine(RepData::new(60, 100, 0, 0)).await;
    let mut authority = CredentialAuthority::new(Keypair::generate());
    let signed = authority.issue_for(&engine, acc.root()).unwrap();

    let verifier = Verifier::new(MockTarget::default(), &VerifierConfig::default());
    let result = verifier
        .verify_combined_remote(&signed, 50, None, None)
        .await
        .unwrap();
    assert!(!result.valid);
    assert_eq!(result.error.as_deref(), Some("missing sub-proof"));

    // The prover refuses a threshold the counters do not meet.
    assert!(verifier
        .prepare_combined(&StubProver, &signed, &engine, &acc, 90)
        .is_err());
}

#[tokio::test]
async fn test_revoked_credential_stays_dead() {
    let acc = blacklist();
    let engine = agent_engine(RepData::new(80, 100, 0, 0)).await;
    let mut authority = CredentialAuthority::new(Keypair::generate());
    let signed = authority.issue_for(&engine, acc.root()).unwrap();

    assert!(authority.revoke(&signed).unwrap());
    let check = authority.verify(&signed).unwrap();
    assert!(!check.valid);
    assert_eq!(check.reason, Some(RejectReason::Revoked));
    assert!(authority.refresh(&signed, None).unwrap().is_none());
    assert!(authority.issued().is_empty());
}

#[test]
fn test_transported_blacklist_keeps_proofs_valid() {
    let acc = blacklist();
    let json = acc.to_json().unwrap();
    let restored = Accumulator::from_json(&json).unwrap();
    assert_eq!(restored.root(), acc.root());

    let outsider = FieldElement::from_pubkey(&[99; 32]);
    let proof = restored.exclusion_proof(&outsider).unwrap();
    assert!(local_verify_merkle(&proof, false));
    assert!(Accumulator::verify(&proof, false));
    assert_eq!(proof.root, acc.root());

    for seed in [11u8, 22, 33] {
        let member = FieldElement::from_pubkey(&[seed; 32]);
        assert!(restored.contains(&member));
        assert!(local_verify_merkle(&restored.proof(&member).unwrap(), true));
    }
}
