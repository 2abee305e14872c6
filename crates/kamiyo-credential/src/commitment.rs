// crates/kamiyo-credential/src/commitment.rs
//
// CommitmentEngine: binds one entity's reputation counters into a single
// hiding, binding field element.
//
// commitment = Poseidon(agent_pk, successful, total, disputes_won,
//                       disputes_lost, blinding)
//
// The blinding factor is drawn once per engine and never leaves it except
// inside a ProverInput.

use std::fmt;

use kamiyo_core::{poseidon, FieldElement, KamiyoError, ProverInput, RepData, ReputationSource};

/// Holds one entity's counters and its secret blinding factor.
pub struct CommitmentEngine {
    agent_pk: FieldElement,
    blinding: FieldElement,
    rep: Option<RepData>,
}

impl CommitmentEngine {
    /// Create an engine with a fresh random blinding factor.
    pub fn new(agent_pk: FieldElement) -> Self {
        Self::with_blinding(agent_pk, FieldElement::random())
    }

    /// Create an engine around an existing blinding factor, e.g. one restored
    /// from a sealed store.
    pub fn with_blinding(agent_pk: FieldElement, blinding: FieldElement) -> Self {
        Self {
            agent_pk,
            blinding,
            rep: None,
        }
    }

    pub fn agent_pk(&self) -> FieldElement {
        self.agent_pk
    }

    /// Replace the stored counters. No validation beyond the integer types.
    pub fn set_rep(&mut self, data: RepData) {
        self.rep = Some(data);
    }

    pub fn rep(&self) -> Option<&RepData> {
        self.rep.as_ref()
    }

    /// Pull fresh counters from the ledger. Returns `Ok(false)` and keeps the
    /// current counters if the source has none for this entity.
    pub async fn sync_from(&mut self, source: &dyn ReputationSource) -> Result<bool, KamiyoError> {
        match source.fetch_rep(&self.agent_pk).await? {
            Some(rep) => {
                self.set_rep(rep);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// `floor(successful * 100 / total)`, 0 when `total` is 0 or no counters
    /// are set. Capped at 100 when `successful` exceeds `total`.
    pub fn success_rate(&self) -> u8 {
        match self.rep {
            Some(rep) if rep.total > 0 => {
                let rate = u128::from(rep.successful) * 100 / u128::from(rep.total);
                rate.min(100) as u8
            }
            _ => 0,
        }
    }

    pub fn meets_threshold(&self, threshold: u64) -> bool {
        u64::from(self.success_rate()) >= threshold
    }

    /// The reputation commitment. Deterministic for fixed counters, so
    /// re-issuing a credential within a session yields the same value.
    pub fn commitment(&self) -> Result<FieldElement, KamiyoError> {
        let rep = self.rep.ok_or(KamiyoError::NoRepData)?;
        poseidon(&[
            self.agent_pk,
            FieldElement::from_u64(rep.successful),
            FieldElement::from_u64(rep.total),
            FieldElement::from_u64(rep.disputes_won),
            FieldElement::from_u64(rep.disputes_lost),
            self.blinding,
        ])
    }

    /// Witness for an external threshold prover, or `None` without counters.
    pub fn prover_input(&self, threshold: u64) -> Option<ProverInput> {
        self.rep.map(|rep| ProverInput {
            rep,
            blinding: self.blinding,
            agent_pk: self.agent_pk,
            threshold,
        })
    }
}

impl fmt::Debug for CommitmentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitmentEngine")
            .field("agent_pk", &self.agent_pk)
            .field("rep", &self.rep)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedLedger(Option<RepData>);

    #[async_trait]
    impl ReputationSource for FixedLedger {
        async fn fetch_rep(&self, _agent_pk: &FieldElement) -> Result<Option<RepData>, KamiyoError> {
            Ok(self.0)
        }
    }

    fn engine() -> CommitmentEngine {
        CommitmentEngine::with_blinding(FieldElement::from_u64(1), FieldElement::from_u64(777))
    }

    #[test]
    fn test_success_rate_and_threshold() {
        let mut e = engine();
        e.set_rep(RepData::new(80, 100, 0, 0));
        assert_eq!(e.success_rate(), 80);
        assert!(e.meets_threshold(80));
        assert!(!e.meets_threshold(90));
    }

    #[test]
    fn test_success_rate_floors() {
        let mut e = engine();
        e.set_rep(RepData::new(2, 3, 0, 0));
        assert_eq!(e.success_rate(), 66);
    }

    #[test]
    fn test_success_rate_zero_total() {
        let mut e = engine();
        assert_eq!(e.success_rate(), 0);
        e.set_rep(RepData::new(0, 0, 0, 0));
        assert_eq!(e.success_rate(), 0);
        assert!(e.meets_threshold(0));
        assert!(!e.meets_threshold(1));
    }

    #[test]
    fn test_success_rate_large_counters_do_not_overflow() {
        let mut e = engine();
        e.set_rep(RepData::new(u64::MAX, u64::MAX, 0, 0));
        assert_eq!(e.success_rate(), 100);
        e.set_rep(RepData::new(10, 5, 0, 0));
        assert_eq!(e.success_rate(), 100);
    }

    #[test]
    fn test_commitment_requires_rep() {
        let e = engine();
        let err = e.commitment().unwrap_err();
        assert!(matches!(err, KamiyoError::NoRepData));
        assert_eq!(err.to_string(), "no rep data");
        assert!(e.prover_input(50).is_none());
    }

    #[test]
    fn test_commitment_is_deterministic_and_binding() {
        let mut e = engine();
        e.set_rep(RepData::new(80, 100, 2, 1));
        let c1 = e.commitment().unwrap();
        assert_eq!(c1, e.commitment().unwrap());

        e.set_rep(RepData::new(81, 100, 2, 1));
        assert_ne!(c1, e.commitment().unwrap());
    }

    #[test]
    fn test_commitment_is_hiding_across_blindings() {
        let rep = RepData::new(80, 100, 2, 1);
        let mut a = CommitmentEngine::new(FieldElement::from_u64(1));
        let mut b = CommitmentEngine::new(FieldElement::from_u64(1));
        a.set_rep(rep);
        b.set_rep(rep);
        assert_ne!(a.commitment().unwrap(), b.commitment().unwrap());
    }

    #[test]
    fn test_prover_input_exposes_witness() {
        let mut e = engine();
        e.set_rep(RepData::new(9, 10, 1, 0));
        let input = e.prover_input(85).unwrap();
        assert_eq!(input.rep, RepData::new(9, 10, 1, 0));
        assert_eq!(input.blinding, FieldElement::from_u64(777));
        assert_eq!(input.agent_pk, FieldElement::from_u64(1));
        assert_eq!(input.threshold, 85);
    }

    #[test]
    fn test_debug_hides_blinding() {
        let e = engine();
        let rendered = format!("{:?}", e);
        assert!(!rendered.contains(&FieldElement::from_u64(777).to_hex()));
    }

    #[tokio::test]
    async fn test_sync_from_ledger() {
        let mut e = engine();
        let updated = e
            .sync_from(&FixedLedger(Some(RepData::new(5, 10, 0, 0))))
            .await
            .unwrap();
        assert!(updated);
        assert_eq!(e.success_rate(), 50);

        let updated = e.sync_from(&FixedLedger(None)).await.unwrap();
        assert!(!updated);
        assert_eq!(e.success_rate(), 50);
    }
}
