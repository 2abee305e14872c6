// crates/kamiyo-verify/src/encoder.rs
//
// Fixed-width instruction frames for the external verification target.
//
//   0x01 reputation: [op][proof][agent_pk:32][commitment:32][threshold:u64 LE]
//   0x02 exclusion:  [op][proof][root:32][key:32][sibling_count:u32 LE]
//                    [siblings:32 each]
//   0x03 combined:   [op][credential:104][threshold:u64 LE]
//                    [rep_len:u32 LE][rep][excl_len:u32 LE][excl]
//                    [signature:64][issuer:32]
//
// Proof bytes are opaque; they come from an external prover. An absent
// sub-proof in the combined frame is a zero length with no bytes after it.

use kamiyo_accumulator::MerkleProof;
use kamiyo_core::crypto::{PUBLIC_KEY_BYTES, SIGNATURE_BYTES};
use kamiyo_core::{FieldElement, KamiyoError, VerifierConfig, FIELD_BYTES};
use kamiyo_credential::{Credential, SignedCredential, CREDENTIAL_BYTES};

pub const OP_REPUTATION_VERIFY: u8 = 0x01;
pub const OP_EXCLUSION_VERIFY: u8 = 0x02;
pub const OP_COMBINED_VERIFY: u8 = 0x03;

/// Builds instruction frames, refusing sub-proofs above a size limit.
#[derive(Debug, Clone)]
pub struct ProofEncoder {
    max_proof_bytes: usize,
}

impl ProofEncoder {
    pub fn new(config: &VerifierConfig) -> Self {
        Self {
            max_proof_bytes: config.max_proof_bytes,
        }
    }

    pub fn max_proof_bytes(&self) -> usize {
        self.max_proof_bytes
    }

    fn check_proof(&self, what: &str, proof: &[u8]) -> Result<(), KamiyoError> {
        if proof.len() > self.max_proof_bytes {
            return Err(KamiyoError::Serialization(format!(
                "{} of {} bytes exceeds the {} byte limit",
                what,
                proof.len(),
                self.max_proof_bytes
            )));
        }
        // Length fields are u32 on the wire.
        u32::try_from(proof.len()).map_err(|_| {
            KamiyoError::Serialization(format!("{} too large to frame", what))
        })?;
        Ok(())
    }

    /// Opcode 0x01: reputation-threshold proof.
    pub fn encode_reputation_verify(
        &self,
        proof: &[u8],
        agent_pk: &FieldElement,
        commitment: &FieldElement,
        threshold: u64,
    ) -> Result<Vec<u8>, KamiyoError> {
        self.check_proof("reputation proof", proof)?;
        let mut out = Vec::with_capacity(1 + proof.len() + 2 * FIELD_BYTES + 8);
        out.push(OP_REPUTATION_VERIFY);
        out.extend_from_slice(proof);
        out.extend_from_slice(&agent_pk.to_bytes());
        out.extend_from_slice(&commitment.to_bytes());
        out.extend_from_slice(&threshold.to_le_bytes());
        Ok(out)
    }

    /// Opcode 0x02: blacklist exclusion proof.
    pub fn encode_exclusion_verify(
        &self,
        proof: &[u8],
        root: &FieldElement,
        key: &FieldElement,
        siblings: &[FieldElement],
    ) -> Result<Vec<u8>, KamiyoError> {
        self.check_proof("exclusion proof", proof)?;
        let count = u32::try_from(siblings.len())
            .map_err(|_| KamiyoError::Serialization("too many siblings".to_string()))?;
        let mut out =
            Vec::with_capacity(1 + proof.len() + 2 * FIELD_BYTES + 4 + siblings.len() * FIELD_BYTES);
        out.push(OP_EXCLUSION_VERIFY);
        out.extend_from_slice(proof);
        out.extend_from_slice(&root.to_bytes());
        out.extend_from_slice(&key.to_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        for sibling in siblings {
            out.extend_from_slice(&sibling.to_bytes());
        }
        Ok(out)
    }

    /// Opcode 0x02 built straight from an accumulator proof.
    pub fn encode_exclusion_from(
        &self,
        proof: &[u8],
        merkle: &MerkleProof,
    ) -> Result<Vec<u8>, KamiyoError> {
        self.encode_exclusion_verify(proof, &merkle.root, &merkle.key, &merkle.siblings)
    }

    /// Opcode 0x03: credential plus optional reputation and exclusion proofs.
    pub fn encode_combined_verify(
        &self,
        signed: &SignedCredential,
        threshold: u64,
        reputation_proof: Option<&[u8]>,
        exclusion_proof: Option<&[u8]>,
    ) -> Result<Vec<u8>, KamiyoError> {
        let rep = reputation_proof.unwrap_or_default();
        let excl = exclusion_proof.unwrap_or_default();
        self.check_proof("reputation proof", rep)?;
        self.check_proof("exclusion proof", excl)?;

        let mut out = Vec::with_capacity(
            1 + CREDENTIAL_BYTES + 8 + 4 + rep.len() + 4 + excl.len() + SIGNATURE_BYTES
                + PUBLIC_KEY_BYTES,
        );
        out.push(OP_COMBINED_VERIFY);
        out.extend_from_slice(&signed.credential.to_bytes());
        out.extend_from_slice(&threshold.to_le_bytes());
        out.extend_from_slice(&(rep.len() as u32).to_le_bytes());
        out.extend_from_slice(rep);
        out.extend_from_slice(&(excl.len() as u32).to_le_bytes());
        out.extend_from_slice(excl);
        out.extend_from_slice(&signed.signature);
        out.extend_from_slice(&signed.issuer);
        Ok(out)
    }
}

impl Default for ProofEncoder {
    fn default() -> Self {
        Self::new(&VerifierConfig::default())
    }
}

/// A decoded opcode-0x03 frame, as the verification target reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedVerify {
    pub credential: Credential,
    pub threshold: u64,
    pub reputation_proof: Vec<u8>,
    pub exclusion_proof: Vec<u8>,
    pub signature: [u8; SIGNATURE_BYTES],
    pub issuer: [u8; PUBLIC_KEY_BYTES],
}

impl CombinedVerify {
    pub fn decode(bytes: &[u8]) -> Result<Self, KamiyoError> {
        let mut reader = FrameReader::new(bytes);
        let op = reader.take(1)?[0];
        if op != OP_COMBINED_VERIFY {
            return Err(KamiyoError::Serialization(format!(
                "expected opcode 0x{:02x}, got 0x{:02x}",
                OP_COMBINED_VERIFY, op
            )));
        }
        let credential = Credential::from_bytes(reader.take(CREDENTIAL_BYTES)?)?;
        let threshold = reader.u64_le()?;
        let rep_len = reader.u32_le()? as usize;
        let reputation_proof = reader.take(rep_len)?.to_vec();
        let excl_len = reader.u32_le()? as usize;
        let exclusion_proof = reader.take(excl_len)?.to_vec();

        let mut signature = [0u8; SIGNATURE_BYTES];
        signature.copy_from_slice(reader.take(SIGNATURE_BYTES)?);
        let mut issuer = [0u8; PUBLIC_KEY_BYTES];
        issuer.copy_from_slice(reader.take(PUBLIC_KEY_BYTES)?);
        reader.finish()?;

        Ok(Self {
            credential,
            threshold,
            reputation_proof,
            exclusion_proof,
            signature,
            issuer,
        })
    }
}

struct FrameReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], KamiyoError> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(KamiyoError::InvalidLength {
                what: "combined verify frame",
                expected: self.pos.saturating_add(len),
                actual: self.bytes.len(),
            }),
        }
    }

    fn u32_le(&mut self) -> Result<u32, KamiyoError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64_le(&mut self) -> Result<u64, KamiyoError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn finish(&self) -> Result<(), KamiyoError> {
        if self.pos != self.bytes.len() {
            return Err(KamiyoError::InvalidLength {
                what: "combined verify frame",
                expected: self.pos,
                actual: self.bytes.len(),
            });
        }
        Ok(())
    }
}
