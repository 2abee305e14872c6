// crates/kamiyo-credential/src/credential.rs
//
// Credential and SignedCredential with their fixed-width wire encodings.
//
//   Credential        (104 bytes) = agent_pk(32) | rep_commitment(32)
//                                   | blacklist_root(32) | issued_at:u32 LE
//                                   | expires_at:u32 LE
//   SignedCredential  (232 bytes) = Credential(104) | signature(64)
//                                   | issuer(32) | nonce(32)
//
// Field elements are 32 bytes big-endian.

use serde::{Deserialize, Serialize};

use kamiyo_core::crypto::{self, PUBLIC_KEY_BYTES, SIGNATURE_BYTES};
use kamiyo_core::{hash_pair, FieldElement, KamiyoError, FIELD_BYTES};

/// Encoded length of a [`Credential`].
pub const CREDENTIAL_BYTES: usize = 3 * FIELD_BYTES + 4 + 4;

/// Encoded length of a [`SignedCredential`].
pub const SIGNED_CREDENTIAL_BYTES: usize =
    CREDENTIAL_BYTES + SIGNATURE_BYTES + PUBLIC_KEY_BYTES + FIELD_BYTES;

/// Attestation binding an identity, a reputation commitment, and a
/// blacklist root to a validity window. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub agent_pk: FieldElement,
    pub rep_commitment: FieldElement,
    pub blacklist_root: FieldElement,
    /// Unix seconds.
    pub issued_at: u32,
    /// Unix seconds; the credential is expired from this instant on.
    pub expires_at: u32,
}

impl Credential {
    pub fn new(
        agent_pk: FieldElement,
        rep_commitment: FieldElement,
        blacklist_root: FieldElement,
        issued_at: u32,
        expires_at: u32,
    ) -> Self {
        Self {
            agent_pk,
            rep_commitment,
            blacklist_root,
            issued_at,
            expires_at,
        }
    }

    /// Build a credential valid for `ttl` seconds from `now`.
    pub fn with_ttl(
        agent_pk: FieldElement,
        rep_commitment: FieldElement,
        blacklist_root: FieldElement,
        now: u32,
        ttl: u32,
    ) -> Self {
        Self::new(agent_pk, rep_commitment, blacklist_root, now, now.saturating_add(ttl))
    }

    /// `expires_at - issued_at`; negative for a malformed window.
    pub fn validity_window(&self) -> i64 {
        i64::from(self.expires_at) - i64::from(self.issued_at)
    }

    pub fn is_expired_at(&self, now: u32) -> bool {
        now >= self.expires_at
    }

    pub fn to_bytes(&self) -> [u8; CREDENTIAL_BYTES] {
        let mut out = [0u8; CREDENTIAL_BYTES];
        out[0..32].copy_from_slice(&self.agent_pk.to_bytes());
        out[32..64].copy_from_slice(&self.rep_commitment.to_bytes());
        out[64..96].copy_from_slice(&self.blacklist_root.to_bytes());
        out[96..100].copy_from_slice(&self.issued_at.to_le_bytes());
        out[100..104].copy_from_slice(&self.expires_at.to_le_bytes());
        out
    }

    /// Decode exactly [`CREDENTIAL_BYTES`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KamiyoError> {
        if bytes.len() != CREDENTIAL_BYTES {
            return Err(KamiyoError::InvalidLength {
                what: "credential",
                expected: CREDENTIAL_BYTES,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            agent_pk: FieldElement::from_bytes(&bytes[0..32])?,
            rep_commitment: FieldElement::from_bytes(&bytes[32..64])?,
            blacklist_root: FieldElement::from_bytes(&bytes[64..96])?,
            issued_at: read_u32_le(&bytes[96..100]),
            expires_at: read_u32_le(&bytes[100..104]),
        })
    }
}

/// A credential signed by an authority.
///
/// Its identity for revocation is `Poseidon(agent_pk, nonce)`, so two
/// issuances of the same credential body are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCredential {
    #[serde(flatten)]
    pub credential: Credential,
    #[serde(with = "hex_array")]
    pub signature: [u8; SIGNATURE_BYTES],
    #[serde(with = "hex_array")]
    pub issuer: [u8; PUBLIC_KEY_BYTES],
    pub nonce: FieldElement,
}

impl SignedCredential {
    /// Revocation identity: `Poseidon(agent_pk, nonce)`.
    pub fn id(&self) -> Result<FieldElement, KamiyoError> {
        hash_pair(&self.credential.agent_pk, &self.nonce)
    }

    /// Canonical signed message body: credential bytes followed by the nonce.
    pub fn signing_bytes(credential: &Credential, nonce: &FieldElement) -> Vec<u8> {
        let mut out = Vec::with_capacity(CREDENTIAL_BYTES + FIELD_BYTES);
        out.extend_from_slice(&credential.to_bytes());
        out.extend_from_slice(&nonce.to_bytes());
        out
    }

    /// SHA-256 of the signing bytes; this is what the issuer signs.
    pub fn signing_digest(credential: &Credential, nonce: &FieldElement) -> [u8; 32] {
        crypto::hash_bytes(&Self::signing_bytes(credential, nonce))
    }

    /// Check the signature against an explicit issuer key.
    pub fn verify_signature_with(&self, issuer: &[u8; PUBLIC_KEY_BYTES]) -> Result<bool, KamiyoError> {
        let digest = Self::signing_digest(&self.credential, &self.nonce);
        crypto::verify_signature(issuer, &digest, &self.signature)
    }

    /// Check the signature against the embedded issuer key. Only meaningful
    /// if the caller separately trusts that key.
    pub fn verify_signature(&self) -> Result<bool, KamiyoError> {
        self.verify_signature_with(&self.issuer)
    }

    pub fn to_bytes(&self) -> [u8; SIGNED_CREDENTIAL_BYTES] {
        let mut out = [0u8; SIGNED_CREDENTIAL_BYTES];
        let sig_start = CREDENTIAL_BYTES;
        let issuer_start = sig_start + SIGNATURE_BYTES;
        let nonce_start = issuer_start + PUBLIC_KEY_BYTES;
        out[..sig_start].copy_from_slice(&self.credential.to_bytes());
        out[sig_start..issuer_start].copy_from_slice(&self.signature);
        out[issuer_start..nonce_start].copy_from_slice(&self.issuer);
        out[nonce_start..].copy_from_slice(&self.nonce.to_bytes());
        out
    }

    /// Decode exactly [`SIGNED_CREDENTIAL_BYTES`] bytes. Any other length is
    /// treated as tampering and rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KamiyoError> {
        if bytes.len() != SIGNED_CREDENTIAL_BYTES {
            return Err(KamiyoError::InvalidLength {
                what: "signed credential",
                expected: SIGNED_CREDENTIAL_BYTES,
                actual: bytes.len(),
            });
        }
        let sig_start = CREDENTIAL_BYTES;
        let issuer_start = sig_start + SIGNATURE_BYTES;
        let nonce_start = issuer_start + PUBLIC_KEY_BYTES;

        let mut signature = [0u8; SIGNATURE_BYTES];
        signature.copy_from_slice(&bytes[sig_start..issuer_start]);
        let mut issuer = [0u8; PUBLIC_KEY_BYTES];
        issuer.copy_from_slice(&bytes[issuer_start..nonce_start]);

        Ok(Self {
            credential: Credential::from_bytes(&bytes[..sig_start])?,
            signature,
            issuer,
            nonce: FieldElement::from_bytes(&bytes[nonce_start..])?,
        })
    }
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// Serde adapter for fixed-size byte arrays as lowercase hex strings.
mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let text = String::deserialize(deserializer)?;
        let raw = hex::decode(&text).map_err(serde::de::Error::custom)?;
        raw.try_into().map_err(|raw: Vec<u8>| {
            serde::de::Error::custom(format!("expected {} bytes, got {}", N, raw.len()))
        })
    }
}
