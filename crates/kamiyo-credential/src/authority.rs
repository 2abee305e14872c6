// crates/kamiyo-credential/src/authority.rs
//
// CredentialAuthority: issues, verifies, revokes, and refreshes signed
// credentials.
//
// Per credential id:
//
//   Issued --> Valid --> Expired --> (refresh) --> new Issued credential
//                |
//                v
//             Revoked (terminal, cannot be refreshed)
//
// The issued and revoked registries only grow; `reset` is the single
// administrative way to clear them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use kamiyo_core::{unix_now, AuthorityConfig, FieldElement, KamiyoError, Keypair};

use crate::commitment::CommitmentEngine;
use crate::credential::{Credential, SignedCredential};

/// Why a credential failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    #[serde(rename = "revoked")]
    Revoked,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "invalid signature")]
    InvalidSignature,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::Revoked => "revoked",
            RejectReason::Expired => "expired",
            RejectReason::InvalidSignature => "invalid signature",
        };
        f.write_str(text)
    }
}

/// Policy outcome of [`CredentialAuthority::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCheck {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl CredentialCheck {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Owns the issuer signing key and the issued/revoked registries.
///
/// `issue`, `revoke`, `refresh`, and `reset` take `&mut self`; wrap the
/// authority in a lock to share it between a writer and concurrent readers.
pub struct CredentialAuthority {
    keypair: Keypair,
    default_ttl_secs: u32,
    issued: HashMap<FieldElement, SignedCredential>,
    revoked: HashSet<FieldElement>,
}

impl CredentialAuthority {
    /// Create an authority with default settings. Takes ownership of the
    /// signing key.
    pub fn new(keypair: Keypair) -> Self {
        Self::with_config(keypair, &AuthorityConfig::default())
    }

    pub fn with_config(keypair: Keypair, config: &AuthorityConfig) -> Self {
        Self {
            keypair,
            default_ttl_secs: config.default_ttl_secs,
            issued: HashMap::new(),
            revoked: HashSet::new(),
        }
    }

    pub fn issuer_public_key(&self) -> [u8; 32] {
        self.keypair.public_key_bytes()
    }

    pub fn default_ttl_secs(&self) -> u32 {
        self.default_ttl_secs
    }

    /// Sign `credential` under a fresh random nonce and record it.
    ///
    /// The only error source is the fixed two-input hash behind
    /// [`SignedCredential::id`], so this does not fail in practice.
    pub fn issue(&mut self, credential: Credential) -> Result<SignedCredential, KamiyoError> {
        let nonce = FieldElement::random();
        let digest = SignedCredential::signing_digest(&credential, &nonce);
        let signed = SignedCredential {
            credential,
            signature: self.keypair.sign(&digest),
            issuer: self.keypair.public_key_bytes(),
            nonce,
        };
        let id = signed.id()?;
        self.issued.insert(id, signed.clone());
        tracing::info!(
            "Issued credential {} for agent {} (expires {})",
            id,
            credential.agent_pk,
            credential.expires_at
        );
        Ok(signed)
    }

    /// Issue a credential for the entity behind `engine`, bound to the given
    /// blacklist root and valid for the default ttl from now.
    pub fn issue_for(
        &mut self,
        engine: &CommitmentEngine,
        blacklist_root: FieldElement,
    ) -> Result<SignedCredential, KamiyoError> {
        let credential = Credential::with_ttl(
            engine.agent_pk(),
            engine.commitment()?,
            blacklist_root,
            unix_now(),
            self.default_ttl_secs,
        );
        self.issue(credential)
    }

    /// Revoke a credential this authority issued. Returns `Ok(false)` for a
    /// credential it never issued; repeated revocation returns `Ok(true)`.
    pub fn revoke(&mut self, signed: &SignedCredential) -> Result<bool, KamiyoError> {
        let id = signed.id()?;
        if !self.issued.contains_key(&id) {
            return Ok(false);
        }
        if self.revoked.insert(id) {
            tracing::info!("Revoked credential {}", id);
        }
        Ok(true)
    }

    pub fn is_revoked(&self, signed: &SignedCredential) -> Result<bool, KamiyoError> {
        Ok(self.revoked.contains(&signed.id()?))
    }

    /// Verify against the wall clock. See [`CredentialAuthority::verify_at`].
    pub fn verify(&self, signed: &SignedCredential) -> Result<CredentialCheck, KamiyoError> {
        self.verify_at(signed, unix_now())
    }

    /// Check, in order: revoked, expired (`now >= expires_at`), signature.
    ///
    /// Revocation dominates, so a revoked credential reports `revoked` even
    /// if it is also expired or carries a valid signature. The signature must
    /// be this authority's, under this authority's key.
    pub fn verify_at(
        &self,
        signed: &SignedCredential,
        now: u32,
    ) -> Result<CredentialCheck, KamiyoError> {
        let check = if self.is_revoked(signed)? {
            CredentialCheck::rejected(RejectReason::Revoked)
        } else if signed.credential.is_expired_at(now) {
            CredentialCheck::rejected(RejectReason::Expired)
        } else if !self.signature_is_ours(signed) {
            CredentialCheck::rejected(RejectReason::InvalidSignature)
        } else {
            CredentialCheck::valid()
        };
        if let Some(reason) = check.reason {
            tracing::debug!(
                "Credential for agent {} rejected: {}",
                signed.credential.agent_pk,
                reason
            );
        }
        Ok(check)
    }

    fn signature_is_ours(&self, signed: &SignedCredential) -> bool {
        if signed.issuer != self.keypair.public_key_bytes() {
            return false;
        }
        let digest = SignedCredential::signing_digest(&signed.credential, &signed.nonce);
        self.keypair.verify(&digest, &signed.signature)
    }

    /// Refresh against the wall clock. See [`CredentialAuthority::refresh_at`].
    pub fn refresh(
        &mut self,
        signed: &SignedCredential,
        new_ttl: Option<u32>,
    ) -> Result<Option<SignedCredential>, KamiyoError> {
        self.refresh_at(signed, new_ttl, unix_now())
    }

    /// Re-issue a still-valid or merely expired credential with a fresh nonce
    /// and window `[now, now + ttl)`.
    ///
    /// `ttl` defaults to the original window, or to the configured default
    /// when that window is non-positive. Revoked or badly signed credentials
    /// yield `Ok(None)`. The original credential is left as it was.
    pub fn refresh_at(
        &mut self,
        signed: &SignedCredential,
        new_ttl: Option<u32>,
        now: u32,
    ) -> Result<Option<SignedCredential>, KamiyoError> {
        let check = self.verify_at(signed, now)?;
        match check.reason {
            None | Some(RejectReason::Expired) => {}
            Some(_) => return Ok(None),
        }
        // An expired credential skipped the signature check in verify_at.
        if check.reason.is_some() && !self.signature_is_ours(signed) {
            return Ok(None);
        }

        let ttl = new_ttl.unwrap_or_else(|| {
            let window = signed.credential.validity_window();
            if window > 0 {
                u32::try_from(window).unwrap_or(u32::MAX)
            } else {
                self.default_ttl_secs
            }
        });
        let old = &signed.credential;
        let credential = Credential::with_ttl(
            old.agent_pk,
            old.rep_commitment,
            old.blacklist_root,
            now,
            ttl,
        );
        let refreshed = self.issue(credential)?;
        tracing::info!("Refreshed credential for agent {} (ttl {}s)", old.agent_pk, ttl);
        Ok(Some(refreshed))
    }

    /// Every issued credential that has not been revoked, expired ones
    /// included: this is a provenance view, not a validity view.
    pub fn issued(&self) -> Vec<&SignedCredential> {
        let mut list: Vec<&SignedCredential> = self
            .issued
            .iter()
            .filter(|(id, _)| !self.revoked.contains(*id))
            .map(|(_, signed)| signed)
            .collect();
        list.sort_by_key(|signed| (signed.credential.issued_at, signed.nonce));
        list
    }

    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    /// Administrative reset: forget every issued and revoked credential.
    pub fn reset(&mut self) {
        tracing::info!(
            "Resetting authority registries ({} issued, {} revoked)",
            self.issued.len(),
            self.revoked.len()
        );
        self.issued.clear();
        self.revoked.clear();
    }
}

impl fmt::Debug for CredentialAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialAuthority")
            .field("keypair", &self.keypair)
            .field("default_ttl_secs", &self.default_ttl_secs)
            .field("issued", &self.issued.len())
            .field("revoked", &self.revoked.len())
            .finish()
    }
}
