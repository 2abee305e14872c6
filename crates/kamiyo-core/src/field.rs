// crates/kamiyo-core/src/field.rs
//
// Field elements over the BN254 scalar field and the Poseidon hash used for
// every key, tree node, commitment, and credential id in the workspace.
//
// Poseidon parameters are the circom-compatible ones, so hashes computed here
// match what a BN254 proving system computes for the same inputs.

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use light_poseidon::{Poseidon, PoseidonHasher};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KamiyoError;

/// Byte width of an encoded field element.
pub const FIELD_BYTES: usize = 32;

/// Largest input count the circom Poseidon parameters support.
pub const MAX_POSEIDON_INPUTS: usize = 12;

/// An integer modulo the BN254 scalar field prime.
///
/// Encoded as 32 big-endian bytes. Decoding rejects values that are not
/// reduced (>= the modulus); use [`FieldElement::from_bytes_mod_order`] to
/// map arbitrary 256-bit strings into the field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// The zero element. Used as the value of an empty leaf.
    pub fn zero() -> Self {
        FieldElement(Fr::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn from_u64(value: u64) -> Self {
        FieldElement(Fr::from(value))
    }

    /// Draw a uniformly random element from the OS RNG.
    ///
    /// 64 random bytes are reduced modulo the prime, which keeps the
    /// distribution bias negligible.
    pub fn random() -> Self {
        let mut wide = [0u8; 64];
        OsRng.fill_bytes(&mut wide);
        Self::from_bytes_mod_order(&wide)
    }

    /// Interpret big-endian bytes of any length as an integer and reduce it.
    pub fn from_bytes_mod_order(bytes: &[u8]) -> Self {
        FieldElement(Fr::from_be_bytes_mod_order(bytes))
    }

    /// Derive an accumulator key from a 32-byte public identity.
    pub fn from_pubkey(public_key: &[u8; 32]) -> Self {
        Self::from_bytes_mod_order(public_key)
    }

    /// Decode exactly 32 canonical big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KamiyoError> {
        if bytes.len() != FIELD_BYTES {
            return Err(KamiyoError::InvalidLength {
                what: "field element",
                expected: FIELD_BYTES,
                actual: bytes.len(),
            });
        }
        let element = Self::from_bytes_mod_order(bytes);
        if element.to_bytes()[..] != bytes[..] {
            return Err(KamiyoError::InvalidFieldElement(format!(
                "0x{} is not reduced modulo the field prime",
                hex::encode(bytes)
            )));
        }
        Ok(element)
    }

    pub fn to_bytes(&self) -> [u8; FIELD_BYTES] {
        let be = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; FIELD_BYTES];
        // to_bytes_be is always 32 bytes for a 4-limb integer; right-align anyway.
        out[FIELD_BYTES - be.len()..].copy_from_slice(&be);
        out
    }

    /// `0x`-prefixed lowercase hex of the 32-byte encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parse hex produced by [`FieldElement::to_hex`]. The `0x` prefix is
    /// optional and short inputs are left-padded.
    pub fn from_hex(text: &str) -> Result<Self, KamiyoError> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        if digits.is_empty() || digits.len() > FIELD_BYTES * 2 {
            return Err(KamiyoError::InvalidFieldElement(format!(
                "bad hex length in {:?}",
                text
            )));
        }
        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(&padded)
            .map_err(|e| KamiyoError::InvalidFieldElement(format!("{:?}: {}", text, e)))?;
        Self::from_bytes(&bytes)
    }

    /// Bit `index` of the canonical integer, counting from the least
    /// significant bit. Indices past 255 are zero.
    pub fn bit(&self, index: usize) -> bool {
        let limbs = self.limbs();
        match limbs.get(index / 64) {
            Some(limb) => (limb >> (index % 64)) & 1 == 1,
            None => false,
        }
    }

    /// Little-endian 64-bit limbs of the canonical integer.
    pub fn limbs(&self) -> [u64; 4] {
        self.0.into_bigint().0
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl FromStr for FieldElement {
    type Err = KamiyoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

thread_local! {
    // Poseidon instances keyed by arity; building the round constants is
    // far more expensive than a single permutation.
    static HASHERS: RefCell<HashMap<usize, Poseidon<Fr>>> = RefCell::new(HashMap::new());
}

/// Poseidon hash of 1 to 12 field elements.
pub fn poseidon(inputs: &[FieldElement]) -> Result<FieldElement, KamiyoError> {
    let arity = inputs.len();
    if arity == 0 || arity > MAX_POSEIDON_INPUTS {
        return Err(KamiyoError::Hash(format!(
            "unsupported Poseidon arity {} (expected 1..={})",
            arity, MAX_POSEIDON_INPUTS
        )));
    }
    let frs: Vec<Fr> = inputs.iter().map(|e| e.0).collect();

    HASHERS.with(|cell| -> Result<FieldElement, KamiyoError> {
        let mut hashers = cell.borrow_mut();
        let hasher = match hashers.entry(arity) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => slot.insert(Poseidon::<Fr>::new_circom(arity)?),
        };
        Ok(FieldElement(hasher.hash(&frs)?))
    })
}

/// Poseidon hash of a single element (leaf hashing).
pub fn hash_one(value: &FieldElement) -> Result<FieldElement, KamiyoError> {
    poseidon(&[*value])
}

/// Poseidon hash of an ordered pair (tree nodes, credential ids).
pub fn hash_pair(left: &FieldElement, right: &FieldElement) -> Result<FieldElement, KamiyoError> {
    poseidon(&[*left, *right])
}
