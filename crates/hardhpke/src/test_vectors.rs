//! Test vectors in the format of RFC 9180, Appendix A.
//!
//! Two sets are bundled:
//!
//! - `tests/rfc9180-vectors.json`: published vectors of RFC 9180, Appendix A,
//!   in the order of [`RFC9180_SECTIONS`]. The RFC has none for
//!   DHKEM(P-384, HKDF-SHA384).
//! - `tests/extra-vectors.json`: vectors computed outside this crate from
//!   fixed seeds. They fill in every KEM with AES-128-GCM, AES-256-GCM,
//!   ChaCha20Poly1305 and the export-only AEAD in all four modes, plus
//!   DHKEM(P-256, HKDF-SHA256) with HKDF-SHA512. These values are not
//!   published anywhere.
//!
//! Each entry keeps the first two encryptions (sequence numbers 0 and 1) and
//! the three 32-byte exports of the original listing.

#![allow(missing_docs)]

use alloc::vec::Vec;
use core::ops::Deref;

/// The RFC 9180 section of each entry of [`rfc9180_test_vectors`], in order.
pub const RFC9180_SECTIONS: [&str; 13] = [
    "A.1.1", "A.1.2", "A.1.3", "A.1.4", // X25519, HKDF-SHA256, AES-128-GCM
    "A.2.1", "A.2.2", "A.2.4", // X25519, HKDF-SHA256, ChaCha20Poly1305
    "A.3.1", "A.3.2", "A.3.3", // P-256, HKDF-SHA256, AES-128-GCM
    "A.4.1", // P-256, HKDF-SHA512, AES-128-GCM
    "A.5.1", // P-256, HKDF-SHA256, ChaCha20Poly1305
    "A.6.1", // P-521, HKDF-SHA512, AES-256-GCM
];

/// Parses the published RFC 9180 vectors.
///
/// # Errors
///
/// Only if the bundled JSON is malformed.
pub fn rfc9180_test_vectors() -> Result<Vec<HpkeTestVector>, serde_json::Error> {
    serde_json::from_str(include_str!("../tests/rfc9180-vectors.json"))
}

/// Parses the additional vectors computed from fixed seeds.
///
/// # Errors
///
/// Only if the bundled JSON is malformed.
pub fn extra_test_vectors() -> Result<Vec<HpkeTestVector>, serde_json::Error> {
    serde_json::from_str(include_str!("../tests/extra-vectors.json"))
}

/// Both sets, published vectors first.
///
/// # Errors
///
/// Only if the bundled JSON is malformed.
pub fn hpke_test_vectors() -> Result<Vec<HpkeTestVector>, serde_json::Error> {
    let mut vectors = rfc9180_test_vectors()?;
    vectors.extend(extra_test_vectors()?);
    Ok(vectors)
}

/// One setup with its encryptions and exports.
///
/// Identifiers are kept as the raw code points found in the file.
#[derive(Debug, Clone)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct HpkeTestVector {
    pub mode: u8,
    pub kem_id: u16,
    pub kdf_id: u16,
    pub aead_id: u16,
    pub info: HexString,
    #[serde(rename = "ikmR")]
    pub ikm_r: HexString,
    #[serde(default, rename = "ikmS")]
    pub ikm_s: Option<HexString>,
    #[serde(rename = "ikmE")]
    pub ikm_e: HexString,
    #[serde(rename = "skRm")]
    pub sk_rm: HexString,
    #[serde(default, rename = "skSm")]
    pub sk_sm: Option<HexString>,
    #[serde(rename = "skEm")]
    pub sk_em: HexString,
    #[serde(default)]
    pub psk: Option<HexString>,
    #[serde(default)]
    pub psk_id: Option<HexString>,
    #[serde(rename = "pkRm")]
    pub pk_rm: HexString,
    #[serde(default, rename = "pkSm")]
    pub pk_sm: Option<HexString>,
    #[serde(rename = "pkEm")]
    pub pk_em: HexString,
    pub enc: HexString,
    pub shared_secret: HexString,
    pub key_schedule_context: HexString,
    pub secret: HexString,
    /// Empty for the export-only AEAD.
    pub key: HexString,
    /// Empty for the export-only AEAD.
    pub base_nonce: HexString,
    pub exporter_secret: HexString,
    /// Consecutive sequence numbers, starting at 0.
    pub encryptions: Vec<HpkeTestVectorEncryption>,
    pub exports: Vec<HpkeTestVectorExport>,
}

#[derive(Debug, Clone)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct HpkeTestVectorEncryption {
    pub aad: HexString,
    pub ct: HexString,
    pub nonce: HexString,
    pub pt: HexString,
}

#[derive(Debug, Clone)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct HpkeTestVectorExport {
    pub exporter_context: HexString,
    #[serde(rename = "L")]
    pub l: usize,
    pub exported_value: HexString,
}

/// Bytes (de)serialized as a lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexString(pub Vec<u8>);

impl serde::Serialize for HexString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&const_hex::encode(&self.0))
    }
}

impl<'de> serde::Deserialize<'de> for HexString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = <&str>::deserialize(deserializer)?;

        const_hex::decode(hex_str)
            .map(HexString)
            .map_err(serde::de::Error::custom)
    }
}

impl Deref for HexString {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
