//! Labeled KDF functions for HPKE as defined in RFC 9180.
//!
//! `LabeledExtract` and `LabeledExpand` bind every derivation to the protocol
//! version and a `suite_id`, so that secrets derived for one KEM, cipher suite
//! or purpose can never collide with those of another.

use crate::{Crypto, CryptoError, HpkeKdfId, Okm, Prk};

/// The protocol version label prepended to every labeled input.
pub const HPKE_VERSION: &[u8] = b"HPKE-v1";

/// Implements the `LabeledExtract` function from RFC 9180.
///
/// ```text
/// def LabeledExtract(salt, label, ikm):
///   labeled_ikm = concat("HPKE-v1", suite_id, label, ikm)
///   return Extract(salt, labeled_ikm)
/// ```
///
/// See [RFC 9180, Section 4] for details.
///
/// # Errors
///
/// See [`CryptoError`] for possible error conditions.
///
/// [RFC 9180, Section 4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4
pub fn labeled_extract<C>(
    crypto_backend: &C,
    alg: HpkeKdfId,
    suite_id: &[u8],
    salt: &[u8],
    label: &str,
    ikm: &[u8],
) -> Result<Prk, CryptoError>
where
    C: Crypto + ?Sized,
{
    crypto_backend.kdf_extract_concated(
        alg,
        salt,
        &[HPKE_VERSION, suite_id, label.as_bytes(), ikm],
    )
}

/// Implements the `LabeledExpand` function from RFC 9180.
///
/// ```text
/// def LabeledExpand(prk, label, info, L):
///  labeled_info = concat(I2OSP(L, 2), "HPKE-v1", suite_id, label, info)
///  return Expand(prk, labeled_info, L)
/// ```
///
/// See [RFC 9180, Section 4] for details.
///
/// # Errors
///
/// - [`CryptoError::KdfExpandInvalidOutputLen`] if `len` exceeds `255 * Nh`
///   (which also keeps it within the two-byte length prefix).
/// - [`CryptoError::KdfExpandInvalidPrkLen`] if `prk` is shorter than `Nh`.
///
/// [RFC 9180, Section 4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4
pub fn labeled_expand<C>(
    crypto_backend: &C,
    alg: HpkeKdfId,
    suite_id: &[u8],
    prk: &[u8],
    label: &str,
    info: &[u8],
    len: usize,
) -> Result<Okm, CryptoError>
where
    C: Crypto + ?Sized,
{
    if len > 255 * alg.n_hash() {
        return Err(CryptoError::KdfExpandInvalidOutputLen);
    }

    if prk.len() < alg.n_hash() {
        return Err(CryptoError::KdfExpandInvalidPrkLen);
    }

    let len_prefix = u16::try_from(len)
        .map_err(|_| CryptoError::KdfExpandInvalidOutputLen)?
        .to_be_bytes();

    crypto_backend.kdf_expand_multi_info(
        alg,
        prk,
        &[&len_prefix, HPKE_VERSION, suite_id, label.as_bytes(), info],
        len,
    )
}
