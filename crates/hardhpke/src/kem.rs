//! Key Encapsulation Mechanisms, see [RFC 9180, Section 4].
//!
//! Every KEM supported here is a DHKEM. Besides `Encap` / `Decap` and their
//! authenticated variants, this module (de)serializes keys.
//!
//! [RFC 9180, Section 4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4

mod dhkem;

use alloc::vec::Vec;

use hardhpke_crypto::{Crypto, CryptoError, HpkeKemId, HpkePrivateKey, HpkePublicKey};
use zeroize::Zeroizing;

pub use self::dhkem::*;
use crate::error::Error;

/// `SerializePublicKey(pkX)`: Produce a byte string of length `Npk` encoding
/// the public key `pkX`.
///
/// Public keys are held in their serialized form, so this is a copy.
pub fn serialize_public_key(pk: &HpkePublicKey) -> Vec<u8> {
    pk.to_vec()
}

/// `SerializePrivateKey(skX)`: Produce a byte string of length `Nsk` encoding
/// the private key `skX`. The copy is wiped when dropped.
pub fn serialize_private_key(sk: &HpkePrivateKey) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(sk.to_vec())
}

/// `DeserializePublicKey(pkXm)`: Parse a byte string of length `Npk` to
/// recover a public key.
///
/// The length is checked before the bytes reach the backend, which then
/// rejects points not on the curve.
///
/// # Errors
///
/// [`Error::Deserialization`] on a length mismatch or an invalid point.
pub fn deserialize_public_key<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    pk_xm: &[u8],
) -> Result<HpkePublicKey, Error> {
    if pk_xm.len() != alg.n_pk() {
        return Err(Error::Deserialization(CryptoError::KemMalformedPkX));
    }

    crypto_backend
        .pk_checked(alg, pk_xm)
        .map_err(Error::Deserialization)
}

/// `DeserializePrivateKey(skXm)`: Parse a byte string of length `Nsk` to
/// recover a private key.
///
/// # Errors
///
/// [`Error::Deserialization`] on a length mismatch or a scalar out of range.
pub fn deserialize_private_key<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    sk_xm: &[u8],
) -> Result<HpkePrivateKey, Error> {
    if sk_xm.len() != alg.n_sk() {
        return Err(Error::Deserialization(CryptoError::KemMalformedSkX));
    }

    crypto_backend
        .sk(alg, sk_xm)
        .map_err(Error::Deserialization)
}

/// `pk(skX)`: The public key corresponding to the private key `skX`.
///
/// # Errors
///
/// [`Error::Deserialization`] if `sk` is not a valid private key of `alg`.
pub fn public_key_of<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    sk: &HpkePrivateKey,
) -> Result<HpkePublicKey, Error> {
    if sk.len() != alg.n_sk() {
        return Err(Error::Deserialization(CryptoError::KemMalformedSkX));
    }

    crypto_backend
        .pk(alg, sk)
        .map_err(Error::Deserialization)
}
