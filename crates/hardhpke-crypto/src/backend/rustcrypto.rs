//! [`Crypto`] primitives implementation using crates from RustCrypto.
//!
//! Requires the `backend-rustcrypto` feature (enabled by default).
//!
//! # Supported
//!
//! | KEM | Supported |
//! |:-:|:-:|
//! | DHKEM_P256_HKDF_SHA256 | ✅ |
//! | DHKEM_P384_HKDF_SHA384 | ✅ |
//! | DHKEM_P521_HKDF_SHA512 | ✅ |
//! | DHKEM_X25519_HKDF_SHA256 | ✅ |
//!
//! | KDF | Supported |
//! |:-:|:-:|
//! | HKDF_SHA256 | ✅ |
//! | HKDF_SHA384 | ✅ |
//! | HKDF_SHA512 | ✅ |
//!
//! | AEAD | Supported |
//! |:-:|:-:|
//! | AES_128_GCM | ✅ |
//! | AES_256_GCM | ✅ |
//! | CHACHA20_POLY1305 | ✅ |
//! | EXPORT_ONLY | ✅ |

use alloc::vec::Vec;

use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};
use zeroize::Zeroize;

use crate::{
    Crypto, CryptoError, HpkeAead, HpkeAeadId, HpkeKdfId, HpkeKemId, HpkeKeyPair, HpkePrivateKey,
    HpkePublicKey, Okm, Prk, SharedSecret,
};

/// See [module-level](self) documentation.
///
/// Not `Clone`: two copies would replay the same random stream.
#[derive(Debug)]
pub struct HpkeCrypto {
    rng: ChaCha20Rng,
}

impl HpkeCrypto {
    /// Prepare a new `HpkeCrypto` instance, seeding its generator from the
    /// operating system.
    ///
    /// # Errors
    ///
    /// This function returns an error if the operating system's random number
    /// generator is not available.
    pub fn new() -> Result<Self, CryptoError> {
        Ok(Self {
            rng: ChaCha20Rng::from_rng(OsRng).map_err(|_| CryptoError::InsufficientRandomness)?,
        })
    }
}

impl Crypto for HpkeCrypto {
    fn secure_random_fill(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
        self.rng
            .try_fill_bytes(buf)
            .map_err(|_| CryptoError::InsufficientRandomness)
    }

    fn is_kem_supported(&self, alg: &HpkeKemId) -> bool {
        matches!(
            alg,
            HpkeKemId::DHKEM_P256_HKDF_SHA256
                | HpkeKemId::DHKEM_P384_HKDF_SHA384
                | HpkeKemId::DHKEM_P521_HKDF_SHA512
                | HpkeKemId::DHKEM_X25519_HKDF_SHA256
        )
    }

    fn kem_generate_key_pair(&mut self, alg: HpkeKemId) -> Result<HpkeKeyPair, CryptoError> {
        macro_rules! kem_generate_key_pair {
            ($c:ident) => {{
                use elliptic_curve::sec1::ToEncodedPoint as _;

                let sk = $c::SecretKey::random(&mut self.rng);
                let mut sk_bytes = sk.to_bytes();

                let key_pair = HpkeKeyPair::new_unchecked(
                    alg,
                    sk_bytes.as_slice(),
                    sk.public_key().to_encoded_point(false).as_bytes(),
                );

                sk_bytes.as_mut_slice().zeroize();

                key_pair
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => kem_generate_key_pair!(p256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => kem_generate_key_pair!(p384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => kem_generate_key_pair!(p521),
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => {
                let sk = x25519_dalek::StaticSecret::random_from_rng(&mut self.rng);
                let pk = x25519_dalek::PublicKey::from(&sk);

                HpkeKeyPair::new_unchecked(alg, sk.as_bytes(), pk.as_bytes())
            }
        }
    }

    fn is_kdf_supported(&self, alg: &HpkeKdfId) -> bool {
        matches!(
            alg,
            HpkeKdfId::HKDF_SHA256 | HpkeKdfId::HKDF_SHA384 | HpkeKdfId::HKDF_SHA512
        )
    }

    fn kdf_extract(&self, alg: HpkeKdfId, salt: &[u8], ikm: &[u8]) -> Result<Prk, CryptoError> {
        macro_rules! extract {
            ($hmac_mode:ty) => {{
                let (mut prk, _) = hkdf::Hkdf::<$hmac_mode>::extract(Some(salt), ikm);
                let out = Prk::new_less_safe(prk.as_slice());

                prk.as_mut_slice().zeroize();

                Ok(out)
            }};
        }

        match alg {
            HpkeKdfId::HKDF_SHA256 => extract!(sha2::Sha256),
            HpkeKdfId::HKDF_SHA384 => extract!(sha2::Sha384),
            HpkeKdfId::HKDF_SHA512 => extract!(sha2::Sha512),
        }
    }

    fn kdf_expand(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        info: &[u8],
        l: usize,
    ) -> Result<Okm, CryptoError> {
        self.kdf_expand_multi_info(alg, prk, &[info], l)
    }

    fn kdf_expand_multi_info(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        infos: &[&[u8]],
        l: usize,
    ) -> Result<Okm, CryptoError> {
        macro_rules! expand {
            ($hmac_mode:ty) => {{
                let hkdf = hkdf::Hkdf::<$hmac_mode>::from_prk(prk)
                    .map_err(|_| CryptoError::KdfExpandInvalidPrkLen)?;
                let mut okm = Okm::zeroed(l);
                hkdf.expand_multi_info(infos, okm.as_mut_buffer())
                    .map_err(|_| CryptoError::KdfExpandInvalidOutputLen)?;
                Ok(okm)
            }};
        }

        match alg {
            HpkeKdfId::HKDF_SHA256 => expand!(sha2::Sha256),
            HpkeKdfId::HKDF_SHA384 => expand!(sha2::Sha384),
            HpkeKdfId::HKDF_SHA512 => expand!(sha2::Sha512),
        }
    }

    fn is_aead_supported(&self, alg: &HpkeAeadId) -> bool {
        matches!(
            alg,
            HpkeAeadId::AES_128_GCM
                | HpkeAeadId::AES_256_GCM
                | HpkeAeadId::CHACHA20_POLY1305
                | HpkeAeadId::EXPORT_ONLY
        )
    }

    fn aead_seal_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError> {
        macro_rules! seal {
            ($c:ident, $alg:ident, $key:expr, $nonce:expr) => {{
                use aead::{AeadInPlace as _, KeyInit as _};

                let cipher = $c::$alg::new_from_slice($key).map_err(|_| CryptoError::AeadInvalidKey)?;
                let nonce: aead::Nonce<$c::$alg> = (*$nonce).into();

                cipher
                    .encrypt_in_place(&nonce, aad, buffer)
                    .map_err(|_| CryptoError::AeadSeal)
            }};
        }

        match crypto_info {
            HpkeAead::Aes128Gcm { key, nonce } => seal!(aes_gcm, Aes128Gcm, key, nonce),
            HpkeAead::Aes256Gcm { key, nonce } => seal!(aes_gcm, Aes256Gcm, key, nonce),
            HpkeAead::ChaCha20Poly1305 { key, nonce } => {
                seal!(chacha20poly1305, ChaCha20Poly1305, key, nonce)
            }
        }
    }

    fn aead_open_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError> {
        macro_rules! open {
            ($c:ident, $alg:ident, $key:expr, $nonce:expr) => {{
                use aead::{AeadInPlace as _, KeyInit as _};

                let cipher = $c::$alg::new_from_slice($key).map_err(|_| CryptoError::AeadInvalidKey)?;
                let nonce: aead::Nonce<$c::$alg> = (*$nonce).into();

                cipher
                    .decrypt_in_place(&nonce, aad, buffer)
                    .map_err(|_| CryptoError::AeadOpen)
            }};
        }

        if buffer.len() < crypto_info.aead_id().n_tag() {
            return Err(CryptoError::AeadInvalidCt);
        }

        match crypto_info {
            HpkeAead::Aes128Gcm { key, nonce } => open!(aes_gcm, Aes128Gcm, key, nonce),
            HpkeAead::Aes256Gcm { key, nonce } => open!(aes_gcm, Aes256Gcm, key, nonce),
            HpkeAead::ChaCha20Poly1305 { key, nonce } => {
                open!(chacha20poly1305, ChaCha20Poly1305, key, nonce)
            }
        }
    }

    fn sk(&self, alg: HpkeKemId, sk: &[u8]) -> Result<HpkePrivateKey, CryptoError> {
        macro_rules! sk {
            ($c:ty) => {{
                let sk = HpkePrivateKey::new(alg, sk)?;

                // Rejects zero and scalars not below the group order.
                ec_secret_key::<$c>(alg, &sk)?;

                Ok(sk)
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => sk!(p256::NistP256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => sk!(p384::NistP384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => sk!(p521::NistP521),
            // Every 32-byte string is a valid X25519 private key.
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => HpkePrivateKey::new(alg, sk),
        }
    }

    fn pk(&self, alg: HpkeKemId, sk: &HpkePrivateKey) -> Result<HpkePublicKey, CryptoError> {
        macro_rules! pk {
            ($c:ty) => {{
                use elliptic_curve::sec1::ToEncodedPoint as _;

                let sk = ec_secret_key::<$c>(alg, sk)?;

                HpkePublicKey::new(alg, sk.public_key().to_encoded_point(false).as_bytes())
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => pk!(p256::NistP256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => pk!(p384::NistP384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => pk!(p521::NistP521),
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => {
                let sk = x25519_static_secret(sk)?;

                HpkePublicKey::new(alg, x25519_dalek::PublicKey::from(&sk).as_bytes())
            }
        }
    }

    fn pk_checked(&self, alg: HpkeKemId, pk: &[u8]) -> Result<HpkePublicKey, CryptoError> {
        macro_rules! pk_checked {
            ($c:ty) => {{
                let pk = HpkePublicKey::new(alg, pk)?;

                // Rejects points off the curve and the identity.
                elliptic_curve::PublicKey::<$c>::from_sec1_bytes(&pk).map_err(|_| CryptoError::KemMalformedPkX)?;

                Ok(pk)
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => pk_checked!(p256::NistP256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => pk_checked!(p384::NistP384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => pk_checked!(p521::NistP521),
            // Small-order points are caught by the contributory check in `dh`.
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => HpkePublicKey::new(alg, pk),
        }
    }

    fn dh(
        &self,
        alg: HpkeKemId,
        sk_x: &HpkePrivateKey,
        pk_y: &HpkePublicKey,
    ) -> Result<SharedSecret, CryptoError> {
        macro_rules! dh {
            ($c:ty) => {{
                let sk = ec_secret_key::<$c>(alg, sk_x)?;
                let pk = elliptic_curve::PublicKey::<$c>::from_sec1_bytes(pk_y)
                    .map_err(|_| CryptoError::KemMalformedPkX)?;

                let shared_secret =
                    elliptic_curve::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());

                Ok(SharedSecret::new(shared_secret.raw_secret_bytes()))
            }};
        }

        match alg {
            HpkeKemId::DHKEM_P256_HKDF_SHA256 => dh!(p256::NistP256),
            HpkeKemId::DHKEM_P384_HKDF_SHA384 => dh!(p384::NistP384),
            HpkeKemId::DHKEM_P521_HKDF_SHA512 => dh!(p521::NistP521),
            HpkeKemId::DHKEM_X25519_HKDF_SHA256 => {
                let pk = x25519_dalek::PublicKey::from(
                    TryInto::<[u8; 32]>::try_into(&**pk_y)
                        .map_err(|_| CryptoError::KemMalformedPkX)?,
                );
                let sk = x25519_static_secret(sk_x)?;

                let shared_secret = sk.diffie_hellman(&pk);

                if !shared_secret.was_contributory() {
                    return Err(CryptoError::KemNonContributory);
                }

                Ok(SharedSecret::new(shared_secret.as_bytes()))
            }
        }
    }
}

fn ec_secret_key<C>(
    alg: HpkeKemId,
    sk: &HpkePrivateKey,
) -> Result<elliptic_curve::SecretKey<C>, CryptoError>
where
    C: elliptic_curve::CurveArithmetic,
{
    if sk.len() != alg.n_sk() {
        return Err(CryptoError::KemMalformedSkX);
    }

    elliptic_curve::SecretKey::<C>::from_slice(sk).map_err(|_| CryptoError::KemMalformedSkX)
}

fn x25519_static_secret(sk: &HpkePrivateKey) -> Result<x25519_dalek::StaticSecret, CryptoError> {
    let mut bytes =
        TryInto::<[u8; 32]>::try_into(&**sk).map_err(|_| CryptoError::KemMalformedSkX)?;
    let sk = x25519_dalek::StaticSecret::from(bytes);

    bytes.zeroize();

    Ok(sk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p521_scalar_range() {
        let backend = HpkeCrypto::new().unwrap();
        let alg = HpkeKemId::DHKEM_P521_HKDF_SHA512;

        let mut one = [0u8; 66];
        one[65] = 1;
        assert!(backend.sk(alg, &one).is_ok());

        assert!(matches!(
            backend.sk(alg, &[0u8; 66]),
            Err(CryptoError::KemMalformedSkX)
        ));
        assert!(matches!(
            backend.sk(alg, &[0xFF; 66]),
            Err(CryptoError::KemMalformedSkX)
        ));
    }

    #[test]
    fn test_x25519_non_contributory() {
        let mut backend = HpkeCrypto::new().unwrap();
        let alg = HpkeKemId::DHKEM_X25519_HKDF_SHA256;

        let key_pair = backend.kem_generate_key_pair(alg).unwrap();
        // The identity (u = 0) is a small-order point.
        let pk_zero = HpkePublicKey::new(alg, &[0u8; 32]).unwrap();

        assert!(matches!(
            backend.dh(alg, key_pair.sk(), &pk_zero),
            Err(CryptoError::KemNonContributory)
        ));
    }

    #[test]
    fn test_pk_checked_rejects_off_curve() {
        let mut backend = HpkeCrypto::new().unwrap();
        let alg = HpkeKemId::DHKEM_P256_HKDF_SHA256;

        let key_pair = backend.kem_generate_key_pair(alg).unwrap();
        assert!(backend.pk_checked(alg, key_pair.pk()).is_ok());

        let mut tampered = key_pair.pk().to_vec();
        tampered[64] ^= 0x01;
        assert!(matches!(
            backend.pk_checked(alg, &tampered),
            Err(CryptoError::KemMalformedPkX)
        ));

        assert!(matches!(
            backend.pk_checked(alg, &key_pair.pk()[..33]),
            Err(CryptoError::KemMalformedPkX)
        ));
    }
}
