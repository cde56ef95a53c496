//! Implementation of DH-Based KEM functions for HPKE as defined in [RFC 9180,
//! section 4.1].
//!
//! Every secret intermediate (`dh`, `Ze`, `Zs`, the ephemeral private key,
//! `eae_prk`) lives in a buffer that is wiped when it goes out of scope, on
//! success and error paths alike.
//!
//! [RFC 9180, section 4.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4.1

use hardhpke_crypto::{
    kdf, Crypto, CryptoError, EncapsulatedSecret, HpkeKemId, HpkeKeyPair, HpkePrivateKey,
    HpkePublicKey, SharedSecret,
};
use smallvec::SmallVec;
use zeroize::Zeroizing;

use crate::error::Error;

/// Room for `kem_context = concat(enc, pkRm, pkSm)` of the largest KEM
/// (P-521) without touching the heap.
const MAX_KEM_CONTEXT_LEN: usize = 3 * 133;

fn kem_context(parts: &[&[u8]]) -> SmallVec<[u8; MAX_KEM_CONTEXT_LEN]> {
    let mut kem_context = SmallVec::new();

    for part in parts {
        kem_context.extend_from_slice(part);
    }

    kem_context
}

/// `GenerateKeyPair()`: Randomized algorithm to generate a key pair (skX, pkX).
///
/// The key pair is drawn from the backend's CSPRNG.
///
/// # Errors
///
/// [`Error::Crypto`] if the backend does not support `alg` or its random
/// number generator fails.
pub fn generate_key_pair<C: Crypto + ?Sized>(
    crypto_backend: &mut C,
    alg: HpkeKemId,
) -> Result<HpkeKeyPair, Error> {
    if !crypto_backend.is_kem_supported(&alg) {
        return Err(CryptoError::KemUnsupported.into());
    }

    crypto_backend
        .kem_generate_key_pair(alg)
        .map_err(Into::into)
}

/// `DeriveKeyPair(ikm)`: Deterministic algorithm to derive a key pair(skX, pkX)
/// from the byte string `ikm`, which must be exactly `Nsk` bytes long here.
///
/// 7.1.3 DeriveKeyPair
///
/// For P-256, P-384, and P-521, the `DeriveKeyPair()` function of the KEM
/// performs rejection sampling over field elements:
///
/// ```text
/// def DeriveKeyPair(ikm):
///   dkp_prk = LabeledExtract("", "dkp_prk", ikm)
///   sk = 0
///   counter = 0
///   while sk == 0 or sk >= order:
///     if counter > 255:
///       raise DeriveKeyPairError
///     bytes = LabeledExpand(dkp_prk, "candidate",
///                           I2OSP(counter, 1), Nsk)
///     bytes[0] = bytes[0] & bitmask
///     sk = OS2IP(bytes)
///     counter = counter + 1
///   return (sk, pk(sk))
/// ```
///
/// `bitmask` is `0xFF` for P-256 and P-384 and `0x01` for P-521, see
/// [`HpkeKemId::candidate_bitmask`].
///
/// For X25519, the `DeriveKeyPair()` function applies a KDF to the input:
///
/// ```text
/// def DeriveKeyPair(ikm):
///   dkp_prk = LabeledExtract("", "dkp_prk", ikm)
///   sk = LabeledExpand(dkp_prk, "sk", "", Nsk)
///   return (sk, pk(sk))
/// ```
///
/// See [RFC 9180, Section 7.1.3] for details.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if `ikm` is not `Nsk` bytes long.
/// - [`Error::DeriveKeyPair`] if none of the 256 candidates is a valid
///   scalar.
///
/// [RFC 9180, Section 7.1.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.1.3
pub fn derive_key_pair<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    ikm: &[u8],
) -> Result<HpkeKeyPair, Error> {
    if ikm.len() != alg.n_sk() {
        return Err(Error::InvalidInput(
            "DeriveKeyPair seed must be exactly Nsk bytes long",
        ));
    }

    if !crypto_backend.is_kem_supported(&alg) {
        return Err(CryptoError::KemUnsupported.into());
    }

    let dkp_prk = kdf::labeled_extract(
        crypto_backend,
        alg.kdf_id(),
        &alg.suite_id(),
        &[],
        "dkp_prk",
        ikm,
    )?;

    let sk = match alg.candidate_bitmask() {
        None => {
            let sk = kdf::labeled_expand(
                crypto_backend,
                alg.kdf_id(),
                &alg.suite_id(),
                &dkp_prk,
                "sk",
                &[],
                alg.n_sk(),
            )?;

            crypto_backend
                .sk(alg, &sk)
                .map_err(|_| Error::DeriveKeyPair)?
        }
        Some(bitmask) => {
            let mut derived = None;

            for counter in 0..=u8::MAX {
                let mut candidate = kdf::labeled_expand(
                    crypto_backend,
                    alg.kdf_id(),
                    &alg.suite_id(),
                    &dkp_prk,
                    "candidate",
                    &[counter],
                    alg.n_sk(),
                )?;

                candidate.as_mut_buffer()[0] &= bitmask;

                // let the crypto backend validate the private key
                match crypto_backend.sk(alg, &candidate) {
                    Ok(sk) => {
                        derived = Some(sk);
                        break;
                    }
                    Err(CryptoError::KemMalformedSkX) => {
                        tracing::trace!(counter, kem = %alg, "rejected DeriveKeyPair candidate");
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            derived.ok_or(Error::DeriveKeyPair)?
        }
    };

    let pk = crypto_backend.pk(alg, &sk)?;

    Ok(HpkeKeyPair::from_parts(sk, pk))
}

/// ```text
/// def Encap(pkR):
///   skE, pkE = GenerateKeyPair()
///   dh = DH(skE, pkR)
///   enc = SerializePublicKey(pkE)
///   pkRm = SerializePublicKey(pkR)
///   kem_context = concat(enc, pkRm)
///   shared_secret = ExtractAndExpand(dh, kem_context)
///   return shared_secret, enc
/// ```
///
/// # Errors
///
/// [`Error::Encap`] wrapping the failure.
pub fn encap<C: Crypto + ?Sized>(
    crypto_backend: &mut C,
    alg: HpkeKemId,
    pk_r: &HpkePublicKey,
) -> Result<(SharedSecret, EncapsulatedSecret), Error> {
    // skE, pkE = GenerateKeyPair()
    let key_pair_e = crypto_backend
        .kem_generate_key_pair(alg)
        .map_err(Error::Encap)?;

    encap_with(crypto_backend, alg, pk_r, key_pair_e).map_err(Error::Encap)
}

/// `Encap(pkR)` with the ephemeral key pair derived from `ikm_e`:
/// `skE, pkE = DeriveKeyPair(ikm_e)`.
///
/// Only meant for reproducing test vectors: reusing `ikm_e` reuses the
/// ephemeral key.
///
/// # Errors
///
/// Unlike [`encap`], a bad ephemeral seed is not reported as
/// [`Error::Encap`]:
///
/// - [`Error::InvalidInput`] if `ikm_e` is not `Nsk` bytes long.
/// - [`Error::DeriveKeyPair`] if no valid key can be derived from `ikm_e`.
/// - [`Error::Encap`] wrapping any failure after the ephemeral key pair is
///   derived.
pub fn encap_deterministic<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    pk_r: &HpkePublicKey,
    ikm_e: &[u8],
) -> Result<(SharedSecret, EncapsulatedSecret), Error> {
    let key_pair_e = derive_key_pair(crypto_backend, alg, ikm_e)?;

    encap_with(crypto_backend, alg, pk_r, key_pair_e).map_err(Error::Encap)
}

fn encap_with<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    pk_r: &HpkePublicKey,
    key_pair_e: HpkeKeyPair,
) -> Result<(SharedSecret, EncapsulatedSecret), CryptoError> {
    check_pk_len(alg, pk_r)?;

    let (sk_e, pk_e) = key_pair_e.into_parts();

    // dh = DH(skE, pkR)
    let dh = crypto_backend.dh(alg, &sk_e, pk_r)?;

    // enc = SerializePublicKey(pkE), though here pkE is already serialized
    let enc = EncapsulatedSecret::from_pk_e(pk_e);

    // kem_context = concat(enc, pkRm), pkR is already serialized
    let kem_context = kem_context(&[&enc, pk_r]);

    // shared_secret = ExtractAndExpand(dh, kem_context)
    let shared_secret = extract_and_expand(crypto_backend, alg, &dh, &kem_context)?;

    Ok((shared_secret, enc))
}

/// ```text
/// def Decap(enc, skR):
///   pkE = DeserializePublicKey(enc)
///   dh = DH(skR, pkE)
///
///   pkRm = SerializePublicKey(pk(skR))
///   kem_context = concat(enc, pkRm)
///
///   shared_secret = ExtractAndExpand(dh, kem_context)
///   return shared_secret
/// ```
///
/// # Errors
///
/// [`Error::Decap`] wrapping the failure, e.g. when `enc` is not a valid
/// public key.
pub fn decap<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    enc: &EncapsulatedSecret,
    sk_r: &HpkePrivateKey,
) -> Result<SharedSecret, Error> {
    decap_inner(crypto_backend, alg, enc, sk_r).map_err(Error::Decap)
}

fn decap_inner<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    enc: &EncapsulatedSecret,
    sk_r: &HpkePrivateKey,
) -> Result<SharedSecret, CryptoError> {
    // pkE = DeserializePublicKey(enc)
    let pk_e = deserialize_enc(crypto_backend, alg, enc)?;

    // dh = DH(skR, pkE)
    let dh = crypto_backend.dh(alg, sk_r, &pk_e)?;

    // pkRm = SerializePublicKey(pk(skR))
    let pk_rm = crypto_backend.pk(alg, sk_r)?;

    // kem_context = concat(enc, pkRm)
    let kem_context = kem_context(&[enc, &pk_rm]);

    // shared_secret = ExtractAndExpand(dh, kem_context)
    extract_and_expand(crypto_backend, alg, &dh, &kem_context)
}

/// ```text
/// def AuthEncap(pkR, skS):
///   skE, pkE = GenerateKeyPair()
///   dh = concat(DH(skE, pkR), DH(skS, pkR))
///   enc = SerializePublicKey(pkE)
///
///   pkRm = SerializePublicKey(pkR)
///   pkSm = SerializePublicKey(pk(skS))
///   kem_context = concat(enc, pkRm, pkSm)
///
///   shared_secret = ExtractAndExpand(dh, kem_context)
///   return shared_secret, enc
/// ```
///
/// # Errors
///
/// [`Error::Encap`] wrapping the failure.
pub fn auth_encap<C: Crypto + ?Sized>(
    crypto_backend: &mut C,
    alg: HpkeKemId,
    pk_r: &HpkePublicKey,
    sk_s: &HpkePrivateKey,
) -> Result<(SharedSecret, EncapsulatedSecret), Error> {
    // skE, pkE = GenerateKeyPair()
    let key_pair_e = crypto_backend
        .kem_generate_key_pair(alg)
        .map_err(Error::Encap)?;

    auth_encap_with(crypto_backend, alg, pk_r, sk_s, key_pair_e).map_err(Error::Encap)
}

/// `AuthEncap(pkR, skS)` with the ephemeral key pair derived from `ikm_e`.
///
/// Only meant for reproducing test vectors, see [`encap_deterministic`].
///
/// # Errors
///
/// As for [`encap_deterministic`]: [`Error::InvalidInput`] or
/// [`Error::DeriveKeyPair`] for a bad `ikm_e`, [`Error::Encap`] wrapping any
/// later failure.
pub fn auth_encap_deterministic<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    pk_r: &HpkePublicKey,
    sk_s: &HpkePrivateKey,
    ikm_e: &[u8],
) -> Result<(SharedSecret, EncapsulatedSecret), Error> {
    let key_pair_e = derive_key_pair(crypto_backend, alg, ikm_e)?;

    auth_encap_with(crypto_backend, alg, pk_r, sk_s, key_pair_e).map_err(Error::Encap)
}

fn auth_encap_with<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    pk_r: &HpkePublicKey,
    sk_s: &HpkePrivateKey,
    key_pair_e: HpkeKeyPair,
) -> Result<(SharedSecret, EncapsulatedSecret), CryptoError> {
    check_pk_len(alg, pk_r)?;

    let (sk_e, pk_e) = key_pair_e.into_parts();

    // dh = concat(DH(skE, pkR), DH(skS, pkR))
    let mut dh = Zeroizing::new(alloc::vec::Vec::with_capacity(2 * alg.n_sk()));
    dh.extend_from_slice(&crypto_backend.dh(alg, &sk_e, pk_r)?);
    dh.extend_from_slice(&crypto_backend.dh(alg, sk_s, pk_r)?);

    // enc = SerializePublicKey(pkE), though here pkE is already serialized
    let enc = EncapsulatedSecret::from_pk_e(pk_e);

    // pkSm = SerializePublicKey(pk(skS))
    let pk_sm = crypto_backend.pk(alg, sk_s)?;

    // kem_context = concat(enc, pkRm, pkSm)
    let kem_context = kem_context(&[&enc, pk_r, &pk_sm]);

    // shared_secret = ExtractAndExpand(dh, kem_context)
    let shared_secret = extract_and_expand(crypto_backend, alg, &dh, &kem_context)?;

    Ok((shared_secret, enc))
}

/// ```text
/// def AuthDecap(enc, skR, pkS):
///   pkE = DeserializePublicKey(enc)
///   dh = concat(DH(skR, pkE), DH(skR, pkS))
///
///   pkRm = SerializePublicKey(pk(skR))
///   pkSm = SerializePublicKey(pkS)
///   kem_context = concat(enc, pkRm, pkSm)
///
///   shared_secret = ExtractAndExpand(dh, kem_context)
///   return shared_secret
/// ```
///
/// # Errors
///
/// [`Error::Decap`] wrapping the failure.
pub fn auth_decap<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    enc: &EncapsulatedSecret,
    sk_r: &HpkePrivateKey,
    pk_s: &HpkePublicKey,
) -> Result<SharedSecret, Error> {
    auth_decap_inner(crypto_backend, alg, enc, sk_r, pk_s).map_err(Error::Decap)
}

fn auth_decap_inner<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    enc: &EncapsulatedSecret,
    sk_r: &HpkePrivateKey,
    pk_s: &HpkePublicKey,
) -> Result<SharedSecret, CryptoError> {
    check_pk_len(alg, pk_s)?;

    // pkE = DeserializePublicKey(enc)
    let pk_e = deserialize_enc(crypto_backend, alg, enc)?;

    // dh = concat(DH(skR, pkE), DH(skR, pkS))
    let mut dh = Zeroizing::new(alloc::vec::Vec::with_capacity(2 * alg.n_sk()));
    dh.extend_from_slice(&crypto_backend.dh(alg, sk_r, &pk_e)?);
    dh.extend_from_slice(&crypto_backend.dh(alg, sk_r, pk_s)?);

    // pkRm = SerializePublicKey(pk(skR))
    let pk_rm = crypto_backend.pk(alg, sk_r)?;

    // kem_context = concat(enc, pkRm, pkSm), pkS is already serialized
    let kem_context = kem_context(&[enc, &pk_rm, pk_s]);

    // shared_secret = ExtractAndExpand(dh, kem_context)
    extract_and_expand(crypto_backend, alg, &dh, &kem_context)
}

/// ```text
/// def ExtractAndExpand(dh, kem_context):
///   eae_prk = LabeledExtract("", "eae_prk", dh)
///   shared_secret = LabeledExpand(eae_prk, "shared_secret",
///                                 kem_context, Nsecret)
///   return shared_secret
/// ```
fn extract_and_expand<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    dh: &[u8],
    kem_context: &[u8],
) -> Result<SharedSecret, CryptoError> {
    let suite_id = alg.suite_id();

    let eae_prk =
        kdf::labeled_extract(crypto_backend, alg.kdf_id(), &suite_id, &[], "eae_prk", dh)?;

    let okm = kdf::labeled_expand(
        crypto_backend,
        alg.kdf_id(),
        &suite_id,
        &eae_prk,
        "shared_secret",
        kem_context,
        alg.n_secret(),
    )?;

    Ok(SharedSecret::from_okm(okm))
}

/// `DeserializePublicKey(enc)`: `enc` must be a valid public key of `alg`.
fn deserialize_enc<C: Crypto + ?Sized>(
    crypto_backend: &C,
    alg: HpkeKemId,
    enc: &EncapsulatedSecret,
) -> Result<HpkePublicKey, CryptoError> {
    if enc.len() != alg.n_enc() {
        return Err(CryptoError::KemMalformedPkX);
    }

    crypto_backend.pk_checked(alg, enc)
}

fn check_pk_len(alg: HpkeKemId, pk: &HpkePublicKey) -> Result<(), CryptoError> {
    if pk.len() != alg.n_pk() {
        return Err(CryptoError::KemMalformedPkX);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use hardhpke_crypto::backend::HpkeCryptoRustCrypto;

    use super::*;

    const ALL_KEMS: [HpkeKemId; 4] = [
        HpkeKemId::DHKEM_P256_HKDF_SHA256,
        HpkeKemId::DHKEM_P384_HKDF_SHA384,
        HpkeKemId::DHKEM_P521_HKDF_SHA512,
        HpkeKemId::DHKEM_X25519_HKDF_SHA256,
    ];

    #[test]
    fn test_derive_key_pair_is_deterministic() {
        let backend = HpkeCryptoRustCrypto::new().unwrap();

        for alg in ALL_KEMS {
            let ikm = alloc::vec![0x5a; alg.n_sk()];

            let key_pair_1 = derive_key_pair(&backend, alg, &ikm).unwrap();
            let key_pair_2 = derive_key_pair(&backend, alg, &ikm).unwrap();

            assert_eq!(key_pair_1.sk(), key_pair_2.sk());
            assert_eq!(key_pair_1.pk(), key_pair_2.pk());
            assert_eq!(key_pair_1.sk().len(), alg.n_sk());
            assert_eq!(key_pair_1.pk().len(), alg.n_pk());

            let other = derive_key_pair(&backend, alg, &alloc::vec![0xa5; alg.n_sk()]).unwrap();
            assert_ne!(key_pair_1.pk(), other.pk());
        }
    }

    #[test]
    fn test_derive_key_pair_rejects_wrong_seed_length() {
        let backend = HpkeCryptoRustCrypto::new().unwrap();

        for alg in ALL_KEMS {
            for len in [0, alg.n_sk() - 1, alg.n_sk() + 1] {
                assert!(matches!(
                    derive_key_pair(&backend, alg, &alloc::vec![7; len]),
                    Err(Error::InvalidInput(_))
                ));
            }
        }
    }

    // RFC 9180, A.6.1 (ikmE -> skEm, ikmR -> skRm) and A.3.1 (ikmE -> skEm,
    // pkEm). Masking the P-521 candidate with 0xFF yields other keys for both
    // A.6.1 seeds.
    #[test]
    fn test_derive_key_pair_known_answers() {
        let backend = HpkeCryptoRustCrypto::new().unwrap();

        let cases = [
            (
                HpkeKemId::DHKEM_P521_HKDF_SHA512,
                "7f06ab8215105fc46aceeb2e3dc5028b44364f960426eb0d8e4026c2f8b5d7e7a986688f1591abf5ab753c357a5d6f0440414b4ed4ede71317772ac98d9239f70904",
                "014784c692da35df6ecde98ee43ac425dbdd0969c0c72b42f2e708ab9d535415a8569bdacfcc0a114c85b8e3f26acf4d68115f8c91a66178cdbd03b7bcc5291e374b",
                None,
            ),
            (
                HpkeKemId::DHKEM_P521_HKDF_SHA512,
                "2ad954bbe39b7122529f7dde780bff626cd97f850d0784a432784e69d86eccaade43b6c10a8ffdb94bf943c6da479db137914ec835a7e715e36e45e29b587bab3bf1",
                "01462680369ae375e4b3791070a7458ed527842f6a98a79ff5e0d4cbde83c27196a3916956655523a6a2556a7af62c5cadabe2ef9da3760bb21e005202f7b2462847",
                None,
            ),
            (
                HpkeKemId::DHKEM_P256_HKDF_SHA256,
                "4270e54ffd08d79d5928020af4686d8f6b7d35dbe470265f1f5aa22816ce860e",
                "4995788ef4b9d6132b249ce59a77281493eb39af373d236a1fe415cb0c2d7beb",
                Some("04a92719c6195d5085104f469a8b9814d5838ff72b60501e2c4466e5e67b325ac98536d7b61a1af4b78e5b7f951c0900be863c403ce65c9bfcb9382657222d18c4"),
            ),
        ];

        for (alg, ikm, sk, pk) in cases {
            let key_pair =
                derive_key_pair(&backend, alg, &const_hex::decode(ikm).unwrap()).unwrap();

            assert_eq!(&**key_pair.sk(), &const_hex::decode(sk).unwrap()[..], "{alg}");

            if let Some(pk) = pk {
                assert_eq!(&**key_pair.pk(), &const_hex::decode(pk).unwrap()[..], "{alg}");
            }
        }
    }

    #[test]
    fn test_encap_decap() {
        for alg in ALL_KEMS {
            let mut backend = HpkeCryptoRustCrypto::new().unwrap();
            let key_pair_r = generate_key_pair(&mut backend, alg).unwrap();

            let (shared_secret, enc) = encap(&mut backend, alg, key_pair_r.pk()).unwrap();
            assert_eq!(enc.len(), alg.n_enc());
            assert_eq!(shared_secret.len(), alg.n_secret());

            let decapped = decap(&backend, alg, &enc, key_pair_r.sk()).unwrap();
            assert_eq!(shared_secret, decapped);

            // A fresh ephemeral key every time.
            let (other_secret, other_enc) = encap(&mut backend, alg, key_pair_r.pk()).unwrap();
            assert_ne!(enc, other_enc);
            assert_ne!(shared_secret, other_secret);
        }
    }

    #[test]
    fn test_auth_encap_binds_sender() {
        for alg in ALL_KEMS {
            let mut backend = HpkeCryptoRustCrypto::new().unwrap();
            let key_pair_r = generate_key_pair(&mut backend, alg).unwrap();
            let key_pair_s = generate_key_pair(&mut backend, alg).unwrap();
            let key_pair_x = generate_key_pair(&mut backend, alg).unwrap();

            let (shared_secret, enc) =
                auth_encap(&mut backend, alg, key_pair_r.pk(), key_pair_s.sk()).unwrap();

            let decapped =
                auth_decap(&backend, alg, &enc, key_pair_r.sk(), key_pair_s.pk()).unwrap();
            assert_eq!(shared_secret, decapped);

            let wrong_sender =
                auth_decap(&backend, alg, &enc, key_pair_r.sk(), key_pair_x.pk()).unwrap();
            assert_ne!(shared_secret, wrong_sender);

            let unauthenticated = decap(&backend, alg, &enc, key_pair_r.sk()).unwrap();
            assert_ne!(shared_secret, unauthenticated);
        }
    }

    #[test]
    fn test_encap_deterministic() {
        for alg in ALL_KEMS {
            let backend = HpkeCryptoRustCrypto::new().unwrap();
            let key_pair_r = derive_key_pair(&backend, alg, &alloc::vec![1; alg.n_sk()]).unwrap();
            let ikm_e = alloc::vec![2; alg.n_sk()];

            let (ss_1, enc_1) = encap_deterministic(&backend, alg, key_pair_r.pk(), &ikm_e).unwrap();
            let (ss_2, enc_2) = encap_deterministic(&backend, alg, key_pair_r.pk(), &ikm_e).unwrap();

            assert_eq!(ss_1, ss_2);
            assert_eq!(enc_1, enc_2);
            assert_eq!(
                &*enc_1,
                &**derive_key_pair(&backend, alg, &ikm_e).unwrap().pk()
            );
        }
    }

    #[test]
    fn test_deterministic_encap_errors() {
        let backend = HpkeCryptoRustCrypto::new().unwrap();

        for alg in ALL_KEMS {
            let key_pair_r = derive_key_pair(&backend, alg, &alloc::vec![1; alg.n_sk()]).unwrap();
            let key_pair_s = derive_key_pair(&backend, alg, &alloc::vec![3; alg.n_sk()]).unwrap();
            let short_ikm = alloc::vec![2; alg.n_sk() - 1];

            // The seed is checked before any encapsulation work.
            assert!(matches!(
                encap_deterministic(&backend, alg, key_pair_r.pk(), &short_ikm),
                Err(Error::InvalidInput(_))
            ));
            assert!(matches!(
                auth_encap_deterministic(
                    &backend,
                    alg,
                    key_pair_r.pk(),
                    key_pair_s.sk(),
                    &short_ikm
                ),
                Err(Error::InvalidInput(_))
            ));

            // A recipient key of another KEM fails the encapsulation itself.
            let other = if alg == HpkeKemId::DHKEM_P521_HKDF_SHA512 {
                HpkeKemId::DHKEM_P256_HKDF_SHA256
            } else {
                HpkeKemId::DHKEM_P521_HKDF_SHA512
            };
            let foreign = derive_key_pair(&backend, other, &alloc::vec![1; other.n_sk()]).unwrap();
            let ikm_e = alloc::vec![2; alg.n_sk()];

            assert!(matches!(
                encap_deterministic(&backend, alg, foreign.pk(), &ikm_e),
                Err(Error::Encap(CryptoError::KemMalformedPkX))
            ));
            assert!(matches!(
                auth_encap_deterministic(&backend, alg, foreign.pk(), key_pair_s.sk(), &ikm_e),
                Err(Error::Encap(CryptoError::KemMalformedPkX))
            ));
        }
    }

    #[test]
    fn test_decap_rejects_malformed_enc() {
        for alg in ALL_KEMS {
            let mut backend = HpkeCryptoRustCrypto::new().unwrap();
            let key_pair_r = generate_key_pair(&mut backend, alg).unwrap();

            // Accepted by the length check, not by the curve.
            let enc = EncapsulatedSecret::new(alg, &alloc::vec![0; alg.n_enc()]).unwrap();

            assert!(matches!(
                decap(&backend, alg, &enc, key_pair_r.sk()),
                Err(Error::Decap(_))
            ));
        }
    }

    #[test]
    fn test_x25519_rejects_small_order_points() {
        let mut backend = HpkeCryptoRustCrypto::new().unwrap();
        let alg = HpkeKemId::DHKEM_X25519_HKDF_SHA256;
        let key_pair_r = generate_key_pair(&mut backend, alg).unwrap();

        let zero = HpkePublicKey::new(alg, &[0; 32]).unwrap();
        assert!(matches!(
            encap(&mut backend, alg, &zero),
            Err(Error::Encap(CryptoError::KemNonContributory))
        ));

        let enc = EncapsulatedSecret::new(alg, &[0; 32]).unwrap();
        assert!(matches!(
            decap(&backend, alg, &enc, key_pair_r.sk()),
            Err(Error::Decap(CryptoError::KemNonContributory))
        ));
    }
}
