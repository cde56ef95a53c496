#![doc = include_str!("../README.md")]
#![no_std]
#![forbid(unsafe_code, unused_must_use, unstable_features)]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    missing_docs,
    unused_import_braces,
    unused_extern_crates,
    unused_qualifications
)]

#[cfg(feature = "backend-rustcrypto")]
pub mod backend;
pub mod kdf;

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Deref;

use smallvec::SmallVec;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Cryptographic primitives HPKE is built upon.
///
/// The HPKE protocol logic lives in the `hardhpke` crate; an implementation of
/// this trait only has to provide Diffie-Hellman over the supported groups,
/// HKDF and the AEAD ciphers. See [`backend`] for the bundled implementation.
///
/// The notation follows [RFC 9180, Section 4]. Unless stated otherwise a
/// method fails with the [`CryptoError`] matching the primitive, or with one
/// of the `*Unsupported` variants for an algorithm the backend lacks.
///
/// [RFC 9180, Section 4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4
pub trait Crypto: fmt::Debug + Send + Sync {
    /// Fills `buf` from the backend's CSPRNG.
    fn secure_random_fill(&mut self, buf: &mut [u8]) -> Result<(), CryptoError>;

    /// Whether [`kem_generate_key_pair`](Crypto::kem_generate_key_pair),
    /// [`sk`](Crypto::sk), [`pk`](Crypto::pk) and [`dh`](Crypto::dh) accept
    /// `alg`.
    fn is_kem_supported(&self, alg: &HpkeKemId) -> bool;

    /// `GenerateKeyPair()`: a fresh random key pair `(skX, pkX)`.
    fn kem_generate_key_pair(&mut self, alg: HpkeKemId) -> Result<HpkeKeyPair, CryptoError>;

    /// Whether the `kdf_*` methods accept `alg`.
    fn is_kdf_supported(&self, alg: &HpkeKdfId) -> bool;

    /// `Extract(salt, ikm)`, an `Nh`-byte PRK. An empty `salt` stands for
    /// `Nh` zero bytes.
    fn kdf_extract(&self, alg: HpkeKdfId, salt: &[u8], ikm: &[u8]) -> Result<Prk, CryptoError>;

    /// `Extract(salt, concat(ikms...))`.
    ///
    /// The default implementation joins `ikms` in a buffer that is wiped on
    /// return. Backends that can feed HMAC incrementally should override it.
    fn kdf_extract_concated(
        &self,
        alg: HpkeKdfId,
        salt: &[u8],
        ikms: &[&[u8]],
    ) -> Result<Prk, CryptoError> {
        let concated = Zeroizing::new(ikms.concat());

        self.kdf_extract(alg, salt, &concated)
    }

    /// `Expand(prk, info, L)`.
    ///
    /// Fails with [`CryptoError::KdfExpandInvalidPrkLen`] for a PRK shorter
    /// than `Nh` and with [`CryptoError::KdfExpandInvalidOutputLen`] for
    /// `L > 255 * Nh`.
    fn kdf_expand(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        info: &[u8],
        l: usize,
    ) -> Result<Okm, CryptoError>;

    /// `Expand(prk, concat(infos...), L)`, used by `LabeledExpand` to avoid
    /// building the labeled info up front.
    fn kdf_expand_multi_info(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        infos: &[&[u8]],
        l: usize,
    ) -> Result<Okm, CryptoError> {
        self.kdf_expand(alg, prk, &infos.concat(), l)
    }

    /// Whether suites using `alg` can run on this backend.
    /// [`HpkeAeadId::EXPORT_ONLY`] needs no cipher, so backends report it
    /// as supported.
    fn is_aead_supported(&self, alg: &HpkeAeadId) -> bool;

    /// `Seal(key, nonce, aad, pt)`, returning `ct || tag`. The key and nonce
    /// come from `crypto_info`.
    fn aead_seal(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let mut buffer = Vec::with_capacity(plaintext.len() + crypto_info.aead_id().n_tag());
        buffer.extend_from_slice(plaintext);
        self.aead_seal_in_place(crypto_info, aad, &mut buffer)?;
        Ok(buffer)
    }

    /// In-place [`aead_seal`](Crypto::aead_seal): `buffer` goes in as the
    /// plaintext and comes out as `ct || tag`.
    fn aead_seal_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError>;

    /// `Open(key, nonce, aad, ct)` for `ct || tag`.
    fn aead_open(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let mut buffer = ciphertext.to_vec();
        self.aead_open_in_place(crypto_info, aad, &mut buffer)?;
        Ok(buffer)
    }

    /// In-place [`aead_open`](Crypto::aead_open): `buffer` is truncated to
    /// the plaintext on success.
    ///
    /// The tag must be checked in constant time, and a mismatch reported as
    /// [`CryptoError::AeadOpen`].
    fn aead_open_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError>;

    /// Wraps `sk` as a private key of `alg`.
    ///
    /// Fails with [`CryptoError::KemMalformedSkX`] if `sk` is not a valid
    /// scalar: zero or not below the group order on the NIST curves. This is
    /// the acceptance test of the `DeriveKeyPair` rejection loop.
    fn sk(&self, alg: HpkeKemId, sk: &[u8]) -> Result<HpkePrivateKey, CryptoError>;

    /// `pk(skX)`.
    fn pk(&self, alg: HpkeKemId, sk: &HpkePrivateKey) -> Result<HpkePublicKey, CryptoError>;

    /// `DeserializePublicKey(pkXm)` with validation.
    ///
    /// On the NIST curves `pk` must be an uncompressed SEC1 point on the
    /// curve. Fails with [`CryptoError::KemMalformedPkX`] otherwise.
    fn pk_checked(&self, alg: HpkeKemId, pk: &[u8]) -> Result<HpkePublicKey, CryptoError>;

    /// `DH(skX, pkY)`, an `Ndh`-byte shared secret.
    ///
    /// An all-zero X25519 result is rejected with
    /// [`CryptoError::KemNonContributory`].
    fn dh(
        &self,
        alg: HpkeKemId,
        sk_x: &HpkePrivateKey,
        pk_y: &HpkePublicKey,
    ) -> Result<SharedSecret, CryptoError>;
}

/// Lets a boxed backend, including `Box<dyn Crypto>`, be used wherever a
/// backend is expected.
impl<T: Crypto + ?Sized> Crypto for Box<T> {
    fn secure_random_fill(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
        (**self).secure_random_fill(buf)
    }

    fn is_kem_supported(&self, alg: &HpkeKemId) -> bool {
        (**self).is_kem_supported(alg)
    }

    fn kem_generate_key_pair(&mut self, alg: HpkeKemId) -> Result<HpkeKeyPair, CryptoError> {
        (**self).kem_generate_key_pair(alg)
    }

    fn is_kdf_supported(&self, alg: &HpkeKdfId) -> bool {
        (**self).is_kdf_supported(alg)
    }

    fn kdf_extract(&self, alg: HpkeKdfId, salt: &[u8], ikm: &[u8]) -> Result<Prk, CryptoError> {
        (**self).kdf_extract(alg, salt, ikm)
    }

    fn kdf_extract_concated(
        &self,
        alg: HpkeKdfId,
        salt: &[u8],
        ikms: &[&[u8]],
    ) -> Result<Prk, CryptoError> {
        (**self).kdf_extract_concated(alg, salt, ikms)
    }

    fn kdf_expand(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        info: &[u8],
        l: usize,
    ) -> Result<Okm, CryptoError> {
        (**self).kdf_expand(alg, prk, info, l)
    }

    fn kdf_expand_multi_info(
        &self,
        alg: HpkeKdfId,
        prk: &[u8],
        infos: &[&[u8]],
        l: usize,
    ) -> Result<Okm, CryptoError> {
        (**self).kdf_expand_multi_info(alg, prk, infos, l)
    }

    fn is_aead_supported(&self, alg: &HpkeAeadId) -> bool {
        (**self).is_aead_supported(alg)
    }

    fn aead_seal_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError> {
        (**self).aead_seal_in_place(crypto_info, aad, buffer)
    }

    fn aead_open_in_place(
        &self,
        crypto_info: &HpkeAead,
        aad: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), CryptoError> {
        (**self).aead_open_in_place(crypto_info, aad, buffer)
    }

    fn sk(&self, alg: HpkeKemId, sk: &[u8]) -> Result<HpkePrivateKey, CryptoError> {
        (**self).sk(alg, sk)
    }

    fn pk(&self, alg: HpkeKemId, sk: &HpkePrivateKey) -> Result<HpkePublicKey, CryptoError> {
        (**self).pk(alg, sk)
    }

    fn pk_checked(&self, alg: HpkeKemId, pk: &[u8]) -> Result<HpkePublicKey, CryptoError> {
        (**self).pk_checked(alg, pk)
    }

    fn dh(
        &self,
        alg: HpkeKemId,
        sk_x: &HpkePrivateKey,
        pk_y: &HpkePublicKey,
    ) -> Result<SharedSecret, CryptoError> {
        (**self).dh(alg, sk_x, pk_y)
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors thrown by [`Crypto`] implementations.
pub enum CryptoError {
    /// `Expand()` failed: for HKDF-Expand, the PRK length MUST be at least
    /// `Nh` bytes.
    #[error("KDF expand: invalid PRK length")]
    KdfExpandInvalidPrkLen,

    /// `Expand()` failed: the requested output length MUST NOT exceed
    /// `255 * Nh`, and must fit the two-byte length prefix of
    /// `LabeledExpand`.
    #[error("KDF expand: invalid output length")]
    KdfExpandInvalidOutputLen,

    /// The KDF algorithm is unsupported by the crypto backend.
    #[error("KDF unsupported")]
    KdfUnsupported,

    /// No valid private key was found within 256 candidates derived from the
    /// input keying material.
    #[error("unable to derive keypair from seed")]
    KemDeriveKeyPair,

    /// The `skX` is malformed and cannot be used as a private key for the KEM.
    #[error("KEM malformed private key")]
    KemMalformedSkX,

    /// The `pkX` is malformed and cannot be used as a public key for the KEM.
    #[error("KEM malformed public key")]
    KemMalformedPkX,

    /// The Diffie-Hellman output is all zeros, i.e. the peer supplied a
    /// small-order point.
    #[error("KEM non-contributory Diffie-Hellman output")]
    KemNonContributory,

    /// The KEM algorithm is unsupported by the crypto backend.
    #[error("KEM unsupported")]
    KemUnsupported,

    /// Invalid key for the AEAD algorithm.
    #[error("AEAD invalid key")]
    AeadInvalidKey,

    /// Invalid nonce for the AEAD algorithm.
    #[error("AEAD invalid nonce")]
    AeadInvalidNonce,

    /// The cipher text `ct` is shorter than the tag.
    #[error("AEAD invalid cipher text")]
    AeadInvalidCt,

    /// Error sealing an AEAD cipher text.
    #[error("AEAD seal error")]
    AeadSeal,

    /// Authentication failed while opening an AEAD cipher text.
    #[error("AEAD open error")]
    AeadOpen,

    /// Unsupported AEAD algorithm, or an AEAD operation was attempted with
    /// the export-only identifier.
    #[error("AEAD unsupported")]
    AeadUnsupported,

    /// The random number generator failed.
    #[error("insufficient randomness")]
    InsufficientRandomness,

    /// An error from a third-party crypto library.
    #[error("crypto library error: {0}")]
    Custom(#[source] Box<dyn core::error::Error + Send + Sync + 'static>),
}

// === Algorithm Identifiers ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// A `ciphersuite` is a triple (KEM, KDF, AEAD) containing a choice of
/// algorithm for each primitive.
///
/// The fields are closed enums, so a constructed suite is always valid. Raw
/// identifiers are checked with [`HpkeCipherSuite::try_from_ids`].
pub struct HpkeCipherSuite {
    /// KEM algorithm identifier.
    pub kem_id: HpkeKemId,

    /// KDF algorithm identifier.
    pub kdf_id: HpkeKdfId,

    /// AEAD algorithm identifier.
    pub aead_id: HpkeAeadId,
}

impl HpkeCipherSuite {
    #[inline]
    /// Creates a new cipher suite.
    pub const fn new(kem_id: HpkeKemId, kdf_id: HpkeKdfId, aead_id: HpkeAeadId) -> Self {
        Self {
            kem_id,
            kdf_id,
            aead_id,
        }
    }

    /// Creates a cipher suite from the wire code points.
    ///
    /// # Errors
    ///
    /// [`UnknownAlgorithm`] naming the first identifier outside the RFC 9180
    /// registry.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hardhpke_crypto::{HpkeCipherSuite, HpkeKemId};
    /// let suite = HpkeCipherSuite::try_from_ids(0x0020, 0x0001, 0x0001).unwrap();
    /// assert_eq!(suite.kem_id, HpkeKemId::DHKEM_X25519_HKDF_SHA256);
    ///
    /// assert!(HpkeCipherSuite::try_from_ids(0x0021, 0x0001, 0x0001).is_err());
    /// ```
    pub const fn try_from_ids(kem_id: u16, kdf_id: u16, aead_id: u16) -> Result<Self, UnknownAlgorithm> {
        let kem_id = match HpkeKemId::try_from_int(kem_id) {
            Ok(id) => id,
            Err(e) => return Err(UnknownAlgorithm::Kem(e)),
        };
        let kdf_id = match HpkeKdfId::try_from_int(kdf_id) {
            Ok(id) => id,
            Err(e) => return Err(UnknownAlgorithm::Kdf(e)),
        };
        let aead_id = match HpkeAeadId::try_from_int(aead_id) {
            Ok(id) => id,
            Err(e) => return Err(UnknownAlgorithm::Aead(e)),
        };

        Ok(Self::new(kem_id, kdf_id, aead_id))
    }

    #[inline]
    /// Returns `true` if all three code points are individually valid.
    pub const fn is_valid_ids(kem_id: u16, kdf_id: u16, aead_id: u16) -> bool {
        Self::try_from_ids(kem_id, kdf_id, aead_id).is_ok()
    }

    /// The value of `suite_id` depends on where the KDF is used. If used
    /// inside a KEM algorithm, `suite_id` MUST start with "KEM" and identify
    /// this KEM algorithm; if used in the remainder of HPKE, it MUST start
    /// with "HPKE" and identify the entire ciphersuite in use:
    ///
    /// ```text
    /// suite_id = concat(
    ///   "HPKE",
    ///   I2OSP(kem_id, 2),
    ///   I2OSP(kdf_id, 2),
    ///   I2OSP(aead_id, 2)
    /// )
    /// ```
    ///
    /// See [RFC 9180, Section 5.1] for details.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hardhpke_crypto::{HpkeCipherSuite, HpkeKemId, HpkeKdfId, HpkeAeadId};
    /// let suite = HpkeCipherSuite {
    ///     kem_id: HpkeKemId::DHKEM_P256_HKDF_SHA256,
    ///     kdf_id: HpkeKdfId::HKDF_SHA256,
    ///     aead_id: HpkeAeadId::CHACHA20_POLY1305,
    /// };
    /// assert_eq!(suite.suite_id(), [72, 80, 75, 69, 0, 16, 0, 1, 0, 3]);
    /// ```
    ///
    /// [RFC 9180, Section 5.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1
    pub fn suite_id(&self) -> [u8; 10] {
        let mut suite_id = [0u8; 10];

        suite_id[0..4].copy_from_slice(b"HPKE");
        suite_id[4..6].copy_from_slice(&self.kem_id.to_array());
        suite_id[6..8].copy_from_slice(&self.kdf_id.to_array());
        suite_id[8..10].copy_from_slice(&self.aead_id.to_array());

        suite_id
    }
}

impl fmt::Display for HpkeCipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kem_id, self.kdf_id, self.aead_id)
    }
}

macro_rules! enum_builder {
    (
        type Error = $error:ident;
        #[repr($uint:ty)]
        $(#[$enum_meta:meta])*
        $vis:vis enum $name:ident
        {
            $(
                $(#[doc = $registry_comment:literal])*
                $registry_name:ident = $registry_value:literal
            ),+
            $(,)?
        }
    ) => {
        #[non_exhaustive]
        #[allow(clippy::upper_case_acronyms)]
        #[allow(non_camel_case_types)]
        #[derive(PartialEq, Eq, Hash, Clone, Copy)]
        #[repr($uint)]
        $(#[$enum_meta])*
        $vis enum $name {
            $(
                $(#[doc = $registry_comment])*
                $registry_name = $registry_value,
            )+
        }

        impl $name {
            /// All registered values, in code point order.
            $vis const ALL: &'static [Self] = &[$(Self::$registry_name),+];

            #[inline]
            /// Constructs an enum value from its integer representation.
            ///
            /// # Errors
            ///
            /// The value is not a registered code point.
            $vis const fn try_from_int(x: $uint) -> Result<Self, $error> {
                match x {
                    $(
                        $registry_value => Ok(Self::$registry_name),
                    )+
                    _ => Err($error(x)),
                }
            }

            #[inline]
            /// Returns the integer representation of this value.
            $vis const fn to_int(self) -> $uint {
                self as $uint
            }

            #[inline]
            /// Returns the big-endian byte representation of this value.
            $vis const fn to_array(self) -> [u8; core::mem::size_of::<$uint>()] {
                self.to_int().to_be_bytes()
            }

            #[inline]
            /// Returns the string representation of this value.
            $vis const fn as_str(&self) -> &'static str {
                match self {
                    $(
                        Self::$registry_name => stringify!($registry_name),
                    )+
                }
            }
        }

        impl From<$name> for $uint {
            fn from(value: $name) -> Self {
                value.to_int()
            }
        }

        impl TryFrom<$uint> for $name {
            type Error = $error;

            fn try_from(x: $uint) -> Result<Self, Self::Error> {
                Self::try_from_int(x)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.to_int().serialize(serializer)
            }
        }

        #[cfg(feature = "serde")]
        impl<'a> serde::Deserialize<'a> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'a>,
            {
                let v = <$uint>::deserialize(deserializer)?;

                Self::try_from(v).map_err(serde::de::Error::custom)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown HPKE KEM ID: {0:#06x}")]
/// An unknown KEM identifier.
pub struct UnknownHpkeKemId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown HPKE KDF ID: {0:#06x}")]
/// An unknown KDF identifier.
pub struct UnknownHpkeKdfId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown HPKE AEAD ID: {0:#06x}")]
/// An unknown AEAD identifier.
pub struct UnknownHpkeAeadId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
/// One of the three identifiers of a cipher suite is unknown.
pub enum UnknownAlgorithm {
    /// Unknown KEM.
    #[error(transparent)]
    Kem(#[from] UnknownHpkeKemId),

    /// Unknown KDF.
    #[error(transparent)]
    Kdf(#[from] UnknownHpkeKdfId),

    /// Unknown AEAD.
    #[error(transparent)]
    Aead(#[from] UnknownHpkeAeadId),
}

enum_builder!(
    type Error = UnknownHpkeKemId;

    #[repr(u16)]
    /// HPKE Key Encapsulation Mechanisms (KEMs) identifiers.
    ///
    /// See [RFC 9180, Section 7.1].
    ///
    /// [RFC 9180, Section 7.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.1
    pub enum HpkeKemId {
        /// DHKEM(P-256, HKDF-SHA256)
        DHKEM_P256_HKDF_SHA256 = 0x0010,

        /// DHKEM(P-384, HKDF-SHA384)
        DHKEM_P384_HKDF_SHA384 = 0x0011,

        /// DHKEM(P-521, HKDF-SHA512)
        DHKEM_P521_HKDF_SHA512 = 0x0012,

        /// DHKEM(X25519, HKDF-SHA256)
        DHKEM_X25519_HKDF_SHA256 = 0x0020,
    }
);

impl HpkeKemId {
    #[inline]
    /// Returns the KDF algorithm associated with the DHKEM.
    pub const fn kdf_id(&self) -> HpkeKdfId {
        match self {
            Self::DHKEM_P256_HKDF_SHA256 | Self::DHKEM_X25519_HKDF_SHA256 => HpkeKdfId::HKDF_SHA256,
            Self::DHKEM_P384_HKDF_SHA384 => HpkeKdfId::HKDF_SHA384,
            Self::DHKEM_P521_HKDF_SHA512 => HpkeKdfId::HKDF_SHA512,
        }
    }

    #[inline]
    /// The implicit `suite_id` value used within `LabeledExtract` and
    /// `LabeledExpand` inside the KEM:
    ///
    /// ```text
    /// suite_id = concat("KEM", I2OSP(kem_id, 2))
    /// ```
    ///
    /// See [RFC 9180, Section 4.1] for details.
    ///
    /// # Example
    ///
    /// ```
    /// # use hardhpke_crypto::HpkeKemId;
    /// assert_eq!(
    ///     HpkeKemId::DHKEM_P521_HKDF_SHA512.suite_id(),
    ///     [75, 69, 77, 0, 18]
    /// );
    /// ```
    ///
    /// [RFC 9180, Section 4.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-4.1
    pub fn suite_id(&self) -> [u8; 5] {
        let mut suite_id = [0u8; 5];

        suite_id[0..3].copy_from_slice(b"KEM");
        suite_id[3..5].copy_from_slice(&self.to_array());

        suite_id
    }

    #[inline]
    #[doc(alias = "SecretSize")]
    /// Returns the length in bytes of a KEM shared secret produced by this KEM
    /// (`Nsecret`).
    pub const fn n_secret(&self) -> usize {
        match self {
            Self::DHKEM_P256_HKDF_SHA256 => 32,
            Self::DHKEM_P384_HKDF_SHA384 => 48,
            Self::DHKEM_P521_HKDF_SHA512 => 64,
            Self::DHKEM_X25519_HKDF_SHA256 => 32,
        }
    }

    #[inline]
    #[doc(alias = "EncapsulationSize")]
    /// Returns the length in bytes of an encapsulated key produced by this KEM
    /// (`Nenc`).
    pub const fn n_enc(&self) -> usize {
        self.n_pk()
    }

    #[inline]
    #[doc(alias = "PublicKeySize")]
    /// Returns the length in bytes of an encoded public key for this KEM
    /// (`Npk`).
    pub const fn n_pk(&self) -> usize {
        match self {
            Self::DHKEM_P256_HKDF_SHA256 => 65,
            Self::DHKEM_P384_HKDF_SHA384 => 97,
            Self::DHKEM_P521_HKDF_SHA512 => 133,
            Self::DHKEM_X25519_HKDF_SHA256 => 32,
        }
    }

    #[inline]
    #[doc(alias = "PrivateKeySize")]
    /// Returns the length in bytes of an encoded private key for this KEM
    /// (`Nsk`).
    pub const fn n_sk(&self) -> usize {
        match self {
            Self::DHKEM_P256_HKDF_SHA256 => 32,
            Self::DHKEM_P384_HKDF_SHA384 => 48,
            Self::DHKEM_P521_HKDF_SHA512 => 66,
            Self::DHKEM_X25519_HKDF_SHA256 => 32,
        }
    }

    #[inline]
    /// Returns the mask applied to the first byte of each `DeriveKeyPair`
    /// candidate (`bitmask` in [RFC 9180, Section 7.1.3]).
    ///
    /// `None` for X25519, whose private keys need no rejection sampling.
    ///
    /// [RFC 9180, Section 7.1.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.1.3
    pub const fn candidate_bitmask(&self) -> Option<u8> {
        match self {
            Self::DHKEM_P256_HKDF_SHA256 => Some(0xFF),
            Self::DHKEM_P384_HKDF_SHA384 => Some(0xFF),
            Self::DHKEM_P521_HKDF_SHA512 => Some(0x01),
            Self::DHKEM_X25519_HKDF_SHA256 => None,
        }
    }
}

enum_builder!(
    type Error = UnknownHpkeKdfId;

    #[repr(u16)]
    /// HPKE Key Derivation Functions (KDFs) identifiers.
    ///
    /// See [RFC 9180, Section 7.2].
    ///
    /// [RFC 9180, Section 7.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.2
    pub enum HpkeKdfId {
        /// HKDF-SHA256
        HKDF_SHA256 = 0x0001,

        /// HKDF-SHA384
        HKDF_SHA384 = 0x0002,

        /// HKDF-SHA512
        HKDF_SHA512 = 0x0003,
    }
);

impl HpkeKdfId {
    #[inline]
    #[doc(alias = "ExtractSize")]
    /// Returns the length in bytes of the hash output for this KDF (`Nh`).
    pub const fn n_hash(&self) -> usize {
        match self {
            Self::HKDF_SHA256 => 32,
            Self::HKDF_SHA384 => 48,
            Self::HKDF_SHA512 => 64,
        }
    }
}

impl From<HpkeKemId> for HpkeKdfId {
    #[inline]
    fn from(kem: HpkeKemId) -> Self {
        kem.kdf_id()
    }
}

enum_builder!(
    type Error = UnknownHpkeAeadId;

    #[repr(u16)]
    /// HPKE Authenticated Encryption with Associated Data (AEAD) Functions
    /// identifiers.
    ///
    /// See [RFC 9180, Section 7.3].
    ///
    /// [RFC 9180, Section 7.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-7.3
    pub enum HpkeAeadId {
        /// AES-128-GCM
        AES_128_GCM = 0x0001,

        /// AES-256-GCM
        AES_256_GCM = 0x0002,

        /// ChaCha20Poly1305
        CHACHA20_POLY1305 = 0x0003,

        /// Export-only
        EXPORT_ONLY = 0xFFFF,
    }
);

impl HpkeAeadId {
    #[inline]
    #[doc(alias = "KeySize")]
    /// Returns the length in bytes of a key for this algorithm (`Nk`).
    pub const fn n_key(&self) -> usize {
        match self {
            Self::AES_128_GCM => 16,
            Self::AES_256_GCM => 32,
            Self::CHACHA20_POLY1305 => 32,
            Self::EXPORT_ONLY => 0,
        }
    }

    #[inline]
    #[doc(alias = "NonceSize")]
    /// Returns the length in bytes of a nonce for this algorithm (`Nn`).
    pub const fn n_nonce(&self) -> usize {
        match self {
            Self::AES_128_GCM => 12,
            Self::AES_256_GCM => 12,
            Self::CHACHA20_POLY1305 => 12,
            Self::EXPORT_ONLY => 0,
        }
    }

    #[inline]
    #[doc(alias = "Overhead")]
    /// Returns the length in bytes of the authentication tag for this
    /// algorithm (`Nt`).
    pub const fn n_tag(&self) -> usize {
        match self {
            Self::AES_128_GCM => 16,
            Self::AES_256_GCM => 16,
            Self::CHACHA20_POLY1305 => 16,
            Self::EXPORT_ONLY => 0,
        }
    }

    #[inline]
    /// Returns `true` for [`HpkeAeadId::EXPORT_ONLY`].
    pub const fn is_export_only(&self) -> bool {
        matches!(self, Self::EXPORT_ONLY)
    }

    #[inline]
    /// Returns the largest sequence number an encryption context may use
    /// with this AEAD, `min(2^(8 * Nn) - 1, 2^64 - 1)`.
    ///
    /// Zero for [`HpkeAeadId::EXPORT_ONLY`].
    pub const fn max_sequence(&self) -> u64 {
        let n_nonce = self.n_nonce();

        if n_nonce >= 8 {
            u64::MAX
        } else {
            (1u64 << (8 * n_nonce)) - 1
        }
    }

    /// Create the AEAD cryptographic material from the given key and nonce.
    ///
    /// Returns `None` if the AEAD algorithm is `EXPORT_ONLY`.
    ///
    /// # Errors
    ///
    /// Invalid key or nonce length.
    pub fn new_crypto_info(
        &self,
        key: &[u8],
        nonce: &[u8],
    ) -> Result<Option<HpkeAead>, CryptoError> {
        Ok(match self {
            Self::AES_128_GCM => Some(HpkeAead::Aes128Gcm {
                key: key
                    .try_into()
                    .map_err(|_| CryptoError::AeadInvalidKey)?,
                nonce: nonce
                    .try_into()
                    .map_err(|_| CryptoError::AeadInvalidNonce)?,
            }),
            Self::AES_256_GCM => Some(HpkeAead::Aes256Gcm {
                key: key
                    .try_into()
                    .map_err(|_| CryptoError::AeadInvalidKey)?,
                nonce: nonce
                    .try_into()
                    .map_err(|_| CryptoError::AeadInvalidNonce)?,
            }),
            Self::CHACHA20_POLY1305 => Some(HpkeAead::ChaCha20Poly1305 {
                key: key
                    .try_into()
                    .map_err(|_| CryptoError::AeadInvalidKey)?,
                nonce: nonce
                    .try_into()
                    .map_err(|_| CryptoError::AeadInvalidNonce)?,
            }),
            Self::EXPORT_ONLY => None,
        })
    }
}

// === Keys and byte strings ===

/// Maximum encoded public key length over all supported KEMs (P-521).
const MAX_PK_LEN: usize = 133;

macro_rules! impl_bytes {
    ($name:ty) => {
        impl AsRef<[u8]> for $name {
            #[inline]
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = [u8];

            #[inline]
            fn deref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

macro_rules! debug_hex {
    ($name:ty) => {
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&const_hex::encode(&*self.0).as_str())
                    .finish()
            }
        }
    };
}

macro_rules! debug_secret {
    ($name:ty) => {
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                #[cfg(feature = "hazmat")]
                {
                    f.debug_tuple(stringify!($name))
                        .field(&const_hex::encode(&*self.0).as_str())
                        .finish()
                }

                #[cfg(not(feature = "hazmat"))]
                {
                    f.debug_tuple(stringify!($name))
                        .finish_non_exhaustive()
                }
            }
        }
    };
}

#[derive(Debug)]
#[cfg_attr(feature = "hazmat", derive(Clone))]
/// A HPKE public/private key pair.
pub struct HpkeKeyPair {
    sk: HpkePrivateKey,
    pk: HpkePublicKey,
}

impl HpkeKeyPair {
    #[inline]
    /// Creates a new len-validated key pair of the given KEM algorithm.
    ///
    /// This does *not* validate the keys cryptographically, nor that `pk`
    /// belongs to `sk`. Usually one only needs this when implementing the
    /// [`Crypto`] trait.
    ///
    /// # Errors
    ///
    /// Returns an error if a key's length is invalid for the given KEM
    /// algorithm.
    pub fn new_unchecked(
        alg: HpkeKemId,
        sk: impl AsRef<[u8]>,
        pk: impl AsRef<[u8]>,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            sk: HpkePrivateKey::new(alg, sk.as_ref())?,
            pk: HpkePublicKey::new(alg, pk.as_ref())?,
        })
    }

    #[inline]
    /// Assembles a key pair from its halves.
    pub fn from_parts(sk: HpkePrivateKey, pk: HpkePublicKey) -> Self {
        Self { sk, pk }
    }

    #[inline]
    /// Returns the private key (skX).
    pub fn sk(&self) -> &HpkePrivateKey {
        &self.sk
    }

    #[inline]
    /// Returns the public key (pkX).
    pub fn pk(&self) -> &HpkePublicKey {
        &self.pk
    }

    #[inline]
    /// Splits the key pair into its private and public halves.
    pub fn into_parts(self) -> (HpkePrivateKey, HpkePublicKey) {
        (self.sk, self.pk)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// A HPKE public key (pkX) in its fixed-size encoding: uncompressed SEC1
/// points for the NIST curves, the raw u-coordinate for X25519.
pub struct HpkePublicKey(SmallVec<[u8; MAX_PK_LEN]>);

impl_bytes!(HpkePublicKey);
debug_hex!(HpkePublicKey);

impl HpkePublicKey {
    #[inline]
    /// Creates a new len-validated [`HpkePublicKey`] of the given KEM
    /// algorithm.
    ///
    /// This does *not* validate the public key cryptographically, see
    /// [`Crypto::pk_checked`].
    ///
    /// # Errors
    ///
    /// Returns an error if the public key's length is invalid for the given
    /// KEM algorithm.
    pub fn new(alg: HpkeKemId, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != alg.n_pk() {
            return Err(CryptoError::KemMalformedPkX);
        }

        Ok(Self(SmallVec::from_slice(bytes)))
    }

    #[inline]
    /// Returns an owned copy of the encoding.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

#[derive(Eq, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(feature = "hazmat", derive(Clone))]
/// A HPKE private key (skX) in its fixed-size big-endian scalar encoding.
///
/// Wiped on drop; compares in constant time.
pub struct HpkePrivateKey(Vec<u8>);

impl_bytes!(HpkePrivateKey);
debug_secret!(HpkePrivateKey);

impl PartialEq for HpkePrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl HpkePrivateKey {
    #[inline]
    /// Creates a new [`HpkePrivateKey`] of the given KEM algorithm.
    ///
    /// This does *not* validate the private key cryptographically, see
    /// [`Crypto::sk`].
    ///
    /// # Errors
    ///
    /// Returns an error if the private key's length is invalid for the given
    /// KEM algorithm.
    pub fn new(alg: HpkeKemId, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != alg.n_sk() {
            return Err(CryptoError::KemMalformedSkX);
        }

        Ok(Self(bytes.to_vec()))
    }
}

#[derive(PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
/// A secret produced by a Diffie-Hellman exchange or by the KEM.
///
/// Wiped on drop.
pub struct SharedSecret(Vec<u8>);

impl_bytes!(SharedSecret);
debug_secret!(SharedSecret);

impl SharedSecret {
    #[inline]
    /// Constructs a new [`SharedSecret`] by copying `bytes`.
    pub fn new(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    #[inline]
    /// Constructs a new [`SharedSecret`] from the output keying material
    /// (OKM).
    pub fn from_okm(mut okm: Okm) -> Self {
        Self(core::mem::take(&mut okm.0))
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// The encapsulated secret (`enc`) produced by the KEM, i.e. the serialized
/// ephemeral public key. This is the only KEM output sent over the wire.
pub struct EncapsulatedSecret(SmallVec<[u8; MAX_PK_LEN]>);

impl_bytes!(EncapsulatedSecret);
debug_hex!(EncapsulatedSecret);

impl EncapsulatedSecret {
    #[inline]
    /// Constructs a new [`EncapsulatedSecret`] received from the sender.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KemMalformedPkX`] if the length is not `Nenc` of `alg`.
    pub fn new(alg: HpkeKemId, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != alg.n_enc() {
            return Err(CryptoError::KemMalformedPkX);
        }

        Ok(Self(SmallVec::from_slice(bytes)))
    }

    #[inline]
    /// Constructs a new [`EncapsulatedSecret`] from the ephemeral public key
    /// (pkE).
    pub fn from_pk_e(pk: HpkePublicKey) -> Self {
        Self(pk.0)
    }

    #[inline]
    /// Returns an owned copy of the encoding.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

#[derive(PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
/// A pseudorandom key (PRK), the output of `Extract`.
///
/// Wiped on drop.
pub struct Prk(Vec<u8>);

impl_bytes!(Prk);
debug_secret!(Prk);

impl Prk {
    #[inline]
    /// Construct a new [`Prk`] directly with the given value.
    pub fn new_less_safe(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

#[derive(PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
/// The output keying material (OKM), the output of `Expand`.
///
/// Wiped on drop; copy it out with `to_vec()` when ownership of the bytes is
/// needed.
pub struct Okm(Vec<u8>);

impl_bytes!(Okm);
debug_secret!(Okm);

impl Okm {
    #[inline]
    /// Returns a zeroed [`Okm`] of `len` bytes for a backend to fill in.
    pub fn zeroed(len: usize) -> Self {
        Self(alloc::vec![0; len])
    }

    #[inline]
    /// Returns the buffer for a backend to fill in.
    pub fn as_mut_buffer(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

#[non_exhaustive]
#[cfg_attr(feature = "hazmat", derive(PartialEq, Eq, Clone))]
/// AEAD cryptographic material: key and nonce for a single AEAD operation,
/// or key and base nonce when held by an encryption context.
///
/// The key is wiped on drop.
pub enum HpkeAead {
    /// AES-128-GCM
    Aes128Gcm {
        /// The AEAD key.
        key: [u8; HpkeAeadId::AES_128_GCM.n_key()],

        /// The AEAD nonce.
        nonce: [u8; HpkeAeadId::AES_128_GCM.n_nonce()],
    },

    /// AES-256-GCM
    Aes256Gcm {
        /// The AEAD key.
        key: [u8; HpkeAeadId::AES_256_GCM.n_key()],

        /// The AEAD nonce.
        nonce: [u8; HpkeAeadId::AES_256_GCM.n_nonce()],
    },

    /// ChaCha20-Poly1305
    ChaCha20Poly1305 {
        /// The AEAD key.
        key: [u8; HpkeAeadId::CHACHA20_POLY1305.n_key()],

        /// The AEAD nonce.
        nonce: [u8; HpkeAeadId::CHACHA20_POLY1305.n_nonce()],
    },
}

impl fmt::Debug for HpkeAead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HpkeAead")
            .field("aead_id", &self.aead_id())
            .field("nonce", &const_hex::encode(self.nonce()).as_str())
            .finish_non_exhaustive()
    }
}

impl HpkeAead {
    #[inline]
    /// Returns the AEAD algorithm identifier for this cryptographic material.
    pub const fn aead_id(&self) -> HpkeAeadId {
        match self {
            Self::Aes128Gcm { .. } => HpkeAeadId::AES_128_GCM,
            Self::Aes256Gcm { .. } => HpkeAeadId::AES_256_GCM,
            Self::ChaCha20Poly1305 { .. } => HpkeAeadId::CHACHA20_POLY1305,
        }
    }

    /// Copies the AEAD cryptographic material, updating the nonce of the copy
    /// with the given function.
    ///
    /// The original keeps its base nonce; the copy is wiped when dropped.
    pub fn copied_updating_nonce<F>(&self, update_nonce_f: F) -> Self
    where
        F: FnOnce(&mut [u8]),
    {
        match self {
            Self::Aes128Gcm { key, nonce } => {
                let mut nonce = *nonce;

                update_nonce_f(&mut nonce);

                Self::Aes128Gcm { key: *key, nonce }
            }
            Self::Aes256Gcm { key, nonce } => {
                let mut nonce = *nonce;

                update_nonce_f(&mut nonce);

                Self::Aes256Gcm { key: *key, nonce }
            }
            Self::ChaCha20Poly1305 { key, nonce } => {
                let mut nonce = *nonce;

                update_nonce_f(&mut nonce);

                Self::ChaCha20Poly1305 { key: *key, nonce }
            }
        }
    }

    #[inline]
    /// Returns the AEAD key.
    pub const fn key(&self) -> &[u8] {
        match self {
            Self::Aes128Gcm { key, .. } => key,
            Self::Aes256Gcm { key, .. } => key,
            Self::ChaCha20Poly1305 { key, .. } => key,
        }
    }

    #[inline]
    /// Returns the AEAD nonce.
    pub const fn nonce(&self) -> &[u8] {
        match self {
            Self::Aes128Gcm { nonce, .. } => nonce,
            Self::Aes256Gcm { nonce, .. } => nonce,
            Self::ChaCha20Poly1305 { nonce, .. } => nonce,
        }
    }
}

impl Zeroize for HpkeAead {
    fn zeroize(&mut self) {
        match self {
            Self::Aes128Gcm { key, nonce } => {
                key.zeroize();
                nonce.zeroize();
            }
            Self::Aes256Gcm { key, nonce } => {
                key.zeroize();
                nonce.zeroize();
            }
            Self::ChaCha20Poly1305 { key, nonce } => {
                key.zeroize();
                nonce.zeroize();
            }
        }
    }
}

impl Drop for HpkeAead {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for HpkeAead {}
