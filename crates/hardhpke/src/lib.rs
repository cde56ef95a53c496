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
#![allow(clippy::must_use_candidate)]

pub mod context;
pub mod error;
pub mod kem;
pub mod setup;
#[cfg(any(test, feature = "test-vectors"))]
pub mod test_vectors;

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

pub use hardhpke_crypto::*;

pub use crate::context::{Context, ContextRole, Opener, RecipientRole, Sealer, SenderRole};
pub use crate::error::Error;
pub use crate::setup::{Receiver, Sender};

/// Upper bound on the length of `info`, `psk`, `psk_id` and the exporter
/// context.
///
/// RFC 9180 only requires support for 64 bytes; longer inputs are rejected
/// instead of being hashed.
pub const MAX_INPUT_LEN: usize = 64;

/// A HPKE cipher suite bound to a crypto backend type.
///
/// `Suite` holds no secrets and no backend instance: it is freely copied and
/// shared between threads, and hands out [`Sender`]s and [`Receiver`]s.
pub struct Suite<C> {
    /// The HPKE ciphersuite in use.
    cipher_suite: HpkeCipherSuite,

    /// The crypto backend.
    _crypto_backend: PhantomData<fn() -> C>,
}

impl<C> Clone for Suite<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Suite<C> {}

impl<C> fmt::Debug for Suite<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("cipher_suite", &self.cipher_suite)
            .finish()
    }
}

impl<C: Crypto> Suite<C> {
    /// Create a new HPKE configuration with the given ciphersuite.
    pub const fn new(cipher_suite: HpkeCipherSuite) -> Self {
        Self {
            cipher_suite,
            _crypto_backend: PhantomData,
        }
    }

    /// Create a new HPKE configuration from raw IANA identifiers.
    ///
    /// # Errors
    ///
    /// [`UnknownAlgorithm`] if any of the identifiers is not supported.
    pub fn from_ids(kem_id: u16, kdf_id: u16, aead_id: u16) -> Result<Self, UnknownAlgorithm> {
        HpkeCipherSuite::try_from_ids(kem_id, kdf_id, aead_id).map(Self::new)
    }

    /// The HPKE ciphersuite in use.
    pub const fn cipher_suite(&self) -> HpkeCipherSuite {
        self.cipher_suite
    }

    /// `suite_id = concat("HPKE", I2OSP(kem_id, 2), I2OSP(kdf_id, 2),
    /// I2OSP(aead_id, 2))`
    pub fn suite_id(&self) -> [u8; 10] {
        self.cipher_suite.suite_id()
    }

    /// `LabeledExtract(salt, label, ikm)` under this suite's `suite_id`.
    ///
    /// # Errors
    ///
    /// See [`kdf::labeled_extract`].
    pub fn labeled_extract(
        &self,
        crypto_backend: &C,
        salt: &[u8],
        label: &str,
        ikm: &[u8],
    ) -> Result<Prk, Error> {
        kdf::labeled_extract(
            crypto_backend,
            self.cipher_suite.kdf_id,
            &self.suite_id(),
            salt,
            label,
            ikm,
        )
        .map_err(Into::into)
    }

    /// `LabeledExpand(prk, label, info, L)` under this suite's `suite_id`.
    ///
    /// # Errors
    ///
    /// See [`kdf::labeled_expand`].
    pub fn labeled_expand(
        &self,
        crypto_backend: &C,
        prk: &[u8],
        label: &str,
        info: &[u8],
        len: usize,
    ) -> Result<Okm, Error> {
        kdf::labeled_expand(
            crypto_backend,
            self.cipher_suite.kdf_id,
            &self.suite_id(),
            prk,
            label,
            info,
            len,
        )
        .map_err(Into::into)
    }

    /// Binds this suite to the recipient public key `pk_r` and the
    /// application supplied `info`.
    ///
    /// # Errors
    ///
    /// - [`Error::InputTooLong`] if `info` is longer than [`MAX_INPUT_LEN`].
    /// - [`Error::Deserialization`] if `pk_r` is not a public key of this
    ///   suite's KEM.
    pub fn sender<'a>(
        &self,
        pk_r: &'a HpkePublicKey,
        info: &'a [u8],
    ) -> Result<Sender<'a, C>, Error> {
        check_input_len("info", info)?;

        if pk_r.len() != self.cipher_suite.kem_id.n_pk() {
            return Err(Error::Deserialization(CryptoError::KemMalformedPkX));
        }

        Ok(Sender::new(*self, pk_r, info))
    }

    /// Binds this suite to the recipient private key `sk_r` and the
    /// application supplied `info`.
    ///
    /// # Errors
    ///
    /// - [`Error::InputTooLong`] if `info` is longer than [`MAX_INPUT_LEN`].
    /// - [`Error::Deserialization`] if `sk_r` is not a private key of this
    ///   suite's KEM.
    pub fn receiver<'a>(
        &self,
        sk_r: &'a HpkePrivateKey,
        info: &'a [u8],
    ) -> Result<Receiver<'a, C>, Error> {
        check_input_len("info", info)?;

        if sk_r.len() != self.cipher_suite.kem_id.n_sk() {
            return Err(Error::Deserialization(CryptoError::KemMalformedSkX));
        }

        Ok(Receiver::new(*self, sk_r, info))
    }

    #[allow(clippy::too_many_arguments)]
    /// 6.1. Encryption and Decryption
    ///
    /// Sets up a sender context and seals a single message with it.
    ///
    /// ```text
    /// def Seal<MODE>(pkR, info, aad, pt, ...):
    ///   enc, ctx = Setup<MODE>S(pkR, info, ...)
    ///   ct = ctx.Seal(aad, pt)
    ///   return enc, ct
    /// ```
    ///
    /// See [RFC 9180, Section 6.1] for details.
    ///
    /// # Errors
    ///
    /// See [`Sender::setup`] and [`Context::seal`].
    ///
    /// [RFC 9180, Section 6.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-6.1
    pub fn seal_single_shot(
        &self,
        crypto_backend: C,
        mode: HpkeMode,
        pk_r: &HpkePublicKey,
        info: &[u8],
        aad: &[u8],
        pt: &[u8],
        psk: Option<&[u8]>,
        psk_id: Option<&[u8]>,
        sk_s: Option<&HpkePrivateKey>,
    ) -> Result<(EncapsulatedSecret, Vec<u8>), Error> {
        let (enc, context) =
            self.sender(pk_r, info)?
                .setup(crypto_backend, mode, psk, psk_id, sk_s)?;

        let ct = context.seal(aad, pt)?;

        Ok((enc, ct))
    }

    #[allow(clippy::too_many_arguments)]
    /// 6.1. Encryption and Decryption
    ///
    /// Sets up a recipient context and opens a single message with it.
    ///
    /// ```text
    /// def Open<MODE>(enc, skR, info, aad, ct, ...):
    ///   ctx = Setup<MODE>R(enc, skR, info, ...)
    ///   return ctx.Open(aad, ct)
    /// ```
    ///
    /// See [RFC 9180, Section 6.1] for details.
    ///
    /// # Errors
    ///
    /// See [`Receiver::setup`] and [`Context::open`].
    ///
    /// [RFC 9180, Section 6.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-6.1
    pub fn open_single_shot(
        &self,
        crypto_backend: C,
        mode: HpkeMode,
        enc: &EncapsulatedSecret,
        sk_r: &HpkePrivateKey,
        info: &[u8],
        aad: &[u8],
        ct: &[u8],
        psk: Option<&[u8]>,
        psk_id: Option<&[u8]>,
        pk_s: Option<&HpkePublicKey>,
    ) -> Result<Vec<u8>, Error> {
        self.receiver(sk_r, info)?
            .setup(crypto_backend, mode, enc, psk, psk_id, pk_s)?
            .open(aad, ct)
    }

    #[allow(clippy::too_many_arguments)]
    /// 6.2. Secret Export
    ///
    /// ```text
    /// def SendExport<MODE>(pkR, info, exporter_context, L, ...):
    ///   enc, ctx = Setup<MODE>S(pkR, info, ...)
    ///   exported = ctx.Export(exporter_context, L)
    ///   return enc, exported
    /// ```
    ///
    /// See [RFC 9180, Section 6.2] for details.
    ///
    /// # Errors
    ///
    /// See [`Sender::setup`] and [`Context::export`].
    ///
    /// [RFC 9180, Section 6.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-6.2
    pub fn send_export(
        &self,
        crypto_backend: C,
        mode: HpkeMode,
        pk_r: &HpkePublicKey,
        info: &[u8],
        exporter_context: &[u8],
        len: usize,
        psk: Option<&[u8]>,
        psk_id: Option<&[u8]>,
        sk_s: Option<&HpkePrivateKey>,
    ) -> Result<(EncapsulatedSecret, Okm), Error> {
        let (enc, context) =
            self.sender(pk_r, info)?
                .setup(crypto_backend, mode, psk, psk_id, sk_s)?;

        let exported = context.export(exporter_context, len)?;

        Ok((enc, exported))
    }

    #[allow(clippy::too_many_arguments)]
    /// 6.2. Secret Export
    ///
    /// ```text
    /// def ReceiveExport<MODE>(enc, skR, info, exporter_context, L, ...):
    ///   ctx = Setup<MODE>R(enc, skR, info, ...)
    ///   return ctx.Export(exporter_context, L)
    /// ```
    ///
    /// See [RFC 9180, Section 6.2] for details.
    ///
    /// # Errors
    ///
    /// See [`Receiver::setup`] and [`Context::export`].
    ///
    /// [RFC 9180, Section 6.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-6.2
    pub fn receive_export(
        &self,
        crypto_backend: C,
        mode: HpkeMode,
        enc: &EncapsulatedSecret,
        sk_r: &HpkePrivateKey,
        info: &[u8],
        exporter_context: &[u8],
        len: usize,
        psk: Option<&[u8]>,
        psk_id: Option<&[u8]>,
        pk_s: Option<&HpkePublicKey>,
    ) -> Result<Okm, Error> {
        self.receiver(sk_r, info)?
            .setup(crypto_backend, mode, enc, psk, psk_id, pk_s)?
            .export(exporter_context, len)
    }

    /// Checks the backend implements every algorithm of this suite.
    pub(crate) fn check_backend(&self, crypto_backend: &C) -> Result<(), Error> {
        if !crypto_backend.is_kem_supported(&self.cipher_suite.kem_id) {
            return Err(CryptoError::KemUnsupported.into());
        }

        if !crypto_backend.is_kdf_supported(&self.cipher_suite.kdf_id) {
            return Err(CryptoError::KdfUnsupported.into());
        }

        if !crypto_backend.is_aead_supported(&self.cipher_suite.aead_id) {
            return Err(CryptoError::AeadUnsupported.into());
        }

        Ok(())
    }

    /// Everything `KeySchedule` rejects without touching a secret. Called by
    /// the setup functions before the KEM runs.
    pub(crate) fn verify_key_schedule_inputs(
        mode: HpkeMode,
        info: &[u8],
        psk: &[u8],
        psk_id: &[u8],
    ) -> Result<(), Error> {
        Self::verify_psk_inputs(mode, psk, psk_id)?;

        check_input_len("info", info)?;
        check_input_len("psk", psk)?;
        check_input_len("psk_id", psk_id)?;

        Ok(())
    }

    /// ```text
    /// def VerifyPSKInputs(mode, psk, psk_id):
    ///   got_psk = (psk != default_psk)
    ///   got_psk_id = (psk_id != default_psk_id)
    ///   if got_psk != got_psk_id:
    ///     raise Exception("Inconsistent PSK inputs")
    ///
    ///   if got_psk and (mode in [mode_base, mode_auth]):
    ///     raise Exception("PSK input provided when not needed")
    ///   if (not got_psk) and (mode in [mode_psk, mode_auth_psk]):
    ///     raise Exception("Missing required PSK input")
    /// ```
    const fn verify_psk_inputs(mode: HpkeMode, psk: &[u8], psk_id: &[u8]) -> Result<(), Error> {
        let got_psk = !psk.is_empty();
        let got_psk_id = !psk_id.is_empty();

        if got_psk != got_psk_id {
            return Err(Error::InconsistentPsk);
        }

        if got_psk && matches!(mode, HpkeMode::Base | HpkeMode::Auth) {
            return Err(Error::UnnecessaryPsk);
        }

        if !got_psk && matches!(mode, HpkeMode::Psk | HpkeMode::AuthPsk) {
            return Err(Error::MissingPsk);
        }

        Ok(())
    }

    /// ```text
    /// def KeySchedule<ROLE>(mode, shared_secret, info, psk, psk_id):
    ///   // ...
    ///
    ///   psk_id_hash = LabeledExtract("", "psk_id_hash", psk_id)
    ///   info_hash = LabeledExtract("", "info_hash", info)
    ///   key_schedule_context = concat(mode, psk_id_hash, info_hash)
    ///
    ///   // ...
    /// ```
    fn key_schedule_context(
        &self,
        crypto_backend: &C,
        mode: HpkeMode,
        info: &[u8],
        psk_id: &[u8],
    ) -> Result<Vec<u8>, Error> {
        // psk_id_hash = LabeledExtract("", "psk_id_hash", psk_id)
        let psk_id_hash = self.labeled_extract(crypto_backend, &[], "psk_id_hash", psk_id)?;

        // info_hash = LabeledExtract("", "info_hash", info)
        let info_hash = self.labeled_extract(crypto_backend, &[], "info_hash", info)?;

        // key_schedule_context = concat(mode, psk_id_hash, info_hash)
        Ok([&[mode as u8][..], &*psk_id_hash, &*info_hash].concat())
    }

    /// ```text
    /// def KeySchedule<ROLE>(mode, shared_secret, info, psk, psk_id):
    ///   // ...
    ///
    ///   secret = LabeledExtract(shared_secret, "secret", psk)
    ///
    ///   // ...
    /// ```
    fn key_schedule_secret(
        &self,
        crypto_backend: &C,
        shared_secret: &[u8],
        psk: &[u8],
    ) -> Result<Prk, Error> {
        self.labeled_extract(crypto_backend, shared_secret, "secret", psk)
    }

    /// ```text
    /// def KeySchedule<ROLE>(mode, shared_secret, info, psk, psk_id):
    ///   VerifyPSKInputs(mode, psk, psk_id)
    ///
    ///   psk_id_hash = LabeledExtract("", "psk_id_hash", psk_id)
    ///   info_hash = LabeledExtract("", "info_hash", info)
    ///   key_schedule_context = concat(mode, psk_id_hash, info_hash)
    ///
    ///   secret = LabeledExtract(shared_secret, "secret", psk)
    ///
    ///   key = LabeledExpand(secret, "key", key_schedule_context, Nk)
    ///   base_nonce = LabeledExpand(secret, "base_nonce",
    ///                              key_schedule_context, Nn)
    ///   exporter_secret = LabeledExpand(secret, "exp",
    ///                                   key_schedule_context, Nh)
    ///
    ///   return Context<ROLE>(key, base_nonce, 0, exporter_secret)
    /// ```
    ///
    /// For the export-only AEAD neither `key` nor `base_nonce` is derived.
    pub(crate) fn key_schedule<R: ContextRole>(
        &self,
        crypto_backend: C,
        mode: HpkeMode,
        shared_secret: &[u8],
        info: &[u8],
        psk: &[u8],
        psk_id: &[u8],
    ) -> Result<Context<C, R>, Error> {
        Self::verify_key_schedule_inputs(mode, info, psk, psk_id)?;

        if !psk.is_empty() && psk.len() < 32 {
            // RFC 9180, Section 9.5: the PSK MUST have at least 32 bytes of
            // entropy.
            tracing::warn!(psk_len = psk.len(), "PSK is shorter than 32 bytes");
        }

        let key_schedule_context =
            self.key_schedule_context(&crypto_backend, mode, info, psk_id)?;

        let secret = self.key_schedule_secret(&crypto_backend, shared_secret, psk)?;

        let aead_id = self.cipher_suite.aead_id;
        let aead = if aead_id.is_export_only() {
            None
        } else {
            // key = LabeledExpand(secret, "key", key_schedule_context, Nk)
            let key = self.labeled_expand(
                &crypto_backend,
                &secret,
                "key",
                &key_schedule_context,
                aead_id.n_key(),
            )?;

            // base_nonce = LabeledExpand(secret, "base_nonce", key_schedule_context, Nn)
            let base_nonce = self.labeled_expand(
                &crypto_backend,
                &secret,
                "base_nonce",
                &key_schedule_context,
                aead_id.n_nonce(),
            )?;

            aead_id.new_crypto_info(&key, &base_nonce)?
        };

        // exporter_secret = LabeledExpand(secret, "exp", key_schedule_context, Nh)
        let exporter_secret = self.labeled_expand(
            &crypto_backend,
            &secret,
            "exp",
            &key_schedule_context,
            self.cipher_suite.kdf_id.n_hash(),
        )?;

        tracing::debug!(
            role = R::NAME,
            mode = ?mode,
            cipher_suite = %self.cipher_suite,
            "HPKE context established"
        );

        Ok(Context::new(
            self.cipher_suite,
            aead,
            exporter_secret,
            crypto_backend,
        ))
    }
}

pub(crate) fn check_input_len(what: &'static str, input: &[u8]) -> Result<(), Error> {
    if input.len() > MAX_INPUT_LEN {
        return Err(Error::InputTooLong {
            what,
            len: input.len(),
            max: MAX_INPUT_LEN,
        });
    }

    Ok(())
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The HPKE mode.
///
/// | Mode | Value |
/// |:-:|:-:|
/// | base | 0x00 |
/// | psk  | 0x01 |
/// | auth | 0x02 |
/// | auth_psk | 0x03 |
pub enum HpkeMode {
    /// Base mode.
    Base = 0x00,

    /// PSK mode.
    Psk = 0x01,

    /// Authenticated mode.
    Auth = 0x02,

    /// Authenticated PSK mode.
    AuthPsk = 0x03,
}

impl HpkeMode {
    /// All modes, in code point order.
    pub const ALL: [Self; 4] = [Self::Base, Self::Psk, Self::Auth, Self::AuthPsk];

    #[inline]
    /// Try to convert a `u8` into an `HpkeMode`.
    ///
    /// # Errors
    ///
    /// [`UnknownHpkeMode`] if the value does not correspond to a known mode.
    pub const fn try_from(value: u8) -> Result<Self, UnknownHpkeMode> {
        match value {
            v if v == Self::Base as u8 => Ok(Self::Base),
            v if v == Self::Psk as u8 => Ok(Self::Psk),
            v if v == Self::Auth as u8 => Ok(Self::Auth),
            v if v == Self::AuthPsk as u8 => Ok(Self::AuthPsk),
            other => Err(UnknownHpkeMode(other)),
        }
    }

    #[inline]
    /// Whether the mode authenticates the sender with a static key pair.
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth | Self::AuthPsk)
    }

    #[inline]
    /// Whether the mode requires a pre-shared key.
    pub const fn is_psk(&self) -> bool {
        matches!(self, Self::Psk | Self::AuthPsk)
    }
}

impl TryFrom<u8> for HpkeMode {
    type Error = UnknownHpkeMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(value)
    }
}

impl From<HpkeMode> for u8 {
    fn from(mode: HpkeMode) -> Self {
        mode as u8
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HpkeMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HpkeMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        HpkeMode::try_from(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown HPKE mode: {0}")]
/// Error indicating an unknown HPKE mode.
pub struct UnknownHpkeMode(pub u8);
