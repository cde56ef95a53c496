//! The HPKE encryption context, see [RFC 9180, Section 5.2].
//!
//! [RFC 9180, Section 5.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.2

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU64, Ordering};

use hardhpke_crypto::{kdf, Crypto, CryptoError, HpkeAead, HpkeCipherSuite, Okm};
use zeroize::Zeroize;

use crate::error::Error;
use crate::check_input_len;

mod sealed {
    pub trait Sealed {}
}

/// Marker trait for the role a [`Context`] plays.
pub trait ContextRole: sealed::Sealed {
    /// Name of the role, as logged.
    const NAME: &'static str;
}

#[derive(Debug)]
/// Marker type for [`Context`] that indicates the `sender` role.
pub struct SenderRole;

#[derive(Debug)]
/// Marker type for [`Context`] that indicates the `recipient` role.
pub struct RecipientRole;

impl sealed::Sealed for SenderRole {}
impl sealed::Sealed for RecipientRole {}

impl ContextRole for SenderRole {
    const NAME: &'static str = "sender";
}

impl ContextRole for RecipientRole {
    const NAME: &'static str = "recipient";
}

/// The sender's context, which can [`seal`](Context::seal) messages.
pub type Sealer<C> = Context<C, SenderRole>;

/// The recipient's context, which can [`open`](Context::open) messages.
pub type Opener<C> = Context<C, RecipientRole>;

/// The HPKE cryptographic context.
///
/// HPKE allows multiple encryption operations to be done based on a given
/// setup transaction. Since the public key operations involved in setup are
/// typically more expensive than symmetric encryption or decryption, this
/// allows applications to amortize the cost of the public key operations,
/// reducing the overall overhead.
///
/// In order to avoid nonce reuse, however, this encryption must be stateful.
/// Each of the setup procedures produces a role-specific context object
/// that stores the AEAD and secret export parameters. The AEAD parameters
/// consist of:
///
/// - The AEAD algorithm in use
/// - A secret `key`
/// - A base nonce `base_nonce`
/// - A sequence number (initially 0)
///
/// The secret export parameters consist of:
///
/// - The HPKE ciphersuite in use and
/// - An `exporter_secret` used for the secret export interface (see [RFC 9180,
///   Section 5.3])
///
/// The sequence number is atomic: a context may be shared between threads
/// (e.g. behind an `Arc`) and no two messages are ever sealed under the same
/// nonce. Once the sequence number reaches
/// [`HpkeAeadId::max_sequence`](hardhpke_crypto::HpkeAeadId::max_sequence)
/// the context refuses to seal or open; export keeps working.
///
/// [RFC 9180, Section 5.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.3
pub struct Context<C, R> {
    /// The HPKE `ciphersuite` in use.
    cipher_suite: HpkeCipherSuite,

    /// The AEAD algorithm, secret `key` and `base_nonce`.
    ///
    /// The only way to get `None` here is to use an export-only AEAD.
    aead: Option<HpkeAead>,

    /// The sequence number.
    seq: AtomicU64,

    /// The exporter secret.
    exporter_secret: Okm,

    /// The crypto backend.
    crypto_backend: C,

    /// The role marker.
    _role: PhantomData<fn() -> R>,
}

impl<C, R: ContextRole> fmt::Debug for Context<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("role", &R::NAME)
            .field("cipher_suite", &self.cipher_suite)
            .field("seq", &self.seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<C: Crypto> Context<C, SenderRole> {
    /// See [`seal_in_place`](Self::seal_in_place).
    ///
    /// # Errors
    ///
    /// See [`seal_in_place`](Self::seal_in_place).
    pub fn seal(&self, aad: &[u8], pt: &[u8]) -> Result<Vec<u8>, Error> {
        let n_tag = self.cipher_suite.aead_id.n_tag();
        let mut in_out = Vec::with_capacity(pt.len() + n_tag);
        in_out.extend_from_slice(pt);

        self.seal_in_place(aad, &mut in_out)?;

        Ok(in_out)
    }

    /// 5.2. Encryption and Decryption
    ///
    /// Encryption is unidirectional from sender to recipient. The sender's
    /// context can encrypt a plaintext `pt` with associated data `aad` as
    /// follows:
    ///
    /// ```text
    /// def Context.Seal(aad, pt):
    ///   ct = Seal(self.key, self.ComputeNonce(self.seq), aad, pt)
    ///   self.IncrementSeq()
    ///   return ct
    /// ```
    ///
    /// The sequence number is reserved before encrypting, so concurrent
    /// callers always use distinct nonces.
    ///
    /// See [RFC 9180, Section 5.2] for details.
    ///
    /// # Errors
    ///
    /// - [`Error::ExportOnly`] for the export-only AEAD.
    /// - [`Error::MessageLimitReached`] once the sequence number is
    ///   exhausted; nothing is encrypted.
    /// - [`Error::Crypto`] if the AEAD fails.
    ///
    /// [RFC 9180, Section 5.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.2
    pub fn seal_in_place(&self, aad: &[u8], in_out: &mut Vec<u8>) -> Result<(), Error> {
        let aead = self.aead.as_ref().ok_or(Error::ExportOnly)?;

        let seq = self.reserve_seq()?;

        self.crypto_backend.aead_seal_in_place(
            &aead.copied_updating_nonce(|base_nonce| compute_nonce(base_nonce, seq)),
            aad,
            in_out,
        )?;

        Ok(())
    }

    /// `IncrementSeq()`, done up front: returns the sequence number to seal
    /// with and advances it.
    ///
    /// ```text
    /// def Context<ROLE>.IncrementSeq():
    ///   if self.seq >= (1 << (8*Nn)) - 1:
    ///     raise MessageLimitReached
    ///   self.seq += 1
    /// ```
    fn reserve_seq(&self) -> Result<u64, Error> {
        let max = self.cipher_suite.aead_id.max_sequence();

        self.seq
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |seq| {
                (seq < max).then(|| seq + 1)
            })
            .map_err(|seq| {
                tracing::warn!(seq, role = SenderRole::NAME, "HPKE message limit reached");
                Error::MessageLimitReached
            })
    }
}

impl<C: Crypto> Context<C, RecipientRole> {
    /// See [`open_in_place`](Self::open_in_place).
    ///
    /// # Errors
    ///
    /// See [`open_in_place`](Self::open_in_place).
    pub fn open(&self, aad: &[u8], ct: &[u8]) -> Result<Vec<u8>, Error> {
        let mut in_out = ct.to_vec();

        self.open_in_place(aad, &mut in_out)?;

        Ok(in_out)
    }

    /// 5.2. Encryption and Decryption
    ///
    /// The recipient's context can decrypt a ciphertext `ct` with associated
    /// data `aad` as follows:
    ///
    /// ```text
    /// def Context.Open(aad, ct):
    ///   pt = Open(self.key, self.ComputeNonce(self.seq), aad, ct)
    ///   if pt == OpenError:
    ///     raise OpenError
    ///   self.IncrementSeq()
    ///   return pt
    /// ```
    ///
    /// Once decryption has been attempted, any error wipes `in_out`. The
    /// sequence number only advances on success.
    ///
    /// See [RFC 9180, Section 5.2] for details.
    ///
    /// # Errors
    ///
    /// - [`Error::ExportOnly`] for the export-only AEAD.
    /// - [`Error::OpenFailed`] if the ciphertext does not authenticate.
    /// - [`Error::MessageLimitReached`] once the sequence number is
    ///   exhausted.
    /// - [`Error::SequenceConflict`] if another thread opened a message at
    ///   the same sequence number first.
    ///
    /// [RFC 9180, Section 5.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.2
    pub fn open_in_place(&self, aad: &[u8], in_out: &mut Vec<u8>) -> Result<(), Error> {
        let aead = self.aead.as_ref().ok_or(Error::ExportOnly)?;

        let seq = self.seq.load(Ordering::Acquire);

        if let Err(e) = self.crypto_backend.aead_open_in_place(
            &aead.copied_updating_nonce(|base_nonce| compute_nonce(base_nonce, seq)),
            aad,
            in_out,
        ) {
            in_out.zeroize();

            return Err(match e {
                CryptoError::AeadOpen | CryptoError::AeadInvalidCt => {
                    tracing::debug!(seq, "HPKE open failed");
                    Error::OpenFailed
                }
                e => Error::Crypto(e),
            });
        }

        // self.IncrementSeq()
        if seq >= self.cipher_suite.aead_id.max_sequence() {
            in_out.zeroize();

            tracing::warn!(seq, role = RecipientRole::NAME, "HPKE message limit reached");
            return Err(Error::MessageLimitReached);
        }

        if self
            .seq
            .compare_exchange(seq, seq + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            in_out.zeroize();

            return Err(Error::SequenceConflict);
        }

        Ok(())
    }
}

impl<C: Crypto, R> Context<C, R> {
    pub(crate) fn new(
        cipher_suite: HpkeCipherSuite,
        aead: Option<HpkeAead>,
        exporter_secret: Okm,
        crypto_backend: C,
    ) -> Self {
        Self {
            cipher_suite,
            aead,
            seq: AtomicU64::new(0),
            exporter_secret,
            crypto_backend,
            _role: PhantomData,
        }
    }

    /// 5.3. Secret Export
    ///
    /// Takes a serialised exporter context as byte slice and a length for the
    /// output secret and returns an exporter secret as byte vector.
    ///
    /// ```text
    /// def Context.Export(exporter_context, L):
    ///   return LabeledExpand(self.exporter_secret, "sec", exporter_context, L)
    /// ```
    ///
    /// See [RFC 9180, Section 5.3] for details.
    ///
    /// # Errors
    ///
    /// - [`Error::InputTooLong`] if `exporter_context` is longer than
    ///   [`MAX_INPUT_LEN`](crate::MAX_INPUT_LEN).
    /// - See [`kdf::labeled_expand`] for the limits on `length`.
    ///
    /// [RFC 9180, Section 5.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.3
    pub fn export(&self, exporter_context: &[u8], length: usize) -> Result<Okm, Error> {
        check_input_len("exporter_context", exporter_context)?;

        kdf::labeled_expand(
            &self.crypto_backend,
            self.cipher_suite.kdf_id,
            &self.cipher_suite.suite_id(),
            &self.exporter_secret,
            "sec",
            exporter_context,
            length,
        )
        .map_err(Into::into)
    }

    /// The sequence number the next message will use.
    pub fn sequence(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }

    /// The HPKE ciphersuite in use.
    pub const fn cipher_suite(&self) -> HpkeCipherSuite {
        self.cipher_suite
    }

    /// Whether this context was set up for the export-only AEAD, in which
    /// case only [`export`](Self::export) is available.
    pub const fn is_export_only(&self) -> bool {
        self.aead.is_none()
    }

    #[cfg(test)]
    pub(crate) fn aead(&self) -> Option<&HpkeAead> {
        self.aead.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn exporter_secret(&self) -> &[u8] {
        &self.exporter_secret
    }

    #[cfg(test)]
    pub(crate) fn set_sequence(&self, seq: u64) {
        self.seq.store(seq, Ordering::Release);
    }
}

#[inline]
/// ```text
/// def Context<ROLE>.ComputeNonce(seq):
///   seq_bytes = I2OSP(seq, Nn)
///   return xor(self.base_nonce, seq_bytes)
/// ```
///
/// Only the last 8 bytes of the nonce are touched.
pub(crate) fn compute_nonce(base_nonce: &mut [u8], seq: u64) {
    // I2OSP: `to_be_bytes` then left padded with zeros to length `Nn`
    // We just XOR the bytes from right to left.
    for (o, i) in base_nonce
        .iter_mut()
        .rev()
        .zip(seq.to_be_bytes().into_iter().rev())
    {
        *o ^= i;
    }
}
