//! Creating the encryption context, see [RFC 9180, Section 5.1].
//!
//! A [`Sender`] is bound to the recipient's public key and a [`Receiver`] to
//! the recipient's private key, both together with the application `info`.
//! Each of the four modes then has its own setup function, plus a generic
//! `setup` selecting among them at runtime.
//!
//! [RFC 9180, Section 5.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1

use core::fmt;

use hardhpke_crypto::{Crypto, EncapsulatedSecret, HpkePrivateKey, HpkePublicKey};

use crate::context::{Opener, RecipientRole, Sealer, SenderRole};
use crate::error::Error;
use crate::{kem, HpkeMode, Suite};

/// The sender side of an HPKE exchange.
///
/// Obtained from [`Suite::sender`].
pub struct Sender<'a, C> {
    suite: Suite<C>,
    pk_r: &'a HpkePublicKey,
    info: &'a [u8],
    ephemeral_seed: Option<&'a [u8]>,
}

impl<C> fmt::Debug for Sender<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("suite", &self.suite)
            .field("pk_r", self.pk_r)
            .field("deterministic", &self.ephemeral_seed.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, C: Crypto> Sender<'a, C> {
    pub(crate) const fn new(suite: Suite<C>, pk_r: &'a HpkePublicKey, info: &'a [u8]) -> Self {
        Self {
            suite,
            pk_r,
            info,
            ephemeral_seed: None,
        }
    }

    /// Derive the ephemeral key pair from `seed` (`Nsk` bytes) instead of
    /// drawing it from the backend's CSPRNG.
    ///
    /// Only meant for reproducing test vectors: every setup with the same
    /// seed reuses the same ephemeral key.
    pub const fn with_ephemeral_seed(mut self, seed: &'a [u8]) -> Self {
        self.ephemeral_seed = Some(seed);
        self
    }

    #[allow(clippy::too_many_arguments)]
    /// 5.1. Creating the Encryption Context
    ///
    /// This is a convenience function that wraps all four setup functions.
    /// `psk` and `psk_id` must be provided exactly in the PSK modes, `sk_s`
    /// exactly in the Auth modes.
    ///
    /// See [RFC 9180, Section 5.1] for details.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if an input the mode requires is missing, or
    ///   `sk_s` is given to a mode without sender authentication.
    /// - See the mode specific setup functions.
    ///
    /// [RFC 9180, Section 5.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1
    pub fn setup(
        &self,
        crypto_backend: C,
        mode: HpkeMode,
        psk: Option<&[u8]>,
        psk_id: Option<&[u8]>,
        sk_s: Option<&HpkePrivateKey>,
    ) -> Result<(EncapsulatedSecret, Sealer<C>), Error> {
        match mode {
            HpkeMode::Base | HpkeMode::Psk if sk_s.is_some() => Err(Error::InvalidInput(
                "sk_s is only accepted in Auth and AuthPsk mode",
            )),
            // Stray PSK inputs are reported by `VerifyPSKInputs()`.
            HpkeMode::Base => self.setup_inner(
                crypto_backend,
                mode,
                psk.unwrap_or_default(),
                psk_id.unwrap_or_default(),
                None,
            ),
            HpkeMode::Psk => self.setup_psk(
                crypto_backend,
                psk.ok_or(Error::InvalidInput("For PSK mode, must provide psk"))?,
                psk_id.ok_or(Error::InvalidInput("For PSK mode, must provide psk_id"))?,
            ),
            HpkeMode::Auth => self.setup_inner(
                crypto_backend,
                mode,
                psk.unwrap_or_default(),
                psk_id.unwrap_or_default(),
                Some(sk_s.ok_or(Error::InvalidInput("For Auth mode, must provide sk_s"))?),
            ),
            HpkeMode::AuthPsk => self.setup_auth_psk(
                crypto_backend,
                psk.ok_or(Error::InvalidInput("For AuthPsk mode, must provide psk"))?,
                psk_id.ok_or(Error::InvalidInput("For AuthPsk mode, must provide psk_id"))?,
                sk_s.ok_or(Error::InvalidInput("For AuthPsk mode, must provide sk_s"))?,
            ),
        }
    }

    /// 5.1.1. Encryption to a Public Key
    ///
    /// ```text
    /// def SetupBaseS(pkR, info):
    ///   shared_secret, enc = Encap(pkR)
    ///   return enc, KeyScheduleS(mode_base, shared_secret, info,
    ///                            default_psk, default_psk_id)
    /// ```
    ///
    /// See [RFC 9180, Section 5.1.1] for details.
    ///
    /// # Errors
    ///
    /// [`Error::Encap`] if the encapsulation fails, e.g. on a malformed `pkR`.
    ///
    /// [RFC 9180, Section 5.1.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1.1
    pub fn setup_base(&self, crypto_backend: C) -> Result<(EncapsulatedSecret, Sealer<C>), Error> {
        self.setup_inner(crypto_backend, HpkeMode::Base, &[], &[], None)
    }

    /// 5.1.2. Authentication Using a Pre-Shared Key
    ///
    /// The PSK MUST have at least 32 bytes of entropy and SHOULD be of length
    /// `Nh` bytes or longer. Shorter ones are accepted with a warning. See
    /// [RFC 9180, Section 9.5] for a more detailed discussion.
    ///
    /// ```text
    /// def SetupPSKS(pkR, info, psk, psk_id):
    ///   shared_secret, enc = Encap(pkR)
    ///   return enc, KeyScheduleS(mode_psk, shared_secret, info, psk, psk_id)
    /// ```
    ///
    /// See [RFC 9180, Section 5.1.2] for details.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingPsk`] or [`Error::InconsistentPsk`] for empty PSK
    ///   inputs, [`Error::InputTooLong`] for oversized ones. Checked before
    ///   encapsulating.
    /// - [`Error::Encap`] if the encapsulation fails.
    ///
    /// [RFC 9180, Section 5.1.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1.2
    /// [RFC 9180, Section 9.5]: https://www.rfc-editor.org/rfc/rfc9180.html#section-9.5
    pub fn setup_psk(
        &self,
        crypto_backend: C,
        psk: &[u8],
        psk_id: &[u8],
    ) -> Result<(EncapsulatedSecret, Sealer<C>), Error> {
        self.setup_inner(crypto_backend, HpkeMode::Psk, psk, psk_id, None)
    }

    /// 5.1.3. Authentication Using an Asymmetric Key
    ///
    /// The recipient can only set up the matching context with the public key
    /// of `sk_s`. Only the key pair is authenticated: bind any other sender
    /// identity through `info`.
    ///
    /// ```text
    /// def SetupAuthS(pkR, info, skS):
    ///   shared_secret, enc = AuthEncap(pkR, skS)
    ///   return enc, KeyScheduleS(mode_auth, shared_secret, info,
    ///                            default_psk, default_psk_id)
    /// ```
    ///
    /// See [RFC 9180, Section 5.1.3] for details.
    ///
    /// # Errors
    ///
    /// [`Error::Encap`] if the encapsulation fails, e.g. on a malformed
    /// `skS`.
    ///
    /// [RFC 9180, Section 5.1.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1.3
    pub fn setup_auth(
        &self,
        crypto_backend: C,
        sk_s: &HpkePrivateKey,
    ) -> Result<(EncapsulatedSecret, Sealer<C>), Error> {
        self.setup_inner(crypto_backend, HpkeMode::Auth, &[], &[], Some(sk_s))
    }

    /// 5.1.4. Authentication Using Both a PSK and an Asymmetric Key
    ///
    /// ```text
    /// def SetupAuthPSKS(pkR, info, psk, psk_id, skS):
    ///   shared_secret, enc = AuthEncap(pkR, skS)
    ///   return enc, KeyScheduleS(mode_auth_psk, shared_secret, info,
    ///                            psk, psk_id)
    /// ```
    ///
    /// See [RFC 9180, Section 5.1.4] for details.
    ///
    /// # Errors
    ///
    /// See [`setup_psk`](Self::setup_psk) and
    /// [`setup_auth`](Self::setup_auth).
    ///
    /// [RFC 9180, Section 5.1.4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1.4
    pub fn setup_auth_psk(
        &self,
        crypto_backend: C,
        psk: &[u8],
        psk_id: &[u8],
        sk_s: &HpkePrivateKey,
    ) -> Result<(EncapsulatedSecret, Sealer<C>), Error> {
        self.setup_inner(crypto_backend, HpkeMode::AuthPsk, psk, psk_id, Some(sk_s))
    }

    fn setup_inner(
        &self,
        mut crypto_backend: C,
        mode: HpkeMode,
        psk: &[u8],
        psk_id: &[u8],
        sk_s: Option<&HpkePrivateKey>,
    ) -> Result<(EncapsulatedSecret, Sealer<C>), Error> {
        Suite::<C>::verify_key_schedule_inputs(mode, self.info, psk, psk_id)?;
        self.suite.check_backend(&crypto_backend)?;

        let kem_id = self.suite.cipher_suite().kem_id;

        let (shared_secret, enc) = match (sk_s, self.ephemeral_seed) {
            (None, None) => kem::encap(&mut crypto_backend, kem_id, self.pk_r)?,
            (None, Some(seed)) => kem::encap_deterministic(&crypto_backend, kem_id, self.pk_r, seed)?,
            (Some(sk_s), None) => kem::auth_encap(&mut crypto_backend, kem_id, self.pk_r, sk_s)?,
            (Some(sk_s), Some(seed)) => {
                kem::auth_encap_deterministic(&crypto_backend, kem_id, self.pk_r, sk_s, seed)?
            }
        };

        let context = self.suite.key_schedule::<SenderRole>(
            crypto_backend,
            mode,
            shared_secret.as_ref(),
            self.info,
            psk,
            psk_id,
        )?;

        Ok((enc, context))
    }
}

/// The recipient side of an HPKE exchange.
///
/// Obtained from [`Suite::receiver`].
pub struct Receiver<'a, C> {
    suite: Suite<C>,
    sk_r: &'a HpkePrivateKey,
    info: &'a [u8],
}

impl<C> fmt::Debug for Receiver<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("suite", &self.suite)
            .finish_non_exhaustive()
    }
}

impl<'a, C: Crypto> Receiver<'a, C> {
    pub(crate) const fn new(suite: Suite<C>, sk_r: &'a HpkePrivateKey, info: &'a [u8]) -> Self {
        Self { suite, sk_r, info }
    }

    #[allow(clippy::too_many_arguments)]
    /// 5.1. Creating the Encryption Context
    ///
    /// This is a convenience function that wraps all four setup functions.
    /// `psk` and `psk_id` must be provided exactly in the PSK modes, `pk_s`
    /// exactly in the Auth modes.
    ///
    /// See [RFC 9180, Section 5.1] for details.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if an input the mode requires is missing, or
    ///   `pk_s` is given to a mode without sender authentication.
    /// - See the mode specific setup functions.
    ///
    /// [RFC 9180, Section 5.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1
    pub fn setup(
        &self,
        crypto_backend: C,
        mode: HpkeMode,
        enc: &EncapsulatedSecret,
        psk: Option<&[u8]>,
        psk_id: Option<&[u8]>,
        pk_s: Option<&HpkePublicKey>,
    ) -> Result<Opener<C>, Error> {
        match mode {
            HpkeMode::Base | HpkeMode::Psk if pk_s.is_some() => Err(Error::InvalidInput(
                "pk_s is only accepted in Auth and AuthPsk mode",
            )),
            HpkeMode::Base => self.setup_inner(
                crypto_backend,
                mode,
                enc,
                psk.unwrap_or_default(),
                psk_id.unwrap_or_default(),
                None,
            ),
            HpkeMode::Psk => self.setup_psk(
                crypto_backend,
                enc,
                psk.ok_or(Error::InvalidInput("For PSK mode, must provide psk"))?,
                psk_id.ok_or(Error::InvalidInput("For PSK mode, must provide psk_id"))?,
            ),
            HpkeMode::Auth => self.setup_inner(
                crypto_backend,
                mode,
                enc,
                psk.unwrap_or_default(),
                psk_id.unwrap_or_default(),
                Some(pk_s.ok_or(Error::InvalidInput("For Auth mode, must provide pk_s"))?),
            ),
            HpkeMode::AuthPsk => self.setup_auth_psk(
                crypto_backend,
                enc,
                psk.ok_or(Error::InvalidInput("For AuthPsk mode, must provide psk"))?,
                psk_id.ok_or(Error::InvalidInput("For AuthPsk mode, must provide psk_id"))?,
                pk_s.ok_or(Error::InvalidInput("For AuthPsk mode, must provide pk_s"))?,
            ),
        }
    }

    /// 5.1.1. Encryption to a Public Key
    ///
    /// ```text
    /// def SetupBaseR(enc, skR, info):
    ///   shared_secret = Decap(enc, skR)
    ///   return KeyScheduleR(mode_base, shared_secret, info,
    ///                       default_psk, default_psk_id)
    /// ```
    ///
    /// See [RFC 9180, Section 5.1.1] for details.
    ///
    /// # Errors
    ///
    /// [`Error::Decap`] if `enc` is malformed or the decapsulation fails.
    ///
    /// [RFC 9180, Section 5.1.1]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1.1
    pub fn setup_base(
        &self,
        crypto_backend: C,
        enc: &EncapsulatedSecret,
    ) -> Result<Opener<C>, Error> {
        self.setup_inner(crypto_backend, HpkeMode::Base, enc, &[], &[], None)
    }

    /// 5.1.2. Authentication Using a Pre-Shared Key
    ///
    /// ```text
    /// def SetupPSKR(enc, skR, info, psk, psk_id):
    ///   shared_secret = Decap(enc, skR)
    ///   return KeyScheduleR(mode_psk, shared_secret, info, psk, psk_id)
    /// ```
    ///
    /// See [RFC 9180, Section 5.1.2] for details.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingPsk`] or [`Error::InconsistentPsk`] for empty PSK
    ///   inputs, [`Error::InputTooLong`] for oversized ones. Checked before
    ///   decapsulating.
    /// - [`Error::Decap`] if the decapsulation fails.
    ///
    /// [RFC 9180, Section 5.1.2]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1.2
    pub fn setup_psk(
        &self,
        crypto_backend: C,
        enc: &EncapsulatedSecret,
        psk: &[u8],
        psk_id: &[u8],
    ) -> Result<Opener<C>, Error> {
        self.setup_inner(crypto_backend, HpkeMode::Psk, enc, psk, psk_id, None)
    }

    /// 5.1.3. Authentication Using an Asymmetric Key
    ///
    /// ```text
    /// def SetupAuthR(enc, skR, info, pkS):
    ///   shared_secret = AuthDecap(enc, skR, pkS)
    ///   return KeyScheduleR(mode_auth, shared_secret, info,
    ///                       default_psk, default_psk_id)
    /// ```
    ///
    /// With the wrong `pk_s` the setup still succeeds, but the context derives
    /// different keys and opening fails.
    ///
    /// See [RFC 9180, Section 5.1.3] for details.
    ///
    /// # Errors
    ///
    /// [`Error::Decap`] if the decapsulation fails.
    ///
    /// [RFC 9180, Section 5.1.3]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1.3
    pub fn setup_auth(
        &self,
        crypto_backend: C,
        enc: &EncapsulatedSecret,
        pk_s: &HpkePublicKey,
    ) -> Result<Opener<C>, Error> {
        self.setup_inner(crypto_backend, HpkeMode::Auth, enc, &[], &[], Some(pk_s))
    }

    /// 5.1.4. Authentication Using Both a PSK and an Asymmetric Key
    ///
    /// ```text
    /// def SetupAuthPSKR(enc, skR, info, psk, psk_id, pkS):
    ///   shared_secret = AuthDecap(enc, skR, pkS)
    ///   return KeyScheduleR(mode_auth_psk, shared_secret, info,
    ///                       psk, psk_id)
    /// ```
    ///
    /// See [RFC 9180, Section 5.1.4] for details.
    ///
    /// # Errors
    ///
    /// See [`setup_psk`](Self::setup_psk) and
    /// [`setup_auth`](Self::setup_auth).
    ///
    /// [RFC 9180, Section 5.1.4]: https://www.rfc-editor.org/rfc/rfc9180.html#section-5.1.4
    pub fn setup_auth_psk(
        &self,
        crypto_backend: C,
        enc: &EncapsulatedSecret,
        psk: &[u8],
        psk_id: &[u8],
        pk_s: &HpkePublicKey,
    ) -> Result<Opener<C>, Error> {
        self.setup_inner(crypto_backend, HpkeMode::AuthPsk, enc, psk, psk_id, Some(pk_s))
    }

    fn setup_inner(
        &self,
        crypto_backend: C,
        mode: HpkeMode,
        enc: &EncapsulatedSecret,
        psk: &[u8],
        psk_id: &[u8],
        pk_s: Option<&HpkePublicKey>,
    ) -> Result<Opener<C>, Error> {
        Suite::<C>::verify_key_schedule_inputs(mode, self.info, psk, psk_id)?;
        self.suite.check_backend(&crypto_backend)?;

        let kem_id = self.suite.cipher_suite().kem_id;

        let shared_secret = match pk_s {
            None => kem::decap(&crypto_backend, kem_id, enc, self.sk_r)?,
            Some(pk_s) => kem::auth_decap(&crypto_backend, kem_id, enc, self.sk_r, pk_s)?,
        };

        self.suite.key_schedule::<RecipientRole>(
            crypto_backend,
            mode,
            shared_secret.as_ref(),
            self.info,
            psk,
            psk_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use hardhpke_crypto::backend::HpkeCryptoRustCrypto;
    use hardhpke_crypto::{CryptoError, HpkeAeadId, HpkeCipherSuite, HpkeKdfId, HpkeKemId};

    use super::*;

    const PSK: &[u8] = b"0123456789abcdef0123456789abcdef";
    const PSK_ID: &[u8] = b"psk id";

    fn backend() -> HpkeCryptoRustCrypto {
        HpkeCryptoRustCrypto::new().unwrap()
    }

    fn suite() -> Suite<HpkeCryptoRustCrypto> {
        Suite::new(HpkeCipherSuite::new(
            HpkeKemId::DHKEM_P256_HKDF_SHA256,
            HpkeKdfId::HKDF_SHA256,
            HpkeAeadId::AES_128_GCM,
        ))
    }

    #[test]
    fn test_setup_per_mode() {
        let suite = suite();
        let kem_id = suite.cipher_suite().kem_id;
        let key_pair_r = kem::generate_key_pair(&mut backend(), kem_id).unwrap();
        let key_pair_s = kem::generate_key_pair(&mut backend(), kem_id).unwrap();

        let sender = suite.sender(key_pair_r.pk(), b"info").unwrap();
        let receiver = suite.receiver(key_pair_r.sk(), b"info").unwrap();

        let (enc, sealer) = sender.setup_base(backend()).unwrap();
        let opener = receiver.setup_base(backend(), &enc).unwrap();
        assert_eq!(opener.open(b"", &sealer.seal(b"", b"base").unwrap()).unwrap(), b"base");

        let (enc, sealer) = sender.setup_psk(backend(), PSK, PSK_ID).unwrap();
        let opener = receiver.setup_psk(backend(), &enc, PSK, PSK_ID).unwrap();
        assert_eq!(opener.open(b"", &sealer.seal(b"", b"psk").unwrap()).unwrap(), b"psk");

        let (enc, sealer) = sender.setup_auth(backend(), key_pair_s.sk()).unwrap();
        let opener = receiver.setup_auth(backend(), &enc, key_pair_s.pk()).unwrap();
        assert_eq!(opener.open(b"", &sealer.seal(b"", b"auth").unwrap()).unwrap(), b"auth");

        let (enc, sealer) = sender
            .setup_auth_psk(backend(), PSK, PSK_ID, key_pair_s.sk())
            .unwrap();
        let opener = receiver
            .setup_auth_psk(backend(), &enc, PSK, PSK_ID, key_pair_s.pk())
            .unwrap();
        assert_eq!(
            opener.open(b"", &sealer.seal(b"", b"auth psk").unwrap()).unwrap(),
            b"auth psk"
        );
    }

    #[test]
    fn test_generic_setup_requires_mode_inputs() {
        let suite = suite();
        let kem_id = suite.cipher_suite().kem_id;
        let key_pair_r = kem::generate_key_pair(&mut backend(), kem_id).unwrap();
        let key_pair_s = kem::generate_key_pair(&mut backend(), kem_id).unwrap();

        let sender = suite.sender(key_pair_r.pk(), b"").unwrap();
        let receiver = suite.receiver(key_pair_r.sk(), b"").unwrap();
        let (enc, _) = sender.setup_base(backend()).unwrap();

        for (mode, psk, psk_id, with_key) in [
            (HpkeMode::Psk, None, Some(PSK_ID), false),
            (HpkeMode::Psk, Some(PSK), None, false),
            (HpkeMode::Auth, None, None, false),
            (HpkeMode::AuthPsk, Some(PSK), Some(PSK_ID), false),
            (HpkeMode::AuthPsk, None, Some(PSK_ID), true),
            (HpkeMode::Base, None, None, true),
            (HpkeMode::Psk, Some(PSK), Some(PSK_ID), true),
        ] {
            let sk_s = with_key.then(|| key_pair_s.sk());
            let pk_s = with_key.then(|| key_pair_s.pk());

            assert!(
                matches!(
                    sender.setup(backend(), mode, psk, psk_id, sk_s),
                    Err(Error::InvalidInput(_))
                ),
                "sender, mode={mode:?}"
            );
            assert!(
                matches!(
                    receiver.setup(backend(), mode, &enc, psk, psk_id, pk_s),
                    Err(Error::InvalidInput(_))
                ),
                "receiver, mode={mode:?}"
            );
        }

        // Provided but empty, or provided when not needed.
        assert!(matches!(
            sender.setup(backend(), HpkeMode::Psk, Some(&[]), Some(&[]), None),
            Err(Error::MissingPsk)
        ));
        assert!(matches!(
            sender.setup(backend(), HpkeMode::Base, Some(PSK), Some(PSK_ID), None),
            Err(Error::UnnecessaryPsk)
        ));
        assert!(matches!(
            receiver.setup(backend(), HpkeMode::Auth, &enc, Some(PSK), None, Some(key_pair_s.pk())),
            Err(Error::InconsistentPsk)
        ));
    }

    #[test]
    fn test_auth_binds_sender_key() {
        let suite = suite();
        let kem_id = suite.cipher_suite().kem_id;
        let key_pair_r = kem::generate_key_pair(&mut backend(), kem_id).unwrap();
        let key_pair_s = kem::generate_key_pair(&mut backend(), kem_id).unwrap();
        let key_pair_x = kem::generate_key_pair(&mut backend(), kem_id).unwrap();

        let (enc, sealer) = suite
            .sender(key_pair_r.pk(), b"info")
            .unwrap()
            .setup_auth(backend(), key_pair_s.sk())
            .unwrap();
        let ct = sealer.seal(b"aad", b"from s").unwrap();

        let receiver = suite.receiver(key_pair_r.sk(), b"info").unwrap();

        let impostor = receiver.setup_auth(backend(), &enc, key_pair_x.pk()).unwrap();
        assert!(matches!(impostor.open(b"aad", &ct), Err(Error::OpenFailed)));

        let unauthenticated = receiver.setup_base(backend(), &enc).unwrap();
        assert!(matches!(unauthenticated.open(b"aad", &ct), Err(Error::OpenFailed)));

        let opener = receiver.setup_auth(backend(), &enc, key_pair_s.pk()).unwrap();
        assert_eq!(opener.open(b"aad", &ct).unwrap(), b"from s");
    }

    #[test]
    fn test_info_and_psk_bind_the_context() {
        let suite = suite();
        let kem_id = suite.cipher_suite().kem_id;
        let key_pair_r = kem::generate_key_pair(&mut backend(), kem_id).unwrap();

        let (enc, sealer) = suite
            .sender(key_pair_r.pk(), b"info")
            .unwrap()
            .setup_psk(backend(), PSK, PSK_ID)
            .unwrap();
        let ct = sealer.seal(b"", b"message").unwrap();

        let other_info = suite
            .receiver(key_pair_r.sk(), b"other info")
            .unwrap()
            .setup_psk(backend(), &enc, PSK, PSK_ID)
            .unwrap();
        assert!(matches!(other_info.open(b"", &ct), Err(Error::OpenFailed)));

        let other_psk = suite
            .receiver(key_pair_r.sk(), b"info")
            .unwrap()
            .setup_psk(backend(), &enc, b"another psk of 32 bytes at least", PSK_ID)
            .unwrap();
        assert!(matches!(other_psk.open(b"", &ct), Err(Error::OpenFailed)));
    }

    #[test]
    fn test_ephemeral_seed_is_reproducible() {
        let suite = suite();
        let kem_id = suite.cipher_suite().kem_id;
        let key_pair_r = kem::generate_key_pair(&mut backend(), kem_id).unwrap();
        let seed = [0x42; 32];

        let sender = suite
            .sender(key_pair_r.pk(), b"info")
            .unwrap()
            .with_ephemeral_seed(&seed);

        let (enc_1, sealer_1) = sender.setup_base(backend()).unwrap();
        let (enc_2, sealer_2) = sender.setup_base(backend()).unwrap();
        assert_eq!(enc_1, enc_2);
        assert_eq!(
            sealer_1.seal(b"", b"message").unwrap(),
            sealer_2.seal(b"", b"message").unwrap()
        );

        let (enc_3, _) = suite
            .sender(key_pair_r.pk(), b"info")
            .unwrap()
            .setup_base(backend())
            .unwrap();
        assert_ne!(enc_1, enc_3);

        assert!(matches!(
            suite
                .sender(key_pair_r.pk(), b"info")
                .unwrap()
                .with_ephemeral_seed(&seed[..31])
                .setup_base(backend()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_psk_inputs_are_checked_before_encapsulation() {
        let suite = suite();
        let kem_id = suite.cipher_suite().kem_id;
        let key_pair_r = kem::generate_key_pair(&mut backend(), kem_id).unwrap();
        let receiver = suite.receiver(key_pair_r.sk(), b"").unwrap();

        // A garbage `enc` would fail decapsulation, but PSK validation runs
        // first.
        let enc = EncapsulatedSecret::new(kem_id, &[0u8; 65]).unwrap();

        assert!(matches!(
            receiver.setup_psk(backend(), &enc, b"", b""),
            Err(Error::MissingPsk)
        ));
        assert!(matches!(
            receiver.setup_psk(backend(), &enc, &[0; 65], PSK_ID),
            Err(Error::InputTooLong { what: "psk", .. })
        ));
        assert!(matches!(
            receiver.setup_psk(backend(), &enc, PSK, PSK_ID),
            Err(Error::Decap(_))
        ));
    }

    #[test]
    fn test_role_factories_check_key_lengths() {
        let suite = suite();
        let p521 = HpkeKemId::DHKEM_P521_HKDF_SHA512;
        let key_pair = kem::generate_key_pair(&mut backend(), p521).unwrap();

        assert!(matches!(
            suite.sender(key_pair.pk(), b""),
            Err(Error::Deserialization(CryptoError::KemMalformedPkX))
        ));
        assert!(matches!(
            suite.receiver(key_pair.sk(), b""),
            Err(Error::Deserialization(CryptoError::KemMalformedSkX))
        ));
        assert!(matches!(
            suite.sender(key_pair.pk(), &[0; 65]),
            Err(Error::InputTooLong { what: "info", .. })
        ));
    }
}
