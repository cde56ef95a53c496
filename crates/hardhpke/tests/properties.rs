//! Property-based tests: round trips and tampering over arbitrary inputs.

use hardhpke::backend::HpkeCryptoRustCrypto;
use hardhpke::*;
use proptest::prelude::*;

fn backend() -> HpkeCryptoRustCrypto {
    HpkeCryptoRustCrypto::new().unwrap()
}

fn kem_id() -> impl Strategy<Value = HpkeKemId> {
    prop_oneof![
        Just(HpkeKemId::DHKEM_P256_HKDF_SHA256),
        Just(HpkeKemId::DHKEM_P384_HKDF_SHA384),
        Just(HpkeKemId::DHKEM_P521_HKDF_SHA512),
        Just(HpkeKemId::DHKEM_X25519_HKDF_SHA256),
    ]
}

fn aead_id() -> impl Strategy<Value = HpkeAeadId> {
    prop_oneof![
        Just(HpkeAeadId::AES_128_GCM),
        Just(HpkeAeadId::AES_256_GCM),
        Just(HpkeAeadId::CHACHA20_POLY1305),
    ]
}

fn mode() -> impl Strategy<Value = HpkeMode> {
    prop_oneof![
        Just(HpkeMode::Base),
        Just(HpkeMode::Psk),
        Just(HpkeMode::Auth),
        Just(HpkeMode::AuthPsk),
    ]
}

fn bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..=max)
}

struct Session {
    sealer: Sealer<HpkeCryptoRustCrypto>,
    opener: Opener<HpkeCryptoRustCrypto>,
}

fn session(
    kem_id: HpkeKemId,
    aead_id: HpkeAeadId,
    mode: HpkeMode,
    info: &[u8],
    psk: &[u8],
) -> Session {
    let suite = Suite::<HpkeCryptoRustCrypto>::new(HpkeCipherSuite::new(
        kem_id,
        kem_id.kdf_id(),
        aead_id,
    ));

    let key_pair_r = kem::generate_key_pair(&mut backend(), kem_id).unwrap();
    let key_pair_s = kem::generate_key_pair(&mut backend(), kem_id).unwrap();

    let (psk, psk_id) = if mode.is_psk() {
        (Some(psk), Some(&b"psk id"[..]))
    } else {
        (None, None)
    };
    let (sk_s, pk_s) = if mode.is_auth() {
        (Some(key_pair_s.sk()), Some(key_pair_s.pk()))
    } else {
        (None, None)
    };

    let (enc, sealer) = suite
        .sender(key_pair_r.pk(), info)
        .unwrap()
        .setup(backend(), mode, psk, psk_id, sk_s)
        .unwrap();
    let opener = suite
        .receiver(key_pair_r.sk(), info)
        .unwrap()
        .setup(backend(), mode, &enc, psk, psk_id, pk_s)
        .unwrap();

    Session { sealer, opener }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn seal_open_round_trips(
        kem_id in kem_id(),
        aead_id in aead_id(),
        mode in mode(),
        info in bytes(64),
        psk in proptest::collection::vec(any::<u8>(), 1..=64),
        aad in bytes(64),
        pts in proptest::collection::vec(bytes(256), 1..4),
    ) {
        let Session { sealer, opener } = session(kem_id, aead_id, mode, &info, &psk);

        for (seq, pt) in pts.iter().enumerate() {
            let ct = sealer.seal(&aad, pt).unwrap();
            prop_assert_eq!(ct.len(), pt.len() + aead_id.n_tag());

            let opened = opener.open(&aad, &ct).unwrap();
            prop_assert_eq!(&opened, pt);
            prop_assert_eq!(opener.sequence(), seq as u64 + 1);
        }

        prop_assert_eq!(
            sealer.export(&info, 32).unwrap(),
            opener.export(&info, 32).unwrap()
        );
    }

    #[test]
    fn tampering_is_detected(
        kem_id in kem_id(),
        aead_id in aead_id(),
        aad in bytes(64),
        pt in bytes(256),
        flip in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let Session { sealer, opener } = session(kem_id, aead_id, HpkeMode::Base, b"info", &[]);

        let ct = sealer.seal(&aad, &pt).unwrap();

        let mut tampered = ct.clone();
        tampered[flip.index(ct.len())] ^= 1 << bit;
        prop_assert!(matches!(opener.open(&aad, &tampered), Err(Error::OpenFailed)));

        let mut other_aad = aad.clone();
        other_aad.push(0);
        prop_assert!(matches!(opener.open(&other_aad, &ct), Err(Error::OpenFailed)));

        // Failed attempts leave the sequence number where it was.
        prop_assert_eq!(opener.sequence(), 0);
        prop_assert_eq!(opener.open(&aad, &ct).unwrap(), pt);
    }

    #[test]
    fn export_lengths(len in 0usize..=255 * 32, exporter_context in bytes(64)) {
        let Session { sealer, opener } = session(
            HpkeKemId::DHKEM_X25519_HKDF_SHA256,
            HpkeAeadId::EXPORT_ONLY,
            HpkeMode::Base,
            b"",
            &[],
        );

        let exported = sealer.export(&exporter_context, len).unwrap();
        prop_assert_eq!(exported.len(), len);
        prop_assert_eq!(exported, opener.export(&exporter_context, len).unwrap());
    }
}
