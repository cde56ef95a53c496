//! Smoke tests for hardhpke crate

use hardhpke::backend::HpkeCryptoRustCrypto;
use hardhpke::*;

#[test_case::test_matrix(
    [
        HpkeMode::Base,
        HpkeMode::Auth,
        HpkeMode::Psk,
        HpkeMode::AuthPsk
    ],
    [
        HpkeKemId::DHKEM_P256_HKDF_SHA256,
        HpkeKemId::DHKEM_P384_HKDF_SHA384,
        HpkeKemId::DHKEM_P521_HKDF_SHA512,
        HpkeKemId::DHKEM_X25519_HKDF_SHA256
    ],
    [
        HpkeKdfId::HKDF_SHA256,
        HpkeKdfId::HKDF_SHA384,
        HpkeKdfId::HKDF_SHA512,
    ],
    [
        HpkeAeadId::AES_128_GCM,
        HpkeAeadId::AES_256_GCM,
        HpkeAeadId::CHACHA20_POLY1305,
        HpkeAeadId::EXPORT_ONLY
    ]
)]
fn smoking(mode: HpkeMode, kem_id: HpkeKemId, kdf_id: HpkeKdfId, aead_id: HpkeAeadId) {
    let suite = Suite::<HpkeCryptoRustCrypto>::new(HpkeCipherSuite::new(kem_id, kdf_id, aead_id));

    let mut crypto_backend_general = HpkeCryptoRustCrypto::new().unwrap();

    let key_pair_r = kem::generate_key_pair(&mut crypto_backend_general, kem_id).unwrap();
    let key_pair_s = kem::generate_key_pair(&mut crypto_backend_general, kem_id).unwrap();

    let mut psk = [0u8; 32];
    crypto_backend_general
        .secure_random_fill(&mut psk)
        .expect("RNG failure");
    let mut psk_id = [0u8; 32];
    crypto_backend_general
        .secure_random_fill(&mut psk_id)
        .expect("RNG failure");

    let (psk, psk_id) = if mode.is_psk() {
        (Some(&psk[..]), Some(&psk_id[..]))
    } else {
        (None, None)
    };
    let (sk_s, pk_s) = if mode.is_auth() {
        (Some(key_pair_s.sk()), Some(key_pair_s.pk()))
    } else {
        (None, None)
    };

    let info = b"HPKE self test info";

    let (enc, ctx_s) = suite
        .sender(key_pair_r.pk(), info)
        .unwrap()
        .setup(HpkeCryptoRustCrypto::new().unwrap(), mode, psk, psk_id, sk_s)
        .expect("sender setup failure");
    assert_eq!(enc.len(), kem_id.n_enc());

    let ctx_r = suite
        .receiver(key_pair_r.sk(), info)
        .unwrap()
        .setup(HpkeCryptoRustCrypto::new().unwrap(), mode, &enc, psk, psk_id, pk_s)
        .expect("recipient setup failure");

    let aad = b"HPKE self test aad";
    let pt = b"HPKE self test plain text";

    if aead_id == HpkeAeadId::EXPORT_ONLY {
        assert!(matches!(ctx_s.seal(aad, pt), Err(Error::ExportOnly)));
    } else {
        for seq in 0..3 {
            let ct = ctx_s.seal(aad, pt).expect("seal failure");
            assert_eq!(ct.len(), pt.len() + aead_id.n_tag());

            let pt_decrypted = ctx_r.open(aad, &ct).expect("open failure");
            assert_eq!(pt_decrypted, pt);

            assert_eq!(ctx_s.sequence(), seq + 1);
            assert_eq!(ctx_r.sequence(), seq + 1);
        }
    }

    let exporter_context = b"HPKE self test exporter context";
    assert_eq!(
        ctx_s
            .export(exporter_context, 32)
            .expect("ctx_s export failure"),
        ctx_r
            .export(exporter_context, 32)
            .expect("ctx_r export failure"),
        "export failure, ctx_s and ctx_r exports different values"
    );
}

#[test_case::test_matrix(
    [
        HpkeKemId::DHKEM_P256_HKDF_SHA256,
        HpkeKemId::DHKEM_X25519_HKDF_SHA256
    ],
    [
        HpkeAeadId::AES_128_GCM,
        HpkeAeadId::CHACHA20_POLY1305
    ]
)]
fn single_shot(kem_id: HpkeKemId, aead_id: HpkeAeadId) {
    let suite = Suite::<HpkeCryptoRustCrypto>::new(HpkeCipherSuite::new(
        kem_id,
        kem_id.kdf_id(),
        aead_id,
    ));

    let mut crypto_backend = HpkeCryptoRustCrypto::new().unwrap();
    let key_pair_r = kem::generate_key_pair(&mut crypto_backend, kem_id).unwrap();
    let key_pair_s = kem::generate_key_pair(&mut crypto_backend, kem_id).unwrap();
    let psk: &[u8] = b"a pre-shared key of 32 bytes....";
    let psk_id: &[u8] = b"psk id";

    let (enc, ct) = suite
        .seal_single_shot(
            HpkeCryptoRustCrypto::new().unwrap(),
            HpkeMode::AuthPsk,
            key_pair_r.pk(),
            b"info",
            b"aad",
            b"single shot",
            Some(psk),
            Some(psk_id),
            Some(key_pair_s.sk()),
        )
        .unwrap();

    let pt = suite
        .open_single_shot(
            HpkeCryptoRustCrypto::new().unwrap(),
            HpkeMode::AuthPsk,
            &enc,
            key_pair_r.sk(),
            b"info",
            b"aad",
            &ct,
            Some(psk),
            Some(psk_id),
            Some(key_pair_s.pk()),
        )
        .unwrap();
    assert_eq!(pt, b"single shot");

    assert!(matches!(
        suite.open_single_shot(
            HpkeCryptoRustCrypto::new().unwrap(),
            HpkeMode::AuthPsk,
            &enc,
            key_pair_r.sk(),
            b"info",
            b"other aad",
            &ct,
            Some(psk),
            Some(psk_id),
            Some(key_pair_s.pk()),
        ),
        Err(Error::OpenFailed)
    ));

    let (enc, exported_s) = suite
        .send_export(
            HpkeCryptoRustCrypto::new().unwrap(),
            HpkeMode::Base,
            key_pair_r.pk(),
            b"info",
            b"exporter context",
            64,
            None,
            None,
            None,
        )
        .unwrap();
    let exported_r = suite
        .receive_export(
            HpkeCryptoRustCrypto::new().unwrap(),
            HpkeMode::Base,
            &enc,
            key_pair_r.sk(),
            b"info",
            b"exporter context",
            64,
            None,
            None,
            None,
        )
        .unwrap();
    assert_eq!(exported_s.len(), 64);
    assert_eq!(exported_s, exported_r);
}

#[test]
fn unknown_suites_are_rejected() {
    assert!(Suite::<HpkeCryptoRustCrypto>::from_ids(0x0020, 0x0001, 0x0001).is_ok());

    // X448 and unassigned code points.
    assert!(Suite::<HpkeCryptoRustCrypto>::from_ids(0x0021, 0x0003, 0x0001).is_err());
    assert!(Suite::<HpkeCryptoRustCrypto>::from_ids(0x0020, 0x0004, 0x0001).is_err());
    assert!(Suite::<HpkeCryptoRustCrypto>::from_ids(0x0020, 0x0001, 0x0004).is_err());

    assert!(HpkeCipherSuite::is_valid_ids(0x0010, 0x0003, 0xFFFF));
    assert!(!HpkeCipherSuite::is_valid_ids(0x0000, 0x0001, 0x0001));
}
