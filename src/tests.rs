// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! End-to-end protocol tests: key generation through signature
//! verification, including the adversarial and degenerate paths.

use crate::{
    curve::{CurveKind, CurvePoint},
    errors::Error,
    keygen::{testing::test_key, KeyMeta, KeyShare},
    paillier::DecryptionShare,
    sign::{Round1Message, Round2Message, Round3Message, Signature, Status},
    utils::testing::{get_seeded_rng, get_test_rng},
    utils::random_positive_bn,
};
use rand::rngs::StdRng;
use unknown_order::BigNumber;

/// Run the one-round key generation: every participant broadcasts its
/// contribution and aggregates everyone's.
fn run_keygen(rng: &mut StdRng, l: u8, k: u8, curve: CurveKind) -> (Vec<KeyShare>, KeyMeta, CurvePoint) {
    let (mut shares, meta) = test_key(rng, l, k, curve);
    let msgs: Vec<_> = shares
        .iter()
        .map(|s| s.init(rng, &meta).unwrap())
        .collect();
    let public_key = meta.public_key(&msgs).unwrap();
    for share in &mut shares {
        share.set_key(&meta, &msgs).unwrap();
        assert_eq!(*share.public_key().unwrap(), public_key);
    }
    (shares, meta, public_key)
}

/// Drive the signing rounds with the given subset of participants. Every
/// signer computes every round; the first signer's signature is returned
/// after checking that all signers agree on it.
fn run_signing(
    rng: &mut StdRng,
    signers: &[&KeyShare],
    meta: &KeyMeta,
    doc: &[u8],
) -> (Signature, Vec<u8>) {
    let mut sessions = Vec::new();
    let mut digest = Vec::new();
    for share in signers {
        let (session, d) = share.new_sig_session(meta, doc).unwrap();
        digest = d;
        sessions.push(session);
    }

    let round1: Vec<Round1Message> = sessions
        .iter_mut()
        .map(|s| s.round1(rng).unwrap())
        .collect();
    let round2: Vec<Round2Message> = sessions
        .iter_mut()
        .map(|s| s.round2(rng, &round1).unwrap())
        .collect();
    let round3: Vec<Round3Message> = sessions
        .iter_mut()
        .map(|s| s.round3(rng, &round2).unwrap())
        .collect();
    let signatures: Vec<Signature> = sessions
        .iter_mut()
        .map(|s| s.get_signature(&round3).unwrap())
        .collect();
    for sig in &signatures[1..] {
        assert_eq!(*sig, signatures[0]);
    }
    (signatures[0].clone(), digest)
}

#[test]
fn sign_p224_5_of_3_deterministic() {
    // Same seed, same key, same signature - and it verifies.
    let run = || {
        let mut rng = get_seeded_rng(0x01);
        let (shares, meta, public_key) = run_keygen(&mut rng, 5, 3, CurveKind::P224);
        let signers: Vec<&KeyShare> = shares[..3].iter().collect();
        let (sig, digest) = run_signing(&mut rng, &signers, &meta, b"hello world");
        sig.verify(&public_key, &digest).unwrap();
        (sig, public_key)
    };
    let (sig1, _) = run();
    let (sig2, _) = run();
    assert_eq!(sig1, sig2);
}

#[test]
fn sign_p256_3_of_2_with_party_omitted() {
    // Party 1 never shows up after key generation; parties 0 and 2
    // complete on their own, and a stock verifier accepts the result.
    let mut rng = get_test_rng();
    let (shares, meta, public_key) = run_keygen(&mut rng, 3, 2, CurveKind::P256);
    let signers = [&shares[0], &shares[2]];
    let doc = b"transfer 100 to bob";
    let (sig, digest) = run_signing(&mut rng, &signers, &meta, doc);
    sig.verify(&public_key, &digest).unwrap();

    verify_with_stock_p256(&public_key, &sig, doc);
}

/// Cross-check against the RustCrypto ECDSA verifier.
fn verify_with_stock_p256(public_key: &CurvePoint, sig: &Signature, doc: &[u8]) {
    use ecdsa::signature::DigestVerifier;
    use sha2::{Digest, Sha256};

    let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(&public_key.to_bytes()).unwrap();
    let stock_sig =
        p256::ecdsa::Signature::from_slice(&sig.to_bytes(CurveKind::P256)).unwrap();
    vk.verify_digest(Sha256::new().chain_update(doc), &stock_sig)
        .unwrap();
}

#[test]
fn two_messages_one_key() {
    let mut rng = get_test_rng();
    let (shares, meta, public_key) = run_keygen(&mut rng, 3, 2, CurveKind::P224);
    let signers: Vec<&KeyShare> = shares[..2].iter().collect();

    let (sig1, digest1) = run_signing(&mut rng, &signers, &meta, b"first message");
    let (sig2, digest2) = run_signing(&mut rng, &signers, &meta, b"second message");
    sig1.verify(&public_key, &digest1).unwrap();
    sig2.verify(&public_key, &digest2).unwrap();
    assert_ne!(sig1, sig2);
    assert!(sig1.verify(&public_key, &digest2).is_err());
}

#[test]
fn all_participants_can_sign() {
    let mut rng = get_test_rng();
    let (shares, meta, public_key) = run_keygen(&mut rng, 2, 2, CurveKind::P224);
    let signers: Vec<&KeyShare> = shares.iter().collect();
    let (sig, digest) = run_signing(&mut rng, &signers, &meta, b"unanimous");
    sig.verify(&public_key, &digest).unwrap();
}

#[test]
fn extra_round1_messages_beyond_threshold_are_consistent() {
    // All 4 parties broadcast round 1; the threshold subset rule must pick
    // the same aggregate for everyone, including non-identical senders.
    let mut rng = get_test_rng();
    let (shares, meta, public_key) = run_keygen(&mut rng, 4, 3, CurveKind::P224);
    let signers: Vec<&KeyShare> = shares.iter().collect();
    let (sig, digest) = run_signing(&mut rng, &signers, &meta, b"everyone online");
    sig.verify(&public_key, &digest).unwrap();
}

#[test]
fn tampered_round1_message_is_dropped_when_enough_remain() {
    let mut rng = get_test_rng();
    let (shares, meta, public_key) = run_keygen(&mut rng, 5, 3, CurveKind::P224);
    let signers: Vec<&KeyShare> = shares[..4].iter().collect();

    let mut sessions: Vec<_> = signers
        .iter()
        .map(|s| s.new_sig_session(&meta, b"resilient").unwrap().0)
        .collect();
    let digest = meta.hash().digest(b"resilient");

    let mut round1: Vec<Round1Message> = sessions
        .iter_mut()
        .map(|s| s.round1(&mut rng).unwrap())
        .collect();
    // Flip a byte of one proof: that sender is dropped, three valid remain.
    round1[1].proof.s1 = &round1[1].proof.s1 + BigNumber::one();

    let round2: Vec<Round2Message> = sessions
        .iter_mut()
        .map(|s| s.round2(&mut rng, &round1).unwrap())
        .collect();
    let round3: Vec<Round3Message> = sessions
        .iter_mut()
        .map(|s| s.round3(&mut rng, &round2).unwrap())
        .collect();
    let sig = sessions[0].get_signature(&round3).unwrap();
    sig.verify(&public_key, &digest).unwrap();
}

#[test]
fn tampered_round1_message_aborts_when_only_threshold_arrived() {
    let mut rng = get_test_rng();
    let (shares, meta, _) = run_keygen(&mut rng, 5, 3, CurveKind::P224);
    let signers: Vec<&KeyShare> = shares[..3].iter().collect();

    let mut sessions: Vec<_> = signers
        .iter()
        .map(|s| s.new_sig_session(&meta, b"fragile").unwrap().0)
        .collect();
    let mut round1: Vec<Round1Message> = sessions
        .iter_mut()
        .map(|s| s.round1(&mut rng).unwrap())
        .collect();
    round1[2].proof.s1 = &round1[2].proof.s1 + BigNumber::one();

    assert!(matches!(
        sessions[0].round2(&mut rng, &round1),
        Err(Error::InsufficientParticipants { required: 3, valid: 2 })
    ));
    // The session did not advance and can retry once more messages arrive.
    assert_eq!(sessions[0].status(), Status::Round1);
}

#[test]
fn state_machine_rejects_out_of_order_calls() {
    let mut rng = get_test_rng();
    let (shares, meta, _) = run_keygen(&mut rng, 3, 2, CurveKind::P224);
    let (mut session, _) = shares[0].new_sig_session(&meta, b"strict").unwrap();

    assert!(matches!(
        session.round2(&mut rng, &[]),
        Err(Error::InvalidState {
            expected: Status::Round1,
            actual: Status::NotInited,
        })
    ));
    assert!(matches!(
        session.round3(&mut rng, &[]),
        Err(Error::InvalidState { .. })
    ));
    assert!(matches!(
        session.get_signature(&[]),
        Err(Error::InvalidState { .. })
    ));

    let _ = session.round1(&mut rng).unwrap();
    assert!(matches!(
        session.round1(&mut rng),
        Err(Error::InvalidState {
            expected: Status::NotInited,
            actual: Status::Round1,
        })
    ));
}

#[test]
fn finished_session_returns_cached_signature() {
    let mut rng = get_test_rng();
    let (shares, meta, _) = run_keygen(&mut rng, 3, 2, CurveKind::P224);
    let signers: Vec<&KeyShare> = shares[..2].iter().collect();

    let mut sessions: Vec<_> = signers
        .iter()
        .map(|s| s.new_sig_session(&meta, b"cache me").unwrap().0)
        .collect();
    let round1: Vec<_> = sessions
        .iter_mut()
        .map(|s| s.round1(&mut rng).unwrap())
        .collect();
    let round2: Vec<_> = sessions
        .iter_mut()
        .map(|s| s.round2(&mut rng, &round1).unwrap())
        .collect();
    let round3: Vec<_> = sessions
        .iter_mut()
        .map(|s| s.round3(&mut rng, &round2).unwrap())
        .collect();

    let sig = sessions[0].get_signature(&round3).unwrap();
    assert_eq!(sessions[0].status(), Status::Finished);
    // A second call returns the cached pair even with no messages at all.
    assert_eq!(sessions[0].get_signature(&[]).unwrap(), sig);
}

#[test]
fn session_without_joint_key_is_rejected() {
    let mut rng = get_test_rng();
    let (shares, meta) = test_key(&mut rng, 3, 2, CurveKind::P224);
    assert!(matches!(
        shares[0].new_sig_session(&meta, b"too early"),
        Err(Error::KeyNotSet)
    ));
}

#[test]
fn forged_decryption_share_never_reconstructs() {
    // K-1 honest shares plus a forged one: the combination passes the
    // cardinality check but lands on an unrelated value.
    let mut rng = get_test_rng();
    let (shares, meta, _) = run_keygen(&mut rng, 5, 3, CurveKind::P224);
    let pk = meta.pk().paillier();
    for _ in 0..20 {
        let m = random_positive_bn(&mut rng, pk.n());
        let (c, _) = pk.encrypt(&mut rng, &m).unwrap();
        let mut parts: Vec<DecryptionShare> = shares[..2]
            .iter()
            .map(|s| s.paillier.decrypt_share(&mut rng, pk, &c).unwrap().0)
            .collect();
        parts.push(DecryptionShare {
            index: 5,
            value: random_positive_bn(&mut rng, &(pk.n() * pk.n())),
        });
        match pk.combine_shares(&parts) {
            Ok(value) => assert_ne!(value, m),
            Err(_) => {}
        }
    }
}

#[test]
fn signature_byte_round_trip() {
    let mut rng = get_test_rng();
    let (shares, meta, public_key) = run_keygen(&mut rng, 3, 2, CurveKind::P224);
    let signers: Vec<&KeyShare> = shares[..2].iter().collect();
    let (sig, digest) = run_signing(&mut rng, &signers, &meta, b"bytes on the wire");

    let bytes = sig.to_bytes(CurveKind::P224);
    assert_eq!(bytes.len(), 2 * 28);
    let back = Signature::from_bytes(CurveKind::P224, &bytes).unwrap();
    assert_eq!(back, sig);
    back.verify(&public_key, &digest).unwrap();

    assert!(Signature::from_bytes(CurveKind::P224, &bytes[1..]).is_err());
    let zeroes = vec![0u8; 2 * 28];
    assert!(Signature::from_bytes(CurveKind::P224, &zeroes).is_err());
}

#[test]
fn message_serialization_round_trips() {
    let mut rng = get_test_rng();
    let (shares, meta, _) = run_keygen(&mut rng, 3, 2, CurveKind::P224);
    let (mut session, _) = shares[0].new_sig_session(&meta, b"wire format").unwrap();
    let msg = session.round1(&mut rng).unwrap();

    let bytes = bincode::serialize(&msg).unwrap();
    let back: Round1Message = bincode::deserialize(&bytes).unwrap();
    assert_eq!(bincode::serialize(&back).unwrap(), bytes);

    let meta_bytes = bincode::serialize(&meta).unwrap();
    let _: KeyMeta = bincode::deserialize(&meta_bytes).unwrap();
}

#[test]
#[ignore = "generates fresh safe primes; takes minutes"]
fn sign_with_freshly_generated_key() {
    use crate::utils::HashAlg;
    let mut rng = get_test_rng();
    let (mut shares, meta) = crate::new_key(&mut rng, 2, 2, CurveKind::P224, HashAlg::Sha256)
        .unwrap();
    let msgs: Vec<_> = shares
        .iter()
        .map(|s| s.init(&mut rng, &meta).unwrap())
        .collect();
    let public_key = meta.public_key(&msgs).unwrap();
    for share in &mut shares {
        share.set_key(&meta, &msgs).unwrap();
    }
    let signers: Vec<&KeyShare> = shares.iter().collect();
    let (sig, digest) = run_signing(&mut rng, &signers, &meta, b"fresh primes");
    sig.verify(&public_key, &digest).unwrap();
}

#[test]
#[ignore = "slow; sweeps every quorum shape up to L = 8"]
fn sign_all_quorum_shapes() {
    let mut rng = get_test_rng();
    for l in 2u8..=8 {
        for k in 2u8..=l {
            let (shares, meta, public_key) = run_keygen(&mut rng, l, k, CurveKind::P224);
            let signers: Vec<&KeyShare> = shares[..usize::from(k)].iter().collect();
            let (sig, digest) = run_signing(&mut rng, &signers, &meta, b"quorum sweep");
            sig.verify(&public_key, &digest).unwrap();
        }
    }
}

#[test]
#[ignore = "slow; larger curves over pooled primes"]
fn sign_p384_and_p521() {
    let mut rng = get_test_rng();
    for curve in [CurveKind::P384, CurveKind::P521] {
        let (shares, meta, public_key) = run_keygen(&mut rng, 3, 2, curve);
        let signers: Vec<&KeyShare> = shares[..2].iter().collect();
        let (sig, digest) = run_signing(&mut rng, &signers, &meta, b"big curves");
        sig.verify(&public_key, &digest).unwrap();
    }
}
