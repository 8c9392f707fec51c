// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Runs the full protocol in-process: key generation for a 3-of-2 quorum,
//! then two participants sign a message and verify the result.
//!
//! Key generation samples fresh safe primes for the Paillier and
//! commitment moduli, which takes several minutes in release mode.

use rand::rngs::OsRng;
use threshold_ecdsa::{new_key, CurveKind, HashAlg, KeyInitMessage, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let mut rng = OsRng;

    println!("generating 3-of-2 key material on P-256 (this takes a while)...");
    let (mut shares, meta) = new_key(&mut rng, 3, 2, CurveKind::P256, HashAlg::Sha256)?;

    let msgs = shares
        .iter()
        .map(|share| share.init(&mut rng, &meta))
        .collect::<Result<Vec<KeyInitMessage>>>()?;
    let public_key = meta.public_key(&msgs)?;
    for share in &mut shares {
        share.set_key(&meta, &msgs)?;
    }
    println!(
        "joint public key: {}",
        hex::encode(public_key.to_bytes())
    );

    let doc = b"the quick brown fox jumps over the lazy dog";
    let (mut alice, digest) = shares[0].new_sig_session(&meta, doc)?;
    let (mut bob, _) = shares[2].new_sig_session(&meta, doc)?;

    let round1 = vec![alice.round1(&mut rng)?, bob.round1(&mut rng)?];
    let round2 = vec![
        alice.round2(&mut rng, &round1)?,
        bob.round2(&mut rng, &round1)?,
    ];
    let round3 = vec![
        alice.round3(&mut rng, &round2)?,
        bob.round3(&mut rng, &round2)?,
    ];
    let signature = alice.get_signature(&round3)?;

    signature.verify(&public_key, &digest)?;
    println!(
        "signature (r || s): {}",
        hex::encode(signature.to_bytes(CurveKind::P256))
    );
    println!("verified OK");
    Ok(())
}
