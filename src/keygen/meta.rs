// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use super::{join, KeyInitMessage, KeyShare};
use crate::{
    curve::{CurveKind, CurvePoint},
    errors::Result,
    l2fhe,
    paillier,
    parameters::MODULUS_MARGIN_BITS,
    utils::{bn_pow, HashAlg},
    zkp::setup::ZkSetupParameters,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;
use unknown_order::BigNumber;

/// The parameters shared by every key share: the level-2 homomorphic public
/// key, the ZK commitment setup, and the curve and hash identifiers.
/// Immutable after key generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMeta {
    pk: l2fhe::PublicKey,
    zk: ZkSetupParameters,
    curve: CurveKind,
    hash: HashAlg,
}

impl KeyMeta {
    /// The level-2 homomorphic public key.
    pub fn pk(&self) -> &l2fhe::PublicKey {
        &self.pk
    }

    pub(crate) fn zk(&self) -> &ZkSetupParameters {
        &self.zk
    }

    /// The curve this key signs on.
    pub fn curve(&self) -> CurveKind {
        self.curve
    }

    /// The hash function documents are digested with.
    pub fn hash(&self) -> HashAlg {
        self.hash
    }

    /// The curve subgroup order `q`.
    pub fn q(&self) -> BigNumber {
        self.curve.order()
    }

    /// The base point of the configured curve.
    pub fn g(&self) -> CurvePoint {
        CurvePoint::generator(self.curve)
    }

    /// Total number of participants `L`.
    pub fn l(&self) -> u8 {
        self.pk.paillier().l()
    }

    /// Signing threshold `K`.
    pub fn k(&self) -> u8 {
        self.pk.paillier().k()
    }

    /// Parse the key-init messages and return the joint public key, as a
    /// point exportable in SEC1 form to any stock ECDSA verifier.
    pub fn public_key(&self, msgs: &[KeyInitMessage]) -> Result<CurvePoint> {
        let (_, y) = join(self, msgs)?;
        Ok(y)
    }
}

fn validate_config(l: u8, k: u8) -> Result<()> {
    if l < 2 {
        return config_err!(format!("at least 2 participants required, got {l}"));
    }
    if k < 2 || k > l {
        return config_err!(format!(
            "threshold must satisfy 2 <= K <= L, got K={k}, L={l}"
        ));
    }
    Ok(())
}

/// Generate the key material for `l` participants with signing threshold
/// `k` on the given curve: a threshold Paillier key sized so that
/// `N > q^8`, the ZK commitment setup, and one [`KeyShare`] per
/// participant.
pub fn new_key<R: RngCore + CryptoRng>(
    rng: &mut R,
    l: u8,
    k: u8,
    curve: CurveKind,
    hash: HashAlg,
) -> Result<(Vec<KeyShare>, KeyMeta)> {
    validate_config(l, k)?;
    let q = curve.order();
    let modulus_bits = 8 * q.bit_length() + MODULUS_MARGIN_BITS;
    let (paillier_pk, paillier_shares) = paillier::keygen(rng, modulus_bits, l, k)?;
    let zk = ZkSetupParameters::gen(rng)?;
    assemble(paillier_pk, paillier_shares, zk, curve, hash)
}

/// Same as [`new_key`], but from caller-supplied safe primes. Used by the
/// test suite with pooled primes; production callers should prefer
/// [`new_key`].
pub(crate) fn new_key_from_primes<R: RngCore + CryptoRng>(
    rng: &mut R,
    l: u8,
    k: u8,
    curve: CurveKind,
    hash: HashAlg,
    paillier_primes: (&BigNumber, &BigNumber),
    zk_primes: (&BigNumber, &BigNumber),
) -> Result<(Vec<KeyShare>, KeyMeta)> {
    validate_config(l, k)?;
    let (paillier_pk, paillier_shares) =
        paillier::keygen_from_primes(rng, paillier_primes.0, paillier_primes.1, l, k)?;
    let zk = ZkSetupParameters::gen_from_primes(rng, zk_primes.0, zk_primes.1)?;
    assemble(paillier_pk, paillier_shares, zk, curve, hash)
}

fn assemble(
    paillier_pk: paillier::PublicKey,
    paillier_shares: Vec<paillier::KeyShare>,
    zk: ZkSetupParameters,
    curve: CurveKind,
    hash: HashAlg,
) -> Result<(Vec<KeyShare>, KeyMeta)> {
    let q = curve.order();
    if *paillier_pk.n() <= bn_pow(&q, 8) {
        return config_err!("Paillier modulus must exceed q^8");
    }
    let l = paillier_pk.l();
    let k = paillier_pk.k();
    // Masks must statistically hide every plaintext the protocol encrypts;
    // the largest is the blinding term c in (-q^6, q^6). N > q^8 leaves
    // room for the mask on top.
    let mask_bits = 7 * q.bit_length() + 64;
    let pk = l2fhe::PublicKey::new(paillier_pk, mask_bits);
    let meta = KeyMeta {
        pk,
        zk,
        curve,
        hash,
    };
    let shares = paillier_shares
        .into_iter()
        .enumerate()
        .map(|(i, paillier_share)| KeyShare::new(i as u8, paillier_share))
        .collect();
    info!(l, k, curve = curve.name(), "generated threshold key material");
    Ok((shares, meta))
}
