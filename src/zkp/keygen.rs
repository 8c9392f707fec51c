// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Proof attached to a key-generation message: the prover knows `x` and an
//! encryption nonce `r` such that `y = x * G` and the broadcast level-1
//! ciphertext decrypts to `x`, with `x` range-committed below `q^3` over
//! the auxiliary modulus `N~`.

use crate::{
    curve::{CurveKind, CurvePoint},
    errors::Result,
    l2fhe::{EncryptedL1, PublicKey},
    transcript::Transcript,
    utils::{bn_pow, modpow, random_in_range},
    zkp::{setup::ZkSetupParameters, Proof},
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGenProof {
    pub(crate) z: BigNumber,
    pub(crate) u1: CurvePoint,
    pub(crate) u2: BigNumber,
    pub(crate) u3: BigNumber,
    pub(crate) s1: BigNumber,
    pub(crate) s2: BigNumber,
    pub(crate) s3: BigNumber,
    pub(crate) e: BigNumber,
}

pub(crate) struct KeyGenInput<'a> {
    pk: &'a PublicKey,
    zk: &'a ZkSetupParameters,
    curve: CurveKind,
    y: &'a CurvePoint,
    enc_x: &'a EncryptedL1,
}

impl<'a> KeyGenInput<'a> {
    pub(crate) fn new(
        pk: &'a PublicKey,
        zk: &'a ZkSetupParameters,
        curve: CurveKind,
        y: &'a CurvePoint,
        enc_x: &'a EncryptedL1,
    ) -> Self {
        Self {
            pk,
            zk,
            curve,
            y,
            enc_x,
        }
    }
}

pub(crate) struct KeyGenSecret<'a> {
    x: &'a BigNumber,
    nonce: &'a BigNumber,
}

impl<'a> KeyGenSecret<'a> {
    pub(crate) fn new(x: &'a BigNumber, nonce: &'a BigNumber) -> Self {
        Self { x, nonce }
    }
}

/// Challenge over the ordered transcript `(G, y, w, z, u1, u2, u3)`.
fn challenge(
    curve: CurveKind,
    y: &CurvePoint,
    w: &BigNumber,
    z: &BigNumber,
    u1: &CurvePoint,
    u2: &BigNumber,
    u3: &BigNumber,
) -> BigNumber {
    let mut transcript = Transcript::new();
    transcript
        .append_point(&CurvePoint::generator(curve))
        .append_point(y)
        .append_bn(w)
        .append_bn(z)
        .append_point(u1)
        .append_bn(u2)
        .append_bn(u3);
    transcript.challenge()
}

impl Proof for KeyGenProof {
    type CommonInput<'a> = KeyGenInput<'a>;
    type ProverSecret<'a> = KeyGenSecret<'a>;

    fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        input: &Self::CommonInput<'_>,
        secret: &Self::ProverSecret<'_>,
    ) -> Result<Self> {
        let paillier = input.pk.paillier();
        let n = paillier.n();
        let n_squared = n * n;
        let n_plus_one = n + BigNumber::one();
        let n_tilde = &input.zk.n_tilde;
        let (h1, h2) = (&input.zk.h1, &input.zk.h2);
        let q = input.curve.order();
        let q_cubed = bn_pow(&q, 3);

        let one = BigNumber::one();
        let alpha = random_in_range(rng, &one, &q_cubed);
        let beta = random_in_range(rng, &one, n);
        let rho = random_in_range(rng, &one, &(&q * n_tilde));
        let gamma = random_in_range(rng, &one, &(&q_cubed * n_tilde));

        let z = modpow(h1, secret.x, n_tilde).modmul(&modpow(h2, &rho, n_tilde), n_tilde);
        let u1 = CurvePoint::base_mul(input.curve, &alpha)?;
        let u2 = modpow(&n_plus_one, &alpha, &n_squared)
            .modmul(&modpow(&beta, n, &n_squared), &n_squared);
        let u3 = modpow(h1, &alpha, n_tilde).modmul(&modpow(h2, &gamma, n_tilde), n_tilde);

        let w = input.pk.to_paillier(input.enc_x)?;
        let e = challenge(input.curve, input.y, &w.0, &z, &u1, &u2, &u3);

        let s1 = alpha + &e * secret.x;
        let s2 = modpow(secret.nonce, &e, n).modmul(&beta, n);
        let s3 = gamma + &e * rho;

        Ok(Self {
            z,
            u1,
            u2,
            u3,
            s1,
            s2,
            s3,
            e,
        })
    }

    fn verify(&self, input: &Self::CommonInput<'_>) -> Result<()> {
        let paillier = input.pk.paillier();
        let n = paillier.n();
        let n_squared = n * n;
        let n_plus_one = n + BigNumber::one();
        let n_tilde = &input.zk.n_tilde;
        let (h1, h2) = (&input.zk.h1, &input.zk.h2);
        let q = input.curve.order();
        let q_cubed = bn_pow(&q, 3);

        let w = input.pk.to_paillier(input.enc_x)?;
        let e = challenge(
            input.curve,
            input.y,
            &w.0,
            &self.z,
            &self.u1,
            &self.u2,
            &self.u3,
        );
        if e != self.e {
            return verify_err!("keygen proof challenge mismatch");
        }

        // s1 * G == u1 + e * y
        let lhs = CurvePoint::base_mul(input.curve, &self.s1)?;
        let rhs = self.u1.add(&input.y.mul(&self.e)?)?;
        if lhs != rhs {
            return verify_err!("keygen proof curve equation failed");
        }

        // (N+1)^s1 * s2^N == u2 * w^e
        let lhs = modpow(&n_plus_one, &self.s1, &n_squared)
            .modmul(&modpow(&self.s2, n, &n_squared), &n_squared);
        let rhs = self
            .u2
            .modmul(&modpow(&w.0, &self.e, &n_squared), &n_squared);
        if lhs != rhs {
            return verify_err!("keygen proof ciphertext equation failed");
        }

        // h1^s1 * h2^s3 == u3 * z^e
        let lhs = modpow(h1, &self.s1, n_tilde).modmul(&modpow(h2, &self.s3, n_tilde), n_tilde);
        let rhs = self
            .u3
            .modmul(&modpow(&self.z, &self.e, n_tilde), n_tilde);
        if lhs != rhs {
            return verify_err!("keygen proof commitment equation failed");
        }

        if self.s1 >= q_cubed || self.s1 < BigNumber::zero() {
            return verify_err!("keygen proof response out of range");
        }

        Ok(())
    }
}
