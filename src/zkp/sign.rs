// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Proof attached to a signing Round 1 message. Three parallel branches,
//! one per encrypted value:
//!
//! - `eta1 = k` with `R = k * G`, `v = Enc(k)`, and `k` range-committed
//!   below `q^3`;
//! - `eta2 = rho` with `u = Enc(rho)`, below `q^3`;
//! - `eta3 = c + q^6` with `w = Enc(c)`, below `q^7`.
//!
//! `c` itself is sampled from the symmetric range `[-q^6, q^6)`, so the
//! third branch proves the shifted value: prover and verifier both multiply
//! the Paillier form of `w` by the fixed factor `(N+1)^{q^6}`, which is the
//! deterministic encryption shift of adding `q^6` to the plaintext.

use crate::{
    curve::{CurveKind, CurvePoint},
    errors::Result,
    l2fhe::{EncryptedL1, PublicKey},
    transcript::Transcript,
    utils::{bn_pow, modpow, random_bn_in_z_star, random_in_range},
    zkp::{setup::ZkSetupParameters, Proof},
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigRoundProof {
    pub(crate) u1: CurvePoint,
    pub(crate) u2: BigNumber,
    pub(crate) u3: BigNumber,
    pub(crate) u4: BigNumber,
    pub(crate) z1: BigNumber,
    pub(crate) z2: BigNumber,
    pub(crate) z3: BigNumber,
    pub(crate) v1: BigNumber,
    pub(crate) v2: BigNumber,
    pub(crate) v3: BigNumber,
    pub(crate) s1: BigNumber,
    pub(crate) s3: BigNumber,
    pub(crate) s4: BigNumber,
    pub(crate) s5: BigNumber,
    pub(crate) s6: BigNumber,
    pub(crate) s7: BigNumber,
    pub(crate) t1: BigNumber,
    pub(crate) t2: BigNumber,
    pub(crate) t3: BigNumber,
    pub(crate) e: BigNumber,
}

pub(crate) struct SigRoundInput<'a> {
    pk: &'a PublicKey,
    zk: &'a ZkSetupParameters,
    curve: CurveKind,
    r_point: &'a CurvePoint,
    enc_k: &'a EncryptedL1,
    enc_rho: &'a EncryptedL1,
    enc_c: &'a EncryptedL1,
}

impl<'a> SigRoundInput<'a> {
    pub(crate) fn new(
        pk: &'a PublicKey,
        zk: &'a ZkSetupParameters,
        curve: CurveKind,
        r_point: &'a CurvePoint,
        enc_k: &'a EncryptedL1,
        enc_rho: &'a EncryptedL1,
        enc_c: &'a EncryptedL1,
    ) -> Self {
        Self {
            pk,
            zk,
            curve,
            r_point,
            enc_k,
            enc_rho,
            enc_c,
        }
    }
}

/// The Round 1 secrets and the Paillier nonces used to encrypt them.
pub(crate) struct SigRoundSecret<'a> {
    k: &'a BigNumber,
    rho: &'a BigNumber,
    c: &'a BigNumber,
    nonce_k: &'a BigNumber,
    nonce_rho: &'a BigNumber,
    nonce_c: &'a BigNumber,
}

impl<'a> SigRoundSecret<'a> {
    pub(crate) fn new(
        k: &'a BigNumber,
        rho: &'a BigNumber,
        c: &'a BigNumber,
        nonce_k: &'a BigNumber,
        nonce_rho: &'a BigNumber,
        nonce_c: &'a BigNumber,
    ) -> Self {
        Self {
            k,
            rho,
            c,
            nonce_k,
            nonce_rho,
            nonce_c,
        }
    }
}

/// Challenge over the ordered transcript
/// `(G, R, w1, w2, w3, z1, z2, z3, u1, u2, u3, u4, v1, v2, v3)`, where
/// `w1..w3` are the Paillier forms of the three broadcast ciphertexts.
#[allow(clippy::too_many_arguments)]
fn challenge(
    curve: CurveKind,
    r_point: &CurvePoint,
    ws: [&BigNumber; 3],
    zs: [&BigNumber; 3],
    u1: &CurvePoint,
    us: [&BigNumber; 3],
    vs: [&BigNumber; 3],
) -> BigNumber {
    let mut transcript = Transcript::new();
    transcript
        .append_point(&CurvePoint::generator(curve))
        .append_point(r_point);
    for w in ws {
        transcript.append_bn(w);
    }
    for z in zs {
        transcript.append_bn(z);
    }
    transcript.append_point(u1);
    for u in us {
        transcript.append_bn(u);
    }
    for v in vs {
        transcript.append_bn(v);
    }
    transcript.challenge()
}

impl Proof for SigRoundProof {
    type CommonInput<'a> = SigRoundInput<'a>;
    type ProverSecret<'a> = SigRoundSecret<'a>;

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
        let q3 = bn_pow(&q, 3);
        let q5 = bn_pow(&q, 5);
        let q6 = bn_pow(&q, 6);
        let q7 = bn_pow(&q, 7);

        let eta1 = secret.k;
        let eta2 = secret.rho;
        let eta3 = secret.c + &q6;

        let zero = BigNumber::zero();
        let alpha1 = random_in_range(rng, &zero, &q3);
        let alpha2 = random_in_range(rng, &zero, &q3);
        let alpha3 = random_in_range(rng, &zero, &q7);
        let beta1 = random_bn_in_z_star(rng, n)?;
        let beta2 = random_bn_in_z_star(rng, n)?;
        let beta3 = random_bn_in_z_star(rng, n)?;
        let gamma1 = random_in_range(rng, &zero, &(&q3 * n_tilde));
        let gamma2 = random_in_range(rng, &zero, &(&q3 * n_tilde));
        let gamma3 = random_in_range(rng, &zero, &(&q7 * n_tilde));
        let rho1 = random_in_range(rng, &zero, &(&q * n_tilde));
        let rho2 = random_in_range(rng, &zero, &(&q * n_tilde));
        let rho3 = random_in_range(rng, &zero, &(&q5 * n_tilde));

        let z1 = modpow(h1, eta1, n_tilde).modmul(&modpow(h2, &rho1, n_tilde), n_tilde);
        let z2 = modpow(h1, eta2, n_tilde).modmul(&modpow(h2, &rho2, n_tilde), n_tilde);
        let z3 = modpow(h1, &eta3, n_tilde).modmul(&modpow(h2, &rho3, n_tilde), n_tilde);

        let u1 = CurvePoint::base_mul(input.curve, &alpha1)?;
        let u2 = modpow(&n_plus_one, &alpha1, &n_squared)
            .modmul(&modpow(&beta1, n, &n_squared), &n_squared);
        let u3 = modpow(&n_plus_one, &alpha2, &n_squared)
            .modmul(&modpow(&beta2, n, &n_squared), &n_squared);
        let u4 = modpow(&n_plus_one, &alpha3, &n_squared)
            .modmul(&modpow(&beta3, n, &n_squared), &n_squared);

        let v1 = modpow(h1, &alpha1, n_tilde).modmul(&modpow(h2, &gamma1, n_tilde), n_tilde);
        let v2 = modpow(h1, &alpha2, n_tilde).modmul(&modpow(h2, &gamma2, n_tilde), n_tilde);
        let v3 = modpow(h1, &alpha3, n_tilde).modmul(&modpow(h2, &gamma3, n_tilde), n_tilde);

        let w1 = input.pk.to_paillier(input.enc_k)?;
        let w2 = input.pk.to_paillier(input.enc_rho)?;
        let w3 = input.pk.to_paillier(input.enc_c)?;

        let e = challenge(
            input.curve,
            input.r_point,
            [&w1.0, &w2.0, &w3.0],
            [&z1, &z2, &z3],
            &u1,
            [&u2, &u3, &u4],
            [&v1, &v2, &v3],
        );

        let s1 = alpha1 + &e * eta1;
        let s3 = gamma1 + &e * rho1;
        let s4 = alpha2 + &e * eta2;
        let s5 = gamma2 + &e * rho2;
        let s6 = alpha3 + &e * &eta3;
        let s7 = gamma3 + &e * rho3;

        let t1 = modpow(secret.nonce_k, &e, n).modmul(&beta1, n);
        let t2 = modpow(secret.nonce_rho, &e, n).modmul(&beta2, n);
        let t3 = modpow(secret.nonce_c, &e, n).modmul(&beta3, n);

        Ok(Self {
            u1,
            u2,
            u3,
            u4,
            z1,
            z2,
            z3,
            v1,
            v2,
            v3,
            s1,
            s3,
            s4,
            s5,
            s6,
            s7,
            t1,
            t2,
            t3,
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
        let q3 = bn_pow(&q, 3);
        let q6 = bn_pow(&q, 6);
        let q7 = bn_pow(&q, 7);

        let w1 = input.pk.to_paillier(input.enc_k)?;
        let w2 = input.pk.to_paillier(input.enc_rho)?;
        let w3 = input.pk.to_paillier(input.enc_c)?;
        // The verifier-side half of the plaintext shift to eta3 = c + q^6.
        let w3_shifted = w3
            .0
            .modmul(&modpow(&n_plus_one, &q6, &n_squared), &n_squared);

        let e = challenge(
            input.curve,
            input.r_point,
            [&w1.0, &w2.0, &w3.0],
            [&self.z1, &self.z2, &self.z3],
            &self.u1,
            [&self.u2, &self.u3, &self.u4],
            [&self.v1, &self.v2, &self.v3],
        );
        if e != self.e {
            return verify_err!("signing proof challenge mismatch");
        }

        // s1 * G == u1 + e * R
        let lhs = CurvePoint::base_mul(input.curve, &self.s1)?;
        let rhs = self.u1.add(&input.r_point.mul(&self.e)?)?;
        if lhs != rhs {
            return verify_err!("signing proof curve equation failed");
        }

        // One ciphertext equation per branch:
        // (N+1)^{s} * t^N == u * w^e
        let branches = [
            (&self.s1, &self.t1, &self.u2, &w1.0),
            (&self.s4, &self.t2, &self.u3, &w2.0),
            (&self.s6, &self.t3, &self.u4, &w3_shifted),
        ];
        for (s, t, u, w) in branches {
            let lhs = modpow(&n_plus_one, s, &n_squared)
                .modmul(&modpow(t, n, &n_squared), &n_squared);
            let rhs = u.modmul(&modpow(w, &self.e, &n_squared), &n_squared);
            if lhs != rhs {
                return verify_err!("signing proof ciphertext equation failed");
            }
        }

        // One commitment equation per branch:
        // h1^{s} * h2^{s'} == v * z^e
        let commitments = [
            (&self.s1, &self.s3, &self.v1, &self.z1),
            (&self.s4, &self.s5, &self.v2, &self.z2),
            (&self.s6, &self.s7, &self.v3, &self.z3),
        ];
        for (s, s_prime, v, z) in commitments {
            let lhs = modpow(h1, s, n_tilde).modmul(&modpow(h2, s_prime, n_tilde), n_tilde);
            let rhs = v.modmul(&modpow(z, &self.e, n_tilde), n_tilde);
            if lhs != rhs {
                return verify_err!("signing proof commitment equation failed");
            }
        }

        let zero = BigNumber::zero();
        if self.s1 < zero || self.s1 >= q3 {
            return verify_err!("signing proof response s1 out of range");
        }
        if self.s4 < zero || self.s4 >= q3 {
            return verify_err!("signing proof response s4 out of range");
        }
        if self.s6 < zero || self.s6 >= q7 {
            return verify_err!("signing proof response s6 out of range");
        }

        Ok(())
    }
}
