// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Setup parameters `(N~, h1, h2)` used by the range commitments inside the
//! protocol proofs. `N~` is an RSA modulus independent of the Paillier key;
//! `h1` and `h2` generate the same subgroup of squares, so
//! `h1^x * h2^rho mod N~` statistically hides `x`.

use crate::{
    errors::{Error, Result},
    paillier::prime_gen,
    parameters::ZK_PRIME_BITS,
    utils::random_positive_bn,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZkSetupParameters {
    pub(crate) n_tilde: BigNumber,
    pub(crate) h1: BigNumber,
    pub(crate) h2: BigNumber,
}

impl ZkSetupParameters {
    /// Generate fresh setup parameters from two new safe primes. The
    /// resulting modulus is at least 2048 bits.
    pub(crate) fn gen<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let p = prime_gen::get_random_safe_prime(rng, ZK_PRIME_BITS);
        let q = loop {
            let q = prime_gen::get_random_safe_prime(rng, ZK_PRIME_BITS);
            if q != p {
                break q;
            }
        };
        Self::gen_from_primes(rng, &p, &q)
    }

    /// Build setup parameters from a given pair of safe primes.
    pub(crate) fn gen_from_primes<R: RngCore + CryptoRng>(
        rng: &mut R,
        p: &BigNumber,
        q: &BigNumber,
    ) -> Result<Self> {
        if p == q {
            return Err(Error::Config("ZK setup primes must be distinct".into()));
        }
        let n_tilde = p * q;
        let phi_n = (p - BigNumber::one()) * (q - BigNumber::one());
        let tau = random_positive_bn(rng, &n_tilde);
        let lambda = random_positive_bn(rng, &phi_n);
        let h2 = tau.modmul(&tau, &n_tilde);
        let h1 = h2.modpow(&lambda, &n_tilde);
        Ok(Self { n_tilde, h1, h2 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::get_test_rng;

    #[test]
    fn generators_live_in_the_squares_subgroup() {
        let mut rng = get_test_rng();
        let p = BigNumber::safe_prime(128);
        let q = loop {
            let q = BigNumber::safe_prime(128);
            if q != p {
                break q;
            }
        };
        let params = ZkSetupParameters::gen_from_primes(&mut rng, &p, &q).unwrap();
        assert_eq!(params.n_tilde, &p * &q);
        // h1 is a power of h2, so both have odd order and a square root.
        let phi = (&p - BigNumber::one()) * (&q - BigNumber::one());
        let half = &phi / BigNumber::from(2u64);
        assert_eq!(
            params.h2.modpow(&half, &params.n_tilde),
            BigNumber::one()
        );
        assert_eq!(
            params.h1.modpow(&half, &params.n_tilde),
            BigNumber::one()
        );
    }

    #[test]
    fn identical_primes_are_rejected() {
        let mut rng = get_test_rng();
        let p = BigNumber::safe_prime(128);
        assert!(ZkSetupParameters::gen_from_primes(&mut rng, &p, &p).is_err());
    }
}
