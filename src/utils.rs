// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use crate::{
    errors::{Error, Result},
    parameters::CRYPTOGRAPHIC_RETRY_MAX,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use unknown_order::BigNumber;

/// Compute a^e (mod n).
pub(crate) fn modpow(a: &BigNumber, e: &BigNumber, n: &BigNumber) -> BigNumber {
    a.modpow(e, n)
}

/// Compute a^e (mod n) for a signed exponent. A negative exponent routes
/// through the modular inverse of the base, which must exist.
pub(crate) fn modpow_signed(a: &BigNumber, e: &BigNumber, n: &BigNumber) -> Result<BigNumber> {
    if e < &BigNumber::zero() {
        let inv = a.invert(n).ok_or(Error::CouldNotInvertBigNumber)?;
        Ok(inv.modpow(&-e.clone(), n))
    } else {
        Ok(a.modpow(e, n))
    }
}

/// Reduce x into the canonical range [0, n), also for negative x.
pub(crate) fn bn_mod(x: &BigNumber, n: &BigNumber) -> BigNumber {
    x.modadd(&BigNumber::zero(), n)
}

/// Compute base^exp over the integers for a small exponent.
pub(crate) fn bn_pow(base: &BigNumber, exp: u32) -> BigNumber {
    let mut out = BigNumber::one();
    for _ in 0..exp {
        out = out * base;
    }
    out
}

/// Compute n! as a BigNumber.
pub(crate) fn factorial(n: u8) -> BigNumber {
    let mut out = BigNumber::one();
    for i in 2..=u64::from(n) {
        out = out * BigNumber::from(i);
    }
    out
}

/// Sample a number uniformly at random from the range [0, n). This can be
/// used for sampling from a prime field `F_p` or the integers modulo `n`
/// (for any `n`).
pub(crate) fn random_positive_bn<R: RngCore + CryptoRng>(rng: &mut R, n: &BigNumber) -> BigNumber {
    BigNumber::from_rng(n, rng)
}

/// Sample a number uniformly at random from the range [min, max).
pub(crate) fn random_in_range<R: RngCore + CryptoRng>(
    rng: &mut R,
    min: &BigNumber,
    max: &BigNumber,
) -> BigNumber {
    debug_assert!(min < max);
    BigNumber::from_rng(&(max - min), rng) + min
}

/// Sample a field element from [1, q), as in a private-key or nonce draw.
pub(crate) fn random_field_element<R: RngCore + CryptoRng>(
    rng: &mut R,
    q: &BigNumber,
) -> BigNumber {
    random_in_range(rng, &BigNumber::one(), q)
}

/// Generate a random `BigNumber` that is in the multiplicative group of
/// integers modulo `n`.
///
/// Note: In this application, `n` is typically the product of two primes. If
/// the drawn element is not coprime with `n` and is not `0 mod n`, then the
/// caller has accidentally stumbled upon the factorization of `n`!
/// This is a security issue when `n` is someone else's Paillier modulus, but
/// the chance of this happening is basically 0 and we drop the element
/// anyway.
pub(crate) fn random_bn_in_z_star<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigNumber,
) -> Result<BigNumber> {
    std::iter::repeat_with(|| BigNumber::from_rng(n, rng))
        .take(CRYPTOGRAPHIC_RETRY_MAX)
        .find(|result| result != &BigNumber::zero() && result.gcd(n) == BigNumber::one())
        .ok_or(Error::RetryFailed)
}

/// Convert a hash digest to an integer, following [SECG]: truncate the
/// digest to the byte length of the curve order, then shift out any excess
/// bits. This mirrors what stock ECDSA verifiers do with long digests.
pub(crate) fn hash_to_int(digest: &[u8], q: &BigNumber) -> BigNumber {
    let order_bits = q.bit_length();
    let order_bytes = (order_bits + 7) / 8;
    let truncated = if digest.len() > order_bytes {
        &digest[..order_bytes]
    } else {
        digest
    };
    let ret = BigNumber::from_slice(truncated);
    let total_bits = truncated.len() * 8;
    if total_bits > order_bits {
        ret / (BigNumber::one() << (total_bits - order_bits))
    } else {
        ret
    }
}

/// Identifies the hash function a key was configured with. The digest is
/// reduced to a scalar per [SECG] before signing, so any of these pairs with
/// any supported curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlg {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlg {
    /// Hash a full document down to a digest.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlg::Sha256 => Sha256::digest(data).to_vec(),
            HashAlg::Sha384 => Sha384::digest(data).to_vec(),
            HashAlg::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::get_test_rng;

    #[test]
    fn test_random_in_range_bounds() {
        let mut rng = get_test_rng();
        let min = -BigNumber::from(1000u64);
        let max = BigNumber::from(1000u64);
        for _ in 0..100 {
            let v = random_in_range(&mut rng, &min, &max);
            assert!(v >= min && v < max);
        }
    }

    #[test]
    fn test_bn_mod_negative() {
        let n = BigNumber::from(7u64);
        let x = -BigNumber::from(3u64);
        assert_eq!(bn_mod(&x, &n), BigNumber::from(4u64));
    }

    #[test]
    fn test_modpow_signed_inverts() {
        let n = BigNumber::from(101u64);
        let a = BigNumber::from(5u64);
        let e = -BigNumber::from(3u64);
        let direct = modpow(&a, &BigNumber::from(3u64), &n)
            .invert(&n)
            .unwrap();
        assert_eq!(modpow_signed(&a, &e, &n).unwrap(), direct);
    }

    #[test]
    fn test_hash_to_int_truncates() {
        // A 15-bit "order" against a 4-byte digest: keep two bytes, drop one
        // excess bit.
        let q = BigNumber::from(0x7000u64);
        let digest = [0xAB, 0xCD, 0xEF, 0x01];
        let expected = BigNumber::from(0xABCDu64 >> 1);
        assert_eq!(hash_to_int(&digest, &q), expected);
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(5), BigNumber::from(120u64));
        assert_eq!(factorial(1), BigNumber::one());
    }
}
