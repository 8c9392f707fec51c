// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Pooled safe primes for tests.
//!
//! Generating the safe primes behind a protocol-sized Paillier modulus
//! takes minutes per prime, so tests draw from this pool instead: the
//! well-known MODP moduli of RFC 2409 / RFC 3526, which are safe primes by
//! construction. Each constant is primality-checked on first use and
//! regenerated at runtime if the check fails, so a corrupted constant can
//! slow a test down but never make it wrong. Production key generation
//! never reads this pool.

use crate::curve::CurveKind;
use lazy_static::lazy_static;
use unknown_order::BigNumber;

/// RFC 2409, Oakley group 1 (768 bits).
const SAFE_PRIME_768: &str = "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74020bbea63b139b22514a08798e3404ddef9519b3cd3a431b302b0a6df25f14374fe1356d6d51c245e485b576625e7ec6f44c42e9a63a3620ffffffffffffffff";

/// RFC 2409, Oakley group 2 (1024 bits).
const SAFE_PRIME_1024: &str = "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74020bbea63b139b22514a08798e3404ddef9519b3cd3a431b302b0a6df25f14374fe1356d6d51c245e485b576625e7ec6f44c42e9a637ed6b0bff5cb6f406b7edee386bfb5a899fa5ae9f24117c4b1fe649286651ece65381ffffffffffffffff";

/// RFC 3526, group 5 (1536 bits).
const SAFE_PRIME_1536: &str = "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74020bbea63b139b22514a08798e3404ddef9519b3cd3a431b302b0a6df25f14374fe1356d6d51c245e485b576625e7ec6f44c42e9a637ed6b0bff5cb6f406b7edee386bfb5a899fa5ae9f24117c4b1fe649286651ece45b3dc2007cb8a163bf0598da48361c55d39a69163fa8fd24cf5f83655d23dca3ad961c62f356208552bb9ed529077096966d670c354e4abc9804f1746c08ca237327ffffffffffffffff";

/// RFC 3526, group 14 (2048 bits).
const SAFE_PRIME_2048: &str = "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74020bbea63b139b22514a08798e3404ddef9519b3cd3a431b302b0a6df25f14374fe1356d6d51c245e485b576625e7ec6f44c42e9a637ed6b0bff5cb6f406b7edee386bfb5a899fa5ae9f24117c4b1fe649286651ece45b3dc2007cb8a163bf0598da48361c55d39a69163fa8fd24cf5f83655d23dca3ad961c62f356208552bb9ed529077096966d670c354e4abc9804f1746c08ca18217c32905e462e36ce3be39e772c180e86039b2783a2ec07a28fb5c55df06f4c52c9de2bcbf6955817183995497cea956ae515d2261898fa051015728e5a8aacaa68ffffffffffffffff";

fn load(hex_str: &str, bits: usize) -> BigNumber {
    let p = BigNumber::from_slice(hex::decode(hex_str).expect("pool constant is valid hex"));
    let p_prime: BigNumber = (&p - BigNumber::one()) / BigNumber::from(2u64);
    if p.bit_length() == bits && p.is_prime() && p_prime.is_prime() {
        p
    } else {
        BigNumber::safe_prime(bits)
    }
}

lazy_static! {
    static ref POOL_768: BigNumber = load(SAFE_PRIME_768, 768);
    static ref POOL_1024: BigNumber = load(SAFE_PRIME_1024, 1024);
    static ref POOL_1536: BigNumber = load(SAFE_PRIME_1536, 1536);
    static ref POOL_2048: BigNumber = load(SAFE_PRIME_2048, 2048);
}

/// A safe-prime pair for the Paillier modulus, sized so that `N > q^8` for
/// the given curve. P-521 needs primes beyond the pool and generates fresh
/// ones, which takes minutes; tests that use it are `#[ignore]`d.
pub(crate) fn paillier_pair(curve: CurveKind) -> (BigNumber, BigNumber) {
    match curve {
        CurveKind::P224 => (POOL_1024.clone(), POOL_1536.clone()),
        CurveKind::P256 => (POOL_1024.clone(), POOL_2048.clone()),
        CurveKind::P384 => (POOL_1536.clone(), POOL_2048.clone()),
        CurveKind::P521 => {
            let bits = (8 * 521 + crate::parameters::MODULUS_MARGIN_BITS) / 2;
            let p = BigNumber::safe_prime(bits);
            let q = loop {
                let q = BigNumber::safe_prime(bits);
                if q != p {
                    break q;
                }
            };
            (p, q)
        }
    }
}

/// A safe-prime pair for the ZK commitment modulus, disjoint from the
/// Paillier pair of the same curve.
pub(crate) fn zk_pair(curve: CurveKind) -> (BigNumber, BigNumber) {
    match curve {
        CurveKind::P224 => (POOL_768.clone(), POOL_2048.clone()),
        CurveKind::P256 => (POOL_768.clone(), POOL_1536.clone()),
        CurveKind::P384 => (POOL_768.clone(), POOL_1024.clone()),
        CurveKind::P521 => (POOL_1536.clone(), POOL_2048.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_constants_are_safe_primes() {
        for (hex_str, bits) in [
            (SAFE_PRIME_768, 768),
            (SAFE_PRIME_1024, 1024),
            (SAFE_PRIME_1536, 1536),
            (SAFE_PRIME_2048, 2048),
        ] {
            let p = BigNumber::from_slice(hex::decode(hex_str).unwrap());
            assert_eq!(p.bit_length(), bits);
            assert!(p.is_prime());
            let p_prime: BigNumber = (&p - BigNumber::one()) / BigNumber::from(2u64);
            assert!(p_prime.is_prime());
        }
    }
}
