// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! `(K, L)`-threshold Paillier (Damgard-Jurik with `s = 1`).
//!
//! The decryption exponent `d` (with `d = 1 mod N` and `d = 0 mod m`, where
//! `m = p'q'` for safe primes `p = 2p' + 1`, `q = 2q' + 1`) is Shamir-shared
//! modulo `N * m` with threshold `K`. A participant's partial decryption of
//! a ciphertext `c` is `c_i = c^{2 * delta * s_i} mod N^2` with
//! `delta = L!`; any `K` such shares recombine to the plaintext through
//! integer Lagrange coefficients and a final multiplication by
//! `(4 * delta^2)^{-1} mod N`.
//!
//! Each share comes with a Chaum-Pedersen style proof that the same
//! exponent links `c_i` to the public verification value
//! `v_i = v^{delta * s_i}`, so a corrupted share is detected before it can
//! poison the combination.

use crate::{
    errors::{Error, Result},
    parameters::{CRYPTOGRAPHIC_RETRY_MAX, DECRYPT_PROOF_SLACK_BITS},
    transcript::Transcript,
    utils::{bn_mod, factorial, modpow, modpow_signed, random_bn_in_z_star, random_positive_bn},
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

/// A Paillier ciphertext, an element of `Z_{N^2}*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext(pub(crate) BigNumber);

/// The public half of a threshold Paillier key, shared by all participants.
///
/// Carries the precomputed values every protocol operation needs (`N + 1`,
/// `N^2`, `delta = L!`, the combination constant) plus the verification
/// values for partial-decryption proofs. Immutable after key generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKey {
    pub(crate) n: BigNumber,
    pub(crate) n_squared: BigNumber,
    pub(crate) n_plus_one: BigNumber,
    pub(crate) l: u8,
    pub(crate) k: u8,
    pub(crate) delta: BigNumber,
    combine_inv: BigNumber,
    v: BigNumber,
    verification_keys: Vec<BigNumber>,
}

/// One participant's share of the threshold decryption key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyShare {
    /// The 1-based Shamir evaluation point of this share.
    pub(crate) index: u8,
    secret: BigNumber,
}

/// One participant's contribution to decrypting a specific ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionShare {
    pub(crate) index: u8,
    pub(crate) value: BigNumber,
}

/// Proof that a [`DecryptionShare`] was derived from the prover's key share
/// and the claimed ciphertext: an equality-of-discrete-logs proof between
/// `c_i^2 = (c^4)^{delta * s_i}` and `v_i = v^{delta * s_i}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptShareProof {
    e: BigNumber,
    z: BigNumber,
}

/// Generate a fresh threshold Paillier key for `l` participants with
/// decryption threshold `k`. The modulus is built from two safe primes of
/// `modulus_bits / 2` bits each.
pub(crate) fn keygen<R: RngCore + CryptoRng>(
    rng: &mut R,
    modulus_bits: usize,
    l: u8,
    k: u8,
) -> Result<(PublicKey, Vec<KeyShare>)> {
    let prime_bits = modulus_bits / 2;
    let generate_pair = |rng: &mut R| -> Result<(BigNumber, BigNumber)> {
        let p = prime_gen::get_random_safe_prime(rng, prime_bits);
        let q = prime_gen::get_random_safe_prime(rng, prime_bits);
        if p != q && (&p * &q).bit_length() >= modulus_bits - 1 {
            Ok((p, q))
        } else {
            Err(Error::RetryFailed)
        }
    };
    let mut attempts = CRYPTOGRAPHIC_RETRY_MAX;
    let (p, q) = loop {
        match generate_pair(rng) {
            Ok(pair) => break pair,
            Err(_) if attempts > 0 => attempts -= 1,
            Err(e) => return Err(e),
        }
    };
    keygen_from_primes(rng, &p, &q, l, k)
}

/// Build a threshold key from a given pair of safe primes. Exposed
/// separately so tests can run against pooled primes, exactly like
/// production key generation otherwise.
pub(crate) fn keygen_from_primes<R: RngCore + CryptoRng>(
    rng: &mut R,
    p: &BigNumber,
    q: &BigNumber,
    l: u8,
    k: u8,
) -> Result<(PublicKey, Vec<KeyShare>)> {
    if p == q {
        return Err(Error::Config("Paillier primes must be distinct".into()));
    }
    let n = p * q;
    let n_squared = &n * &n;
    let n_plus_one = &n + BigNumber::one();
    let p_prime: BigNumber = (p - BigNumber::one()) / BigNumber::from(2u64);
    let q_prime: BigNumber = (q - BigNumber::one()) / BigNumber::from(2u64);
    let m = &p_prime * &q_prime;

    // d = 0 mod m and d = 1 mod N, by CRT over the coprime pair (m, N).
    let m_inv = m.invert(&n).ok_or(Error::CouldNotInvertBigNumber)?;
    let d = &m * &m_inv;

    // Shamir-share d modulo N * m with a degree k-1 polynomial.
    let share_modulus = &n * &m;
    let mut coefficients = vec![d];
    for _ in 1..k {
        coefficients.push(random_positive_bn(rng, &share_modulus));
    }
    let shares = (1..=l)
        .map(|i| {
            let x = BigNumber::from(u64::from(i));
            let mut eval = BigNumber::zero();
            // Horner, from the top coefficient down.
            for c in coefficients.iter().rev() {
                eval = bn_mod(&(&eval * &x + c), &share_modulus);
            }
            KeyShare { index: i, secret: eval }
        })
        .collect::<Vec<_>>();

    let delta = factorial(l);
    let four_delta_sq = BigNumber::from(4u64) * &delta * &delta;
    let combine_inv = four_delta_sq
        .invert(&n)
        .ok_or(Error::CouldNotInvertBigNumber)?;

    // v generates the squares of Z_{N^2}*; v_i = v^{delta * s_i} are the
    // public verification values for the share proofs.
    let r = random_bn_in_z_star(rng, &n_squared)?;
    let v = r.modmul(&r, &n_squared);
    let verification_keys = shares
        .iter()
        .map(|share| modpow(&v, &(&delta * &share.secret), &n_squared))
        .collect();

    let pk = PublicKey {
        n,
        n_squared,
        n_plus_one,
        l,
        k,
        delta,
        combine_inv,
        v,
        verification_keys,
    };
    Ok((pk, shares))
}

impl PublicKey {
    /// The plaintext modulus `N`.
    pub fn n(&self) -> &BigNumber {
        &self.n
    }

    /// Total number of key shares.
    pub fn l(&self) -> u8 {
        self.l
    }

    /// Decryption threshold.
    pub fn k(&self) -> u8 {
        self.k
    }

    /// Encrypt `m` (any signed integer; reduced mod `N`) under a fresh
    /// nonce, returning the nonce alongside the ciphertext.
    pub(crate) fn encrypt<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        m: &BigNumber,
    ) -> Result<(Ciphertext, BigNumber)> {
        let nonce = random_bn_in_z_star(rng, &self.n)?;
        let c = self.encrypt_with_nonce(m, &nonce)?;
        Ok((c, nonce))
    }

    /// Encrypt `m` deterministically under the given nonce:
    /// `c = (N + 1)^m * r^N mod N^2`.
    pub(crate) fn encrypt_with_nonce(&self, m: &BigNumber, r: &BigNumber) -> Result<Ciphertext> {
        if r <= &BigNumber::zero() || r >= &self.n {
            return Err(Error::MalformedCiphertext("nonce out of range"));
        }
        let m = bn_mod(m, &self.n);
        let a = modpow(&self.n_plus_one, &m, &self.n_squared);
        let b = modpow(r, &self.n, &self.n_squared);
        Ok(Ciphertext(a.modmul(&b, &self.n_squared)))
    }

    /// Homomorphic sum of a non-empty list of ciphertexts.
    pub(crate) fn add(&self, cs: &[&Ciphertext]) -> Result<Ciphertext> {
        let mut iter = cs.iter();
        let first = iter.next().ok_or(Error::EmptyInput("paillier add"))?;
        self.validate(first)?;
        let mut acc = first.0.clone();
        for c in iter {
            self.validate(c)?;
            acc = acc.modmul(&c.0, &self.n_squared);
        }
        Ok(Ciphertext(acc))
    }

    /// Multiply the plaintext by a signed constant, re-randomizing with
    /// `r` (`r = 1` leaves the operation deterministic).
    pub(crate) fn mul_fixed(
        &self,
        c: &Ciphertext,
        constant: &BigNumber,
        r: &BigNumber,
    ) -> Result<Ciphertext> {
        self.validate(c)?;
        let scaled = modpow_signed(&c.0, constant, &self.n_squared)?;
        if r == &BigNumber::one() {
            return Ok(Ciphertext(scaled));
        }
        let blind = modpow(r, &self.n, &self.n_squared);
        Ok(Ciphertext(scaled.modmul(&blind, &self.n_squared)))
    }

    /// Structural validation; malformed ciphertexts are rejected before any
    /// arithmetic touches them.
    pub(crate) fn validate(&self, c: &Ciphertext) -> Result<()> {
        if c.0 <= BigNumber::zero() || c.0 >= self.n_squared {
            return Err(Error::MalformedCiphertext("ciphertext out of range"));
        }
        Ok(())
    }

    /// Combine at least `K` decryption shares of the same ciphertext into
    /// its plaintext in `[0, N)`.
    pub(crate) fn combine_shares(&self, shares: &[DecryptionShare]) -> Result<BigNumber> {
        let mut sorted: Vec<&DecryptionShare> = shares.iter().collect();
        sorted.sort_by_key(|s| s.index);
        sorted.dedup_by_key(|s| s.index);
        if sorted.len() < usize::from(self.k) {
            return Err(Error::InsufficientParticipants {
                required: usize::from(self.k),
                valid: sorted.len(),
            });
        }
        let subset = &sorted[..usize::from(self.k)];
        for share in subset {
            if share.index == 0 || share.index > self.l {
                return Err(Error::MalformedCiphertext("share index out of range"));
            }
            if share.value <= BigNumber::zero() || share.value >= self.n_squared {
                return Err(Error::MalformedCiphertext("decryption share out of range"));
            }
        }

        let mut combined = BigNumber::one();
        for share in subset {
            let lambda = self.lagrange_coefficient(share.index, subset);
            let exponent = BigNumber::from(2u64) * lambda;
            let term = modpow_signed(&share.value, &exponent, &self.n_squared)?;
            combined = combined.modmul(&term, &self.n_squared);
        }

        // combined = (N + 1)^{4 * delta^2 * M}; extract M via the L function.
        let l_val = (combined - BigNumber::one()) / &self.n;
        Ok(bn_mod(&(l_val * &self.combine_inv), &self.n))
    }

    /// Integer Lagrange coefficient `delta * prod_{j != i} j / (j - i)`
    /// evaluated at zero over the given share subset.
    fn lagrange_coefficient(&self, i: u8, subset: &[&DecryptionShare]) -> BigNumber {
        let mut num = self.delta.clone();
        let mut den = BigNumber::one();
        let i = i64::from(i);
        for share in subset {
            let j = i64::from(share.index);
            if j == i {
                continue;
            }
            num = num * BigNumber::from(j as u64);
            let diff = j - i;
            if diff < 0 {
                num = -num;
                den = den * BigNumber::from(diff.unsigned_abs());
            } else {
                den = den * BigNumber::from(diff as u64);
            }
        }
        num / den
    }

    fn verification_key(&self, index: u8) -> Result<&BigNumber> {
        self.verification_keys
            .get(usize::from(index) - 1)
            .ok_or(Error::MalformedCiphertext("share index out of range"))
    }
}

impl KeyShare {
    /// Partially decrypt `c`, producing this participant's share
    /// `c^{2 * delta * s_i} mod N^2` and a proof binding it to `c`.
    pub(crate) fn decrypt_share<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        pk: &PublicKey,
        c: &Ciphertext,
    ) -> Result<(DecryptionShare, DecryptShareProof)> {
        pk.validate(c)?;
        let exponent = BigNumber::from(2u64) * &pk.delta * &self.secret;
        let value = modpow(&c.0, &exponent, &pk.n_squared);
        let share = DecryptionShare {
            index: self.index,
            value,
        };
        let proof = self.prove_share(rng, pk, c, &share)?;
        Ok((share, proof))
    }

    fn prove_share<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        pk: &PublicKey,
        c: &Ciphertext,
        share: &DecryptionShare,
    ) -> Result<DecryptShareProof> {
        let x = &pk.delta * &self.secret;
        let c4 = modpow(&c.0, &BigNumber::from(4u64), &pk.n_squared);
        let ci2 = share.value.modmul(&share.value, &pk.n_squared);
        let vi = pk.verification_key(self.index)?;

        let mask_bits =
            2 * pk.n.bit_length() + pk.delta.bit_length() + 256 + DECRYPT_PROOF_SLACK_BITS;
        let rho = random_positive_bn(rng, &(BigNumber::one() << mask_bits));
        let a = modpow(&c4, &rho, &pk.n_squared);
        let b = modpow(&pk.v, &rho, &pk.n_squared);

        let e = share_challenge(pk, &c4, &ci2, vi, &a, &b);
        let z = rho + &e * x;
        Ok(DecryptShareProof { e, z })
    }
}

impl DecryptShareProof {
    /// Verify that `share` is a correct partial decryption of `c` by the
    /// participant holding the key share at `share.index`.
    pub(crate) fn verify(
        &self,
        pk: &PublicKey,
        c: &Ciphertext,
        share: &DecryptionShare,
    ) -> Result<()> {
        pk.validate(c)?;
        if share.value <= BigNumber::zero() || share.value >= pk.n_squared {
            return Err(Error::MalformedCiphertext("decryption share out of range"));
        }
        let c4 = modpow(&c.0, &BigNumber::from(4u64), &pk.n_squared);
        let ci2 = share.value.modmul(&share.value, &pk.n_squared);
        let vi = pk.verification_key(share.index)?;

        let a = modpow(&c4, &self.z, &pk.n_squared)
            .modmul(&modpow_signed(&ci2, &-self.e.clone(), &pk.n_squared)?, &pk.n_squared);
        let b = modpow(&pk.v, &self.z, &pk.n_squared)
            .modmul(&modpow_signed(vi, &-self.e.clone(), &pk.n_squared)?, &pk.n_squared);

        let expected = share_challenge(pk, &c4, &ci2, vi, &a, &b);
        if expected != self.e {
            return verify_err!("decryption share proof challenge mismatch");
        }
        Ok(())
    }
}

/// Proof of knowledge of the plaintext and nonce behind a ciphertext:
/// `c = (N+1)^m * r^N mod N^2` for some `(m, r)` the prover knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptProof {
    a: BigNumber,
    z1: BigNumber,
    z2: BigNumber,
    e: BigNumber,
}

impl PublicKey {
    /// Encrypt `m` and attach a proof of plaintext knowledge.
    pub(crate) fn encrypt_with_proof<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        m: &BigNumber,
    ) -> Result<(Ciphertext, BigNumber, EncryptProof)> {
        let (c, nonce) = self.encrypt(rng, m)?;
        let m = bn_mod(m, &self.n);

        let alpha = random_positive_bn(rng, &self.n);
        let beta = random_bn_in_z_star(rng, &self.n)?;
        let a = modpow(&self.n_plus_one, &alpha, &self.n_squared)
            .modmul(&modpow(&beta, &self.n, &self.n_squared), &self.n_squared);

        let e = encrypt_challenge(self, &c, &a);
        let z1 = bn_mod(&(alpha + &e * m), &self.n);
        let z2 = modpow(&nonce, &e, &self.n).modmul(&beta, &self.n);

        Ok((c, nonce, EncryptProof { a, z1, z2, e }))
    }
}

impl EncryptProof {
    /// Verify that the prover knows an opening of `c`.
    pub(crate) fn verify(&self, pk: &PublicKey, c: &Ciphertext) -> Result<()> {
        pk.validate(c)?;
        let e = encrypt_challenge(pk, c, &self.a);
        if e != self.e {
            return verify_err!("encryption proof challenge mismatch");
        }
        let lhs = modpow(&pk.n_plus_one, &self.z1, &pk.n_squared)
            .modmul(&modpow(&self.z2, &pk.n, &pk.n_squared), &pk.n_squared);
        let rhs = self
            .a
            .modmul(&modpow(&c.0, &self.e, &pk.n_squared), &pk.n_squared);
        if lhs != rhs {
            return verify_err!("encryption proof equation failed");
        }
        Ok(())
    }
}

fn encrypt_challenge(pk: &PublicKey, c: &Ciphertext, a: &BigNumber) -> BigNumber {
    let mut transcript = Transcript::new();
    transcript
        .append_bytes(b"paillier-encrypt")
        .append_bn(&pk.n)
        .append_bn(&c.0)
        .append_bn(a);
    transcript.challenge()
}

fn share_challenge(
    pk: &PublicKey,
    c4: &BigNumber,
    ci2: &BigNumber,
    vi: &BigNumber,
    a: &BigNumber,
    b: &BigNumber,
) -> BigNumber {
    let mut transcript = Transcript::new();
    transcript
        .append_bytes(b"paillier-decrypt-share")
        .append_bn(&pk.n)
        .append_bn(c4)
        .append_bn(ci2)
        .append_bn(&pk.v)
        .append_bn(vi)
        .append_bn(a)
        .append_bn(b);
    transcript.challenge()
}

// Safe prime generation functions for production and testing.
pub(crate) mod prime_gen {
    use super::*;

    /// Sample a safe prime of the given length at random.
    pub(crate) fn get_random_safe_prime<R: RngCore + CryptoRng>(
        rng: &mut R,
        bits: usize,
    ) -> BigNumber {
        BigNumber::safe_prime_from_rng(bits, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::get_test_rng;

    fn small_key(l: u8, k: u8) -> (PublicKey, Vec<KeyShare>) {
        let mut rng = get_test_rng();
        let p = BigNumber::safe_prime(128);
        let q = loop {
            let q = BigNumber::safe_prime(128);
            if q != p {
                break q;
            }
        };
        keygen_from_primes(&mut rng, &p, &q, l, k).unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let mut rng = get_test_rng();
        let (pk, shares) = small_key(5, 3);
        let m = BigNumber::from(424242u64);
        let (c, _) = pk.encrypt(&mut rng, &m).unwrap();

        let decryptions: Vec<DecryptionShare> = shares[..3]
            .iter()
            .map(|s| s.decrypt_share(&mut rng, &pk, &c).unwrap().0)
            .collect();
        assert_eq!(pk.combine_shares(&decryptions).unwrap(), m);
    }

    #[test]
    fn any_threshold_subset_decrypts() {
        let mut rng = get_test_rng();
        let (pk, shares) = small_key(5, 3);
        let m = BigNumber::from(987654321u64);
        let (c, _) = pk.encrypt(&mut rng, &m).unwrap();

        for subset in [[0usize, 1, 2], [0, 2, 4], [1, 3, 4], [2, 3, 4]] {
            let decryptions: Vec<DecryptionShare> = subset
                .iter()
                .map(|&i| shares[i].decrypt_share(&mut rng, &pk, &c).unwrap().0)
                .collect();
            assert_eq!(pk.combine_shares(&decryptions).unwrap(), m);
        }
    }

    #[test]
    fn too_few_shares_is_an_error() {
        let mut rng = get_test_rng();
        let (pk, shares) = small_key(4, 3);
        let (c, _) = pk.encrypt(&mut rng, &BigNumber::from(7u64)).unwrap();
        let decryptions: Vec<DecryptionShare> = shares[..2]
            .iter()
            .map(|s| s.decrypt_share(&mut rng, &pk, &c).unwrap().0)
            .collect();
        assert!(matches!(
            pk.combine_shares(&decryptions),
            Err(Error::InsufficientParticipants { required: 3, valid: 2 })
        ));
    }

    #[test]
    fn homomorphic_add_and_mul() {
        let mut rng = get_test_rng();
        let (pk, shares) = small_key(3, 2);
        let (ca, _) = pk.encrypt(&mut rng, &BigNumber::from(100u64)).unwrap();
        let (cb, _) = pk.encrypt(&mut rng, &BigNumber::from(23u64)).unwrap();
        let sum = pk.add(&[&ca, &cb]).unwrap();
        let scaled = pk
            .mul_fixed(&sum, &-BigNumber::from(2u64), &BigNumber::one())
            .unwrap();

        let decryptions: Vec<DecryptionShare> = shares[..2]
            .iter()
            .map(|s| s.decrypt_share(&mut rng, &pk, &scaled).unwrap().0)
            .collect();
        // -2 * 123 mod N
        let expected = bn_mod(&-BigNumber::from(246u64), pk.n());
        assert_eq!(pk.combine_shares(&decryptions).unwrap(), expected);
    }

    #[test]
    fn share_proof_verifies_and_binds() {
        let mut rng = get_test_rng();
        let (pk, shares) = small_key(3, 2);
        let (c, _) = pk.encrypt(&mut rng, &BigNumber::from(55u64)).unwrap();
        let (share, proof) = shares[0].decrypt_share(&mut rng, &pk, &c).unwrap();
        assert!(proof.verify(&pk, &c, &share).is_ok());

        // Wrong ciphertext.
        let (other, _) = pk.encrypt(&mut rng, &BigNumber::from(56u64)).unwrap();
        assert!(proof.verify(&pk, &other, &share).is_err());

        // Tampered share value.
        let mut bad = share.clone();
        bad.value = bad.value.modmul(&BigNumber::from(2u64), &pk.n_squared);
        assert!(proof.verify(&pk, &c, &bad).is_err());

        // Share claimed by a different participant.
        let mut stolen = share;
        stolen.index = 2;
        assert!(proof.verify(&pk, &c, &stolen).is_err());
    }

    #[test]
    fn encryption_proof_rejects_tampering() {
        let mut rng = get_test_rng();
        let (pk, _) = small_key(3, 2);
        let m = BigNumber::from(99u64);
        let (c, _, proof) = pk.encrypt_with_proof(&mut rng, &m).unwrap();
        assert!(proof.verify(&pk, &c).is_ok());

        for field in 0..4 {
            let mut bad = proof.clone();
            match field {
                0 => bad.a = &bad.a + BigNumber::one(),
                1 => bad.z1 = &bad.z1 + BigNumber::one(),
                2 => bad.z2 = &bad.z2 + BigNumber::one(),
                _ => bad.e = &bad.e + BigNumber::one(),
            }
            assert!(bad.verify(&pk, &c).is_err());
        }
    }

    #[test]
    fn rejects_malformed_ciphertext() {
        let (pk, _) = small_key(3, 2);
        let too_big = Ciphertext(pk.n_squared.clone());
        assert!(matches!(
            pk.validate(&too_big),
            Err(Error::MalformedCiphertext(_))
        ));
        let zero = Ciphertext(BigNumber::zero());
        assert!(pk.validate(&zero).is_err());
    }
}
