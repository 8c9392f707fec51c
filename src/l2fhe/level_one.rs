// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use super::PublicKey;
use crate::{
    errors::{Error, Result},
    paillier::{Ciphertext, DecryptShareProof, DecryptionShare, EncryptProof, KeyShare},
    utils::{bn_mod, random_positive_bn},
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

use super::level_two::{BetaPair, EncryptedL2};

/// A level-1 encrypted value: a cleartext offset `alpha` in `[0, N)` plus
/// the Paillier encryption of a random mask `b`, representing the plaintext
/// `alpha + b mod N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedL1 {
    pub(crate) alpha: BigNumber,
    pub(crate) beta: Ciphertext,
}

/// A participant's partial decryption of a level-1 value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedShareL1 {
    pub(crate) alpha: BigNumber,
    pub(crate) beta: DecryptionShare,
}

/// Proof that a [`DecryptedShareL1`] matches its ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptShareL1Proof {
    beta: DecryptShareProof,
}

/// Proof that the mask component of a level-1 value is a well-formed
/// Paillier encryption the prover can open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptL1Proof {
    beta: EncryptProof,
}

impl PublicKey {
    /// Add a non-empty list of level-1 values: offsets add over the
    /// integers (reduced mod `N`), masks add homomorphically.
    pub fn add_l1(&self, cs: &[&EncryptedL1]) -> Result<EncryptedL1> {
        if cs.is_empty() {
            return Err(Error::EmptyInput("add_l1"));
        }
        let mut alpha = BigNumber::zero();
        let mut betas = Vec::with_capacity(cs.len());
        for c in cs {
            self.validate_l1(c)?;
            alpha = bn_mod(&(alpha + &c.alpha), &self.paillier.n);
            betas.push(&c.beta);
        }
        let beta = self.paillier.add(&betas)?;
        Ok(EncryptedL1 { alpha, beta })
    }

    /// Multiply a level-1 value by a signed constant. Deterministic.
    pub fn mul_const_l1(&self, c: &EncryptedL1, k: &BigNumber) -> Result<EncryptedL1> {
        self.validate_l1(c)?;
        let alpha = bn_mod(&(&c.alpha * k), &self.paillier.n);
        let beta = self.paillier.mul_fixed(&c.beta, k, &BigNumber::one())?;
        Ok(EncryptedL1 { alpha, beta })
    }

    /// Multiply two level-1 values into a level-2 value. Deterministic:
    /// `(a1 + b1)(a2 + b2) = a1*a2 + a1*b2 + a2*b1` goes into the Paillier
    /// component, and the `b1*b2` cross term is carried symbolically as the
    /// pair of mask ciphertexts.
    pub fn mul(&self, c1: &EncryptedL1, c2: &EncryptedL1) -> Result<EncryptedL2> {
        self.validate_l1(c1)?;
        self.validate_l1(c2)?;
        let one = BigNumber::one();
        let a1a2 = self
            .paillier
            .encrypt_with_nonce(&c1.alpha.modmul(&c2.alpha, &self.paillier.n), &one)?;
        let a2b1 = self.paillier.mul_fixed(&c1.beta, &c2.alpha, &one)?;
        let a1b2 = self.paillier.mul_fixed(&c2.beta, &c1.alpha, &one)?;
        let alpha = self.paillier.add(&[&a1a2, &a2b1, &a1b2])?;
        Ok(EncryptedL2 {
            alpha,
            betas: vec![BetaPair {
                beta1: c1.beta.clone(),
                beta2: c2.beta.clone(),
            }],
        })
    }

    /// Widen a level-1 value to level 2 by multiplying with the fixed
    /// encryption of one. All parties derive the identical level-2
    /// ciphertext, which the signing protocol relies on when it combines
    /// decryption shares computed independently by each participant.
    pub fn to_l2(&self, c: &EncryptedL1) -> Result<EncryptedL2> {
        let one = BigNumber::one();
        let fixed_one = self.encrypt_fixed(&one, &one, &one)?;
        self.mul(c, &fixed_one)
    }

    /// Collapse a level-1 value into a plain Paillier ciphertext of the
    /// same plaintext: `Enc(alpha; 1) * Enc(b)`.
    pub fn to_paillier(&self, c: &EncryptedL1) -> Result<Ciphertext> {
        self.validate_l1(c)?;
        let enc_alpha = self
            .paillier
            .encrypt_with_nonce(&c.alpha, &BigNumber::one())?;
        self.paillier.add(&[&c.beta, &enc_alpha])
    }

    /// Partially decrypt a level-1 value with the given key share.
    pub fn partial_decrypt_l1<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        key: &KeyShare,
        c: &EncryptedL1,
    ) -> Result<(DecryptedShareL1, DecryptShareL1Proof)> {
        self.validate_l1(c)?;
        let (beta, proof) = key.decrypt_share(rng, &self.paillier, &c.beta)?;
        Ok((
            DecryptedShareL1 {
                alpha: c.alpha.clone(),
                beta,
            },
            DecryptShareL1Proof { beta: proof },
        ))
    }

    /// Combine at least `K` level-1 decryption shares into the plaintext.
    pub fn combine_shares_l1(&self, shares: &[DecryptedShareL1]) -> Result<BigNumber> {
        let first = shares.first().ok_or(Error::EmptyInput("combine_shares_l1"))?;
        if shares.iter().any(|s| s.alpha != first.alpha) {
            return Err(Error::MalformedCiphertext(
                "level-1 shares disagree on the offset",
            ));
        }
        let betas: Vec<DecryptionShare> = shares.iter().map(|s| s.beta.clone()).collect();
        let b = self.paillier.combine_shares(&betas)?;
        Ok(bn_mod(&(b + &first.alpha), &self.paillier.n))
    }
}

impl PublicKey {
    /// Encrypt `m` to level 1 with a proof that the mask component is
    /// well-formed. The Paillier nonce is returned alongside.
    pub fn encrypt_with_proof<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        m: &BigNumber,
    ) -> Result<(EncryptedL1, BigNumber, EncryptL1Proof)> {
        let b = random_positive_bn(rng, &self.max_message);
        let (beta, nonce, proof) = self.paillier.encrypt_with_proof(rng, &b)?;
        let alpha = bn_mod(&(m - &b), &self.paillier.n);
        Ok((
            EncryptedL1 { alpha, beta },
            nonce,
            EncryptL1Proof { beta: proof },
        ))
    }
}

impl EncryptL1Proof {
    /// Verify the proof against the level-1 value it was issued for.
    pub fn verify(&self, pk: &PublicKey, c: &EncryptedL1) -> Result<()> {
        pk.validate_l1(c)?;
        self.beta.verify(&pk.paillier, &c.beta)
    }
}

impl DecryptShareL1Proof {
    /// Verify the share against the ciphertext it claims to decrypt.
    pub fn verify(
        &self,
        pk: &PublicKey,
        c: &EncryptedL1,
        share: &DecryptedShareL1,
    ) -> Result<()> {
        if share.alpha != c.alpha {
            return verify_err!("level-1 share offset does not match ciphertext");
        }
        self.beta.verify(&pk.paillier, &c.beta, &share.beta)
    }
}
