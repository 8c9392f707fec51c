// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Level-2 homomorphic encryption: the Catalano-Fiore transformation over
//! threshold Paillier.
//!
//! A level-1 ciphertext splits a plaintext `m` into a cleartext offset
//! `alpha` and an encrypted random mask `b` with `m = alpha + b mod N`.
//! Additions then only touch the offsets (one Paillier multiplication), and
//! a single multiplication of two level-1 values expands into three Paillier
//! additions plus one encryption, yielding a level-2 ciphertext. No further
//! multiplication is defined on level 2 - exactly the expressive range the
//! signing protocol needs.

mod level_one;
mod level_two;

pub use level_one::{DecryptShareL1Proof, DecryptedShareL1, EncryptL1Proof, EncryptedL1};
pub use level_two::{BetaPair, BetaPairShares, DecryptShareL2Proof, DecryptedShareL2, EncryptedL2};

use crate::{
    errors::{Error, Result},
    paillier,
    utils::{bn_mod, random_positive_bn},
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

/// Public key of the level-2 scheme: the threshold Paillier key plus the
/// bound on the random masks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKey {
    pub(crate) paillier: paillier::PublicKey,
    /// Masks `b` are sampled from `[0, max_message)`.
    max_message: BigNumber,
}

impl PublicKey {
    /// Wrap a threshold Paillier key, masking plaintexts with values below
    /// `2^mask_bits`.
    pub(crate) fn new(paillier: paillier::PublicKey, mask_bits: usize) -> Self {
        let max_message = BigNumber::one() << mask_bits;
        Self {
            paillier,
            max_message,
        }
    }

    /// The underlying threshold Paillier key.
    pub fn paillier(&self) -> &paillier::PublicKey {
        &self.paillier
    }

    /// The plaintext modulus `N`.
    pub fn n(&self) -> &BigNumber {
        &self.paillier.n
    }

    /// Encrypt `m` to level 1 under fresh randomness. The Paillier nonce is
    /// returned so the caller can prove statements about the ciphertext.
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        m: &BigNumber,
    ) -> Result<(EncryptedL1, BigNumber)> {
        let b = random_positive_bn(rng, &self.max_message);
        let (beta, nonce) = self.paillier.encrypt(rng, &b)?;
        let alpha = bn_mod(&(m - &b), &self.paillier.n);
        Ok((EncryptedL1 { alpha, beta }, nonce))
    }

    /// Encrypt `m` deterministically, with both the Paillier nonce `r` and
    /// the mask `b` fixed by the caller. Every party computing
    /// `encrypt_fixed` over the same inputs obtains the same ciphertext
    /// bit-for-bit.
    pub fn encrypt_fixed(
        &self,
        m: &BigNumber,
        r: &BigNumber,
        b: &BigNumber,
    ) -> Result<EncryptedL1> {
        let beta = self.paillier.encrypt_with_nonce(b, r)?;
        let alpha = bn_mod(&(m - b), &self.paillier.n);
        Ok(EncryptedL1 { alpha, beta })
    }

    pub(crate) fn validate_l1(&self, c: &EncryptedL1) -> Result<()> {
        if c.alpha < BigNumber::zero() || c.alpha >= self.paillier.n {
            return Err(Error::MalformedCiphertext("level-1 offset out of range"));
        }
        self.paillier.validate(&c.beta)
    }

    pub(crate) fn validate_l2(&self, c: &EncryptedL2) -> Result<()> {
        self.paillier.validate(&c.alpha)?;
        for pair in &c.betas {
            self.paillier.validate(&pair.beta1)?;
            self.paillier.validate(&pair.beta2)?;
        }
        Ok(())
    }
}
