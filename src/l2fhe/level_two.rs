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
    paillier::{Ciphertext, DecryptShareProof, DecryptionShare, KeyShare},
    utils::bn_mod,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

/// A pair of level-1 mask ciphertexts carried by a level-2 value; each pair
/// contributes `Dec(beta1) * Dec(beta2)` to the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetaPair {
    pub(crate) beta1: Ciphertext,
    pub(crate) beta2: Ciphertext,
}

/// A level-2 encrypted value, representing
/// `Dec(alpha) + sum_j Dec(beta1_j) * Dec(beta2_j) mod N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedL2 {
    pub(crate) alpha: Ciphertext,
    pub(crate) betas: Vec<BetaPair>,
}

/// Partial decryptions of the two mask ciphertexts of one [`BetaPair`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetaPairShares {
    pub(crate) beta1: DecryptionShare,
    pub(crate) beta2: DecryptionShare,
}

/// A participant's partial decryption of a level-2 value: one share per
/// Paillier component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedShareL2 {
    pub(crate) alpha: DecryptionShare,
    pub(crate) betas: Vec<BetaPairShares>,
}

/// Proof that a [`DecryptedShareL2`] matches its ciphertext, one
/// equality-of-dlog proof per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptShareL2Proof {
    alpha: DecryptShareProof,
    betas: Vec<(DecryptShareProof, DecryptShareProof)>,
}

impl PublicKey {
    /// Add a non-empty list of level-2 values: the Paillier components
    /// multiply, the mask pairs concatenate.
    pub fn add_l2(&self, cs: &[&EncryptedL2]) -> Result<EncryptedL2> {
        if cs.is_empty() {
            return Err(Error::EmptyInput("add_l2"));
        }
        let mut alphas = Vec::with_capacity(cs.len());
        let mut betas = Vec::new();
        for c in cs {
            self.validate_l2(c)?;
            alphas.push(&c.alpha);
            betas.extend(c.betas.iter().cloned());
        }
        let alpha = self.paillier.add(&alphas)?;
        Ok(EncryptedL2 { alpha, betas })
    }

    /// Multiply a level-2 value by a signed constant: the constant goes
    /// into the Paillier component and the first element of every mask
    /// pair. Deterministic.
    pub fn mul_const_l2(&self, c: &EncryptedL2, k: &BigNumber) -> Result<EncryptedL2> {
        self.validate_l2(c)?;
        let one = BigNumber::one();
        let alpha = self.paillier.mul_fixed(&c.alpha, k, &one)?;
        let betas = c
            .betas
            .iter()
            .map(|pair| {
                Ok(BetaPair {
                    beta1: self.paillier.mul_fixed(&pair.beta1, k, &one)?,
                    beta2: pair.beta2.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EncryptedL2 { alpha, betas })
    }

    /// Partially decrypt a level-2 value with the given key share.
    pub fn partial_decrypt_l2<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        key: &KeyShare,
        c: &EncryptedL2,
    ) -> Result<(DecryptedShareL2, DecryptShareL2Proof)> {
        self.validate_l2(c)?;
        let (alpha, alpha_proof) = key.decrypt_share(rng, &self.paillier, &c.alpha)?;
        let mut beta_shares = Vec::with_capacity(c.betas.len());
        let mut beta_proofs = Vec::with_capacity(c.betas.len());
        for pair in &c.betas {
            let (s1, p1) = key.decrypt_share(rng, &self.paillier, &pair.beta1)?;
            let (s2, p2) = key.decrypt_share(rng, &self.paillier, &pair.beta2)?;
            beta_shares.push(BetaPairShares { beta1: s1, beta2: s2 });
            beta_proofs.push((p1, p2));
        }
        Ok((
            DecryptedShareL2 {
                alpha,
                betas: beta_shares,
            },
            DecryptShareL2Proof {
                alpha: alpha_proof,
                betas: beta_proofs,
            },
        ))
    }

    /// Combine at least `K` level-2 decryption shares into the plaintext:
    /// recover the Paillier component and every mask, then add the mask
    /// products back in.
    pub fn combine_shares_l2(&self, shares: &[DecryptedShareL2]) -> Result<BigNumber> {
        let first = shares.first().ok_or(Error::EmptyInput("combine_shares_l2"))?;
        let pair_count = first.betas.len();
        if shares.iter().any(|s| s.betas.len() != pair_count) {
            return Err(Error::MalformedCiphertext(
                "level-2 shares disagree on the mask pair count",
            ));
        }

        let alpha_shares: Vec<DecryptionShare> = shares.iter().map(|s| s.alpha.clone()).collect();
        let mut decrypted = self.paillier.combine_shares(&alpha_shares)?;

        for i in 0..pair_count {
            let beta1_shares: Vec<DecryptionShare> =
                shares.iter().map(|s| s.betas[i].beta1.clone()).collect();
            let beta2_shares: Vec<DecryptionShare> =
                shares.iter().map(|s| s.betas[i].beta2.clone()).collect();
            let b1 = self.paillier.combine_shares(&beta1_shares)?;
            let b2 = self.paillier.combine_shares(&beta2_shares)?;
            decrypted = bn_mod(&(decrypted + b1 * b2), &self.paillier.n);
        }
        Ok(decrypted)
    }
}

impl DecryptShareL2Proof {
    /// Verify the share against the ciphertext it claims to decrypt,
    /// component by component.
    pub fn verify(
        &self,
        pk: &PublicKey,
        c: &EncryptedL2,
        share: &DecryptedShareL2,
    ) -> Result<()> {
        if self.betas.len() != c.betas.len() || share.betas.len() != c.betas.len() {
            return verify_err!("level-2 share component count does not match ciphertext");
        }
        self.alpha.verify(&pk.paillier, &c.alpha, &share.alpha)?;
        for ((proofs, pair), pair_shares) in
            self.betas.iter().zip(&c.betas).zip(&share.betas)
        {
            proofs.0.verify(&pk.paillier, &pair.beta1, &pair_shares.beta1)?;
            proofs.1.verify(&pk.paillier, &pair.beta2, &pair_shares.beta2)?;
        }
        Ok(())
    }
}
