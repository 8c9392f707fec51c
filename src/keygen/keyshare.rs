// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use super::{join, KeyInitMessage, KeyMeta};
use crate::{
    curve::CurvePoint,
    errors::{Error, Result},
    l2fhe::EncryptedL1,
    paillier,
    utils::random_field_element,
    zkp::{
        keygen::{KeyGenInput, KeyGenProof, KeyGenSecret},
        Proof,
    },
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// The joint key material every participant stores after key generation:
/// the same values for everyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct JointKey {
    /// The level-1 encryption of the joint private key `x = sum x_i`.
    pub(crate) alpha: EncryptedL1,
    /// The joint public key `Y = x * G`.
    pub(crate) y: CurvePoint,
}

/// A participant's "piece" of the distributed key: its index, its threshold
/// Paillier decryption share, and (after [`KeyShare::set_key`]) the joint
/// encrypted private key and public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyShare {
    index: u8,
    pub(crate) paillier: paillier::KeyShare,
    joint: Option<JointKey>,
}

impl KeyShare {
    pub(crate) fn new(index: u8, paillier: paillier::KeyShare) -> Self {
        Self {
            index,
            paillier,
            joint: None,
        }
    }

    /// This participant's 0-based index.
    pub fn index(&self) -> u8 {
        self.index
    }

    pub(crate) fn joint(&self) -> Result<&JointKey> {
        self.joint.as_ref().ok_or(Error::KeyNotSet)
    }

    /// Generate this participant's key-init broadcast: a fresh private
    /// contribution `x_i`, its public point, its encryption, and the proof
    /// binding them. `x_i` is wiped before returning; only the aggregate
    /// ever matters again.
    pub fn init<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        meta: &KeyMeta,
    ) -> Result<KeyInitMessage> {
        let q = meta.q();
        let mut x_i = random_field_element(rng, &q);
        let y_i = CurvePoint::base_mul(meta.curve(), &x_i)?;
        let (alpha_i, mut nonce) = meta.pk().encrypt(rng, &x_i)?;

        let input = KeyGenInput::new(meta.pk(), meta.zk(), meta.curve(), &y_i, &alpha_i);
        let secret = KeyGenSecret::new(&x_i, &nonce);
        let proof = KeyGenProof::prove(rng, &input, &secret)?;

        x_i.zeroize();
        nonce.zeroize();

        Ok(KeyInitMessage {
            from: self.index,
            alpha_i,
            y_i,
            proof,
        })
    }

    /// Verify all `L` key-init messages and store the joint key material
    /// into this share.
    pub fn set_key(&mut self, meta: &KeyMeta, msgs: &[KeyInitMessage]) -> Result<()> {
        let (alpha, y) = join(meta, msgs)?;
        self.joint = Some(JointKey { alpha, y });
        Ok(())
    }

    /// The joint public key, once [`KeyShare::set_key`] has run.
    pub fn public_key(&self) -> Result<&CurvePoint> {
        Ok(&self.joint()?.y)
    }
}
