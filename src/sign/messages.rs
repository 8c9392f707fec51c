// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The three broadcast message types of a signing session, and the
//! verify-and-aggregate step each round applies to the messages it
//! receives.
//!
//! Aggregation is deterministic: messages are considered in originator
//! index order (duplicates dropped), failing proofs are discarded with a
//! warning, and the first `K` messages that verify are used. Every honest
//! participant therefore aggregates exactly the same subset.

use crate::{
    curve::CurvePoint,
    errors::{Error, Result},
    keygen::KeyMeta,
    l2fhe::{DecryptShareL2Proof, DecryptedShareL2, EncryptedL1, EncryptedL2},
    utils::bn_mod,
    zkp::{
        sign::{SigRoundInput, SigRoundProof},
        Proof,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;
use unknown_order::BigNumber;

/// Broadcast after Round 1: the commitments to this participant's
/// per-signature randomness, with the proof of their well-formedness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round1Message {
    /// Index of the participant this message originates from.
    pub from: u8,
    /// `R_i = k_i * G`.
    pub(crate) r_i: CurvePoint,
    /// `u_i = Enc(rho_i)`.
    pub(crate) u_i: EncryptedL1,
    /// `v_i = Enc(k_i)`.
    pub(crate) v_i: EncryptedL1,
    /// `w_i = Enc(c_i)`.
    pub(crate) w_i: EncryptedL1,
    pub(crate) proof: SigRoundProof,
}

/// Broadcast after Round 2: this participant's partial decryption of the
/// jointly computed `z = Enc(k * rho + q * c)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round2Message {
    /// Index of the participant this message originates from.
    pub from: u8,
    pub(crate) pd_z: DecryptedShareL2,
    pub(crate) proof: DecryptShareL2Proof,
}

/// Broadcast after Round 3: this participant's partial decryption of the
/// jointly computed `sigma = Enc((m + r * x) / k)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round3Message {
    /// Index of the participant this message originates from.
    pub from: u8,
    pub(crate) pd_sigma: DecryptedShareL2,
    pub(crate) proof: DecryptShareL2Proof,
}

/// Keep the first message per originator, in index order.
fn dedup_by_origin<M>(msgs: &[M], index: impl Fn(&M) -> u8) -> Vec<&M> {
    let mut by_index: BTreeMap<u8, &M> = BTreeMap::new();
    for msg in msgs {
        by_index.entry(index(msg)).or_insert(msg);
    }
    by_index.into_values().collect()
}

/// Verify the received Round 1 messages and aggregate the first `K` valid
/// ones into `(R, u, v, w)`.
pub(crate) fn join_round1(
    meta: &KeyMeta,
    msgs: &[Round1Message],
) -> Result<(CurvePoint, EncryptedL1, EncryptedL1, EncryptedL1)> {
    let k = usize::from(meta.k());
    let mut valid: Vec<&Round1Message> = Vec::with_capacity(k);
    for msg in dedup_by_origin(msgs, |m| m.from) {
        let input = SigRoundInput::new(
            meta.pk(),
            meta.zk(),
            meta.curve(),
            &msg.r_i,
            &msg.v_i,
            &msg.u_i,
            &msg.w_i,
        );
        match msg.proof.verify(&input) {
            Ok(()) => {
                valid.push(msg);
                if valid.len() == k {
                    break;
                }
            }
            Err(err) => {
                warn!(party = msg.from, %err, "dropping round 1 message with invalid proof");
            }
        }
    }
    if valid.len() < k {
        return Err(Error::InsufficientParticipants {
            required: k,
            valid: valid.len(),
        });
    }

    let r = CurvePoint::sum(meta.curve(), valid.iter().map(|m| &m.r_i))?;
    let us: Vec<&EncryptedL1> = valid.iter().map(|m| &m.u_i).collect();
    let vs: Vec<&EncryptedL1> = valid.iter().map(|m| &m.v_i).collect();
    let ws: Vec<&EncryptedL1> = valid.iter().map(|m| &m.w_i).collect();
    Ok((
        r,
        meta.pk().add_l1(&us)?,
        meta.pk().add_l1(&vs)?,
        meta.pk().add_l1(&ws)?,
    ))
}

/// Verify the received Round 2 messages against the locally computed `z`
/// and combine the first `K` valid decryption shares into
/// `nu = k * rho mod q`.
pub(crate) fn join_round2(
    meta: &KeyMeta,
    z: &EncryptedL2,
    msgs: &[Round2Message],
) -> Result<BigNumber> {
    let shares = collect_decryption_shares(
        meta,
        z,
        msgs,
        |m| m.from,
        |m| (&m.pd_z, &m.proof),
        "round 2",
    )?;
    let combined = meta.pk().combine_shares_l2(&shares)?;

    // The plaintext k * rho + q * c is symmetric around zero; lift the
    // mod-N representative back to (-N/2, N/2] before reducing mod q, or
    // the q * c term would not vanish.
    let n = meta.pk().n().clone();
    let half = n.clone() / BigNumber::from(2u64);
    let centered = if combined > half { combined - n } else { combined };
    Ok(bn_mod(&centered, &meta.q()))
}

/// Verify the received Round 3 messages against the locally computed
/// `sigma` and combine the first `K` valid decryption shares into
/// `s = (m + r * x) / k mod q`.
pub(crate) fn join_round3(
    meta: &KeyMeta,
    sigma: &EncryptedL2,
    msgs: &[Round3Message],
) -> Result<BigNumber> {
    let shares = collect_decryption_shares(
        meta,
        sigma,
        msgs,
        |m| m.from,
        |m| (&m.pd_sigma, &m.proof),
        "round 3",
    )?;
    let combined = meta.pk().combine_shares_l2(&shares)?;
    Ok(bn_mod(&combined, &meta.q()))
}

fn collect_decryption_shares<'a, M>(
    meta: &KeyMeta,
    ciphertext: &EncryptedL2,
    msgs: &'a [M],
    index: impl Fn(&M) -> u8,
    parts: impl Fn(&'a M) -> (&'a DecryptedShareL2, &'a DecryptShareL2Proof),
    round: &'static str,
) -> Result<Vec<DecryptedShareL2>> {
    let k = usize::from(meta.k());
    let mut valid: Vec<DecryptedShareL2> = Vec::with_capacity(k);
    for msg in dedup_by_origin(msgs, &index) {
        let (share, proof) = parts(msg);
        match proof.verify(meta.pk(), ciphertext, share) {
            Ok(()) => {
                valid.push(share.clone());
                if valid.len() == k {
                    break;
                }
            }
            Err(err) => {
                warn!(
                    party = index(msg),
                    %err,
                    "dropping {round} message with invalid decryption share"
                );
            }
        }
    }
    if valid.len() < k {
        return Err(Error::InsufficientParticipants {
            required: k,
            valid: valid.len(),
        });
    }
    Ok(valid)
}
