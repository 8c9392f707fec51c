//! Types and functions related to the key generation sub-protocol.
// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Distributed key generation, in a single round: every participant
//! broadcasts an encrypted contribution to the private key together with
//! its public-key share and a proof tying the two together. Aggregating all
//! `L` contributions yields the encrypted joint private key
//! `alpha = Enc(sum x_i)` and the joint public key `Y = (sum x_i) * G`,
//! which every share stores. No party ever sees `sum x_i`.

mod keyshare;
mod meta;

pub use keyshare::KeyShare;
pub use meta::{new_key, KeyMeta};

#[cfg(test)]
pub(crate) use meta::testing;

use crate::{
    curve::CurvePoint,
    errors::{Error, Result},
    l2fhe::EncryptedL1,
    zkp::{
        keygen::{KeyGenInput, KeyGenProof},
        Proof,
    },
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The message each participant broadcasts during key generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyInitMessage {
    /// Index of the participant this message originates from.
    pub from: u8,
    /// The level-1 encryption of the sender's private contribution `x_i`.
    pub(crate) alpha_i: EncryptedL1,
    /// The sender's public-key share `y_i = x_i * G`.
    pub(crate) y_i: CurvePoint,
    /// Proof that `alpha_i` encrypts the discrete log of `y_i`.
    pub(crate) proof: KeyGenProof,
}

/// Verify and aggregate exactly `L` key-init messages into the encrypted
/// joint private key and the joint public key.
pub(crate) fn join(
    meta: &KeyMeta,
    msgs: &[KeyInitMessage],
) -> Result<(EncryptedL1, CurvePoint)> {
    let l = usize::from(meta.l());
    if msgs.len() != l {
        return config_err!(format!(
            "key generation requires exactly {} messages, got {}",
            l,
            msgs.len()
        ));
    }
    let mut seen = vec![false; l];
    for msg in msgs {
        let index = usize::from(msg.from);
        if index >= l || seen[index] {
            return config_err!(format!(
                "duplicate or out-of-range participant index {}",
                msg.from
            ));
        }
        seen[index] = true;
    }

    for msg in msgs {
        let input = KeyGenInput::new(
            meta.pk(),
            meta.zk(),
            meta.curve(),
            &msg.y_i,
            &msg.alpha_i,
        );
        msg.proof.verify(&input).map_err(|err| {
            warn!(party = msg.from, %err, "dropping key-init message with invalid proof");
            Error::ProofFailure {
                party: msg.from,
                reason: err.to_string(),
            }
        })?;
    }

    let alphas: Vec<&EncryptedL1> = msgs.iter().map(|m| &m.alpha_i).collect();
    let alpha = meta.pk().add_l1(&alphas)?;
    let y = CurvePoint::sum(meta.curve(), msgs.iter().map(|m| &m.y_i))?;
    Ok((alpha, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{get_seeded_rng, get_test_rng};
    use crate::utils::HashAlg;
    use crate::CurveKind;

    #[test]
    fn keygen_aggregates_and_verifies() {
        let mut rng = get_test_rng();
        let (mut shares, meta) = meta::testing::test_key(&mut rng, 3, 2, CurveKind::P224);
        let msgs: Vec<KeyInitMessage> = shares
            .iter()
            .map(|s| s.init(&mut rng, &meta).unwrap())
            .collect();

        let y = meta.public_key(&msgs).unwrap();
        for share in &mut shares {
            share.set_key(&meta, &msgs).unwrap();
            assert_eq!(share.joint().unwrap().y, y);
        }
    }

    #[test]
    fn tampered_keygen_proof_names_the_party() {
        let mut rng = get_test_rng();
        let (shares, meta) = meta::testing::test_key(&mut rng, 3, 2, CurveKind::P224);
        let mut msgs: Vec<KeyInitMessage> = shares
            .iter()
            .map(|s| s.init(&mut rng, &meta).unwrap())
            .collect();
        msgs[1].proof.s1 = &msgs[1].proof.s1 + unknown_order::BigNumber::one();

        match join(&meta, &msgs) {
            Err(Error::ProofFailure { party: 1, .. }) => {}
            other => panic!("expected ProofFailure for party 1, got {other:?}"),
        }
    }

    #[test]
    fn wrong_message_count_is_rejected() {
        let mut rng = get_test_rng();
        let (shares, meta) = meta::testing::test_key(&mut rng, 3, 2, CurveKind::P224);
        let msgs: Vec<KeyInitMessage> = shares[..2]
            .iter()
            .map(|s| s.init(&mut rng, &meta).unwrap())
            .collect();
        assert!(matches!(join(&meta, &msgs), Err(Error::Config(_))));
    }

    #[test]
    fn config_validation() {
        let mut rng = get_seeded_rng(9);
        assert!(matches!(
            new_key(&mut rng, 1, 1, CurveKind::P224, HashAlg::Sha256),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            new_key(&mut rng, 3, 4, CurveKind::P224, HashAlg::Sha256),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            new_key(&mut rng, 3, 1, CurveKind::P224, HashAlg::Sha256),
            Err(Error::Config(_))
        ));
    }
}
