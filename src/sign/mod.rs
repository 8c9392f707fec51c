// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The signing state machine. Each participant drives one [`SigSession`]
//! per message through three broadcast rounds plus a combine step:
//!
//! ```text
//! NotInited --round1()--> Round1 --round2(msgs1)--> Round2
//!                                --round3(msgs2)--> Round3
//!                                --get_signature(msgs3)--> Finished
//! ```
//!
//! Round 1 commits to the per-signature randomness, Round 2 jointly
//! decrypts the blinded nonce product `k * rho + q * c`, Round 3 jointly
//! decrypts `(m + r * x) / k`, and the combine step reduces the result to
//! the standard ECDSA pair `(r, s)`.

mod messages;
mod session;

pub use messages::{Round1Message, Round2Message, Round3Message};
pub use session::SigSession;

use crate::{
    curve::{CurveKind, CurvePoint},
    errors::{Error, Result},
    utils::{bn_mod, hash_to_int},
};
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

/// The current state of a [`SigSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Status {
    /// not inited
    NotInited,
    /// round 1
    Round1,
    /// round 2
    Round2,
    /// round 3
    Round3,
    /// finished
    Finished,
}

/// A standard ECDSA signature, verifiable by any stock verifier for the
/// configured curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    r: BigNumber,
    s: BigNumber,
}

impl Signature {
    pub(crate) fn new(r: BigNumber, s: BigNumber) -> Self {
        Self { r, s }
    }

    /// The `r` component, in `[1, q)`.
    pub fn r(&self) -> &BigNumber {
        &self.r
    }

    /// The `s` component, in `[1, q)`.
    pub fn s(&self) -> &BigNumber {
        &self.s
    }

    /// Serialize as the fixed-width big-endian concatenation `r || s`,
    /// each component padded to the byte length of the curve order.
    pub fn to_bytes(&self, curve: CurveKind) -> Vec<u8> {
        let width = (curve.order().bit_length() + 7) / 8;
        let mut out = vec![0u8; 2 * width];
        let r = self.r.to_bytes();
        let s = self.s.to_bytes();
        out[width - r.len()..width].copy_from_slice(&r);
        out[2 * width - s.len()..].copy_from_slice(&s);
        out
    }

    /// Parse a fixed-width `r || s` encoding, checking both components
    /// against the curve order.
    pub fn from_bytes(curve: CurveKind, bytes: &[u8]) -> Result<Self> {
        let q = curve.order();
        let width = (q.bit_length() + 7) / 8;
        if bytes.len() != 2 * width {
            return Err(Error::Serialization);
        }
        let r = BigNumber::from_slice(&bytes[..width]);
        let s = BigNumber::from_slice(&bytes[width..]);
        let one = BigNumber::one();
        if r < one || r >= q || s < one || s >= q {
            return Err(Error::Serialization);
        }
        Ok(Self { r, s })
    }

    /// Verify this signature over a document digest against a public key.
    pub fn verify(&self, public_key: &CurvePoint, digest: &[u8]) -> Result<()> {
        let q = public_key.curve().order();
        let one = BigNumber::one();
        if self.r < one || self.r >= q || self.s < one || self.s >= q {
            return verify_err!("signature component out of range");
        }
        let m = hash_to_int(digest, &q);
        let w = self.s.invert(&q).ok_or(Error::CouldNotInvertBigNumber)?;
        let u1 = m.modmul(&w, &q);
        let u2 = self.r.modmul(&w, &q);
        let point = CurvePoint::base_mul(public_key.curve(), &u1)?
            .add(&public_key.mul(&u2)?)?;
        if point.is_identity() || bn_mod(&point.x(), &q) != self.r {
            return verify_err!("ecdsa verification equation failed");
        }
        Ok(())
    }
}
