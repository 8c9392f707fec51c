// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Canonical Fiat-Shamir transcript.
//!
//! Every proof derives its challenge from a SHA-256 hash over the canonical
//! encoding of its public values, appended in a fixed, documented order with
//! no framing between items:
//!
//! - big integers: a 4-byte big-endian length prefix followed by the
//!   minimum-length big-endian magnitude (zero encodes as a zero-length
//!   item). Values appended here are always canonical nonnegative residues.
//! - curve points: SEC1 uncompressed form (the identity encodes as the
//!   single byte `0x00`).
//!
//! Interoperating implementations must agree on this encoding bit-exactly.
//! A transcript is a per-call value; it is never shared or reused.

use crate::curve::CurvePoint;
use sha2::{Digest, Sha256};
use unknown_order::BigNumber;

pub(crate) struct Transcript {
    hash: Sha256,
}

impl Transcript {
    pub(crate) fn new() -> Self {
        Self { hash: Sha256::new() }
    }

    /// Append a raw label, for domain separation of internal proofs. The
    /// two protocol proofs of the signing scheme do not use labels; their
    /// transcripts are exactly the documented field sequences.
    pub(crate) fn append_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.hash.update(bytes);
        self
    }

    /// Append a nonnegative integer in canonical form.
    pub(crate) fn append_bn(&mut self, x: &BigNumber) -> &mut Self {
        debug_assert!(x >= &BigNumber::zero());
        let bytes = x.to_bytes();
        self.hash.update((bytes.len() as u32).to_be_bytes());
        self.hash.update(&bytes);
        self
    }

    /// Append a curve point in SEC1 uncompressed form.
    pub(crate) fn append_point(&mut self, p: &CurvePoint) -> &mut Self {
        self.hash.update(p.to_bytes());
        self
    }

    /// Consume the transcript and produce the challenge integer `e`. The
    /// full 256-bit digest is used; callers must not truncate it.
    pub(crate) fn challenge(self) -> BigNumber {
        BigNumber::from_slice(self.hash.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_is_deterministic() {
        let mut t1 = Transcript::new();
        let mut t2 = Transcript::new();
        for t in [&mut t1, &mut t2] {
            t.append_bn(&BigNumber::from(42u64));
            t.append_bn(&BigNumber::zero());
        }
        assert_eq!(t1.challenge(), t2.challenge());
    }

    #[test]
    fn length_prefix_separates_items() {
        // (0x0102, 0x03) and (0x01, 0x0203) concatenate to the same raw
        // bytes; the length prefixes must keep them apart.
        let mut t1 = Transcript::new();
        t1.append_bn(&BigNumber::from(0x0102u64));
        t1.append_bn(&BigNumber::from(0x03u64));
        let mut t2 = Transcript::new();
        t2.append_bn(&BigNumber::from(0x01u64));
        t2.append_bn(&BigNumber::from(0x0203u64));
        assert_ne!(t1.challenge(), t2.challenge());
    }
}
