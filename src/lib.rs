// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Threshold ECDSA signatures.
//!
//! A set of `L` participants jointly holds shares of an ECDSA private key
//! such that any `K <= L` of them can cooperate to produce a standard
//! `(r, s)` signature under one of the NIST curves (P-224/P-256/P-384/
//! P-521), while fewer than `K` colluding participants learn nothing about
//! the key. No single party ever materializes the private key.
//!
//! The construction follows the threshold DSA scheme of Boneh, Gennaro and
//! Goldfeder (<https://eprint.iacr.org/2017/987.pdf>): the private key
//! lives inside a level-2 additively homomorphic layer (a Catalano-Fiore
//! transformation over `(K, L)`-threshold Paillier), key generation is a
//! single broadcast round, and signing is a three-round protocol plus a
//! combine step. Every broadcast value carries a Fiat-Shamir proof of
//! well-formedness, so misbehaving messages are dropped before they can
//! influence the result.
//!
//! Message transport, key-share persistence, and output canonicalization
//! (low-`s`) are deliberately out of scope: messages are plain serde
//! values the application delivers over its own authenticated medium.
//!
//! ```no_run
//! # fn main() -> threshold_ecdsa::Result<()> {
//! use threshold_ecdsa::{new_key, CurveKind, HashAlg, KeyInitMessage};
//!
//! let mut rng = rand::rngs::OsRng;
//! let (mut shares, meta) = new_key(&mut rng, 3, 2, CurveKind::P256, HashAlg::Sha256)?;
//!
//! // Key generation: one broadcast each, then everyone aggregates.
//! let msgs = shares
//!     .iter()
//!     .map(|share| share.init(&mut rng, &meta))
//!     .collect::<threshold_ecdsa::Result<Vec<KeyInitMessage>>>()?;
//! let public_key = meta.public_key(&msgs)?;
//! for share in &mut shares {
//!     share.set_key(&meta, &msgs)?;
//! }
//!
//! // Any two participants sign; each drives its own session through the
//! // same four steps, exchanging the emitted messages in between.
//! let doc = b"example document";
//! let (mut alice, digest) = shares[0].new_sig_session(&meta, doc)?;
//! let (mut bob, _) = shares[1].new_sig_session(&meta, doc)?;
//!
//! let round1 = vec![alice.round1(&mut rng)?, bob.round1(&mut rng)?];
//! let round2 = vec![
//!     alice.round2(&mut rng, &round1)?,
//!     bob.round2(&mut rng, &round1)?,
//! ];
//! let round3 = vec![
//!     alice.round3(&mut rng, &round2)?,
//!     bob.round3(&mut rng, &round2)?,
//! ];
//! let signature = alice.get_signature(&round3)?;
//! signature.verify(&public_key, &digest)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

#[macro_use]
pub mod errors;
pub mod curve;
pub mod keygen;
pub mod l2fhe;
pub mod paillier;
pub mod sign;

mod parameters;
#[cfg(test)]
mod safe_primes;
mod transcript;
mod utils;
mod zkp;

#[cfg(test)]
mod tests;

pub use curve::{CurveKind, CurvePoint};
pub use errors::{Error, Result};
pub use keygen::{new_key, KeyInitMessage, KeyMeta, KeyShare};
pub use sign::{Round1Message, Round2Message, Round3Message, SigSession, Signature, Status};
pub use utils::HashAlg;
