// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Zero-knowledge proofs binding each broadcast message to correct protocol
//! behavior. One proof type per statement, with a typed verify method;
//! there is deliberately no "verify anything" interface.

pub(crate) mod keygen;
pub(crate) mod setup;
pub(crate) mod sign;

use crate::errors::Result;
use rand::{CryptoRng, RngCore};

pub(crate) trait Proof: Sized {
    type CommonInput<'a>;
    type ProverSecret<'a>;

    fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        input: &Self::CommonInput<'_>,
        secret: &Self::ProverSecret<'_>,
    ) -> Result<Self>;

    fn verify(&self, input: &Self::CommonInput<'_>) -> Result<()>;
}
