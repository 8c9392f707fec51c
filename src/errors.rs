// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! A list of error types which are produced during an execution of the
//! protocol.

use thiserror::Error;

use crate::sign::Status;

/// The default Result type used in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error produced while running the threshold signing protocol
/// or manipulating its cryptographic data.
#[derive(Clone, Eq, PartialEq, Error, Debug)]
pub enum Error {
    /// The requested participant configuration is unusable.
    #[error("Invalid configuration: `{0}`")]
    Config(String),
    /// A zero-knowledge proof did not verify.
    #[error("Failed to verify proof: `{0}`")]
    FailedToVerifyProof(String),
    /// A proof supplied by a specific participant did not verify. The
    /// offending message must be discarded.
    #[error("Participant {party} supplied an invalid proof: `{reason}`")]
    ProofFailure {
        /// Index of the participant whose message failed verification.
        party: u8,
        /// The verification failure reported by the proof engine.
        reason: String,
    },
    /// Fewer than the threshold number of messages survived verification.
    #[error("Only {valid} valid messages available, but the protocol requires {required}")]
    InsufficientParticipants {
        /// The threshold `K` of the key.
        required: usize,
        /// How many messages actually verified.
        valid: usize,
    },
    /// A protocol method was called out of the permitted state order.
    #[error("Session is in state {actual}, but this operation requires state {expected}")]
    InvalidState {
        /// The state the session must be in for the requested operation.
        expected: Status,
        /// The state the session is actually in.
        actual: Status,
    },
    /// The session produced a degenerate value; the caller must restart the
    /// session with fresh randomness.
    #[error("Degenerate signature value: `{0}`")]
    Degenerate(&'static str),
    /// The key share has not been populated with the joint key material yet.
    #[error("Key share is missing the joint key; call set_key first")]
    KeyNotSet,
    /// A ciphertext or decryption share failed structural validation.
    #[error("Malformed ciphertext: `{0}`")]
    MalformedCiphertext(&'static str),
    /// An input list was empty where at least one element is required.
    #[error("Empty input list for `{0}`")]
    EmptyInput(&'static str),
    /// An element expected to be invertible had no inverse.
    #[error("Could not invert a BigNumber")]
    CouldNotInvertBigNumber,
    /// A BigNumber could not be converted to a curve scalar.
    #[error("Failed to convert BigNumber to a curve scalar")]
    CouldNotConvertToScalar,
    /// Curve points from different curves were mixed in one operation.
    #[error("Curve mismatch between points")]
    CurveMismatch,
    /// A curve point could not be decoded from its byte representation.
    #[error("Could not decode a curve point")]
    PointDecoding,
    /// A value could not be (de)serialized.
    #[error("Serialization Error")]
    Serialization,
    /// Represents some code assumption that was checked at runtime but
    /// failed to be true.
    #[error("Internal invariant failed")]
    InternalInvariantFailed,
    /// Reached the maximum allowed number of retries for a sampling
    /// operation.
    #[error("Reached the maximum allowed number of retries")]
    RetryFailed,
}

macro_rules! verify_err {
    ($x:expr) => {{
        Err(crate::errors::Error::FailedToVerifyProof(String::from($x)))
    }};
}

macro_rules! config_err {
    ($x:expr) => {{
        Err(crate::errors::Error::Config(String::from($x)))
    }};
}
