// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Curve and point algebra over the four supported NIST curves.
//!
//! The signing protocol works almost entirely in [`BigNumber`] space;
//! points enter only as `k*G` commitments and the joint public key. The
//! curve is chosen at runtime, so [`CurvePoint`] is an enum over the four
//! RustCrypto projective point types, and scalars are bridged from
//! [`BigNumber`] by reduction modulo the curve order. The reduction maps a
//! negative scalar to its canonical residue, so `base_mul(-k)` equals
//! `neg(base_mul(k))` without further bookkeeping.

use crate::{
    errors::{Error, Result},
    utils::bn_mod,
};
use elliptic_curve::{
    ff::PrimeField,
    group::Group,
    sec1::{FromEncodedPoint, ToEncodedPoint},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use unknown_order::BigNumber;

/// Identifies one of the supported curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CurveKind {
    /// NIST P-224 (secp224r1)
    P224,
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
    /// NIST P-521 (secp521r1)
    P521,
}

/// A point on one of the supported curves.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CurvePoint {
    /// A NIST P-224 point.
    P224(p224::ProjectivePoint),
    /// A NIST P-256 point.
    P256(p256::ProjectivePoint),
    /// A NIST P-384 point.
    P384(p384::ProjectivePoint),
    /// A NIST P-521 point.
    P521(p521::ProjectivePoint),
}

/// Convert a (possibly negative) integer into a scalar of the given field
/// by canonical reduction modulo the curve order.
fn scalar_from_bn<S: PrimeField>(x: &BigNumber, q: &BigNumber) -> Result<S> {
    let reduced = bn_mod(x, q);
    let bytes = reduced.to_bytes();
    let mut repr = S::Repr::default();
    let repr_len = repr.as_ref().len();
    if bytes.len() > repr_len {
        return Err(Error::CouldNotConvertToScalar);
    }
    repr.as_mut()[repr_len - bytes.len()..].copy_from_slice(&bytes);
    Option::<S>::from(S::from_repr(repr)).ok_or(Error::CouldNotConvertToScalar)
}

macro_rules! impl_curve_dispatch {
    ($(($kind:ident, $krate:ident)),+ $(,)?) => {
        impl CurveKind {
            /// All supported curves, in order.
            pub const ALL: [CurveKind; 4] =
                [CurveKind::P224, CurveKind::P256, CurveKind::P384, CurveKind::P521];

            /// The order `q` of the curve's scalar field.
            pub fn order(&self) -> BigNumber {
                let modulus = match self {
                    $(CurveKind::$kind => <$krate::Scalar as PrimeField>::MODULUS,)+
                };
                let trimmed = modulus.trim_start_matches("0x");
                let padded = if trimmed.len() % 2 == 1 {
                    format!("0{trimmed}")
                } else {
                    trimmed.to_string()
                };
                let bytes = hex::decode(padded).expect("curve order constant is valid hex");
                BigNumber::from_slice(bytes)
            }

            /// The standard name of the curve.
            pub fn name(&self) -> &'static str {
                match self {
                    CurveKind::P224 => "P-224",
                    CurveKind::P256 => "P-256",
                    CurveKind::P384 => "P-384",
                    CurveKind::P521 => "P-521",
                }
            }
        }

        impl CurvePoint {
            /// The identity point of the given curve.
            pub fn identity(kind: CurveKind) -> Self {
                match kind {
                    $(CurveKind::$kind => {
                        CurvePoint::$kind(<$krate::ProjectivePoint as Group>::identity())
                    })+
                }
            }

            /// The base point `G` of the given curve.
            pub fn generator(kind: CurveKind) -> Self {
                match kind {
                    $(CurveKind::$kind => {
                        CurvePoint::$kind(<$krate::ProjectivePoint as Group>::generator())
                    })+
                }
            }

            /// Compute `k * G` for a signed integer scalar.
            pub fn base_mul(kind: CurveKind, k: &BigNumber) -> Result<Self> {
                Self::generator(kind).mul(k)
            }

            /// The curve this point belongs to.
            pub fn curve(&self) -> CurveKind {
                match self {
                    $(CurvePoint::$kind(_) => CurveKind::$kind,)+
                }
            }

            /// Multiply this point by a signed integer scalar.
            pub fn mul(&self, k: &BigNumber) -> Result<Self> {
                let q = self.curve().order();
                match self {
                    $(CurvePoint::$kind(p) => {
                        let s = scalar_from_bn::<$krate::Scalar>(k, &q)?;
                        Ok(CurvePoint::$kind(*p * s))
                    })+
                }
            }

            /// Add two points of the same curve.
            pub fn add(&self, rhs: &Self) -> Result<Self> {
                match (self, rhs) {
                    $((CurvePoint::$kind(a), CurvePoint::$kind(b)) => {
                        Ok(CurvePoint::$kind(*a + *b))
                    })+
                    _ => Err(Error::CurveMismatch),
                }
            }

            /// Negate this point.
            pub fn neg(&self) -> Self {
                match self {
                    $(CurvePoint::$kind(p) => CurvePoint::$kind(-*p),)+
                }
            }

            /// Whether this point is the identity.
            pub fn is_identity(&self) -> bool {
                match self {
                    $(CurvePoint::$kind(p) => bool::from(p.is_identity()),)+
                }
            }

            /// Serialize to SEC1 uncompressed form. The identity encodes as
            /// the single byte `0x00`.
            pub fn to_bytes(&self) -> Vec<u8> {
                match self {
                    $(CurvePoint::$kind(p) => {
                        p.to_affine().to_encoded_point(false).as_bytes().to_vec()
                    })+
                }
            }

            /// Serialize to SEC1 compressed form.
            pub fn to_compressed_bytes(&self) -> Vec<u8> {
                match self {
                    $(CurvePoint::$kind(p) => {
                        p.to_affine().to_encoded_point(true).as_bytes().to_vec()
                    })+
                }
            }

            /// Deserialize a point of the given curve from SEC1 bytes,
            /// compressed or uncompressed.
            pub fn from_bytes(kind: CurveKind, bytes: &[u8]) -> Result<Self> {
                match kind {
                    $(CurveKind::$kind => {
                        let encoded = $krate::EncodedPoint::from_bytes(bytes)
                            .map_err(|_| Error::PointDecoding)?;
                        let affine = Option::<$krate::AffinePoint>::from(
                            $krate::AffinePoint::from_encoded_point(&encoded),
                        )
                        .ok_or(Error::PointDecoding)?;
                        Ok(CurvePoint::$kind($krate::ProjectivePoint::from(affine)))
                    })+
                }
            }

            /// The affine x-coordinate as an integer (zero for the
            /// identity).
            pub fn x(&self) -> BigNumber {
                match self {
                    $(CurvePoint::$kind(p) => {
                        match p.to_affine().to_encoded_point(false).x() {
                            Some(x) => BigNumber::from_slice(x.as_slice()),
                            None => BigNumber::zero(),
                        }
                    })+
                }
            }

            /// The affine y-coordinate as an integer (zero for the
            /// identity).
            pub fn y(&self) -> BigNumber {
                match self {
                    $(CurvePoint::$kind(p) => {
                        match p.to_affine().to_encoded_point(false).y() {
                            Some(y) => BigNumber::from_slice(y.as_slice()),
                            None => BigNumber::zero(),
                        }
                    })+
                }
            }
        }
    };
}

impl_curve_dispatch!((P224, p224), (P256, p256), (P384, p384), (P521, p521));

impl CurvePoint {
    /// Sum a non-empty sequence of points of the given curve.
    pub fn sum<'a>(
        kind: CurveKind,
        points: impl IntoIterator<Item = &'a CurvePoint>,
    ) -> Result<Self> {
        let mut acc = Self::identity(kind);
        for p in points {
            acc = acc.add(p)?;
        }
        Ok(acc)
    }
}

/// Points carry a total order, lexicographic on the affine `(X, Y)` pair
/// (points of different curves order by curve). This is used only to feed
/// hash transcripts deterministically; it has no geometric meaning.
impl Ord for CurvePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.curve()
            .cmp(&other.curve())
            .then_with(|| self.to_bytes().cmp(&other.to_bytes()))
    }
}

impl PartialOrd for CurvePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for CurvePoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.curve(), self.to_bytes()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CurvePoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (kind, bytes): (CurveKind, Vec<u8>) = Deserialize::deserialize(deserializer)?;
        CurvePoint::from_bytes(kind, &bytes).map_err(serde::de::Error::custom)
    }
}
