// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

#[macro_use]
extern crate criterion;

use criterion::Criterion;

use threshold_ecdsa::{CurveKind, CurvePoint};
use unknown_order::BigNumber;

/// Modular exponentiation at the sizes the signing rounds use: exponents up
/// to `q^7 * N~` over a `(N^2)`-sized modulus.
fn modpow(c: &mut Criterion) {
    for num_bits in [2048usize, 4096] {
        let mut a = BigNumber::random(&(BigNumber::one() << num_bits));
        let e = BigNumber::random(&(BigNumber::one() << num_bits));
        // Any odd modulus exercises the same code path as N^2.
        let n = (BigNumber::random(&(BigNumber::one() << (num_bits - 1))) << 1) + BigNumber::one();

        c.bench_function(&format!("modpow ({num_bits} bits)"), |b| {
            b.iter(|| {
                a = a.modpow(&e, &n);
            })
        });
    }
}

/// Scalar multiplication on each supported curve.
fn base_mul(c: &mut Criterion) {
    for kind in CurveKind::ALL {
        let k = BigNumber::random(&kind.order());
        c.bench_function(&format!("base_mul ({})", kind.name()), |b| {
            b.iter(|| CurvePoint::base_mul(kind, &k).unwrap())
        });
    }
}

criterion_group!(benches, modpow, base_mul);
criterion_main!(benches);
