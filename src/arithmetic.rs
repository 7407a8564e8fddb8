// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use core::num::NonZeroU32;

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use snafu::prelude::*;

/// Errors that can arise from arithmetic and randomness operations.
#[derive(Debug, Snafu)]
pub enum ArithmeticError {
    /// Both operands of the extended Euclidean algorithm were zero.
    #[snafu(display("Both operands were zero"))]
    ZeroOperands,
    /// A value had no inverse for the requested modulus.
    #[snafu(display("The value is not invertible for the modulus"))]
    NotInvertible,
    /// A sampling bound or size was unusable.
    #[snafu(display("An invalid bound was provided: {reason}"))]
    InvalidBound {
        /// The reason for the bound error.
        reason: &'static str,
    },
    /// The random number generator failed to supply bytes.
    #[snafu(display("The entropy source failed (code {code:?})"))]
    Entropy {
        /// The error code reported by the generator, if any.
        code: Option<NonZeroU32>,
    },
    /// Rejection sampling did not produce a value in range.
    #[snafu(display("Rejection sampling gave up after {attempts} attempts"))]
    SamplingExhausted {
        /// The number of draws that were rejected.
        attempts: usize,
    },
    /// No prime was found among the candidates drawn.
    #[snafu(display("No {bits}-bit prime was found after {candidates} candidates"))]
    PrimeGenerationExhausted {
        /// The requested prime size.
        bits: u64,
        /// The number of candidates tested.
        candidates: u64,
    },
}

/// The result of the extended Euclidean algorithm.
///
/// For inputs `a` and `b`, this satisfies the Bézout identity `a*x + b*y == gcd`, where `gcd` is nonnegative.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtendedGcd {
    /// The greatest common divisor of the inputs.
    pub gcd: BigInt,
    /// The Bézout coefficient of the first input.
    pub x: BigInt,
    /// The Bézout coefficient of the second input.
    pub y: BigInt,
}

/// Run the extended Euclidean algorithm on `a` and `b`.
///
/// Returns `(gcd, x, y)` with `a*x + b*y == gcd(a, b)`. Negative inputs are supported; the returned `gcd` is always
/// nonnegative and the coefficient signs are adjusted to match. When `b == 0`, this returns `(|a|, sign(a), 0)`.
///
/// If both inputs are zero, the greatest common divisor is undefined and this returns an [`ArithmeticError`].
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> Result<ExtendedGcd, ArithmeticError> {
    if a.is_zero() && b.is_zero() {
        return Err(ArithmeticError::ZeroOperands);
    }

    // Invariants: `old_r == a*old_s + b*old_t` and `r == a*s + b*t`
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let q = &old_r / &r;

        let next_r = &old_r - &q * &r;
        old_r = core::mem::replace(&mut r, next_r);

        let next_s = &old_s - &q * &s;
        old_s = core::mem::replace(&mut s, next_s);

        let next_t = &old_t - &q * &t;
        old_t = core::mem::replace(&mut t, next_t);
    }

    // Truncated division can leave a negative remainder chain
    if old_r.is_negative() {
        old_r = -old_r;
        old_s = -old_s;
        old_t = -old_t;
    }

    Ok(ExtendedGcd {
        gcd: old_r,
        x: old_s,
        y: old_t,
    })
}

/// Compute the inverse of `value` modulo `modulus`, normalized into `[0, modulus)`.
///
/// Returns an [`ArithmeticError`] if the modulus is less than two or the value shares a factor with it.
pub fn modular_inverse(value: &BigUint, modulus: &BigUint) -> Result<BigUint, ArithmeticError> {
    if modulus <= &BigUint::one() {
        return Err(ArithmeticError::InvalidBound {
            reason: "modulus must exceed one",
        });
    }

    let modulus = BigInt::from(modulus.clone());
    let result = extended_gcd(&BigInt::from(value.clone()), &modulus)?;
    if !result.gcd.is_one() {
        return Err(ArithmeticError::NotInvertible);
    }

    result
        .x
        .mod_floor(&modulus)
        .to_biguint()
        .ok_or(ArithmeticError::NotInvertible)
}
