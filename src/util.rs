// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec;

use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::{
    impls::{next_u32_via_fill, next_u64_via_fill},
    CryptoRng,
    CryptoRngCore,
    RngCore,
};
use zeroize::{Zeroize, Zeroizing};

use crate::arithmetic::ArithmeticError;

/// The number of rejected draws tolerated before sampling fails.
pub(crate) const MAX_SAMPLING_ATTEMPTS: usize = 128;

/// Fill a buffer from the generator, surfacing any entropy failure.
pub(crate) fn fill<R: CryptoRngCore>(rng: &mut R, dest: &mut [u8]) -> Result<(), ArithmeticError> {
    rng.try_fill_bytes(dest)
        .map_err(|error| ArithmeticError::Entropy { code: error.code() })
}

/// Sample an integer uniformly from `[0, bound)` by rejection sampling.
///
/// The bound must be nonzero. Each draw only uses as many bits as the bound needs, so a well-behaved generator is
/// rejected less than half the time.
pub(crate) fn random_below<R: CryptoRngCore>(rng: &mut R, bound: &BigUint) -> Result<BigUint, ArithmeticError> {
    if bound.is_zero() {
        return Err(ArithmeticError::InvalidBound {
            reason: "sampling bound was zero",
        });
    }

    let bits = bound.bits();
    #[allow(clippy::cast_possible_truncation)]
    let length = bits.div_ceil(8) as usize;
    #[allow(clippy::cast_possible_truncation)]
    let excess = (length as u64 * 8 - bits) as u32;

    let mut buffer = Zeroizing::new(vec![0u8; length]);
    for _ in 0..MAX_SAMPLING_ATTEMPTS {
        fill(rng, &mut buffer)?;
        buffer[0] &= 0xffu8 >> excess;

        let candidate = BigUint::from_bytes_be(&buffer);
        if &candidate < bound {
            return Ok(candidate);
        }
    }

    Err(ArithmeticError::SamplingExhausted {
        attempts: MAX_SAMPLING_ATTEMPTS,
    })
}

/// Sample an index uniformly from `[0, bound)`.
///
/// This uses wide reduction from a 64-bit draw, so the bias is negligible for the small bounds used here.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn random_index<R: CryptoRngCore>(rng: &mut R, bound: usize) -> Result<usize, ArithmeticError> {
    if bound == 0 {
        return Err(ArithmeticError::InvalidBound {
            reason: "index bound was zero",
        });
    }

    let mut bytes = Zeroizing::new([0u8; 8]);
    fill(rng, &mut *bytes)?;

    // This can't truncate since the result is below a `usize` bound
    Ok((u64::from_le_bytes(*bytes) % bound as u64) as usize)
}

/// A generator that only produces zero.
///
/// It exists so a transcript generator can be finalized after external entropy has already been mixed in as witness
/// bytes. It must never be used as a source of randomness.
pub(crate) struct NullRng;

impl RngCore for NullRng {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.zeroize();
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);

        Ok(())
    }

    fn next_u32(&mut self) -> u32 {
        next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        next_u64_via_fill(self)
    }
}

// Only so `NullRng` meets the transcript generator's trait bound
impl CryptoRng for NullRng {}
