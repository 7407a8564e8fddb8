// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::{
    arithmetic::ArithmeticError,
    util::{fill, random_below},
};

/// The smallest supported prime size.
pub(crate) const MIN_PRIME_BITS: u64 = 16;

// Candidates drawn per requested bit before giving up
const CANDIDATES_PER_BIT: u64 = 16;

// Odd primes used to discard most candidates before Miller-Rabin
const SMALL_PRIMES: [u32; 53] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107, 109,
    113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233, 239,
    241, 251,
];

/// Generate a random prime of exactly `bits` bits.
///
/// The two most significant bits of every candidate are set, so the product of two such primes always has exactly
/// `2 * bits` bits. Candidates are screened by trial division and then tested with `rounds` rounds of Miller-Rabin
/// using random bases.
///
/// Returns an [`ArithmeticError`] if `bits` is too small, the generator fails, or no prime turns up in a reasonable
/// number of candidates.
pub fn random_prime<R: CryptoRngCore>(rng: &mut R, bits: u64, rounds: u32) -> Result<BigUint, ArithmeticError> {
    if bits < MIN_PRIME_BITS {
        return Err(ArithmeticError::InvalidBound {
            reason: "prime size was too small",
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    let length = bits.div_ceil(8) as usize;
    #[allow(clippy::cast_possible_truncation)]
    let excess = (length as u64 * 8 - bits) as u32;

    let candidates = bits.saturating_mul(CANDIDATES_PER_BIT);
    let mut buffer = Zeroizing::new(vec![0u8; length]);
    for _ in 0..candidates {
        fill(rng, &mut buffer)?;
        buffer[0] &= 0xffu8 >> excess;

        let mut candidate = BigUint::from_bytes_be(&buffer);
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(bits - 2, true);
        candidate.set_bit(0, true);

        if is_probable_prime(rng, &candidate, rounds)? {
            return Ok(candidate);
        }
    }

    Err(ArithmeticError::PrimeGenerationExhausted { bits, candidates })
}

/// Test `n` for primality.
///
/// Small values are decided exactly by trial division; everything else gets `rounds` rounds of Miller-Rabin with bases
/// drawn from `rng`. A composite passes with probability at most `4^-rounds`.
pub fn is_probable_prime<R: CryptoRngCore>(rng: &mut R, n: &BigUint, rounds: u32) -> Result<bool, ArithmeticError> {
    let two = BigUint::from(2u32);
    if n < &two {
        return Ok(false);
    }
    if n == &two {
        return Ok(true);
    }
    if n.is_even() {
        return Ok(false);
    }
    for p in SMALL_PRIMES {
        if n == &BigUint::from(p) {
            return Ok(true);
        }
        if (n % p).is_zero() {
            return Ok(false);
        }
    }

    // Write `n - 1 == d * 2^s` with `d` odd
    let n_minus_one = n - 1u32;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    // Bases are drawn from `[2, n - 2]`
    let base_range = n - 3u32;

    'witness: for _ in 0..rounds {
        let a = random_below(rng, &base_range)? + &two;
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }

        return Ok(false);
    }

    Ok(true)
}
