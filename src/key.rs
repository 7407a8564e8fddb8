// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use snafu::prelude::*;
use tracing::trace;

use crate::{
    arithmetic::{modular_inverse, ArithmeticError},
    color::{Color, COLOR_BITS},
    commitment::Commitment,
    parameters::Parameters,
    prime::random_prime,
    util::random_below,
};

/// An ephemeral per-vertex trapdoor key for a single round.
///
/// The key holds a random mask whose low-order bits encode the vertex color, two primes `P` and `Q`, the modulus
/// `N = P*Q`, and an exponent pair `(d, c)` with `d*c == 1 mod (P-1)(Q-1)`. Only `(N, d)` and the encrypted mask are
/// ever published; see [`RoundKey::commit`].
///
/// A key must never outlive the round that generated it.
#[derive(Clone)]
pub struct RoundKey {
    color: Color,
    mask: BigUint,
    prime_p: BigUint,
    prime_q: BigUint,
    modulus: BigUint,
    public_exponent: BigUint,
    secret_exponent: BigUint,
}

/// Errors that can arise relating to [`RoundKey`].
#[derive(Debug, Snafu)]
pub enum KeyError {
    /// Sampling or prime generation failed.
    #[snafu(display("Arithmetic failure during key generation: {source}"))]
    Arithmetic {
        /// The underlying failure.
        source: ArithmeticError,
    },
    /// No public exponent coprime to the totient was found.
    #[snafu(display("No invertible public exponent after {attempts} attempts"))]
    KeyGenerationExhausted {
        /// The number of exponents drawn.
        attempts: u32,
    },
}

impl From<ArithmeticError> for KeyError {
    fn from(source: ArithmeticError) -> Self {
        KeyError::Arithmetic { source }
    }
}

impl RoundKey {
    /// Generate a new random [`RoundKey`] for a vertex of the given [`Color`].
    ///
    /// The mask is drawn from `[0, 10^k)` and its lowest two bits are overwritten with the color ordinal. The public
    /// exponent is redrawn from the same range until it is coprime to the totient, up to the cap set by
    /// [`Parameters`].
    ///
    /// Returns a [`KeyError`] if the generator fails or the cap is reached. Generator failures are never retried.
    pub fn generate<R: CryptoRngCore>(params: &Parameters, color: Color, rng: &mut R) -> Result<Self, KeyError> {
        let mut mask = random_below(rng, params.get_mask_bound())?;
        let ordinal = color.ordinal();
        for bit in 0..COLOR_BITS {
            mask.set_bit(bit, (ordinal >> bit) & 1 == 1);
        }

        let prime_p = random_prime(rng, params.get_prime_bits(), params.get_primality_rounds())?;
        let mut prime_q = random_prime(rng, params.get_prime_bits(), params.get_primality_rounds())?;
        while prime_q == prime_p {
            prime_q = random_prime(rng, params.get_prime_bits(), params.get_primality_rounds())?;
        }

        let modulus = &prime_p * &prime_q;
        let totient = (&prime_p - 1u32) * (&prime_q - 1u32);

        for attempt in 1..=params.get_max_exponent_attempts() {
            let public_exponent = random_below(rng, params.get_mask_bound())?;
            let secret_exponent = match modular_inverse(&public_exponent, &totient) {
                Ok(secret_exponent) => secret_exponent,
                Err(ArithmeticError::NotInvertible | ArithmeticError::ZeroOperands) => {
                    trace!(attempt, "public exponent was not coprime to the totient");
                    continue;
                },
                Err(error) => return Err(error.into()),
            };

            return Ok(Self {
                color,
                mask,
                prime_p,
                prime_q,
                modulus,
                public_exponent,
                secret_exponent,
            });
        }

        Err(KeyError::KeyGenerationExhausted {
            attempts: params.get_max_exponent_attempts(),
        })
    }

    /// Publish the [`Commitment`] `(N, d, Z)` for this key, where `Z = mask^d mod N`.
    pub fn commit(&self) -> Commitment {
        Commitment::new(
            &self.modulus,
            &self.public_exponent,
            &self.mask.modpow(&self.public_exponent, &self.modulus),
        )
    }

    /// Get the color this key encodes.
    pub fn get_color(&self) -> Color {
        self.color
    }

    /// Get the mask.
    pub fn get_mask(&self) -> &BigUint {
        &self.mask
    }

    /// Get the prime `P`.
    pub fn get_prime_p(&self) -> &BigUint {
        &self.prime_p
    }

    /// Get the prime `Q`.
    pub fn get_prime_q(&self) -> &BigUint {
        &self.prime_q
    }

    /// Get the modulus `N`.
    pub fn get_modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Get the public exponent `d`.
    pub fn get_public_exponent(&self) -> &BigUint {
        &self.public_exponent
    }

    /// Get the secret exponent `c`.
    pub fn get_secret_exponent(&self) -> &BigUint {
        &self.secret_exponent
    }

    /// Compute the totient `(P-1)(Q-1)`.
    pub fn compute_totient(&self) -> BigUint {
        (&self.prime_p - 1u32) * (&self.prime_q - 1u32)
    }
}

#[cfg(test)]
mod test {
    use num_bigint::{BigInt, BigUint};
    use num_integer::Integer;
    use num_traits::One;
    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::*;
    use crate::{parameters::SecurityLevel, util::test::FailingRng};

    #[test]
    fn test_key_invariants() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let params = Parameters::from_level(SecurityLevel::Toy);

        for _ in 0..8 {
            for color in Color::ALL {
                let key = RoundKey::generate(&params, color, &mut rng).unwrap();
                let totient = key.compute_totient();

                // The exponents are inverses modulo the totient
                let gcd = BigInt::from(key.get_public_exponent().clone()).gcd(&BigInt::from(totient.clone()));
                assert!(gcd.is_one());
                assert!((key.get_public_exponent() * key.get_secret_exponent() % &totient).is_one());
                assert!(key.get_secret_exponent() < &totient);

                // The key structure is consistent
                assert_eq!(key.get_modulus(), &(key.get_prime_p() * key.get_prime_q()));
                assert_ne!(key.get_prime_p(), key.get_prime_q());
                assert_eq!(key.get_prime_p().bits(), params.get_prime_bits());
                assert!(key.get_mask() < params.get_mask_bound());

                // The mask carries the color
                assert_eq!(key.get_color(), color);
                assert_eq!(
                    key.get_mask() & BigUint::from(3u32),
                    BigUint::from(color.ordinal())
                );
            }
        }
    }

    #[test]
    fn test_trapdoor_roundtrip() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let params = Parameters::from_level(SecurityLevel::Toy);

        for color in Color::ALL {
            let key = RoundKey::generate(&params, color, &mut rng).unwrap();
            let commitment = key.commit();

            assert_eq!(commitment.get_modulus(), key.get_modulus());
            assert_eq!(commitment.get_exponent(), key.get_public_exponent());

            // Opening with the secret exponent recovers the mask
            let recovered = commitment.open(key.get_secret_exponent());
            assert_eq!(&recovered, key.get_mask());
            assert_eq!(Commitment::color_of(&recovered).unwrap(), color);
        }
    }

    #[test]
    fn test_exhausted() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        // With a single-digit exponent range and one attempt, some draw must fail to be coprime to the even totient
        let params = Parameters::new(16, 1, 1, 20).unwrap();
        let mut exhausted = false;
        for _ in 0..64 {
            if let Err(KeyError::KeyGenerationExhausted { attempts }) = RoundKey::generate(&params, Color::Red, &mut rng) {
                assert_eq!(attempts, 1);
                exhausted = true;
                break;
            }
        }
        assert!(exhausted);
    }

    #[test]
    fn test_failing_rng() {
        let params = Parameters::from_level(SecurityLevel::Toy);
        assert!(matches!(
            RoundKey::generate(&params, Color::Blue, &mut FailingRng),
            Err(KeyError::Arithmetic {
                source: ArithmeticError::Entropy { .. }
            })
        ));
    }
}
