// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use merlin::Transcript;
use num_bigint::BigUint;
use snafu::prelude::*;

use crate::{domains, prime::MIN_PRIME_BITS, TRANSCRIPT_HASH_BYTES};

/// The largest supported prime size.
pub const MAX_PRIME_BITS: u64 = 4096;

/// Named security levels.
///
/// The levels differ in the size of the per-vertex primes and the range `[0, 10^k)` from which masks and public
/// exponents are drawn. Larger primes dominate the cost of a round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SecurityLevel {
    /// 64-bit primes and `k = 20`; only suitable for tests.
    Toy,
    /// 256-bit primes and `k = 32`.
    #[default]
    Standard,
    /// 1024-bit primes and `k = 256`.
    High,
}

/// Security parameters used for generating round keys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parameters {
    prime_bits: u64,
    mask_digits: u32,
    max_exponent_attempts: u32,
    primality_rounds: u32,
    mask_bound: BigUint,
    hash: [u8; TRANSCRIPT_HASH_BYTES],
}

/// Errors that can arise relating to [`Parameters`].
#[derive(Debug, Snafu)]
pub enum ParameterError {
    /// An invalid parameter was provided.
    #[snafu(display("An invalid parameter was provided: {reason}"))]
    InvalidParameter {
        /// The reason for the parameter error.
        reason: &'static str,
    },
}

impl Parameters {
    /// The default cap on public exponent draws per vertex.
    pub const DEFAULT_MAX_EXPONENT_ATTEMPTS: u32 = 256;
    /// The default number of Miller-Rabin rounds.
    pub const DEFAULT_PRIMALITY_ROUNDS: u32 = 20;

    /// Generate new [`Parameters`].
    ///
    /// Each round key uses two primes of `prime_bits` bits, and draws its mask and public exponent from `[0,
    /// 10^mask_digits)`. The coprimality search for a public exponent gives up after `max_exponent_attempts` draws, and
    /// primality testing uses `primality_rounds` rounds of Miller-Rabin.
    ///
    /// The prime size must be in `[16, 4096]`, the mask range must lie strictly below the smallest possible modulus,
    /// and the counts must be nonzero. If any of these conditions is not met, returns a [`ParameterError`].
    pub fn new(
        prime_bits: u64,
        mask_digits: u32,
        max_exponent_attempts: u32,
        primality_rounds: u32,
    ) -> Result<Self, ParameterError> {
        if !(MIN_PRIME_BITS..=MAX_PRIME_BITS).contains(&prime_bits) {
            return Err(ParameterError::InvalidParameter {
                reason: "prime size was out of range",
            });
        }
        if mask_digits == 0 {
            return Err(ParameterError::InvalidParameter {
                reason: "mask range was empty",
            });
        }
        if max_exponent_attempts == 0 {
            return Err(ParameterError::InvalidParameter {
                reason: "exponent attempt cap was zero",
            });
        }
        if primality_rounds == 0 {
            return Err(ParameterError::InvalidParameter {
                reason: "primality round count was zero",
            });
        }

        // Every modulus has exactly `2 * prime_bits` bits, so this keeps masks recoverable
        // Since `10^k > 2^(3k)`, the cheap test rejects oversized ranges before the bound is computed
        let modulus_bits = 2 * prime_bits;
        if u64::from(mask_digits) * 3 >= modulus_bits || BigUint::from(10u32).pow(mask_digits).bits() >= modulus_bits {
            return Err(ParameterError::InvalidParameter {
                reason: "mask range exceeded the modulus size",
            });
        }

        Ok(Self::assemble(prime_bits, mask_digits, max_exponent_attempts, primality_rounds))
    }

    /// Generate [`Parameters`] for a named [`SecurityLevel`], with default attempt caps.
    pub fn from_level(level: SecurityLevel) -> Self {
        let (prime_bits, mask_digits) = match level {
            SecurityLevel::Toy => (64, 20),
            SecurityLevel::Standard => (256, 32),
            SecurityLevel::High => (1024, 256),
        };

        // The named levels all satisfy the checks in `new`
        Self::assemble(
            prime_bits,
            mask_digits,
            Self::DEFAULT_MAX_EXPONENT_ATTEMPTS,
            Self::DEFAULT_PRIMALITY_ROUNDS,
        )
    }

    // Build the parameters and their transcript hash without validation
    fn assemble(prime_bits: u64, mask_digits: u32, max_exponent_attempts: u32, primality_rounds: u32) -> Self {
        // Use Merlin for the transcript hash
        let mut transcript = Transcript::new(domains::TRANSCRIPT_PARAMETERS.as_bytes());
        transcript.append_u64(b"version", domains::VERSION);
        transcript.append_u64(b"prime_bits", prime_bits);
        transcript.append_u64(b"mask_digits", u64::from(mask_digits));
        transcript.append_u64(b"primality_rounds", u64::from(primality_rounds));
        let mut hash = [0u8; TRANSCRIPT_HASH_BYTES];
        transcript.challenge_bytes(b"hash", &mut hash);

        Self {
            prime_bits,
            mask_digits,
            max_exponent_attempts,
            primality_rounds,
            mask_bound: BigUint::from(10u32).pow(mask_digits),
            hash,
        }
    }

    /// Get the size in bits of each prime.
    pub fn get_prime_bits(&self) -> u64 {
        self.prime_bits
    }

    /// Get the number of decimal digits `k` in the mask range `[0, 10^k)`.
    pub fn get_mask_digits(&self) -> u32 {
        self.mask_digits
    }

    /// Get the exclusive upper bound `10^k` for masks and public exponents.
    pub fn get_mask_bound(&self) -> &BigUint {
        &self.mask_bound
    }

    /// Get the cap on public exponent draws per vertex.
    pub fn get_max_exponent_attempts(&self) -> u32 {
        self.max_exponent_attempts
    }

    /// Get the number of Miller-Rabin rounds.
    pub fn get_primality_rounds(&self) -> u32 {
        self.primality_rounds
    }

    /// Get a cryptographic hash representation of these parameters, suitable for transcripting.
    pub(crate) fn get_hash(&self) -> &[u8] {
        &self.hash
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::from_level(SecurityLevel::default())
    }
}

/// How the verifier chooses which edges to open in a round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChallengeMode {
    /// Open a single randomly chosen edge.
    #[default]
    SingleEdge,
    /// Open every edge, visiting each source's edges in a random order.
    Exhaustive,
}

/// How a single challenged edge is drawn.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeSelection {
    /// Choose a source vertex uniformly, then one of its outgoing edges uniformly.
    ///
    /// An edge leaving a low-degree source is challenged more often than one leaving a high-degree source, so the
    /// challenge distribution is not uniform over edges unless all out-degrees match. This weakens the per-round
    /// detection bound for a bad edge leaving a high-degree source.
    #[default]
    SourceThenEdge,
    /// Choose an edge uniformly from all edges.
    Uniform,
}

/// Configuration for a full proof run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolConfig {
    parameters: Parameters,
    soundness: u32,
    challenge: ChallengeMode,
    selection: EdgeSelection,
}

impl ProtocolConfig {
    /// Generate a new [`ProtocolConfig`].
    ///
    /// A run consists of `soundness * |E|` rounds, so the soundness multiplier must be nonzero. If it is not, returns a
    /// [`ParameterError`].
    pub fn new(
        parameters: &Parameters,
        soundness: u32,
        challenge: ChallengeMode,
        selection: EdgeSelection,
    ) -> Result<Self, ParameterError> {
        if soundness == 0 {
            return Err(ParameterError::InvalidParameter {
                reason: "soundness multiplier was zero",
            });
        }

        Ok(Self {
            parameters: parameters.clone(),
            soundness,
            challenge,
            selection,
        })
    }

    /// Get the security parameters.
    pub fn get_parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Get the soundness multiplier `a`.
    pub fn get_soundness(&self) -> u32 {
        self.soundness
    }

    /// Get the challenge mode.
    pub fn get_challenge(&self) -> ChallengeMode {
        self.challenge
    }

    /// Get the edge selection strategy.
    pub fn get_selection(&self) -> EdgeSelection {
        self.selection
    }

    /// Get the number of rounds for a graph with `edge_count` edges.
    ///
    /// Returns a [`ParameterError`] if the count overflows.
    pub fn round_count(&self, edge_count: usize) -> Result<usize, ParameterError> {
        edge_count
            .checked_mul(self.soundness as usize)
            .ok_or(ParameterError::InvalidParameter {
                reason: "round count overflowed `usize`",
            })
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            parameters: Parameters::default(),
            soundness: 1,
            challenge: ChallengeMode::default(),
            selection: EdgeSelection::default(),
        }
    }
}
