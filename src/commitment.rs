// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{collections::BTreeMap, string::String, vec, vec::Vec};

#[cfg(feature = "borsh")]
use borsh::{io, BorshDeserialize, BorshSerialize};
use merlin::Transcript;
use num_bigint::BigUint;
use num_traits::Zero;
use snafu::prelude::*;

use crate::{
    color::{Color, ColorError, COLOR_BITS},
    domains,
    TRANSCRIPT_HASH_BYTES,
};

/// The largest encoded integer, in bytes.
///
/// This covers a modulus built from two primes of the largest supported size.
pub const MAX_INTEGER_BYTES: usize = 1024;

/// A published commitment `(N, d, Z)` to one vertex color for one round.
///
/// The committed value `Z = mask^d mod N` can only be opened with the secret exponent held by the prover.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Commitment {
    modulus: BigUint,
    exponent: BigUint,
    value: BigUint,
}

/// Errors that can arise relating to [`Commitment`].
#[derive(Debug, Snafu)]
pub enum CommitmentError {
    /// Encoded data was malformed or not canonical.
    #[snafu(display("Invalid commitment encoding: {reason}"))]
    InvalidEncoding {
        /// The reason for the encoding error.
        reason: &'static str,
    },
}

impl Commitment {
    /// Generate a new [`Commitment`] from its public parts.
    pub(crate) fn new(modulus: &BigUint, exponent: &BigUint, value: &BigUint) -> Self {
        Self {
            modulus: modulus.clone(),
            exponent: exponent.clone(),
            value: value.clone(),
        }
    }

    /// Get the modulus `N`.
    pub fn get_modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Get the public exponent `d`.
    pub fn get_exponent(&self) -> &BigUint {
        &self.exponent
    }

    /// Get the committed value `Z`.
    pub fn get_value(&self) -> &BigUint {
        &self.value
    }

    /// Open the commitment with a secret exponent, returning the recovered mask `Z^c mod N`.
    pub fn open(&self, secret_exponent: &BigUint) -> BigUint {
        self.value.modpow(secret_exponent, &self.modulus)
    }

    /// Check that a recovered mask encrypts to the committed value.
    pub fn is_opened_by(&self, mask: &BigUint) -> bool {
        mask < &self.modulus && mask.modpow(&self.exponent, &self.modulus) == self.value
    }

    /// Extract the [`Color`] encoded in the low-order bits of a mask.
    pub fn color_of(mask: &BigUint) -> Result<Color, ColorError> {
        let ordinal = (0..COLOR_BITS)
            .filter(|bit| mask.bit(*bit))
            .fold(0u8, |ordinal, bit| ordinal | (1 << bit));

        Color::from_ordinal(ordinal)
    }

    /// Serialize a [`Commitment`] to a canonical byte vector.
    ///
    /// Each of `N`, `d`, and `Z` is written as a little-endian `u32` length followed by its big-endian magnitude, with
    /// no leading zero bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();
        for item in [&self.modulus, &self.exponent, &self.value] {
            let bytes = if item.is_zero() { Vec::new() } else { item.to_bytes_be() };

            // The length can't overflow since integers are bounded by the supported prime sizes
            #[allow(clippy::cast_possible_truncation)]
            result.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            result.extend_from_slice(&bytes);
        }

        result
    }

    /// Deserialize a [`Commitment`] from a canonical byte slice.
    ///
    /// Returns a [`CommitmentError`] if the data is truncated, has trailing bytes, uses a non-canonical integer encoding,
    /// or describes a commitment whose modulus is less than two or whose value is not reduced.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CommitmentError> {
        let mut reader = bytes;
        let modulus = Self::read_integer(&mut reader)?;
        let exponent = Self::read_integer(&mut reader)?;
        let value = Self::read_integer(&mut reader)?;

        if !reader.is_empty() {
            return Err(CommitmentError::InvalidEncoding {
                reason: "trailing data",
            });
        }
        if modulus < BigUint::from(2u32) {
            return Err(CommitmentError::InvalidEncoding {
                reason: "modulus was less than two",
            });
        }
        if value >= modulus {
            return Err(CommitmentError::InvalidEncoding {
                reason: "value was not reduced",
            });
        }

        Ok(Self {
            modulus,
            exponent,
            value,
        })
    }

    // Read one length-prefixed integer and advance the reader
    fn read_integer(reader: &mut &[u8]) -> Result<BigUint, CommitmentError> {
        let (length, rest) = reader.split_first_chunk::<4>().ok_or(CommitmentError::InvalidEncoding {
            reason: "truncated length",
        })?;
        let length = u32::from_le_bytes(*length) as usize;
        if length > MAX_INTEGER_BYTES {
            return Err(CommitmentError::InvalidEncoding {
                reason: "integer was too large",
            });
        }
        if rest.len() < length {
            return Err(CommitmentError::InvalidEncoding {
                reason: "truncated integer",
            });
        }

        let (magnitude, rest) = rest.split_at(length);
        if magnitude.first() == Some(&0) {
            return Err(CommitmentError::InvalidEncoding {
                reason: "integer had a leading zero byte",
            });
        }
        *reader = rest;

        Ok(BigUint::from_bytes_be(magnitude))
    }
}

#[cfg(feature = "borsh")]
impl BorshSerialize for Commitment {
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        BorshSerialize::serialize(&self.to_bytes(), writer)
    }
}

#[cfg(feature = "borsh")]
impl BorshDeserialize for Commitment {
    fn deserialize_reader<R: io::Read>(reader: &mut R) -> io::Result<Self> {
        let bytes: Vec<u8> = BorshDeserialize::deserialize_reader(reader)?;
        Self::from_bytes(&bytes).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid commitment"))
    }
}

/// The commitments published by the prover for one round, keyed by vertex.
///
/// Internally, it also contains a cryptographic hash of the commitments for transcripting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundCommitments {
    commitments: BTreeMap<String, Commitment>,
    hash: Vec<u8>,
}

impl RoundCommitments {
    /// Generate a new [`RoundCommitments`] from per-vertex commitments.
    pub fn new(commitments: BTreeMap<String, Commitment>) -> Self {
        // Use Merlin for the transcript hash
        let mut transcript = Transcript::new(domains::TRANSCRIPT_ROUND_COMMITMENTS.as_bytes());
        transcript.append_u64(b"version", domains::VERSION);
        transcript.append_u64(b"count", commitments.len() as u64);
        for (vertex, commitment) in &commitments {
            transcript.append_message(b"vertex", vertex.as_bytes());
            transcript.append_message(b"commitment", &commitment.to_bytes());
        }
        let mut hash = vec![0u8; TRANSCRIPT_HASH_BYTES];
        transcript.challenge_bytes(b"hash", &mut hash);

        Self { commitments, hash }
    }

    /// Get the commitment for a vertex, if there is one.
    pub fn get(&self, vertex: &str) -> Option<&Commitment> {
        self.commitments.get(vertex)
    }

    /// Get the number of committed vertices.
    pub fn len(&self) -> usize {
        self.commitments.len()
    }

    /// Check whether no vertices are committed.
    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }

    /// Iterate over the commitments, ordered by vertex identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Commitment)> {
        self.commitments.iter()
    }

    /// Get a cryptographic hash representation of these commitments, suitable for transcripting.
    pub(crate) fn get_hash(&self) -> &[u8] {
        &self.hash
    }
}

#[cfg(test)]
mod test {
    use alloc::{collections::BTreeMap, string::ToString};

    use num_bigint::BigUint;

    use super::*;

    fn commitment() -> Commitment {
        // `N = 61 * 53`, `d = 17`, `Z = 65^17 mod N`
        let modulus = BigUint::from(3233u32);
        let exponent = BigUint::from(17u32);
        let value = BigUint::from(65u32).modpow(&exponent, &modulus);
        Commitment::new(&modulus, &exponent, &value)
    }

    #[test]
    fn test_open() {
        let commitment = commitment();
        assert_eq!(commitment.get_value(), &BigUint::from(2790u32));

        // `c = 2753` inverts `d` modulo `60 * 52`
        let mask = commitment.open(&BigUint::from(2753u32));
        assert_eq!(mask, BigUint::from(65u32));
        assert!(commitment.is_opened_by(&mask));
        assert!(!commitment.is_opened_by(&BigUint::from(66u32)));
        assert!(!commitment.is_opened_by(&(&mask + BigUint::from(3233u32))));

        // `65 == 0b1000001` encodes blue
        assert_eq!(Commitment::color_of(&mask).unwrap(), Color::Blue);
        assert!(Commitment::color_of(&BigUint::from(7u32)).is_err());
    }

    #[test]
    fn test_canonical_encoding() {
        let commitment = commitment();
        let bytes = commitment.to_bytes();
        assert_eq!(Commitment::from_bytes(&bytes).unwrap(), commitment);

        // Zero encodes as an empty magnitude
        let zero = Commitment::new(&BigUint::from(3233u32), &BigUint::from(0u32), &BigUint::from(0u32));
        let zero_bytes = zero.to_bytes();
        assert_eq!(&zero_bytes[6..], [0u8; 8]);
        assert_eq!(Commitment::from_bytes(&zero_bytes).unwrap(), zero);
    }

    #[test]
    fn test_invalid_encoding() {
        let bytes = commitment().to_bytes();

        // Truncation
        for length in 0..bytes.len() {
            assert!(Commitment::from_bytes(&bytes[..length]).is_err());
        }

        // Trailing data
        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(Commitment::from_bytes(&trailing).is_err());

        // Leading zero byte in the modulus
        let mut padded = vec![3u8, 0, 0, 0, 0];
        padded.extend_from_slice(&bytes[4..]);
        assert!(Commitment::from_bytes(&padded).is_err());

        // Unreduced value
        let unreduced = Commitment::new(&BigUint::from(7u32), &BigUint::from(1u32), &BigUint::from(7u32));
        assert!(Commitment::from_bytes(&unreduced.to_bytes()).is_err());

        // Oversized length
        let mut oversized = ((MAX_INTEGER_BYTES + 1) as u32).to_le_bytes().to_vec();
        oversized.extend(core::iter::repeat(1u8).take(MAX_INTEGER_BYTES + 1));
        assert!(Commitment::from_bytes(&oversized).is_err());
    }

    #[test]
    fn test_round_commitments_hash() {
        let mut commitments = BTreeMap::new();
        commitments.insert("a".to_string(), commitment());
        let first = RoundCommitments::new(commitments.clone());
        assert_eq!(first.len(), 1);
        assert!(first.get("a").is_some());
        assert!(first.get("b").is_none());

        // A different vertex set changes the hash
        commitments.insert("b".to_string(), commitment());
        let second = RoundCommitments::new(commitments);
        assert_ne!(first.get_hash(), second.get_hash());
    }

    #[cfg(feature = "borsh")]
    #[test]
    fn test_borsh() {
        let commitment = commitment();
        let bytes = borsh::to_vec(&commitment).unwrap();
        assert_eq!(borsh::from_slice::<Commitment>(&bytes).unwrap(), commitment);
    }
}
