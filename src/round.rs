// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use snafu::prelude::*;

use crate::{
    arithmetic::ArithmeticError,
    commitment::{Commitment, RoundCommitments},
    graph::Graph,
    key::{KeyError, RoundKey},
    parameters::Parameters,
    verifier::Challenge,
};

/// The prover's secret state for one round.
///
/// A [`ProverRound`] owns a fresh [`RoundKey`] for every colored vertex. It is created at the start of a round and must
/// be dropped before the next one begins; nothing in it is ever reused.
pub struct ProverRound {
    keys: BTreeMap<String, RoundKey>,
}

/// The prover's answer to a [`Challenge`]: the secret exponent for every challenged vertex.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Response {
    openings: BTreeMap<String, BigUint>,
}

impl Response {
    /// Generate a new [`Response`] from revealed secret exponents, keyed by vertex.
    pub fn new(openings: BTreeMap<String, BigUint>) -> Self {
        Self { openings }
    }

    /// Get the secret exponent revealed for a vertex, if there is one.
    pub fn get_opening(&self, vertex: &str) -> Option<&BigUint> {
        self.openings.get(vertex)
    }

    /// Get the number of revealed exponents.
    pub fn len(&self) -> usize {
        self.openings.len()
    }

    /// Check whether nothing was revealed.
    pub fn is_empty(&self) -> bool {
        self.openings.is_empty()
    }
}

/// Errors that can arise relating to [`ProverRound`].
#[derive(Debug, Snafu)]
pub enum RoundError {
    /// Key generation failed for a vertex.
    #[snafu(display("Key generation failed for vertex {vertex}: {source}"))]
    KeyGeneration {
        /// The vertex identifier.
        vertex: String,
        /// The underlying failure.
        source: KeyError,
    },
    /// Per-vertex generator seeding failed.
    #[snafu(display("Generator seeding failed: {source}"))]
    Seeding {
        /// The underlying failure.
        source: ArithmeticError,
    },
    /// A challenge named a vertex with no key this round.
    #[snafu(display("Vertex {vertex} has no key this round"))]
    UnknownVertex {
        /// The vertex identifier.
        vertex: String,
    },
}

impl ProverRound {
    /// Generate fresh keys for every colored vertex of `graph`, using its current coloring.
    ///
    /// Returns a [`RoundError`] naming the first vertex whose key generation failed.
    #[cfg(not(feature = "rayon"))]
    pub fn generate<R: CryptoRngCore>(graph: &Graph, params: &Parameters, rng: &mut R) -> Result<Self, RoundError> {
        let mut keys = BTreeMap::new();
        for (vertex, color) in graph.get_colors() {
            let key = RoundKey::generate(params, *color, rng).context(KeyGenerationSnafu { vertex })?;
            keys.insert(vertex.clone(), key);
        }

        Ok(Self { keys })
    }

    /// Generate fresh keys for every colored vertex of `graph`, using its current coloring.
    ///
    /// Vertices are processed in parallel. Each vertex gets its own generator, seeded in vertex order from `rng`, so the
    /// result does not depend on scheduling.
    ///
    /// Returns a [`RoundError`] naming a vertex whose key generation failed.
    #[cfg(feature = "rayon")]
    pub fn generate<R: CryptoRngCore>(graph: &Graph, params: &Parameters, rng: &mut R) -> Result<Self, RoundError> {
        use rand_chacha::ChaCha12Rng;
        use rand_core::SeedableRng;
        use rayon::prelude::*;
        use zeroize::Zeroizing;

        let mut seeded = Vec::with_capacity(graph.vertex_count());
        for (vertex, color) in graph.get_colors() {
            let mut seed = Zeroizing::new([0u8; 32]);
            crate::util::fill(rng, &mut *seed).context(SeedingSnafu)?;
            seeded.push((vertex, *color, seed));
        }

        let keys = seeded
            .into_par_iter()
            .map(|(vertex, color, seed)| {
                let mut vertex_rng = ChaCha12Rng::from_seed(*seed);
                RoundKey::generate(params, color, &mut vertex_rng)
                    .map(|key| (vertex.clone(), key))
                    .context(KeyGenerationSnafu { vertex })
            })
            .collect::<Result<BTreeMap<String, RoundKey>, RoundError>>()?;

        Ok(Self { keys })
    }

    /// Publish the [`RoundCommitments`] for this round.
    pub fn commit(&self) -> RoundCommitments {
        RoundCommitments::new(
            self.keys
                .iter()
                .map(|(vertex, key)| (vertex.clone(), key.commit()))
                .collect::<BTreeMap<String, Commitment>>(),
        )
    }

    /// Answer a [`Challenge`] by revealing the secret exponents of the challenged vertices.
    ///
    /// Returns a [`RoundError`] if the challenge names a vertex with no key.
    pub fn respond(&self, challenge: &Challenge) -> Result<Response, RoundError> {
        let mut openings = BTreeMap::new();
        for edge in challenge.get_edges() {
            for vertex in [edge.get_from(), edge.get_to()] {
                let key = self.get_key(vertex).ok_or_else(|| RoundError::UnknownVertex {
                    vertex: vertex.to_string(),
                })?;
                openings.insert(vertex.to_string(), key.get_secret_exponent().clone());
            }
        }

        Ok(Response { openings })
    }

    /// Get the key for a vertex, if there is one.
    pub fn get_key(&self, vertex: &str) -> Option<&RoundKey> {
        self.keys.get(vertex)
    }

    /// Get the vertices with keys this round.
    pub fn vertices(&self) -> Vec<&str> {
        self.keys.keys().map(String::as_str).collect()
    }
}
