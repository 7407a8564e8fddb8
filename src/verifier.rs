// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

use rand_core::CryptoRngCore;
use snafu::prelude::*;

use crate::{
    arithmetic::ArithmeticError,
    color::Color,
    commitment::{Commitment, RoundCommitments},
    graph::{Edge, Graph},
    parameters::{ChallengeMode, EdgeSelection},
    round::Response,
    util::random_index,
};

/// The edges the verifier asks the prover to open in a round.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Challenge {
    edges: Vec<Edge>,
}

impl Challenge {
    /// Generate a new [`Challenge`] for a list of edges.
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    /// Get the challenged edges, in the order they are checked.
    pub fn get_edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// Errors that can arise when verifying a round.
#[derive(Debug, Snafu)]
pub enum VerificationError {
    /// Both endpoints of a challenged edge opened to the same color.
    #[snafu(display("Cheating detected on edge {from} -> {to}"))]
    CheatingDetected {
        /// The source vertex.
        from: String,
        /// The destination vertex.
        to: String,
    },
    /// A challenged vertex had no published commitment.
    #[snafu(display("Vertex {vertex} has no commitment"))]
    MissingCommitment {
        /// The vertex identifier.
        vertex: String,
    },
    /// A challenged vertex was not opened.
    #[snafu(display("Vertex {vertex} was not opened"))]
    MissingOpening {
        /// The vertex identifier.
        vertex: String,
    },
    /// An opening did not match its commitment or did not encode a color.
    #[snafu(display("Vertex {vertex} was opened incorrectly"))]
    InvalidOpening {
        /// The vertex identifier.
        vertex: String,
    },
    /// The graph has no edges to challenge.
    #[snafu(display("The graph has no edges"))]
    NoEdges,
    /// The challenge generator failed.
    #[snafu(display("Challenge sampling failed: {source}"))]
    Sampling {
        /// The underlying failure.
        source: ArithmeticError,
    },
}

/// The verifier's view of a graph: its structure, but never its coloring.
#[derive(Clone, Debug)]
pub struct Verifier {
    edges: Vec<Edge>,
    adjacency: BTreeMap<String, Vec<String>>,
    mode: ChallengeMode,
    selection: EdgeSelection,
}

impl Verifier {
    /// Generate a new [`Verifier`] for the structure of `graph`.
    pub fn new(graph: &Graph, mode: ChallengeMode, selection: EdgeSelection) -> Self {
        Self {
            edges: graph.get_edges().to_vec(),
            adjacency: graph.get_adjacency().clone(),
            mode,
            selection,
        }
    }

    /// Choose the edges to open this round.
    ///
    /// In [`ChallengeMode::SingleEdge`] mode, one edge is drawn according to the [`EdgeSelection`]. In
    /// [`ChallengeMode::Exhaustive`] mode, every edge is challenged, with each source's outgoing edges shuffled.
    ///
    /// Returns a [`VerificationError`] if there are no edges or the generator fails.
    pub fn challenge<R: CryptoRngCore>(&self, rng: &mut R) -> Result<Challenge, VerificationError> {
        if self.edges.is_empty() {
            return Err(VerificationError::NoEdges);
        }

        let edges = match self.mode {
            ChallengeMode::SingleEdge => Vec::from([self.select_edge(rng).context(SamplingSnafu)?]),
            ChallengeMode::Exhaustive => {
                let mut edges = Vec::with_capacity(self.edges.len());
                for (from, destinations) in &self.adjacency {
                    let mut destinations = destinations.iter().collect::<Vec<&String>>();
                    for i in (1..destinations.len()).rev() {
                        let j = random_index(rng, i + 1).context(SamplingSnafu)?;
                        destinations.swap(i, j);
                    }
                    edges.extend(destinations.into_iter().map(|to| Edge::new(from, to)));
                }
                edges
            },
        };

        Ok(Challenge::new(edges))
    }

    // Draw a single edge according to the selection strategy
    fn select_edge<R: CryptoRngCore>(&self, rng: &mut R) -> Result<Edge, ArithmeticError> {
        match self.selection {
            EdgeSelection::Uniform => Ok(self.edges[random_index(rng, self.edges.len())?].clone()),
            EdgeSelection::SourceThenEdge => {
                // Every source in the adjacency map has at least one edge
                let source = random_index(rng, self.adjacency.len())?;
                let (from, destinations) = self
                    .adjacency
                    .iter()
                    .nth(source)
                    .ok_or(ArithmeticError::InvalidBound {
                        reason: "source index out of range",
                    })?;
                let to = &destinations[random_index(rng, destinations.len())?];

                Ok(Edge::new(from, to))
            },
        }
    }

    /// Check the prover's [`Response`] to a [`Challenge`] against the published [`RoundCommitments`].
    ///
    /// Every challenged vertex is opened with its revealed secret exponent. The recovered mask must encrypt back to
    /// the commitment and encode a color, and the two endpoints of every challenged edge must have different colors.
    ///
    /// Returns a [`VerificationError`] on the first failure, in challenge order.
    pub fn verify(
        &self,
        commitments: &RoundCommitments,
        challenge: &Challenge,
        response: &Response,
    ) -> Result<(), VerificationError> {
        for edge in challenge.get_edges() {
            let from = Self::open(commitments, response, edge.get_from())?;
            let to = Self::open(commitments, response, edge.get_to())?;
            if from == to {
                return Err(VerificationError::CheatingDetected {
                    from: edge.get_from().to_string(),
                    to: edge.get_to().to_string(),
                });
            }
        }

        Ok(())
    }

    // Open one vertex and extract its color
    fn open(commitments: &RoundCommitments, response: &Response, vertex: &str) -> Result<Color, VerificationError> {
        let commitment = commitments.get(vertex).ok_or_else(|| VerificationError::MissingCommitment {
            vertex: vertex.to_string(),
        })?;
        let secret_exponent = response
            .get_opening(vertex)
            .ok_or_else(|| VerificationError::MissingOpening {
                vertex: vertex.to_string(),
            })?;

        let mask = commitment.open(secret_exponent);
        if !commitment.is_opened_by(&mask) {
            return Err(VerificationError::InvalidOpening {
                vertex: vertex.to_string(),
            });
        }

        Commitment::color_of(&mask).map_err(|_| VerificationError::InvalidOpening {
            vertex: vertex.to_string(),
        })
    }

    /// Get the challenge mode.
    pub fn get_mode(&self) -> ChallengeMode {
        self.mode
    }

    /// Get the edge selection strategy.
    pub fn get_selection(&self) -> EdgeSelection {
        self.selection
    }
}

#[cfg(test)]
mod test {
    use alloc::{collections::BTreeMap, vec};

    use num_bigint::BigUint;
    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::*;
    use crate::{
        parameters::{Parameters, SecurityLevel},
        round::ProverRound,
        util::test::FailingRng,
    };

    // A star with center `s` and leaves `a`, `b`, `c`, plus an extra source `t` with a single edge
    fn star() -> Graph {
        let mut graph = Graph::new();
        graph.add_edge("s", "a");
        graph.add_edge("s", "b");
        graph.add_edge("s", "c");
        graph.add_edge("t", "a");
        graph.add_vertex("s", "R").unwrap();
        graph.add_vertex("t", "R").unwrap();
        graph.add_vertex("a", "B").unwrap();
        graph.add_vertex("b", "Y").unwrap();
        graph.add_vertex("c", "B").unwrap();
        graph
    }

    #[test]
    fn test_selection_bias() {
        let graph = star();
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        let count = |selection: EdgeSelection, rng: &mut ChaCha12Rng| {
            let verifier = Verifier::new(&graph, ChallengeMode::SingleEdge, selection);
            let target = Edge::new("t", "a");
            (0..4000)
                .filter(|_| verifier.challenge(rng).unwrap().get_edges() == [target.clone()])
                .count()
        };

        // Source-first selection picks the lone `t` edge half the time; uniform selection a quarter of the time
        let biased = count(EdgeSelection::SourceThenEdge, &mut rng);
        let uniform = count(EdgeSelection::Uniform, &mut rng);
        assert!((1800..2200).contains(&biased));
        assert!((800..1200).contains(&uniform));
    }

    #[test]
    fn test_exhaustive_challenge() {
        let graph = star();
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let verifier = Verifier::new(&graph, ChallengeMode::Exhaustive, EdgeSelection::default());

        let challenge = verifier.challenge(&mut rng).unwrap();
        let mut challenged = challenge.get_edges().to_vec();
        challenged.sort();
        let mut expected = graph.get_edges().to_vec();
        expected.sort();
        assert_eq!(challenged, expected);

        // Sources are visited in order, so the `t` edge is last
        assert_eq!(challenge.get_edges().last(), Some(&Edge::new("t", "a")));
    }

    #[test]
    fn test_no_edges() {
        let mut graph = Graph::new();
        graph.add_vertex("a", "R").unwrap();
        let verifier = Verifier::new(&graph, ChallengeMode::SingleEdge, EdgeSelection::Uniform);
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        assert!(matches!(verifier.challenge(&mut rng), Err(VerificationError::NoEdges)));
    }

    #[test]
    fn test_failing_rng() {
        let verifier = Verifier::new(&star(), ChallengeMode::SingleEdge, EdgeSelection::Uniform);
        assert!(matches!(
            verifier.challenge(&mut FailingRng),
            Err(VerificationError::Sampling { .. })
        ));
    }

    #[test]
    fn test_verify() {
        let graph = star();
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let params = Parameters::from_level(SecurityLevel::Toy);
        let verifier = Verifier::new(&graph, ChallengeMode::Exhaustive, EdgeSelection::default());

        let round = ProverRound::generate(&graph, &params, &mut rng).unwrap();
        let commitments = round.commit();
        let challenge = verifier.challenge(&mut rng).unwrap();
        let response = round.respond(&challenge).unwrap();
        assert!(verifier.verify(&commitments, &challenge, &response).is_ok());

        // An edge between same-colored vertices is caught
        let bad = Challenge::new(vec![Edge::new("a", "c")]);
        let response = round.respond(&bad).unwrap();
        assert!(matches!(
            verifier.verify(&commitments, &bad, &response),
            Err(VerificationError::CheatingDetected { ref from, ref to }) if from == "a" && to == "c"
        ));

        // Missing openings are caught
        assert!(matches!(
            verifier.verify(&commitments, &challenge, &Response::default()),
            Err(VerificationError::MissingOpening { .. })
        ));

        // Missing commitments are caught
        let empty = RoundCommitments::new(BTreeMap::new());
        assert!(matches!(
            verifier.verify(&empty, &challenge, &round.respond(&challenge).unwrap()),
            Err(VerificationError::MissingCommitment { .. })
        ));
    }

    #[test]
    fn test_wrong_exponent() {
        let graph = star();
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let params = Parameters::from_level(SecurityLevel::Toy);
        let verifier = Verifier::new(&graph, ChallengeMode::SingleEdge, EdgeSelection::Uniform);

        let round = ProverRound::generate(&graph, &params, &mut rng).unwrap();
        let commitments = round.commit();
        let challenge = Challenge::new(vec![Edge::new("s", "a")]);

        // Reveal the exponent from a different vertex's key for `s`
        let forged = round.respond(&Challenge::new(vec![Edge::new("a", "b")])).unwrap();
        let mut openings = BTreeMap::new();
        openings.insert("s".into(), forged.get_opening("b").unwrap().clone());
        openings.insert("a".into(), forged.get_opening("a").unwrap().clone());
        let response = Response::new(openings);

        assert!(matches!(
            verifier.verify(&commitments, &challenge, &response),
            Err(VerificationError::InvalidOpening { ref vertex }) if vertex == "s"
        ));

        // A trivially wrong exponent is also rejected
        let mut openings = BTreeMap::new();
        openings.insert("s".into(), BigUint::from(1u32));
        openings.insert("a".into(), forged.get_opening("a").unwrap().clone());
        assert!(verifier
            .verify(&commitments, &challenge, &Response::new(openings))
            .is_err());
    }
}
