// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::string::String;

use rand_core::CryptoRngCore;
#[cfg(feature = "rand")]
use rand_core::OsRng;
use snafu::prelude::*;
use tracing::{debug, debug_span, info, warn};

use crate::{
    arithmetic::ArithmeticError,
    color::ColorPermutation,
    graph::{Graph, GraphError},
    parameters::{ParameterError, Parameters, ProtocolConfig},
    round::{ProverRound, RoundError},
    transcript::ProtocolTranscript,
    verifier::{VerificationError, Verifier},
    TRANSCRIPT_HASH_BYTES,
};

/// Errors that can arise during a proof run.
///
/// Every failure is terminal: a run either completes all of its rounds or is rejected.
#[derive(Debug, Snafu)]
pub enum ProofError {
    /// The graph was not ready to be proven.
    #[snafu(display("Invalid graph: {source}"))]
    Graph {
        /// The underlying failure.
        source: GraphError,
    },
    /// The configuration was unusable for this graph.
    #[snafu(display("Invalid configuration: {source}"))]
    Configuration {
        /// The underlying failure.
        source: ParameterError,
    },
    /// The color permutation for a round could not be sampled.
    #[snafu(display("Color permutation failed in round {round}: {source}"))]
    Permutation {
        /// The zero-based round index.
        round: usize,
        /// The underlying failure.
        source: ArithmeticError,
    },
    /// The prover could not set up or answer a round.
    #[snafu(display("Prover failed in round {round}: {source}"))]
    Prover {
        /// The zero-based round index.
        round: usize,
        /// The underlying failure.
        source: RoundError,
    },
    /// The verifier caught two adjacent vertices with the same color.
    #[snafu(display("Cheating detected in round {round} on edge {from} -> {to}"))]
    CheatingDetected {
        /// The zero-based round index.
        round: usize,
        /// The source vertex.
        from: String,
        /// The destination vertex.
        to: String,
    },
    /// The verifier rejected a round for any other reason.
    #[snafu(display("Verification failed in round {round}: {source}"))]
    Verification {
        /// The zero-based round index.
        round: usize,
        /// The underlying failure.
        source: VerificationError,
    },
}

/// A summary of a successful proof run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProofReport {
    rounds: usize,
    edges_checked: usize,
    digest: [u8; TRANSCRIPT_HASH_BYTES],
}

impl ProofReport {
    /// Get the number of rounds completed.
    pub fn get_rounds(&self) -> usize {
        self.rounds
    }

    /// Get the total number of edge openings checked across all rounds.
    pub fn get_edges_checked(&self) -> usize {
        self.edges_checked
    }

    /// Get a digest of the public transcript of the run.
    pub fn get_digest(&self) -> &[u8; TRANSCRIPT_HASH_BYTES] {
        &self.digest
    }
}

/// The prover role.
///
/// The prover owns a private copy of the graph, whose coloring it relabels at the start of every round.
pub struct Prover {
    graph: Graph,
    params: Parameters,
}

impl Prover {
    /// Generate a new [`Prover`] for a colored graph.
    ///
    /// Returns a [`ProofError`] if any edge endpoint is uncolored.
    pub fn new(graph: &Graph, params: &Parameters) -> Result<Self, ProofError> {
        graph.check_colored().context(GraphSnafu)?;

        Ok(Self {
            graph: graph.clone(),
            params: params.clone(),
        })
    }

    /// Start a round: relabel the coloring with a fresh random permutation, then generate fresh keys for every vertex.
    ///
    /// The returned [`ProverRound`] holds all of the round's secrets, and should be dropped once the round is over.
    pub fn start_round<R: CryptoRngCore>(&mut self, round: usize, rng: &mut R) -> Result<ProverRound, ProofError> {
        let permutation = ColorPermutation::random(rng).context(PermutationSnafu { round })?;
        self.graph.permute_colors(&permutation);

        ProverRound::generate(&self.graph, &self.params, rng).context(ProverSnafu { round })
    }
}

/// Run the interactive proof with both roles in-process, using [`OsRng`] for all randomness.
///
/// See [`prove_with_rng`] for details.
#[cfg(feature = "rand")]
pub fn prove(graph: &Graph, config: &ProtocolConfig) -> Result<ProofReport, ProofError> {
    prove_with_rng(graph, config, &mut OsRng)
}

/// Run the interactive proof with both roles in-process.
///
/// The run consists of `a * |E|` rounds for the soundness multiplier `a`. Each round relabels the colors, generates and
/// commits to fresh per-vertex keys, and has the verifier challenge and check edges. The first failure aborts the run.
/// A graph with no edges needs no rounds and is accepted immediately.
///
/// Returns a [`ProofReport`] if every round passes, and a [`ProofError`] otherwise.
pub fn prove_with_rng<R: CryptoRngCore>(
    graph: &Graph,
    config: &ProtocolConfig,
    rng: &mut R,
) -> Result<ProofReport, ProofError> {
    let mut prover = Prover::new(graph, config.get_parameters())?;
    let verifier = Verifier::new(graph, config.get_challenge(), config.get_selection());
    let mut transcript = ProtocolTranscript::new(config.get_parameters(), graph);

    let rounds = config.round_count(graph.edge_count()).context(ConfigurationSnafu)?;
    info!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        rounds,
        "starting proof"
    );

    let mut edges_checked = 0usize;
    for round in 0..rounds {
        let span = debug_span!("round", round);
        let _guard = span.enter();

        // The round's secrets live only in this scope
        let prover_round = prover.start_round(round, rng)?;
        let commitments = prover_round.commit();
        transcript.commit(round as u64, &commitments);

        let mut challenge_rng = transcript
            .challenge_rng(rng)
            .map_err(|source| ProofError::Verification {
                round,
                source: VerificationError::Sampling { source },
            })?;
        let challenge = verifier
            .challenge(&mut challenge_rng)
            .context(VerificationSnafu { round })?;
        transcript.challenge(&challenge);

        let response = prover_round.respond(&challenge).context(ProverSnafu { round })?;
        match verifier.verify(&commitments, &challenge, &response) {
            Ok(()) => {},
            Err(VerificationError::CheatingDetected { from, to }) => {
                warn!(round, %from, %to, "cheating detected");
                return Err(ProofError::CheatingDetected { round, from, to });
            },
            Err(source) => return Err(ProofError::Verification { round, source }),
        }

        edges_checked += challenge.get_edges().len();
        debug!(edges = challenge.get_edges().len(), "round passed");
    }

    info!(rounds, edges_checked, "proof accepted");

    Ok(ProofReport {
        rounds,
        edges_checked,
        digest: transcript.digest(),
    })
}

#[cfg(test)]
mod test {
    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::*;
    use crate::{
        color::Color,
        parameters::{ChallengeMode, EdgeSelection, SecurityLevel},
        util::test::{FailingRng, PanickingRng},
    };

    // The cycle `A -> B -> C -> A` with the given colors
    fn triangle(a: &str, b: &str, c: &str) -> Graph {
        let mut graph = Graph::new();
        graph.add_edge("A", "B");
        graph.add_edge("B", "C");
        graph.add_edge("C", "A");
        graph.add_vertex("A", a).unwrap();
        graph.add_vertex("B", b).unwrap();
        graph.add_vertex("C", c).unwrap();
        graph
    }

    fn config(soundness: u32, challenge: ChallengeMode, selection: EdgeSelection) -> ProtocolConfig {
        ProtocolConfig::new(
            &Parameters::from_level(SecurityLevel::Toy),
            soundness,
            challenge,
            selection,
        )
        .unwrap()
    }

    #[test]
    fn test_accept_proper_coloring() {
        let graph = triangle("R", "B", "Y");

        for seed in 0..4 {
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let report = prove_with_rng(
                &graph,
                &config(1, ChallengeMode::SingleEdge, EdgeSelection::SourceThenEdge),
                &mut rng,
            )
            .unwrap();

            assert_eq!(report.get_rounds(), 3);
            assert_eq!(report.get_edges_checked(), 3);
        }
    }

    #[test]
    fn test_accept_all_modes() {
        let graph = triangle("Y", "R", "B");
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        for challenge in [ChallengeMode::SingleEdge, ChallengeMode::Exhaustive] {
            for selection in [EdgeSelection::SourceThenEdge, EdgeSelection::Uniform] {
                let report = prove_with_rng(&graph, &config(2, challenge, selection), &mut rng).unwrap();
                assert_eq!(report.get_rounds(), 6);
                if challenge == ChallengeMode::Exhaustive {
                    assert_eq!(report.get_edges_checked(), 18);
                }
            }
        }
    }

    #[test]
    fn test_caller_graph_is_unchanged() {
        let graph = triangle("R", "B", "Y");
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        prove_with_rng(&graph, &config(2, ChallengeMode::SingleEdge, EdgeSelection::Uniform), &mut rng).unwrap();

        assert_eq!(graph.get_color("A"), Some(Color::Red));
        assert_eq!(graph.get_color("B"), Some(Color::Blue));
        assert_eq!(graph.get_color("C"), Some(Color::Yellow));
    }

    #[test]
    fn test_soundness() {
        // Only `A -> B` is improperly colored; with enough rounds it is challenged with overwhelming probability
        let graph = triangle("R", "R", "Y");

        for selection in [EdgeSelection::SourceThenEdge, EdgeSelection::Uniform] {
            let mut rng = ChaCha12Rng::seed_from_u64(8675309);
            let result = prove_with_rng(&graph, &config(30, ChallengeMode::SingleEdge, selection), &mut rng);

            assert!(matches!(
                result,
                Err(ProofError::CheatingDetected { ref from, ref to, .. }) if from == "A" && to == "B"
            ));
        }
    }

    #[test]
    fn test_exhaustive_rejects_in_first_round() {
        let graph = triangle("R", "R", "Y");
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let result = prove_with_rng(&graph, &config(1, ChallengeMode::Exhaustive, EdgeSelection::default()), &mut rng);

        assert!(matches!(result, Err(ProofError::CheatingDetected { round: 0, .. })));
    }

    #[test]
    fn test_single_bad_edge_graph() {
        // A single edge with both endpoints red fails in its only round
        let mut graph = Graph::new();
        graph.add_edge("A", "B");
        graph.add_vertex("A", "R").unwrap();
        graph.add_vertex("B", "R").unwrap();

        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let result = prove_with_rng(&graph, &config(1, ChallengeMode::SingleEdge, EdgeSelection::default()), &mut rng);
        assert!(matches!(result, Err(ProofError::CheatingDetected { round: 0, .. })));
    }

    #[test]
    fn test_uncolored_vertex() {
        let mut graph = triangle("R", "B", "Y");
        graph.add_edge("C", "D");

        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let result = prove_with_rng(&graph, &ProtocolConfig::default(), &mut rng);
        assert!(matches!(
            result,
            Err(ProofError::Graph {
                source: GraphError::VertexUncolored { ref vertex }
            }) if vertex == "D"
        ));
    }

    #[test]
    fn test_no_edges() {
        let mut graph = Graph::new();
        graph.add_vertex("A", "R").unwrap();

        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let report = prove_with_rng(&graph, &ProtocolConfig::default(), &mut rng).unwrap();
        assert_eq!(report.get_rounds(), 0);
    }

    #[test]
    fn test_failing_rng() {
        let graph = triangle("R", "B", "Y");
        let result = prove_with_rng(&graph, &ProtocolConfig::default(), &mut FailingRng);
        assert!(matches!(result, Err(ProofError::Permutation { round: 0, .. })));
    }

    #[test]
    fn test_only_fallible_entropy() {
        // Entropy is only ever drawn through the fallible interface, so a failure could never panic
        let mut graph = Graph::new();
        graph.add_edge("A", "B");
        graph.add_vertex("A", "R").unwrap();
        graph.add_vertex("B", "Y").unwrap();

        let report = prove_with_rng(
            &graph,
            &config(2, ChallengeMode::SingleEdge, EdgeSelection::default()),
            &mut PanickingRng::new(),
        )
        .unwrap();
        assert_eq!(report.get_rounds(), 2);
    }

    #[test]
    fn test_deterministic_runs() {
        let graph = triangle("R", "B", "Y");
        let config = config(2, ChallengeMode::SingleEdge, EdgeSelection::Uniform);

        let first = prove_with_rng(&graph, &config, &mut ChaCha12Rng::seed_from_u64(8675309)).unwrap();
        let second = prove_with_rng(&graph, &config, &mut ChaCha12Rng::seed_from_u64(8675309)).unwrap();
        let third = prove_with_rng(&graph, &config, &mut ChaCha12Rng::seed_from_u64(1)).unwrap();

        assert_eq!(first, second);
        assert_ne!(first.get_digest(), third.get_digest());
    }

    #[test]
    fn test_fresh_permutations() {
        // Across rounds the prover's absolute colors should change
        let graph = triangle("R", "B", "Y");
        let params = Parameters::from_level(SecurityLevel::Toy);
        let mut prover = Prover::new(&graph, &params).unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        let mut colors_seen = alloc::vec::Vec::new();
        for round in 0..32 {
            let prover_round = prover.start_round(round, &mut rng).unwrap();
            let color = prover_round.get_key("A").unwrap().get_color();
            if !colors_seen.contains(&color) {
                colors_seen.push(color);
            }
        }
        assert_eq!(colors_seen.len(), 3);
    }
}
