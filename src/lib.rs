// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! An experimental Rust implementation of an interactive zero-knowledge proof of graph 3-coloring.
//!
//! # Overview
//!
//! A prover who knows a proper 3-coloring of a graph convinces a verifier of this fact without revealing the coloring.
//! The protocol runs in rounds. At the start of each round, the prover relabels its colors with a fresh random
//! permutation. It then generates, for every vertex, an ephemeral RSA-style trapdoor `(N, d, c)` with `d*c = 1 mod
//! phi(N)`, and a random mask whose two lowest bits encode the vertex color. It publishes a [`Commitment`] `(N, d, Z)`
//! with `Z = mask^d mod N` for every vertex.
//!
//! The verifier challenges one edge (or, in the exhaustive variant, every edge). The prover reveals the secret exponents
//! of the endpoints, and the verifier recovers each mask as `Z^c mod N`, checks that it re-encrypts to `Z`, and compares
//! the color bits. Equal colors on an edge mean the prover is cheating, and the run is rejected at once.
//!
//! Each round only reveals that two adjacent vertices have different colors, which a proper coloring implies anyway.
//! Fresh keys and a fresh permutation every round keep the verifier from linking colors across rounds. Under uniform
//! edge selection, a cheating prover survives a round with probability at most `1 - 1/|E|`, so running `a * |E|` rounds
//! for a soundness multiplier `a` drives its success probability down to roughly `e^-a`.
//!
//! A separate [structural check](`crate::bfs`) validates a coloring directly by breadth-first traversal. It is not
//! zero-knowledge, and is useful for debugging input graphs.
//!
//! # Implementation notes
//!
//! This implementation makes several opinionated choices:
//! - It uses [`num-bigint`](https://crates.io/crates/num-bigint) for arbitrary-precision arithmetic.
//! - It uses [Merlin](https://merlin.cool/) to bind every challenge to the commitments it answers.
//! - It uses [`tracing`](https://crates.io/crates/tracing) for logging; no secret material is ever logged.
//!
//! The library is `no_std` friendly. All randomness is supplied by the caller through a cryptographically-secure
//! generator, and entropy failures are returned as errors rather than panicking.
//!
//! There are several features available.
//!
//! | Feature | Default? | Description |
//! | :--- | :---: | :--- |
//! | `borsh` | | Adds commitment serialization and deserialization via [`borsh`](https://crates.io/crates/borsh) |
//! | `cli` | | Builds the `graph-coloring` command-line tool |
//! | `rand` | ✓ | Adds additional functionality that supplies a cryptographically-secure random number generator |
//! | `rayon` | | Generates per-vertex round keys in parallel via [`rayon`](https://crates.io/crates/rayon) |
//! | `serde` | | Adds message serialization and deserialization via [`serde`](https://crates.io/crates/serde) |
//! | `std` | ✓ | Adds corresponding dependency features |
//!
//! Commitments support a custom serialization format designed to be canonical.
//! This is used for `borsh` serialization and deserialization, or can be accessed directly.
//! This functionality has an associated fuzzer that can be run using a nightly compiler: `cargo +nightly fuzz run
//! commitments`.
//!
//! You can examine performance using the benchmarks: `cargo bench --all-features`.
//!
//! # Warning
//!
//! This implementation is intended for experimentation and teaching. It is **not** suitable for production use.
//!
//! # Example
//!
//! Here's a complete example of how to prove a coloring; see the documentation for additional functionality.
//!
//! ```
//! # #[cfg(feature = "rand")]
//! # {
//! use graph_coloring_zkp::*;
//!
//! // Parse a properly colored triangle
//! let graph = parse_graph("3,3\nA,B\nB,C\nC,A\nA,R\nB,B\nC,Y").unwrap();
//!
//! // Use small parameters, and challenge each edge twice on average
//! let config = ProtocolConfig::new(
//!     &Parameters::from_level(SecurityLevel::Toy),
//!     2,
//!     ChallengeMode::SingleEdge,
//!     EdgeSelection::Uniform,
//! )
//! .unwrap();
//!
//! // The proof should be accepted
//! let report = prove(&graph, &config).unwrap();
//! assert_eq!(report.get_rounds(), 6);
//!
//! // A coloring that uses the same color on an edge is caught by the structural check
//! let bad = parse_graph("2,1\nA,B\nA,R\nB,R").unwrap();
//! assert!(validate_coloring_from(&bad, "A").is_err());
//! # }
//! ```

#![no_std]

extern crate alloc;

/// Extended Euclidean algorithm and modular inverses.
pub mod arithmetic;
pub use arithmetic::{extended_gcd, modular_inverse, ArithmeticError, ExtendedGcd};
/// Structural coloring checks.
pub mod bfs;
pub use bfs::{validate_coloring, validate_coloring_from, ValidationError};
/// Vertex colors and color permutations.
pub mod color;
pub use color::{Color, ColorError, ColorPermutation};
/// Published per-vertex commitments.
pub mod commitment;
pub use commitment::{Commitment, CommitmentError, RoundCommitments};
/// Graphs with vertex colorings.
pub mod graph;
pub use graph::{Edge, Graph, GraphError};
/// Per-vertex round keys.
pub mod key;
pub use key::{KeyError, RoundKey};
/// Security parameters and protocol configuration.
pub mod parameters;
pub use parameters::{ChallengeMode, EdgeSelection, ParameterError, Parameters, ProtocolConfig, SecurityLevel};
/// Parsing of the graph text format.
pub mod parse;
pub use parse::{parse_graph, ParseError};
/// Random prime generation and primality testing.
pub mod prime;
/// The proof driver.
pub mod protocol;
#[cfg(feature = "rand")]
pub use protocol::prove;
pub use protocol::{prove_with_rng, ProofError, ProofReport, Prover};
/// The prover's per-round state.
pub mod round;
pub use round::{ProverRound, Response, RoundError};
/// Protocol transcripts.
pub(crate) mod transcript;
/// Various utility functionality.
pub(crate) mod util;
/// The verifier role.
pub mod verifier;
pub use verifier::{Challenge, VerificationError, Verifier};

pub(crate) use domains::TRANSCRIPT_HASH_BYTES;

/// Domain separators used for hashing operations
pub(crate) mod domains {
    // Version
    pub(crate) const VERSION: u64 = 0;

    // Number of bytes in a transcript hash
    pub(crate) const TRANSCRIPT_HASH_BYTES: usize = 32;

    // Parameters
    pub(crate) const TRANSCRIPT_PARAMETERS: &str = "Graph coloring parameters";

    // Commitments
    pub(crate) const TRANSCRIPT_ROUND_COMMITMENTS: &str = "Graph coloring round commitments";

    // Protocol
    pub(crate) const TRANSCRIPT_PROTOCOL: &str = "Graph coloring protocol";
}
