// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use merlin::{Transcript, TranscriptRng};
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::{
    arithmetic::ArithmeticError,
    commitment::RoundCommitments,
    domains,
    graph::Graph,
    parameters::Parameters,
    util::{fill, NullRng},
    verifier::Challenge,
};

// Bytes of external entropy mixed into each challenge generator
const EXTERNAL_ENTROPY_BYTES: usize = 32;

/// The public record of a proof run.
///
/// The transcript binds the security parameters and graph structure, then every round's commitments and challenge.
/// Challenges are drawn from a generator keyed by the transcript, so each one depends on the commitments it answers.
/// Nothing secret is ever appended.
pub(crate) struct ProtocolTranscript {
    transcript: Transcript,
}

impl ProtocolTranscript {
    /// Initialize a transcript for a graph's structure and parameters; colors are not recorded.
    pub(crate) fn new(params: &Parameters, graph: &Graph) -> Self {
        let mut transcript = Transcript::new(domains::TRANSCRIPT_PROTOCOL.as_bytes());
        transcript.append_u64(b"version", domains::VERSION);
        transcript.append_message(b"params", params.get_hash());
        transcript.append_u64(b"edge_count", graph.edge_count() as u64);
        for edge in graph.get_edges() {
            transcript.append_message(b"from", edge.get_from().as_bytes());
            transcript.append_message(b"to", edge.get_to().as_bytes());
        }

        Self { transcript }
    }

    /// Record the commitments published for a round.
    pub(crate) fn commit(&mut self, round: u64, commitments: &RoundCommitments) {
        self.transcript.append_u64(b"round", round);
        self.transcript.append_message(b"commitments", commitments.get_hash());
    }

    /// Build a challenge generator from the transcript and an external generator.
    ///
    /// External entropy is drawn fallibly and mixed in as witness bytes, so an entropy failure is returned as an
    /// [`ArithmeticError`].
    pub(crate) fn challenge_rng<R: CryptoRngCore>(
        &self,
        external_rng: &mut R,
    ) -> Result<TranscriptRng, ArithmeticError> {
        let mut entropy = Zeroizing::new([0u8; EXTERNAL_ENTROPY_BYTES]);
        fill(external_rng, &mut *entropy)?;

        Ok(self
            .transcript
            .build_rng()
            .rekey_with_witness_bytes(b"external", &*entropy)
            .finalize(&mut NullRng))
    }

    /// Record the challenge issued for a round.
    pub(crate) fn challenge(&mut self, challenge: &Challenge) {
        self.transcript.append_u64(b"challenge_size", challenge.get_edges().len() as u64);
        for edge in challenge.get_edges() {
            self.transcript.append_message(b"challenge_from", edge.get_from().as_bytes());
            self.transcript.append_message(b"challenge_to", edge.get_to().as_bytes());
        }
    }

    /// Produce a digest of everything recorded so far.
    pub(crate) fn digest(&self) -> [u8; crate::TRANSCRIPT_HASH_BYTES] {
        // Clone so the running transcript is left unchanged
        let mut transcript = self.transcript.clone();
        let mut hash = [0u8; crate::TRANSCRIPT_HASH_BYTES];
        transcript.challenge_bytes(b"digest", &mut hash);

        hash
    }
}
