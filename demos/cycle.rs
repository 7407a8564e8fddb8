// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! A long cycle colored by repeating `R`, `Y`, `B` is properly 3-colored when its length is a multiple of three.
//!
//! This example builds such a cycle in the text format, checks it structurally, and then drives a few rounds of the
//! interactive protocol by hand to show how the prover and verifier roles fit together.
#[cfg(test)]
mod test {
    use graph_coloring_zkp::*;
    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    // The number of cycle vertices
    const VERTEX_COUNT: usize = 999;

    // Build the cycle `1 -> 2 -> ... -> n -> 1` in the text format
    fn cycle_text() -> String {
        const LABELS: [&str; 3] = ["R", "Y", "B"];

        let mut lines = vec![format!("{VERTEX_COUNT},{VERTEX_COUNT}")];
        lines.extend((1..VERTEX_COUNT).map(|i| format!("{},{}", i, i + 1)));
        lines.push(format!("{VERTEX_COUNT},1"));
        lines.extend((0..VERTEX_COUNT).map(|i| format!("{},{}", i + 1, LABELS[i % LABELS.len()])));

        lines.join("\n")
    }

    #[test]
    fn cycle() {
        // In practice you should use an actual random number generator; this is just for easier testing
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        let graph = parse_graph(&cycle_text()).unwrap();
        assert_eq!(graph.vertex_count(), VERTEX_COUNT);
        assert_eq!(graph.edge_count(), VERTEX_COUNT);

        // The structural check sees every vertex, since the cycle is connected
        validate_coloring(&graph, &mut rng).unwrap();

        // A full proof would take `a * |E|` rounds; we run only a few here, using small parameters
        let params = Parameters::from_level(SecurityLevel::Toy);
        let mut prover = Prover::new(&graph, &params).unwrap();
        let verifier = Verifier::new(&graph, ChallengeMode::SingleEdge, EdgeSelection::Uniform);

        for round in 0..2 {
            // The prover relabels its colors and commits to every vertex
            let prover_round = prover.start_round(round, &mut rng).unwrap();
            let commitments = prover_round.commit();
            assert_eq!(commitments.len(), VERTEX_COUNT);

            // The verifier picks an edge, and the prover opens both endpoints
            let challenge = verifier.challenge(&mut rng).unwrap();
            let response = prover_round.respond(&challenge).unwrap();
            assert_eq!(response.len(), 2);

            // The openings show different colors, so the round passes
            assert!(verifier.verify(&commitments, &challenge, &response).is_ok());
        }

        // Breaking the pattern at one vertex produces an edge with equal colors
        let mut broken = graph.clone();
        broken.insert_vertex("2", Color::Red);
        assert!(matches!(
            validate_coloring(&broken, &mut rng),
            Err(ValidationError::ColoringNotProper { .. })
        ));
    }
}
