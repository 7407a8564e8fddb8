// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! A structural check of coloring validity by breadth-first traversal.
//!
//! This check is not cryptographic, and reveals everything it looks at. It only covers the component reachable from its
//! start vertex, so a miscolored edge in another component of a disconnected graph is not detected.

use alloc::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    string::{String, ToString},
    vec::Vec,
};

use rand_core::CryptoRngCore;
use snafu::prelude::*;
use tracing::debug;

use crate::{
    arithmetic::ArithmeticError,
    graph::{Edge, Graph},
    util::random_index,
};

/// Errors that can arise from the structural check.
#[derive(Debug, Snafu)]
pub enum ValidationError {
    /// A reached vertex has no color.
    #[snafu(display("Vertex {vertex} does not have a color"))]
    VertexUncolored {
        /// The vertex identifier.
        vertex: String,
    },
    /// An edge joins two vertices of the same color.
    #[snafu(display("Edge {from} -> {to} joins two vertices of the same color"))]
    ColoringNotProper {
        /// The source vertex.
        from: String,
        /// The destination vertex.
        to: String,
    },
    /// The start vertex could not be sampled.
    #[snafu(display("Start vertex sampling failed: {source}"))]
    Sampling {
        /// The underlying failure.
        source: ArithmeticError,
    },
}

/// Check the coloring of `graph` from a start vertex chosen uniformly among vertices with outgoing edges.
///
/// A graph with no edges is trivially valid.
pub fn validate_coloring<R: CryptoRngCore>(graph: &Graph, rng: &mut R) -> Result<(), ValidationError> {
    let sources = graph.get_adjacency();
    if sources.is_empty() {
        return Ok(());
    }

    let index = random_index(rng, sources.len()).context(SamplingSnafu)?;
    let start = sources
        .keys()
        .nth(index)
        .ok_or(ArithmeticError::InvalidBound {
            reason: "start index was out of range",
        })
        .context(SamplingSnafu)?;

    validate_coloring_from(graph, start)
}

/// Check the coloring of `graph` by breadth-first traversal from `start`.
///
/// Edges are followed in both directions. Every edge incident to a reached vertex is checked, including edges between
/// vertices that were already reached. The first violation is returned.
pub fn validate_coloring_from(graph: &Graph, start: &str) -> Result<(), ValidationError> {
    let mut incident: BTreeMap<&str, Vec<&Edge>> = BTreeMap::new();
    for edge in graph.get_edges() {
        incident.entry(edge.get_from()).or_default().push(edge);
        if edge.get_to() != edge.get_from() {
            incident.entry(edge.get_to()).or_default().push(edge);
        }
    }

    let color_of = |vertex: &str| {
        graph.get_color(vertex).ok_or_else(|| ValidationError::VertexUncolored {
            vertex: vertex.to_string(),
        })
    };
    color_of(start)?;

    let mut visited = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut checked = 0usize;

    while let Some(vertex) = queue.pop_front() {
        let color = color_of(vertex)?;

        for edge in incident.get(vertex).map(Vec::as_slice).unwrap_or_default() {
            let neighbor = if edge.get_from() == vertex {
                edge.get_to()
            } else {
                edge.get_from()
            };

            if color_of(neighbor)? == color {
                return Err(ValidationError::ColoringNotProper {
                    from: edge.get_from().to_string(),
                    to: edge.get_to().to_string(),
                });
            }
            checked += 1;

            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    debug!(start, reached = visited.len(), checked, "coloring is proper");

    Ok(())
}
