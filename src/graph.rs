// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use snafu::prelude::*;

use crate::color::{Color, ColorPermutation};

/// A directed edge between two vertices.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    from: String,
    to: String,
}

impl Edge {
    /// Generate a new [`Edge`] between two vertex identifiers.
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Get the source vertex of this [`Edge`].
    pub fn get_from(&self) -> &str {
        &self.from
    }

    /// Get the destination vertex of this [`Edge`].
    pub fn get_to(&self) -> &str {
        &self.to
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A graph together with a vertex coloring.
///
/// Edges are stored in insertion order, both as a flat list and as per-source adjacency lists. Duplicate edges are
/// kept. Vertices are identified by opaque strings, and every vertex that appears in an edge must be colored before the
/// coloring is checked or proven.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Graph {
    edges: Vec<Edge>,
    adjacency: BTreeMap<String, Vec<String>>,
    colors: BTreeMap<String, Color>,
}

/// Errors that can arise relating to [`Graph`].
#[derive(Debug, Snafu)]
pub enum GraphError {
    /// A vertex was assigned a label that does not name a color.
    #[snafu(display("Vertex {vertex} has invalid color {label:?}"))]
    InvalidColor {
        /// The vertex identifier.
        vertex: String,
        /// The rejected label.
        label: String,
    },
    /// An edge references a vertex that has no color.
    #[snafu(display("Vertex {vertex} does not have a color"))]
    VertexUncolored {
        /// The vertex identifier.
        vertex: String,
    },
}

impl Graph {
    /// Generate a new empty [`Graph`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directed edge.
    ///
    /// The endpoints are not required to exist yet.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges.push(Edge::new(from, to));
        self.adjacency.entry(from.to_string()).or_default().push(to.to_string());
    }

    /// Color a vertex using a single-letter label (`R`, `B`, or `Y`).
    ///
    /// Any previous color for the vertex is overwritten. If the label does not name a color, returns a [`GraphError`].
    pub fn add_vertex(&mut self, vertex: &str, label: &str) -> Result<(), GraphError> {
        let color = label.parse::<Color>().map_err(|_| GraphError::InvalidColor {
            vertex: vertex.to_string(),
            label: label.to_string(),
        })?;
        self.insert_vertex(vertex, color);

        Ok(())
    }

    /// Color a vertex, overwriting any previous color.
    pub fn insert_vertex(&mut self, vertex: &str, color: Color) {
        self.colors.insert(vertex.to_string(), color);
    }

    /// Get the color of a vertex, if it has one.
    pub fn get_color(&self, vertex: &str) -> Option<Color> {
        self.colors.get(vertex).copied()
    }

    /// Get the colored vertices and their colors, ordered by identifier.
    pub fn get_colors(&self) -> &BTreeMap<String, Color> {
        &self.colors
    }

    /// Get all edges in insertion order.
    pub fn get_edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get the adjacency lists, keyed by source vertex.
    ///
    /// Only vertices with at least one outgoing edge appear.
    pub fn get_adjacency(&self) -> &BTreeMap<String, Vec<String>> {
        &self.adjacency
    }

    /// Get the destinations of the outgoing edges of a vertex.
    pub fn get_out_edges(&self, vertex: &str) -> &[String] {
        self.adjacency.get(vertex).map(Vec::as_slice).unwrap_or_default()
    }

    /// Get the number of colored vertices.
    pub fn vertex_count(&self) -> usize {
        self.colors.len()
    }

    /// Get the number of edges, counting duplicates.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check that every edge endpoint has a color.
    ///
    /// Returns a [`GraphError`] naming the first uncolored endpoint found.
    pub fn check_colored(&self) -> Result<(), GraphError> {
        for edge in &self.edges {
            for vertex in [edge.get_from(), edge.get_to()] {
                if !self.colors.contains_key(vertex) {
                    return Err(GraphError::VertexUncolored {
                        vertex: vertex.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Relabel every vertex color through a permutation.
    pub fn permute_colors(&mut self, permutation: &ColorPermutation) {
        for color in self.colors.values_mut() {
            *color = permutation.apply(*color);
        }
    }
}

impl fmt::Display for Graph {
    /// Write the graph in the line-oriented text format accepted by [`parse_graph`](`crate::parse::parse_graph`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.colors.len(), self.edges.len())?;
        for edge in &self.edges {
            write!(f, "\n{},{}", edge.from, edge.to)?;
        }
        for (vertex, color) in &self.colors {
            write!(f, "\n{vertex},{color}")?;
        }

        Ok(())
    }
}
