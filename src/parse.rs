// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Parsing of the line-oriented graph text format.
//!
//! The first line is a header `n,m` with the vertex count `n` and edge count `m`. It is followed by `m` edge lines
//! `from,to` and then `n` vertex lines `vertex,color`, where `color` is one of `R`, `B`, or `Y`. The vertex count must be
//! less than [`MAX_VERTEX_COUNT`], and the edge count must be at most `n^2`.

use alloc::string::{String, ToString};
use core::str::FromStr;

use itertools::Itertools;
use snafu::prelude::*;

use crate::graph::{Graph, GraphError};

/// The exclusive upper bound on the vertex count.
pub const MAX_VERTEX_COUNT: usize = 1001;

/// Errors that can arise when parsing a graph.
///
/// Line numbers start at one.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// A line did not have exactly two comma-separated fields.
    #[snafu(display("Line {line}: expected {expected} as two comma-separated fields"))]
    InvalidFormat {
        /// The line number.
        line: usize,
        /// What the line should contain.
        expected: &'static str,
    },
    /// A header count was not a nonnegative integer.
    #[snafu(display("Line {line}: invalid count {value:?}"))]
    InvalidCount {
        /// The line number.
        line: usize,
        /// The rejected field.
        value: String,
    },
    /// The header counts were out of range.
    #[snafu(display("Invalid graph size {vertices},{edges}: need fewer than {MAX_VERTEX_COUNT} vertices and at most n^2 edges"))]
    InvalidSize {
        /// The declared vertex count.
        vertices: usize,
        /// The declared edge count.
        edges: usize,
    },
    /// The input ended before all declared lines were read.
    #[snafu(display("Line {line}: expected {expected}, found end of input"))]
    MissingLine {
        /// The line number.
        line: usize,
        /// What the line should contain.
        expected: &'static str,
    },
    /// A vertex line named an invalid color.
    #[snafu(display("Line {line}: {source}"))]
    InvalidVertex {
        /// The line number.
        line: usize,
        /// The underlying failure.
        source: GraphError,
    },
    /// Non-blank input followed the declared lines.
    #[snafu(display("Line {line}: unexpected trailing data"))]
    TrailingData {
        /// The line number.
        line: usize,
    },
}

/// Parse a [`Graph`] from its text format.
///
/// Surrounding whitespace on each line and field is ignored, as are blank lines after the declared content.
pub fn parse_graph(input: &str) -> Result<Graph, ParseError> {
    let mut lines = input.lines().enumerate().map(|(index, line)| (index + 1, line.trim()));

    let (vertices, edges) = {
        let (line, text) = next_line(&mut lines, 1, "a header")?;
        let (vertices, edges) = split_pair(line, text, "a header")?;
        (parse_count(line, vertices)?, parse_count(line, edges)?)
    };
    let too_many_edges = vertices.checked_mul(vertices).map_or(true, |limit| edges > limit);
    if vertices >= MAX_VERTEX_COUNT || too_many_edges {
        return Err(ParseError::InvalidSize { vertices, edges });
    }

    let mut graph = Graph::new();
    let mut expected_line = 2;
    for _ in 0..edges {
        let (line, text) = next_line(&mut lines, expected_line, "an edge")?;
        let (from, to) = split_pair(line, text, "an edge")?;
        graph.add_edge(from, to);
        expected_line = line + 1;
    }
    for _ in 0..vertices {
        let (line, text) = next_line(&mut lines, expected_line, "a vertex")?;
        let (vertex, label) = split_pair(line, text, "a vertex")?;
        graph.add_vertex(vertex, label).context(InvalidVertexSnafu { line })?;
        expected_line = line + 1;
    }

    if let Some((line, _)) = lines.find(|(_, text)| !text.is_empty()) {
        return Err(ParseError::TrailingData { line });
    }

    Ok(graph)
}

// Get the next line, or fail naming the line that was expected
fn next_line<'a>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    expected_line: usize,
    expected: &'static str,
) -> Result<(usize, &'a str), ParseError> {
    lines.next().ok_or(ParseError::MissingLine {
        line: expected_line,
        expected,
    })
}

// Parse a nonnegative count field
fn parse_count(line: usize, value: &str) -> Result<usize, ParseError> {
    value.parse::<usize>().map_err(|_| ParseError::InvalidCount {
        line,
        value: value.to_string(),
    })
}

// Split a line into exactly two trimmed fields
fn split_pair<'a>(line: usize, text: &'a str, expected: &'static str) -> Result<(&'a str, &'a str), ParseError> {
    text.split(',')
        .map(str::trim)
        .collect_tuple()
        .ok_or(ParseError::InvalidFormat { line, expected })
}

impl FromStr for Graph {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_graph(s)
    }
}

impl ParseError {
    /// Get the line number where the error occurred, if it refers to one.
    pub fn get_line(&self) -> Option<usize> {
        match self {
            Self::InvalidFormat { line, .. } |
            Self::InvalidCount { line, .. } |
            Self::MissingLine { line, .. } |
            Self::InvalidVertex { line, .. } |
            Self::TrailingData { line } => Some(*line),
            Self::InvalidSize { .. } => None,
        }
    }
}
