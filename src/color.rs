// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use core::{fmt, str::FromStr};

use rand_core::CryptoRngCore;
use snafu::prelude::*;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{arithmetic::ArithmeticError, util::random_index};

/// The number of colors in a coloring.
pub const COLOR_COUNT: usize = 3;

/// The number of low-order bits needed to encode a color ordinal.
pub const COLOR_BITS: u64 = 2;

/// A vertex color.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    /// Encoded as ordinal `0` and label `R`.
    Red,
    /// Encoded as ordinal `1` and label `B`.
    Blue,
    /// Encoded as ordinal `2` and label `Y`.
    Yellow,
}

/// Errors that can arise relating to [`Color`].
#[derive(Debug, Snafu)]
pub enum ColorError {
    /// A label did not name a color.
    #[snafu(display("Unrecognized color label"))]
    UnknownLabel,
    /// An ordinal did not encode a color.
    #[snafu(display("Unrecognized color ordinal {ordinal}"))]
    UnknownOrdinal {
        /// The offending ordinal.
        ordinal: u8,
    },
}

impl Color {
    /// All colors, in ordinal order.
    pub const ALL: [Color; COLOR_COUNT] = [Color::Red, Color::Blue, Color::Yellow];

    /// Get the ordinal that encodes this color.
    pub fn ordinal(self) -> u8 {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
            Color::Yellow => 2,
        }
    }

    /// Get the color encoded by an ordinal.
    pub fn from_ordinal(ordinal: u8) -> Result<Self, ColorError> {
        Self::ALL
            .get(usize::from(ordinal))
            .copied()
            .ok_or(ColorError::UnknownOrdinal { ordinal })
    }

    /// Get the single-letter label used in graph descriptions.
    pub fn label(self) -> &'static str {
        match self {
            Color::Red => "R",
            Color::Blue => "B",
            Color::Yellow => "Y",
        }
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "R" => Ok(Color::Red),
            "B" => Ok(Color::Blue),
            "Y" => Ok(Color::Yellow),
            _ => Err(ColorError::UnknownLabel),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A random relabeling of the colors.
///
/// A fresh permutation is applied to the coloring at the start of every round, so the absolute color of any vertex
/// cannot be correlated across rounds. It is wiped when dropped.
#[derive(Clone, Debug, Eq, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct ColorPermutation {
    image: [u8; COLOR_COUNT],
}

impl ColorPermutation {
    /// The permutation that leaves every color alone.
    pub fn identity() -> Self {
        Self { image: [0, 1, 2] }
    }

    /// Sample a uniformly random permutation with a Fisher-Yates shuffle.
    ///
    /// Returns an [`ArithmeticError`] if the generator fails.
    pub fn random<R: CryptoRngCore>(rng: &mut R) -> Result<Self, ArithmeticError> {
        let mut image = [0, 1, 2];
        for i in (1..COLOR_COUNT).rev() {
            let j = random_index(rng, i + 1)?;
            image.swap(i, j);
        }

        Ok(Self { image })
    }

    /// Apply the permutation to a color.
    pub fn apply(&self, color: Color) -> Color {
        // The image only ever holds valid ordinals
        Color::ALL[usize::from(self.image[usize::from(color.ordinal())])]
    }
}
