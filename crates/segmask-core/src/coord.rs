#![forbid(unsafe_code)]

//! Coordinates in value space and display space.
//!
//! A coordinate addresses a caret boundary inside one section: `section` is
//! the section number and `position` the boundary offset within it. The same
//! type serves both spaces:
//!
//! - **value space**: `section` counts input sections only, `position` counts
//!   typed grapheme clusters.
//! - **display space**: `section` counts every section, `position` counts
//!   rendered grapheme clusters (padding and literals included).
//!
//! The textual form `"i:p"` is only used at the boundary (`Display`,
//! `FromStr`, and serde when enabled).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A `(section, position)` pair ordered by section first, then position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SpaceCoord {
    /// Section number (value index or display index depending on the space).
    pub section: usize,
    /// Caret boundary inside the section.
    pub position: usize,
}

impl SpaceCoord {
    /// The origin `0:0`.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Create a coordinate.
    #[must_use]
    pub const fn new(section: usize, position: usize) -> Self {
        Self { section, position }
    }

    /// Same section, different position.
    #[must_use]
    pub const fn with_position(self, position: usize) -> Self {
        Self {
            section: self.section,
            position,
        }
    }
}

impl fmt::Display for SpaceCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.position)
    }
}

/// Error returned when parsing an `"i:p"` coordinate fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordParseError {
    /// The input has no `:` separator.
    MissingSeparator(String),
    /// The section part is not a non-negative integer.
    InvalidSection(String),
    /// The position part is not a non-negative integer.
    InvalidPosition(String),
}

impl fmt::Display for CoordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator(input) => {
                write!(f, "coordinate {input:?} is missing the ':' separator")
            }
            Self::InvalidSection(input) => write!(f, "coordinate {input:?} has an invalid section"),
            Self::InvalidPosition(input) => {
                write!(f, "coordinate {input:?} has an invalid position")
            }
        }
    }
}

impl std::error::Error for CoordParseError {}

impl FromStr for SpaceCoord {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, position) = s
            .split_once(':')
            .ok_or_else(|| CoordParseError::MissingSeparator(s.to_owned()))?;
        let section = section
            .trim()
            .parse()
            .map_err(|_| CoordParseError::InvalidSection(s.to_owned()))?;
        let position = position
            .trim()
            .parse()
            .map_err(|_| CoordParseError::InvalidPosition(s.to_owned()))?;
        Ok(Self { section, position })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SpaceCoord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SpaceCoord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Compare two optional coordinates.
///
/// Returns `None` when either side is missing, which callers treat as
/// "incomparable" (for example a caret that has no display position).
#[must_use]
pub fn compare_space_coordinates(a: Option<SpaceCoord>, b: Option<SpaceCoord>) -> Option<Ordering> {
    Some(a?.cmp(&b?))
}

/// The ordered pair `(lower, upper)` spanned by two coordinates.
#[must_use]
pub fn ordered(a: SpaceCoord, b: SpaceCoord) -> (SpaceCoord, SpaceCoord) {
    if a <= b { (a, b) } else { (b, a) }
}
