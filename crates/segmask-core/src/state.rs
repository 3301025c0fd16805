#![forbid(unsafe_code)]

//! The caller-owned editing state.

use crate::coord::{SpaceCoord, ordered};
use crate::values::MaskValues;

/// Values plus caret and selection end, both in value space.
///
/// There is no anchor/head ordering: the selected range is the span between
/// the two coordinates in whichever order they sit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaskState {
    /// Section values.
    pub values: MaskValues,
    /// Caret position in value space.
    pub caret: SpaceCoord,
    /// Other end of the selection in value space.
    pub selection_end: SpaceCoord,
}

impl MaskState {
    /// Initial state for `values` with the caret at `0:0`.
    #[must_use]
    pub fn initial(values: MaskValues) -> Self {
        Self {
            values,
            caret: SpaceCoord::ORIGIN,
            selection_end: SpaceCoord::ORIGIN,
        }
    }

    /// Initial state from plain strings.
    pub fn from_strings<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        Self::initial(MaskValues::from_strings(entries))
    }

    /// New values, same caret and selection end.
    #[must_use]
    pub fn with_values(&self, values: MaskValues) -> Self {
        Self {
            values,
            caret: self.caret,
            selection_end: self.selection_end,
        }
    }

    /// Same values, new caret and selection end (`None` collapses onto the caret).
    #[must_use]
    pub fn with_caret(&self, caret: SpaceCoord, selection_end: Option<SpaceCoord>) -> Self {
        Self {
            values: self.values.clone(),
            caret,
            selection_end: selection_end.unwrap_or(caret),
        }
    }

    /// Whether caret and selection end differ.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.caret != self.selection_end
    }

    /// `(lower, upper)` bounds of the selection.
    #[must_use]
    pub fn selection_bounds(&self) -> (SpaceCoord, SpaceCoord) {
        ordered(self.caret, self.selection_end)
    }
}
