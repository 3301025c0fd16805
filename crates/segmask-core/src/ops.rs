#![forbid(unsafe_code)]

//! Patch operations: the edit and movement intents the engine understands.

use crate::coord::SpaceCoord;
use crate::section::{InputBehavior, SpinDirection, SpinModifiers};
use crate::values::MaskValues;

/// Horizontal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Direction {
    /// Towards the start.
    Left,
    /// Towards the end.
    Right,
}

/// Granularity of a caret move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MoveLevel {
    /// One value-space boundary.
    Character,
    /// Section edges.
    Section,
    /// Start or end of the whole value.
    Line,
}

/// A single edit or movement intent.
///
/// With the `serde` feature, operations use an `op` tag in kebab-case
/// (`{"op":"move-cursor",...}`); unknown tags deserialize to
/// [`PatchOperation::Unsupported`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "kebab-case"))]
pub enum PatchOperation {
    /// Move the caret.
    MoveCursor {
        /// Left or right.
        direction: Direction,
        /// Granularity.
        level: MoveLevel,
        /// Keep the selection end in place (extend the selection).
        #[cfg_attr(feature = "serde", serde(default))]
        keep_selection_end: bool,
    },
    /// Put the caret at an explicit value-space coordinate.
    SetCursorPosition {
        /// New caret.
        caret: SpaceCoord,
        /// Keep the selection end in place.
        #[cfg_attr(feature = "serde", serde(default))]
        keep_selection_end: bool,
        /// Ask the caller to re-render immediately.
        #[cfg_attr(feature = "serde", serde(default))]
        rerender: bool,
    },
    /// Set both selection endpoints.
    SetSelection {
        /// New caret.
        caret: SpaceCoord,
        /// New selection end.
        selection_end: SpaceCoord,
    },
    /// Select the whole adjacent input section.
    SelectNextSection {
        /// Which neighbor.
        direction: Direction,
    },
    /// Select every value boundary.
    SelectAll,
    /// Collapse the selection onto one of its edges.
    ClearSelection {
        /// `Left` keeps the lower edge, `Right` the upper.
        direction: Direction,
    },
    /// Delete the selected graphemes.
    DeleteSelection,
    /// Type one grapheme.
    InsertCharacter {
        /// The grapheme.
        character: String,
        /// Override of the section's input behavior.
        #[cfg_attr(feature = "serde", serde(default))]
        input_behavior: Option<InputBehavior>,
    },
    /// Delete the grapheme before the caret.
    DeleteBackwards,
    /// Delete the grapheme after the caret.
    DeleteForwards,
    /// Increment or decrement the section under the caret.
    Spin {
        /// Up or down.
        direction: SpinDirection,
        /// Modifier keys.
        #[cfg_attr(feature = "serde", serde(default))]
        modifiers: SpinModifiers,
    },
    /// Run the mask's value normalization.
    ApplyValueNormalization,
    /// Replace every value.
    SetValues {
        /// New value map.
        values: MaskValues,
    },
    /// An operation this engine does not know; ends a batch.
    #[cfg_attr(feature = "serde", serde(other))]
    Unsupported,
}

impl PatchOperation {
    /// Insert one grapheme with the section's default behavior.
    #[must_use]
    pub fn insert(character: impl Into<String>) -> Self {
        Self::InsertCharacter {
            character: character.into(),
            input_behavior: None,
        }
    }

    /// Move without extending the selection.
    #[must_use]
    pub fn move_cursor(direction: Direction, level: MoveLevel) -> Self {
        Self::MoveCursor {
            direction,
            level,
            keep_selection_end: false,
        }
    }

    /// Spin without modifiers.
    #[must_use]
    pub fn spin(direction: SpinDirection) -> Self {
        Self::Spin {
            direction,
            modifiers: SpinModifiers::NONE,
        }
    }

    /// Whether this operation changes typed characters.
    #[must_use]
    pub fn mutates_characters(&self) -> bool {
        matches!(
            self,
            Self::InsertCharacter { .. }
                | Self::DeleteBackwards
                | Self::DeleteForwards
                | Self::DeleteSelection
                | Self::Spin { .. }
        )
    }

    /// Whether the caller should re-render right after this operation.
    #[must_use]
    pub fn requests_rerender(&self) -> bool {
        self.mutates_characters() || matches!(self, Self::SetCursorPosition { rerender: true, .. })
    }

    /// Stable kebab-case name, as used by the serde tag.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::MoveCursor { .. } => "move-cursor",
            Self::SetCursorPosition { .. } => "set-cursor-position",
            Self::SetSelection { .. } => "set-selection",
            Self::SelectNextSection { .. } => "select-next-section",
            Self::SelectAll => "select-all",
            Self::ClearSelection { .. } => "clear-selection",
            Self::DeleteSelection => "delete-selection",
            Self::InsertCharacter { .. } => "insert-character",
            Self::DeleteBackwards => "delete-backwards",
            Self::DeleteForwards => "delete-forwards",
            Self::Spin { .. } => "spin",
            Self::ApplyValueNormalization => "apply-value-normalization",
            Self::SetValues { .. } => "set-values",
            Self::Unsupported => "unsupported",
        }
    }
}
