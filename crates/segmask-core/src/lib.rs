#![forbid(unsafe_code)]

//! Core: coordinate spaces, section hooks, derived state, and patch operations
//! for segmented masked text inputs.
//!
//! A mask is a list of fixed and input sections. The caller owns a
//! [`MaskState`] (values, caret, selection end), derives a
//! [`MaskDerivedState`] from it, and advances it by applying batches of
//! [`PatchOperation`]s with [`apply_patch_operations`].

pub mod coord;
pub mod definition;
pub mod derive;
pub mod logging;
pub mod navigator;
pub mod ops;
pub mod patch;
pub mod section;
pub mod state;
pub mod validation;
pub mod values;
pub mod view;

pub use coord::{CoordParseError, SpaceCoord, compare_space_coordinates};
pub use definition::{ConcatValues, MaskDefinition, MaskHooks, ValuesParseError};
pub use derive::{InputSectionState, MaskDerivedState, SectionState, derive_state};
pub use ops::{Direction, MoveLevel, PatchOperation};
pub use patch::{BatchOutcome, apply_patch_operations};
pub use section::{
    Alignment, FixedSection, InputBehavior, InputSection, MaskChar, MaskCharKind, PlainText,
    Section, SectionHooks, SectionKind, SpinDirection, SpinModifiers, SpinRequest,
};
pub use state::MaskState;
pub use validation::{CharClass, ValidationError, ValidationResult};
pub use values::{MaskValues, grapheme_count, split_graphemes};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, trace_span, warn};
