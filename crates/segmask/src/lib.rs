#![forbid(unsafe_code)]

//! segmask public facade crate.
//!
//! Re-exports the engine, the ready-made masks, and input translation, and
//! offers a prelude for day-to-day usage.
//!
//! ```
//! use segmask::prelude::*;
//!
//! let definition = ipv4_mask();
//! let values = definition.parse_values("10.0.0.1")?;
//! let state = MaskState::initial(values);
//! let outcome = apply_patch_operations(&[PatchOperation::SelectAll], &state, &definition, None);
//! assert_eq!(outcome.derived.validated_value.as_deref(), Some("10.0.0.1"));
//! # Ok::<(), segmask::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use segmask_core::view::{CellView, MaskView, SectionView, render};
pub use segmask_core::{
    Alignment, BatchOutcome, CharClass, CoordParseError, Direction, InputBehavior, InputSection,
    MaskChar, MaskDefinition, MaskDerivedState, MaskHooks, MaskState, MaskValues, MoveLevel,
    PatchOperation, Section, SectionHooks, SpaceCoord, SpinDirection, SpinModifiers, SpinRequest,
    ValidationError, ValidationResult, ValuesParseError, apply_patch_operations, derive_state,
};

// --- Mask re-exports -------------------------------------------------------

#[cfg(feature = "masks")]
pub use segmask_masks::{
    DateConfig, DateStyle, IntegerConfig, NumericConfig, UuidConfig, YearConfig, YearMonthConfig,
    date_mask, ean_mask, integer_mask, ipv4_mask, ipv6_mask, isbn_mask, isrc_mask, numeric_mask,
    uuid_mask, year_mask, year_month_mask,
};

// --- Input re-exports ------------------------------------------------------

#[cfg(feature = "input")]
pub use segmask_input::{
    InputEvent, KeyCode, KeyEvent, KeyEventKind, Modifiers, Platform, SelectionSnapshot,
    Translation, translate, translate_key_with_text,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for segmask callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A `section:position` coordinate did not parse.
    Coord(CoordParseError),
    /// A string value did not parse into mask values.
    ValuesParse(ValuesParseError),
    /// A complete value failed semantic validation.
    Validation(ValidationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coord(err) => write!(f, "{err}"),
            Self::ValuesParse(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Coord(err) => Some(err),
            Self::ValuesParse(err) => Some(err),
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<CoordParseError> for Error {
    fn from(err: CoordParseError) -> Self {
        Self::Coord(err)
    }
}

impl From<ValuesParseError> for Error {
    fn from(err: ValuesParseError) -> Self {
        Self::ValuesParse(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

/// Standard result type for segmask APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Parse `text` with `definition` and return its canonical encoding.
///
/// Fails when the text does not parse or the parsed value is semantically
/// invalid. An incomplete value that parses cleanly but cannot be encoded is
/// reported as `Ok(None)`.
pub fn validate_str(definition: &MaskDefinition, text: &str) -> Result<Option<String>> {
    let values = definition.parse_values(text)?;
    let derived = derive_state(&MaskState::initial(values), definition);
    if let Some(ValidationResult::Invalid(err)) = derived.semantic_validation {
        return Err(err.into());
    }
    Ok(derived.validated_value)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Direction, Error, MaskDefinition, MaskDerivedState, MaskState, MaskValues, MoveLevel,
        PatchOperation, Result, SpaceCoord, apply_patch_operations, derive_state, render,
    };

    #[cfg(feature = "masks")]
    pub use crate::{
        DateConfig, IntegerConfig, NumericConfig, date_mask, ean_mask, integer_mask, ipv4_mask,
        ipv6_mask, isbn_mask, isrc_mask, numeric_mask, uuid_mask,
    };

    #[cfg(feature = "input")]
    pub use crate::{InputEvent, KeyCode, KeyEvent, Modifiers, Platform, translate};

    pub use crate::core;
    #[cfg(feature = "input")]
    pub use crate::input;
    #[cfg(feature = "masks")]
    pub use crate::masks;
}

pub use segmask_core as core;
#[cfg(feature = "input")]
pub use segmask_input as input;
#[cfg(feature = "masks")]
pub use segmask_masks as masks;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn coord_errors_convert() {
        let err: Error = "3".parse::<SpaceCoord>().unwrap_err().into();
        assert!(matches!(err, Error::Coord(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn validation_error_display_interpolates() {
        let err: Error = ValidationError::new("too-large", "value larger than max value {max}")
            .with_param("max", 20)
            .into();
        assert_eq!(err.to_string(), "value larger than max value 20");
    }

    #[cfg(feature = "masks")]
    #[test]
    fn validate_str_reports_each_outcome() {
        let date = date_mask(DateConfig::default());
        assert_eq!(validate_str(&date, "2024-02-29").ok().flatten().as_deref(), Some("2024-02-29"));
        assert!(matches!(validate_str(&date, "2023-02-29"), Err(Error::Validation(_))));
        assert!(matches!(validate_str(&date, "not a date"), Err(Error::ValuesParse(_))));

        let isbn = isbn_mask();
        assert!(matches!(validate_str(&isbn, "978-0-306-40615-8"), Err(Error::Validation(_))));
    }
}
