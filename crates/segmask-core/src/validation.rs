#![forbid(unsafe_code)]

//! Validation outcomes and character-class helpers.
//!
//! Validity is data, not failure: section hooks report syntactic validity as
//! `Option<bool>` and mask hooks report semantic validity as a
//! [`ValidationResult`]. The derived state carries both to the view layer.

use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Error Codes
// ---------------------------------------------------------------------------

/// The value does not form a valid whole (bad date, bad check digit, ...).
pub const ERROR_CODE_INVALID: &str = "invalid";
/// The value is above the configured maximum.
pub const ERROR_CODE_TOO_LARGE: &str = "too_large";
/// The value is below the configured minimum.
pub const ERROR_CODE_TOO_SMALL: &str = "too_small";
/// A check digit does not match the computed one.
pub const ERROR_CODE_CHECK_DIGIT: &str = "check_digit";
/// A part of the value has the wrong shape.
pub const ERROR_CODE_FORMAT: &str = "format";

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A validation failure with a stable code and a display message.
///
/// `params` carries interpolation values; `{key}` in `message` is replaced by
/// [`ValidationError::format_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Stable error code.
    pub code: &'static str,
    /// Message template.
    pub message: String,
    /// Interpolation parameters.
    pub params: BTreeMap<String, String>,
}

impl ValidationError {
    /// Create an error with the given code and message.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add an interpolation parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// The message with `{key}` placeholders substituted.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut result = self.message.clone();
        for (key, value) in &self.params {
            result = result.replace(&format!("{{{key}}}"), value);
        }
        result
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_message())
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// Outcome of a whole-value (semantic) check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    /// The value is valid (or not complete enough to judge).
    #[default]
    Valid,
    /// The value is invalid.
    Invalid(ValidationError),
}

impl ValidationResult {
    /// Shorthand for `Invalid(ValidationError::new(code, message))`.
    #[must_use]
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid(ValidationError::new(code, message))
    }

    /// Returns `true` if the result is `Valid`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns `true` if the result is `Invalid`.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// The error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    /// The formatted error message, or the empty string when valid.
    #[must_use]
    pub fn message(&self) -> String {
        self.error()
            .map(ValidationError::format_message)
            .unwrap_or_default()
    }

    /// Keep the first failure.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Valid => other,
            Self::Invalid(_) => self,
        }
    }
}

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

/// Character classes used by filters and syntactic validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// `0-9`
    Digit,
    /// `0-9a-fA-F`
    HexDigit,
    /// `0-9a-f`
    LowerHexDigit,
    /// `A-Z`
    UpperAlpha,
    /// `A-Za-z`
    Alpha,
    /// `A-Za-z0-9`
    Alphanumeric,
}

impl CharClass {
    /// Whether `ch` belongs to the class.
    #[must_use]
    pub fn contains(self, ch: char) -> bool {
        match self {
            Self::Digit => ch.is_ascii_digit(),
            Self::HexDigit => ch.is_ascii_hexdigit(),
            Self::LowerHexDigit => ch.is_ascii_digit() || ('a'..='f').contains(&ch),
            Self::UpperAlpha => ch.is_ascii_uppercase(),
            Self::Alpha => ch.is_ascii_alphabetic(),
            Self::Alphanumeric => ch.is_ascii_alphanumeric(),
        }
    }

    /// Whether `grapheme` is exactly one character of this class.
    #[must_use]
    pub fn matches_grapheme(self, grapheme: &str) -> bool {
        let mut chars = grapheme.chars();
        matches!((chars.next(), chars.next()), (Some(ch), None) if self.contains(ch))
    }

    /// Whether every character of `text` belongs to the class.
    #[must_use]
    pub fn matches_all(self, text: &str) -> bool {
        text.chars().all(|ch| self.contains(ch))
    }

    /// Whether `text` has `min..=max` characters, all of this class.
    #[must_use]
    pub fn matches_run(self, text: &str, min: usize, max: usize) -> bool {
        let len = text.chars().count();
        (min..=max).contains(&len) && self.matches_all(text)
    }
}
