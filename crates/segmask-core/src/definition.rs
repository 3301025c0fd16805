#![forbid(unsafe_code)]

//! Mask definitions and whole-value hooks.

use std::fmt;
use std::sync::Arc;

use crate::section::{InputSection, Section};
use crate::validation::ValidationResult;
use crate::values::MaskValues;

/// Error returned when a string representation cannot be turned into values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuesParseError {
    /// The mask has no string parser.
    Unsupported,
    /// The input does not have the expected shape.
    Malformed {
        /// The rejected input.
        input: String,
        /// Short reason.
        reason: &'static str,
    },
}

impl ValuesParseError {
    /// Shorthand for [`ValuesParseError::Malformed`].
    #[must_use]
    pub fn malformed(input: &str, reason: &'static str) -> Self {
        Self::Malformed {
            input: input.to_owned(),
            reason,
        }
    }
}

impl fmt::Display for ValuesParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "mask has no string representation parser"),
            Self::Malformed { input, reason } => write!(f, "cannot parse {input:?}: {reason}"),
        }
    }
}

impl std::error::Error for ValuesParseError {}

/// Whole-value rules of a mask.
///
/// Only [`MaskHooks::encode_validated_value`] is required.
pub trait MaskHooks: fmt::Debug + Send + Sync {
    /// The canonical encoded value, or `None` when incomplete or invalid.
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String>;

    /// Semantic status of the whole value; `None` when unchecked.
    fn semantic_validation(&self, _values: &MaskValues) -> Option<ValidationResult> {
        None
    }

    /// Normalized values; `None` when the mask has no normalization.
    fn normalize_values(&self, _values: &MaskValues) -> Option<MaskValues> {
        None
    }

    /// Parse an encoded value back into section values.
    fn values_from_string(&self, _text: &str) -> Result<MaskValues, ValuesParseError> {
        Err(ValuesParseError::Unsupported)
    }
}

/// Hooks that encode the input sections concatenated, with no other rules.
#[derive(Debug, Clone, Default)]
pub struct ConcatValues {
    slugs: Vec<String>,
}

impl ConcatValues {
    /// Encode `slugs` in order.
    pub fn new<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slugs: slugs.into_iter().map(Into::into).collect(),
        }
    }
}

impl MaskHooks for ConcatValues {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        Some(self.slugs.iter().map(|slug| values.joined(slug)).collect())
    }
}

/// An immutable mask: ordered sections plus whole-value hooks.
///
/// Cloning is cheap; hook objects are shared.
#[derive(Debug, Clone)]
pub struct MaskDefinition {
    name: String,
    sections: Vec<Section>,
    hooks: Arc<dyn MaskHooks>,
}

impl MaskDefinition {
    /// Create a definition.
    pub fn new(
        name: impl Into<String>,
        sections: Vec<Section>,
        hooks: impl MaskHooks + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            sections,
            hooks: Arc::new(hooks),
        }
    }

    /// Human-readable mask name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All sections in order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Section at display index `index`.
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Input section at display index `index`.
    #[must_use]
    pub fn input_section(&self, index: usize) -> Option<&InputSection> {
        self.section(index).and_then(Section::as_input)
    }

    /// Input sections in order (their position is the value index).
    pub fn input_sections(&self) -> impl Iterator<Item = &InputSection> {
        self.sections.iter().filter_map(Section::as_input)
    }

    /// Slugs of the input sections in order.
    pub fn input_slugs(&self) -> impl Iterator<Item = &str> {
        self.input_sections().map(|section| section.slug.as_str())
    }

    /// The whole-value hooks.
    #[must_use]
    pub fn hooks(&self) -> &dyn MaskHooks {
        self.hooks.as_ref()
    }

    /// Encoded value for `values`.
    #[must_use]
    pub fn encode(&self, values: &MaskValues) -> Option<String> {
        self.hooks.encode_validated_value(values)
    }

    /// Parse a string representation into values with every slug present.
    pub fn parse_values(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let mut values = self.hooks.values_from_string(text)?;
        values.ensure_slugs(self.input_slugs());
        Ok(values)
    }

    /// Values from an external string model with every slug present.
    pub fn values_from_external<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> MaskValues
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut values = MaskValues::from_strings(entries);
        values.ensure_slugs(self.input_slugs());
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::PlainText;

    fn two_part() -> MaskDefinition {
        MaskDefinition::new(
            "pair",
            vec![
                InputSection::new("a", PlainText).into(),
                Section::fixed("-"),
                InputSection::new("b", PlainText).into(),
            ],
            ConcatValues::new(["a", "b"]),
        )
    }

    #[test]
    fn input_sections_follow_definition_order() {
        let definition = two_part();
        assert_eq!(definition.input_slugs().collect::<Vec<_>>(), ["a", "b"]);
        assert!(definition.input_section(1).is_none());
        assert_eq!(definition.input_section(2).map(|s| s.slug.as_str()), Some("b"));
    }

    #[test]
    fn default_parser_is_unsupported() {
        assert_eq!(two_part().parse_values("x"), Err(ValuesParseError::Unsupported));
    }

    #[test]
    fn external_values_get_every_slug() {
        let values = two_part().values_from_external([("a", "12")]);
        assert_eq!(values.iter().count(), 2);
        assert_eq!(two_part().encode(&values).as_deref(), Some("12"));
    }
}
