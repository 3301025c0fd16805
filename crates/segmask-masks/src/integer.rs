#![forbid(unsafe_code)]

//! Signed integers with optional bounds and thousands grouping.

use segmask_core::logging::trace;
use segmask_core::validation::{ERROR_CODE_INVALID, ERROR_CODE_TOO_LARGE, ERROR_CODE_TOO_SMALL};
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, SpinRequest, ValidationError, ValidationResult, ValuesParseError,
};

use crate::numeric::{canonical_digits, grouped, is_canonical_integer};

const INTEGERS: &str = "integers";

/// Integer mask configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerConfig {
    /// Smallest accepted value.
    pub min: Option<i64>,
    /// Largest accepted value.
    pub max: Option<i64>,
    /// Inserted between groups of three digits.
    pub thousands_separator: Option<String>,
    /// Minimum rendered digits.
    pub min_digits: usize,
    /// Maximum typed characters, sign included.
    pub max_digits: Option<usize>,
    /// Fixed text before the number.
    pub prefix: Option<String>,
    /// Fixed text after the number.
    pub suffix: Option<String>,
}

impl Default for IntegerConfig {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            thousands_separator: None,
            min_digits: 1,
            max_digits: None,
            prefix: None,
            suffix: None,
        }
    }
}

impl IntegerConfig {
    /// Inclusive bounds.
    #[must_use]
    pub fn with_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Thousands grouping separator.
    #[must_use]
    pub fn with_thousands_separator(mut self, separator: impl Into<String>) -> Self {
        self.thousands_separator = Some(separator.into());
        self
    }

    /// Minimum rendered digits, padded with `0`.
    #[must_use]
    pub fn with_min_digits(mut self, min_digits: usize) -> Self {
        self.min_digits = min_digits;
        self
    }

    /// Maximum typed characters.
    #[must_use]
    pub fn with_max_digits(mut self, max_digits: usize) -> Self {
        self.max_digits = Some(max_digits);
        self
    }

    /// Fixed prefix and suffix, e.g. a unit.
    #[must_use]
    pub fn with_affixes(mut self, prefix: Option<&str>, suffix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_owned);
        self.suffix = suffix.map(str::to_owned);
        self
    }

    fn clamp(&self, value: i64) -> i64 {
        match (self.min, self.max) {
            (_, Some(max)) if value > max => max,
            (Some(min), _) if value < min => min,
            _ => value,
        }
    }
}

/// The typed value, reading an empty section as zero.
fn parse_integer(text: &str) -> Option<i64> {
    if text.is_empty() { Some(0) } else { text.parse().ok() }
}

#[derive(Debug, Clone)]
struct IntegerHooks {
    config: IntegerConfig,
}

impl SectionHooks for IntegerHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        grouped(value, self.config.min_digits, self.config.thousands_separator.as_deref())
    }

    fn filter(&self, grapheme: &str) -> bool {
        grapheme == "-" || CharClass::Digit.matches_grapheme(grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(is_canonical_integer(value.strip_prefix('-').unwrap_or(value)))
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        let current = parse_integer(&request.values.joined(INTEGERS)).unwrap_or(0);
        let next = self.config.clamp(current.saturating_add(request.step(1, 10))).to_string();
        if self.config.max_digits.is_some_and(|max| next.len() > max) {
            trace!(value = %next, "integer spin exceeds max digits");
            return None;
        }
        Some(request.values.clone().with_str(INTEGERS, &next))
    }
}

#[derive(Debug, Clone)]
struct IntegerRules {
    config: IntegerConfig,
}

impl MaskHooks for IntegerRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let text = values.joined(INTEGERS);
        Some(if text.is_empty() { "0".to_owned() } else { text })
    }

    /// Unbounded masks carry no semantic check.
    fn semantic_validation(&self, values: &MaskValues) -> Option<ValidationResult> {
        if self.config.min.is_none() && self.config.max.is_none() {
            return None;
        }
        let Some(value) = parse_integer(&values.joined(INTEGERS)) else {
            return Some(ValidationResult::invalid(ERROR_CODE_INVALID, "invalid integer"));
        };
        if let Some(max) = self.config.max.filter(|max| value > *max) {
            return Some(ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_LARGE, "value larger than max value {max}")
                    .with_param("max", max),
            ));
        }
        if let Some(min) = self.config.min.filter(|min| value < *min) {
            return Some(ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_SMALL, "value smaller than min value {min}")
                    .with_param("min", min),
            ));
        }
        Some(ValidationResult::Valid)
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let text = text.trim();
        let (sign, digits) = match text.strip_prefix('-') {
            Some(digits) => ("-", digits),
            None => ("", text),
        };
        if digits.is_empty() || !CharClass::Digit.matches_all(digits) {
            trace!(input = text, "not an integer");
            return Err(ValuesParseError::malformed(text, "expected an optionally signed integer"));
        }
        let digits = canonical_digits(digits);
        let sign = if digits == "0" { "" } else { sign };
        Ok(MaskValues::from_strings([(INTEGERS, format!("{sign}{digits}"))]))
    }
}

/// Build an integer mask.
#[must_use]
pub fn integer_mask(config: IntegerConfig) -> MaskDefinition {
    let mut section = InputSection::new(
        INTEGERS,
        IntegerHooks {
            config: config.clone(),
        },
    )
    .with_alignment(Alignment::Right);
    if let Some(max) = config.max_digits {
        section = section.with_max_length(max);
    }

    let mut sections: Vec<Section> = Vec::with_capacity(3);
    if let Some(prefix) = &config.prefix {
        sections.push(Section::fixed(prefix.clone()));
    }
    sections.push(section.into());
    if let Some(suffix) = &config.suffix {
        sections.push(Section::fixed(suffix.clone()));
    }
    MaskDefinition::new("integer", sections, IntegerRules { config })
}
