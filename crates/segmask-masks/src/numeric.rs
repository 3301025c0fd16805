#![forbid(unsafe_code)]

//! Decimal numbers with an integer part, a decimal part, and optional
//! thousands grouping, prefix, and suffix.

use segmask_core::logging::trace;
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, ValuesParseError, split_graphemes,
};

use crate::common::{Padding, accepts, padded};

const INTEGERS: &str = "integers";
const DECIMALS: &str = "decimals";

/// Numeric mask configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericConfig {
    /// Minimum rendered integer digits (at least one).
    pub integer_digits: usize,
    /// Maximum typed integer digits.
    pub max_integer_digits: Option<usize>,
    /// Minimum rendered decimal digits.
    pub decimal_digits: usize,
    /// Maximum typed decimal digits.
    pub max_decimal_digits: Option<usize>,
    /// Inserted between groups of three integer digits.
    pub thousands_separator: Option<String>,
    /// Fixed text between the integer and decimal parts.
    pub decimal_separator: String,
    /// Fixed text before the number.
    pub prefix: Option<String>,
    /// Fixed text after the number.
    pub suffix: Option<String>,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            integer_digits: 1,
            max_integer_digits: None,
            decimal_digits: 1,
            max_decimal_digits: None,
            thousands_separator: None,
            decimal_separator: ".".to_owned(),
            prefix: None,
            suffix: None,
        }
    }
}

impl NumericConfig {
    /// Minimum integer and decimal digits.
    #[must_use]
    pub fn with_digits(mut self, integer_digits: usize, decimal_digits: usize) -> Self {
        self.integer_digits = integer_digits.max(1);
        self.decimal_digits = decimal_digits;
        self
    }

    /// Maximum typed integer and decimal digits.
    #[must_use]
    pub fn with_max_digits(mut self, integer_digits: usize, decimal_digits: usize) -> Self {
        self.max_integer_digits = Some(integer_digits);
        self.max_decimal_digits = Some(decimal_digits);
        self
    }

    /// Thousands grouping separator.
    #[must_use]
    pub fn with_thousands_separator(mut self, separator: impl Into<String>) -> Self {
        self.thousands_separator = Some(separator.into());
        self
    }

    /// Decimal separator.
    #[must_use]
    pub fn with_decimal_separator(mut self, separator: impl Into<String>) -> Self {
        self.decimal_separator = separator.into();
        self
    }

    /// Fixed prefix and suffix, e.g. a currency.
    #[must_use]
    pub fn with_affixes(mut self, prefix: Option<&str>, suffix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_owned);
        self.suffix = suffix.map(str::to_owned);
        self
    }
}

/// Right-aligned digits padded to `min_digits`, with `separator` after every
/// digit that has a multiple of three digits to its right. A leading `-` is
/// never followed by a separator.
pub(crate) fn grouped(value: &[String], min_digits: usize, separator: Option<&str>) -> Vec<MaskChar> {
    let mut chars = padded(&[], min_digits.saturating_sub(value.len()), "0", Padding::Leading);
    let separator = separator.filter(|s| !s.is_empty()).map(split_graphemes);
    for (i, ch) in value.iter().enumerate() {
        chars.push(MaskChar::value(ch));
        let from_right = value.len() - i - 1;
        match &separator {
            Some(separator) if from_right > 0 && from_right % 3 == 0 && ch != "-" => {
                chars.extend(separator.iter().map(MaskChar::mask));
            }
            _ => {}
        }
    }
    chars
}

/// Strip leading zeros, keeping a single `0`.
pub(crate) fn canonical_digits(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() && !digits.is_empty() { "0" } else { trimmed }
}

/// `""`, a single digit, or digits without a leading zero.
pub(crate) fn is_canonical_integer(text: &str) -> bool {
    CharClass::Digit.matches_all(text) && (text.len() <= 1 || !text.starts_with('0'))
}

#[derive(Debug, Clone)]
struct IntegerPartHooks {
    min_digits: usize,
    separator: Option<String>,
}

impl SectionHooks for IntegerPartHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        grouped(value, self.min_digits, self.separator.as_deref())
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::Digit, grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(is_canonical_integer(value))
    }
}

#[derive(Debug, Clone, Copy)]
struct DecimalPartHooks {
    min_digits: usize,
}

impl SectionHooks for DecimalPartHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        padded(value, self.min_digits, "0", Padding::Trailing)
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::Digit, grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(CharClass::Digit.matches_all(value))
    }
}

#[derive(Debug, Clone)]
struct NumericRules {
    decimal_separator: String,
}

impl MaskHooks for NumericRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let or_zero = |slug: &str| {
            let text = values.joined(slug);
            if text.is_empty() { "0".to_owned() } else { text }
        };
        Some(format!("{}.{}", or_zero(INTEGERS), or_zero(DECIMALS)))
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let text = text.trim();
        let (integers, decimals) = text
            .split_once('.')
            .or_else(|| text.split_once(self.decimal_separator.as_str()))
            .unwrap_or((text, ""));
        if (integers.is_empty() && decimals.is_empty())
            || !CharClass::Digit.matches_all(integers)
            || !CharClass::Digit.matches_all(decimals)
        {
            trace!(input = text, "not a decimal number");
            return Err(ValuesParseError::malformed(text, "expected digits with an optional decimal part"));
        }
        Ok(MaskValues::from_strings([
            (INTEGERS, canonical_digits(integers)),
            (DECIMALS, decimals),
        ]))
    }
}

/// Build a decimal number mask.
#[must_use]
pub fn numeric_mask(config: NumericConfig) -> MaskDefinition {
    let mut sections: Vec<Section> = Vec::with_capacity(5);
    if let Some(prefix) = &config.prefix {
        sections.push(Section::fixed(prefix.clone()));
    }

    let mut integers = InputSection::new(
        INTEGERS,
        IntegerPartHooks {
            min_digits: config.integer_digits.max(1),
            separator: config.thousands_separator.clone(),
        },
    )
    .with_alignment(Alignment::Right);
    if let Some(max) = config.max_integer_digits {
        integers = integers.with_max_length(max);
    }
    sections.push(integers.into());

    let separator = &config.decimal_separator;
    sections.push(if split_graphemes(separator).len() == 1 {
        Section::fixed_with_skip_keys(separator.clone(), [separator.clone()])
    } else {
        Section::fixed(separator.clone())
    });

    let mut decimals = InputSection::new(
        DECIMALS,
        DecimalPartHooks {
            min_digits: config.decimal_digits,
        },
    );
    if let Some(max) = config.max_decimal_digits {
        decimals = decimals.with_max_length(max);
    }
    sections.push(decimals.into());

    if let Some(suffix) = &config.suffix {
        sections.push(Section::fixed(suffix.clone()));
    }

    MaskDefinition::new(
        "numeric",
        sections,
        NumericRules {
            decimal_separator: config.decimal_separator,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmask_core::{MaskState, PatchOperation, SpaceCoord, apply_patch_operations, derive_state};

    fn display(config: &NumericConfig, integers: &str, decimals: &str) -> String {
        derive_state(
            &MaskState::from_strings([(INTEGERS, integers), (DECIMALS, decimals)]),
            &numeric_mask(config.clone()),
        )
        .display_text
    }

    #[test]
    fn renders_padding_and_grouping() {
        let plain = NumericConfig::default();
        assert_eq!(display(&plain, "", ""), "0.0");
        assert_eq!(display(&plain, "1234567", "5"), "1234567.5");

        let grouped = NumericConfig::default()
            .with_thousands_separator(",")
            .with_digits(1, 2);
        assert_eq!(display(&grouped, "1234567", "5"), "1,234,567.50");
        assert_eq!(display(&grouped, "123", ""), "123.00");

        let currency = NumericConfig::default()
            .with_decimal_separator(",")
            .with_thousands_separator(".")
            .with_affixes(None, Some(" €"));
        assert_eq!(display(&currency, "1000", "25"), "1.000,25 €");
    }

    #[test]
    fn canonical_integers() {
        assert!(is_canonical_integer(""));
        assert!(is_canonical_integer("0"));
        assert!(is_canonical_integer("120"));
        assert!(!is_canonical_integer("012"));
        assert!(!is_canonical_integer("1a"));
        assert_eq!(canonical_digits("007"), "7");
        assert_eq!(canonical_digits("000"), "0");
    }

    #[test]
    fn separator_key_jumps_to_decimals() {
        let definition = numeric_mask(NumericConfig::default());
        let ops = [
            PatchOperation::insert("4"),
            PatchOperation::insert("2"),
            PatchOperation::insert("."),
            PatchOperation::insert("5"),
        ];
        let outcome = apply_patch_operations(&ops, &MaskState::initial(MaskValues::new()), &definition, None);
        assert_eq!(outcome.state.values.joined(INTEGERS), "42");
        assert_eq!(outcome.state.values.joined(DECIMALS), "5");
        assert_eq!(outcome.state.caret, SpaceCoord::new(1, 1));
        assert_eq!(outcome.derived.validated_value.as_deref(), Some("42.5"));
    }

    #[test]
    fn leading_zero_is_syntactically_invalid() {
        let derived = derive_state(
            &MaskState::from_strings([(INTEGERS, "05")]),
            &numeric_mask(NumericConfig::default()),
        );
        assert_eq!(derived.syntactic_validation.get(INTEGERS), Some(&Some(false)));
    }

    #[test]
    fn parse_and_encode() {
        let definition = numeric_mask(NumericConfig::default().with_decimal_separator(","));
        let values = definition.parse_values("0012,50").expect("decimal");
        assert_eq!(values.joined(INTEGERS), "12");
        assert_eq!(definition.encode(&values).as_deref(), Some("12.50"));
        assert_eq!(
            definition.parse_values("7").ok().and_then(|v| definition.encode(&v)).as_deref(),
            Some("7.0")
        );
        assert!(definition.parse_values("1.2.3").is_err());
        assert!(definition.parse_values("").is_err());
    }
}
