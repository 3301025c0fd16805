#![forbid(unsafe_code)]

//! A single four-digit year, encoded as the first day of that year.

use std::sync::Arc;

use chrono::{Datelike, Local};
use segmask_core::logging::trace;
use segmask_core::validation::{ERROR_CODE_INVALID, ERROR_CODE_TOO_LARGE, ERROR_CODE_TOO_SMALL};
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues,
    SectionHooks, SpinRequest, ValidationError, ValidationResult, ValuesParseError,
};

use crate::common::{Padding, accepts, normalize_short_year, parse_decimal, placeholder_or_padded};

/// Year mask configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearConfig {
    /// Smallest valid year.
    pub min: i32,
    /// Largest valid year.
    pub max: i32,
    /// Year used when spinning an empty value; the local year when `None`.
    pub today: Option<i32>,
}

impl Default for YearConfig {
    fn default() -> Self {
        Self {
            min: 1900,
            max: 2100,
            today: None,
        }
    }
}

impl YearConfig {
    /// Set the valid range.
    #[must_use]
    pub fn with_range(mut self, min: i32, max: i32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Pin the year used for spinning an empty value.
    #[must_use]
    pub fn with_today(mut self, year: i32) -> Self {
        self.today = Some(year);
        self
    }

    fn today(&self) -> i32 {
        self.today.unwrap_or_else(|| Local::now().year())
    }
}

#[derive(Debug)]
struct YearHooks {
    config: Arc<YearConfig>,
}

impl SectionHooks for YearHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        placeholder_or_padded(value, "YYYY", 4, "0", Padding::Leading)
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::Digit, grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(CharClass::Digit.matches_run(value, 0, 4))
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        let today = self.config.today();
        let next = match parse_decimal(request.values, request.slug) {
            None => i64::from(today),
            Some(year) => (year + request.step(1, 10))
                .clamp(i64::from(self.config.min), i64::from(self.config.max.max(self.config.min))),
        };
        Some(request.values.clone().with_str(request.slug, &next.to_string()))
    }
}

#[derive(Debug)]
struct YearRules {
    config: Arc<YearConfig>,
}

impl MaskHooks for YearRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let year = values.joined("year");
        (!year.is_empty()).then(|| format!("{year}-01-01"))
    }

    fn semantic_validation(&self, values: &MaskValues) -> Option<ValidationResult> {
        if values.is_empty_at("year") {
            return Some(ValidationResult::Valid);
        }
        let Some(year) = parse_decimal(values, "year") else {
            return Some(ValidationResult::invalid(ERROR_CODE_INVALID, "invalid year"));
        };

        let result = if year > i64::from(self.config.max) {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_LARGE, "year larger than max {max}")
                    .with_param("max", self.config.max),
            )
        } else if year < i64::from(self.config.min) {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_SMALL, "year smaller than min {min}")
                    .with_param("min", self.config.min),
            )
        } else {
            ValidationResult::Valid
        };
        Some(result)
    }

    fn normalize_values(&self, values: &MaskValues) -> Option<MaskValues> {
        normalize_short_year(values, "year")
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let text = text.trim();
        let year = text.strip_suffix("-01-01").unwrap_or(text);
        if !CharClass::Digit.matches_run(year, 1, 4) {
            trace!(input = text, "year string rejected");
            return Err(ValuesParseError::malformed(text, "expected YYYY or YYYY-01-01"));
        }
        Ok(MaskValues::from_strings([("year", year)]))
    }
}

/// Build a year mask.
#[must_use]
pub fn year_mask(config: YearConfig) -> MaskDefinition {
    let config = Arc::new(config);
    let section = InputSection::new(
        "year",
        YearHooks {
            config: Arc::clone(&config),
        },
    )
    .with_alignment(Alignment::Right)
    .with_max_length(4);

    MaskDefinition::new("year", vec![section.into()], YearRules { config })
}
