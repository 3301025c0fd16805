#![forbid(unsafe_code)]

//! Year and month, encoded as `YYYY-MM`.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Local};
use segmask_core::logging::trace;
use segmask_core::validation::{ERROR_CODE_INVALID, ERROR_CODE_TOO_LARGE, ERROR_CODE_TOO_SMALL};
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, SpinDirection, SpinRequest, ValidationError, ValidationResult, ValuesParseError,
};

use crate::common::{Padding, accepts, normalize_short_year, parse_decimal, placeholder_or_padded, zero_padded};
use crate::date::{DateStyle, SEPARATOR_SKIP_KEYS};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    /// Year.
    pub year: i32,
    /// Month, `1..=12`.
    pub month: u32,
}

impl YearMonth {
    /// Create a year-month; `None` if the month is out of range.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_ordinal(ordinal: i64) -> Option<Self> {
        let year = i32::try_from(ordinal.div_euclid(12)).ok()?;
        let month = u32::try_from(ordinal.rem_euclid(12) + 1).ok()?;
        Some(Self { year, month })
    }

    fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Year/month mask configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonthConfig {
    /// Section order; day-first styles put the month first.
    pub style: DateStyle,
    /// Earliest valid month.
    pub min: YearMonth,
    /// Latest valid month.
    pub max: YearMonth,
    /// Month used when spinning an empty value; the local month when `None`.
    pub today: Option<YearMonth>,
}

impl Default for YearMonthConfig {
    fn default() -> Self {
        Self {
            style: DateStyle::Iso,
            min: YearMonth { year: 1900, month: 1 },
            max: YearMonth { year: 2100, month: 12 },
            today: None,
        }
    }
}

impl YearMonthConfig {
    /// Set the style.
    #[must_use]
    pub fn with_style(mut self, style: DateStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the valid range.
    #[must_use]
    pub fn with_range(mut self, min: YearMonth, max: YearMonth) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Pin the month used for spinning an empty value.
    #[must_use]
    pub fn with_today(mut self, today: YearMonth) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> YearMonth {
        self.today.unwrap_or_else(YearMonth::current)
    }

    fn clamp(&self, value: YearMonth) -> YearMonth {
        value.clamp(self.min, self.max.max(self.min))
    }
}

fn write(values: &MaskValues, value: YearMonth) -> MaskValues {
    values
        .clone()
        .with_str("year", &zero_padded(i64::from(value.year), 4))
        .with_str("month", &zero_padded(i64::from(value.month), 2))
}

#[derive(Debug)]
struct PartHooks {
    slug: &'static str,
    config: Arc<YearMonthConfig>,
}

impl PartHooks {
    fn width(&self) -> usize {
        if self.slug == "year" { 4 } else { 2 }
    }

    /// Missing parts are taken from today going up and from the maximum going down.
    fn starting_point(&self, values: &MaskValues, direction: SpinDirection) -> Option<YearMonth> {
        let anchor = match direction {
            SpinDirection::Up => self.config.today(),
            SpinDirection::Down => self.config.max,
        };
        let year = match parse_decimal(values, "year") {
            Some(year) => i32::try_from(year).ok()?,
            None => anchor.year,
        };
        let month = match parse_decimal(values, "month") {
            Some(month) => u32::try_from(month).ok()?,
            None if year == anchor.year => anchor.month,
            None if direction == SpinDirection::Up => 1,
            None => 12,
        };
        YearMonth::new(year, month)
    }
}

impl SectionHooks for PartHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        let placeholder = if self.slug == "year" { "YYYY" } else { "MM" };
        placeholder_or_padded(value, placeholder, self.width(), "0", Padding::Leading)
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::Digit, grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(CharClass::Digit.matches_run(value, 0, self.width()))
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        let values = request.values;
        let amount = request.step(1, 10);

        if request.alt() {
            let current = parse_decimal(values, self.slug);
            let next = match (self.slug, current) {
                ("year", None) => i64::from(self.config.today().year),
                ("year", Some(year)) => (year + amount).clamp(0, 9999),
                (_, month) => (month.unwrap_or(0) - 1 + amount).rem_euclid(12) + 1,
            };
            return Some(values.clone().with_str(self.slug, &zero_padded(next, self.width())));
        }

        if values.is_empty_at("year") && values.is_empty_at("month") {
            return Some(write(values, self.config.clamp(self.config.today())));
        }

        let Some(start) = self.starting_point(values, request.direction) else {
            trace!(slug = self.slug, "year/month spin from an invalid month");
            return None;
        };
        let months = if self.slug == "year" { amount * 12 } else { amount };
        let next = YearMonth::from_ordinal(start.ordinal() + months)?;
        Some(write(values, self.config.clamp(next)))
    }
}

#[derive(Debug)]
struct YearMonthRules {
    config: Arc<YearMonthConfig>,
}

impl MaskHooks for YearMonthRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let year = values.joined("year");
        let month = values.joined("month");
        if year.is_empty() || month.is_empty() {
            return None;
        }
        Some(format!("{year}-{month:0>2}"))
    }

    fn semantic_validation(&self, values: &MaskValues) -> Option<ValidationResult> {
        if values.is_empty_at("year") || values.is_empty_at("month") {
            return Some(ValidationResult::Valid);
        }
        let value = parse_decimal(values, "year")
            .zip(parse_decimal(values, "month"))
            .and_then(|(year, month)| YearMonth::new(i32::try_from(year).ok()?, u32::try_from(month).ok()?));
        let Some(value) = value else {
            return Some(ValidationResult::invalid(ERROR_CODE_INVALID, "invalid year/month"));
        };

        let result = if value > self.config.max {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_LARGE, "year/month larger than max {max}")
                    .with_param("max", self.config.max),
            )
        } else if value < self.config.min {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_SMALL, "year/month smaller than min {min}")
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
        let Some((year, month)) = text.split_once('-') else {
            trace!(input = text, "year/month string has no separator");
            return Err(ValuesParseError::malformed(text, "expected YYYY-MM"));
        };
        if !CharClass::Digit.matches_run(year, 1, 4) || !CharClass::Digit.matches_run(month, 1, 2) {
            trace!(input = text, "year/month string rejected");
            return Err(ValuesParseError::malformed(text, "expected YYYY-MM"));
        }
        Ok(MaskValues::from_strings([("year", year), ("month", month)]))
    }
}

/// Build a year/month mask.
#[must_use]
pub fn year_month_mask(config: YearMonthConfig) -> MaskDefinition {
    let config = Arc::new(config);
    let part = |slug: &'static str| -> Section {
        let width = if slug == "year" { 4 } else { 2 };
        InputSection::new(
            slug,
            PartHooks {
                slug,
                config: Arc::clone(&config),
            },
        )
        .with_alignment(Alignment::Right)
        .with_max_length(width)
        .into()
    };
    let separator = |text: &str| Section::fixed_with_skip_keys(text, SEPARATOR_SKIP_KEYS);

    let sections = match config.style {
        DateStyle::Iso => vec![part("year"), separator("-"), part("month")],
        DateStyle::En | DateStyle::Us => vec![part("month"), separator("/"), part("year")],
        DateStyle::De => vec![part("month"), separator("."), part("year")],
        DateStyle::Jp => vec![part("year"), separator("年"), part("month"), Section::fixed("月")],
        DateStyle::Kr => vec![part("year"), separator("년"), part("month"), Section::fixed("월")],
    };

    MaskDefinition::new(
        "year-month",
        sections,
        YearMonthRules {
            config: Arc::clone(&config),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmask_core::{MaskState, PatchOperation, SpaceCoord, SpinModifiers, apply_patch_operations, derive_state};

    fn definition() -> MaskDefinition {
        year_month_mask(YearMonthConfig::default().with_today(YearMonth { year: 2024, month: 5 }))
    }

    fn spin(year: &str, month: &str, value_index: usize, direction: SpinDirection, modifiers: SpinModifiers) -> Option<String> {
        let definition = definition();
        let state = MaskState::from_strings([("year", year), ("month", month)])
            .with_caret(SpaceCoord::new(value_index, 0), None);
        let outcome = apply_patch_operations(
            &[PatchOperation::Spin { direction, modifiers }],
            &state,
            &definition,
            None,
        );
        outcome.derived.validated_value
    }

    #[test]
    fn spin_empty_uses_today() {
        assert_eq!(spin("", "", 1, SpinDirection::Up, SpinModifiers::NONE), Some("2024-05".to_owned()));
    }

    #[test]
    fn month_spin_crosses_year() {
        assert_eq!(spin("2024", "12", 1, SpinDirection::Up, SpinModifiers::NONE), Some("2025-01".to_owned()));
        assert_eq!(spin("2024", "01", 1, SpinDirection::Down, SpinModifiers::NONE), Some("2023-12".to_owned()));
    }

    #[test]
    fn alt_month_spin_wraps_in_place() {
        assert_eq!(spin("2024", "12", 1, SpinDirection::Up, SpinModifiers::ALT), Some("2024-01".to_owned()));
    }

    #[test]
    fn year_spin_clamps_to_max() {
        assert_eq!(spin("2095", "06", 0, SpinDirection::Up, SpinModifiers::SHIFT), Some("2100-12".to_owned()));
    }

    #[test]
    fn missing_month_going_down_starts_from_december() {
        assert_eq!(spin("2000", "", 0, SpinDirection::Down, SpinModifiers::NONE), Some("1999-12".to_owned()));
    }

    #[test]
    fn separators_accept_common_skip_keys() {
        let definition = year_month_mask(YearMonthConfig::default().with_style(DateStyle::De));
        let state = MaskState::from_strings([("month", "3"), ("year", "")]).with_caret(SpaceCoord::new(0, 1), None);
        let outcome = apply_patch_operations(&[PatchOperation::insert("/")], &state, &definition, None);
        assert_eq!(outcome.state.caret, SpaceCoord::new(1, 0));
        assert_eq!(outcome.state.values.joined("month"), "3");
    }

    #[test]
    fn messages() {
        let definition = definition();
        let message = |year: &str, month: &str| {
            derive_state(&MaskState::from_strings([("year", year), ("month", month)]), &definition).semantic_message()
        };
        assert_eq!(message("2024", "13"), "invalid year/month");
        assert_eq!(message("2101", "01"), "year/month larger than max 2100-12");
        assert_eq!(message("1899", "12"), "year/month smaller than min 1900-01");
        assert_eq!(message("2024", ""), "");
    }

    #[test]
    fn parse_and_encode() {
        let definition = definition();
        let values = definition.parse_values("1999-7").expect("valid");
        assert_eq!(definition.encode(&values), Some("1999-07".to_owned()));
        assert!(definition.parse_values("1999").is_err());
    }
}
