#![forbid(unsafe_code)]

//! Calendar dates: year, month, and day sections in a regional order.
//!
//! The encoded value is ISO `YYYY-MM-DD`. Incomplete dates are valid but have
//! no encoded value. Spinning moves through the calendar (clamped to the
//! configured range); with alt held only the section under the caret moves.

use std::sync::Arc;

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use segmask_core::logging::trace;
use segmask_core::validation::{ERROR_CODE_INVALID, ERROR_CODE_TOO_LARGE, ERROR_CODE_TOO_SMALL};
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, SpinRequest, ValidationError, ValidationResult, ValuesParseError,
};

use crate::common::{Padding, accepts, normalize_short_year, parse_decimal, placeholder_or_padded, zero_padded};

/// Keys that jump over any date separator.
pub const SEPARATOR_SKIP_KEYS: [&str; 4] = ["/", ".", "-", " "];

/// Section order and separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// `YYYY-MM-DD`
    #[default]
    Iso,
    /// `DD.MM.YYYY`
    De,
    /// `DD/MM/YYYY`
    En,
    /// `MM/DD/YYYY`
    Us,
    /// `YYYY年MM月DD日`
    Jp,
    /// `YYYY년MM월DD일`
    Kr,
}

/// Date mask configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateConfig {
    /// Section order.
    pub style: DateStyle,
    /// Earliest valid date.
    pub min: NaiveDate,
    /// Latest valid date.
    pub max: NaiveDate,
    /// Date used when spinning an empty value; the local date when `None`.
    pub today: Option<NaiveDate>,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            style: DateStyle::Iso,
            min: ymd(1900, 1, 1),
            max: ymd(2100, 12, 31),
            today: None,
        }
    }
}

impl DateConfig {
    /// Set the style.
    #[must_use]
    pub fn with_style(mut self, style: DateStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the valid range.
    #[must_use]
    pub fn with_range(mut self, min: NaiveDate, max: NaiveDate) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Pin the date used for spinning an empty value.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.min, self.max.max(self.min))
    }
}

pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePart {
    Year,
    Month,
    Day,
}

impl DatePart {
    const fn slug(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
        }
    }

    const fn width(self) -> usize {
        match self {
            Self::Year => 4,
            Self::Month | Self::Day => 2,
        }
    }

    const fn placeholder(self) -> &'static str {
        match self {
            Self::Year => "YYYY",
            Self::Month => "MM",
            Self::Day => "DD",
        }
    }
}

/// The three parts as numbers, if present.
#[derive(Debug, Clone, Copy)]
struct Fields {
    year: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
}

impl Fields {
    fn read(values: &MaskValues) -> Self {
        Self {
            year: parse_decimal(values, "year"),
            month: parse_decimal(values, "month"),
            day: parse_decimal(values, "day"),
        }
    }

    fn date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::try_from(self.year?).ok()?,
            u32::try_from(self.month?).ok()?,
            u32::try_from(self.day?).ok()?,
        )
    }
}

fn write_date(values: &MaskValues, date: NaiveDate) -> MaskValues {
    values
        .clone()
        .with_str("year", &zero_padded(i64::from(date.year()), 4))
        .with_str("month", &zero_padded(i64::from(date.month()), 2))
        .with_str("day", &zero_padded(i64::from(date.day()), 2))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = ymd(year, month, 1);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

fn shift_date(date: NaiveDate, part: DatePart, amount: i64) -> Option<NaiveDate> {
    let magnitude = u32::try_from(amount.unsigned_abs()).ok()?;
    match part {
        DatePart::Year | DatePart::Month => {
            let months = if part == DatePart::Year {
                magnitude.checked_mul(12)?
            } else {
                magnitude
            };
            if amount >= 0 {
                date.checked_add_months(Months::new(months))
            } else {
                date.checked_sub_months(Months::new(months))
            }
        }
        DatePart::Day => {
            let days = Days::new(u64::from(magnitude));
            if amount >= 0 {
                date.checked_add_days(days)
            } else {
                date.checked_sub_days(days)
            }
        }
    }
}

/// Section-local spin: the part wraps inside its own range.
fn spin_part(values: &MaskValues, fields: Fields, part: DatePart, amount: i64, today: NaiveDate) -> MaskValues {
    let next = match part {
        DatePart::Year => {
            let year = fields.year.unwrap_or_else(|| i64::from(today.year()));
            (year + amount).clamp(0, 9999)
        }
        DatePart::Month => {
            let month = fields.month.unwrap_or(0);
            (month - 1 + amount).rem_euclid(12) + 1
        }
        DatePart::Day => {
            let limit = match (fields.year, fields.month) {
                (Some(year), Some(month @ 1..=12)) => i32::try_from(year)
                    .ok()
                    .zip(u32::try_from(month).ok())
                    .map_or(31, |(y, m)| days_in_month(y, m)),
                _ => 31,
            };
            let day = fields.day.unwrap_or(0);
            (day - 1 + amount).rem_euclid(i64::from(limit)) + 1
        }
    };
    values.clone().with_str(part.slug(), &zero_padded(next, part.width()))
}

#[derive(Debug)]
struct DatePartHooks {
    part: DatePart,
    config: Arc<DateConfig>,
}

impl SectionHooks for DatePartHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        placeholder_or_padded(
            value,
            self.part.placeholder(),
            self.part.width(),
            "0",
            Padding::Leading,
        )
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::Digit, grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(CharClass::Digit.matches_run(value, 0, self.part.width()))
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        let fields = Fields::read(request.values);
        let today = self.config.today();

        if ["year", "month", "day"]
            .iter()
            .all(|slug| request.values.is_empty_at(slug))
        {
            return Some(write_date(request.values, self.config.clamp(today)));
        }

        let amount = request.step(1, 10);
        if !request.alt() {
            if let Some(date) = fields.date() {
                let Some(next) = shift_date(date, self.part, amount) else {
                    trace!(part = self.part.slug(), "date spin out of calendar range");
                    return Some(write_date(request.values, self.config.clamp(date)));
                };
                return Some(write_date(request.values, self.config.clamp(next)));
            }
        }

        Some(spin_part(request.values, fields, self.part, amount, today))
    }
}

/// Whole-date rules.
#[derive(Debug)]
struct DateRules {
    config: Arc<DateConfig>,
}

impl MaskHooks for DateRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let year = values.joined("year");
        let month = values.joined("month");
        let day = values.joined("day");
        if year.is_empty() || month.is_empty() || day.is_empty() {
            return None;
        }
        Some(format!("{year}-{month:0>2}-{day:0>2}"))
    }

    fn semantic_validation(&self, values: &MaskValues) -> Option<ValidationResult> {
        if ["year", "month", "day"].iter().any(|slug| values.is_empty_at(slug)) {
            return Some(ValidationResult::Valid);
        }

        let Some(date) = Fields::read(values).date() else {
            return Some(ValidationResult::invalid(ERROR_CODE_INVALID, "invalid date"));
        };

        let result = if date > self.config.max {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_LARGE, "date larger than max date {max}")
                    .with_param("max", self.config.max),
            )
        } else if date < self.config.min {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_TOO_SMALL, "date smaller than min date {min}")
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
        let parts: Vec<&str> = text.trim().split('-').collect();
        let [year, month, day] = parts.as_slice() else {
            trace!(input = text, "date string is not year-month-day");
            return Err(ValuesParseError::malformed(text, "expected YYYY-MM-DD"));
        };
        let shaped = CharClass::Digit.matches_run(year, 1, 4)
            && CharClass::Digit.matches_run(month, 1, 2)
            && CharClass::Digit.matches_run(day, 1, 2);
        if !shaped {
            trace!(input = text, "date string has non-digit or oversized parts");
            return Err(ValuesParseError::malformed(text, "expected YYYY-MM-DD"));
        }
        Ok(MaskValues::from_strings([
            ("year", *year),
            ("month", *month),
            ("day", *day),
        ]))
    }
}

fn separator(text: &str) -> Section {
    Section::fixed_with_skip_keys(text, SEPARATOR_SKIP_KEYS)
}

fn part_section(part: DatePart, config: &Arc<DateConfig>) -> Section {
    InputSection::new(
        part.slug(),
        DatePartHooks {
            part,
            config: Arc::clone(config),
        },
    )
    .with_alignment(Alignment::Right)
    .with_max_length(part.width())
    .into()
}

/// Build a date mask.
#[must_use]
pub fn date_mask(config: DateConfig) -> MaskDefinition {
    let config = Arc::new(config);
    let year = || part_section(DatePart::Year, &config);
    let month = || part_section(DatePart::Month, &config);
    let day = || part_section(DatePart::Day, &config);

    let sections = match config.style {
        DateStyle::Iso => vec![year(), separator("-"), month(), separator("-"), day()],
        DateStyle::De => vec![day(), separator("."), month(), separator("."), year()],
        DateStyle::En => vec![day(), separator("/"), month(), separator("/"), year()],
        DateStyle::Us => vec![month(), separator("/"), day(), separator("/"), year()],
        DateStyle::Jp => vec![
            year(),
            separator("年"),
            month(),
            separator("月"),
            day(),
            Section::fixed("日"),
        ],
        DateStyle::Kr => vec![
            year(),
            separator("년"),
            month(),
            separator("월"),
            day(),
            Section::fixed("일"),
        ],
    };

    MaskDefinition::new(
        "date",
        sections,
        DateRules {
            config: Arc::clone(&config),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmask_core::{
        MaskState, PatchOperation, SpaceCoord, SpinDirection, SpinModifiers, apply_patch_operations,
        derive_state,
    };

    fn config() -> DateConfig {
        DateConfig::default().with_today(ymd(2024, 6, 15))
    }

    fn state(year: &str, month: &str, day: &str) -> MaskState {
        MaskState::from_strings([("year", year), ("month", month), ("day", day)])
    }

    fn spin_at(definition: &MaskDefinition, state: &MaskState, section: usize, modifiers: SpinModifiers, up: bool) -> MaskValues {
        let state = state.with_caret(SpaceCoord::new(section, 0), None);
        let outcome = apply_patch_operations(
            &[PatchOperation::Spin {
                direction: if up { SpinDirection::Up } else { SpinDirection::Down },
                modifiers,
            }],
            &state,
            definition,
            None,
        );
        outcome.state.values
    }

    #[test]
    fn styles_order_sections() {
        let us = date_mask(config().with_style(DateStyle::Us));
        let slugs: Vec<&str> = us.input_slugs().collect();
        assert_eq!(slugs, ["month", "day", "year"]);

        let jp = date_mask(config().with_style(DateStyle::Jp));
        assert_eq!(jp.sections().len(), 6);
        let derived = derive_state(&state("2024", "1", "2"), &jp);
        assert_eq!(derived.display_text, "2024年01月02日");
    }

    #[test]
    fn empty_sections_show_placeholders() {
        let definition = date_mask(config());
        let derived = derive_state(&state("", "", ""), &definition);
        assert_eq!(derived.display_text, "YYYY-MM-DD");
        assert_eq!(derived.validated_value, None);
    }

    #[test]
    fn encode_pads_month_and_day() {
        let definition = date_mask(config());
        assert_eq!(
            definition.encode(&MaskValues::from_strings([("year", "2024"), ("month", "3"), ("day", "7")])),
            Some("2024-03-07".to_owned())
        );
    }

    #[test]
    fn semantic_messages() {
        let definition = date_mask(config());
        let check = |y: &str, m: &str, d: &str| derive_state(&state(y, m, d), &definition).semantic_message();
        assert_eq!(check("2023", "02", "29"), "invalid date");
        assert_eq!(check("2024", "02", "29"), "");
        assert_eq!(check("2101", "01", "01"), "date larger than max date 2100-12-31");
        assert_eq!(check("1899", "12", "31"), "date smaller than min date 1900-01-01");
        assert_eq!(check("2024", "", "31"), "");
    }

    #[test]
    fn spin_empty_fills_today() {
        let definition = date_mask(config());
        let values = spin_at(&definition, &state("", "", ""), 1, SpinModifiers::NONE, true);
        assert_eq!(definition.encode(&values), Some("2024-06-15".to_owned()));
    }

    #[test]
    fn spin_day_rolls_month() {
        let definition = date_mask(config());
        let values = spin_at(&definition, &state("2024", "01", "31"), 2, SpinModifiers::NONE, true);
        assert_eq!(definition.encode(&values), Some("2024-02-01".to_owned()));
    }

    #[test]
    fn spin_month_clamps_day_to_month_end() {
        let definition = date_mask(config());
        let values = spin_at(&definition, &state("2024", "01", "31"), 1, SpinModifiers::NONE, true);
        assert_eq!(definition.encode(&values), Some("2024-02-29".to_owned()));
    }

    #[test]
    fn alt_spin_wraps_inside_section() {
        let definition = date_mask(config());
        let values = spin_at(&definition, &state("2024", "12", "31"), 1, SpinModifiers::ALT, true);
        assert_eq!(definition.encode(&values), Some("2024-01-31".to_owned()));
    }

    #[test]
    fn spin_clamps_to_range() {
        let definition = date_mask(config());
        let values = spin_at(&definition, &state("2100", "12", "30"), 2, SpinModifiers::SHIFT, true);
        assert_eq!(definition.encode(&values), Some("2100-12-31".to_owned()));
    }

    #[test]
    fn two_digit_year_normalizes() {
        let definition = date_mask(config());
        let normalized = definition
            .hooks()
            .normalize_values(&MaskValues::from_strings([("year", "24"), ("month", ""), ("day", "")]))
            .expect("short year");
        assert_eq!(normalized.joined("year"), "2024");
    }

    #[test]
    fn parse_round_trip() {
        let definition = date_mask(config());
        let values = definition.parse_values("2024-01-09").expect("valid string");
        assert_eq!(definition.encode(&values), Some("2024-01-09".to_owned()));
        assert!(definition.parse_values("2024/01/09").is_err());
        assert!(definition.parse_values("20245-01-09").is_err());
    }
}
