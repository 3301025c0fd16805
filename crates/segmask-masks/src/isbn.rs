#![forbid(unsafe_code)]

//! ISBN-13 (with a `978`/`979` prefix) and ISBN-10 (without one).
//!
//! Part lengths are guessed from the embedded range table while typing: the
//! group length follows from the prefix ranges, and the registrant and title
//! lengths from the group's registrant ranges. Unknown parts fall back to
//! seven group digits, seven registrant digits, and six title digits.

use segmask_core::logging::trace;
use segmask_core::validation::{ERROR_CODE_CHECK_DIGIT, ERROR_CODE_FORMAT};
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, SpinDirection, SpinRequest, ValidationError, ValidationResult, ValuesParseError,
};

use crate::common::{Case, Padding, padded, placeholder_or_padded, zero_padded};
use crate::ean::weighted_check_digit;
use crate::isbn_ranges::{group_length, known_groups, publisher_length, publisher_ranges, range_key};

const PREFIX: &str = "prefix";
const GROUP: &str = "group";
const PUBLISHER: &str = "publisher";
const TITLE: &str = "title";
const CHECK: &str = "checkDigit";

/// Digits between prefix and check digit.
const BODY_DIGITS: usize = 9;

/// ISBN-10 check character: weights 10 down to 2, modulo 11, `X` for ten.
#[must_use]
pub fn isbn10_check_digit(digits: &str) -> Option<char> {
    if !CharClass::Digit.matches_run(digits, 9, 9) {
        return None;
    }
    let sum: u32 = digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .zip((2..=10).rev())
        .map(|(d, w)| d * w)
        .sum();
    match 11 - sum % 11 {
        10 => Some('X'),
        11 => Some('0'),
        n => char::from_digit(n, 10),
    }
}

/// ISBN-13 check digit (the EAN-13 rule).
#[must_use]
pub fn isbn13_check_digit(digits: &str) -> Option<char> {
    weighted_check_digit(digits)
}

/// Guessed lengths of group, registrant, and title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Lengths {
    group: usize,
    publisher: usize,
    title: usize,
}

impl Lengths {
    const FALLBACK: Self = Self {
        group: 7,
        publisher: 7,
        title: 6,
    };

    fn guess(values: &MaskValues) -> Self {
        let prefix = table_prefix(values);
        let group = values.joined(GROUP);
        let mut lengths = Self::FALLBACK;
        if group.is_empty() {
            return lengths;
        }

        if let Some(len) = group_length(&prefix, &group) {
            lengths.group = len;
        }
        if let Some(len) = publisher_length(&prefix, &group, &values.joined(PUBLISHER)) {
            lengths.publisher = len;
            lengths.title = BODY_DIGITS.saturating_sub(group.len() + len).max(1);
        }
        lengths
    }
}

/// The prefix used for table lookups; ISBN-10 maps onto `978`.
fn table_prefix(values: &MaskValues) -> String {
    let prefix = values.joined(PREFIX);
    if prefix.is_empty() { "978".to_owned() } else { prefix }
}

/// `values` with the check digit recomputed when the body is complete.
fn with_check_digit(values: MaskValues) -> MaskValues {
    let prefix = values.joined(PREFIX);
    let body: String = [GROUP, PUBLISHER, TITLE].iter().map(|s| values.joined(s)).collect();

    let check = if prefix.is_empty() {
        isbn10_check_digit(&body)
    } else if prefix.len() == 3 {
        isbn13_check_digit(&format!("{prefix}{body}"))
    } else {
        None
    };
    match check {
        Some(check) => values.with_str(CHECK, &check.to_string()),
        None => values,
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Prefix,
    Group,
    Publisher,
    Title,
    Check,
}

#[derive(Debug, Clone, Copy)]
struct IsbnPartHooks {
    part: Part,
}

impl IsbnPartHooks {
    fn spin_prefix(values: &MaskValues) -> MaskValues {
        let next = if values.joined(PREFIX) == "978" { "979" } else { "978" };
        values.clone().with_str(PREFIX, next)
    }

    fn spin_group(values: &MaskValues, direction: SpinDirection) -> Option<MaskValues> {
        let mut values = values.clone();
        if values.is_empty_at(PREFIX) {
            values.set_str(PREFIX, "978");
        }
        let groups = known_groups(&values.joined(PREFIX));
        let current = values.joined(GROUP);
        let next = match direction {
            SpinDirection::Up => groups
                .iter()
                .find(|g| **g > current.as_str())
                .or_else(|| groups.first()),
            SpinDirection::Down => groups
                .iter()
                .rev()
                .find(|g| **g < current.as_str())
                .or_else(|| groups.last()),
        };
        let Some(next) = next else {
            trace!(prefix = %values.joined(PREFIX), "no known groups to spin through");
            return None;
        };
        values.set_str(GROUP, next);
        Some(values)
    }

    /// Step through the assigned registrant ranges of the group, hopping to
    /// the neighbouring range (wrapping) when the step leaves the current one.
    fn spin_publisher(request: &SpinRequest<'_>) -> Option<MaskValues> {
        let values = request.values;
        let prefix = table_prefix(values);
        let group = values.joined(GROUP);
        let Some(ranges) = publisher_ranges(&prefix, &group) else {
            trace!(group = %group, "registrant spin outside a known group");
            return None;
        };
        let ranges: Vec<_> = ranges.iter().filter(|(_, _, len)| *len > 0).collect();
        let (first, last) = (ranges.first()?, ranges.last()?);

        let current = values.joined(PUBLISHER);
        let key = (!current.is_empty()).then(|| i64::from(range_key(&current)));
        let position = key.and_then(|key| {
            ranges
                .iter()
                .position(|(start, end, _)| (i64::from(*start)..=i64::from(*end)).contains(&key))
        });

        let next = match (key, position) {
            (Some(key), Some(index)) => {
                let (start, end, len) = *ranges[index];
                let unit = 10_i64.pow(7 - len as u32);
                let next = key + request.step(1, 10) * unit;
                if next > i64::from(end) {
                    ranges.get(index + 1).map_or(first.0, |r| r.0)
                } else if next < i64::from(start) {
                    index.checked_sub(1).map_or(last.1, |i| ranges[i].1)
                } else {
                    u32::try_from(next).ok()?
                }
            }
            _ => match request.direction {
                SpinDirection::Up => first.0,
                SpinDirection::Down => last.1,
            },
        };

        let (_, _, len) = ranges
            .iter()
            .find(|(start, end, _)| (*start..=*end).contains(&next))?;
        let text = zero_padded(i64::from(next), 7);
        Some(values.clone().with_str(PUBLISHER, &text[..*len]))
    }

    fn spin_title(request: &SpinRequest<'_>) -> MaskValues {
        let values = request.values;
        let len = Lengths::guess(values).title;
        let max = 10_i64.pow(len as u32) - 1;
        let current = values.joined(TITLE).parse::<i64>().unwrap_or(0);
        let step = if len > 2 { 100 } else { 10 };
        let next = current + request.step(1, step);
        let next = if next < 0 {
            max
        } else if next > max {
            0
        } else {
            next
        };
        values.clone().with_str(TITLE, &zero_padded(next, len))
    }
}

impl SectionHooks for IsbnPartHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        match self.part {
            Part::Prefix => padded(value, 3, "0", Padding::Trailing),
            Part::Check => placeholder_or_padded(&value[..value.len().min(1)], "0", 1, "0", Padding::Trailing),
            Part::Group | Part::Publisher | Part::Title => {
                placeholder_or_padded(value, "0", 0, "0", Padding::Trailing)
            }
        }
    }

    fn mask_with_values(&self, value: &[String], values: &MaskValues) -> Vec<MaskChar> {
        match self.part {
            Part::Publisher => padded(value, Lengths::guess(values).publisher, "0", Padding::Trailing),
            Part::Title => padded(value, Lengths::guess(values).title, "0", Padding::Leading),
            _ => self.mask(value),
        }
    }

    fn filter(&self, grapheme: &str) -> bool {
        match self.part {
            Part::Check => CharClass::Digit.matches_grapheme(grapheme) || grapheme == "X",
            _ => CharClass::Digit.matches_grapheme(grapheme),
        }
    }

    fn substitute(&self, grapheme: &str) -> String {
        match self.part {
            Part::Check => Case::Upper.apply(grapheme),
            _ => grapheme.to_owned(),
        }
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        let valid = match self.part {
            Part::Prefix => matches!(value, "" | "978" | "979"),
            Part::Group => CharClass::Digit.matches_run(value, 0, 5),
            Part::Publisher => CharClass::Digit.matches_run(value, 0, 7),
            Part::Title => CharClass::Digit.matches_run(value, 0, 6),
            Part::Check => value.is_empty() || value == "X" || CharClass::Digit.matches_run(value, 1, 1),
        };
        Some(valid)
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        let values = match self.part {
            Part::Prefix => Self::spin_prefix(request.values),
            Part::Group => Self::spin_group(request.values, request.direction)?,
            Part::Publisher => Self::spin_publisher(request)?,
            Part::Title => Self::spin_title(request),
            Part::Check => request.values.clone(),
        };
        Some(with_check_digit(values))
    }

    fn auto_advance(&self, values: &MaskValues) -> bool {
        let lengths = Lengths::guess(values);
        match self.part {
            Part::Group => values.len_of(GROUP) == lengths.group,
            Part::Publisher => values.len_of(PUBLISHER) == lengths.publisher,
            Part::Title => values.len_of(TITLE) == lengths.title,
            Part::Prefix | Part::Check => false,
        }
    }
}

// ============================================================================
// Whole value
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct IsbnRules;

impl IsbnRules {
    fn validate13(prefix: &str, body: &str, check: &str, any_empty: bool) -> ValidationResult {
        if prefix.len() != 3 || any_empty || check.len() != 1 {
            return ValidationResult::invalid(ERROR_CODE_FORMAT, "invalid ISBN-13 format");
        }
        let digits = format!("{prefix}{body}");
        if digits.len() != 12 {
            return ValidationResult::invalid(
                ERROR_CODE_FORMAT,
                "ISBN-13 must have exactly 12 digits before check digit",
            );
        }
        match isbn13_check_digit(&digits) {
            Some(expected) if expected.to_string() == check => ValidationResult::Valid,
            Some(expected) => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_CHECK_DIGIT, "invalid ISBN-13: expected check digit {expected}, got {got}")
                    .with_param("expected", expected)
                    .with_param("got", check),
            ),
            None => ValidationResult::invalid(ERROR_CODE_FORMAT, "invalid ISBN-13 format"),
        }
    }

    fn validate10(body: &str, check: &str, any_empty: bool) -> ValidationResult {
        if any_empty || check.len() != 1 {
            return ValidationResult::invalid(ERROR_CODE_FORMAT, "invalid ISBN-10 format");
        }
        if body.len() != BODY_DIGITS {
            return ValidationResult::invalid(
                ERROR_CODE_FORMAT,
                "ISBN-10 must have exactly 9 digits before check digit",
            );
        }
        match isbn10_check_digit(body) {
            Some(expected) if expected.to_string() == check => ValidationResult::Valid,
            Some(expected) => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_CHECK_DIGIT, "invalid ISBN-10: expected check digit {expected}, got {got}")
                    .with_param("expected", expected)
                    .with_param("got", check),
            ),
            None => ValidationResult::invalid(ERROR_CODE_FORMAT, "invalid ISBN-10 format"),
        }
    }

    /// Split an unhyphenated ISBN using the range table.
    fn split_plain(digits: &str) -> Option<MaskValues> {
        if !digits.is_ascii() {
            return None;
        }
        let (prefix, rest) = match digits.len() {
            13 => digits.split_at(3),
            10 => ("", digits),
            _ => return None,
        };
        let table = if prefix.is_empty() { "978" } else { prefix };
        let (body, check) = rest.split_at(rest.len() - 1);
        let group_len = group_length(table, body)?;
        let (group, tail) = body.split_at(group_len);
        let publisher_len = publisher_length(table, group, tail)?;
        let (publisher, title) = tail.split_at(publisher_len.min(tail.len()));
        Some(MaskValues::from_strings([
            (PREFIX, prefix),
            (GROUP, group),
            (PUBLISHER, publisher),
            (TITLE, title),
            (CHECK, check),
        ]))
    }
}

impl MaskHooks for IsbnRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let parts: Vec<String> = [GROUP, PUBLISHER, TITLE, CHECK].iter().map(|s| values.joined(s)).collect();
        if parts.iter().any(String::is_empty) {
            return None;
        }
        let prefix = values.joined(PREFIX);
        let joined = parts.join("-");
        Some(if prefix.is_empty() { joined } else { format!("{prefix}-{joined}") })
    }

    fn semantic_validation(&self, values: &MaskValues) -> Option<ValidationResult> {
        if values.is_all_empty() {
            return None;
        }
        let prefix = values.joined(PREFIX);
        let body: String = [GROUP, PUBLISHER, TITLE].iter().map(|s| values.joined(s)).collect();
        let any_empty = [GROUP, PUBLISHER, TITLE].iter().any(|s| values.is_empty_at(s));
        let check = values.joined(CHECK);

        Some(if prefix.is_empty() {
            Self::validate10(&body, &check, any_empty)
        } else {
            Self::validate13(&prefix, &body, &check, any_empty)
        })
    }

    fn normalize_values(&self, values: &MaskValues) -> Option<MaskValues> {
        Some(with_check_digit(values.clone()))
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let text = text.trim();
        let upper = text.to_ascii_uppercase();
        let groups: Vec<&str> = upper.split(['-', ' ']).filter(|g| !g.is_empty()).collect();
        let parsed = match groups.as_slice() {
            &[plain] => Self::split_plain(plain),
            &[group, publisher, title, check] => Some(MaskValues::from_strings([
                (PREFIX, ""),
                (GROUP, group),
                (PUBLISHER, publisher),
                (TITLE, title),
                (CHECK, check),
            ])),
            &[prefix, group, publisher, title, check] => Some(MaskValues::from_strings([
                (PREFIX, prefix),
                (GROUP, group),
                (PUBLISHER, publisher),
                (TITLE, title),
                (CHECK, check),
            ])),
            _ => None,
        };

        let well_formed = parsed.as_ref().is_some_and(|values| {
            [PREFIX, GROUP, PUBLISHER, TITLE]
                .iter()
                .all(|s| CharClass::Digit.matches_all(&values.joined(s)))
                && matches!(values.get(CHECK), [c] if c == "X" || CharClass::Digit.matches_grapheme(c))
        });
        match parsed {
            Some(values) if well_formed => Ok(values),
            _ => {
                trace!(input = text, "ISBN string rejected");
                Err(ValuesParseError::malformed(text, "expected a hyphenated or plain ISBN"))
            }
        }
    }
}

/// Build an ISBN mask.
#[must_use]
pub fn isbn_mask() -> MaskDefinition {
    let separator = || Section::fixed_with_skip_keys("-", ["-", "/", " "]);
    let input = |slug: &str, part: Part, max_length: usize| -> Section {
        let section = InputSection::new(slug, IsbnPartHooks { part }).with_max_length(max_length);
        if part == Part::Title {
            section.with_alignment(Alignment::Right).into()
        } else {
            section.into()
        }
    };

    MaskDefinition::new(
        "isbn",
        vec![
            input(PREFIX, Part::Prefix, 3),
            separator(),
            input(GROUP, Part::Group, 7),
            separator(),
            input(PUBLISHER, Part::Publisher, 7),
            separator(),
            input(TITLE, Part::Title, 6),
            separator(),
            input(CHECK, Part::Check, 1),
        ],
        IsbnRules,
    )
}
