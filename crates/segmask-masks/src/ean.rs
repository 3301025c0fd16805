#![forbid(unsafe_code)]

//! EAN-13 article numbers with a computed check digit.

use segmask_core::logging::trace;
use segmask_core::validation::{ERROR_CODE_CHECK_DIGIT, ERROR_CODE_FORMAT};
use segmask_core::{
    CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section, SectionHooks,
    SpinRequest, ValidationError, ValidationResult, ValuesParseError,
};

use crate::common::{Padding, accepts, padded, placeholder_or_padded, wrapping_step, zero_padded};

const PARTS: [(&str, usize); 4] = [
    ("countryCode", 1),
    ("manufacturerCode", 6),
    ("productCode", 5),
    ("checkDigit", 1),
];

/// Check digit of twelve digits with alternating weights 1 and 3.
///
/// `None` unless `digits` is exactly twelve ASCII digits.
#[must_use]
pub fn weighted_check_digit(digits: &str) -> Option<char> {
    if !CharClass::Digit.matches_run(digits, 12, 12) {
        return None;
    }
    let sum: u32 = digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    char::from_digit((10 - sum % 10) % 10, 10)
}

fn payload(values: &MaskValues) -> Option<String> {
    let digits: String = PARTS[..3].iter().map(|(slug, _)| values.joined(slug)).collect();
    let complete = PARTS[..3]
        .iter()
        .all(|(slug, width)| values.len_of(slug) == *width);
    complete.then_some(digits)
}

/// `values` with the check digit recomputed, or `None` when incomplete.
fn with_check_digit(values: &MaskValues) -> Option<MaskValues> {
    let check = weighted_check_digit(&payload(values)?)?;
    Some(values.clone().with_str("checkDigit", &check.to_string()))
}

#[derive(Debug, Clone, Copy)]
struct EanPartHooks {
    slug: &'static str,
    width: usize,
}

impl EanPartHooks {
    fn modulus(&self) -> i64 {
        10_i64.pow(self.width as u32)
    }
}

impl SectionHooks for EanPartHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        if self.width == 1 {
            placeholder_or_padded(&value[..value.len().min(1)], "0", 1, "0", Padding::Trailing)
        } else {
            padded(value, self.width, "0", Padding::Trailing)
        }
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::Digit, grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(CharClass::Digit.matches_run(value, 0, self.width))
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        let current = request.values.joined(self.slug).parse::<i64>().unwrap_or(0);
        let values = match self.slug {
            "checkDigit" => request.values.clone(),
            "countryCode" => {
                let next = wrapping_step(current, request.direction.sign(), 10);
                request.values.clone().with_str(self.slug, &next.to_string())
            }
            _ => {
                let small = if request.alt() { 100 } else { 1 };
                let next = wrapping_step(current, request.step(small, 1000), self.modulus());
                request
                    .values
                    .clone()
                    .with_str(self.slug, &zero_padded(next, self.width))
            }
        };
        Some(with_check_digit(&values).unwrap_or(values))
    }
}

#[derive(Debug, Clone, Copy)]
struct EanRules;

impl MaskHooks for EanRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        if PARTS.iter().any(|(slug, _)| values.is_empty_at(slug)) {
            return None;
        }
        Some(PARTS.iter().map(|(slug, _)| values.joined(slug)).collect())
    }

    fn semantic_validation(&self, values: &MaskValues) -> Option<ValidationResult> {
        if values.is_all_empty() {
            return None;
        }
        let shaped = PARTS
            .iter()
            .all(|(slug, width)| CharClass::Digit.matches_run(&values.joined(slug), *width, *width));
        if !shaped {
            return Some(ValidationResult::invalid(ERROR_CODE_FORMAT, "invalid EAN"));
        }

        let Some(expected) = payload(values).as_deref().and_then(weighted_check_digit) else {
            return Some(ValidationResult::invalid(ERROR_CODE_FORMAT, "invalid EAN"));
        };
        let got = values.joined("checkDigit");
        if got != expected.to_string() {
            return Some(ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_CHECK_DIGIT, "invalid EAN: expected check digit {expected}, got {got}")
                    .with_param("expected", expected)
                    .with_param("got", got),
            ));
        }
        Some(ValidationResult::Valid)
    }

    fn normalize_values(&self, values: &MaskValues) -> Option<MaskValues> {
        with_check_digit(values)
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let digits: String = text.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
        if !CharClass::Digit.matches_run(&digits, 13, 13) {
            trace!(input = text, "not thirteen digits");
            return Err(ValuesParseError::malformed(text, "expected 13 digits"));
        }
        let mut values = MaskValues::new();
        let mut offset = 0;
        for (slug, width) in PARTS {
            values.set_str(slug, &digits[offset..offset + width]);
            offset += width;
        }
        Ok(values)
    }
}

/// Build an EAN-13 mask.
#[must_use]
pub fn ean_mask() -> MaskDefinition {
    let mut sections = Vec::with_capacity(PARTS.len() * 2 - 1);
    for (i, (slug, width)) in PARTS.into_iter().enumerate() {
        if i > 0 {
            sections.push(Section::fixed_with_skip_keys("-", ["-", "/", " "]));
        }
        sections.push(
            InputSection::new(slug, EanPartHooks { slug, width })
                .with_max_length(width)
                .into(),
        );
    }
    MaskDefinition::new("ean-13", sections, EanRules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmask_core::{MaskState, PatchOperation, SpaceCoord, SpinDirection, SpinModifiers, apply_patch_operations, derive_state};

    fn values(country: &str, manufacturer: &str, product: &str, check: &str) -> MaskValues {
        MaskValues::from_strings([
            ("countryCode", country),
            ("manufacturerCode", manufacturer),
            ("productCode", product),
            ("checkDigit", check),
        ])
    }

    #[test]
    fn known_check_digits() {
        assert_eq!(weighted_check_digit("400638133393"), Some('1'));
        assert_eq!(weighted_check_digit("978030640615"), Some('7'));
        assert_eq!(weighted_check_digit("12345"), None);
    }

    #[test]
    fn semantic_messages() {
        let definition = ean_mask();
        let message = |v: MaskValues| derive_state(&MaskState::initial(v), &definition).semantic_message();
        assert_eq!(message(values("4", "006381", "33393", "1")), "");
        assert_eq!(
            message(values("4", "006381", "33393", "5")),
            "invalid EAN: expected check digit 1, got 5"
        );
        assert_eq!(message(values("4", "0063", "", "")), "invalid EAN");
    }

    #[test]
    fn normalization_fills_check_digit() {
        let definition = ean_mask();
        let normalized = definition
            .hooks()
            .normalize_values(&values("4", "006381", "33393", ""))
            .expect("complete payload");
        assert_eq!(normalized.joined("checkDigit"), "1");
        assert!(definition.hooks().normalize_values(&values("4", "00638", "33393", "")).is_none());
    }

    #[test]
    fn product_spin_wraps_and_updates_check_digit() {
        let definition = ean_mask();
        let state = MaskState::initial(values("4", "006381", "99999", "0")).with_caret(SpaceCoord::new(2, 0), None);
        let outcome = apply_patch_operations(
            &[PatchOperation::Spin {
                direction: SpinDirection::Up,
                modifiers: SpinModifiers::NONE,
            }],
            &state,
            &definition,
            None,
        );
        assert_eq!(outcome.state.values.joined("productCode"), "00000");
        assert!(outcome.derived.is_semantically_valid());
    }

    #[test]
    fn manufacturer_spin_steps() {
        let definition = ean_mask();
        let state = MaskState::initial(values("4", "000050", "", "")).with_caret(SpaceCoord::new(1, 0), None);
        let spin = |modifiers| {
            apply_patch_operations(
                &[PatchOperation::Spin {
                    direction: SpinDirection::Down,
                    modifiers,
                }],
                &state,
                &definition,
                None,
            )
            .state
            .values
            .joined("manufacturerCode")
        };
        assert_eq!(spin(SpinModifiers::NONE), "000049");
        assert_eq!(spin(SpinModifiers::ALT), "999950");
        assert_eq!(spin(SpinModifiers::SHIFT), "999050");
    }

    #[test]
    fn parse_round_trip() {
        let definition = ean_mask();
        let parsed = definition.parse_values("4-006381-33393-1").expect("valid");
        assert_eq!(definition.encode(&parsed).as_deref(), Some("4006381333931"));
        assert!(definition.parse_values("400638133393").is_err());
    }
}
