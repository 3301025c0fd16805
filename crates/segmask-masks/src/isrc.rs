#![forbid(unsafe_code)]

//! International Standard Recording Codes: `CC-XXX-YY-NNNNN`.

use chrono::{Datelike, Local};
use segmask_core::logging::trace;
use segmask_core::validation::ERROR_CODE_FORMAT;
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, SpinRequest, ValidationResult, ValuesParseError,
};

use crate::common::{Case, Padding, accepts, padded, placeholder_or_padded, wrapping_step, zero_padded};

const COUNTRY: &str = "countryCode";
const REGISTRANT: &str = "registrantCode";
const YEAR: &str = "year";
const DESIGNATION: &str = "designation";

/// Country codes the country section spins through.
pub const COUNTRY_CODES: [&str; 220] = [
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AR", "AT", "AU", "AW", "AZ", "BA", "BB", "BC",
    "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BK", "BM", "BN", "BO", "BP", "BR", "BS", "BW", "BX",
    "BY", "BZ", "CA", "CB", "CD", "CF", "CG", "CH", "CI", "CL", "CM", "CN", "CO", "CP", "CS", "CU",
    "CV", "CW", "CY", "CZ", "DE", "DG", "DK", "DM", "DO", "DZ", "EC", "EE", "EG", "ES", "ET", "FI",
    "FJ", "FO", "FR", "FX", "GA", "GB", "GD", "GE", "GG", "GH", "GI", "GL", "GM", "GN", "GQ", "GR",
    "GT", "GW", "GX", "GY", "HK", "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN", "IQ", "IR",
    "IS", "IT", "JE", "JM", "JO", "JP", "KE", "KG", "KH", "KM", "KN", "KR", "KS", "KW", "KY", "KZ",
    "LA", "LB", "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV", "MA", "MC", "MD", "ME", "MF", "MG",
    "MK", "ML", "MM", "MN", "MO", "MP", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA",
    "NE", "NG", "NI", "NL", "NO", "NP", "NZ", "OM", "PA", "PE", "PF", "PG", "PH", "PK", "PL", "PR",
    "PS", "PT", "PY", "QA", "QM", "QN", "QT", "QZ", "RO", "RS", "RU", "RW", "SA", "SB", "SC", "SD",
    "SE", "SG", "SI", "SK", "SL", "SM", "SN", "SO", "SR", "SS", "SV", "SX", "SY", "SZ", "TC", "TD",
    "TG", "TH", "TL", "TN", "TO", "TR", "TT", "TW", "TZ", "UA", "UG", "UK", "US", "UY", "UZ", "VC",
    "VE", "VG", "VN", "VU", "XK", "YE", "YU", "ZA", "ZB", "ZM", "ZW", "ZZ",
];

/// Largest three-character base-36 registrant (`ZZZ`).
const REGISTRANT_MAX: i64 = 36 * 36 * 36 - 1;

fn base36(mut value: i64, width: usize) -> String {
    let mut digits = Vec::new();
    while value > 0 {
        let digit = u32::try_from(value % 36).unwrap_or(0);
        digits.push(char::from_digit(digit, 36).map_or('0', |c| c.to_ascii_uppercase()));
        value /= 36;
    }
    let mut text: String = digits.into_iter().rev().collect();
    while text.len() < width {
        text.insert(0, '0');
    }
    text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Country,
    Registrant,
    Year,
    Designation,
}

#[derive(Debug, Clone, Copy)]
struct IsrcPartHooks {
    part: Part,
}

impl IsrcPartHooks {
    fn spin_country(current: &str, direction: i64) -> String {
        let next = match COUNTRY_CODES.iter().position(|code| *code == current) {
            Some(index) => wrapping_step(index as i64, direction, COUNTRY_CODES.len() as i64),
            None => 0,
        };
        COUNTRY_CODES[usize::try_from(next).unwrap_or(0)].to_owned()
    }

    fn spin_registrant(current: &str, request: &SpinRequest<'_>) -> String {
        match i64::from_str_radix(current, 36) {
            Ok(code) => {
                let next = code + request.step(1, 36);
                let next = if next < 0 {
                    REGISTRANT_MAX
                } else if next > REGISTRANT_MAX {
                    0
                } else {
                    next
                };
                base36(next, 3)
            }
            Err(_) => "000".to_owned(),
        }
    }
}

impl SectionHooks for IsrcPartHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        match self.part {
            Part::Country => padded(value, 2, "C", Padding::Trailing),
            Part::Registrant => padded(value, 3, "X", Padding::Trailing),
            Part::Year => placeholder_or_padded(value, "YY", 2, "0", Padding::Leading),
            Part::Designation => placeholder_or_padded(value, "NNNNN", 5, "0", Padding::Leading),
        }
    }

    fn filter(&self, grapheme: &str) -> bool {
        let class = match self.part {
            Part::Country => CharClass::Alpha,
            Part::Registrant => CharClass::Alphanumeric,
            Part::Year | Part::Designation => CharClass::Digit,
        };
        accepts(class, grapheme)
    }

    fn substitute(&self, grapheme: &str) -> String {
        match self.part {
            Part::Country | Part::Registrant => Case::Upper.apply(grapheme),
            Part::Year | Part::Designation => grapheme.to_owned(),
        }
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(match self.part {
            Part::Country => CharClass::Alpha.matches_run(value, 0, 2),
            Part::Registrant => CharClass::Alphanumeric.matches_run(value, 0, 3),
            Part::Year => CharClass::Digit.matches_run(value, 0, 2),
            Part::Designation => CharClass::Digit.matches_run(value, 0, 5),
        })
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        let current = request.values.joined(request.slug);
        let next = match self.part {
            Part::Country => Self::spin_country(&current, request.direction.sign()),
            Part::Registrant => Self::spin_registrant(&current, request),
            Part::Year => {
                let year = current
                    .parse::<i64>()
                    .unwrap_or_else(|_| i64::from(Local::now().year() % 100));
                let next = year + request.step(1, 10);
                let next = if next > 99 {
                    0
                } else if next < 0 {
                    99
                } else {
                    next
                };
                zero_padded(next, 2)
            }
            Part::Designation => {
                let small = if request.alt() { 100 } else { 1 };
                let designation = current.parse::<i64>().unwrap_or(0);
                zero_padded(wrapping_step(designation, request.step(small, 1000), 100_000), 5)
            }
        };
        Some(request.values.clone().with_str(request.slug, &next))
    }
}

#[derive(Debug, Clone, Copy)]
struct IsrcRules;

impl MaskHooks for IsrcRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let parts: Vec<String> = [COUNTRY, REGISTRANT, YEAR, DESIGNATION]
            .iter()
            .map(|slug| values.joined(slug))
            .collect();
        if parts.iter().any(String::is_empty) {
            return None;
        }
        Some(parts.join("-"))
    }

    /// Checked only once every part has a value.
    fn semantic_validation(&self, values: &MaskValues) -> Option<ValidationResult> {
        let [country, registrant, year, designation] =
            [COUNTRY, REGISTRANT, YEAR, DESIGNATION].map(|slug| values.joined(slug));
        if [&country, &registrant, &year, &designation].iter().any(|p| p.is_empty()) {
            return Some(ValidationResult::Valid);
        }

        let checks = [
            (
                CharClass::UpperAlpha.matches_run(&country, 2, 2),
                "Country code must be 2 uppercase letters",
            ),
            (
                CharClass::Alphanumeric.matches_run(&registrant, 3, 3)
                    && !registrant.chars().any(|c| c.is_ascii_lowercase()),
                "Registrant code must be 3 alphanumeric characters",
            ),
            (CharClass::Digit.matches_run(&year, 2, 2), "Year must be 2 digits"),
            (
                CharClass::Digit.matches_run(&designation, 5, 5),
                "Designation must be 5 digits",
            ),
        ];
        let result = checks
            .into_iter()
            .find(|(ok, _)| !ok)
            .map_or(ValidationResult::Valid, |(_, message)| {
                ValidationResult::invalid(ERROR_CODE_FORMAT, message)
            });
        Some(result)
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let upper = text.trim().to_ascii_uppercase();
        let groups: Vec<&str> = upper.split(['-', ' ']).filter(|g| !g.is_empty()).collect();
        let shaped = match groups.as_slice() {
            [country, registrant, year, designation] => {
                CharClass::Alpha.matches_run(country, 2, 2)
                    && CharClass::Alphanumeric.matches_run(registrant, 3, 3)
                    && CharClass::Digit.matches_run(year, 2, 2)
                    && CharClass::Digit.matches_run(designation, 5, 5)
            }
            _ => false,
        };
        if !shaped {
            trace!(input = text, "not an ISRC");
            return Err(ValuesParseError::malformed(text, "expected CC-XXX-YY-NNNNN"));
        }
        Ok(MaskValues::from_strings(
            [COUNTRY, REGISTRANT, YEAR, DESIGNATION].into_iter().zip(groups),
        ))
    }
}

/// Build an ISRC mask.
#[must_use]
pub fn isrc_mask() -> MaskDefinition {
    let separator = || Section::fixed_with_skip_keys("-", ["-", " "]);
    MaskDefinition::new(
        "isrc",
        vec![
            InputSection::new(COUNTRY, IsrcPartHooks { part: Part::Country })
                .with_max_length(2)
                .into(),
            separator(),
            InputSection::new(REGISTRANT, IsrcPartHooks { part: Part::Registrant })
                .with_max_length(3)
                .into(),
            separator(),
            InputSection::new(YEAR, IsrcPartHooks { part: Part::Year })
                .with_alignment(Alignment::Right)
                .with_max_length(2)
                .into(),
            separator(),
            InputSection::new(DESIGNATION, IsrcPartHooks { part: Part::Designation })
                .with_alignment(Alignment::Right)
                .with_max_length(5)
                .into(),
        ],
        IsrcRules,
    )
}
