#![forbid(unsafe_code)]

//! Dotted-quad IPv4 addresses.

use segmask_core::logging::trace;
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, SpinRequest, ValuesParseError,
};

use crate::common::{CarrySpin, Padding, accepts, placeholder_or_padded};

const BLOCKS: [&str; 4] = ["block1", "block2", "block3", "block4"];

const SPIN: CarrySpin<'static> = CarrySpin {
    slugs: &BLOCKS,
    radix: 10,
    max: 255,
    shift_step: 10,
};

fn octet(text: &str) -> Option<u8> {
    if !CharClass::Digit.matches_run(text, 1, 3) {
        return None;
    }
    text.parse().ok()
}

#[derive(Debug, Clone, Copy)]
struct OctetHooks;

impl SectionHooks for OctetHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        placeholder_or_padded(value, "0", 0, "0", Padding::Leading)
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::Digit, grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(value.is_empty() || octet(value).is_some())
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        SPIN.spin(request)
    }
}

#[derive(Debug, Clone, Copy)]
struct Ipv4Rules;

impl MaskHooks for Ipv4Rules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let octets = BLOCKS
            .iter()
            .map(|slug| octet(&values.joined(slug)))
            .collect::<Option<Vec<u8>>>()?;
        Some(
            octets
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join("."),
        )
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let parts: Vec<&str> = text.trim().split('.').collect();
        if parts.len() != BLOCKS.len() || parts.iter().any(|part| octet(part).is_none()) {
            trace!(input = text, "not a dotted quad");
            return Err(ValuesParseError::malformed(text, "expected four octets 0-255"));
        }
        Ok(MaskValues::from_strings(BLOCKS.iter().copied().zip(parts)))
    }
}

/// Build an IPv4 address mask.
#[must_use]
pub fn ipv4_mask() -> MaskDefinition {
    let mut sections = Vec::with_capacity(BLOCKS.len() * 2 - 1);
    for (i, slug) in BLOCKS.iter().enumerate() {
        if i > 0 {
            sections.push(Section::fixed_with_skip_keys(".", [".", " "]));
        }
        sections.push(
            InputSection::new(*slug, OctetHooks)
                .with_alignment(Alignment::Right)
                .with_max_length(3)
                .into(),
        );
    }
    MaskDefinition::new("ipv4", sections, Ipv4Rules)
}
