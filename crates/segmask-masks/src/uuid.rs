#![forbid(unsafe_code)]

//! UUIDs in the canonical 8-4-4-4-12 hex layout.

use segmask_core::logging::trace;
use segmask_core::validation::{ERROR_CODE_FORMAT, ERROR_CODE_INVALID};
use segmask_core::{
    CharClass, InputBehavior, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, ValidationError, ValidationResult, ValuesParseError,
};

use crate::common::{Case, accepts};

const PARTS: [(&str, usize); 5] = [
    ("part1", 8),
    ("part2", 4),
    ("part3", 4),
    ("part4", 4),
    ("part5", 12),
];

const NIL: &str = "00000000000000000000000000000000";
const MAX: &str = "ffffffffffffffffffffffffffffffff";

/// UUID mask configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UuidConfig {
    /// Required version digit (`1..=8`); any version when `None`.
    pub version: Option<u8>,
}

impl UuidConfig {
    /// Require a version.
    #[must_use]
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = Some(version);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct HexPartHooks {
    width: usize,
}

impl SectionHooks for HexPartHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        if value.is_empty() {
            return vec![MaskChar::mask("0")];
        }
        value.iter().map(|ch| MaskChar::value(ch.to_lowercase())).collect()
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::HexDigit, grapheme)
    }

    fn substitute(&self, grapheme: &str) -> String {
        Case::Lower.apply(grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(CharClass::HexDigit.matches_run(value, 0, self.width))
    }
}

fn parts(values: &MaskValues) -> Vec<String> {
    PARTS
        .iter()
        .map(|(slug, _)| values.joined(slug).to_lowercase())
        .collect()
}

fn complete(parts: &[String]) -> bool {
    parts
        .iter()
        .zip(PARTS)
        .all(|(part, (_, width))| CharClass::LowerHexDigit.matches_run(part, width, width))
}

#[derive(Debug, Clone, Copy)]
struct UuidRules {
    config: UuidConfig,
}

impl MaskHooks for UuidRules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let parts = parts(values);
        complete(&parts).then(|| parts.join("-"))
    }

    fn semantic_validation(&self, values: &MaskValues) -> Option<ValidationResult> {
        if values.is_all_empty() {
            return None;
        }
        let parts = parts(values);
        if !complete(&parts) {
            return Some(ValidationResult::invalid(ERROR_CODE_FORMAT, "Invalid UUID"));
        }

        let all = parts.concat();
        if all == NIL || all == MAX {
            return Some(ValidationResult::Valid);
        }
        let Some(version) = self.config.version else {
            return Some(ValidationResult::Valid);
        };

        let version_digit = char::from_digit(u32::from(version), 16);
        if parts[2].chars().next() != version_digit {
            return Some(ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_INVALID, "Invalid UUID: expected version number must be {version}")
                    .with_param("version", version),
            ));
        }
        if !parts[3].starts_with(['8', '9', 'a', 'b']) {
            return Some(ValidationResult::invalid(
                ERROR_CODE_INVALID,
                "Invalid UUID: expected variant number must be 8, 9, a, or b",
            ));
        }
        Some(ValidationResult::Valid)
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let groups: Vec<&str> = text.trim().split('-').collect();
        let shaped = groups.len() == PARTS.len()
            && groups
                .iter()
                .zip(PARTS)
                .all(|(group, (_, width))| CharClass::HexDigit.matches_run(group, width, width));
        if !shaped {
            trace!(input = text, "not a hyphenated UUID");
            return Err(ValuesParseError::malformed(text, "expected 8-4-4-4-12 hex digits"));
        }
        Ok(MaskValues::from_strings(
            PARTS
                .iter()
                .map(|(slug, _)| *slug)
                .zip(groups.iter().map(|group| group.to_ascii_lowercase())),
        ))
    }
}

/// Build a UUID mask.
#[must_use]
pub fn uuid_mask(config: UuidConfig) -> MaskDefinition {
    let mut sections = Vec::with_capacity(PARTS.len() * 2 - 1);
    for (i, (slug, width)) in PARTS.iter().enumerate() {
        if i > 0 {
            sections.push(Section::fixed_with_skip_keys("-", ["-"]));
        }
        sections.push(
            InputSection::new(*slug, HexPartHooks { width: *width })
                .with_behavior(InputBehavior::Replace)
                .with_max_length(*width)
                .into(),
        );
    }
    MaskDefinition::new("uuid", sections, UuidRules { config })
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmask_core::{MaskState, PatchOperation, SpaceCoord, apply_patch_operations, derive_state};

    fn message(config: UuidConfig, text: &str) -> String {
        let definition = uuid_mask(config);
        let values = definition.parse_values(text).expect("well-formed");
        derive_state(&MaskState::initial(values), &definition).semantic_message()
    }

    #[test]
    fn encodes_lowercase_when_complete() {
        let definition = uuid_mask(UuidConfig::default());
        let values = definition
            .parse_values("123E4567-E89B-12D3-A456-426614174000")
            .expect("well-formed");
        assert_eq!(
            definition.encode(&values).as_deref(),
            Some("123e4567-e89b-12d3-a456-426614174000")
        );
        let partial = values.with_str("part5", "4266");
        assert_eq!(definition.encode(&partial), None);
    }

    #[test]
    fn version_and_variant_checks() {
        let v4 = UuidConfig::default().with_version(4);
        assert_eq!(message(v4, "123e4567-e89b-42d3-a456-426614174000"), "");
        assert_eq!(
            message(v4, "123e4567-e89b-12d3-a456-426614174000"),
            "Invalid UUID: expected version number must be 4"
        );
        assert_eq!(
            message(v4, "123e4567-e89b-42d3-c456-426614174000"),
            "Invalid UUID: expected variant number must be 8, 9, a, or b"
        );
        assert_eq!(message(v4, "00000000-0000-0000-0000-000000000000"), "");
        assert_eq!(message(v4, "ffffffff-ffff-ffff-ffff-ffffffffffff"), "");
        assert_eq!(message(UuidConfig::default(), "123e4567-e89b-12d3-c456-426614174000"), "");
    }

    #[test]
    fn incomplete_value_is_invalid_but_empty_is_unchecked() {
        let definition = uuid_mask(UuidConfig::default());
        let derived = derive_state(&MaskState::from_strings([("part1", "12")]), &definition);
        assert_eq!(derived.semantic_message(), "Invalid UUID");

        let derived = derive_state(&MaskState::initial(MaskValues::new()), &definition);
        assert_eq!(derived.semantic_validation, None);
    }

    #[test]
    fn replace_behavior_overwrites() {
        let definition = uuid_mask(UuidConfig::default());
        let state = MaskState::from_strings([("part2", "abcd")]).with_caret(SpaceCoord::new(1, 1), None);
        let outcome = apply_patch_operations(&[PatchOperation::insert("F")], &state, &definition, None);
        assert_eq!(outcome.state.values.joined("part2"), "afcd");
        assert_eq!(outcome.state.caret, SpaceCoord::new(1, 2));
    }
}
