#![forbid(unsafe_code)]

//! IPv6 addresses as eight hex blocks, encoded in compressed form.

use segmask_core::logging::trace;
use segmask_core::{
    Alignment, CharClass, InputSection, MaskChar, MaskDefinition, MaskHooks, MaskValues, Section,
    SectionHooks, SpinRequest, ValuesParseError,
};

use crate::common::{CarrySpin, Case, Padding, accepts, placeholder_or_padded};

const BLOCKS: [&str; 8] = [
    "block1", "block2", "block3", "block4", "block5", "block6", "block7", "block8",
];

const SPIN: CarrySpin<'static> = CarrySpin {
    slugs: &BLOCKS,
    radix: 16,
    max: 0xffff,
    shift_step: 16,
};

#[derive(Debug, Clone, Copy)]
struct HexBlockHooks;

impl SectionHooks for HexBlockHooks {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        placeholder_or_padded(value, "0", 0, "0", Padding::Leading)
    }

    fn filter(&self, grapheme: &str) -> bool {
        accepts(CharClass::LowerHexDigit, grapheme)
    }

    fn substitute(&self, grapheme: &str) -> String {
        Case::Lower.apply(grapheme)
    }

    fn syntactic_validation(&self, value: &str) -> Option<bool> {
        Some(CharClass::LowerHexDigit.matches_run(value, 0, 4))
    }

    fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        SPIN.spin(request)
    }
}

/// Longest run of `"0"` blocks as `(start, len)`; the first one wins ties.
fn longest_zero_run(blocks: &[String]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut start = 0;
    let mut len = 0;
    for (i, block) in blocks.iter().enumerate() {
        if block == "0" {
            if len == 0 {
                start = i;
            }
            len += 1;
            if best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((start, len));
            }
        } else {
            len = 0;
        }
    }
    best
}

/// Join blocks, replacing the longest run of two or more zero blocks with `::`.
#[must_use]
pub fn compress(blocks: &[String]) -> String {
    match longest_zero_run(blocks) {
        Some((start, len)) if len >= 2 => {
            let head = blocks[..start].join(":");
            let tail = blocks[start + len..].join(":");
            format!("{head}::{tail}")
        }
        _ => blocks.join(":"),
    }
}

fn parse_groups(text: &str) -> Option<Vec<String>> {
    if text.is_empty() {
        return Some(Vec::new());
    }
    text.split(':')
        .map(|group| {
            CharClass::HexDigit
                .matches_run(group, 1, 4)
                .then(|| group.to_ascii_lowercase())
        })
        .collect()
}

/// Expand a full or `::`-compressed address into eight blocks.
fn expand(text: &str) -> Option<Vec<String>> {
    let blocks = match text.split_once("::") {
        Some((head, tail)) => {
            if tail.contains("::") {
                return None;
            }
            let head = parse_groups(head)?;
            let tail = parse_groups(tail)?;
            let missing = BLOCKS.len().checked_sub(head.len() + tail.len())?;
            if missing == 0 {
                return None;
            }
            head.into_iter()
                .chain(std::iter::repeat_n("0".to_owned(), missing))
                .chain(tail)
                .collect()
        }
        None => parse_groups(text)?,
    };
    (blocks.len() == BLOCKS.len()).then_some(blocks)
}

#[derive(Debug, Clone, Copy)]
struct Ipv6Rules;

impl MaskHooks for Ipv6Rules {
    fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
        let blocks: Vec<String> = BLOCKS
            .iter()
            .map(|slug| {
                let block = values.joined(slug);
                if block.is_empty() { "0".to_owned() } else { block }
            })
            .collect();
        Some(compress(&blocks))
    }

    fn values_from_string(&self, text: &str) -> Result<MaskValues, ValuesParseError> {
        let Some(blocks) = expand(text.trim()) else {
            trace!(input = text, "not an IPv6 address");
            return Err(ValuesParseError::malformed(text, "expected eight hex blocks"));
        };
        let blocks = blocks.iter().map(|block| {
            let trimmed = block.trim_start_matches('0');
            if trimmed.is_empty() { "0".to_owned() } else { trimmed.to_owned() }
        });
        Ok(MaskValues::from_strings(BLOCKS.iter().copied().zip(blocks)))
    }
}

/// Build an IPv6 address mask.
#[must_use]
pub fn ipv6_mask() -> MaskDefinition {
    let mut sections = Vec::with_capacity(BLOCKS.len() * 2 - 1);
    for (i, slug) in BLOCKS.iter().enumerate() {
        if i > 0 {
            sections.push(Section::fixed_with_skip_keys(":", [":", ".", " "]));
        }
        sections.push(
            InputSection::new(*slug, HexBlockHooks)
                .with_alignment(Alignment::Right)
                .with_max_length(4)
                .into(),
        );
    }
    MaskDefinition::new("ipv6", sections, Ipv6Rules)
}
