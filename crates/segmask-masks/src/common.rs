#![forbid(unsafe_code)]

//! Building blocks shared by the masks: padded rendering, character
//! filters, case folding, numeric spins, and two-digit year expansion.

use segmask_core::{CharClass, MaskChar, MaskValues, SpinRequest, split_graphemes};

/// Where padding goes relative to the typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Pad before the value (right-aligned numbers).
    Leading,
    /// Pad after the value.
    Trailing,
}

/// Case folding applied to typed graphemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Case {
    /// Keep as typed.
    #[default]
    Keep,
    /// Fold to lowercase.
    Lower,
    /// Fold to uppercase.
    Upper,
}

impl Case {
    /// Apply to one grapheme.
    #[must_use]
    pub fn apply(self, grapheme: &str) -> String {
        match self {
            Self::Keep => grapheme.to_owned(),
            Self::Lower => grapheme.to_lowercase(),
            Self::Upper => grapheme.to_uppercase(),
        }
    }
}

/// Render `value` padded with `pad` up to `width` cells.
#[must_use]
pub fn padded(value: &[String], width: usize, pad: &str, padding: Padding) -> Vec<MaskChar> {
    let fill = (value.len()..width).map(|_| MaskChar::mask(pad));
    let chars = value.iter().map(MaskChar::value);
    match padding {
        Padding::Leading => fill.chain(chars).collect(),
        Padding::Trailing => chars.chain(fill).collect(),
    }
}

/// Render `placeholder` while empty, else the value padded with `pad`.
#[must_use]
pub fn placeholder_or_padded(
    value: &[String],
    placeholder: &str,
    width: usize,
    pad: &str,
    padding: Padding,
) -> Vec<MaskChar> {
    if value.is_empty() {
        return split_graphemes(placeholder)
            .into_iter()
            .map(MaskChar::mask)
            .collect();
    }
    padded(value, width, pad, padding)
}

/// Whether `grapheme` is a single character of `class`.
#[must_use]
pub fn accepts(class: CharClass, grapheme: &str) -> bool {
    class.matches_grapheme(grapheme)
}

/// Decimal value of `slug`, `None` when empty or not all digits.
#[must_use]
pub fn parse_decimal(values: &MaskValues, slug: &str) -> Option<i64> {
    let text = values.joined(slug);
    if text.is_empty() || !CharClass::Digit.matches_all(&text) {
        return None;
    }
    text.parse().ok()
}

/// `value` zero-padded to `width` digits.
#[must_use]
pub fn zero_padded(value: i64, width: usize) -> String {
    format!("{value:0width$}")
}

/// Expand a year typed with one or two digits: below 90 is 20xx, else 19xx.
#[must_use]
pub fn expand_short_year(year: i32) -> i32 {
    if year < 90 { 2000 + year } else { 1900 + year }
}

/// Replace a one- or two-digit `slug` value with its four-digit year.
///
/// Returns `None` when nothing changes.
#[must_use]
pub fn normalize_short_year(values: &MaskValues, slug: &str) -> Option<MaskValues> {
    let len = values.len_of(slug);
    if len == 0 || len > 2 {
        return None;
    }
    let year = i32::try_from(parse_decimal(values, slug)?).ok()?;
    Some(
        values
            .clone()
            .with_str(slug, &expand_short_year(year).to_string()),
    )
}

/// A row of numeric blocks that spin with carry, like address octets.
#[derive(Debug, Clone, Copy)]
pub struct CarrySpin<'a> {
    /// Block slugs, most significant first.
    pub slugs: &'a [&'a str],
    /// Digit base used to read and write a block.
    pub radix: u32,
    /// Largest block value.
    pub max: u32,
    /// Step while shift is held.
    pub shift_step: i64,
}

impl CarrySpin<'_> {
    fn read(&self, values: &MaskValues, slug: &str) -> i64 {
        let text = values.joined(slug);
        u32::from_str_radix(&text, self.radix)
            .map_or(0, |n| i64::from(n.min(self.max)))
    }

    fn write(&self, values: &mut MaskValues, slug: &str, value: i64) {
        let text = match self.radix {
            16 => format!("{value:x}"),
            _ => value.to_string(),
        };
        values.set_str(slug, &text);
    }

    /// Spin the block under the caret.
    ///
    /// Spinning down clamps the block at zero and never borrows. Spinning
    /// up with alt wraps only that block. Otherwise upward overflow carries
    /// toward the first block; when the first block overflows too, every
    /// block up to the caret saturates at the maximum. Without alt, empty
    /// blocks read as zero and are written back as `0`.
    #[must_use]
    pub fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
        let current = self.slugs.iter().position(|slug| *slug == request.slug)?;
        let base = i64::from(self.max) + 1;
        let amount = request.step(1, self.shift_step);
        let mut values = request.values.clone();

        if !request.alt() {
            for slug in self.slugs {
                if values.is_empty_at(slug) {
                    values.set_str(*slug, "0");
                }
            }
        }

        if amount < 0 {
            let next = (self.read(&values, request.slug) + amount).max(0);
            self.write(&mut values, request.slug, next);
            return Some(values);
        }

        if request.alt() {
            let next = (self.read(&values, request.slug) + amount).rem_euclid(base);
            self.write(&mut values, request.slug, next);
            return Some(values);
        }

        let mut carry = amount;
        for slug in self.slugs[..=current].iter().rev() {
            let next = self.read(&values, slug) + carry;
            self.write(&mut values, slug, next.rem_euclid(base));
            carry = next.div_euclid(base);
            if carry == 0 {
                return Some(values);
            }
        }

        for slug in &self.slugs[..=current] {
            self.write(&mut values, slug, i64::from(self.max));
        }
        Some(values)
    }
}

/// Step `current` by `amount` and wrap it into `0..modulus`.
#[must_use]
pub fn wrapping_step(current: i64, amount: i64, modulus: i64) -> i64 {
    (current + amount).rem_euclid(modulus)
}
