#![forbid(unsafe_code)]

//! Section definitions and the section-hook contract.
//!
//! A mask is an ordered list of [`Section`]s. Fixed sections are literal
//! text. Input sections own a slug in the value map and delegate their
//! domain rules (masking, filtering, spinning, ...) to a [`SectionHooks`]
//! implementation, usually a small configuration struct.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::values::{MaskValues, split_graphemes};

/// How typed characters enter an input section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum InputBehavior {
    /// Shift existing characters right.
    #[default]
    Insert,
    /// Overwrite the character at the caret.
    Replace,
}

/// Where the caret sits inside an empty input section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Alignment {
    /// At the first display boundary.
    #[default]
    Left,
    /// At the last display boundary.
    Right,
}

/// Whether a rendered character is padding or typed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MaskCharKind {
    /// Placeholder, padding, or separator produced by the masking hook.
    Mask,
    /// A typed grapheme.
    Value,
}

/// One rendered grapheme of an input section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaskChar {
    /// The grapheme cluster to render.
    pub ch: String,
    /// Padding or typed content.
    pub kind: MaskCharKind,
}

impl MaskChar {
    /// A placeholder or padding character.
    #[must_use]
    pub fn mask(ch: impl Into<String>) -> Self {
        Self {
            ch: ch.into(),
            kind: MaskCharKind::Mask,
        }
    }

    /// A typed character.
    #[must_use]
    pub fn value(ch: impl Into<String>) -> Self {
        Self {
            ch: ch.into(),
            kind: MaskCharKind::Value,
        }
    }

    /// Whether this is typed content.
    #[must_use]
    pub fn is_value(&self) -> bool {
        self.kind == MaskCharKind::Value
    }
}

/// Spin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SpinDirection {
    /// Increment.
    Up,
    /// Decrement.
    Down,
}

impl SpinDirection {
    /// `+1` for up, `-1` for down.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

bitflags! {
    /// Modifier keys held while spinning.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SpinModifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Meta / Command key.
        const META  = 0b0001;
        /// Shift key (usually a larger step).
        const SHIFT = 0b0010;
        /// Alt / Option key (usually a section-local spin).
        const ALT   = 0b0100;
    }
}

/// Arguments handed to [`SectionHooks::spin`].
#[derive(Debug, Clone, Copy)]
pub struct SpinRequest<'a> {
    /// Up or down.
    pub direction: SpinDirection,
    /// The full value map before the spin.
    pub values: &'a MaskValues,
    /// Slug of the section under the caret.
    pub slug: &'a str,
    /// Modifier keys.
    pub modifiers: SpinModifiers,
}

impl SpinRequest<'_> {
    /// Shift held.
    #[must_use]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(SpinModifiers::SHIFT)
    }

    /// Alt held.
    #[must_use]
    pub fn alt(&self) -> bool {
        self.modifiers.contains(SpinModifiers::ALT)
    }

    /// Meta held.
    #[must_use]
    pub fn meta(&self) -> bool {
        self.modifiers.contains(SpinModifiers::META)
    }

    /// Signed step: `large` with shift, `small` otherwise.
    #[must_use]
    pub fn step(&self, small: i64, large: i64) -> i64 {
        let amount = if self.shift() { large } else { small };
        amount * self.direction.sign()
    }
}

/// Domain rules of one input section.
///
/// Only [`SectionHooks::mask`] is required. The defaults accept every
/// character unchanged, report no syntactic status, and do not spin or
/// auto-advance.
pub trait SectionHooks: fmt::Debug + Send + Sync {
    /// Render the section value as mask and value characters.
    ///
    /// The `Value` characters must appear in value order, one per grapheme.
    fn mask(&self, value: &[String]) -> Vec<MaskChar>;

    /// Render with access to the whole value map.
    ///
    /// Sections whose layout depends on other sections (e.g. a part length
    /// looked up from a neighbor's value) override this instead of `mask`.
    fn mask_with_values(&self, value: &[String], _values: &MaskValues) -> Vec<MaskChar> {
        self.mask(value)
    }

    /// Whether a (substituted) grapheme may be inserted.
    fn filter(&self, _grapheme: &str) -> bool {
        true
    }

    /// Map a typed grapheme before filtering (e.g. case folding).
    fn substitute(&self, grapheme: &str) -> String {
        grapheme.to_owned()
    }

    /// Syntactic status of the joined section value; `None` when unchecked.
    fn syntactic_validation(&self, _value: &str) -> Option<bool> {
        None
    }

    /// New value map after a spin; `None` when the section does not spin.
    fn spin(&self, _request: &SpinRequest<'_>) -> Option<MaskValues> {
        None
    }

    /// Whether the caret should leave the section after an insertion.
    fn auto_advance(&self, _values: &MaskValues) -> bool {
        false
    }
}

/// Hooks that render the value verbatim with no extra rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl SectionHooks for PlainText {
    fn mask(&self, value: &[String]) -> Vec<MaskChar> {
        value.iter().map(MaskChar::value).collect()
    }
}

/// A literal section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSection {
    /// Literal text.
    pub text: String,
    /// Keys that jump the caret past this section when typed before it.
    pub skip_keys: Vec<String>,
}

impl FixedSection {
    /// Create a literal section without skip keys.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            skip_keys: Vec::new(),
        }
    }

    /// Set the skip keys.
    #[must_use]
    pub fn with_skip_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `key` is one of the skip keys.
    #[must_use]
    pub fn is_skip_key(&self, key: &str) -> bool {
        self.skip_keys.iter().any(|k| k == key)
    }

    /// The literal split into graphemes.
    #[must_use]
    pub fn graphemes(&self) -> Vec<String> {
        split_graphemes(&self.text)
    }
}

/// An editable section.
#[derive(Debug, Clone)]
pub struct InputSection {
    /// Key of this section in the value map.
    pub slug: String,
    /// Default input behavior.
    pub input_behavior: InputBehavior,
    /// Caret placement when empty.
    pub alignment: Alignment,
    /// Maximum number of graphemes.
    pub max_length: Option<usize>,
    hooks: Arc<dyn SectionHooks>,
}

impl InputSection {
    /// Create an input section with default behavior and alignment.
    pub fn new(slug: impl Into<String>, hooks: impl SectionHooks + 'static) -> Self {
        Self {
            slug: slug.into(),
            input_behavior: InputBehavior::default(),
            alignment: Alignment::default(),
            max_length: None,
            hooks: Arc::new(hooks),
        }
    }

    /// Create an input section that shares an existing hook object.
    pub fn with_shared_hooks(slug: impl Into<String>, hooks: Arc<dyn SectionHooks>) -> Self {
        Self {
            slug: slug.into(),
            input_behavior: InputBehavior::default(),
            alignment: Alignment::default(),
            max_length: None,
            hooks,
        }
    }

    /// Set the input behavior.
    #[must_use]
    pub fn with_behavior(mut self, behavior: InputBehavior) -> Self {
        self.input_behavior = behavior;
        self
    }

    /// Set the alignment.
    #[must_use]
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the maximum length.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// The hook object.
    #[must_use]
    pub fn hooks(&self) -> &dyn SectionHooks {
        self.hooks.as_ref()
    }
}

/// Section kind, used as a navigator filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Literal section.
    Fixed,
    /// Editable section.
    Input,
}

/// One section of a mask definition.
#[derive(Debug, Clone)]
pub enum Section {
    /// Literal text.
    Fixed(FixedSection),
    /// Editable value.
    Input(InputSection),
}

impl Section {
    /// Literal section without skip keys.
    #[must_use]
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::Fixed(FixedSection::new(text))
    }

    /// Literal section with skip keys.
    #[must_use]
    pub fn fixed_with_skip_keys<I, S>(text: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fixed(FixedSection::new(text).with_skip_keys(keys))
    }

    /// The kind of this section.
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Fixed(_) => SectionKind::Fixed,
            Self::Input(_) => SectionKind::Input,
        }
    }

    /// The input section, if this is one.
    #[must_use]
    pub fn as_input(&self) -> Option<&InputSection> {
        match self {
            Self::Input(input) => Some(input),
            Self::Fixed(_) => None,
        }
    }

    /// The fixed section, if this is one.
    #[must_use]
    pub fn as_fixed(&self) -> Option<&FixedSection> {
        match self {
            Self::Fixed(fixed) => Some(fixed),
            Self::Input(_) => None,
        }
    }
}

impl From<FixedSection> for Section {
    fn from(section: FixedSection) -> Self {
        Self::Fixed(section)
    }
}

impl From<InputSection> for Section {
    fn from(section: InputSection) -> Self {
        Self::Input(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_step_honors_shift_and_direction() {
        let values = MaskValues::new();
        let request = SpinRequest {
            direction: SpinDirection::Down,
            values: &values,
            slug: "x",
            modifiers: SpinModifiers::SHIFT | SpinModifiers::ALT,
        };
        assert_eq!(request.step(1, 10), -10);
        assert!(request.alt());
        assert!(!request.meta());
    }

    #[test]
    fn plain_text_renders_values() {
        let chars = PlainText.mask(&["a".to_owned(), "b".to_owned()]);
        assert_eq!(chars, vec![MaskChar::value("a"), MaskChar::value("b")]);
        assert!(PlainText.filter("x"));
        assert_eq!(PlainText.substitute("Q"), "Q");
        assert!(PlainText.spin(&SpinRequest {
            direction: SpinDirection::Up,
            values: &MaskValues::new(),
            slug: "x",
            modifiers: SpinModifiers::NONE,
        })
        .is_none());
    }

    #[test]
    fn skip_keys_lookup() {
        let fixed = FixedSection::new(".").with_skip_keys([".", " "]);
        assert!(fixed.is_skip_key(" "));
        assert!(!fixed.is_skip_key("-"));
        assert_eq!(fixed.graphemes(), vec!["."]);
    }

    #[test]
    fn input_section_builders() {
        let section = InputSection::new("year", PlainText)
            .with_alignment(Alignment::Right)
            .with_behavior(InputBehavior::Replace)
            .with_max_length(4);
        assert_eq!(section.alignment, Alignment::Right);
        assert_eq!(section.input_behavior, InputBehavior::Replace);
        assert_eq!(section.max_length, Some(4));
        assert_eq!(Section::from(section).kind(), SectionKind::Input);
    }
}
