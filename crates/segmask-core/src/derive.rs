#![forbid(unsafe_code)]

//! Derived state: the read-only projection of a [`MaskState`].
//!
//! Derived state is always rebuilt from scratch. Each section is derived on
//! its own (local coordinate lists and maps) and the results are then
//! concatenated into the global value space and display space.
//!
//! # Coordinate maps
//!
//! For an input section, walking the masked characters advances the display
//! cursor at every character and the value cursor at `Value` characters
//! only. Each value boundary maps to the display boundary right after its
//! grapheme; `vi:0` maps to the boundary right before the first typed
//! grapheme. An empty section maps `vi:0` to its first display boundary when
//! left-aligned and to its last when right-aligned.

use std::collections::BTreeMap;

use crate::coord::SpaceCoord;
use crate::definition::MaskDefinition;
use crate::section::{Alignment, FixedSection, InputSection, MaskChar, Section, SectionKind};
use crate::state::MaskState;
use crate::validation::ValidationResult;
use crate::values::{MaskValues, split_graphemes};

// ============================================================================
// Per-section state
// ============================================================================

/// Derived state of a fixed section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSectionState {
    /// Display index.
    pub index: usize,
    /// Rendered literal.
    pub text: String,
    /// Display boundaries `index:0 ..= index:n`.
    pub display_space: Vec<SpaceCoord>,
}

/// Derived state of an input section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSectionState {
    /// Display index.
    pub index: usize,
    /// Value index (position among input sections).
    pub value_index: usize,
    /// Slug in the value map.
    pub slug: String,
    /// Caret placement when empty.
    pub alignment: Alignment,
    /// Current graphemes.
    pub value: Vec<String>,
    /// Current graphemes joined.
    pub value_string: String,
    /// Result of the syntactic hook; `None` when unchecked.
    pub syntactic_validation: Option<bool>,
    /// Rendered characters.
    pub mask_chars: Vec<MaskChar>,
    /// Rendered characters joined.
    pub text: String,
    /// Value boundaries `value_index:0 ..= value_index:len`.
    pub value_space: Vec<SpaceCoord>,
    /// Display boundaries `index:0 ..= index:n`.
    pub display_space: Vec<SpaceCoord>,
    /// Value boundary to display boundary.
    pub value_to_display: BTreeMap<SpaceCoord, SpaceCoord>,
    /// Display boundary to value boundary.
    pub display_to_value: BTreeMap<SpaceCoord, SpaceCoord>,
}

impl InputSectionState {
    /// First value boundary (`value_index:0`).
    #[must_use]
    pub fn first_value_coord(&self) -> SpaceCoord {
        SpaceCoord::new(self.value_index, 0)
    }

    /// Last value boundary (`value_index:len`).
    #[must_use]
    pub fn last_value_coord(&self) -> SpaceCoord {
        self.value_space
            .last()
            .copied()
            .unwrap_or_else(|| self.first_value_coord())
    }

    /// Grapheme count of the value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Derived state of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionState {
    /// Literal section.
    Fixed(FixedSectionState),
    /// Editable section.
    Input(InputSectionState),
}

impl SectionState {
    /// Display index.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Fixed(s) => s.index,
            Self::Input(s) => s.index,
        }
    }

    /// Rendered text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Fixed(s) => &s.text,
            Self::Input(s) => &s.text,
        }
    }

    /// Display boundaries.
    #[must_use]
    pub fn display_space(&self) -> &[SpaceCoord] {
        match self {
            Self::Fixed(s) => &s.display_space,
            Self::Input(s) => &s.display_space,
        }
    }

    /// Section kind.
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Fixed(_) => SectionKind::Fixed,
            Self::Input(_) => SectionKind::Input,
        }
    }

    /// The input state, if this is an input section.
    #[must_use]
    pub fn as_input(&self) -> Option<&InputSectionState> {
        match self {
            Self::Input(s) => Some(s),
            Self::Fixed(_) => None,
        }
    }
}

// ============================================================================
// Section deriver
// ============================================================================

/// Derive a fixed section at display index `index`.
#[must_use]
pub fn derive_fixed_section(section: &FixedSection, index: usize) -> FixedSectionState {
    let graphemes = section.graphemes();
    let display_space = (0..=graphemes.len())
        .map(|pos| SpaceCoord::new(index, pos))
        .collect();

    FixedSectionState {
        index,
        text: section.text.clone(),
        display_space,
    }
}

/// Derive an input section at display index `index` and value index `value_index`.
#[must_use]
pub fn derive_input_section(
    values: &MaskValues,
    section: &InputSection,
    index: usize,
    value_index: usize,
) -> InputSectionState {
    let hooks = section.hooks();
    let value = values.get(&section.slug).to_vec();
    let value_string = value.concat();
    let syntactic_validation = hooks.syntactic_validation(&value_string);
    let mask_chars = hooks.mask_with_values(&value, values);

    let origin = SpaceCoord::new(value_index, 0);
    let mut value_space = vec![origin];
    let mut display_space = vec![SpaceCoord::new(index, 0)];
    let mut value_to_display = BTreeMap::new();
    let mut display_to_value = BTreeMap::new();

    let mut pos_value = 0;
    let mut pos_display = 0;

    for mask_char in &mask_chars {
        let before = SpaceCoord::new(index, pos_display);
        pos_display += 1;
        let after = SpaceCoord::new(index, pos_display);
        display_space.push(after);

        if mask_char.is_value() {
            if pos_value == 0 {
                value_to_display.insert(origin, before);
                display_to_value.insert(before, origin);
            }

            pos_value += 1;
            let coord = SpaceCoord::new(value_index, pos_value);
            value_space.push(coord);
            value_to_display.insert(coord, after);
            display_to_value.insert(after, coord);
        }
    }

    if value.is_empty() {
        let anchor = match section.alignment {
            Alignment::Left => display_space[0],
            Alignment::Right => display_space[display_space.len() - 1],
        };
        value_to_display.insert(origin, anchor);
        display_to_value.insert(anchor, origin);
    }

    let text = mask_chars.iter().map(|c| c.ch.as_str()).collect();

    InputSectionState {
        index,
        value_index,
        slug: section.slug.clone(),
        alignment: section.alignment,
        value,
        value_string,
        syntactic_validation,
        mask_chars,
        text,
        value_space,
        display_space,
        value_to_display,
        display_to_value,
    }
}

// ============================================================================
// Whole-mask derived state
// ============================================================================

/// Derived state of a whole mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskDerivedState {
    /// Per-section state in display order.
    pub sections: Vec<SectionState>,
    /// Concatenated value boundaries.
    pub value_space: Vec<SpaceCoord>,
    /// Concatenated display boundaries.
    pub display_space: Vec<SpaceCoord>,
    /// Global value-to-display map.
    pub value_to_display: BTreeMap<SpaceCoord, SpaceCoord>,
    /// Global display-to-value map.
    pub display_to_value: BTreeMap<SpaceCoord, SpaceCoord>,
    /// Syntactic status per slug.
    pub syntactic_validation: BTreeMap<String, Option<bool>>,
    /// Semantic status of the whole value; `None` when unchecked.
    pub semantic_validation: Option<ValidationResult>,
    /// Canonical encoded value, if complete and valid.
    pub validated_value: Option<String>,
    /// Debug encoding of values with caret `[` and selection end `]`.
    pub encoded_state: String,
    /// Rendered text of all sections.
    pub display_text: String,
    /// Rendered text per section joined by `|`, with `[` and `]` markers.
    pub display_text_with_selection: String,
    /// Caret in value space.
    pub caret_value: SpaceCoord,
    /// Caret in display space, if the caret maps to one.
    pub caret_display: Option<SpaceCoord>,
}

impl MaskDerivedState {
    /// Display index of the section holding the caret.
    #[must_use]
    pub fn caret_display_index(&self) -> Option<usize> {
        self.caret_display.map(|c| c.section)
    }

    /// Input section holding the caret.
    #[must_use]
    pub fn caret_section(&self) -> Option<&InputSectionState> {
        self.caret_display_index()
            .and_then(|index| self.sections.get(index))
            .and_then(SectionState::as_input)
    }

    /// Input section with value index `value_index`.
    #[must_use]
    pub fn input_by_value_index(&self, value_index: usize) -> Option<&InputSectionState> {
        self.inputs().find(|s| s.value_index == value_index)
    }

    /// Input sections in order.
    pub fn inputs(&self) -> impl Iterator<Item = &InputSectionState> {
        self.sections.iter().filter_map(SectionState::as_input)
    }

    /// Whether `coord` is a value-space boundary.
    #[must_use]
    pub fn contains_value_coord(&self, coord: SpaceCoord) -> bool {
        self.value_space.contains(&coord)
    }

    /// Display boundary for a value boundary.
    #[must_use]
    pub fn display_of(&self, coord: SpaceCoord) -> Option<SpaceCoord> {
        self.value_to_display.get(&coord).copied()
    }

    /// Semantic message, empty when valid or unchecked.
    #[must_use]
    pub fn semantic_message(&self) -> String {
        self.semantic_validation
            .as_ref()
            .map(ValidationResult::message)
            .unwrap_or_default()
    }

    /// `false` only when semantic validation ran and failed.
    #[must_use]
    pub fn is_semantically_valid(&self) -> bool {
        !self
            .semantic_validation
            .as_ref()
            .is_some_and(ValidationResult::is_invalid)
    }
}

/// Build the derived state of `state` under `definition`.
#[must_use]
pub fn derive_state(state: &MaskState, definition: &MaskDefinition) -> MaskDerivedState {
    let mut sections = Vec::with_capacity(definition.sections().len());
    let mut value_space = Vec::new();
    let mut display_space = Vec::new();
    let mut value_to_display = BTreeMap::new();
    let mut display_to_value = BTreeMap::new();
    let mut syntactic_validation = BTreeMap::new();
    let mut value_index = 0;

    for (index, section) in definition.sections().iter().enumerate() {
        match section {
            Section::Fixed(fixed) => {
                let derived = derive_fixed_section(fixed, index);
                display_space.extend_from_slice(&derived.display_space);
                sections.push(SectionState::Fixed(derived));
            }
            Section::Input(input) => {
                let derived = derive_input_section(&state.values, input, index, value_index);
                value_index += 1;

                syntactic_validation.insert(derived.slug.clone(), derived.syntactic_validation);
                value_space.extend_from_slice(&derived.value_space);
                display_space.extend_from_slice(&derived.display_space);
                value_to_display.extend(derived.value_to_display.iter().map(|(k, v)| (*k, *v)));
                display_to_value.extend(derived.display_to_value.iter().map(|(k, v)| (*k, *v)));
                sections.push(SectionState::Input(derived));
            }
        }
    }

    let hooks = definition.hooks();
    let semantic_validation = hooks.semantic_validation(&state.values);
    let validated_value = hooks.encode_validated_value(&state.values);

    let caret_display = value_to_display.get(&state.caret).copied();
    let selection_display = value_to_display.get(&state.selection_end).copied();

    let encoded_state = encode_state(state, definition);
    let display_text = sections.iter().map(SectionState::text).collect();
    let display_text_with_selection =
        display_text_with_selection(&sections, caret_display, selection_display);

    MaskDerivedState {
        sections,
        value_space,
        display_space,
        value_to_display,
        display_to_value,
        syntactic_validation,
        semantic_validation,
        validated_value,
        encoded_state,
        display_text,
        display_text_with_selection,
        caret_value: state.caret,
        caret_display,
    }
}

// ============================================================================
// Debug encodings
// ============================================================================

/// Insert `[` at `caret` and `]` at `selection_end` into `parts` for one section.
fn mark_section(
    parts: &[String],
    caret: Option<usize>,
    selection_end: Option<usize>,
) -> String {
    let clamp = |pos: usize| pos.min(parts.len());
    let mut out = String::new();
    let mut markers: Vec<(usize, char)> = Vec::with_capacity(2);

    match (caret.map(clamp), selection_end.map(clamp)) {
        (Some(c), Some(s)) if c <= s => markers.extend([(c, '['), (s, ']')]),
        (Some(c), Some(s)) => markers.extend([(s, ']'), (c, '[')]),
        (Some(c), None) => markers.push((c, '[')),
        (None, Some(s)) => markers.push((s, ']')),
        (None, None) => {}
    }

    let mut next = markers.into_iter().peekable();
    for (pos, part) in parts.iter().enumerate() {
        while let Some((_, marker)) = next.next_if(|(at, _)| *at == pos) {
            out.push(marker);
        }
        out.push_str(part);
    }
    for (_, marker) in next {
        out.push(marker);
    }
    out
}

/// Input values joined by `|` with `[` at the caret and `]` at the selection end.
#[must_use]
pub fn encode_state(state: &MaskState, definition: &MaskDefinition) -> String {
    definition
        .input_sections()
        .enumerate()
        .map(|(i, section)| {
            let caret = (state.caret.section == i).then_some(state.caret.position);
            let selection = (state.selection_end.section == i).then_some(state.selection_end.position);
            mark_section(state.values.get(&section.slug), caret, selection)
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn display_text_with_selection(
    sections: &[SectionState],
    caret: Option<SpaceCoord>,
    selection_end: Option<SpaceCoord>,
) -> String {
    sections
        .iter()
        .map(|section| {
            let index = section.index();
            let at = |coord: Option<SpaceCoord>| {
                coord.filter(|c| c.section == index).map(|c| c.position)
            };
            mark_section(&split_graphemes(section.text()), at(caret), at(selection_end))
        })
        .collect::<Vec<_>>()
        .join("|")
}
