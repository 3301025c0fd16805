#![forbid(unsafe_code)]

//! The patch-operation engine.
//!
//! Every operation is a pure transition `(state, derived, definition) ->
//! state`. Rejected input (filtered characters, full sections, missing
//! selections, unknown sections) returns the state unchanged.
//!
//! [`apply_patch_operations`] runs a batch: each operation sees the derived
//! state left by the previous one, and coordinates are clamped back into the
//! value space after every step.

use crate::coord::SpaceCoord;
use crate::definition::MaskDefinition;
use crate::derive::{MaskDerivedState, derive_state};
use crate::logging::{debug, trace, trace_span, warn};
use crate::navigator::{clamp_to_value_space, find_input_section};
use crate::ops::{Direction, MoveLevel, PatchOperation};
use crate::section::{InputBehavior, Section, SpinModifiers, SpinDirection, SpinRequest};
use crate::state::MaskState;
use crate::values::grapheme_count;

/// Result of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// State after the last applied operation.
    pub state: MaskState,
    /// Derived state of `state`.
    pub derived: MaskDerivedState,
    /// The batch changed characters (or asked for it); re-render now.
    pub mutated: bool,
}

// ============================================================================
// Batch driver
// ============================================================================

/// Apply `operations` in order.
///
/// `derived` may be passed when the caller already holds the derived state of
/// `state`. When the mask normalizes values and the caret moves to another
/// input section, normalization runs right after that step.
/// [`PatchOperation::Unsupported`] ends the batch early.
#[must_use]
pub fn apply_patch_operations(
    operations: &[PatchOperation],
    state: &MaskState,
    definition: &MaskDefinition,
    derived: Option<&MaskDerivedState>,
) -> BatchOutcome {
    let span = trace_span!("apply_patch_operations", mask = definition.name(), count = operations.len());
    let _guard = span.enter();

    let mut state = state.clone();
    let mut derived = derived
        .cloned()
        .unwrap_or_else(|| derive_state(&state, definition));
    let mut mutated = false;

    for operation in operations {
        if matches!(operation, PatchOperation::Unsupported) {
            warn!(mask = definition.name(), "unsupported patch operation ends the batch");
            break;
        }

        mutated |= operation.requests_rerender();
        let previous_value_index = derived.caret_value.section;

        state = apply_patch_operation(operation, &state, &derived, definition);
        (state, derived) = settle(state, definition);

        trace!(op = operation.name(), caret = %state.caret, selection_end = %state.selection_end, "applied");

        if derived.caret_value.section != previous_value_index {
            if let Some(values) = definition.hooks().normalize_values(&state.values) {
                debug!(mask = definition.name(), "normalizing values after section change");
                state.values = values;
                (state, derived) = settle(state, definition);
            }
        }
    }

    BatchOutcome {
        state,
        derived,
        mutated,
    }
}

/// Derive, clamp the coordinates into the value space, and re-derive if needed.
fn settle(mut state: MaskState, definition: &MaskDefinition) -> (MaskState, MaskDerivedState) {
    let derived = derive_state(&state, definition);
    let caret = clamp_to_value_space(&derived, state.caret).unwrap_or(state.caret);
    let selection_end =
        clamp_to_value_space(&derived, state.selection_end).unwrap_or(state.selection_end);

    if caret == state.caret && selection_end == state.selection_end {
        return (state, derived);
    }

    trace!(from = %state.caret, to = %caret, "clamped coordinates");
    state.caret = caret;
    state.selection_end = selection_end;
    let derived = derive_state(&state, definition);
    (state, derived)
}

/// Apply a single operation against an already derived state.
#[must_use]
pub fn apply_patch_operation(
    operation: &PatchOperation,
    state: &MaskState,
    derived: &MaskDerivedState,
    definition: &MaskDefinition,
) -> MaskState {
    match operation {
        PatchOperation::MoveCursor {
            direction,
            level,
            keep_selection_end,
        } => move_cursor(state, derived, *direction, *level, *keep_selection_end),
        PatchOperation::SetCursorPosition {
            caret,
            keep_selection_end,
            ..
        } => set_cursor_position(state, definition, *caret, *keep_selection_end),
        PatchOperation::SetSelection {
            caret,
            selection_end,
        } => state.with_caret(*caret, Some(*selection_end)),
        PatchOperation::SelectNextSection { direction } => {
            select_next_section(state, derived, *direction)
        }
        PatchOperation::SelectAll => select_all(state, derived),
        PatchOperation::ClearSelection { direction } => clear_selection(state, *direction),
        PatchOperation::DeleteSelection => delete_selection(state, definition),
        PatchOperation::InsertCharacter {
            character,
            input_behavior,
        } => insert_character(state, derived, definition, character, *input_behavior),
        PatchOperation::DeleteBackwards => delete_backwards(state, derived),
        PatchOperation::DeleteForwards => delete_forwards(state, derived),
        PatchOperation::Spin {
            direction,
            modifiers,
        } => spin(state, derived, definition, *direction, *modifiers),
        PatchOperation::ApplyValueNormalization => definition
            .hooks()
            .normalize_values(&state.values)
            .map_or_else(|| state.clone(), |values| state.with_values(values)),
        PatchOperation::SetValues { values } => state.with_values(values.clone()),
        PatchOperation::Unsupported => state.clone(),
    }
}

// ============================================================================
// Caret and selection
// ============================================================================

fn move_cursor(
    state: &MaskState,
    derived: &MaskDerivedState,
    direction: Direction,
    level: MoveLevel,
    keep_selection_end: bool,
) -> MaskState {
    let Some(index) = derived.value_space.iter().position(|c| *c == state.caret) else {
        return state.clone();
    };
    let Some(section) = derived.caret_section() else {
        return state.clone();
    };
    let space = &derived.value_space;

    let caret = match (level, direction) {
        (MoveLevel::Character, Direction::Left) => index.checked_sub(1).map_or(state.caret, |i| space[i]),
        (MoveLevel::Character, Direction::Right) => space.get(index + 1).copied().unwrap_or(state.caret),
        (MoveLevel::Section, Direction::Left) => {
            let at_start = state.caret == section.first_value_coord();
            if !at_start && keep_selection_end {
                section.first_value_coord()
            } else {
                find_input_section(derived, section.index, Direction::Left)
                    .map_or_else(|| section.first_value_coord(), |prev| prev.last_value_coord())
            }
        }
        (MoveLevel::Section, Direction::Right) => {
            let at_end = state.caret == section.last_value_coord();
            if !at_end && keep_selection_end {
                section.last_value_coord()
            } else {
                find_input_section(derived, section.index, Direction::Right)
                    .map_or_else(|| section.last_value_coord(), |next| next.first_value_coord())
            }
        }
        (MoveLevel::Line, Direction::Left) => space.first().copied().unwrap_or(state.caret),
        (MoveLevel::Line, Direction::Right) => space.last().copied().unwrap_or(state.caret),
    };

    let selection_end = keep_selection_end.then_some(state.selection_end);
    state.with_caret(caret, selection_end)
}

fn set_cursor_position(
    state: &MaskState,
    definition: &MaskDefinition,
    caret: SpaceCoord,
    keep_selection_end: bool,
) -> MaskState {
    let mut next = state.with_caret(caret, keep_selection_end.then_some(state.selection_end));
    if caret.section != state.caret.section {
        if let Some(values) = definition.hooks().normalize_values(&state.values) {
            next.values = values;
        }
    }
    next
}

fn select_next_section(
    state: &MaskState,
    derived: &MaskDerivedState,
    direction: Direction,
) -> MaskState {
    derived
        .caret_display_index()
        .and_then(|index| find_input_section(derived, index, direction))
        .map_or_else(
            || state.clone(),
            |target| state.with_caret(target.last_value_coord(), Some(target.first_value_coord())),
        )
}

fn select_all(state: &MaskState, derived: &MaskDerivedState) -> MaskState {
    match (derived.value_space.first(), derived.value_space.last()) {
        (Some(first), Some(last)) => state.with_caret(*last, Some(*first)),
        _ => state.clone(),
    }
}

fn clear_selection(state: &MaskState, direction: Direction) -> MaskState {
    let (lower, upper) = state.selection_bounds();
    let edge = match direction {
        Direction::Left => lower,
        Direction::Right => upper,
    };
    state.with_caret(edge, None)
}

// ============================================================================
// Deletion
// ============================================================================

fn delete_selection(state: &MaskState, definition: &MaskDefinition) -> MaskState {
    if !state.has_selection() {
        return state.clone();
    }
    let (lower, upper) = state.selection_bounds();
    let mut values = state.values.clone();

    for (i, section) in definition.input_sections().enumerate() {
        if i < lower.section || i > upper.section {
            continue;
        }
        let old = values.get(&section.slug);
        let lo = lower.position.min(old.len());
        let hi = upper.position.min(old.len());

        let new: Vec<String> = if i == lower.section && i == upper.section {
            old[..lo].iter().chain(&old[hi.max(lo)..]).cloned().collect()
        } else if i == lower.section {
            old[..lo].to_vec()
        } else if i == upper.section {
            old[hi..].to_vec()
        } else {
            Vec::new()
        };
        values.set(section.slug.clone(), new);
    }

    MaskState {
        values,
        caret: lower,
        selection_end: lower,
    }
}

fn delete_backwards(state: &MaskState, derived: &MaskDerivedState) -> MaskState {
    if state.caret == SpaceCoord::ORIGIN {
        return state.clone();
    }
    let Some(section) = derived.caret_section() else {
        return state.clone();
    };
    let mut values = state.values.clone();
    let position = state.caret.position.min(section.len());

    let caret = if position > 0 {
        let mut value = section.value.clone();
        value.remove(position - 1);
        values.set(section.slug.clone(), value);
        state.caret.with_position(position - 1)
    } else {
        let Some(target) = find_input_section(derived, section.index, Direction::Left) else {
            return state.clone();
        };
        let mut value = values.get(&target.slug).to_vec();
        if value.pop().is_some() {
            let len = value.len();
            values.set(target.slug.clone(), value);
            SpaceCoord::new(target.value_index, len)
        } else {
            target.first_value_coord()
        }
    };

    MaskState {
        values,
        caret,
        selection_end: caret,
    }
}

fn delete_forwards(state: &MaskState, derived: &MaskDerivedState) -> MaskState {
    let Some(section) = derived.caret_section() else {
        return state.clone();
    };
    let mut values = state.values.clone();
    let position = state.caret.position;

    let caret = if position < section.len() {
        let mut value = section.value.clone();
        value.remove(position);
        values.set(section.slug.clone(), value);
        state.caret
    } else {
        let Some(target) = find_input_section(derived, section.index, Direction::Right) else {
            return state.clone();
        };
        let value = values.get(&target.slug);
        if !value.is_empty() {
            let rest = value[1..].to_vec();
            values.set(target.slug.clone(), rest);
        }
        target.first_value_coord()
    };

    MaskState {
        values,
        caret,
        selection_end: caret,
    }
}

// ============================================================================
// Insertion
// ============================================================================

fn insert_character(
    state: &MaskState,
    derived: &MaskDerivedState,
    definition: &MaskDefinition,
    character: &str,
    input_behavior: Option<InputBehavior>,
) -> MaskState {
    let Some(caret_index) = derived.caret_display_index() else {
        return state.clone();
    };
    let Some(section) = definition.input_section(caret_index) else {
        return state.clone();
    };

    if grapheme_count(character) != 1 {
        trace!(character, "insert expects exactly one grapheme");
        return state.clone();
    }

    if let Some(target) = skip_key_target(derived, definition, caret_index, character) {
        trace!(key = character, to = %target, "skip key");
        return state.with_caret(target, None);
    }

    let behavior = input_behavior.unwrap_or(section.input_behavior);
    let current = state.values.get(&section.slug);
    let position = state.caret.position.min(current.len());

    let full = section.max_length.is_some_and(|max| match behavior {
        InputBehavior::Insert => current.len() >= max,
        InputBehavior::Replace => position >= max,
    });
    if full {
        return state.clone();
    }

    let hooks = section.hooks();
    let character = hooks.substitute(character);
    if !hooks.filter(&character) {
        return state.clone();
    }

    let mut value = current.to_vec();
    match behavior {
        InputBehavior::Replace if position < value.len() => value[position] = character,
        InputBehavior::Replace => value.push(character),
        InputBehavior::Insert => value.insert(position, character),
    }

    let mut values = state.values.clone();
    values.set(section.slug.clone(), value);

    let mut caret = state.caret.with_position(position + 1);
    let filled = section.max_length.is_some_and(|max| position + 1 >= max);
    if hooks.auto_advance(&values) || filled {
        if let Some(next) = find_input_section(derived, caret_index, Direction::Right) {
            caret = next.first_value_coord();
        }
    }

    MaskState {
        values,
        caret,
        selection_end: caret,
    }
}

/// Start of the input section after a later fixed section listing `key`.
fn skip_key_target(
    derived: &MaskDerivedState,
    definition: &MaskDefinition,
    caret_index: usize,
    key: &str,
) -> Option<SpaceCoord> {
    definition
        .sections()
        .iter()
        .enumerate()
        .skip(caret_index + 1)
        .filter(|(_, section)| matches!(section, Section::Fixed(fixed) if fixed.is_skip_key(key)))
        .find_map(|(index, _)| find_input_section(derived, index, Direction::Right))
        .map(|target| target.first_value_coord())
}

// ============================================================================
// Spin
// ============================================================================

fn spin(
    state: &MaskState,
    derived: &MaskDerivedState,
    definition: &MaskDefinition,
    direction: SpinDirection,
    modifiers: SpinModifiers,
) -> MaskState {
    let Some(section) = derived
        .caret_display_index()
        .and_then(|index| definition.input_section(index))
    else {
        return state.clone();
    };

    let request = SpinRequest {
        direction,
        values: &state.values,
        slug: &section.slug,
        modifiers,
    };
    let Some(values) = section.hooks().spin(&request) else {
        return state.clone();
    };
    if section.max_length.is_some_and(|max| values.len_of(&section.slug) > max) {
        trace!(slug = %section.slug, "spin result exceeds max length");
        return state.clone();
    }

    let caret = SpaceCoord::new(derived.caret_value.section, values.len_of(&section.slug));
    MaskState {
        values,
        caret,
        selection_end: caret,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ConcatValues, MaskHooks};
    use crate::section::{Alignment, InputSection, MaskChar, PlainText, SectionHooks};
    use crate::values::MaskValues;

    /// Digits only, right-aligned, padded, spinning with wrap at 10^len.
    #[derive(Debug)]
    struct Digits(usize);

    impl SectionHooks for Digits {
        fn mask(&self, value: &[String]) -> Vec<MaskChar> {
            let mut out: Vec<MaskChar> = (value.len()..self.0).map(|_| MaskChar::mask("0")).collect();
            out.extend(value.iter().map(MaskChar::value));
            out
        }

        fn filter(&self, grapheme: &str) -> bool {
            grapheme.chars().all(|c| c.is_ascii_digit())
        }

        fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
            let current: i64 = request.values.joined(request.slug).parse().unwrap_or(0);
            let modulus = 10_i64.pow(self.0 as u32);
            let next = (current + request.step(1, 10)).rem_euclid(modulus);
            let mut values = request.values.clone();
            values.set_str(request.slug, &next.to_string());
            Some(values)
        }
    }

    #[derive(Debug)]
    struct Upper;

    impl SectionHooks for Upper {
        fn mask(&self, value: &[String]) -> Vec<MaskChar> {
            value.iter().map(MaskChar::value).collect()
        }

        fn substitute(&self, grapheme: &str) -> String {
            grapheme.to_uppercase()
        }

        fn auto_advance(&self, values: &MaskValues) -> bool {
            values.joined("code") == "GO"
        }
    }

    /// Pads the first section to two digits on normalization.
    #[derive(Debug)]
    struct PadFirst;

    impl MaskHooks for PadFirst {
        fn encode_validated_value(&self, values: &MaskValues) -> Option<String> {
            Some(format!("{}-{}-{}", values.joined("a"), values.joined("b"), values.joined("code")))
        }

        fn normalize_values(&self, values: &MaskValues) -> Option<MaskValues> {
            let mut out = values.clone();
            let a = values.joined("a");
            if a.len() == 1 {
                out.set_str("a", &format!("0{a}"));
            }
            Some(out)
        }
    }

    // sections: [0] a (2 digits, right), [1] "-" skip "-"/" ", [2] b (3 digits, right),
    // [3] ":" , [4] code (free text, left)
    fn definition() -> MaskDefinition {
        MaskDefinition::new(
            "test",
            vec![
                InputSection::new("a", Digits(2))
                    .with_alignment(Alignment::Right)
                    .with_max_length(2)
                    .into(),
                Section::fixed_with_skip_keys("-", ["-", " "]),
                InputSection::new("b", Digits(3))
                    .with_alignment(Alignment::Right)
                    .with_max_length(3)
                    .into(),
                Section::fixed(":"),
                InputSection::new("code", Upper).into(),
            ],
            ConcatValues::new(["a", "b", "code"]),
        )
    }

    fn state(a: &str, b: &str, code: &str) -> MaskState {
        MaskState::from_strings([("a", a), ("b", b), ("code", code)])
    }

    fn at(state: MaskState, caret: (usize, usize), selection_end: (usize, usize)) -> MaskState {
        state.with_caret(
            SpaceCoord::new(caret.0, caret.1),
            Some(SpaceCoord::new(selection_end.0, selection_end.1)),
        )
    }

    fn run(ops: &[PatchOperation], state: &MaskState) -> BatchOutcome {
        apply_patch_operations(ops, state, &definition(), None)
    }

    fn c(section: usize, position: usize) -> SpaceCoord {
        SpaceCoord::new(section, position)
    }

    // ------------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------------

    #[test]
    fn character_moves_cross_section_boundaries() {
        let s = at(state("12", "3", ""), (0, 2), (0, 2));
        let out = run(&[PatchOperation::move_cursor(Direction::Right, MoveLevel::Character)], &s);
        assert_eq!(out.state.caret, c(1, 0));
        assert_eq!(out.state.selection_end, c(1, 0));

        let out = run(&[PatchOperation::move_cursor(Direction::Left, MoveLevel::Character)], &out.state);
        assert_eq!(out.state.caret, c(0, 2));
    }

    #[test]
    fn character_move_stops_at_ends() {
        let s = state("1", "", "");
        let out = run(&[PatchOperation::move_cursor(Direction::Left, MoveLevel::Character)], &s);
        assert_eq!(out.state.caret, c(0, 0));
        assert!(!out.mutated);
    }

    #[test]
    fn section_moves_jump_to_neighbors() {
        let s = at(state("12", "345", "x"), (1, 1), (1, 1));
        let out = run(&[PatchOperation::move_cursor(Direction::Left, MoveLevel::Section)], &s);
        assert_eq!(out.state.caret, c(0, 2));
        let out = run(&[PatchOperation::move_cursor(Direction::Right, MoveLevel::Section)], &s);
        assert_eq!(out.state.caret, c(2, 0));
    }

    #[test]
    fn section_move_with_selection_stops_at_own_edge_first() {
        let s = at(state("12", "345", "x"), (1, 1), (1, 1));
        let extend_left = PatchOperation::MoveCursor {
            direction: Direction::Left,
            level: MoveLevel::Section,
            keep_selection_end: true,
        };
        let out = run(&[extend_left.clone()], &s);
        assert_eq!(out.state.caret, c(1, 0));
        assert_eq!(out.state.selection_end, c(1, 1));

        let out = run(&[extend_left], &out.state);
        assert_eq!(out.state.caret, c(0, 2));
        assert_eq!(out.state.selection_end, c(1, 1));
    }

    #[test]
    fn section_move_without_neighbor_goes_to_own_edge() {
        let s = at(state("12", "345", "xy"), (2, 1), (2, 1));
        let out = run(&[PatchOperation::move_cursor(Direction::Right, MoveLevel::Section)], &s);
        assert_eq!(out.state.caret, c(2, 2));
    }

    #[test]
    fn line_moves_reach_value_space_ends() {
        let s = at(state("12", "345", "xy"), (1, 1), (1, 1));
        let out = run(&[PatchOperation::move_cursor(Direction::Right, MoveLevel::Line)], &s);
        assert_eq!(out.state.caret, c(2, 2));
        let out = run(&[PatchOperation::move_cursor(Direction::Left, MoveLevel::Line)], &s);
        assert_eq!(out.state.caret, c(0, 0));
    }

    #[test]
    fn move_from_unknown_caret_is_noop() {
        let s = at(state("12", "", ""), (0, 9), (0, 9));
        let derived = derive_state(&s, &definition());
        let next = apply_patch_operation(
            &PatchOperation::move_cursor(Direction::Left, MoveLevel::Character),
            &s,
            &derived,
            &definition(),
        );
        assert_eq!(next, s);
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    #[test]
    fn select_next_section_selects_whole_neighbor() {
        let s = at(state("12", "345", ""), (0, 1), (0, 1));
        let out = run(&[PatchOperation::SelectNextSection { direction: Direction::Right }], &s);
        assert_eq!(out.state.caret, c(1, 3));
        assert_eq!(out.state.selection_end, c(1, 0));

        let out = run(&[PatchOperation::SelectNextSection { direction: Direction::Left }], &s);
        assert_eq!(out.state, s);
    }

    #[test]
    fn select_all_spans_value_space() {
        let out = run(&[PatchOperation::SelectAll], &state("12", "3", "ab"));
        assert_eq!(out.state.caret, c(2, 2));
        assert_eq!(out.state.selection_end, c(0, 0));
    }

    #[test]
    fn clear_selection_collapses_to_edges() {
        let s = at(state("12", "345", ""), (1, 2), (0, 1));
        let left = run(&[PatchOperation::ClearSelection { direction: Direction::Left }], &s);
        assert_eq!((left.state.caret, left.state.selection_end), (c(0, 1), c(0, 1)));
        let right = run(&[PatchOperation::ClearSelection { direction: Direction::Right }], &s);
        assert_eq!((right.state.caret, right.state.selection_end), (c(1, 2), c(1, 2)));
    }

    #[test]
    fn set_selection_out_of_range_is_clamped() {
        let s = state("12", "", "");
        let out = run(
            &[PatchOperation::SetSelection {
                caret: c(0, 7),
                selection_end: c(9, 9),
            }],
            &s,
        );
        assert_eq!(out.state.caret, c(0, 2));
        assert_eq!(out.state.selection_end, c(2, 0));
        assert!(out.derived.value_space.contains(&out.state.caret));
    }

    // ------------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------------

    #[test]
    fn delete_selection_within_one_section() {
        let s = at(state("12", "345", "abcd"), (2, 3), (2, 1));
        let out = run(&[PatchOperation::DeleteSelection], &s);
        assert_eq!(out.state.values.joined("code"), "ad");
        assert_eq!(out.state.caret, c(2, 1));
        assert!(out.mutated);
    }

    #[test]
    fn delete_selection_across_sections() {
        let s = at(state("12", "345", "abcd"), (0, 1), (2, 2));
        let out = run(&[PatchOperation::DeleteSelection], &s);
        assert_eq!(out.state.values.joined("a"), "1");
        assert_eq!(out.state.values.joined("b"), "");
        assert_eq!(out.state.values.joined("code"), "cd");
        assert_eq!(out.state.caret, c(0, 1));
        assert_eq!(out.state.selection_end, c(0, 1));
    }

    #[test]
    fn delete_selection_without_selection_is_noop() {
        let s = at(state("12", "", ""), (0, 1), (0, 1));
        let out = run(&[PatchOperation::DeleteSelection], &s);
        assert_eq!(out.state, s);
    }

    #[test]
    fn delete_backwards_inside_section() {
        let s = at(state("12", "345", ""), (1, 2), (1, 2));
        let out = run(&[PatchOperation::DeleteBackwards], &s);
        assert_eq!(out.state.values.joined("b"), "35");
        assert_eq!(out.state.caret, c(1, 1));
    }

    #[test]
    fn delete_backwards_crosses_into_previous_section() {
        let s = at(state("12", "345", ""), (1, 0), (1, 0));
        let out = run(&[PatchOperation::DeleteBackwards], &s);
        assert_eq!(out.state.values.joined("a"), "1");
        assert_eq!(out.state.values.joined("b"), "345");
        assert_eq!(out.state.caret, c(0, 1));
    }

    #[test]
    fn delete_backwards_into_empty_section_only_moves() {
        let s = at(state("", "345", ""), (1, 0), (1, 0));
        let out = run(&[PatchOperation::DeleteBackwards], &s);
        assert_eq!(out.state.values.joined("b"), "345");
        assert_eq!(out.state.caret, c(0, 0));
    }

    #[test]
    fn delete_backwards_at_origin_is_noop() {
        let s = state("12", "", "");
        let out = run(&[PatchOperation::DeleteBackwards], &s);
        assert_eq!(out.state, s);
    }

    #[test]
    fn delete_forwards_inside_and_across() {
        let s = at(state("12", "345", ""), (0, 0), (0, 0));
        let out = run(&[PatchOperation::DeleteForwards], &s);
        assert_eq!(out.state.values.joined("a"), "2");
        assert_eq!(out.state.caret, c(0, 0));

        let s = at(state("12", "345", ""), (0, 2), (0, 2));
        let out = run(&[PatchOperation::DeleteForwards], &s);
        assert_eq!(out.state.values.joined("b"), "45");
        assert_eq!(out.state.caret, c(1, 0));

        let s = at(state("12", "345", "x"), (2, 1), (2, 1));
        let out = run(&[PatchOperation::DeleteForwards], &s);
        assert_eq!(out.state, s);
    }

    // ------------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------------

    #[test]
    fn insert_advances_when_section_fills() {
        let s = state("", "", "");
        let out = run(&[PatchOperation::insert("1"), PatchOperation::insert("2")], &s);
        assert_eq!(out.state.values.joined("a"), "12");
        assert_eq!(out.state.caret, c(1, 0));
        assert!(out.mutated);
    }

    #[test]
    fn insert_rejects_filtered_and_full() {
        let s = state("", "", "");
        let out = run(&[PatchOperation::insert("x")], &s);
        assert_eq!(out.state, s);

        let full = at(state("12", "", ""), (0, 1), (0, 1));
        let out = run(&[PatchOperation::insert("3")], &full);
        assert_eq!(out.state.values.joined("a"), "12");
    }

    #[test]
    fn replace_overwrites_at_caret() {
        let s = at(state("12", "", ""), (0, 0), (0, 0));
        let out = run(
            &[PatchOperation::InsertCharacter {
                character: "9".into(),
                input_behavior: Some(InputBehavior::Replace),
            }],
            &s,
        );
        assert_eq!(out.state.values.joined("a"), "92");
        assert_eq!(out.state.caret, c(0, 1));
    }

    #[test]
    fn skip_key_jumps_without_inserting() {
        let s = at(state("1", "", ""), (0, 1), (0, 1));
        let out = run(&[PatchOperation::insert("-")], &s);
        assert_eq!(out.state.values.joined("a"), "1");
        assert_eq!(out.state.caret, c(1, 0));
    }

    #[test]
    fn insert_accepts_exactly_one_grapheme() {
        let s = at(state("", "", "x"), (2, 1), (2, 1));
        let out = run(&[PatchOperation::insert("ab")], &s);
        assert_eq!(out.state, s);

        let out = run(&[PatchOperation::insert("")], &s);
        assert_eq!(out.state, s);

        let out = run(&[PatchOperation::insert("e\u{301}")], &s);
        assert_eq!(out.state.values.get("code"), ["X".to_owned(), "E\u{301}".to_owned()]);
        assert_eq!(out.state.caret, c(2, 2));
    }

    #[test]
    fn substitution_and_auto_advance_hooks() {
        let definition = MaskDefinition::new(
            "code",
            vec![
                InputSection::new("code", Upper).into(),
                Section::fixed("/"),
                InputSection::new("rest", PlainText).into(),
            ],
            ConcatValues::new(["code", "rest"]),
        );
        let s = MaskState::from_strings([("code", ""), ("rest", "")]);
        let out = apply_patch_operations(
            &[PatchOperation::insert("g"), PatchOperation::insert("o")],
            &s,
            &definition,
            None,
        );
        assert_eq!(out.state.values.joined("code"), "GO");
        assert_eq!(out.state.caret, c(1, 0));
    }

    // ------------------------------------------------------------------------
    // Spin, normalization, values
    // ------------------------------------------------------------------------

    #[test]
    fn spin_delegates_and_moves_caret_to_section_end() {
        let s = at(state("9", "", ""), (0, 0), (0, 0));
        let out = run(&[PatchOperation::spin(SpinDirection::Up)], &s);
        assert_eq!(out.state.values.joined("a"), "10");
        assert_eq!(out.state.caret, c(0, 2));
        assert!(out.mutated);

        let shifted = PatchOperation::Spin {
            direction: SpinDirection::Down,
            modifiers: SpinModifiers::SHIFT,
        };
        let out = run(&[shifted], &out.state);
        assert_eq!(out.state.values.joined("a"), "0");
    }

    /// Spins by appending a digit, ignoring any length limit.
    #[derive(Debug)]
    struct Append;

    impl SectionHooks for Append {
        fn mask(&self, value: &[String]) -> Vec<MaskChar> {
            value.iter().map(MaskChar::value).collect()
        }

        fn spin(&self, request: &SpinRequest<'_>) -> Option<MaskValues> {
            let next = format!("{}9", request.values.joined(request.slug));
            Some(request.values.clone().with_str(request.slug, &next))
        }
    }

    #[test]
    fn spin_past_max_length_is_rejected() {
        let definition = MaskDefinition::new(
            "grow",
            vec![InputSection::new("n", Append).with_max_length(2).into()],
            ConcatValues::new(["n"]),
        );
        let s = MaskState::from_strings([("n", "9")]).with_caret(c(0, 1), None);
        let out = apply_patch_operations(&[PatchOperation::spin(SpinDirection::Up)], &s, &definition, None);
        assert_eq!(out.state.values.joined("n"), "99");

        let again = apply_patch_operations(&[PatchOperation::spin(SpinDirection::Up)], &out.state, &definition, None);
        assert_eq!(again.state.values.joined("n"), "99");
        assert_eq!(again.state.caret, c(0, 2));
    }

    #[test]
    fn spin_without_hook_is_noop() {
        let s = at(state("", "", "ab"), (2, 1), (2, 1));
        let out = run(&[PatchOperation::spin(SpinDirection::Up)], &s);
        assert_eq!(out.state, s);
    }

    #[test]
    fn normalization_runs_when_caret_changes_section() {
        let definition = MaskDefinition::new(
            "norm",
            definition().sections().to_vec(),
            PadFirst,
        );
        let s = state("", "", "");
        let out = apply_patch_operations(
            &[PatchOperation::insert("7"), PatchOperation::insert("-")],
            &s,
            &definition,
            None,
        );
        assert_eq!(out.state.values.joined("a"), "07");
        assert_eq!(out.state.caret, c(1, 0));
    }

    #[test]
    fn set_cursor_position_normalizes_on_section_change() {
        let definition = MaskDefinition::new("norm", definition().sections().to_vec(), PadFirst);
        let s = at(state("5", "", ""), (0, 1), (0, 1));
        let derived = derive_state(&s, &definition);
        let next = apply_patch_operation(
            &PatchOperation::SetCursorPosition {
                caret: c(2, 0),
                keep_selection_end: false,
                rerender: false,
            },
            &s,
            &derived,
            &definition,
        );
        assert_eq!(next.values.joined("a"), "05");
        assert_eq!(next.selection_end, c(2, 0));
    }

    #[test]
    fn set_values_replaces_and_clamps() {
        let s = at(state("12", "345", "abc"), (2, 3), (2, 3));
        let out = run(
            &[PatchOperation::SetValues {
                values: MaskValues::from_strings([("a", "1"), ("b", ""), ("code", "z")]),
            }],
            &s,
        );
        assert_eq!(out.state.values.joined("code"), "z");
        assert_eq!(out.state.caret, c(2, 1));
        assert!(!out.mutated);
    }

    #[test]
    fn unsupported_operation_ends_batch() {
        let s = state("", "", "");
        let out = run(
            &[
                PatchOperation::insert("1"),
                PatchOperation::Unsupported,
                PatchOperation::insert("2"),
            ],
            &s,
        );
        assert_eq!(out.state.values.joined("a"), "1");
        assert!(out.mutated);
    }

    #[test]
    fn supplied_derived_state_is_used() {
        let s = state("1", "", "");
        let derived = derive_state(&s, &definition());
        let out = apply_patch_operations(&[], &s, &definition(), Some(&derived));
        assert_eq!(out.derived, derived);
        assert!(!out.mutated);
    }
}
