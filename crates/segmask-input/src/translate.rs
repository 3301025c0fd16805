#![forbid(unsafe_code)]

//! Event translation.
//!
//! [`translate`] turns one [`InputEvent`] into the ordered patch operations
//! the engine should apply, plus whether the host must suppress its own
//! default handling of the event. Translation never mutates state.

use segmask_core::logging::trace;
use segmask_core::navigator::{find_closest_valid_value_space_coordinates, find_input_section};
use segmask_core::{
    Direction, InputBehavior, MaskDefinition, MaskDerivedState, MaskState, MoveLevel,
    PatchOperation, SpaceCoord, SpinDirection, SpinModifiers, derive_state, split_graphemes,
};

use crate::event::{InputEvent, KeyCode, KeyEvent, KeyEventKind, Modifiers, Platform, SelectionSnapshot};

/// Result of translating one event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Translation {
    /// Operations to apply, in order.
    pub operations: Vec<PatchOperation>,
    /// The host must not run its default action for the event.
    pub suppress_default: bool,
}

impl Translation {
    /// Nothing to do; the host keeps its default behavior.
    #[must_use]
    pub const fn ignored() -> Self {
        Self {
            operations: Vec::new(),
            suppress_default: false,
        }
    }

    /// Operations that replace the host's default behavior.
    #[must_use]
    pub const fn handled(operations: Vec<PatchOperation>) -> Self {
        Self {
            operations,
            suppress_default: true,
        }
    }

    /// Operations applied alongside the host's default behavior.
    #[must_use]
    pub const fn observed(operations: Vec<PatchOperation>) -> Self {
        Self {
            operations,
            suppress_default: false,
        }
    }

    /// Whether there is anything to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Translate `event` against the current state.
///
/// `derived` is reused when the caller already holds the derived state of
/// `state`; otherwise it is recomputed.
#[must_use]
pub fn translate(
    event: &InputEvent,
    state: &MaskState,
    definition: &MaskDefinition,
    derived: Option<&MaskDerivedState>,
    platform: Platform,
) -> Translation {
    let owned;
    let derived = match derived {
        Some(derived) => derived,
        None => {
            owned = derive_state(state, definition);
            &owned
        }
    };

    let translation = match event {
        InputEvent::Key(key) => translate_key(key, state, definition, derived, platform),
        InputEvent::Text { composing: true, .. } => Translation::ignored(),
        InputEvent::Text { data, .. } => Translation::handled(text_operations(data, state, None)),
        InputEvent::CompositionEnd { data } => {
            let behavior = state.has_selection().then_some(InputBehavior::Insert);
            Translation::handled(text_operations(data, state, behavior))
        }
        InputEvent::SelectionChange(snapshot) => translate_selection(snapshot, state, derived),
    };

    trace!(
        mask = definition.name(),
        operations = translation.operations.len(),
        suppress = translation.suppress_default,
        "translated input event"
    );
    translation
}

fn text_operations(data: &str, state: &MaskState, behavior: Option<InputBehavior>) -> Vec<PatchOperation> {
    let graphemes = split_graphemes(data);
    let mut operations = Vec::with_capacity(graphemes.len() + 1);
    if graphemes.is_empty() {
        return operations;
    }
    if state.has_selection() {
        operations.push(PatchOperation::DeleteSelection);
    }
    operations.extend(graphemes.into_iter().map(|character| PatchOperation::InsertCharacter {
        character,
        input_behavior: behavior,
    }));
    operations
}

// ============================================================================
// Keys
// ============================================================================

fn translate_key(
    key: &KeyEvent,
    state: &MaskState,
    definition: &MaskDefinition,
    derived: &MaskDerivedState,
    platform: Platform,
) -> Translation {
    if key.kind == KeyEventKind::Release {
        return Translation::ignored();
    }

    let selecting = key.shift();
    let has_selection = state.has_selection();

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            let direction = if key.code == KeyCode::BackTab || selecting {
                Direction::Left
            } else {
                Direction::Right
            };
            let target = derived
                .caret_display_index()
                .and_then(|index| find_input_section(derived, index, direction));
            match target {
                Some(_) => Translation::handled(vec![PatchOperation::SelectNextSection { direction }]),
                // Let focus leave the field.
                None => Translation::ignored(),
            }
        }
        KeyCode::Up | KeyCode::Down => {
            let direction = if key.code == KeyCode::Up {
                SpinDirection::Up
            } else {
                SpinDirection::Down
            };
            Translation::handled(vec![PatchOperation::Spin {
                direction,
                modifiers: spin_modifiers(key.modifiers),
            }])
        }
        KeyCode::Backspace | KeyCode::Delete => {
            let operation = match (has_selection, key.code) {
                (true, _) => PatchOperation::DeleteSelection,
                (false, KeyCode::Backspace) => PatchOperation::DeleteBackwards,
                (false, _) => PatchOperation::DeleteForwards,
            };
            Translation::handled(vec![operation])
        }
        KeyCode::Left | KeyCode::Right => {
            let direction = if key.code == KeyCode::Left {
                Direction::Left
            } else {
                Direction::Right
            };
            let mut operations = Vec::with_capacity(2);
            if has_selection && !selecting {
                operations.push(PatchOperation::ClearSelection { direction });
            }
            operations.push(PatchOperation::MoveCursor {
                direction,
                level: move_level(key.modifiers, platform),
                keep_selection_end: selecting,
            });
            Translation::handled(operations)
        }
        KeyCode::Home | KeyCode::End => {
            let direction = if key.code == KeyCode::Home {
                Direction::Left
            } else {
                Direction::Right
            };
            Translation::handled(vec![PatchOperation::MoveCursor {
                direction,
                level: MoveLevel::Line,
                keep_selection_end: selecting,
            }])
        }
        KeyCode::Char(_) if key.is_char('a') && key.modifiers.contains(platform.command_modifier()) => {
            Translation::handled(vec![PatchOperation::SelectAll])
        }
        KeyCode::Char(c) if key.text().is_some() => skip_to_section(c, definition, derived)
            .map_or_else(Translation::ignored, |caret| {
                Translation::handled(vec![PatchOperation::SetCursorPosition {
                    caret,
                    keep_selection_end: false,
                    rerender: false,
                }])
            }),
        _ => Translation::ignored(),
    }
}

fn spin_modifiers(modifiers: Modifiers) -> SpinModifiers {
    let mut mapped = SpinModifiers::NONE;
    if modifiers.contains(Modifiers::SUPER) {
        mapped |= SpinModifiers::META;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        mapped |= SpinModifiers::SHIFT;
    }
    if modifiers.contains(Modifiers::ALT) {
        mapped |= SpinModifiers::ALT;
    }
    mapped
}

fn move_level(modifiers: Modifiers, platform: Platform) -> MoveLevel {
    if platform.line_modifier().is_some_and(|m| modifiers.contains(m)) {
        MoveLevel::Line
    } else if modifiers.contains(platform.section_modifier()) {
        MoveLevel::Section
    } else {
        MoveLevel::Character
    }
}

/// Start of the input after the first fixed section beyond the caret that
/// lists `c` as a skip key.
fn skip_to_section(c: char, definition: &MaskDefinition, derived: &MaskDerivedState) -> Option<SpaceCoord> {
    let start = derived.caret_display_index()?;
    let mut key = [0u8; 4];
    let key: &str = c.encode_utf8(&mut key);

    let fixed_index = definition
        .sections()
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, section)| section.as_fixed().is_some_and(|fixed| fixed.is_skip_key(key)))
        .map(|(index, _)| index)?;

    find_input_section(derived, fixed_index, Direction::Right).map(|input| input.first_value_coord())
}

// ============================================================================
// Selection
// ============================================================================

/// Map a display-space endpoint to value space. The flag is `true` when the
/// endpoint already sat on a value boundary.
fn to_value_space(derived: &MaskDerivedState, coord: SpaceCoord) -> Option<(SpaceCoord, bool)> {
    match derived.display_to_value.get(&coord) {
        Some(value) => Some((*value, true)),
        None => find_closest_valid_value_space_coordinates(derived, coord).map(|value| (value, false)),
    }
}

fn translate_selection(
    snapshot: &SelectionSnapshot,
    state: &MaskState,
    derived: &MaskDerivedState,
) -> Translation {
    let (Some((caret, caret_exact)), Some((selection_end, end_exact))) = (
        to_value_space(derived, snapshot.focus),
        to_value_space(derived, snapshot.anchor),
    ) else {
        return Translation::ignored();
    };

    let unchanged = caret == state.caret && selection_end == state.selection_end;
    if unchanged && caret_exact && end_exact {
        return Translation::ignored();
    }
    Translation::observed(vec![PatchOperation::SetSelection { caret, selection_end }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmask_core::{ConcatValues, InputSection, PlainText, Section};

    fn mask() -> MaskDefinition {
        MaskDefinition::new(
            "pair",
            vec![
                InputSection::new("a", PlainText::default()).into(),
                Section::fixed_with_skip_keys("-", ["-"]),
                InputSection::new("b", PlainText::default()).into(),
            ],
            ConcatValues::new(["a", "b"]),
        )
    }

    fn key(code: KeyCode, modifiers: Modifiers) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code).with_modifiers(modifiers))
    }

    fn run(event: &InputEvent, state: &MaskState, platform: Platform) -> Translation {
        translate(event, state, &mask(), None, platform)
    }

    fn filled() -> MaskState {
        MaskState::from_strings([("a", "12"), ("b", "34")])
    }

    #[test]
    fn arrows_pick_level_by_platform() {
        let state = filled().with_caret(SpaceCoord::new(0, 1), None);
        let section = |platform, modifiers| match run(&key(KeyCode::Right, modifiers), &state, platform)
            .operations
            .as_slice()
        {
            [PatchOperation::MoveCursor { level, .. }] => *level,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(section(Platform::Other, Modifiers::NONE), MoveLevel::Character);
        assert_eq!(section(Platform::Other, Modifiers::CTRL), MoveLevel::Section);
        assert_eq!(section(Platform::Other, Modifiers::ALT), MoveLevel::Character);
        assert_eq!(section(Platform::Other, Modifiers::SUPER), MoveLevel::Character);
        assert_eq!(section(Platform::Mac, Modifiers::ALT), MoveLevel::Section);
        assert_eq!(section(Platform::Mac, Modifiers::SUPER), MoveLevel::Line);
        assert_eq!(section(Platform::Mac, Modifiers::CTRL), MoveLevel::Character);
    }

    #[test]
    fn arrows_clear_selection_unless_shifted() {
        let state = filled().with_caret(SpaceCoord::new(0, 2), Some(SpaceCoord::new(0, 0)));
        let plain = run(&key(KeyCode::Left, Modifiers::NONE), &state, Platform::Other);
        assert_eq!(
            plain.operations,
            vec![
                PatchOperation::ClearSelection { direction: Direction::Left },
                PatchOperation::MoveCursor {
                    direction: Direction::Left,
                    level: MoveLevel::Character,
                    keep_selection_end: false,
                },
            ]
        );
        assert!(plain.suppress_default);

        let shifted = run(&key(KeyCode::Left, Modifiers::SHIFT), &state, Platform::Other);
        assert_eq!(
            shifted.operations,
            vec![PatchOperation::MoveCursor {
                direction: Direction::Left,
                level: MoveLevel::Character,
                keep_selection_end: true,
            }]
        );
    }

    #[test]
    fn deletion_depends_on_selection() {
        let collapsed = filled().with_caret(SpaceCoord::new(0, 1), None);
        let selected = filled().with_caret(SpaceCoord::new(0, 2), Some(SpaceCoord::new(0, 0)));
        let ops = |code, state: &MaskState| run(&key(code, Modifiers::NONE), state, Platform::Other).operations;

        assert_eq!(ops(KeyCode::Backspace, &collapsed), vec![PatchOperation::DeleteBackwards]);
        assert_eq!(ops(KeyCode::Delete, &collapsed), vec![PatchOperation::DeleteForwards]);
        assert_eq!(ops(KeyCode::Backspace, &selected), vec![PatchOperation::DeleteSelection]);
        assert_eq!(ops(KeyCode::Delete, &selected), vec![PatchOperation::DeleteSelection]);
    }

    #[test]
    fn spin_carries_modifiers() {
        let state = filled();
        let translation = run(&key(KeyCode::Down, Modifiers::SHIFT | Modifiers::SUPER), &state, Platform::Mac);
        assert_eq!(
            translation.operations,
            vec![PatchOperation::Spin {
                direction: SpinDirection::Down,
                modifiers: SpinModifiers::SHIFT | SpinModifiers::META,
            }]
        );
    }

    #[test]
    fn tab_selects_neighbors_or_lets_focus_leave() {
        let first = filled().with_caret(SpaceCoord::new(0, 1), None);
        let last = filled().with_caret(SpaceCoord::new(1, 1), None);

        let forward = run(&key(KeyCode::Tab, Modifiers::NONE), &first, Platform::Other);
        assert_eq!(
            forward.operations,
            vec![PatchOperation::SelectNextSection { direction: Direction::Right }]
        );
        assert!(forward.suppress_default);

        assert_eq!(run(&key(KeyCode::Tab, Modifiers::NONE), &last, Platform::Other), Translation::ignored());
        assert_eq!(run(&key(KeyCode::BackTab, Modifiers::NONE), &first, Platform::Other), Translation::ignored());
        assert_eq!(
            run(&key(KeyCode::Tab, Modifiers::SHIFT), &last, Platform::Other).operations,
            vec![PatchOperation::SelectNextSection { direction: Direction::Left }]
        );
    }

    #[test]
    fn select_all_uses_the_command_key() {
        let state = filled();
        let ctrl_a = key(KeyCode::Char('a'), Modifiers::CTRL);
        let cmd_a = key(KeyCode::Char('a'), Modifiers::SUPER);
        assert_eq!(run(&ctrl_a, &state, Platform::Other).operations, vec![PatchOperation::SelectAll]);
        assert_eq!(run(&cmd_a, &state, Platform::Mac).operations, vec![PatchOperation::SelectAll]);
        assert_eq!(run(&cmd_a, &state, Platform::Other), Translation::ignored());
    }

    #[test]
    fn skip_key_jumps_past_the_separator() {
        let state = filled().with_caret(SpaceCoord::new(0, 1), None);
        let translation = run(&key(KeyCode::Char('-'), Modifiers::NONE), &state, Platform::Other);
        assert_eq!(
            translation.operations,
            vec![PatchOperation::SetCursorPosition {
                caret: SpaceCoord::new(1, 0),
                keep_selection_end: false,
                rerender: false,
            }]
        );

        let in_last = filled().with_caret(SpaceCoord::new(1, 0), None);
        assert_eq!(run(&key(KeyCode::Char('-'), Modifiers::NONE), &in_last, Platform::Other), Translation::ignored());
        assert_eq!(run(&key(KeyCode::Char('7'), Modifiers::NONE), &state, Platform::Other), Translation::ignored());
    }

    #[test]
    fn releases_are_ignored() {
        let release = InputEvent::Key(KeyEvent::new(KeyCode::Backspace).with_kind(KeyEventKind::Release));
        assert_eq!(run(&release, &filled(), Platform::Other), Translation::ignored());
    }

    #[test]
    fn text_replaces_the_selection() {
        let selected = filled().with_caret(SpaceCoord::new(0, 2), Some(SpaceCoord::new(0, 0)));
        let text = InputEvent::Text {
            data: "9é".to_owned(),
            composing: false,
        };
        assert_eq!(
            run(&text, &selected, Platform::Other).operations,
            vec![
                PatchOperation::DeleteSelection,
                PatchOperation::insert("9"),
                PatchOperation::insert("é"),
            ]
        );

        let composing = InputEvent::Text {
            data: "k".to_owned(),
            composing: true,
        };
        assert_eq!(run(&composing, &selected, Platform::Other), Translation::ignored());
    }

    #[test]
    fn composition_end_inserts_over_a_selection() {
        let selected = filled().with_caret(SpaceCoord::new(0, 2), Some(SpaceCoord::new(0, 0)));
        let event = InputEvent::CompositionEnd { data: "ä".to_owned() };
        assert_eq!(
            run(&event, &selected, Platform::Other).operations,
            vec![
                PatchOperation::DeleteSelection,
                PatchOperation::InsertCharacter {
                    character: "ä".to_owned(),
                    input_behavior: Some(InputBehavior::Insert),
                },
            ]
        );

        let collapsed = filled();
        assert_eq!(
            run(&event, &collapsed, Platform::Other).operations,
            vec![PatchOperation::insert("ä")]
        );
    }

    #[test]
    fn selection_change_maps_display_to_value_space() {
        let state = filled().with_caret(SpaceCoord::new(0, 0), None);

        // Display section 2 is input "b"; cell boundary 1 is value 1:1.
        let moved = InputEvent::SelectionChange(SelectionSnapshot::collapsed(SpaceCoord::new(2, 1)));
        let translation = run(&moved, &state, Platform::Other);
        assert_eq!(
            translation.operations,
            vec![PatchOperation::SetSelection {
                caret: SpaceCoord::new(1, 1),
                selection_end: SpaceCoord::new(1, 1),
            }]
        );
        assert!(!translation.suppress_default);

        let same = InputEvent::SelectionChange(SelectionSnapshot::collapsed(SpaceCoord::new(0, 0)));
        assert_eq!(run(&same, &state, Platform::Other), Translation::ignored());
    }

    #[test]
    fn selection_inside_a_separator_snaps_back() {
        let state = filled().with_caret(SpaceCoord::new(0, 2), None);
        // Display 1:1 sits after the "-" literal; it snaps to the end of "a".
        let inside = InputEvent::SelectionChange(SelectionSnapshot::collapsed(SpaceCoord::new(1, 1)));
        assert_eq!(
            run(&inside, &state, Platform::Other).operations,
            vec![PatchOperation::SetSelection {
                caret: SpaceCoord::new(0, 2),
                selection_end: SpaceCoord::new(0, 2),
            }]
        );
    }
}
