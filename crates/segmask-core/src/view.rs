#![forbid(unsafe_code)]

//! Render model for hosts that draw a mask.
//!
//! [`render`] flattens a state and its derived state into per-section views.
//! Hosts place the caret and selection using cell-boundary indices and map
//! clicks back to value positions through [`CellView`].

use crate::coord::{SpaceCoord, ordered};
use crate::derive::{MaskDerivedState, SectionState};
use crate::section::MaskCharKind;
use crate::state::MaskState;

/// One rendered cell of an input section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    /// Grapheme to draw.
    pub text: String,
    /// Padding or typed content.
    pub kind: MaskCharKind,
    /// Value position of the boundary left of this cell (typed cells only).
    pub value_pos_left: Option<usize>,
    /// Value position of the boundary right of this cell (typed cells only).
    pub value_pos_right: Option<usize>,
}

/// View of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionView {
    /// A literal.
    Fixed {
        /// Display index.
        index: usize,
        /// Literal text.
        text: String,
        /// Lies strictly inside the selection.
        selected: bool,
        /// The whole value failed semantic validation.
        semantic_error: bool,
    },
    /// An editable section.
    Input {
        /// Display index.
        index: usize,
        /// Holds the caret.
        active: bool,
        /// The whole value failed semantic validation.
        semantic_error: bool,
        /// This section failed syntactic validation.
        syntax_error: bool,
        /// Rendered cells; never empty.
        cells: Vec<CellView>,
        /// Cell boundary of the caret, if it is in this section.
        caret_at: Option<usize>,
        /// Cell boundary of the selection end, if the selection is non-empty
        /// and ends in this section.
        selection_end_at: Option<usize>,
    },
}

impl SectionView {
    /// Display index.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Fixed { index, .. } | Self::Input { index, .. } => *index,
        }
    }
}

/// View of a whole mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskView {
    /// Sections in display order.
    pub sections: Vec<SectionView>,
}

impl MaskView {
    /// The text a host would draw, blank cells included.
    #[must_use]
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(|section| match section {
                SectionView::Fixed { text, .. } => text.clone(),
                SectionView::Input { cells, .. } => cells.iter().map(|c| c.text.as_str()).collect(),
            })
            .collect()
    }

    /// Display index of the active input section.
    #[must_use]
    pub fn active_section(&self) -> Option<usize> {
        self.sections.iter().find_map(|section| match section {
            SectionView::Input {
                index, active: true, ..
            } => Some(*index),
            _ => None,
        })
    }
}

fn blank_cell() -> CellView {
    CellView {
        text: " ".to_owned(),
        kind: MaskCharKind::Mask,
        value_pos_left: None,
        value_pos_right: None,
    }
}

fn position_in(coord: Option<SpaceCoord>, index: usize) -> Option<usize> {
    coord.filter(|c| c.section == index).map(|c| c.position)
}

/// Build the view of `state`.
#[must_use]
pub fn render(state: &MaskState, derived: &MaskDerivedState) -> MaskView {
    let caret = derived.caret_display;
    let selection_end = if state.has_selection() {
        derived.display_of(state.selection_end)
    } else {
        None
    };
    let semantic_error = !derived.is_semantically_valid();

    let selected_range = match (caret, selection_end) {
        (Some(a), Some(b)) => Some(ordered(a, b)),
        _ => None,
    };

    let sections = derived
        .sections
        .iter()
        .map(|section| match section {
            SectionState::Fixed(fixed) => SectionView::Fixed {
                index: fixed.index,
                text: fixed.text.clone(),
                selected: selected_range
                    .is_some_and(|(lo, hi)| lo.section < fixed.index && fixed.index < hi.section),
                semantic_error,
            },
            SectionState::Input(input) => {
                let mut value_pos = 0;
                let mut cells: Vec<CellView> = input
                    .mask_chars
                    .iter()
                    .map(|mask_char| {
                        let (left, right) = if mask_char.is_value() {
                            value_pos += 1;
                            (Some(value_pos - 1), Some(value_pos))
                        } else {
                            (None, None)
                        };
                        CellView {
                            text: mask_char.ch.clone(),
                            kind: mask_char.kind,
                            value_pos_left: left,
                            value_pos_right: right,
                        }
                    })
                    .collect();
                if cells.is_empty() {
                    cells.push(blank_cell());
                }

                SectionView::Input {
                    index: input.index,
                    active: caret.is_some_and(|c| c.section == input.index),
                    semantic_error,
                    syntax_error: input.syntactic_validation == Some(false),
                    cells,
                    caret_at: position_in(caret, input.index),
                    selection_end_at: position_in(selection_end, input.index),
                }
            }
        })
        .collect();

    MaskView { sections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ConcatValues, MaskDefinition};
    use crate::derive::derive_state;
    use crate::section::{InputSection, MaskChar, PlainText, Section, SectionHooks};

    #[derive(Debug)]
    struct TwoDigits;

    impl SectionHooks for TwoDigits {
        fn mask(&self, value: &[String]) -> Vec<MaskChar> {
            let mut out: Vec<MaskChar> = (value.len()..2).map(|_| MaskChar::mask("_")).collect();
            out.extend(value.iter().map(MaskChar::value));
            out
        }

        fn syntactic_validation(&self, value: &str) -> Option<bool> {
            Some(value.chars().all(|c| c.is_ascii_digit()))
        }
    }

    fn definition() -> MaskDefinition {
        MaskDefinition::new(
            "view",
            vec![
                InputSection::new("h", TwoDigits).into(),
                Section::fixed(":"),
                InputSection::new("m", TwoDigits).into(),
                Section::fixed(" "),
                InputSection::new("note", PlainText).into(),
            ],
            ConcatValues::new(["h", "m", "note"]),
        )
    }

    fn view(state: &MaskState) -> MaskView {
        render(state, &derive_state(state, &definition()))
    }

    #[test]
    fn cells_carry_value_positions() {
        let state = MaskState::from_strings([("h", "7"), ("m", ""), ("note", "")]);
        let view = view(&state);
        let SectionView::Input { cells, .. } = &view.sections[0] else {
            panic!("expected input section");
        };
        assert_eq!(cells[0].kind, MaskCharKind::Mask);
        assert_eq!(cells[0].value_pos_left, None);
        assert_eq!(cells[1].text, "7");
        assert_eq!((cells[1].value_pos_left, cells[1].value_pos_right), (Some(0), Some(1)));
    }

    #[test]
    fn empty_section_renders_one_blank_cell() {
        let state = MaskState::from_strings([("h", ""), ("m", ""), ("note", "")]);
        let view = view(&state);
        let SectionView::Input { cells, .. } = &view.sections[4] else {
            panic!("expected input section");
        };
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].text, " ");
        assert_eq!(view.text(), "__:__  ");
    }

    #[test]
    fn caret_marks_active_section_without_selection_end() {
        let state = MaskState::from_strings([("h", "12"), ("m", "3"), ("note", "")])
            .with_caret(SpaceCoord::new(1, 1), None);
        let view = view(&state);
        assert_eq!(view.active_section(), Some(2));
        let SectionView::Input {
            caret_at,
            selection_end_at,
            ..
        } = &view.sections[2]
        else {
            panic!("expected input section");
        };
        assert_eq!(*caret_at, Some(2));
        assert_eq!(*selection_end_at, None);
    }

    #[test]
    fn selection_marks_fixed_sections_inside() {
        let state = MaskState::from_strings([("h", "12"), ("m", "34"), ("note", "x")])
            .with_caret(SpaceCoord::new(2, 1), Some(SpaceCoord::new(0, 0)));
        let view = view(&state);
        assert!(matches!(view.sections[1], SectionView::Fixed { selected: true, .. }));
        assert!(matches!(view.sections[3], SectionView::Fixed { selected: true, .. }));
        let SectionView::Input { selection_end_at, .. } = &view.sections[0] else {
            panic!("expected input section");
        };
        assert_eq!(*selection_end_at, Some(0));
    }

    #[test]
    fn syntax_errors_are_per_section() {
        let state = MaskState::from_strings([("h", "1a"), ("m", "34"), ("note", "")]);
        let view = view(&state);
        assert!(matches!(view.sections[0], SectionView::Input { syntax_error: true, .. }));
        assert!(matches!(view.sections[2], SectionView::Input { syntax_error: false, .. }));
        assert!(view.sections.iter().all(|s| matches!(
            s,
            SectionView::Fixed { semantic_error: false, .. } | SectionView::Input { semantic_error: false, .. }
        )));
    }
}
