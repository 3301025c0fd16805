#![forbid(unsafe_code)]

//! Directional search over sections and coordinate repair.

use crate::coord::SpaceCoord;
use crate::derive::{InputSectionState, MaskDerivedState, SectionState};
use crate::ops::Direction;
use crate::section::{Alignment, SectionKind};

/// A directional section search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionQuery {
    /// Display index to search from.
    pub start: usize,
    /// Search direction.
    pub direction: Direction,
    /// Only match this kind.
    pub kind: Option<SectionKind>,
    /// Only match input sections with this alignment.
    pub alignment: Option<Alignment>,
    /// Consider `start` itself.
    pub include_start: bool,
}

impl SectionQuery {
    /// Search for the nearest input section strictly beyond `start`.
    #[must_use]
    pub const fn input(start: usize, direction: Direction) -> Self {
        Self {
            start,
            direction,
            kind: Some(SectionKind::Input),
            alignment: None,
            include_start: false,
        }
    }

    /// Also consider `start` itself.
    #[must_use]
    pub const fn including_start(mut self) -> Self {
        self.include_start = true;
        self
    }

    /// Only match input sections with `alignment`.
    #[must_use]
    pub const fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    fn matches(&self, section: &SectionState) -> bool {
        let kind_ok = self.kind.is_none_or(|kind| section.kind() == kind);
        let alignment_ok = self.alignment.is_none_or(|alignment| {
            section.as_input().is_some_and(|input| input.alignment == alignment)
        });
        kind_ok && alignment_ok
    }
}

/// First section matching `query`, or `None` if the scan runs off either end.
#[must_use]
pub fn find_section<'a>(derived: &'a MaskDerivedState, query: &SectionQuery) -> Option<&'a SectionState> {
    let sections = &derived.sections;
    if query.start >= sections.len() {
        return None;
    }

    match query.direction {
        Direction::Right => {
            let first = query.start + usize::from(!query.include_start);
            sections.get(first..)?.iter().find(|s| query.matches(s))
        }
        Direction::Left => {
            let first = if query.include_start {
                query.start
            } else {
                query.start.checked_sub(1)?
            };
            sections[..=first].iter().rev().find(|s| query.matches(s))
        }
    }
}

/// Nearest input section beyond display index `start`.
#[must_use]
pub fn find_input_section(
    derived: &MaskDerivedState,
    start: usize,
    direction: Direction,
) -> Option<&InputSectionState> {
    find_section(derived, &SectionQuery::input(start, direction)).and_then(SectionState::as_input)
}

/// Snap a coordinate addressed by display section index to a value boundary.
///
/// For an input section, the value boundary nearest to `coord.position`
/// (first one wins on ties). For a fixed section, the end of the nearest
/// input section to the left, else the start of the nearest to the right.
#[must_use]
pub fn find_closest_valid_value_space_coordinates(
    derived: &MaskDerivedState,
    coord: SpaceCoord,
) -> Option<SpaceCoord> {
    match derived.sections.get(coord.section)? {
        SectionState::Input(input) => input
            .value_space
            .iter()
            .copied()
            .min_by_key(|candidate| candidate.position.abs_diff(coord.position)),
        SectionState::Fixed(_) => {
            let left = SectionQuery::input(coord.section, Direction::Left).including_start();
            let right = SectionQuery::input(coord.section, Direction::Right).including_start();

            find_section(derived, &left)
                .and_then(SectionState::as_input)
                .map(InputSectionState::last_value_coord)
                .or_else(|| {
                    find_section(derived, &right)
                        .and_then(SectionState::as_input)
                        .map(InputSectionState::first_value_coord)
                })
        }
    }
}

/// Repair a value-space coordinate so it is a member of the value space.
///
/// The value index is clamped to the last input section and the position to
/// that section's last value boundary, which can fall short of the value's
/// length when the mask renders fewer value characters than were stored.
/// `None` only when the mask has no input section.
#[must_use]
pub fn clamp_to_value_space(derived: &MaskDerivedState, coord: SpaceCoord) -> Option<SpaceCoord> {
    if derived.contains_value_coord(coord) {
        return Some(coord);
    }

    let last = derived.inputs().last()?;
    let section = derived
        .input_by_value_index(coord.section)
        .unwrap_or(last);
    let end = section.last_value_coord().position;
    let position = if section.value_index == coord.section {
        coord.position.min(end)
    } else {
        end
    };
    Some(SpaceCoord::new(section.value_index, position))
}
