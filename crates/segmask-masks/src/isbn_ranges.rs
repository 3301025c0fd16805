#![forbid(unsafe_code)]

//! Embedded excerpt of the ISBN registration-group and registrant ranges.
//!
//! Range bounds are the next seven digits after the element they belong to,
//! right-padded with zeros. A length of zero marks an unassigned range.

/// `(start, end, length)` of one range.
pub(crate) type Range = (u32, u32, usize);

/// Registration-group ranges per EAN prefix.
pub(crate) static GROUP_RANGES: &[(&str, &[Range])] = &[
    (
        "978",
        &[
            (0, 5_999_999, 1),
            (6_000_000, 6_499_999, 3),
            (6_500_000, 6_599_999, 2),
            (6_600_000, 6_999_999, 3),
            (7_000_000, 7_999_999, 1),
            (8_000_000, 9_499_999, 2),
            (9_500_000, 9_899_999, 3),
            (9_900_000, 9_989_999, 4),
            (9_990_000, 9_999_999, 5),
        ],
    ),
    (
        "979",
        &[
            (0, 999_999, 0),
            (1_000_000, 1_299_999, 2),
            (1_300_000, 7_999_999, 0),
            (8_000_000, 8_999_999, 1),
            (9_000_000, 9_999_999, 0),
        ],
    ),
];

/// Registrant (publisher) ranges per `(prefix, group)`.
pub(crate) static PUBLISHER_RANGES: &[(&str, &str, &[Range])] = &[
    (
        "978",
        "0",
        &[
            (0, 1_999_999, 2),
            (2_000_000, 6_999_999, 3),
            (7_000_000, 8_499_999, 4),
            (8_500_000, 8_999_999, 5),
            (9_000_000, 9_499_999, 6),
            (9_500_000, 9_999_999, 7),
        ],
    ),
    (
        "978",
        "1",
        &[
            (0, 999_999, 2),
            (1_000_000, 3_999_999, 3),
            (4_000_000, 5_499_999, 4),
            (5_500_000, 8_697_999, 5),
            (8_698_000, 9_989_999, 6),
            (9_990_000, 9_999_999, 7),
        ],
    ),
    (
        "978",
        "2",
        &[
            (0, 1_999_999, 2),
            (2_000_000, 6_999_999, 3),
            (7_000_000, 8_399_999, 4),
            (8_400_000, 8_999_999, 5),
            (9_000_000, 9_499_999, 6),
            (9_500_000, 9_999_999, 7),
        ],
    ),
    (
        "978",
        "3",
        &[
            (0, 299_999, 2),
            (300_000, 339_999, 3),
            (340_000, 369_999, 4),
            (370_000, 399_999, 5),
            (400_000, 1_999_999, 2),
            (2_000_000, 6_999_999, 3),
            (7_000_000, 8_499_999, 4),
            (8_500_000, 8_999_999, 5),
            (9_000_000, 9_499_999, 6),
            (9_500_000, 9_999_999, 7),
        ],
    ),
    (
        "978",
        "4",
        &[
            (0, 1_999_999, 2),
            (2_000_000, 6_999_999, 3),
            (7_000_000, 8_499_999, 4),
            (8_500_000, 8_999_999, 5),
            (9_000_000, 9_499_999, 6),
            (9_500_000, 9_999_999, 7),
        ],
    ),
    (
        "979",
        "10",
        &[
            (0, 1_999_999, 2),
            (2_000_000, 6_999_999, 3),
            (7_000_000, 8_999_999, 4),
            (9_000_000, 9_759_999, 5),
            (9_760_000, 9_999_999, 6),
        ],
    ),
    (
        "979",
        "8",
        &[
            (0, 1_999_999, 0),
            (2_000_000, 2_299_999, 3),
            (2_300_000, 3_499_999, 4),
            (3_500_000, 3_999_999, 5),
            (4_000_000, 9_999_999, 6),
        ],
    ),
];

/// First seven digits of `digits`, right-padded with zeros.
pub(crate) fn range_key(digits: &str) -> u32 {
    let padded: String = digits.chars().chain(std::iter::repeat('0')).take(7).collect();
    padded.parse().unwrap_or(0)
}

fn find(ranges: &[Range], key: u32) -> Option<usize> {
    ranges
        .iter()
        .find(|(start, end, len)| (*start..=*end).contains(&key) && *len > 0)
        .map(|(_, _, len)| *len)
}

/// Length of the registration group starting with `digits`.
pub(crate) fn group_length(prefix: &str, digits: &str) -> Option<usize> {
    let (_, ranges) = GROUP_RANGES.iter().find(|(p, _)| *p == prefix)?;
    find(ranges, range_key(digits))
}

/// Registrant ranges of a known group.
pub(crate) fn publisher_ranges(prefix: &str, group: &str) -> Option<&'static [Range]> {
    PUBLISHER_RANGES
        .iter()
        .find(|(p, g, _)| *p == prefix && *g == group)
        .map(|(_, _, ranges)| *ranges)
}

/// Length of the registrant starting with `digits` in a known group.
pub(crate) fn publisher_length(prefix: &str, group: &str, digits: &str) -> Option<usize> {
    find(publisher_ranges(prefix, group)?, range_key(digits))
}

/// Groups with registrant tables under `prefix`, sorted as strings.
pub(crate) fn known_groups(prefix: &str) -> Vec<&'static str> {
    let mut groups: Vec<&'static str> = PUBLISHER_RANGES
        .iter()
        .filter(|(p, _, _)| *p == prefix)
        .map(|(_, g, _)| *g)
        .collect();
    groups.sort_unstable();
    groups
}
