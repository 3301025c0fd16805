#![forbid(unsafe_code)]

//! Section values keyed by slug.

use std::collections::BTreeMap;

use unicode_segmentation::UnicodeSegmentation;

/// Split a string into extended grapheme clusters.
#[must_use]
pub fn split_graphemes(text: &str) -> Vec<String> {
    text.graphemes(true).map(str::to_owned).collect()
}

/// Number of grapheme clusters in `text`.
#[must_use]
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// The value map of a mask: input-section slug to its grapheme clusters.
///
/// Missing slugs read as empty. Writes always store owned graphemes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MaskValues(BTreeMap<String, Vec<String>>);

impl MaskValues {
    /// An empty value map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from plain strings, splitting each into graphemes.
    pub fn from_strings<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        Self(
            entries
                .into_iter()
                .map(|(slug, value)| (slug.into(), split_graphemes(value.as_ref())))
                .collect(),
        )
    }

    /// Build from pre-split grapheme lists.
    pub fn from_graphemes<K>(entries: impl IntoIterator<Item = (K, Vec<String>)>) -> Self
    where
        K: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(slug, value)| (slug.into(), value))
                .collect(),
        )
    }

    /// The external model: every slug with its graphemes joined.
    #[must_use]
    pub fn to_strings(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(slug, value)| (slug.clone(), value.concat()))
            .collect()
    }

    /// Graphemes of `slug`, empty if absent.
    #[must_use]
    pub fn get(&self, slug: &str) -> &[String] {
        self.0.get(slug).map_or(&[], Vec::as_slice)
    }

    /// Joined value of `slug`.
    #[must_use]
    pub fn joined(&self, slug: &str) -> String {
        self.get(slug).concat()
    }

    /// Grapheme count of `slug`.
    #[must_use]
    pub fn len_of(&self, slug: &str) -> usize {
        self.get(slug).len()
    }

    /// Whether `slug` is absent or empty.
    #[must_use]
    pub fn is_empty_at(&self, slug: &str) -> bool {
        self.get(slug).is_empty()
    }

    /// Whether every stored value is empty.
    #[must_use]
    pub fn is_all_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Replace the graphemes of `slug`.
    pub fn set(&mut self, slug: impl Into<String>, value: Vec<String>) {
        self.0.insert(slug.into(), value);
    }

    /// Replace the value of `slug` from a plain string.
    pub fn set_str(&mut self, slug: impl Into<String>, value: &str) {
        self.set(slug, split_graphemes(value));
    }

    /// Builder form of [`MaskValues::set_str`].
    #[must_use]
    pub fn with_str(mut self, slug: impl Into<String>, value: &str) -> Self {
        self.set_str(slug, value);
        self
    }

    /// Ensure every slug in `slugs` has an entry.
    pub fn ensure_slugs<'a>(&mut self, slugs: impl IntoIterator<Item = &'a str>) {
        for slug in slugs {
            self.0.entry(slug.to_owned()).or_default();
        }
    }

    /// Iterate over `(slug, graphemes)` in slug order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(slug, value)| (slug.as_str(), value.as_slice()))
    }

    /// Compare the external (joined) models of two maps.
    ///
    /// Absent slugs and empty slugs compare equal.
    #[must_use]
    pub fn same_external_model(&self, other: &Self) -> bool {
        self.0
            .keys()
            .chain(other.0.keys())
            .all(|slug| self.joined(slug) == other.joined(slug))
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for MaskValues {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Self::from_graphemes(iter)
    }
}
