//! Lexical frequency profile: the most frequent word forms of an essay.
//!
//! Tokens are maximal runs of ASCII letters after lowercasing. Digits,
//! punctuation and every other character only separate tokens, so
//! "well-known" counts as "well" and "known" and numerals are dropped.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

/// Default number of entries kept in a profile.
pub const DEFAULT_TOP_N: usize = 10;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    // Infallible literal pattern
    Regex::new("[a-z]+").expect("token pattern compiles")
});

/// One ranked token and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry
{
    pub token: String,
    pub count: usize,
}

/// Up to N entries, highest count first, ties in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyProfile
{
    entries: Vec<FrequencyEntry>,
}

impl FrequencyProfile
{
    pub fn entries(&self) -> &[FrequencyEntry]
    {
        &self.entries
    }

    pub fn len(&self) -> usize
    {
        self.entries
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries
            .is_empty()
    }

    /// Render as `token: count` lines in rank order.
    pub fn render(&self) -> String
    {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.token, e.count))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Borrowing view as `(token, count)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, usize)>
    {
        self.entries
            .iter()
            .map(|e| (e.token.as_str(), e.count))
    }
}

/// Split lowercased text into ASCII-letter tokens.
pub fn tokenize(text: &str) -> Vec<String>
{
    let folded = text.to_lowercase();

    TOKEN
        .find_iter(&folded)
        .map(|m| {
            m.as_str()
                .to_string()
        })
        .collect()
}

/// Count tokens and keep the `top_n` most frequent.
#[instrument(level = "debug", skip(text), fields(chars = text.len()))]
pub fn profile(
    text: &str,
    top_n: usize,
) -> FrequencyProfile
{
    if top_n == 0
    {
        return FrequencyProfile::default();
    }

    // Insertion order doubles as the tie-break order
    let mut counts: IndexMap<String, usize> = IndexMap::new();

    for token in tokenize(text)
    {
        *counts
            .entry(token)
            .or_insert(0) += 1;
    }

    let distinct = counts.len();

    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .map(|(token, count)| FrequencyEntry { token, count })
        .collect();

    // sort_by is stable, so equal counts keep first-seen order
    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
    });
    entries.truncate(top_n);

    debug!(distinct, kept = entries.len(), "built frequency profile");

    FrequencyProfile { entries }
}
