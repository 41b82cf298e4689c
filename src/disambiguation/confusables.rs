//! Confusable character groups
//!
//! Characters the recognition engine is known to mix up. The table is built
//! once and only ever read afterwards.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Built-in groups: O/0, I/1/l, S/5, Z/2, B/8
pub const DEFAULT_GROUPS: &[&str] = &["O0", "I1l", "S5", "Z2", "B8"];

static DEFAULT_TABLE: LazyLock<ConfusableTable> =
    LazyLock::new(|| ConfusableTable::from_groups(DEFAULT_GROUPS));

/// A set of mutually substitutable characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusableGroup {
    members: BTreeSet<char>,
}

impl ConfusableGroup {
    /// Create a group from its characters
    pub fn new(members: impl IntoIterator<Item = char>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// Whether the group shares at least one character with `chars`
    pub fn intersects(&self, chars: &BTreeSet<char>) -> bool {
        !self.members.is_disjoint(chars)
    }

    /// Group members in sorted order
    pub fn members(&self) -> impl Iterator<Item = char> + '_ {
        self.members.iter().copied()
    }
}

/// Immutable collection of confusable groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusableTable {
    groups: Vec<ConfusableGroup>,
}

impl ConfusableTable {
    /// The built-in table
    pub fn builtin() -> &'static ConfusableTable {
        &DEFAULT_TABLE
    }

    /// Build a table from one string of characters per group; empty strings are skipped
    pub fn from_groups<S: AsRef<str>>(groups: &[S]) -> Self {
        Self {
            groups: groups
                .iter()
                .map(|g| g.as_ref())
                .filter(|g| !g.is_empty())
                .map(|g| ConfusableGroup::new(g.chars()))
                .collect(),
        }
    }

    /// Configured groups
    pub fn groups(&self) -> &[ConfusableGroup] {
        &self.groups
    }

    /// Whether any character of `text` belongs to a confusable group
    pub fn is_ambiguous(&self, text: &str) -> bool {
        let chars = distinct_chars(text);
        self.groups.iter().any(|g| g.intersects(&chars))
    }

    /// Characters permitted in a constrained re-recognition of `text`.
    ///
    /// Every group touched by `text` contributes all of its members, so the
    /// second pass can pick any variant. Alphanumerics already present stay
    /// eligible.
    pub fn build_allowlist(&self, text: &str) -> Allowlist {
        let chars = distinct_chars(text);
        let mut allowed: BTreeSet<char> = self
            .groups
            .iter()
            .filter(|g| g.intersects(&chars))
            .flat_map(|g| g.members())
            .collect();
        allowed.extend(chars.iter().copied().filter(|c| c.is_alphanumeric()));

        Allowlist(allowed)
    }
}

impl Default for ConfusableTable {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// Deduplicated, sorted character set for a constrained recognition call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist(BTreeSet<char>);

impl Allowlist {
    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for Allowlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|c| write!(f, "{}", c))
    }
}

/// Whether `text` contains a character from the built-in groups
pub fn is_ambiguous(text: &str) -> bool {
    ConfusableTable::builtin().is_ambiguous(text)
}

/// Allowlist for `text` against the built-in groups
pub fn build_allowlist(text: &str) -> Allowlist {
    ConfusableTable::builtin().build_allowlist(text)
}

fn distinct_chars(text: &str) -> BTreeSet<char> {
    text.chars().collect()
}
