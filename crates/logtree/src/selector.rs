//! crates/logtree/src/selector.rs
//! Selector rules and longest-match lookup.
//!
//! Selectors name a namespace of call sites using package paths: `a/b/c` is a
//! package, `a/b/c.Func` a function inside it. Three forms are recognised:
//!
//! - `pkg.` selects functions of `pkg` only, not of sub-packages;
//! - `pkg/` selects everything below `pkg/`;
//! - `pkg` selects `pkg` itself plus everything below it, stopping at a path
//!   boundary so `foo` never selects `foobar`.
//!
//! The empty selector selects every call site.

use std::fmt;

use crate::level::Level;

/// A path-like selector string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Selector(String);

impl Selector {
    /// Wraps a selector string.
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    /// Returns the selector text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the selector in bytes, the specificity used for ordering.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reports whether this is the catch-all selector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reports whether the selector matches the fully qualified name `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let selector = self.0.as_str();
        if selector.is_empty() {
            return true;
        }
        let Some(tail) = name.strip_prefix(selector) else {
            return false;
        };

        if selector.ends_with('.') {
            // "foo." must not reach into a sub-package such as "foo.bar/baz".
            !tail.contains('/')
        } else if selector.ends_with('/') {
            true
        } else {
            // "foo" matches "foo", "foo.bar" and "foo/bar" but not "foobar".
            matches!(tail.as_bytes().first(), None | Some(b'/' | b'.'))
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A selector paired with the threshold it assigns.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    /// Which call sites the rule applies to.
    pub selector: Selector,
    /// Minimum severity those call sites log at.
    pub level: Level,
}

impl Rule {
    /// Creates a rule.
    pub fn new(selector: impl Into<Selector>, level: Level) -> Self {
        Self {
            selector: selector.into(),
            level,
        }
    }
}

/// Inserts `rule` into `rules`, overwriting the threshold of an existing rule
/// with the same selector in place so insertion order is preserved.
pub(crate) fn upsert(rules: &mut Vec<Rule>, rule: Rule) {
    match rules.iter_mut().find(|existing| existing.selector == rule.selector) {
        Some(existing) => existing.level = rule.level,
        None => rules.push(rule),
    }
}

/// Rules ordered from most to least specific.
///
/// Ordering is by selector length, longest first. Equal-length selectors keep
/// the order they were merged in, which makes the table deterministic for a
/// given sequence of configuration calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from rules in insertion order.
    ///
    /// Later rules for a selector already present overwrite its threshold.
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = Rule>,
    {
        Self::merged(None, rules)
    }

    /// Merges `local` rules over an inherited table.
    ///
    /// Inherited rules come first, in their existing order; a local rule for an
    /// inherited selector replaces its threshold, and new selectors are
    /// appended. The result is then stable-sorted by selector length.
    pub fn merged<I>(parent: Option<&Self>, local: I) -> Self
    where
        I: IntoIterator<Item = Rule>,
    {
        let mut rules = parent.map(|table| table.rules.clone()).unwrap_or_default();
        for rule in local {
            upsert(&mut rules, rule);
        }
        rules.sort_by(|a, b| b.selector.len().cmp(&a.selector.len()));
        Self { rules }
    }

    /// Returns the threshold of the most specific rule matching `name`.
    #[must_use]
    pub fn level_for(&self, name: &str) -> Option<Level> {
        self.rules
            .iter()
            .find(|rule| rule.selector.matches(name))
            .map(|rule| rule.level)
    }

    /// Returns the rules in match order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Reports whether the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(text: &str) -> Selector {
        Selector::new(text)
    }

    #[test]
    fn bare_selector_respects_path_boundaries() {
        assert!(sel("foo").matches("foo"));
        assert!(sel("foo").matches("foo/bar"));
        assert!(sel("foo").matches("foo.bar"));
        assert!(!sel("foo").matches("foobar"));
        assert!(!sel("foo").matches("fo"));
    }

    #[test]
    fn trailing_dot_selects_package_functions_only() {
        assert!(sel("foo.").matches("foo.bar"));
        assert!(sel("foo.").matches("foo."));
        assert!(!sel("foo.").matches("foo.bar/baz"));
        assert!(!sel("foo.").matches("foo/bar.baz"));
    }

    #[test]
    fn trailing_slash_selects_subpackages() {
        assert!(sel("foo/").matches("foo/bar"));
        assert!(sel("foo/").matches("foo/bar/baz"));
        assert!(sel("foo/").matches("foo/bar.Func"));
        assert!(!sel("foo/").matches("foo.Func"));
        assert!(!sel("foo/").matches("foo"));
    }

    #[test]
    fn empty_selector_matches_everything() {
        assert!(sel("").matches(""));
        assert!(sel("").matches("anything/at.all"));
    }

    #[test]
    fn merged_table_orders_longest_first() {
        let table = RuleTable::from_rules([
            Rule::new("hello", Level::from_raw(1)),
            Rule::new("omg", Level::from_raw(2)),
            Rule::new("helloworld", Level::from_raw(3)),
            Rule::new("", Level::from_raw(4)),
            Rule::new("hell", Level::from_raw(5)),
            Rule::new("omgponies", Level::from_raw(6)),
            Rule::new("world", Level::from_raw(7)),
        ]);

        let order: Vec<&str> = table.rules().iter().map(|rule| rule.selector.as_str()).collect();
        assert_eq!(
            order,
            ["helloworld", "omgponies", "hello", "world", "hell", "omg", ""]
        );
    }

    #[test]
    fn local_rules_override_inherited_selector_in_place() {
        let parent = RuleTable::from_rules([
            Rule::new("pkg", Level::WARN),
            Rule::new("lib", Level::ERROR),
        ]);
        let child = RuleTable::merged(Some(&parent), [Rule::new("pkg", Level::DEBUG)]);

        assert_eq!(child.len(), 2);
        assert_eq!(child.level_for("pkg/file.Func"), Some(Level::DEBUG));
        assert_eq!(child.level_for("lib.Func"), Some(Level::ERROR));
        assert_eq!(parent.level_for("pkg/file.Func"), Some(Level::WARN));
    }

    #[test]
    fn most_specific_rule_wins_regardless_of_insertion() {
        let table = RuleTable::from_rules([
            Rule::new("pkg/sub", Level::DEBUG),
            Rule::new("pkg", Level::ERROR),
        ]);
        assert_eq!(table.level_for("pkg/sub/file.Func"), Some(Level::DEBUG));
        assert_eq!(table.level_for("pkg/other.Func"), Some(Level::ERROR));
        assert_eq!(table.level_for("elsewhere.Func"), None);
    }

    #[test]
    fn repeated_selector_keeps_last_threshold() {
        let table = RuleTable::from_rules([
            Rule::new("pkg", Level::WARN),
            Rule::new("pkg", Level::DEBUG),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.level_for("pkg"), Some(Level::DEBUG));
    }
}
