//! The name index: canonicalised name key → set of Person record keys.

use std::collections::{BTreeMap, BTreeSet};

use crate::key::RecordKey;

/// Canonicalises a display name:
/// 1. strip leading/trailing whitespace,
/// 2. lower-case ASCII letters (non-ASCII bytes pass through unchanged),
/// 3. collapse runs of whitespace to a single space,
/// 4. if a `/…/`-delimited surname segment is present, emit `surname\0givens`; otherwise emit the
///    normalised name as-is.
pub fn name_key(name: &str) -> String {
    let trimmed = name.trim();
    let normalized = collapse_whitespace(&lowercase_ascii(trimmed));

    if let Some(start) = normalized.find('/') {
        let rest = &normalized[start + 1..];
        let end = rest.find('/').unwrap_or(rest.len());
        let surname = rest[..end].trim();
        let before = normalized[..start].trim();
        let after = if end < rest.len() { rest[end + 1..].trim() } else { "" };
        let givens = [before, after].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");
        format!("{surname}\0{givens}")
    } else {
        normalized
    }
}

fn lowercase_ascii(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c }).collect()
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// A name-search pattern: either an exact canonical key, or a wildcard anchored at one end.
///
/// A leading `*` stands for "any givens", so the remaining text canonicalises to a surname
/// probe (e.g. `grenda\0`) that must be a *prefix* of the candidate's canonical key. The
/// embedded `\0` is what stops `grenda\0` from also matching `grenda-hl\0...`-style keys whose
/// surname merely starts with the same letters (e.g. "Grendahl"). A trailing `*` is the mirror
/// image: the text before it must be a *suffix* of the canonical key.
enum Pattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
}

/// Parses a raw search pattern, recognising a single leading or trailing `*`. A trailing `/` with
/// no wildcard is treated as decorative and stripped, so `*/Grenda` and `*/Grenda/` match the
/// same set.
fn parse_pattern(pattern: &str) -> Pattern {
    if let Some(rest) = pattern.strip_prefix('*') {
        return Pattern::Prefix(name_key_allow_trailing_slash(rest));
    }
    if let Some(rest) = pattern.strip_suffix('*') {
        return Pattern::Suffix(name_key_allow_trailing_slash(rest));
    }
    Pattern::Exact(name_key(pattern))
}

fn name_key_allow_trailing_slash(pattern: &str) -> String {
    name_key(pattern.strip_suffix('/').unwrap_or(pattern))
}

/// Maps canonicalised name keys to the set of Person record keys bearing that name. The per-key
/// bucket is a `BTreeSet`, which keeps membership ordered by [`RecordKey`] and gives O(log n)
/// lookup/insertion for free.
#[derive(Debug, Default)]
pub struct NameIndex {
    buckets: BTreeMap<String, BTreeSet<RecordKey>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record_key` to the bucket for `key`. Idempotent: re-inserting an existing pair is a
    /// no-op.
    pub fn insert(&mut self, key: String, record_key: RecordKey) {
        self.buckets.entry(key).or_default().insert(record_key);
    }

    /// Canonicalises `name` and returns the matching record keys, which is a stable empty set if
    /// nothing matches. A leading or trailing `*` in `name` is treated as a wildcard.
    pub fn search(&self, name: &str) -> BTreeSet<RecordKey> {
        match parse_pattern(name) {
            Pattern::Exact(key) => self.buckets.get(&key).cloned().unwrap_or_default(),
            Pattern::Prefix(probe) => self.scan(|key| key.starts_with(&probe)),
            Pattern::Suffix(probe) => self.scan(|key| key.ends_with(&probe)),
        }
    }

    fn scan(&self, matches: impl Fn(&str) -> bool) -> BTreeSet<RecordKey> {
        let mut result = BTreeSet::new();
        for (key, bucket) in &self.buckets {
            if matches(key.as_str()) {
                result.extend(bucket.iter().cloned());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalises_case_and_whitespace() {
        assert_eq!(name_key("  Tom   Wetmore  "), "tom wetmore");
    }

    #[test]
    fn folds_surname_to_the_front() {
        assert_eq!(name_key("Thomas Trask /Wetmore/"), "wetmore\0thomas trask");
    }

    #[test]
    fn name_without_surname_delimiters_is_used_directly() {
        assert_eq!(name_key("Madonna"), "madonna");
    }

    #[test]
    fn leading_wildcard_matches_exact_surname_only() {
        let mut index = NameIndex::new();
        index.insert(name_key("Joseph /Grenda/"), RecordKey::new("@I1@"));
        index.insert(name_key("Mary /Grendahl/"), RecordKey::new("@I2@"));

        let found = index.search("*/Grenda");
        assert_eq!(found, BTreeSet::from([RecordKey::new("@I1@")]));
    }

    #[test]
    fn trailing_slash_on_wildcard_pattern_is_optional() {
        let mut index = NameIndex::new();
        index.insert(name_key("Joseph /Grenda/"), RecordKey::new("@I1@"));

        assert_eq!(index.search("*/Grenda"), index.search("*/Grenda/"));
    }

    #[test]
    fn search_for_absent_name_returns_empty_set() {
        let index = NameIndex::new();
        assert!(index.search("Nobody /Atall/").is_empty());
    }

    #[test]
    fn reinsert_of_existing_pair_is_a_no_op() {
        let mut index = NameIndex::new();
        index.insert("tom".to_string(), RecordKey::new("@I1@"));
        index.insert("tom".to_string(), RecordKey::new("@I1@"));
        assert_eq!(index.search("tom").len(), 1);
    }
}
