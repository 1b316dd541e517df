//! Sequence: an ordered, optionally-sorted, optionally-unique collection of record keys with
//! opaque per-element annotations.

use std::cmp::Ordering;

use crate::database::Database;
use crate::key::RecordKey;

/// How a [`Sequence`]'s elements are currently ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortType {
    Unsorted,
    KeySorted,
    NameSorted,
    ValueSorted,
}

/// An opaque per-element payload, preserved by the engine but never interpreted by it.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Text(String),
    Integer(i64),
}

/// One element of a [`Sequence`]: a record key plus an optional display name and annotation.
#[derive(Debug, Clone)]
pub struct Element {
    pub key: RecordKey,
    pub name: Option<String>,
    pub annotation: Option<Annotation>,
}

/// An ordered multiset of record keys, with sort-state tracking and an owning-database
/// reference used to resolve display names lazily.
pub struct Sequence<'db> {
    database: &'db Database,
    elements: Vec<Element>,
    sort_type: SortType,
    unique: bool,
}

impl<'db> Sequence<'db> {
    pub fn new(database: &'db Database) -> Self {
        Self { database, elements: Vec::new(), sort_type: SortType::Unsorted, unique: false }
    }

    pub fn from_keys(database: &'db Database, keys: impl IntoIterator<Item = RecordKey>) -> Self {
        let mut seq = Self::new(database);
        for key in keys {
            seq.append(key, None);
        }
        seq
    }

    pub fn database(&self) -> &'db Database {
        self.database
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn sort_type(&self) -> SortType {
        self.sort_type
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.elements.iter().map(|e| &e.key)
    }

    /// Appends `key` with an optional annotation. O(1). Resets sort/unique state.
    pub fn append(&mut self, key: RecordKey, annotation: Option<Annotation>) {
        self.elements.push(Element { key, name: None, annotation });
        self.sort_type = SortType::Unsorted;
        self.unique = false;
    }

    /// O(n) unless the sequence is [`SortType::KeySorted`], in which case O(log n).
    pub fn contains(&self, key: &RecordKey) -> bool {
        if self.sort_type == SortType::KeySorted {
            self.elements.binary_search_by(|e| e.key.cmp(key)).is_ok()
        } else {
            self.elements.iter().any(|e| &e.key == key)
        }
    }

    /// Removes the first occurrence of `key`. Returns whether one was found.
    pub fn remove(&mut self, key: &RecordKey) -> bool {
        if let Some(pos) = self.elements.iter().position(|e| &e.key == key) {
            self.elements.remove(pos);
            true
        } else {
            false
        }
    }

    /// Truncates to zero length; the owning database reference is preserved.
    pub fn empty(&mut self) {
        self.elements.clear();
        self.sort_type = SortType::Unsorted;
        self.unique = false;
    }

    /// A deep copy of the element array; sort/unique flags are preserved.
    pub fn copy(&self) -> Sequence<'db> {
        Sequence {
            database: self.database,
            elements: self.elements.clone(),
            sort_type: self.sort_type,
            unique: self.unique,
        }
    }

    /// Stable sort by [`RecordKey`]'s comparator; sets [`SortType::KeySorted`].
    pub fn key_sort(&mut self) {
        self.elements.sort_by(|a, b| a.key.cmp(&b.key));
        self.sort_type = SortType::KeySorted;
    }

    /// The element's lazily-resolved display name: the value of the record's first `NAME`
    /// sub-node, if any.
    fn resolve_name(&self, key: &RecordKey) -> Option<String> {
        let root = self.database.record_index().lookup(key)?;
        let arena = self.database.arena();
        let name_node = arena.children_with_tag(root, "NAME").next()?;
        arena.value(name_node).map(str::to_string)
    }

    /// Sorts by resolved display name (case-folded). Elements without a resolvable name sort
    /// last, in their relative order. Sets [`SortType::NameSorted`].
    pub fn name_sort(&mut self) {
        for element in &mut self.elements {
            if element.name.is_none() {
                element.name = self.resolve_name(&element.key);
            }
        }
        self.elements.sort_by(|a, b| match (&a.name, &b.name) {
            (Some(x), Some(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        self.sort_type = SortType::NameSorted;
    }

    /// A new, `KeySorted`, duplicate-free sequence.
    pub fn unique(&self) -> Sequence<'db> {
        let mut copy = self.copy();
        copy.unique_in_place();
        copy
    }

    /// Same as [`unique`](Self::unique), mutating in place.
    pub fn unique_in_place(&mut self) {
        self.key_sort();
        self.elements.dedup_by(|a, b| a.key == b.key);
        self.unique = true;
    }

    /// Concatenates `other` onto the end of `self`. Flags become Unsorted/not-unique.
    pub fn append_sequence(&mut self, other: &Sequence<'db>) {
        self.elements.extend(other.elements.iter().cloned());
        self.sort_type = SortType::Unsorted;
        self.unique = false;
    }
}

impl std::fmt::Debug for Sequence<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("len", &self.elements.len())
            .field("sort_type", &self.sort_type)
            .field("unique", &self.unique)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseConfig;

    fn db() -> Database {
        Database::new(DatabaseConfig::default())
    }

    #[test]
    fn append_resets_sort_and_unique_flags() {
        let database = db();
        let mut seq = Sequence::new(&database);
        seq.append(RecordKey::new("@I1@"), None);
        seq.unique_in_place();
        assert!(seq.is_unique());
        seq.append(RecordKey::new("@I2@"), None);
        assert_eq!(seq.sort_type(), SortType::Unsorted);
        assert!(!seq.is_unique());
    }

    #[test]
    fn contains_after_key_sort_uses_binary_search() {
        let database = db();
        let mut seq = Sequence::new(&database);
        for raw in ["@I1@", "@I6@", "@I3@", "@I5@", "@I4@"] {
            seq.append(RecordKey::new(raw), None);
        }
        seq.key_sort();
        assert_eq!(seq.sort_type(), SortType::KeySorted);
        assert!(seq.contains(&RecordKey::new("@I4@")));
        assert!(!seq.contains(&RecordKey::new("@I99@")));
        let ordered: Vec<_> = seq.keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(ordered, vec!["@I1@", "@I3@", "@I4@", "@I5@", "@I6@"]);
    }

    #[test]
    fn remove_removes_first_occurrence_only() {
        let database = db();
        let mut seq = Sequence::new(&database);
        seq.append(RecordKey::new("@I1@"), None);
        seq.append(RecordKey::new("@I1@"), None);
        assert!(seq.remove(&RecordKey::new("@I1@")));
        assert_eq!(seq.len(), 1);
        assert!(!seq.remove(&RecordKey::new("@I2@")));
    }

    #[test]
    fn unique_in_place_dedupes_and_key_sorts() {
        let database = db();
        let mut seq = Sequence::new(&database);
        for raw in ["@I2@", "@I1@", "@I2@", "@I1@"] {
            seq.append(RecordKey::new(raw), None);
        }
        seq.unique_in_place();
        let ordered: Vec<_> = seq.keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(ordered, vec!["@I1@", "@I2@"]);
        assert!(seq.is_unique());
    }

    #[test]
    fn empty_preserves_database_reference() {
        let database = db();
        let mut seq = Sequence::new(&database);
        seq.append(RecordKey::new("@I1@"), None);
        seq.empty();
        assert_eq!(seq.len(), 0);
        // Still usable against the same database afterward.
        seq.append(RecordKey::new("@I2@"), None);
        assert_eq!(seq.len(), 1);
    }
}
