//! The record index: key → root-node map plus originating-source metadata.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::key::{RecordKey, RecordType};
use crate::node::NodeId;

/// Where a record root came from, for error provenance.
#[derive(Debug, Clone)]
pub struct RecordSource {
    pub segment: String,
    pub line: u32,
}

#[derive(Debug, Clone)]
struct RecordEntry {
    root: NodeId,
    record_type: RecordType,
    source: RecordSource,
}

/// Maps record keys to their root node, record type, and originating source. Owns the set of
/// keys registered against a database; insertion order is preserved for [`RecordIndex::iterate`].
#[derive(Debug, Default)]
pub struct RecordIndex {
    entries: HashMap<RecordKey, RecordEntry>,
    order: Vec<RecordKey>,
}

impl RecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `root` (whose tag determines its [`RecordType`]) under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateKey`] if `key` is already registered.
    pub fn insert(
        &mut self,
        key: RecordKey,
        root: NodeId,
        record_type: RecordType,
        source: RecordSource,
    ) -> Result<(), EngineError> {
        if self.entries.contains_key(&key) {
            return Err(EngineError::DuplicateKey { key });
        }
        self.order.push(key.clone());
        self.entries.insert(key, RecordEntry { root, record_type, source });
        Ok(())
    }

    pub fn lookup(&self, key: &RecordKey) -> Option<NodeId> {
        self.entries.get(key).map(|entry| entry.root)
    }

    pub fn classify(&self, key: &RecordKey) -> Option<RecordType> {
        self.entries.get(key).map(|entry| entry.record_type)
    }

    pub fn source(&self, key: &RecordKey) -> Option<&RecordSource> {
        self.entries.get(key).map(|entry| &entry.source)
    }

    pub fn line_of(&self, key: &RecordKey) -> u32 {
        self.source(key).map_or(0, |source| source.line)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Yields every registered key/root pair, in insertion order.
    pub fn iterate(&self) -> impl Iterator<Item = (&RecordKey, NodeId)> {
        self.order.iter().map(move |key| (key, self.entries[key].root))
    }

    /// Yields the keys of every record of the given type, in insertion order.
    pub fn keys_of_type(&self, record_type: RecordType) -> impl Iterator<Item = &RecordKey> {
        self.order.iter().filter(move |key| self.entries[*key].record_type == record_type)
    }
}
