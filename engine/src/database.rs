//! The database: aggregates the node arena, the record index, the name index, and the most
//! recently read segment name.

use crate::error::{EngineError, ErrorKind, ErrorLog};
use crate::key::RecordType;
use crate::name_index::{name_key, NameIndex};
use crate::node::{Arena, NodeId};
use crate::record_index::{RecordIndex, RecordSource};

/// Configuration carried by a [`Database`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// The segment label used when a caller doesn't supply one.
    pub default_segment: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { default_segment: "(unnamed)".to_string() }
    }
}

/// Owns every node, both indices, and the most recently read segment name. Everything else in
/// the engine (lineage traversal, the validator, Sequences) borrows from a `Database` rather
/// than owning its own copy of the data.
#[derive(Debug)]
pub struct Database {
    arena: Arena,
    record_index: RecordIndex,
    name_index: NameIndex,
    last_segment: String,
    config: DatabaseConfig,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        let last_segment = config.default_segment.clone();
        Self { arena: Arena::new(), record_index: RecordIndex::new(), name_index: NameIndex::new(), last_segment, config }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn record_index(&self) -> &RecordIndex {
        &self.record_index
    }

    pub fn name_index(&self) -> &NameIndex {
        &self.name_index
    }

    pub fn last_segment(&self) -> &str {
        &self.last_segment
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Registers a parsed record root with the database: it must be a record root (no parent, a
    /// non-null key). Registers it in the record index and, for Person records, walks every
    /// `NAME` sub-node into the name index.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateKey`] if the root's key is already registered.
    #[tracing::instrument(skip(self, root))]
    pub fn ingest(&mut self, root: NodeId, segment: String, line: u32) -> Result<(), EngineError> {
        self.last_segment = segment.clone();

        let key = self
            .arena
            .key(root)
            .cloned()
            .expect("ingest called with a non-root node (no key)");
        let record_type = RecordType::from_tag(self.arena.tag(root));

        self.record_index.insert(key.clone(), root, record_type, RecordSource { segment, line })?;

        if record_type == RecordType::Person {
            for name_node in self.arena.children_with_tag(root, "NAME").collect::<Vec<_>>() {
                if let Some(value) = self.arena.value(name_node) {
                    self.name_index.insert(name_key(value), key.clone());
                }
            }
        }

        tracing::debug!(key = %key, record_type = ?record_type, "ingested record");
        Ok(())
    }

    /// Best-effort variant of [`ingest`](Self::ingest): a duplicate key is logged as a
    /// [`ErrorKind::DuplicateKey`] entry instead of aborting the batch.
    pub fn ingest_logged(&mut self, root: NodeId, segment: String, line: u32, log: &mut ErrorLog) {
        let segment_for_log = segment.clone();
        if let Err(EngineError::DuplicateKey { key }) = self.ingest(root, segment, line) {
            log.push(ErrorKind::DuplicateKey, segment_for_log, line, format!("duplicate record key {key}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RecordKey;

    fn make_person(db: &mut Database, key: &str, name: &str) -> NodeId {
        let root = db.arena_mut().alloc(Some(RecordKey::new(key)), "INDI", None);
        let name_node = db.arena_mut().alloc(None, "NAME", Some(name.to_string()));
        db.arena_mut().append_child(root, name_node);
        root
    }

    #[test]
    fn ingest_populates_both_indices() {
        let mut db = Database::new(DatabaseConfig::default());
        let root = make_person(&mut db, "@I1@", "Tom /Wetmore/");
        db.ingest(root, "tom.ged".to_string(), 1).unwrap();

        assert_eq!(db.record_index().lookup(&RecordKey::new("@I1@")), Some(root));
        assert!(db.name_index().search("Tom /Wetmore/").contains(&RecordKey::new("@I1@")));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut db = Database::new(DatabaseConfig::default());
        let a = make_person(&mut db, "@I1@", "Tom /Wetmore/");
        let b = make_person(&mut db, "@I1@", "Other /Person/");
        db.ingest(a, "tom.ged".to_string(), 1).unwrap();
        assert!(db.ingest(b, "tom.ged".to_string(), 2).is_err());
    }

    #[test]
    fn duplicate_key_logged_variant_continues() {
        let mut db = Database::new(DatabaseConfig::default());
        let a = make_person(&mut db, "@I1@", "Tom /Wetmore/");
        let b = make_person(&mut db, "@I1@", "Other /Person/");
        let mut log = ErrorLog::new();
        db.ingest_logged(a, "tom.ged".to_string(), 1, &mut log);
        db.ingest_logged(b, "tom.ged".to_string(), 2, &mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(db.record_index().len(), 1);
    }

    #[test]
    fn multiple_names_all_get_indexed() {
        let mut db = Database::new(DatabaseConfig::default());
        let root = db.arena_mut().alloc(Some(RecordKey::new("@I1@")), "INDI", None);
        let n1 = db.arena_mut().alloc(None, "NAME", Some("Tom /Wetmore/".to_string()));
        let n2 = db.arena_mut().alloc(None, "NAME", Some("Thomas /Wetmore/".to_string()));
        db.arena_mut().append_child(root, n1);
        db.arena_mut().append_child(root, n2);
        db.ingest(root, "tom.ged".to_string(), 1).unwrap();

        assert!(db.name_index().search("Tom /Wetmore/").contains(&RecordKey::new("@I1@")));
        assert!(db.name_index().search("Thomas /Wetmore/").contains(&RecordKey::new("@I1@")));
    }
}
