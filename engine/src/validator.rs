//! The validator: checks every person and family's lineage links against the record index and
//! accumulates problems into an [`ErrorLog`] without short-circuiting.
//!
//! Walks each person's and family's FAMC/FAMS/HUSB/WIFE/CHIL links through
//! [`crate::lineage`]'s resolved iterators, counting back-link occurrences to catch dangling
//! references and mismatched bookkeeping.

use crate::database::Database;
use crate::error::{ErrorKind, ErrorLog};
use crate::key::RecordType;
use crate::lineage::{self, Sex};
use crate::node::NodeId;
use crate::record_index::RecordIndex;

/// Validates every person and family record in `database`, appending every problem found to
/// `log`. Returns `true` iff the log grew by zero entries.
#[tracing::instrument(skip(database, log))]
pub fn validate_database(database: &Database, log: &mut ErrorLog) -> bool {
    let before = log.len();
    for key in database.record_index().keys_of_type(RecordType::Person).collect::<Vec<_>>() {
        let root = database.record_index().lookup(key).expect("key came from the record index");
        validate_person(database, root, log);
    }
    for key in database.record_index().keys_of_type(RecordType::Family).collect::<Vec<_>>() {
        let root = database.record_index().lookup(key).expect("key came from the record index");
        validate_family(database, root, log);
    }
    tracing::debug!(errors_found = log.len() - before, "validate_database finished");
    log.len() == before
}

fn segment_and_line(index: &RecordIndex, key_text: &str) -> (String, u32) {
    let key = crate::key::RecordKey::new(key_text);
    match index.source(&key) {
        Some(source) => (source.segment.clone(), source.line),
        None => (String::new(), 0),
    }
}

fn validate_person(database: &Database, person: NodeId, log: &mut ErrorLog) {
    let arena = database.arena();
    let index = database.record_index();
    let person_key = arena.key(person).expect("person record must have a key").clone();
    let (segment, line) = segment_and_line(index, person_key.as_str());

    for link in lineage::famcs_of(arena, index, person) {
        let Some(family) = link.target else {
            log.push(
                ErrorKind::Linkage,
                segment.clone(),
                line,
                format!("person {person_key} FAMC dangling reference to {}", link.key),
            );
            continue;
        };
        let occurrences = lineage::children_of(arena, index, family)
            .filter(|child_link| child_link.target == Some(person))
            .count();
        match occurrences {
            0 => log.push(
                ErrorKind::Linkage,
                segment.clone(),
                line,
                format!("person {person_key} not found among CHIL of family {}", link.key),
            ),
            1 => {}
            _ => log.push(
                ErrorKind::Structural,
                segment.clone(),
                line,
                format!("person {person_key} appears more than once as CHIL of family {}", link.key),
            ),
        }
    }

    let sex = lineage::sex_of(arena, person);
    for link in lineage::famss_of(arena, index, person) {
        let Some(family) = link.target else {
            log.push(
                ErrorKind::Linkage,
                segment.clone(),
                line,
                format!("person {person_key} FAMS dangling reference to {}", link.key),
            );
            continue;
        };
        match sex {
            Sex::Unknown => log.push(
                ErrorKind::Linkage,
                segment.clone(),
                line,
                format!("person {person_key} has unknown sex but is a spouse in family {}", link.key),
            ),
            Sex::Male => {
                if lineage::resolved_husbs(arena, index, family).all(|husb| husb != person) {
                    log.push(
                        ErrorKind::Linkage,
                        segment.clone(),
                        line,
                        format!("person {person_key} not found among HUSB of family {}", link.key),
                    );
                }
            }
            Sex::Female => {
                if lineage::resolved_wifes(arena, index, family).all(|wife| wife != person) {
                    log.push(
                        ErrorKind::Linkage,
                        segment.clone(),
                        line,
                        format!("person {person_key} not found among WIFE of family {}", link.key),
                    );
                }
            }
        }
    }
}

fn validate_family(database: &Database, family: NodeId, log: &mut ErrorLog) {
    let arena = database.arena();
    let index = database.record_index();
    let family_key = arena.key(family).expect("family record must have a key").clone();
    let (segment, line) = segment_and_line(index, family_key.as_str());

    let mut member_count = 0usize;

    for husb_link in lineage::husbs_of(arena, index, family) {
        member_count += 1;
        let Some(husb) = husb_link.target else { continue };
        let back_links = lineage::resolved_famss(arena, index, husb).filter(|&f| f == family).count();
        if back_links != 1 {
            log.push(
                ErrorKind::Linkage,
                segment.clone(),
                line,
                format!("HUSB {} of family {family_key} has {back_links} FAMS back-links to it", husb_link.key),
            );
        }
    }

    for wife_link in lineage::wifes_of(arena, index, family) {
        member_count += 1;
        let Some(wife) = wife_link.target else { continue };
        let back_links = lineage::resolved_famss(arena, index, wife).filter(|&f| f == family).count();
        if back_links != 1 {
            log.push(
                ErrorKind::Linkage,
                segment.clone(),
                line,
                format!("WIFE {} of family {family_key} has {back_links} FAMS back-links to it", wife_link.key),
            );
        }
    }

    for chil_link in lineage::children_of(arena, index, family) {
        member_count += 1;
        let Some(child) = chil_link.target else { continue };
        let back_links = lineage::resolved_famcs(arena, index, child).filter(|&f| f == family).count();
        if back_links != 1 {
            log.push(
                ErrorKind::Linkage,
                segment.clone(),
                line,
                format!("CHIL {} of family {family_key} has {back_links} FAMC back-links to it", chil_link.key),
            );
        }
    }

    if member_count == 0 {
        log.push(ErrorKind::Structural, segment, line, format!("family {family_key} has no HUSB, WIFE, or CHIL"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseConfig;
    use crate::key::RecordKey;

    fn make_person(db: &mut Database, key: &str) -> NodeId {
        db.arena_mut().alloc(Some(RecordKey::new(key)), "INDI", None)
    }

    fn make_family(db: &mut Database, key: &str) -> NodeId {
        db.arena_mut().alloc(Some(RecordKey::new(key)), "FAM", None)
    }

    fn attach(db: &mut Database, parent: NodeId, tag: &str, value: &str) -> NodeId {
        let node = db.arena_mut().alloc(None, tag, Some(value.to_string()));
        db.arena_mut().append_child(parent, node);
        node
    }

    #[test]
    fn well_linked_family_validates_clean() {
        let mut db = Database::new(DatabaseConfig::default());
        let husb = make_person(&mut db, "@I1@");
        attach(&mut db, husb, "SEX", "M");
        let wife = make_person(&mut db, "@I2@");
        attach(&mut db, wife, "SEX", "F");
        let fam = make_family(&mut db, "@F1@");

        db.ingest(husb, "t.ged".to_string(), 1).unwrap();
        db.ingest(wife, "t.ged".to_string(), 2).unwrap();
        db.ingest(fam, "t.ged".to_string(), 3).unwrap();

        lineage::add_spouse_to_family(db.arena_mut(), husb, fam, Sex::Male);
        lineage::add_spouse_to_family(db.arena_mut(), wife, fam, Sex::Female);

        let mut log = ErrorLog::new();
        assert!(validate_database(&db, &mut log));
        assert!(log.is_empty());
    }

    #[test]
    fn dangling_famc_is_reported() {
        let mut db = Database::new(DatabaseConfig::default());
        let person = make_person(&mut db, "@I1@");
        attach(&mut db, person, "FAMC", "@F999@");
        db.ingest(person, "t.ged".to_string(), 1).unwrap();

        let mut log = ErrorLog::new();
        assert!(!validate_database(&db, &mut log));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].kind, ErrorKind::Linkage);
    }

    #[test]
    fn duplicate_child_in_family_is_structural() {
        let mut db = Database::new(DatabaseConfig::default());
        let child = make_person(&mut db, "@I3@");
        let fam = make_family(&mut db, "@F1@");
        db.ingest(child, "t.ged".to_string(), 1).unwrap();
        db.ingest(fam, "t.ged".to_string(), 2).unwrap();

        attach(&mut db, child, "FAMC", "@F1@");
        attach(&mut db, fam, "CHIL", "@I3@");
        attach(&mut db, fam, "CHIL", "@I3@");

        let mut log = ErrorLog::new();
        validate_database(&db, &mut log);
        assert!(log.iter().any(|e| e.kind == ErrorKind::Structural && e.message.contains("more than once")));
    }

    #[test]
    fn empty_family_is_structural() {
        let mut db = Database::new(DatabaseConfig::default());
        let fam = make_family(&mut db, "@F1@");
        db.ingest(fam, "t.ged".to_string(), 1).unwrap();

        let mut log = ErrorLog::new();
        validate_database(&db, &mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].kind, ErrorKind::Structural);
    }

    #[test]
    fn spouse_with_unknown_sex_is_reported() {
        let mut db = Database::new(DatabaseConfig::default());
        let person = make_person(&mut db, "@I1@");
        let fam = make_family(&mut db, "@F1@");
        db.ingest(person, "t.ged".to_string(), 1).unwrap();
        db.ingest(fam, "t.ged".to_string(), 2).unwrap();
        attach(&mut db, person, "FAMS", "@F1@");

        let mut log = ErrorLog::new();
        validate_database(&db, &mut log);
        assert!(log.iter().any(|e| e.message.contains("unknown sex")));
    }
}
