//! Sequence algebra: seed constructors, graph-closure operators, and set operators over
//! [`Sequence`]s of persons.

use std::collections::{HashSet, VecDeque};

use itertools::{EitherOrBoth, Itertools};

use crate::cancel::CancelToken;
use crate::database::Database;
use crate::key::RecordKey;
use crate::lineage;
use crate::name_index::NameIndex;
use crate::node::NodeId;
use crate::sequence::Sequence;

fn key_of(database: &Database, node: NodeId) -> RecordKey {
    database.arena().key(node).cloned().expect("node came from a record root")
}

/// The union of CHIL links across every FAMS family of `person`, in FAMS-then-CHIL document order.
pub fn person_to_children<'db>(database: &'db Database, person: NodeId) -> Sequence<'db> {
    let arena = database.arena();
    let index = database.record_index();
    let mut seq = Sequence::new(database);
    for family in lineage::resolved_famss(arena, index, person) {
        for child in lineage::resolved_children(arena, index, family) {
            seq.append(key_of(database, child), None);
        }
    }
    seq
}

/// The HUSB of each FAMC family of `person`.
pub fn person_to_fathers<'db>(database: &'db Database, person: NodeId) -> Sequence<'db> {
    let arena = database.arena();
    let index = database.record_index();
    let mut seq = Sequence::new(database);
    for family in lineage::resolved_famcs(arena, index, person) {
        for father in lineage::resolved_husbs(arena, index, family) {
            seq.append(key_of(database, father), None);
        }
    }
    seq
}

/// The WIFE of each FAMC family of `person`.
pub fn person_to_mothers<'db>(database: &'db Database, person: NodeId) -> Sequence<'db> {
    let arena = database.arena();
    let index = database.record_index();
    let mut seq = Sequence::new(database);
    for family in lineage::resolved_famcs(arena, index, person) {
        for mother in lineage::resolved_wifes(arena, index, family) {
            seq.append(key_of(database, mother), None);
        }
    }
    seq
}

/// The children of `family`.
pub fn family_to_children<'db>(database: &'db Database, family: NodeId) -> Sequence<'db> {
    let mut seq = Sequence::new(database);
    for child in lineage::resolved_children(database.arena(), database.record_index(), family) {
        seq.append(key_of(database, child), None);
    }
    seq
}

/// The husbands of `family`.
pub fn family_to_fathers<'db>(database: &'db Database, family: NodeId) -> Sequence<'db> {
    let mut seq = Sequence::new(database);
    for husb in lineage::resolved_husbs(database.arena(), database.record_index(), family) {
        seq.append(key_of(database, husb), None);
    }
    seq
}

/// The wives of `family`.
pub fn family_to_mothers<'db>(database: &'db Database, family: NodeId) -> Sequence<'db> {
    let mut seq = Sequence::new(database);
    for wife in lineage::resolved_wifes(database.arena(), database.record_index(), family) {
        seq.append(key_of(database, wife), None);
    }
    seq
}

/// For each FAMS family of `person`, every opposite-role partner, excluding `person` itself.
pub fn person_to_spouses<'db>(database: &'db Database, person: NodeId) -> Sequence<'db> {
    let arena = database.arena();
    let index = database.record_index();
    let mut seq = Sequence::new(database);
    for family in lineage::resolved_famss(arena, index, person) {
        for husb in lineage::resolved_husbs(arena, index, family) {
            if husb != person {
                seq.append(key_of(database, husb), None);
            }
        }
        for wife in lineage::resolved_wifes(arena, index, family) {
            if wife != person {
                seq.append(key_of(database, wife), None);
            }
        }
    }
    seq
}

/// The families `person` belongs to: FAMS only, or FAMS ∪ FAMC when `include_child_families`.
pub fn person_to_families<'db>(database: &'db Database, person: NodeId, include_child_families: bool) -> Sequence<'db> {
    let arena = database.arena();
    let index = database.record_index();
    let mut seq = Sequence::new(database);
    for family in lineage::resolved_famss(arena, index, person) {
        seq.append(key_of(database, family), None);
    }
    if include_child_families {
        for family in lineage::resolved_famcs(arena, index, person) {
            seq.append(key_of(database, family), None);
        }
    }
    seq
}

/// Resolves `pattern` through the name index, applying its wildcard rules.
pub fn name_to_sequence<'db>(database: &'db Database, name_index: &NameIndex, pattern: &str) -> Sequence<'db> {
    Sequence::from_keys(database, name_index.search(pattern))
}

fn resolve_node(database: &Database, key: &RecordKey) -> Option<NodeId> {
    database.record_index().lookup(key)
}

/// Shared BFS machinery for the upward/downward closures: `step` yields the one-hop neighbours of
/// a person-node (parents or children); `closed` controls whether the seed is included.
fn bfs_closure<'db>(
    database: &'db Database,
    seed: &Sequence<'db>,
    closed: bool,
    cancel: Option<&CancelToken>,
    step: impl Fn(&Database, NodeId) -> Vec<NodeId>,
) -> Sequence<'db> {
    let seed_keys: HashSet<RecordKey> = seed.keys().cloned().collect();
    let mut visited: HashSet<RecordKey> = seed_keys.clone();
    let mut queue: VecDeque<NodeId> = seed
        .keys()
        .filter_map(|key| resolve_node(database, key))
        .collect();

    let mut discovered: Vec<RecordKey> = Vec::new();
    while let Some(current) = queue.pop_front() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            break;
        }
        for next in step(database, current) {
            let next_key = key_of(database, next);
            if visited.insert(next_key.clone()) {
                discovered.push(next_key);
                queue.push_back(next);
            }
        }
    }

    let mut seq = Sequence::new(database);
    if closed {
        for key in seed.keys() {
            seq.append(key.clone(), None);
        }
    }
    for key in discovered {
        seq.append(key, None);
    }
    seq
}

/// BFS upward through FAMC→HUSB/WIFE from every element of `seed`. Checks `cancel` once per
/// dequeued frontier node, when supplied.
pub fn ancestor_sequence<'db>(
    database: &'db Database,
    seed: &Sequence<'db>,
    closed: bool,
    cancel: Option<&CancelToken>,
) -> Sequence<'db> {
    bfs_closure(database, seed, closed, cancel, |database, person| {
        let arena = database.arena();
        let index = database.record_index();
        lineage::resolved_famcs(arena, index, person)
            .flat_map(|family| {
                lineage::resolved_husbs(arena, index, family).chain(lineage::resolved_wifes(arena, index, family))
            })
            .collect()
    })
}

/// BFS downward through FAMS→CHIL from every element of `seed`. Checks `cancel` once per dequeued
/// frontier node, when supplied.
pub fn descendent_sequence<'db>(
    database: &'db Database,
    seed: &Sequence<'db>,
    closed: bool,
    cancel: Option<&CancelToken>,
) -> Sequence<'db> {
    bfs_closure(database, seed, closed, cancel, |database, person| {
        let arena = database.arena();
        let index = database.record_index();
        lineage::resolved_famss(arena, index, person)
            .flat_map(|family| lineage::resolved_children(arena, index, family))
            .collect()
    })
}

/// The union of CHIL(FAMC(p)) for each p in `seed`. `self` is filtered out unless `include_self`.
pub fn sibling_sequence<'db>(database: &'db Database, seed: &Sequence<'db>, include_self: bool) -> Sequence<'db> {
    let arena = database.arena();
    let index = database.record_index();
    let seed_nodes: HashSet<NodeId> = seed.keys().filter_map(|key| resolve_node(database, key)).collect();

    let mut seq = Sequence::new(database);
    for person in seed_nodes.iter().copied() {
        for family in lineage::resolved_famcs(arena, index, person) {
            for sibling in lineage::resolved_children(arena, index, family) {
                if include_self || !seed_nodes.contains(&sibling) {
                    seq.append(key_of(database, sibling), None);
                }
            }
        }
    }
    seq
}

/// One-hop parents of every element of `seq` (both FAMC-resolved HUSB and WIFE).
pub fn parent_sequence<'db>(database: &'db Database, seq: &Sequence<'db>) -> Sequence<'db> {
    let arena = database.arena();
    let index = database.record_index();
    let mut out = Sequence::new(database);
    for person in seq.keys().filter_map(|key| resolve_node(database, key)) {
        for family in lineage::resolved_famcs(arena, index, person) {
            for parent in lineage::resolved_husbs(arena, index, family).chain(lineage::resolved_wifes(arena, index, family)) {
                out.append(key_of(database, parent), None);
            }
        }
    }
    out
}

/// One-hop children of every element of `seq` (FAMS-resolved CHIL).
pub fn child_sequence<'db>(database: &'db Database, seq: &Sequence<'db>) -> Sequence<'db> {
    let arena = database.arena();
    let index = database.record_index();
    let mut out = Sequence::new(database);
    for person in seq.keys().filter_map(|key| resolve_node(database, key)) {
        for family in lineage::resolved_famss(arena, index, person) {
            for child in lineage::resolved_children(arena, index, family) {
                out.append(key_of(database, child), None);
            }
        }
    }
    out
}

/// One-hop spouses of every element of `seq`.
pub fn spouse_sequence<'db>(database: &'db Database, seq: &Sequence<'db>) -> Sequence<'db> {
    let mut out = Sequence::new(database);
    for person in seq.keys().filter_map(|key| resolve_node(database, key)) {
        out.append_sequence(&person_to_spouses(database, person));
    }
    out
}

/// The merge of `unique(a)` and `unique(b)` by key comparator. `a` and `b` are not mutated.
pub fn union<'db>(a: &Sequence<'db>, b: &Sequence<'db>) -> Sequence<'db> {
    let left = a.unique();
    let right = b.unique();
    let mut out = Sequence::new(a.database());
    for entry in left.keys().merge(right.keys()) {
        out.append(entry.clone(), None);
    }
    out.unique_in_place();
    out
}

/// The keys present in both `a` and `b`, found by a linear merge-join over both `KeySorted`,
/// unique inputs.
pub fn intersect<'db>(a: &Sequence<'db>, b: &Sequence<'db>) -> Sequence<'db> {
    let left = a.unique();
    let right = b.unique();
    let mut out = Sequence::new(a.database());
    for either in left.keys().merge_join_by(right.keys(), |l, r| l.cmp(r)) {
        if let EitherOrBoth::Both(key, _) = either {
            out.append(key.clone(), None);
        }
    }
    out
}

/// The keys in `a` that are not in `b`, found by the same merge-join as [`intersect`].
pub fn difference<'db>(a: &Sequence<'db>, b: &Sequence<'db>) -> Sequence<'db> {
    let left = a.unique();
    let right = b.unique();
    let mut out = Sequence::new(a.database());
    for either in left.keys().merge_join_by(right.keys(), |l, r| l.cmp(r)) {
        if let EitherOrBoth::Left(key) = either {
            out.append(key.clone(), None);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseConfig;
    use crate::key::RecordKey;
    use crate::lineage::{add_child_to_family, add_spouse_to_family, Sex};

    /// Builds the S5-style toy tree: @I1@ (father) + @I2@ (mother) married in @F1@, parents of
    /// @I3@.
    fn toy_tree() -> (Database, NodeId, NodeId, NodeId) {
        let mut db = Database::new(DatabaseConfig::default());
        let father = db.arena_mut().alloc(Some(RecordKey::new("@I1@")), "INDI", None);
        let sex_m = db.arena_mut().alloc(None, "SEX", Some("M".to_string()));
        db.arena_mut().append_child(father, sex_m);
        let mother = db.arena_mut().alloc(Some(RecordKey::new("@I2@")), "INDI", None);
        let sex_f = db.arena_mut().alloc(None, "SEX", Some("F".to_string()));
        db.arena_mut().append_child(mother, sex_f);
        let family = db.arena_mut().alloc(Some(RecordKey::new("@F1@")), "FAM", None);
        let child = db.arena_mut().alloc(Some(RecordKey::new("@I3@")), "INDI", None);

        db.ingest(father, "t.ged".to_string(), 1).unwrap();
        db.ingest(mother, "t.ged".to_string(), 2).unwrap();
        db.ingest(family, "t.ged".to_string(), 3).unwrap();
        db.ingest(child, "t.ged".to_string(), 4).unwrap();

        add_spouse_to_family(db.arena_mut(), father, family, Sex::Male);
        add_spouse_to_family(db.arena_mut(), mother, family, Sex::Female);
        add_child_to_family(db.arena_mut(), child, family);

        (db, father, mother, child)
    }

    #[test]
    fn ancestor_sequence_open_excludes_seed() {
        let (db, _father, _mother, child) = toy_tree();
        let seed = Sequence::from_keys(&db, [RecordKey::new("@I3@")]);
        let mut result = ancestor_sequence(&db, &seed, false, None);
        result.key_sort();
        let keys: Vec<_> = result.keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(keys, vec!["@I1@", "@I2@"]);
        let _ = child;
    }

    #[test]
    fn ancestor_sequence_closed_includes_seed() {
        let (db, ..) = toy_tree();
        let seed = Sequence::from_keys(&db, [RecordKey::new("@I3@")]);
        let mut result = ancestor_sequence(&db, &seed, true, None);
        result.key_sort();
        let keys: Vec<_> = result.keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(keys, vec!["@I1@", "@I2@", "@I3@"]);
    }

    #[test]
    fn descendent_sequence_finds_child() {
        let (db, father, ..) = toy_tree();
        let seed = Sequence::from_keys(&db, [RecordKey::new("@I1@")]);
        let result = descendent_sequence(&db, &seed, false, None);
        assert_eq!(result.keys().collect::<Vec<_>>(), vec![&RecordKey::new("@I3@")]);
        let _ = father;
    }

    #[test]
    fn person_to_spouses_excludes_self() {
        let (db, father, mother, _child) = toy_tree();
        let spouses = person_to_spouses(&db, father);
        assert_eq!(spouses.keys().collect::<Vec<_>>(), vec![&key_of(&db, mother)]);
    }

    #[test]
    fn union_is_commutative_and_deduped() {
        let db = Database::new(DatabaseConfig::default());
        let a = Sequence::from_keys(&db, [RecordKey::new("@I1@"), RecordKey::new("@I2@")]);
        let b = Sequence::from_keys(&db, [RecordKey::new("@I2@"), RecordKey::new("@I3@")]);
        let mut ab = union(&a, &b);
        let mut ba = union(&b, &a);
        ab.key_sort();
        ba.key_sort();
        let ab_keys: Vec<_> = ab.keys().collect();
        let ba_keys: Vec<_> = ba.keys().collect();
        assert_eq!(ab_keys, ba_keys);
        assert_eq!(ab.len(), 3);
    }

    #[test]
    fn difference_of_a_with_itself_is_empty() {
        let db = Database::new(DatabaseConfig::default());
        let a = Sequence::from_keys(&db, [RecordKey::new("@I1@"), RecordKey::new("@I2@")]);
        assert!(difference(&a, &a).is_empty());
    }

    #[test]
    fn intersect_finds_common_keys() {
        let db = Database::new(DatabaseConfig::default());
        let a = Sequence::from_keys(&db, [RecordKey::new("@I1@"), RecordKey::new("@I2@")]);
        let b = Sequence::from_keys(&db, [RecordKey::new("@I2@"), RecordKey::new("@I3@")]);
        let result = intersect(&a, &b);
        assert_eq!(result.keys().collect::<Vec<_>>(), vec![&RecordKey::new("@I2@")]);
    }
}
