//! The partitioner: connected-component decomposition of the person+family subgraph, plus
//! per-person ancestor/descendant reachability counts.
//!
//! A single pass over person roots expands each unvisited one through its family links until the
//! component is exhausted.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::cancel::CancelToken;
use crate::database::Database;
use crate::error::{ErrorKind, ErrorLog};
use crate::key::{RecordKey, RecordType};
use crate::lineage;
use crate::node::NodeId;
use crate::sequence::Sequence;

fn key_of(database: &Database, node: NodeId) -> RecordKey {
    database.arena().key(node).cloned().expect("node came from a record root")
}

/// Every person reachable from `start` through FAMC/FAMS/HUSB/WIFE/CHIL edges, expanding through
/// families without emitting them into the result. Dangling links are logged and skipped.
fn component_of(database: &Database, start: NodeId, log: &mut ErrorLog, cancel: Option<&CancelToken>) -> HashSet<NodeId> {
    let arena = database.arena();
    let index = database.record_index();

    let mut visited_people: HashSet<NodeId> = HashSet::new();
    let mut visited_families: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    queue.push_back(start);
    visited_people.insert(start);

    while let Some(person) = queue.pop_front() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            break;
        }
        for link in lineage::famcs_of(arena, index, person).chain(lineage::famss_of(arena, index, person)) {
            let Some(family) = link.target else {
                let person_key = key_of(database, person);
                let source = index.source(&person_key);
                let segment = source.map_or_else(|| database.last_segment().to_string(), |s| s.segment.clone());
                let line = source.map_or(0, |s| s.line);
                log.push(ErrorKind::Linkage, segment, line, format!("dangling family link {} from person {person_key}", link.key));
                continue;
            };
            if !visited_families.insert(family) {
                continue;
            }
            for member in lineage::resolved_husbs(arena, index, family)
                .chain(lineage::resolved_wifes(arena, index, family))
                .chain(lineage::resolved_children(arena, index, family))
            {
                if visited_people.insert(member) {
                    queue.push_back(member);
                }
            }
        }
    }
    visited_people
}

/// Partitions every person in the database into connected components, in seed-discovery order
/// (the order person roots were ingested).
pub fn partition<'db>(database: &'db Database, log: &mut ErrorLog, cancel: Option<&CancelToken>) -> Vec<Sequence<'db>> {
    let mut assigned: HashSet<NodeId> = HashSet::new();
    let mut components = Vec::new();

    for key in database.record_index().keys_of_type(RecordType::Person) {
        let person = database.record_index().lookup(key).expect("key came from the record index");
        if assigned.contains(&person) {
            continue;
        }
        let component = component_of(database, person, log, cancel);
        let mut seq = Sequence::new(database);
        for member in &component {
            seq.append(key_of(database, *member), None);
        }
        seq.key_sort();
        assigned.extend(component);
        components.push(seq);
    }
    components
}

fn bfs_count(database: &Database, start: NodeId, step: impl Fn(&Database, NodeId) -> Vec<NodeId>) -> usize {
    let mut visited: HashSet<NodeId> = HashSet::from([start]);
    let mut queue: VecDeque<NodeId> = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for next in step(database, current) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited.len() - 1
}

fn ancestors_of(database: &Database, person: NodeId) -> Vec<NodeId> {
    let arena = database.arena();
    let index = database.record_index();
    lineage::resolved_famcs(arena, index, person)
        .flat_map(|family| lineage::resolved_husbs(arena, index, family).chain(lineage::resolved_wifes(arena, index, family)))
        .collect()
}

fn descendents_of(database: &Database, person: NodeId) -> Vec<NodeId> {
    let arena = database.arena();
    let index = database.record_index();
    lineage::resolved_famss(arena, index, person)
        .flat_map(|family| lineage::resolved_children(arena, index, family))
        .collect()
}

/// A side table of per-person reachability counts.
#[derive(Debug, Default)]
pub struct ReachabilityTable {
    ancestors: HashMap<RecordKey, usize>,
    descendents: HashMap<RecordKey, usize>,
}

impl ReachabilityTable {
    pub fn num_ancestors(&self, key: &RecordKey) -> usize {
        self.ancestors.get(key).copied().unwrap_or(0)
    }

    pub fn num_descendents(&self, key: &RecordKey) -> usize {
        self.descendents.get(key).copied().unwrap_or(0)
    }
}

/// Computes `numAncestors`/`numDescendents` for every person in the database via single-source
/// BFS through the upward/downward closures.
pub fn reachability_table(database: &Database) -> ReachabilityTable {
    let mut table = ReachabilityTable::default();
    for key in database.record_index().keys_of_type(RecordType::Person) {
        let person = database.record_index().lookup(key).expect("key came from the record index");
        table.ancestors.insert(key.clone(), bfs_count(database, person, ancestors_of));
        table.descendents.insert(key.clone(), bfs_count(database, person, descendents_of));
    }
    table
}
