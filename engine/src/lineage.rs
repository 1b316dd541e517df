//! Lineage traversal: FAMC/FAMS/HUSB/WIFE/CHIL iteration over the node tree, resolved through the
//! record index.
//!
//! Every iterator here silently skips a pointer-valued line whose value doesn't resolve against
//! the record index. The [`crate::validator`] is what reports those; traversal just has to
//! survive them.

use crate::key::RecordKey;
use crate::node::{Arena, NodeId};
use crate::record_index::RecordIndex;

/// The sex recorded on a person, parsed from their `SEX` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

/// Reads the person's `SEX` value (first occurrence), defaulting to [`Sex::Unknown`] when absent
/// or unrecognised.
pub fn sex_of(arena: &Arena, person: NodeId) -> Sex {
    match arena.children_with_tag(person, "SEX").next().and_then(|n| arena.value(n)) {
        Some("M") => Sex::Male,
        Some("F") => Sex::Female,
        _ => Sex::Unknown,
    }
}

/// A pointer-valued child line (FAMC, FAMS, HUSB, WIFE, CHIL) resolved against the record index.
pub struct ResolvedLink {
    /// The node of the pointer line itself (e.g. the `FAMC` node), for line-number provenance.
    pub line: NodeId,
    /// The raw key text the line pointed at.
    pub key: RecordKey,
    /// The resolved target, or `None` if the key didn't resolve (a dangling link).
    pub target: Option<NodeId>,
}

fn resolve_links<'a>(
    arena: &'a Arena,
    index: &'a RecordIndex,
    root: NodeId,
    tag: &'static str,
) -> impl Iterator<Item = ResolvedLink> + 'a {
    arena.children_with_tag(root, tag).map(move |line| {
        let key = RecordKey::new(arena.value(line).unwrap_or_default());
        let target = index.lookup(&key);
        ResolvedLink { line, key, target }
    })
}

/// Yields each family a person is a child in, by following `FAMC` lines.
pub fn famcs_of<'a>(arena: &'a Arena, index: &'a RecordIndex, person: NodeId) -> impl Iterator<Item = ResolvedLink> + 'a {
    resolve_links(arena, index, person, "FAMC")
}

/// Yields each family a person is a spouse in, by following `FAMS` lines.
pub fn famss_of<'a>(arena: &'a Arena, index: &'a RecordIndex, person: NodeId) -> impl Iterator<Item = ResolvedLink> + 'a {
    resolve_links(arena, index, person, "FAMS")
}

/// Yields the husbands of a family, resolved from its `HUSB` lines.
pub fn husbs_of<'a>(arena: &'a Arena, index: &'a RecordIndex, family: NodeId) -> impl Iterator<Item = ResolvedLink> + 'a {
    resolve_links(arena, index, family, "HUSB")
}

/// Yields the wives of a family, resolved from its `WIFE` lines.
pub fn wifes_of<'a>(arena: &'a Arena, index: &'a RecordIndex, family: NodeId) -> impl Iterator<Item = ResolvedLink> + 'a {
    resolve_links(arena, index, family, "WIFE")
}

/// Yields the children of a family, resolved from its `CHIL` lines.
pub fn children_of<'a>(arena: &'a Arena, index: &'a RecordIndex, family: NodeId) -> impl Iterator<Item = ResolvedLink> + 'a {
    resolve_links(arena, index, family, "CHIL")
}

/// Resolved-only convenience wrappers: these drop links that failed to resolve, which is what
/// every higher-level consumer except the validator wants.
pub fn resolved_famcs<'a>(arena: &'a Arena, index: &'a RecordIndex, person: NodeId) -> impl Iterator<Item = NodeId> + 'a {
    famcs_of(arena, index, person).filter_map(|link| link.target)
}

pub fn resolved_famss<'a>(arena: &'a Arena, index: &'a RecordIndex, person: NodeId) -> impl Iterator<Item = NodeId> + 'a {
    famss_of(arena, index, person).filter_map(|link| link.target)
}

pub fn resolved_husbs<'a>(arena: &'a Arena, index: &'a RecordIndex, family: NodeId) -> impl Iterator<Item = NodeId> + 'a {
    husbs_of(arena, index, family).filter_map(|link| link.target)
}

pub fn resolved_wifes<'a>(arena: &'a Arena, index: &'a RecordIndex, family: NodeId) -> impl Iterator<Item = NodeId> + 'a {
    wifes_of(arena, index, family).filter_map(|link| link.target)
}

pub fn resolved_children<'a>(arena: &'a Arena, index: &'a RecordIndex, family: NodeId) -> impl Iterator<Item = NodeId> + 'a {
    children_of(arena, index, family).filter_map(|link| link.target)
}

/// Appends an existing child to an existing family: a `CHIL` line under the family and a matching
/// `FAMC` line under the child, via split/join.
pub fn add_child_to_family(arena: &mut Arena, child: NodeId, family: NodeId) {
    let child_key = arena.key(child).cloned().expect("child record must have a key");
    let family_key = arena.key(family).cloned().expect("family record must have a key");

    let mut family_buckets = crate::node::split_family(arena, family);
    let chil_line = arena.alloc(None, "CHIL", Some(child_key.as_str().to_string()));
    family_buckets.chil.push(chil_line);
    crate::node::join_family(arena, family, family_buckets);

    let mut person_buckets = crate::node::split_person(arena, child);
    let famc_line = arena.alloc(None, "FAMC", Some(family_key.as_str().to_string()));
    person_buckets.famc.push(famc_line);
    crate::node::join_person(arena, child, person_buckets);
}

/// Appends an existing spouse to an existing family as `HUSB` or `WIFE` depending on `sex`, and
/// appends a matching `FAMS` line to the spouse. `sex` must be [`Sex::Male`]
/// or [`Sex::Female`]; [`Sex::Unknown`] is rejected by the caller before this is invoked.
pub fn add_spouse_to_family(arena: &mut Arena, spouse: NodeId, family: NodeId, sex: Sex) {
    let spouse_key = arena.key(spouse).cloned().expect("spouse record must have a key");
    let family_key = arena.key(family).cloned().expect("family record must have a key");

    let mut family_buckets = crate::node::split_family(arena, family);
    let tag = match sex {
        Sex::Male => "HUSB",
        Sex::Female => "WIFE",
        Sex::Unknown => unreachable!("caller must resolve sex before adding a spouse"),
    };
    let spouse_line = arena.alloc(None, tag, Some(spouse_key.as_str().to_string()));
    match sex {
        Sex::Male => family_buckets.husb.push(spouse_line),
        Sex::Female => family_buckets.wife.push(spouse_line),
        Sex::Unknown => unreachable!(),
    }
    crate::node::join_family(arena, family, family_buckets);

    let mut person_buckets = crate::node::split_person(arena, spouse);
    let fams_line = arena.alloc(None, "FAMS", Some(family_key.as_str().to_string()));
    person_buckets.fams.push(fams_line);
    crate::node::join_person(arena, spouse, person_buckets);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RecordType;
    use crate::record_index::RecordSource;

    fn source() -> RecordSource {
        RecordSource { segment: "t.ged".into(), line: 1 }
    }

    #[test]
    fn dangling_famc_is_skipped_not_panicked() {
        let mut arena = Arena::new();
        let mut index = RecordIndex::new();
        let person = arena.alloc(Some(RecordKey::new("@I1@")), "INDI", None);
        index.insert(RecordKey::new("@I1@"), person, RecordType::Person, source()).unwrap();
        let famc = arena.alloc(None, "FAMC", Some("@F999@".to_string()));
        arena.append_child(person, famc);

        let links: Vec<_> = famcs_of(&arena, &index, person).collect();
        assert_eq!(links.len(), 1);
        assert!(links[0].target.is_none());
        assert_eq!(resolved_famcs(&arena, &index, person).count(), 0);
    }

    #[test]
    fn add_child_to_family_links_both_ways() {
        let mut arena = Arena::new();
        let mut index = RecordIndex::new();
        let family = arena.alloc(Some(RecordKey::new("@F1@")), "FAM", None);
        let child = arena.alloc(Some(RecordKey::new("@I3@")), "INDI", None);
        index.insert(RecordKey::new("@F1@"), family, RecordType::Family, source()).unwrap();
        index.insert(RecordKey::new("@I3@"), child, RecordType::Person, source()).unwrap();

        add_child_to_family(&mut arena, child, family);

        assert_eq!(resolved_children(&arena, &index, family).collect::<Vec<_>>(), vec![child]);
        assert_eq!(resolved_famcs(&arena, &index, child).collect::<Vec<_>>(), vec![family]);
    }

    #[test]
    fn add_spouse_to_family_picks_tag_from_sex() {
        let mut arena = Arena::new();
        let mut index = RecordIndex::new();
        let family = arena.alloc(Some(RecordKey::new("@F1@")), "FAM", None);
        let wife = arena.alloc(Some(RecordKey::new("@I2@")), "INDI", None);
        index.insert(RecordKey::new("@F1@"), family, RecordType::Family, source()).unwrap();
        index.insert(RecordKey::new("@I2@"), wife, RecordType::Person, source()).unwrap();

        add_spouse_to_family(&mut arena, wife, family, Sex::Female);

        assert_eq!(resolved_wifes(&arena, &index, family).collect::<Vec<_>>(), vec![wife]);
        assert_eq!(resolved_famss(&arena, &index, wife).collect::<Vec<_>>(), vec![family]);
    }
}
