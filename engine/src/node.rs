//! The node tree: an arena of GEDCOM line nodes linked by parent/first-child/next-sibling
//! references.
//!
//! Nodes are never owned by each other directly. The [`Arena`] owns every [`Node`] in a `Vec`
//! and everything else addresses them through a `Copy` [`NodeId`] handle, so the cyclic
//! parent/child relationship never needs `Rc`/`RefCell` or unsafe code.

use std::fmt;

use crate::key::RecordKey;

/// A stable handle to a node inside an [`Arena`]. Cheap to copy, meaningless outside the arena
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    key: Option<RecordKey>,
    tag: String,
    value: Option<String>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Owns every [`Node`] ever created for a database. `NodeId`s are only meaningful against the
/// `Arena` that minted them.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Allocates a new, childless, parentless node.
    pub fn alloc(&mut self, key: Option<RecordKey>, tag: impl Into<String>, value: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            key,
            tag: tag.into(),
            value,
            parent: None,
            first_child: None,
            next_sibling: None,
        });
        id
    }

    fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0 as usize]
    }

    pub fn key(&self, id: NodeId) -> Option<&RecordKey> {
        self.get(id).key.as_ref()
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.get(id).tag
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.get(id).value.as_deref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).first_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).next_sibling
    }

    /// True if `id` is a record root: no parent and a non-null key.
    pub fn is_record_root(&self, id: NodeId) -> bool {
        let data = self.get(id);
        data.parent.is_none() && data.key.is_some()
    }

    /// Appends `child` as the last child of `parent`, setting `child`'s parent link.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.get_mut(child).parent = Some(parent);
        match self.last_child(parent) {
            Some(last) => self.get_mut(last).next_sibling = Some(child),
            None => self.get_mut(parent).first_child = Some(child),
        }
    }

    fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        let mut current = self.get(parent).first_child?;
        while let Some(next) = self.get(current).next_sibling {
            current = next;
        }
        Some(current)
    }

    /// Direct children of `id`, in document order.
    pub fn children(&self, id: NodeId) -> ChildrenIter<'_> {
        ChildrenIter { arena: self, next: self.first_child(id) }
    }

    /// Direct children of `id` whose tag equals `tag`, in document order.
    pub fn children_with_tag<'a>(&'a self, id: NodeId, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).filter(move |&child| self.tag(child) == tag)
    }

    /// Every descendant of `id`, in document (preorder) order. Does not include `id` itself.
    pub fn traverse(&self, id: NodeId) -> TraverseIter<'_> {
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        TraverseIter { arena: self, stack }
    }

    /// Rebuilds a sibling chain from an ordered list of node ids, reparenting each one under
    /// `parent` (or leaving them parentless if `parent` is `None`). Returns the chain's head.
    fn relink_chain(&mut self, parent: Option<NodeId>, ids: &[NodeId]) -> Option<NodeId> {
        for window in ids.windows(2) {
            self.get_mut(window[0]).next_sibling = Some(window[1]);
        }
        if let Some(&last) = ids.last() {
            self.get_mut(last).next_sibling = None;
        }
        for &id in ids {
            self.get_mut(id).parent = parent;
        }
        ids.first().copied()
    }

    /// Detaches the node list `ids` into a standalone sibling chain with no parent links. The
    /// nodes keep their relative order. This is the building block `split` and `join` share.
    pub fn detach_chain(&mut self, ids: &[NodeId]) -> Option<NodeId> {
        self.relink_chain(None, ids)
    }

    /// Attaches the node list `ids` as the sibling chain of `parent`'s children, in order,
    /// replacing whatever children `parent` had.
    pub fn attach_chain(&mut self, parent: NodeId, ids: &[NodeId]) {
        let head = self.relink_chain(Some(parent), ids);
        self.get_mut(parent).first_child = head;
    }
}

pub struct ChildrenIter<'a> {
    arena: &'a Arena,
    next: Option<NodeId>,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena.next_sibling(current);
        Some(current)
    }
}

pub struct TraverseIter<'a> {
    arena: &'a Arena,
    stack: Vec<NodeId>,
}

impl Iterator for TraverseIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        let mut children: Vec<NodeId> = self.arena.children(current).collect();
        children.reverse();
        self.stack.extend(children);
        Some(current)
    }
}

/// The buckets a Person record's children split into.
#[derive(Debug, Default, Clone)]
pub struct PersonBuckets {
    pub names: Vec<NodeId>,
    pub refns: Vec<NodeId>,
    pub sex: Vec<NodeId>,
    pub body: Vec<NodeId>,
    pub famc: Vec<NodeId>,
    pub fams: Vec<NodeId>,
}

/// The buckets a Family record's children split into.
#[derive(Debug, Default, Clone)]
pub struct FamilyBuckets {
    pub refns: Vec<NodeId>,
    pub husb: Vec<NodeId>,
    pub wife: Vec<NodeId>,
    pub chil: Vec<NodeId>,
    pub rest: Vec<NodeId>,
}

/// Splits a Person record root's children into named buckets, detaching each into its own
/// parentless sibling chain. The root retains no children until [`join_person`] is called.
pub fn split_person(arena: &mut Arena, root: NodeId) -> PersonBuckets {
    let mut buckets = PersonBuckets::default();
    for child in arena.children(root).collect::<Vec<_>>() {
        match arena.tag(child) {
            "NAME" => buckets.names.push(child),
            "REFN" => buckets.refns.push(child),
            "SEX" => buckets.sex.push(child),
            "FAMC" => buckets.famc.push(child),
            "FAMS" => buckets.fams.push(child),
            _ => buckets.body.push(child),
        }
    }
    for list in [&buckets.names, &buckets.refns, &buckets.sex, &buckets.body, &buckets.famc, &buckets.fams] {
        arena.detach_chain(list);
    }
    arena.attach_chain(root, &[]);
    buckets
}

/// Reattaches a Person's buckets under `root` in canonical order: names, refns, sex, body,
/// famc-list, fams-list. This is the identity on sibling order when the buckets are unchanged
/// from a prior [`split_person`] call.
pub fn join_person(arena: &mut Arena, root: NodeId, buckets: PersonBuckets) {
    let all: Vec<NodeId> = buckets
        .names
        .into_iter()
        .chain(buckets.refns)
        .chain(buckets.sex)
        .chain(buckets.body)
        .chain(buckets.famc)
        .chain(buckets.fams)
        .collect();
    arena.attach_chain(root, &all);
}

/// Splits a Family record root's children into named buckets. See [`split_person`].
pub fn split_family(arena: &mut Arena, root: NodeId) -> FamilyBuckets {
    let mut buckets = FamilyBuckets::default();
    for child in arena.children(root).collect::<Vec<_>>() {
        match arena.tag(child) {
            "REFN" => buckets.refns.push(child),
            "HUSB" => buckets.husb.push(child),
            "WIFE" => buckets.wife.push(child),
            "CHIL" => buckets.chil.push(child),
            _ => buckets.rest.push(child),
        }
    }
    for list in [&buckets.refns, &buckets.husb, &buckets.wife, &buckets.chil, &buckets.rest] {
        arena.detach_chain(list);
    }
    arena.attach_chain(root, &[]);
    buckets
}

/// Reattaches a Family's buckets under `root` in canonical order: refns, husb-list, wife-list,
/// chil-list, rest. See [`join_person`].
pub fn join_family(arena: &mut Arena, root: NodeId, buckets: FamilyBuckets) {
    let all: Vec<NodeId> = buckets
        .refns
        .into_iter()
        .chain(buckets.husb)
        .chain(buckets.wife)
        .chain(buckets.chil)
        .chain(buckets.rest)
        .collect();
    arena.attach_chain(root, &all);
}
