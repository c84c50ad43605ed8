//! Generic forest assembly over flat parent-pointer lists.
//!
//! Used for departments, menus and (through `orgscope-sys`) navigation
//! routes. Nodes are held in an arena indexed by id and recursion only follows
//! indices, so no node ever references its parent and no node can end up
//! attached under two parents.
//!
//! Assembly never fails: duplicate ids, broken ancestor chains and cycles
//! degrade to a partial forest.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::Hierarchical;

/// Key type usable as a node id, with a reserved root sentinel.
pub trait TreeKey: Copy + Eq + Hash + Debug {
    /// Parent id of top-level nodes.
    const ROOT: Self;

    fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl TreeKey for i64 {
    const ROOT: Self = 0;
}

/// One row of a flat hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatNode<K, T> {
    pub id: K,
    pub parent_id: K,
    pub sort_key: i32,
    pub payload: T,
}

impl<K: TreeKey, T> FlatNode<K, T> {
    pub fn new(id: K, parent_id: K, sort_key: i32, payload: T) -> Self {
        Self {
            id,
            parent_id,
            sort_key,
            payload,
        }
    }
}

impl<E> FlatNode<E::Id, E>
where
    E: Hierarchical,
    E::Id: TreeKey,
{
    /// Wrap a hierarchical entity, carrying the entity itself as payload.
    pub fn from_entity(entity: E) -> Self {
        Self {
            id: *entity.id(),
            parent_id: *entity.parent_id(),
            sort_key: entity.sort_key(),
            payload: entity,
        }
    }
}

/// A node of an assembled forest. Owns its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode<K, T> {
    pub id: K,
    pub parent_id: K,
    pub sort_key: i32,
    pub payload: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode<K, T>>,
}

impl<K: TreeKey, T> TreeNode<K, T> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    /// Depth-first, pre-order traversal of this subtree.
    pub fn iter(&self) -> Iter<'_, K, T> {
        Iter { stack: vec![self] }
    }

    /// Replace every payload, keeping ids, order and shape.
    pub fn map<U, F>(self, f: &mut F) -> TreeNode<K, U>
    where
        F: FnMut(T) -> U,
    {
        let payload = f(self.payload);
        let mut children = Vec::with_capacity(self.children.len());
        for child in self.children {
            children.push(child.map(&mut *f));
        }
        TreeNode {
            id: self.id,
            parent_id: self.parent_id,
            sort_key: self.sort_key,
            payload,
            children,
        }
    }
}

/// Depth-first, pre-order traversal over a whole forest.
pub fn walk<K: TreeKey, T>(forest: &[TreeNode<K, T>]) -> Iter<'_, K, T> {
    Iter {
        stack: forest.iter().rev().collect(),
    }
}

/// Pre-order iterator over tree nodes.
pub struct Iter<'a, K, T> {
    stack: Vec<&'a TreeNode<K, T>>,
}

impl<'a, K, T> Iterator for Iter<'a, K, T> {
    type Item = &'a TreeNode<K, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Assembly
// ─────────────────────────────────────────────────────────────────────────────

struct Arena<K, T> {
    slots: Vec<Option<FlatNode<K, T>>>,
    index: HashMap<K, usize>,
}

impl<K: TreeKey, T> Arena<K, T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    fn contains(&self, id: &K) -> bool {
        self.index.contains_key(id)
    }

    /// First occurrence wins; returns `false` for a duplicate id.
    fn insert(&mut self, node: FlatNode<K, T>) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id, self.slots.len());
        self.slots.push(Some(node));
        true
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Assemble a flat node list into a forest sorted by `sort_key` at every level.
///
/// For each supplied node the parent chain is walked upward; any parent that is
/// neither supplied nor the root sentinel is requested from
/// `resolve_missing_parent`. A `None` answer stops that walk only. Nodes that
/// remain unreachable from the root sentinel are dropped.
///
/// Siblings with equal sort keys keep their input order (resolved ancestors
/// count as appearing after every supplied node).
pub fn assemble<K, T, I, F>(nodes: I, mut resolve_missing_parent: F) -> Vec<TreeNode<K, T>>
where
    K: TreeKey,
    I: IntoIterator<Item = FlatNode<K, T>>,
    F: FnMut(K) -> Option<FlatNode<K, T>>,
{
    let nodes = nodes.into_iter();
    let mut arena = Arena::with_capacity(nodes.size_hint().0);

    let mut duplicates = 0usize;
    for node in nodes {
        if !arena.insert(node) {
            duplicates += 1;
        }
    }

    let supplied = arena.len();
    let completed = complete_ancestors(&mut arena, supplied, &mut resolve_missing_parent);

    let mut groups = group_by_parent(&arena);
    let forest = build_level(&mut arena, &mut groups, K::ROOT);

    let detached = arena.slots.iter().filter(|s| s.is_some()).count();
    debug!(
        supplied,
        duplicates,
        completed,
        detached,
        roots = forest.len(),
        "assembled forest"
    );

    forest
}

/// Assemble a list that is already ancestor-complete (no lookups).
pub fn assemble_complete<K, T, I>(nodes: I) -> Vec<TreeNode<K, T>>
where
    K: TreeKey,
    I: IntoIterator<Item = FlatNode<K, T>>,
{
    assemble(nodes, |_| None)
}

fn complete_ancestors<K, T, F>(arena: &mut Arena<K, T>, supplied: usize, resolve: &mut F) -> usize
where
    K: TreeKey,
    F: FnMut(K) -> Option<FlatNode<K, T>>,
{
    let mut completed = 0usize;

    for slot in 0..supplied {
        let (start, mut parent) = match &arena.slots[slot] {
            Some(node) => (node.id, node.parent_id),
            None => continue,
        };

        let mut visited: HashSet<K> = HashSet::new();
        visited.insert(start);

        while !parent.is_root() && !arena.contains(&parent) {
            if !visited.insert(parent) {
                warn!(node = ?start, ancestor = ?parent, "cycle in ancestor chain; branch truncated");
                break;
            }

            let Some(found) = resolve(parent) else {
                debug!(node = ?start, missing = ?parent, "ancestor not found; branch truncated");
                break;
            };

            if found.id != parent {
                warn!(requested = ?parent, returned = ?found.id, "ancestor lookup returned a different id");
            }

            let next = found.parent_id;
            if arena.insert(found) {
                completed += 1;
            }
            parent = next;
        }
    }

    completed
}

fn group_by_parent<K: TreeKey, T>(arena: &Arena<K, T>) -> HashMap<K, Vec<usize>> {
    let mut groups: HashMap<K, Vec<usize>> = HashMap::new();
    for (slot, node) in arena.slots.iter().enumerate() {
        if let Some(node) = node {
            groups.entry(node.parent_id).or_default().push(slot);
        }
    }
    groups
}

// Each group is consumed once and each slot taken once, so a cycle among
// non-root nodes is simply never reached.
fn build_level<K: TreeKey, T>(
    arena: &mut Arena<K, T>,
    groups: &mut HashMap<K, Vec<usize>>,
    parent: K,
) -> Vec<TreeNode<K, T>> {
    let Some(members) = groups.remove(&parent) else {
        return Vec::new();
    };

    let mut level = Vec::with_capacity(members.len());
    for slot in members {
        let Some(node) = arena.slots[slot].take() else {
            continue;
        };
        let children = build_level(arena, groups, node.id);
        level.push(TreeNode {
            id: node.id,
            parent_id: node.parent_id,
            sort_key: node.sort_key,
            payload: node.payload,
            children,
        });
    }

    // stable: equal keys keep arena order
    level.sort_by_key(|n| n.sort_key);
    level
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
