//! Department closure: a department plus all of its transitive descendants.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::debug;

use orgscope_core::DeptId;

/// Read access to the department hierarchy.
pub trait DeptHierarchy: Send + Sync {
    /// Direct children of `dept_id` (empty for leaves and unknown ids).
    fn children_of(&self, dept_id: DeptId) -> Vec<DeptId>;

    fn exists(&self, dept_id: DeptId) -> bool;
}

impl<H> DeptHierarchy for Arc<H>
where
    H: DeptHierarchy + ?Sized,
{
    fn children_of(&self, dept_id: DeptId) -> Vec<DeptId> {
        (**self).children_of(dept_id)
    }

    fn exists(&self, dept_id: DeptId) -> bool {
        (**self).exists(dept_id)
    }
}

impl<H> DeptHierarchy for &H
where
    H: DeptHierarchy + ?Sized,
{
    fn children_of(&self, dept_id: DeptId) -> Vec<DeptId> {
        (**self).children_of(dept_id)
    }

    fn exists(&self, dept_id: DeptId) -> bool {
        (**self).exists(dept_id)
    }
}

/// Expands departments into their closures over a [`DeptHierarchy`].
///
/// Traversal keeps a visited set, so malformed (cyclic) hierarchy data still
/// terminates and every department is reported once.
#[derive(Debug, Clone)]
pub struct DeptClosureResolver<H> {
    hierarchy: H,
}

impl<H: DeptHierarchy> DeptClosureResolver<H> {
    pub fn new(hierarchy: H) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    /// `dept_id` plus every descendant; empty when `dept_id` does not exist.
    pub fn closure_of(&self, dept_id: DeptId) -> BTreeSet<DeptId> {
        self.closure_of_many([dept_id])
    }

    /// Union of the closures of `roots`, resolved in one breadth-first pass.
    ///
    /// Each department's children are fetched at most once even when subtrees
    /// overlap.
    pub fn closure_of_many<I>(&self, roots: I) -> BTreeSet<DeptId>
    where
        I: IntoIterator<Item = DeptId>,
    {
        let mut closure = BTreeSet::new();
        let mut queue = VecDeque::new();

        for root in roots {
            if closure.contains(&root) || !self.hierarchy.exists(root) {
                continue;
            }
            closure.insert(root);
            queue.push_back(root);
        }

        let mut lookups = 0usize;
        while let Some(dept) = queue.pop_front() {
            lookups += 1;
            for child in self.hierarchy.children_of(dept) {
                if closure.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        debug!(size = closure.len(), lookups, "resolved department closure");
        closure
    }

    /// Whether `candidate` lies in the subtree rooted at `ancestor` (inclusive).
    pub fn contains(&self, ancestor: DeptId, candidate: DeptId) -> bool {
        self.closure_of(ancestor).contains(&candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// parent -> children adjacency, for tests only.
    struct Adjacency(BTreeMap<i64, Vec<i64>>);

    impl Adjacency {
        fn new(edges: &[(i64, i64)]) -> Self {
            let mut map: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
            for &(parent, child) in edges {
                map.entry(parent).or_default().push(child);
                map.entry(child).or_default();
            }
            Self(map)
        }
    }

    impl DeptHierarchy for Adjacency {
        fn children_of(&self, dept_id: DeptId) -> Vec<DeptId> {
            self.0
                .get(&dept_id.get())
                .map(|c| c.iter().copied().map(DeptId::new).collect())
                .unwrap_or_default()
        }

        fn exists(&self, dept_id: DeptId) -> bool {
            self.0.contains_key(&dept_id.get())
        }
    }

    fn set(ids: &[i64]) -> BTreeSet<DeptId> {
        ids.iter().copied().map(DeptId::new).collect()
    }

    #[test]
    fn closure_contains_self_and_all_descendants() {
        let resolver = DeptClosureResolver::new(Adjacency::new(&[(1, 2), (1, 3), (3, 4), (5, 6)]));
        assert_eq!(resolver.closure_of(DeptId::new(1)), set(&[1, 2, 3, 4]));
        assert_eq!(resolver.closure_of(DeptId::new(4)), set(&[4]));
    }

    #[test]
    fn unknown_department_has_empty_closure() {
        let resolver = DeptClosureResolver::new(Adjacency::new(&[(1, 2)]));
        assert!(resolver.closure_of(DeptId::new(99)).is_empty());
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let resolver = DeptClosureResolver::new(Adjacency::new(&[(1, 2), (2, 3), (3, 1), (3, 3)]));
        assert_eq!(resolver.closure_of(DeptId::new(2)), set(&[1, 2, 3]));
    }

    #[test]
    fn closure_is_transitively_closed() {
        let resolver =
            DeptClosureResolver::new(Adjacency::new(&[(1, 2), (2, 3), (3, 4), (2, 5), (5, 6)]));
        let closure = resolver.closure_of(DeptId::new(2));
        let expanded = resolver.closure_of_many(closure.iter().copied());
        assert_eq!(closure, expanded);
    }

    #[test]
    fn many_roots_resolve_overlapping_subtrees_once() {
        let resolver = DeptClosureResolver::new(Adjacency::new(&[(1, 2), (2, 3), (7, 8)]));
        let closure = resolver.closure_of_many([DeptId::new(2), DeptId::new(1), DeptId::new(7), DeptId::new(42)]);
        assert_eq!(closure, set(&[1, 2, 3, 7, 8]));
        assert!(resolver.contains(DeptId::new(1), DeptId::new(3)));
        assert!(!resolver.contains(DeptId::new(2), DeptId::new(1)));
    }
}
