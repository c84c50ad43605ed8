//! OR-merge of per-role policies into one effective scope.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use orgscope_core::DeptId;

use crate::{DeptClosureResolver, DeptHierarchy, NO_ROLE_SCOPE, RoleGrant, ScopeKind, ScopePolicy, Subject};

/// Union of a principal's scope policies.
///
/// When `unrestricted` is set every other field is meaningless and no filter
/// applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveScope {
    pub unrestricted: bool,
    pub own_dept: bool,
    /// Departments whose whole subtree is visible (expanded lazily).
    pub dept_and_descendants: BTreeSet<DeptId>,
    pub self_only: bool,
    pub custom_dept_ids: BTreeSet<DeptId>,
}

impl EffectiveScope {
    pub fn unrestricted() -> Self {
        Self {
            unrestricted: true,
            ..Self::default()
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    /// Any department-based grant (own, subtree or custom set).
    pub fn has_dept_grant(&self) -> bool {
        self.own_dept || !self.dept_and_descendants.is_empty() || !self.custom_dept_ids.is_empty()
    }

    /// Only the principal's own records are visible.
    pub fn is_self_only(&self) -> bool {
        !self.unrestricted && self.self_only && !self.has_dept_grant()
    }

    /// The only grant is an explicit custom department set.
    pub fn is_custom_only(&self) -> bool {
        !self.unrestricted
            && !self.self_only
            && !self.own_dept
            && self.dept_and_descendants.is_empty()
            && !self.custom_dept_ids.is_empty()
    }

    /// Departments whose rows are visible; `None` means every department.
    ///
    /// Subtree roots are expanded in a single traversal.
    pub fn accessible_dept_ids<H: DeptHierarchy>(
        &self,
        subject: &Subject,
        resolver: &DeptClosureResolver<H>,
    ) -> Option<BTreeSet<DeptId>> {
        if self.unrestricted {
            return None;
        }

        let mut depts = self.subtree_dept_ids(resolver);
        if self.own_dept {
            depts.extend(subject.dept_id);
        }
        depts.extend(self.custom_dept_ids.iter().copied());
        Some(depts)
    }

    /// Closure of the subtree roots, always including the roots themselves.
    ///
    /// A root that is missing from the hierarchy still covers its own rows, so
    /// a subtree grant is never narrower than the matching own-department one.
    pub fn subtree_dept_ids<H: DeptHierarchy>(&self, resolver: &DeptClosureResolver<H>) -> BTreeSet<DeptId> {
        let mut depts = resolver.closure_of_many(self.dept_and_descendants.iter().copied());
        depts.extend(self.dept_and_descendants.iter().copied());
        depts
    }

    fn absorb(&mut self, policy: &ScopePolicy, principal_dept: Option<DeptId>) {
        match policy.kind {
            ScopeKind::All => self.unrestricted = true,
            ScopeKind::DeptOwn => self.own_dept = true,
            ScopeKind::DeptAndDescendants => self.dept_and_descendants.extend(principal_dept),
            ScopeKind::SelfOnly => self.self_only = true,
            ScopeKind::CustomDepts => self.custom_dept_ids.extend(policy.custom_dept_ids.iter().copied()),
        }
    }
}

/// Merge policies with OR semantics: the broadest applicable role wins.
///
/// `All` short-circuits. An empty list merges as [`NO_ROLE_SCOPE`].
/// Subtree grants record the principal's own department as a root; expansion
/// is left to the filter builder so this step does no hierarchy I/O.
pub fn merge<'a, I>(policies: I, principal_dept: Option<DeptId>) -> EffectiveScope
where
    I: IntoIterator<Item = &'a ScopePolicy>,
{
    let mut scope = EffectiveScope::default();
    let mut merged = 0usize;

    for policy in policies {
        merged += 1;
        scope.absorb(policy, principal_dept);
        if scope.unrestricted {
            return EffectiveScope::unrestricted();
        }
    }

    if merged == 0 {
        scope.absorb(&ScopePolicy::new(NO_ROLE_SCOPE), principal_dept);
    }

    debug!(policies = merged, ?scope, "merged scope policies");
    scope
}

/// Derive each grant's policy and merge them.
pub fn merge_grants(grants: &[RoleGrant], principal_dept: Option<DeptId>) -> EffectiveScope {
    let policies: Vec<ScopePolicy> = grants.iter().map(ScopePolicy::from_grant).collect();
    merge(&policies, principal_dept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use proptest::prelude::*;

    const HOME: Option<DeptId> = Some(DeptId::new(10));

    fn kind_strategy() -> impl Strategy<Value = ScopePolicy> {
        prop_oneof![
            Just(ScopePolicy::new(ScopeKind::All)),
            Just(ScopePolicy::new(ScopeKind::DeptOwn)),
            Just(ScopePolicy::new(ScopeKind::DeptAndDescendants)),
            Just(ScopePolicy::new(ScopeKind::SelfOnly)),
            prop::collection::btree_set(1i64..50, 0..4)
                .prop_map(|ids| ScopePolicy::custom(ids.into_iter().map(DeptId::new))),
        ]
    }

    #[test]
    fn empty_role_list_equals_self_only() {
        let empty: [ScopePolicy; 0] = [];
        assert_eq!(merge(&empty, HOME), merge(&[ScopePolicy::new(ScopeKind::SelfOnly)], HOME));
        assert!(merge(&empty, HOME).is_self_only());
    }

    #[test]
    fn subtree_grant_records_home_department_as_root() {
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptAndDescendants)], HOME);
        assert_eq!(scope.dept_and_descendants, BTreeSet::from([DeptId::new(10)]));
        assert!(!scope.own_dept);

        let homeless = merge(&[ScopePolicy::new(ScopeKind::DeptAndDescendants)], None);
        assert!(homeless.dept_and_descendants.is_empty());
    }

    #[test]
    fn custom_sets_are_unioned() {
        let scope = merge(
            &[
                ScopePolicy::custom([DeptId::new(5), DeptId::new(6)]),
                ScopePolicy::custom([DeptId::new(6), DeptId::new(7)]),
                ScopePolicy::new(ScopeKind::SelfOnly),
            ],
            HOME,
        );

        assert_eq!(scope.custom_dept_ids.len(), 3);
        assert!(scope.self_only);
        assert!(!scope.is_self_only());
        assert!(!scope.is_custom_only());
    }

    #[test]
    fn grants_without_scope_are_unrestricted() {
        let grants = vec![
            RoleGrant::new(Role::new("clerk"), Some(ScopeKind::SelfOnly)),
            RoleGrant::new(Role::new("legacy"), None),
        ];
        assert!(merge_grants(&grants, HOME).is_unrestricted());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any list containing `All` merges to unrestricted.
        #[test]
        fn all_dominates(
            mut policies in prop::collection::vec(kind_strategy(), 0..6),
            at in any::<prop::sample::Index>(),
        ) {
            let pos = at.index(policies.len() + 1);
            policies.insert(pos, ScopePolicy::new(ScopeKind::All));
            prop_assert_eq!(merge(&policies, HOME), EffectiveScope::unrestricted());
        }

        /// Property: merge does not depend on policy order.
        #[test]
        fn merge_is_order_independent(
            (policies, shuffled) in prop::collection::vec(kind_strategy(), 0..6)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            prop_assert_eq!(merge(&policies, HOME), merge(&shuffled, HOME));
        }
    }
}
