//! Single-record authorization against an effective scope.

use serde::{Deserialize, Serialize};
use tracing::debug;

use orgscope_core::{DeptId, PrincipalId};

use crate::{AccessError, DeptClosureResolver, DeptHierarchy, EffectiveScope, Subject};

/// Ownership columns of the record being authorized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOwnership {
    pub dept_id: Option<DeptId>,
    pub owner_id: Option<PrincipalId>,
}

impl RecordOwnership {
    pub fn new(dept_id: Option<DeptId>, owner_id: Option<PrincipalId>) -> Self {
        Self { dept_id, owner_id }
    }
}

/// Whether `subject` may act on `record` under `scope`.
///
/// Unlike listing filters this check denies. A scope that is only `SelfOnly`
/// requires the record's owner to be the subject. Any broader ladder grant
/// also admits the subject's own records, then falls back to department
/// membership; a record without a department is denied on that path. A
/// custom department set alone admits only its departments.
///
/// Listing filters and this check differ on purpose: under `DeptOwn` alone the
/// subject's own record in another department passes here but is not listed.
pub fn permits<H: DeptHierarchy>(
    scope: &EffectiveScope,
    subject: &Subject,
    record: &RecordOwnership,
    resolver: &DeptClosureResolver<H>,
) -> bool {
    if scope.is_unrestricted() {
        return true;
    }

    let owns = record.owner_id == Some(subject.principal_id);
    if !scope.has_dept_grant() {
        return scope.self_only && owns;
    }
    if owns && !scope.is_custom_only() {
        return true;
    }

    let Some(record_dept) = record.dept_id else {
        return false;
    };
    scope
        .accessible_dept_ids(subject, resolver)
        .is_none_or(|depts| depts.contains(&record_dept))
}

/// [`permits`] as a `Result`, for service code that propagates with `?`.
pub fn check_ownership<H: DeptHierarchy>(
    scope: &EffectiveScope,
    subject: &Subject,
    record: &RecordOwnership,
    resolver: &DeptClosureResolver<H>,
) -> Result<(), AccessError> {
    if permits(scope, subject, record, resolver) {
        Ok(())
    } else {
        debug!(principal = %subject.principal_id, ?record, "record outside data scope");
        Err(AccessError::PermissionDenied {
            principal: subject.principal_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnRef, FilterBuilder, RecordAccessor, ScopeColumns, ScopeKind, ScopePolicy, merge};
    use proptest::prelude::*;
    use std::collections::HashMap;

    struct Tree(HashMap<i64, Vec<i64>>);

    impl DeptHierarchy for Tree {
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

    /// 1 -> {2, 3}, 2 -> {8}, plus unrelated 4..=7; 9 and 10 are unknown.
    fn resolver() -> DeptClosureResolver<Tree> {
        DeptClosureResolver::new(Tree(HashMap::from([
            (1, vec![2, 3]),
            (2, vec![8]),
            (3, vec![]),
            (4, vec![]),
            (5, vec![]),
            (6, vec![]),
            (7, vec![]),
            (8, vec![]),
        ])))
    }

    impl RecordAccessor for RecordOwnership {
        fn column_value(&self, column: &ColumnRef) -> Option<i64> {
            match column.name.as_str() {
                "dept_id" => self.dept_id.map(DeptId::get),
                "create_by" => self.owner_id.map(PrincipalId::get),
                _ => None,
            }
        }
    }

    const U1: PrincipalId = PrincipalId::new(100);
    const U2: PrincipalId = PrincipalId::new(200);

    fn subject() -> Subject {
        Subject::new(U1, Some(DeptId::new(1)))
    }

    fn record(dept: i64, owner: PrincipalId) -> RecordOwnership {
        RecordOwnership::new(Some(DeptId::new(dept)), Some(owner))
    }

    #[test]
    fn subtree_scope_admits_descendants_only() {
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptAndDescendants)], subject().dept_id);
        assert!(permits(&scope, &subject(), &record(3, U2), &resolver()));
        assert!(!permits(&scope, &subject(), &record(4, U2), &resolver()));
    }

    #[test]
    fn self_branch_admits_own_record_outside_custom_set() {
        let scope = merge(
            &[
                ScopePolicy::custom([DeptId::new(5), DeptId::new(6)]),
                ScopePolicy::new(ScopeKind::SelfOnly),
            ],
            subject().dept_id,
        );
        assert!(permits(&scope, &subject(), &record(7, U1), &resolver()));
        assert!(!permits(&scope, &subject(), &record(7, U2), &resolver()));
        assert!(permits(&scope, &subject(), &record(6, U2), &resolver()));
    }

    #[test]
    fn self_only_requires_ownership() {
        let scope = merge(&[ScopePolicy::new(ScopeKind::SelfOnly)], subject().dept_id);
        assert!(permits(&scope, &subject(), &record(1, U1), &resolver()));
        assert!(!permits(&scope, &subject(), &record(1, U2), &resolver()));
    }

    #[test]
    fn custom_only_scope_ignores_ownership() {
        let scope = merge(&[ScopePolicy::custom([DeptId::new(5)])], subject().dept_id);
        assert!(!permits(&scope, &subject(), &record(7, U1), &resolver()));
        assert!(permits(&scope, &subject(), &record(5, U2), &resolver()));
    }

    #[test]
    fn subtree_scope_covers_a_home_department_missing_from_the_hierarchy() {
        let stray = Subject::new(U1, Some(DeptId::new(9)));
        let own = merge(&[ScopePolicy::new(ScopeKind::DeptOwn)], stray.dept_id);
        let subtree = merge(&[ScopePolicy::new(ScopeKind::DeptAndDescendants)], stray.dept_id);

        assert!(permits(&own, &stray, &record(9, U2), &resolver()));
        assert!(permits(&subtree, &stray, &record(9, U2), &resolver()));
        assert!(!permits(&subtree, &stray, &record(1, U2), &resolver()));
    }

    #[test]
    fn own_record_elsewhere_is_writable_but_not_listed() {
        let resolver = resolver();
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptOwn)], subject().dept_id);
        let columns = ScopeColumns::new(ColumnRef::new("dept_id"), ColumnRef::new("create_by"));
        let filter = FilterBuilder::new(&resolver).build(&scope, &columns, &subject());
        let own_elsewhere = record(4, U1);

        assert!(permits(&scope, &subject(), &own_elsewhere, &resolver));
        assert!(!filter.matches(&own_elsewhere));
        assert!(filter.matches(&record(1, U2)));
    }

    #[test]
    fn record_without_department_is_denied() {
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptOwn)], subject().dept_id);
        let orphan = RecordOwnership::new(None, Some(U2));
        assert!(!permits(&scope, &subject(), &orphan, &resolver()));
    }

    #[test]
    fn check_ownership_reports_principal() {
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptOwn)], subject().dept_id);
        let err = check_ownership(&scope, &subject(), &record(4, U2), &resolver()).unwrap_err();
        assert!(matches!(err, AccessError::PermissionDenied { principal } if principal == U1));
        assert!(check_ownership(&scope, &subject(), &record(1, U2), &resolver()).is_ok());
    }

    const LADDER: [ScopeKind; 4] = [
        ScopeKind::SelfOnly,
        ScopeKind::DeptOwn,
        ScopeKind::DeptAndDescendants,
        ScopeKind::All,
    ];

    fn other_policy() -> impl Strategy<Value = ScopePolicy> {
        prop_oneof![
            prop::sample::select(LADDER.to_vec()).prop_map(ScopePolicy::new),
            prop::collection::btree_set(1i64..9, 0..3)
                .prop_map(|ids| ScopePolicy::custom(ids.into_iter().map(DeptId::new))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: widening one role along the ladder never revokes access.
        #[test]
        fn permits_is_monotone_in_breadth(
            others in prop::collection::vec(other_policy(), 0..3),
            from in 0usize..4,
            step in 0usize..4,
            home in 1i64..11,
            dept in prop::option::of(1i64..10),
            owned in any::<bool>(),
        ) {
            let to = (from + step).min(LADDER.len() - 1);
            let subject = Subject::new(U1, Some(DeptId::new(home)));
            let record = RecordOwnership::new(dept.map(DeptId::new), Some(if owned { U1 } else { U2 }));
            let resolver = resolver();

            let scope_for = |kind: ScopeKind| {
                let mut policies = others.clone();
                policies.push(ScopePolicy::new(kind));
                merge(&policies, subject.dept_id)
            };

            let narrow = permits(&scope_for(LADDER[from]), &subject, &record, &resolver);
            let wide = permits(&scope_for(LADDER[to]), &subject, &record, &resolver);
            prop_assert!(!narrow || wide);
        }
    }
}
