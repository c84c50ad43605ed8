//! Human-readable summary of a principal's data scope.

use std::collections::BTreeSet;

use serde::Serialize;

use orgscope_core::{DeptId, PrincipalId};

use crate::{NO_ROLE_SCOPE, Role, RoleGrant, ScopeKind, ScopePolicy, Subject};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSummary {
    /// Broadest kind held.
    pub kind: ScopeKind,
    pub label: &'static str,
    pub principal_id: PrincipalId,
    pub dept_id: Option<DeptId>,
    pub roles: Vec<Role>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub custom_dept_ids: BTreeSet<DeptId>,
}

/// Summarize the grants of `subject`.
///
/// The reported kind is the widest ladder kind any role grants; a principal
/// holding only custom roles reports `CustomDepts`, one holding no roles
/// reports [`NO_ROLE_SCOPE`].
pub fn summarize(grants: &[RoleGrant], subject: &Subject) -> ScopeSummary {
    let policies: Vec<ScopePolicy> = grants.iter().map(ScopePolicy::from_grant).collect();

    let widest = policies
        .iter()
        .filter_map(|p| p.kind.breadth_rank().map(|rank| (rank, p.kind)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, kind)| kind);

    let kind = match widest {
        Some(kind) => kind,
        None if !policies.is_empty() => ScopeKind::CustomDepts,
        None => NO_ROLE_SCOPE,
    };

    ScopeSummary {
        kind,
        label: kind.label(),
        principal_id: subject.principal_id,
        dept_id: subject.dept_id,
        roles: grants.iter().map(|g| g.role.clone()).collect(),
        custom_dept_ids: policies
            .iter()
            .flat_map(|p| p.custom_dept_ids.iter().copied())
            .collect(),
    }
}
