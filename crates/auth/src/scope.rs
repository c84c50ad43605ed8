//! Scope kinds and per-role scope policies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use orgscope_core::DeptId;

use crate::RoleGrant;

/// Scope applied to a role whose record carries no kind (or an unknown code).
///
/// Fail-open: such a role sees every row. Kept as a named constant so the
/// choice stays auditable; see [`NO_ROLE_SCOPE`] for the opposite default.
pub const DEFAULT_ROLE_SCOPE: ScopeKind = ScopeKind::All;

/// Scope applied to a principal holding no roles at all (fail-closed).
pub const NO_ROLE_SCOPE: ScopeKind = ScopeKind::SelfOnly;

/// Category of row-level access a role grants.
///
/// Persisted as stable integer codes (1..=5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ScopeKind {
    /// Every row.
    All,
    /// Rows owned by the principal's own department.
    DeptOwn,
    /// Rows owned by the principal's department or any descendant.
    DeptAndDescendants,
    /// Rows created by the principal.
    SelfOnly,
    /// Rows owned by an explicit department set bound to the role.
    CustomDepts,
}

impl ScopeKind {
    pub const fn code(self) -> i32 {
        match self {
            ScopeKind::All => 1,
            ScopeKind::DeptOwn => 2,
            ScopeKind::DeptAndDescendants => 3,
            ScopeKind::SelfOnly => 4,
            ScopeKind::CustomDepts => 5,
        }
    }

    /// Decode a persisted code; unknown codes fall back to [`DEFAULT_ROLE_SCOPE`].
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ScopeKind::All,
            2 => ScopeKind::DeptOwn,
            3 => ScopeKind::DeptAndDescendants,
            4 => ScopeKind::SelfOnly,
            5 => ScopeKind::CustomDepts,
            _ => DEFAULT_ROLE_SCOPE,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ScopeKind::All => "All data",
            ScopeKind::DeptOwn => "Own department",
            ScopeKind::DeptAndDescendants => "Own department and descendants",
            ScopeKind::SelfOnly => "Own records only",
            ScopeKind::CustomDepts => "Custom departments",
        }
    }

    /// Position on the breadth ladder, widest first.
    ///
    /// `CustomDepts` carries an explicit set and is not on the ladder.
    pub const fn breadth_rank(self) -> Option<u8> {
        match self {
            ScopeKind::All => Some(0),
            ScopeKind::DeptAndDescendants => Some(1),
            ScopeKind::DeptOwn => Some(2),
            ScopeKind::SelfOnly => Some(3),
            ScopeKind::CustomDepts => None,
        }
    }

    /// `None` when either side is `CustomDepts`.
    pub fn is_at_least_as_broad_as(self, other: ScopeKind) -> Option<bool> {
        Some(self.breadth_rank()? <= other.breadth_rank()?)
    }
}

impl From<i32> for ScopeKind {
    fn from(code: i32) -> Self {
        ScopeKind::from_code(code)
    }
}

impl From<ScopeKind> for i32 {
    fn from(kind: ScopeKind) -> Self {
        kind.code()
    }
}

impl core::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Access rule derived from one role. Derived fresh per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePolicy {
    pub kind: ScopeKind,

    /// Only populated for [`ScopeKind::CustomDepts`].
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub custom_dept_ids: BTreeSet<DeptId>,
}

impl ScopePolicy {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            custom_dept_ids: BTreeSet::new(),
        }
    }

    pub fn custom(depts: impl IntoIterator<Item = DeptId>) -> Self {
        Self {
            kind: ScopeKind::CustomDepts,
            custom_dept_ids: depts.into_iter().collect(),
        }
    }

    /// Policy of a held role; an unset kind becomes [`DEFAULT_ROLE_SCOPE`].
    pub fn from_grant(grant: &RoleGrant) -> Self {
        match grant.data_scope.unwrap_or(DEFAULT_ROLE_SCOPE) {
            ScopeKind::CustomDepts => Self::custom(grant.custom_dept_ids.iter().copied()),
            kind => Self::new(kind),
        }
    }
}

impl From<ScopeKind> for ScopePolicy {
    fn from(kind: ScopeKind) -> Self {
        Self::new(kind)
    }
}
