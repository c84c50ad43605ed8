use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use orgscope_core::{DeptId, PrincipalId};

use crate::ScopeKind;

/// Role code (e.g. "admin", "dept_manager").
///
/// Roles are opaque strings at this layer; what they grant is carried by
/// [`RoleGrant`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Data-scope facts of one role held by a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,

    /// `None` when the role record carries no scope kind.
    pub data_scope: Option<ScopeKind>,

    /// Departments bound to the role; only meaningful for custom scopes.
    #[serde(default)]
    pub custom_dept_ids: BTreeSet<DeptId>,
}

impl RoleGrant {
    pub fn new(role: Role, data_scope: Option<ScopeKind>) -> Self {
        Self {
            role,
            data_scope,
            custom_dept_ids: BTreeSet::new(),
        }
    }

    pub fn with_custom_depts(mut self, depts: impl IntoIterator<Item = DeptId>) -> Self {
        self.custom_dept_ids.extend(depts);
        self
    }
}

/// Role store boundary.
pub trait RoleSource: Send + Sync {
    /// Enabled roles held by the principal (empty when it holds none).
    fn roles_of(&self, principal_id: PrincipalId) -> Vec<RoleGrant>;
}

impl<S> RoleSource for Arc<S>
where
    S: RoleSource + ?Sized,
{
    fn roles_of(&self, principal_id: PrincipalId) -> Vec<RoleGrant> {
        (**self).roles_of(principal_id)
    }
}
