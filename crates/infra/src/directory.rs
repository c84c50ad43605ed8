//! In-memory directory of users, roles, departments and menus.
//!
//! Implements every store boundary the scope engine and the services read
//! from. Intended for tests and local development.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use orgscope_auth::{DeptHierarchy, PrincipalSource, Role, RoleGrant, RoleSource, ScopeKind, Subject};
use orgscope_core::{DeptId, MenuId, PrincipalId, RoleId};
use orgscope_sys::{Dept, Menu};

use crate::read_model::{InMemoryStore, Store};
use crate::service::{DeptSource, MenuSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: PrincipalId,
    pub username: String,
    #[serde(default)]
    pub dept_id: Option<DeptId>,
    #[serde(default)]
    pub role_ids: BTreeSet<RoleId>,
    pub enabled: bool,
}

impl UserRecord {
    pub fn new(id: i64, username: impl Into<String>, dept_id: Option<i64>) -> Self {
        Self {
            id: PrincipalId::new(id),
            username: username.into(),
            dept_id: dept_id.map(DeptId::new),
            role_ids: BTreeSet::new(),
            enabled: true,
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = i64>) -> Self {
        self.role_ids.extend(roles.into_iter().map(RoleId::new));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub id: RoleId,
    pub code: Role,
    #[serde(default)]
    pub data_scope: Option<ScopeKind>,
    #[serde(default)]
    pub custom_dept_ids: BTreeSet<DeptId>,
    #[serde(default)]
    pub menu_ids: BTreeSet<MenuId>,
    pub enabled: bool,
}

impl RoleRecord {
    pub fn new(id: i64, code: &'static str, data_scope: Option<ScopeKind>) -> Self {
        Self {
            id: RoleId::new(id),
            code: Role::new(code),
            data_scope,
            custom_dept_ids: BTreeSet::new(),
            menu_ids: BTreeSet::new(),
            enabled: true,
        }
    }

    pub fn with_custom_depts(mut self, depts: impl IntoIterator<Item = i64>) -> Self {
        self.custom_dept_ids.extend(depts.into_iter().map(DeptId::new));
        self
    }

    pub fn with_menus(mut self, menus: impl IntoIterator<Item = i64>) -> Self {
        self.menu_ids.extend(menus.into_iter().map(MenuId::new));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn grant(&self) -> RoleGrant {
        RoleGrant::new(self.code.clone(), self.data_scope).with_custom_depts(self.custom_dept_ids.iter().copied())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: InMemoryStore<PrincipalId, UserRecord>,
    roles: InMemoryStore<RoleId, RoleRecord>,
    depts: InMemoryStore<DeptId, Dept>,
    menus: InMemoryStore<MenuId, Menu>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_user(&self, user: UserRecord) {
        self.users.upsert(user.id, user);
    }

    pub fn upsert_role(&self, role: RoleRecord) {
        self.roles.upsert(role.id, role);
    }

    pub fn upsert_dept(&self, dept: Dept) {
        self.depts.upsert(dept.id, dept);
    }

    pub fn upsert_menu(&self, menu: Menu) {
        self.menus.upsert(menu.id, menu);
    }

    pub fn find_user(&self, principal_id: PrincipalId) -> Option<UserRecord> {
        self.users.get(&principal_id)
    }

    /// Enabled roles of an enabled user; a disabled user holds none.
    fn enabled_roles(&self, principal_id: PrincipalId) -> Vec<RoleRecord> {
        let Some(user) = self.users.get(&principal_id).filter(|u| u.enabled) else {
            return Vec::new();
        };

        user.role_ids
            .iter()
            .filter_map(|role_id| {
                let role = self.roles.get(role_id);
                if role.is_none() {
                    warn!(principal = %principal_id, role = %role_id, "user references unknown role");
                }
                role
            })
            .filter(|role| role.enabled)
            .collect()
    }
}

impl DeptHierarchy for InMemoryDirectory {
    fn children_of(&self, dept_id: DeptId) -> Vec<DeptId> {
        self.depts
            .select(|d| (d.is_live() && d.parent_id == dept_id).then_some(d.id))
    }

    fn exists(&self, dept_id: DeptId) -> bool {
        self.depts.get(&dept_id).is_some_and(|d| d.is_live())
    }
}

impl RoleSource for InMemoryDirectory {
    fn roles_of(&self, principal_id: PrincipalId) -> Vec<RoleGrant> {
        self.enabled_roles(principal_id).iter().map(RoleRecord::grant).collect()
    }
}

impl PrincipalSource for InMemoryDirectory {
    fn find_subject(&self, principal_id: PrincipalId) -> Option<Subject> {
        self.users
            .get(&principal_id)
            .map(|user| Subject::new(user.id, user.dept_id))
    }
}

impl DeptSource for InMemoryDirectory {
    fn find_dept(&self, dept_id: DeptId) -> Option<Dept> {
        self.depts.get(&dept_id)
    }

    fn all_depts(&self) -> Vec<Dept> {
        self.depts.list()
    }

    fn member_count(&self, dept_id: DeptId) -> usize {
        self.users.count_where(|u| u.dept_id == Some(dept_id))
    }
}

impl MenuSource for InMemoryDirectory {
    fn find_menu(&self, menu_id: MenuId) -> Option<Menu> {
        self.menus.get(&menu_id)
    }

    fn all_menus(&self) -> Vec<Menu> {
        self.menus.list()
    }

    fn menus_of(&self, principal_id: PrincipalId) -> Vec<Menu> {
        let granted: BTreeSet<MenuId> = self
            .enabled_roles(principal_id)
            .into_iter()
            .flat_map(|role| role.menu_ids)
            .collect();

        granted
            .into_iter()
            .filter_map(|id| self.menus.get(&id))
            .filter(|menu| menu.enabled)
            .collect()
    }
}
