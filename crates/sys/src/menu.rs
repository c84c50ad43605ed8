use serde::{Deserialize, Serialize};

use orgscope_auth::Permission;
use orgscope_core::{DomainError, Entity, Hierarchical, MenuId};

/// What a menu row represents in the navigation.
///
/// Persisted as 0 (directory), 1 (page) and 2 (button).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum MenuKind {
    /// Container rendered with the shared layout.
    Directory,
    /// Routable page with its own component.
    Menu,
    /// Permission-bearing action; never routed.
    Button,
}

impl MenuKind {
    pub const fn code(self) -> i32 {
        match self {
            MenuKind::Directory => 0,
            MenuKind::Menu => 1,
            MenuKind::Button => 2,
        }
    }

    pub fn is_container(self) -> bool {
        self == MenuKind::Directory
    }
}

impl TryFrom<i32> for MenuKind {
    type Error = DomainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MenuKind::Directory),
            1 => Ok(MenuKind::Menu),
            2 => Ok(MenuKind::Button),
            other => Err(DomainError::validation(format!("unknown menu kind {other}"))),
        }
    }
}

impl From<MenuKind> for i32 {
    fn from(kind: MenuKind) -> Self {
        kind.code()
    }
}

/// A menu row: directory, page or button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: MenuId,
    pub parent_id: MenuId,
    pub name: String,
    pub kind: MenuKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort: i32,
    pub visible: bool,
    pub enabled: bool,
}

impl Menu {
    pub fn new(id: MenuId, parent_id: MenuId, name: impl Into<String>, kind: MenuKind, sort: i32) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            kind,
            path: None,
            component: None,
            permission: None,
            icon: None,
            sort,
            visible: true,
            enabled: true,
        }
    }

    pub fn directory(id: i64, parent_id: i64, name: impl Into<String>, path: impl Into<String>, sort: i32) -> Self {
        Self::new(MenuId::new(id), MenuId::new(parent_id), name, MenuKind::Directory, sort).with_path(path)
    }

    pub fn page(
        id: i64,
        parent_id: i64,
        name: impl Into<String>,
        path: impl Into<String>,
        component: impl Into<String>,
        sort: i32,
    ) -> Self {
        Self::new(MenuId::new(id), MenuId::new(parent_id), name, MenuKind::Menu, sort)
            .with_path(path)
            .with_component(component)
    }

    pub fn button(id: i64, parent_id: i64, name: impl Into<String>, permission: Permission, sort: i32) -> Self {
        Self::new(MenuId::new(id), MenuId::new(parent_id), name, MenuKind::Button, sort).with_permission(permission)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into()).filter(|p| !p.is_empty());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into()).filter(|c| !c.is_empty());
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission).filter(|p| !p.as_str().is_empty());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_button(&self) -> bool {
        self.kind == MenuKind::Button
    }
}

impl Entity for Menu {
    type Id = MenuId;

    fn id(&self) -> &MenuId {
        &self.id
    }
}

impl Hierarchical for Menu {
    fn parent_id(&self) -> &MenuId {
        &self.parent_id
    }

    fn sort_key(&self) -> i32 {
        self.sort
    }
}
