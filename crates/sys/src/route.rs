//! Projection of an assembled menu forest into front-end navigation routes.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use orgscope_core::{MenuId, TreeNode};

use crate::{Menu, MenuKind};

/// One navigation route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    /// Unique within one projection.
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    pub meta: RouteMeta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteRecord>,
    #[serde(skip)]
    pub menu_id: MenuId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub order: i32,
    pub hide_in_menu: bool,
    pub keep_alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<Vec<String>>,
}

/// Turns menu forests into [`RouteRecord`] trees.
///
/// Runs after forest assembly and keeps its sibling order, so a directory's
/// redirect always points at its first child as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteProjector {
    pub layout_component: String,
    /// Prefix of synthetic names for menus without a path.
    pub name_prefix: String,
    pub keep_alive: bool,
}

impl Default for RouteProjector {
    fn default() -> Self {
        Self {
            layout_component: "BasicLayout".to_string(),
            name_prefix: "Menu".to_string(),
            keep_alive: true,
        }
    }
}

impl RouteProjector {
    pub fn new(layout_component: impl Into<String>, name_prefix: impl Into<String>, keep_alive: bool) -> Self {
        Self {
            layout_component: layout_component.into(),
            name_prefix: name_prefix.into(),
            keep_alive,
        }
    }

    pub fn project(&self, forest: &[TreeNode<MenuId, Menu>]) -> Vec<RouteRecord> {
        let mut used = HashSet::new();
        forest.iter().map(|node| self.project_node(node, &mut used)).collect()
    }

    fn project_node(&self, node: &TreeNode<MenuId, Menu>, used: &mut HashSet<String>) -> RouteRecord {
        let menu = &node.payload;
        let name = self.unique_name(menu, used);
        let path = match &menu.path {
            Some(path) => path.clone(),
            None => format!("/{}", menu.id),
        };

        let component = match menu.kind {
            MenuKind::Directory => Some(self.layout_component.clone()),
            MenuKind::Menu => menu.component.as_deref().map(|c| {
                if c.starts_with('/') {
                    c.to_string()
                } else {
                    format!("/{c}")
                }
            }),
            MenuKind::Button => None,
        };

        let children: Vec<RouteRecord> = node
            .children
            .iter()
            .map(|child| self.project_node(child, used))
            .collect();

        let redirect = if menu.kind.is_container() {
            children.first().map(|first| first.path.clone())
        } else {
            None
        };

        RouteRecord {
            name,
            path,
            component,
            redirect,
            meta: RouteMeta {
                title: menu.name.clone(),
                icon: menu.icon.clone(),
                order: menu.sort,
                hide_in_menu: !menu.visible,
                keep_alive: self.keep_alive,
                authority: menu.permission.as_ref().map(|p| vec![p.to_string()]),
            },
            children,
            menu_id: menu.id,
        }
    }

    fn unique_name(&self, menu: &Menu, used: &mut HashSet<String>) -> String {
        let base = menu
            .path
            .as_deref()
            .map(camel_case_route_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{}{}", self.name_prefix, menu.id));

        if used.insert(base.clone()) {
            return base;
        }

        let mut candidate = format!("{base}{}", menu.id);
        let mut attempt = 1u32;
        while !used.insert(candidate.clone()) {
            attempt += 1;
            candidate = format!("{base}{}_{attempt}", menu.id);
        }
        debug!(menu = %menu.id, base = %base, renamed = %candidate, "route name collision");
        candidate
    }
}

/// `/system/user-list` becomes `SystemUserList`.
fn camel_case_route_name(path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut name = String::with_capacity(path.len());
    let mut upper_next = true;

    for c in path.chars() {
        if c == '/' || c == '-' {
            upper_next = true;
        } else if upper_next {
            name.extend(c.to_uppercase());
            upper_next = false;
        } else {
            name.push(c);
        }
    }
    name
}
