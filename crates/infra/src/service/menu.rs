use std::collections::BTreeSet;

use tracing::debug;

use orgscope_auth::{AccessError, Permission, SessionProvider};
use orgscope_core::{FlatNode, MenuId, TreeNode, assemble, assemble_complete};
use orgscope_sys::{Menu, RouteProjector, RouteRecord};

use super::MenuSource;

/// Menus, navigation routes and permission codes of the calling principal.
pub struct MenuService<S, M> {
    session: S,
    menus: M,
    projector: RouteProjector,
}

impl<S, M> MenuService<S, M>
where
    S: SessionProvider,
    M: MenuSource,
{
    pub fn new(session: S, menus: M, projector: RouteProjector) -> Self {
        Self {
            session,
            menus,
            projector,
        }
    }

    /// Navigable menus granted to the caller, with the ancestors needed to
    /// reach them filled in from the menu store. Buttons are left out.
    pub fn user_menu_tree(&self) -> Result<Vec<TreeNode<MenuId, Menu>>, AccessError> {
        let principal_id = self.session.current_principal()?;
        let granted: Vec<FlatNode<MenuId, Menu>> = self
            .menus
            .menus_of(principal_id)
            .into_iter()
            .filter(|m| !m.is_button())
            .map(FlatNode::from_entity)
            .collect();
        debug!(principal = %principal_id, granted = granted.len(), "assembling user menu tree");

        Ok(assemble(granted, |id| self.menus.find_menu(id).map(FlatNode::from_entity)))
    }

    pub fn user_routes(&self) -> Result<Vec<RouteRecord>, AccessError> {
        let tree = self.user_menu_tree()?;
        Ok(self.projector.project(&tree))
    }

    /// Every menu, buttons included, for menu administration.
    pub fn menu_tree(&self) -> Vec<TreeNode<MenuId, Menu>> {
        assemble_complete(self.menus.all_menus().into_iter().map(FlatNode::from_entity))
    }

    /// Permission codes carried by the caller's menus, deduplicated and sorted.
    pub fn permissions(&self) -> Result<Vec<Permission>, AccessError> {
        let principal_id = self.session.current_principal()?;
        let codes: BTreeSet<Permission> = self
            .menus
            .menus_of(principal_id)
            .into_iter()
            .filter_map(|m| m.permission)
            .collect();
        Ok(codes.into_iter().collect())
    }
}
