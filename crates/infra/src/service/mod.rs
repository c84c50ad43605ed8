//! Application services composing the scope engine with directory data.
//!
//! Each service resolves the caller explicitly (session -> subject -> roles)
//! and threads the result through merge, filter building and rendering.

pub mod data_scope;
pub mod dept;
pub mod menu;
pub mod session;

pub use data_scope::DataScopeService;
pub use dept::DeptService;
pub use menu::MenuService;
pub use session::FixedSession;

use std::sync::Arc;

use orgscope_core::{DeptId, MenuId, PrincipalId};
use orgscope_sys::{Dept, Menu};

/// Department store boundary.
pub trait DeptSource: Send + Sync {
    fn find_dept(&self, dept_id: DeptId) -> Option<Dept>;

    /// Every department, deleted ones included.
    fn all_depts(&self) -> Vec<Dept>;

    /// Users assigned directly to the department.
    fn member_count(&self, dept_id: DeptId) -> usize;
}

/// Menu store boundary.
pub trait MenuSource: Send + Sync {
    fn find_menu(&self, menu_id: MenuId) -> Option<Menu>;

    fn all_menus(&self) -> Vec<Menu>;

    /// Enabled menus granted through the principal's enabled roles.
    fn menus_of(&self, principal_id: PrincipalId) -> Vec<Menu>;
}

impl<S> DeptSource for Arc<S>
where
    S: DeptSource + ?Sized,
{
    fn find_dept(&self, dept_id: DeptId) -> Option<Dept> {
        (**self).find_dept(dept_id)
    }

    fn all_depts(&self) -> Vec<Dept> {
        (**self).all_depts()
    }

    fn member_count(&self, dept_id: DeptId) -> usize {
        (**self).member_count(dept_id)
    }
}

impl<S> MenuSource for Arc<S>
where
    S: MenuSource + ?Sized,
{
    fn find_menu(&self, menu_id: MenuId) -> Option<Menu> {
        (**self).find_menu(menu_id)
    }

    fn all_menus(&self) -> Vec<Menu> {
        (**self).all_menus()
    }

    fn menus_of(&self, principal_id: PrincipalId) -> Vec<Menu> {
        (**self).menus_of(principal_id)
    }
}
