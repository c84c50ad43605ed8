use std::collections::BTreeSet;

use orgscope_auth::{DeptClosureResolver, DeptHierarchy};
use orgscope_core::{DeptId, DomainError, DomainResult, FlatNode, TreeKey, TreeNode, assemble_complete};
use orgscope_sys::Dept;

use super::DeptSource;

/// Department hierarchy views and structural validation.
pub struct DeptService<D> {
    resolver: DeptClosureResolver<D>,
}

impl<D> DeptService<D>
where
    D: DeptHierarchy + DeptSource,
{
    pub fn new(directory: D) -> Self {
        Self {
            resolver: DeptClosureResolver::new(directory),
        }
    }

    fn depts(&self) -> &D {
        self.resolver.hierarchy()
    }

    /// Forest of live departments, siblings ordered by sort key.
    pub fn dept_tree(&self) -> Vec<TreeNode<DeptId, Dept>> {
        assemble_complete(
            self.depts()
                .all_depts()
                .into_iter()
                .filter(Dept::is_live)
                .map(FlatNode::from_entity),
        )
    }

    /// The department and all of its live descendants.
    pub fn subtree_ids(&self, dept_id: DeptId) -> BTreeSet<DeptId> {
        self.resolver.closure_of(dept_id)
    }

    /// Check that `dept_id` may be moved under `new_parent`.
    ///
    /// The parent must not be the department itself or one of its
    /// descendants, and unless it is the top level it must exist and be live.
    pub fn validate_parent(&self, dept_id: DeptId, new_parent: DeptId) -> DomainResult<()> {
        if !self.depts().exists(dept_id) {
            return Err(DomainError::not_found(format!("department {dept_id}")));
        }
        if new_parent == dept_id {
            return Err(DomainError::validation("a department cannot be its own parent"));
        }
        if new_parent.is_root() {
            return Ok(());
        }
        if self.resolver.contains(dept_id, new_parent) {
            return Err(DomainError::invariant(format!(
                "department {new_parent} is a descendant of {dept_id}"
            )));
        }

        match self.depts().find_dept(new_parent) {
            None => Err(DomainError::not_found(format!("parent department {new_parent}"))),
            Some(parent) if !parent.is_live() => Err(DomainError::validation(format!(
                "parent department {new_parent} has been deleted"
            ))),
            Some(_) => Ok(()),
        }
    }

    /// A department with live children or assigned users cannot be deleted.
    pub fn validate_delete(&self, dept_id: DeptId) -> DomainResult<()> {
        if !self.depts().exists(dept_id) {
            return Err(DomainError::not_found(format!("department {dept_id}")));
        }
        if !self.depts().children_of(dept_id).is_empty() {
            return Err(DomainError::invariant(format!("department {dept_id} still has sub-departments")));
        }
        let members = self.depts().member_count(dept_id);
        if members > 0 {
            return Err(DomainError::invariant(format!(
                "department {dept_id} still has {members} user(s)"
            )));
        }
        Ok(())
    }
}
