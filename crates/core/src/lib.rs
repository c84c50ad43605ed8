//! `orgscope-core` — domain foundation building blocks.
//!
//! Identifiers, the domain error model and the generic parent-pointer forest
//! builder shared by departments and menus. No infrastructure concerns.

pub mod entity;
pub mod error;
pub mod id;
pub mod tree;

pub use entity::{Entity, Hierarchical};
pub use error::{DomainError, DomainResult};
pub use id::{DeptId, MenuId, PrincipalId, RoleId};
pub use tree::{FlatNode, TreeKey, TreeNode, assemble, assemble_complete, walk};
