//! `orgscope-auth` — row-level data-scope resolution (pure, storage-agnostic).
//!
//! Role grants become [`ScopePolicy`] values, are OR-merged into one
//! [`EffectiveScope`], and are rendered into a [`FilterExpression`] that the
//! caller threads into its own query. Department expansion goes through the
//! [`DeptHierarchy`] trait; this crate never executes queries.

pub mod closure;
pub mod error;
pub mod explain;
pub mod filter;
pub mod merge;
pub mod permissions;
pub mod permits;
pub mod principal;
pub mod roles;
pub mod scope;
pub mod sql;

pub use closure::{DeptClosureResolver, DeptHierarchy};
pub use error::AccessError;
pub use explain::{ScopeSummary, summarize};
pub use filter::{ColumnRef, FilterBuilder, FilterExpression, RecordAccessor, ScopeColumns};
pub use merge::{EffectiveScope, merge, merge_grants};
pub use permissions::Permission;
pub use permits::{RecordOwnership, check_ownership, permits};
pub use principal::{PrincipalSource, SessionProvider, Subject};
pub use roles::{Role, RoleGrant, RoleSource};
pub use scope::{DEFAULT_ROLE_SCOPE, NO_ROLE_SCOPE, ScopeKind, ScopePolicy};
pub use sql::{ParamStyle, SqlFragment, SqlRenderer};
