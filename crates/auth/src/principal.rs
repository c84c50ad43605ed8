use std::sync::Arc;

use serde::{Deserialize, Serialize};

use orgscope_core::{DeptId, PrincipalId};

use crate::AccessError;

/// The acting principal as seen by scope resolution.
///
/// `dept_id` is the principal's home department; a principal may have none,
/// in which case department-relative grants contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub principal_id: PrincipalId,
    pub dept_id: Option<DeptId>,
}

impl Subject {
    pub fn new(principal_id: PrincipalId, dept_id: Option<DeptId>) -> Self {
        Self {
            principal_id,
            dept_id,
        }
    }
}

/// Identity/session boundary.
///
/// Token validation and session storage live outside this crate; this only
/// answers "who is calling".
pub trait SessionProvider: Send + Sync {
    /// Fails with [`AccessError::Unauthenticated`] when no session is active.
    fn current_principal(&self) -> Result<PrincipalId, AccessError>;
}

/// Lookup of a principal's department membership.
pub trait PrincipalSource: Send + Sync {
    fn find_subject(&self, principal_id: PrincipalId) -> Option<Subject>;
}

impl<S> SessionProvider for Arc<S>
where
    S: SessionProvider + ?Sized,
{
    fn current_principal(&self) -> Result<PrincipalId, AccessError> {
        (**self).current_principal()
    }
}

impl<S> PrincipalSource for Arc<S>
where
    S: PrincipalSource + ?Sized,
{
    fn find_subject(&self, principal_id: PrincipalId) -> Option<Subject> {
        (**self).find_subject(principal_id)
    }
}
