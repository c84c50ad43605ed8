use thiserror::Error;

use orgscope_core::PrincipalId;

/// Access-control failures surfaced to callers.
///
/// Listing filters never produce these; only session resolution and
/// single-record ownership checks do.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("unauthenticated: no active session")]
    Unauthenticated,

    #[error("permission denied: principal {principal} may not access this record")]
    PermissionDenied { principal: PrincipalId },

    #[error("not found: {0}")]
    NotFound(String),
}
