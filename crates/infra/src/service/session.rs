use orgscope_auth::{AccessError, SessionProvider};
use orgscope_core::PrincipalId;

/// Session provider pinned to one principal (or to none).
///
/// Request handlers build one per request from the validated token; tests use
/// it directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedSession(Option<PrincipalId>);

impl FixedSession {
    pub fn new(principal_id: PrincipalId) -> Self {
        Self(Some(principal_id))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl SessionProvider for FixedSession {
    fn current_principal(&self) -> Result<PrincipalId, AccessError> {
        self.0.ok_or(AccessError::Unauthenticated)
    }
}
