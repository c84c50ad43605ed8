use std::collections::BTreeSet;

use tracing::{debug, warn};

use orgscope_auth::{
    AccessError, DeptClosureResolver, DeptHierarchy, EffectiveScope, FilterBuilder, FilterExpression,
    PrincipalSource, RecordAccessor, RecordOwnership, RoleSource, ScopeColumns, ScopeSummary, SessionProvider,
    SqlFragment, SqlRenderer, Subject, check_ownership, merge_grants, summarize,
};
use orgscope_core::DeptId;

use crate::config::{ConfigError, ScopeSettings};

/// Data-scope resolution for the calling principal.
///
/// Every call resolves the session, the principal's department and its roles
/// afresh; nothing is cached between calls.
pub struct DataScopeService<S, D> {
    session: S,
    resolver: DeptClosureResolver<D>,
    columns: ScopeColumns,
    renderer: SqlRenderer,
}

impl<S, D> DataScopeService<S, D>
where
    S: SessionProvider,
    D: DeptHierarchy + RoleSource + PrincipalSource,
{
    pub fn new(session: S, directory: D, columns: ScopeColumns, renderer: SqlRenderer) -> Self {
        Self {
            session,
            resolver: DeptClosureResolver::new(directory),
            columns,
            renderer,
        }
    }

    pub fn from_settings(session: S, directory: D, settings: &ScopeSettings) -> Result<Self, ConfigError> {
        Ok(Self::new(session, directory, settings.columns()?, settings.renderer()))
    }

    /// Default ownership columns used by the no-argument helpers.
    pub fn columns(&self) -> &ScopeColumns {
        &self.columns
    }

    pub fn subject(&self) -> Result<Subject, AccessError> {
        let principal_id = self.session.current_principal()?;
        self.resolver.hierarchy().find_subject(principal_id).ok_or_else(|| {
            warn!(principal = %principal_id, "session principal has no user record");
            AccessError::NotFound(format!("principal {principal_id}"))
        })
    }

    pub fn effective_scope(&self, subject: &Subject) -> EffectiveScope {
        let grants = self.resolver.hierarchy().roles_of(subject.principal_id);
        merge_grants(&grants, subject.dept_id)
    }

    /// Listing filter over the default columns.
    pub fn listing_filter(&self) -> Result<FilterExpression, AccessError> {
        self.listing_filter_for(&self.columns)
    }

    pub fn listing_filter_for(&self, columns: &ScopeColumns) -> Result<FilterExpression, AccessError> {
        let subject = self.subject()?;
        let scope = self.effective_scope(&subject);
        Ok(FilterBuilder::new(&self.resolver).build(&scope, columns, &subject))
    }

    /// `" AND (...)"` suffix for the caller's WHERE clause; empty when unrestricted.
    pub fn sql_condition(&self, columns: &ScopeColumns) -> Result<SqlFragment, AccessError> {
        let filter = self.listing_filter_for(columns)?;
        let fragment = self.renderer.render_where_suffix(&filter);
        debug!(sql = %fragment.sql, params = fragment.params.len(), "rendered scope condition");
        Ok(fragment)
    }

    /// Keep the records visible to the caller under the default columns.
    pub fn visible<'a, R, I>(&self, records: I) -> Result<Vec<&'a R>, AccessError>
    where
        R: RecordAccessor + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let filter = self.listing_filter()?;
        Ok(records.into_iter().filter(|r| filter.matches(*r)).collect())
    }

    /// Single-record authorization for updates and deletes.
    pub fn check_record(&self, record: &RecordOwnership) -> Result<(), AccessError> {
        let subject = self.subject()?;
        let scope = self.effective_scope(&subject);
        check_ownership(&scope, &subject, record, &self.resolver)
    }

    /// `None` when the caller sees every department.
    pub fn accessible_dept_ids(&self) -> Result<Option<BTreeSet<DeptId>>, AccessError> {
        let subject = self.subject()?;
        Ok(self.effective_scope(&subject).accessible_dept_ids(&subject, &self.resolver))
    }

    pub fn describe(&self) -> Result<ScopeSummary, AccessError> {
        let subject = self.subject()?;
        let grants = self.resolver.hierarchy().roles_of(subject.principal_id);
        Ok(summarize(&grants, &subject))
    }
}
