//! Backend-neutral filter expressions and their construction from a scope.
//!
//! The same [`FilterExpression`] serves two renderers: [`FilterExpression::matches`]
//! evaluates it against an in-memory record, and [`crate::SqlRenderer`] turns
//! it into a SQL boolean fragment.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use orgscope_core::DomainError;

use crate::{DeptClosureResolver, DeptHierarchy, EffectiveScope, Subject};

/// A column reference, optionally qualified by a table alias.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
        }
    }

    pub fn qualified(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(name).with_alias(Some(alias.into()))
    }

    /// Empty aliases are treated as absent.
    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias.filter(|a| !a.is_empty());
        self
    }

    /// Parse `column` or `alias.column`, accepting only SQL identifier characters.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        let (alias, name) = match raw.split_once('.') {
            Some((alias, name)) => (Some(alias), name),
            None => (None, raw),
        };

        for part in alias.into_iter().chain([name]) {
            let valid = !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(DomainError::validation(format!("invalid column reference '{raw}'")));
            }
        }

        Ok(Self::new(name).with_alias(alias.map(str::to_string)))
    }
}

impl core::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{alias}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Columns of the filtered table that carry ownership.
///
/// A missing column silently disables the branches that need it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeColumns {
    /// Column holding the owning department id.
    pub dept: Option<ColumnRef>,
    /// Column holding the creating principal id.
    pub owner: Option<ColumnRef>,
}

impl ScopeColumns {
    pub fn new(dept: ColumnRef, owner: ColumnRef) -> Self {
        Self {
            dept: Some(dept),
            owner: Some(owner),
        }
    }

    pub fn dept_only(dept: ColumnRef) -> Self {
        Self {
            dept: Some(dept),
            owner: None,
        }
    }

    pub fn owner_only(owner: ColumnRef) -> Self {
        Self {
            dept: None,
            owner: Some(owner),
        }
    }
}

/// Boolean condition tree restricting rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum FilterExpression {
    /// No restriction.
    Always,
    /// Matches nothing. Never produced by [`FilterBuilder`].
    Never,
    Eq { column: ColumnRef, value: i64 },
    InSet { column: ColumnRef, values: BTreeSet<i64> },
    Or(Vec<FilterExpression>),
}

/// Column access for in-memory evaluation.
pub trait RecordAccessor {
    /// Integer value of `column`; `None` when the record lacks it or it is NULL.
    fn column_value(&self, column: &ColumnRef) -> Option<i64>;
}

impl FilterExpression {
    pub fn is_always(&self) -> bool {
        matches!(self, FilterExpression::Always)
    }

    /// Evaluate against one record.
    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: RecordAccessor + ?Sized,
    {
        match self {
            FilterExpression::Always => true,
            FilterExpression::Never => false,
            FilterExpression::Eq { column, value } => record.column_value(column) == Some(*value),
            FilterExpression::InSet { column, values } => record
                .column_value(column)
                .is_some_and(|v| values.contains(&v)),
            FilterExpression::Or(branches) => branches.iter().any(|b| b.matches(record)),
        }
    }

    /// Owned predicate closure, for `Iterator::filter` and friends.
    pub fn into_predicate<R>(self) -> impl Fn(&R) -> bool
    where
        R: RecordAccessor,
    {
        move |record: &R| self.matches(record)
    }

    /// Fold constant branches: an `Or` containing `Always` is `Always`, `Never`
    /// branches are dropped and an empty `Or` is `Never`.
    pub fn simplify(self) -> FilterExpression {
        match self {
            FilterExpression::Or(branches) => {
                let mut kept = Vec::with_capacity(branches.len());
                for branch in branches {
                    match branch.simplify() {
                        FilterExpression::Always => return FilterExpression::Always,
                        FilterExpression::Never => {}
                        other => kept.push(other),
                    }
                }
                if kept.is_empty() {
                    FilterExpression::Never
                } else {
                    FilterExpression::Or(kept)
                }
            }
            FilterExpression::InSet { values, .. } if values.is_empty() => FilterExpression::Never,
            other => other,
        }
    }
}

/// Renders an [`EffectiveScope`] into a [`FilterExpression`].
///
/// Each grant contributes at most one OR branch; branches are never AND-ed.
pub struct FilterBuilder<'r, H> {
    resolver: &'r DeptClosureResolver<H>,
}

impl<'r, H: DeptHierarchy> FilterBuilder<'r, H> {
    pub fn new(resolver: &'r DeptClosureResolver<H>) -> Self {
        Self { resolver }
    }

    /// Listing filter for `scope`.
    ///
    /// Returns `Always` when the scope is unrestricted and also when no branch
    /// applies (e.g. the table lacks the needed columns): building a filter
    /// never denies. Callers needing hard denial inspect [`Self::branches`].
    pub fn build(&self, scope: &EffectiveScope, columns: &ScopeColumns, subject: &Subject) -> FilterExpression {
        if scope.unrestricted {
            return FilterExpression::Always;
        }

        let branches = self.branches(scope, columns, subject);
        if branches.is_empty() {
            debug!(principal = %subject.principal_id, "no scope branch applies to this table");
            return FilterExpression::Always;
        }

        debug!(principal = %subject.principal_id, branches = branches.len(), "built scope filter");
        FilterExpression::Or(branches)
    }

    /// The OR branches `scope` contributes for these columns; empty when
    /// unrestricted or when nothing applies.
    pub fn branches(&self, scope: &EffectiveScope, columns: &ScopeColumns, subject: &Subject) -> Vec<FilterExpression> {
        let mut branches = Vec::new();
        if scope.unrestricted {
            return branches;
        }

        if let Some(dept_col) = &columns.dept {
            if scope.own_dept {
                if let Some(dept) = subject.dept_id {
                    push_unique(
                        &mut branches,
                        FilterExpression::Eq {
                            column: dept_col.clone(),
                            value: dept.get(),
                        },
                    );
                }
            }

            if !scope.dept_and_descendants.is_empty() {
                let closure = scope.subtree_dept_ids(self.resolver);
                if !closure.is_empty() {
                    push_unique(
                        &mut branches,
                        FilterExpression::InSet {
                            column: dept_col.clone(),
                            values: closure.into_iter().map(|d| d.get()).collect(),
                        },
                    );
                }
            }
        }

        if scope.self_only {
            if let Some(owner_col) = &columns.owner {
                push_unique(
                    &mut branches,
                    FilterExpression::Eq {
                        column: owner_col.clone(),
                        value: subject.principal_id.get(),
                    },
                );
            }
        }

        if let Some(dept_col) = &columns.dept {
            if !scope.custom_dept_ids.is_empty() {
                push_unique(
                    &mut branches,
                    FilterExpression::InSet {
                        column: dept_col.clone(),
                        values: scope.custom_dept_ids.iter().map(|d| d.get()).collect(),
                    },
                );
            }
        }

        branches
    }
}

fn push_unique(branches: &mut Vec<FilterExpression>, branch: FilterExpression) {
    if !branches.contains(&branch) {
        branches.push(branch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScopeKind, ScopePolicy, merge};
    use orgscope_core::{DeptId, PrincipalId};
    use std::collections::HashMap;

    struct Tree(HashMap<i64, Vec<i64>>);

    impl DeptHierarchy for Tree {
        fn children_of(&self, dept_id: DeptId) -> Vec<DeptId> {
            self.0
                .get(&dept_id.get())
                .map(|c| c.iter().copied().map(DeptId::new).collect())
                .unwrap_or_default()
        }

        fn exists(&self, dept_id: DeptId) -> bool {
            self.0.contains_key(&dept_id.get())
        }
    }

    /// D1 -> {D2, D3}, plus an unrelated D4.
    fn resolver() -> DeptClosureResolver<Tree> {
        DeptClosureResolver::new(Tree(HashMap::from([
            (1, vec![2, 3]),
            (2, vec![]),
            (3, vec![]),
            (4, vec![]),
        ])))
    }

    fn subject() -> Subject {
        Subject::new(PrincipalId::new(100), Some(DeptId::new(1)))
    }

    fn columns() -> ScopeColumns {
        ScopeColumns::new(ColumnRef::new("dept_id"), ColumnRef::new("create_by"))
    }

    struct Row(HashMap<&'static str, i64>);

    impl RecordAccessor for Row {
        fn column_value(&self, column: &ColumnRef) -> Option<i64> {
            self.0.get(column.name.as_str()).copied()
        }
    }

    #[test]
    fn subtree_scope_expands_to_closure() {
        let resolver = resolver();
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptAndDescendants)], subject().dept_id);
        let filter = FilterBuilder::new(&resolver).build(&scope, &columns(), &subject());

        assert_eq!(
            filter,
            FilterExpression::Or(vec![FilterExpression::InSet {
                column: ColumnRef::new("dept_id"),
                values: BTreeSet::from([1, 2, 3]),
            }])
        );
    }

    #[test]
    fn subtree_root_outside_the_hierarchy_still_matches_itself() {
        let resolver = resolver();
        let stray = Subject::new(PrincipalId::new(100), Some(DeptId::new(9)));
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptAndDescendants)], stray.dept_id);

        assert_eq!(
            FilterBuilder::new(&resolver).build(&scope, &columns(), &stray),
            FilterExpression::Or(vec![FilterExpression::InSet {
                column: ColumnRef::new("dept_id"),
                values: BTreeSet::from([9]),
            }])
        );
    }

    #[test]
    fn unrestricted_scope_builds_always() {
        let resolver = resolver();
        let scope = merge(
            &[ScopePolicy::new(ScopeKind::SelfOnly), ScopePolicy::new(ScopeKind::All)],
            subject().dept_id,
        );
        assert!(FilterBuilder::new(&resolver).build(&scope, &columns(), &subject()).is_always());
    }

    #[test]
    fn branches_follow_grant_order_and_are_or_ed() {
        let resolver = resolver();
        let scope = merge(
            &[
                ScopePolicy::custom([DeptId::new(4)]),
                ScopePolicy::new(ScopeKind::SelfOnly),
                ScopePolicy::new(ScopeKind::DeptOwn),
            ],
            subject().dept_id,
        );
        let filter = FilterBuilder::new(&resolver).build(&scope, &columns(), &subject());

        assert_eq!(
            filter,
            FilterExpression::Or(vec![
                FilterExpression::Eq {
                    column: ColumnRef::new("dept_id"),
                    value: 1
                },
                FilterExpression::Eq {
                    column: ColumnRef::new("create_by"),
                    value: 100
                },
                FilterExpression::InSet {
                    column: ColumnRef::new("dept_id"),
                    values: BTreeSet::from([4]),
                },
            ])
        );
    }

    #[test]
    fn missing_columns_never_deny() {
        let resolver = resolver();
        let builder = FilterBuilder::new(&resolver);
        let self_only = merge(&[ScopePolicy::new(ScopeKind::SelfOnly)], subject().dept_id);
        let dept_only = ScopeColumns::dept_only(ColumnRef::new("dept_id"));

        assert!(builder.branches(&self_only, &dept_only, &subject()).is_empty());
        assert!(builder.build(&self_only, &dept_only, &subject()).is_always());
    }

    #[test]
    fn own_dept_needs_a_home_department() {
        let resolver = resolver();
        let homeless = Subject::new(PrincipalId::new(100), None);
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptOwn)], None);

        assert!(FilterBuilder::new(&resolver).build(&scope, &columns(), &homeless).is_always());
    }

    #[test]
    fn in_memory_evaluation() {
        let resolver = resolver();
        let scope = merge(&[ScopePolicy::new(ScopeKind::DeptAndDescendants)], subject().dept_id);
        let filter = FilterBuilder::new(&resolver).build(&scope, &columns(), &subject());

        let rows = vec![
            Row(HashMap::from([("dept_id", 3), ("create_by", 7)])),
            Row(HashMap::from([("dept_id", 4), ("create_by", 100)])),
            Row(HashMap::from([("create_by", 100)])),
        ];
        let predicate = filter.into_predicate::<Row>();
        let visible: Vec<_> = rows.iter().filter(|r| predicate(r)).collect();

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].0["dept_id"], 3);
    }

    #[test]
    fn simplify_folds_constants() {
        let eq = FilterExpression::Eq {
            column: ColumnRef::new("dept_id"),
            value: 1,
        };
        assert!(FilterExpression::Or(vec![eq.clone(), FilterExpression::Always]).simplify().is_always());
        assert_eq!(
            FilterExpression::Or(vec![FilterExpression::Never, eq.clone()]).simplify(),
            FilterExpression::Or(vec![eq])
        );
        assert_eq!(FilterExpression::Or(vec![]).simplify(), FilterExpression::Never);
    }

    #[test]
    fn column_parsing_rejects_non_identifiers() {
        assert_eq!(ColumnRef::parse("d.dept_id").unwrap(), ColumnRef::qualified("d", "dept_id"));
        assert_eq!(ColumnRef::parse("create_by").unwrap().to_string(), "create_by");
        assert!(ColumnRef::parse("dept_id; DROP TABLE x").is_err());
        assert!(ColumnRef::parse("1col").is_err());
        assert!(ColumnRef::parse(".x").is_err());
    }

    #[test]
    fn serializes_with_op_tag() {
        let json = serde_json::to_value(FilterExpression::Eq {
            column: ColumnRef::new("dept_id"),
            value: 3,
        })
        .unwrap();
        assert_eq!(json["op"], "eq");
        assert_eq!(json["args"]["value"], 3);
    }
}
