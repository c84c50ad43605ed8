//! SQL rendering of [`FilterExpression`]s.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::{ColumnRef, FilterExpression};

/// How values are emitted into the fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamStyle {
    /// Values inlined as integer literals.
    #[default]
    Literal,
    /// `?` placeholders.
    Positional,
    /// `$1`, `$2`, ... placeholders.
    Numbered,
}

/// Rendered boolean expression plus its bound parameters (empty for literals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct SqlRenderer {
    style: ParamStyle,
    first_param: usize,
}

impl Default for SqlRenderer {
    fn default() -> Self {
        Self::new(ParamStyle::default())
    }
}

impl SqlRenderer {
    pub fn new(style: ParamStyle) -> Self {
        Self { style, first_param: 1 }
    }

    /// Number `$n` placeholders from `n`, for queries that already bind parameters.
    pub fn starting_at(mut self, first_param: usize) -> Self {
        self.first_param = first_param.max(1);
        self
    }

    pub fn style(&self) -> ParamStyle {
        self.style
    }

    /// `None` for `Always`: the caller omits the condition entirely.
    pub fn render(&self, expr: &FilterExpression) -> Option<SqlFragment> {
        if expr.is_always() {
            return None;
        }

        let mut out = Output {
            style: self.style,
            next: self.first_param,
            sql: String::new(),
            params: Vec::new(),
        };
        out.expr(expr);

        Some(SqlFragment {
            sql: out.sql,
            params: out.params,
        })
    }

    /// `" AND (...)"`, ready to append to an existing WHERE clause; empty for `Always`.
    pub fn render_where_suffix(&self, expr: &FilterExpression) -> SqlFragment {
        match self.render(expr) {
            Some(fragment) if fragment.sql.starts_with('(') => SqlFragment {
                sql: format!(" AND {}", fragment.sql),
                params: fragment.params,
            },
            Some(fragment) => SqlFragment {
                sql: format!(" AND ({})", fragment.sql),
                params: fragment.params,
            },
            None => SqlFragment {
                sql: String::new(),
                params: Vec::new(),
            },
        }
    }
}

struct Output {
    style: ParamStyle,
    next: usize,
    sql: String,
    params: Vec<i64>,
}

impl Output {
    fn expr(&mut self, expr: &FilterExpression) {
        match expr {
            // Only reachable nested inside an Or.
            FilterExpression::Always => self.sql.push_str("1 = 1"),
            FilterExpression::Never => self.sql.push_str("1 = 0"),
            FilterExpression::Eq { column, value } => {
                self.column(column);
                self.sql.push_str(" = ");
                self.value(*value);
            }
            FilterExpression::InSet { values, .. } if values.is_empty() => self.sql.push_str("1 = 0"),
            FilterExpression::InSet { column, values } => {
                self.column(column);
                self.sql.push_str(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(", ");
                    }
                    self.value(*value);
                }
                self.sql.push(')');
            }
            FilterExpression::Or(branches) if branches.is_empty() => self.sql.push_str("1 = 0"),
            FilterExpression::Or(branches) => {
                self.sql.push('(');
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(" OR ");
                    }
                    self.expr(branch);
                }
                self.sql.push(')');
            }
        }
    }

    fn column(&mut self, column: &ColumnRef) {
        let _ = write!(self.sql, "{column}");
    }

    fn value(&mut self, value: i64) {
        match self.style {
            ParamStyle::Literal => {
                let _ = write!(self.sql, "{value}");
            }
            ParamStyle::Positional => {
                self.sql.push('?');
                self.params.push(value);
            }
            ParamStyle::Numbered => {
                let _ = write!(self.sql, "${}", self.next);
                self.next += 1;
                self.params.push(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn filter() -> FilterExpression {
        FilterExpression::Or(vec![
            FilterExpression::InSet {
                column: ColumnRef::qualified("d", "dept_id"),
                values: BTreeSet::from([3, 1, 2]),
            },
            FilterExpression::Eq {
                column: ColumnRef::qualified("u", "create_by"),
                value: 100,
            },
        ])
    }

    #[test]
    fn always_is_omitted() {
        let renderer = SqlRenderer::default();
        assert!(renderer.render(&FilterExpression::Always).is_none());
        assert_eq!(renderer.render_where_suffix(&FilterExpression::Always).sql, "");
    }

    #[test]
    fn literal_rendering_parenthesizes_or() {
        let fragment = SqlRenderer::default().render(&filter()).unwrap();
        assert_eq!(fragment.sql, "(d.dept_id IN (1, 2, 3) OR u.create_by = 100)");
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn where_suffix_is_and_prefixed() {
        let suffix = SqlRenderer::default().render_where_suffix(&filter());
        assert_eq!(suffix.sql, " AND (d.dept_id IN (1, 2, 3) OR u.create_by = 100)");

        let single = FilterExpression::Eq {
            column: ColumnRef::new("dept_id"),
            value: 7,
        };
        assert_eq!(SqlRenderer::default().render_where_suffix(&single).sql, " AND (dept_id = 7)");
    }

    #[test]
    fn placeholders_collect_params_in_order() {
        let positional = SqlRenderer::new(ParamStyle::Positional).render(&filter()).unwrap();
        assert_eq!(positional.sql, "(d.dept_id IN (?, ?, ?) OR u.create_by = ?)");
        assert_eq!(positional.params, vec![1, 2, 3, 100]);

        let numbered = SqlRenderer::new(ParamStyle::Numbered)
            .starting_at(3)
            .render(&filter())
            .unwrap();
        assert_eq!(numbered.sql, "(d.dept_id IN ($3, $4, $5) OR u.create_by = $6)");
        assert_eq!(numbered.params, vec![1, 2, 3, 100]);
    }

    #[test]
    fn impossible_conditions_render_false() {
        let renderer = SqlRenderer::default();
        assert_eq!(renderer.render(&FilterExpression::Never).unwrap().sql, "1 = 0");
        let empty = FilterExpression::InSet {
            column: ColumnRef::new("dept_id"),
            values: BTreeSet::new(),
        };
        assert_eq!(renderer.render(&empty).unwrap().sql, "1 = 0");
    }
}
