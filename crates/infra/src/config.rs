//! Configuration loading and representation.
//!
//! Values come from `ORGSCOPE_*` environment variables or a JSON document;
//! anything unset keeps its default.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orgscope_auth::{ColumnRef, ParamStyle, ScopeColumns, SqlRenderer};
use orgscope_sys::RouteProjector;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("malformed configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Default ownership columns and SQL rendering of scope filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScopeSettings {
    pub dept_column: String,
    pub owner_column: String,
    pub dept_alias: Option<String>,
    pub owner_alias: Option<String>,
    pub param_style: ParamStyle,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            dept_column: "dept_id".to_string(),
            owner_column: "create_by".to_string(),
            dept_alias: None,
            owner_alias: None,
            param_style: ParamStyle::Literal,
        }
    }
}

impl ScopeSettings {
    /// Validated column references; rejects anything that is not an identifier.
    pub fn columns(&self) -> Result<ScopeColumns, ConfigError> {
        let column = |key: &'static str, name: &str, alias: &Option<String>| -> Result<ColumnRef, ConfigError> {
            let parsed = ColumnRef::parse(name).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
            if let Some(alias) = alias.as_deref().filter(|a| !a.is_empty()) {
                ColumnRef::parse(alias).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
                return Ok(ColumnRef::qualified(alias, parsed.name));
            }
            Ok(parsed)
        };

        Ok(ScopeColumns::new(
            column("dept_column", &self.dept_column, &self.dept_alias)?,
            column("owner_column", &self.owner_column, &self.owner_alias)?,
        ))
    }

    pub fn renderer(&self) -> SqlRenderer {
        SqlRenderer::new(self.param_style)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteSettings {
    pub layout_component: String,
    pub name_prefix: String,
    pub keep_alive: bool,
}

impl Default for RouteSettings {
    fn default() -> Self {
        let projector = RouteProjector::default();
        Self {
            layout_component: projector.layout_component,
            name_prefix: projector.name_prefix,
            keep_alive: projector.keep_alive,
        }
    }
}

impl RouteSettings {
    pub fn projector(&self) -> RouteProjector {
        RouteProjector::new(&self.layout_component, &self.name_prefix, self.keep_alive)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgscopeConfig {
    pub scope: ScopeSettings,
    pub routes: RouteSettings,
}

impl OrgscopeConfig {
    /// Load from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok()).context("loading ORGSCOPE_* configuration")
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load through an arbitrary variable lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("ORGSCOPE_DEPT_COLUMN") {
            config.scope.dept_column = v;
        }
        if let Some(v) = lookup("ORGSCOPE_OWNER_COLUMN") {
            config.scope.owner_column = v;
        }
        config.scope.dept_alias = lookup("ORGSCOPE_DEPT_ALIAS").filter(|v| !v.is_empty());
        config.scope.owner_alias = lookup("ORGSCOPE_OWNER_ALIAS").filter(|v| !v.is_empty());
        if let Some(v) = lookup("ORGSCOPE_PARAM_STYLE") {
            config.scope.param_style = parse_param_style(&v)?;
        }

        if let Some(v) = lookup("ORGSCOPE_ROUTE_LAYOUT") {
            config.routes.layout_component = v;
        }
        if let Some(v) = lookup("ORGSCOPE_ROUTE_NAME_PREFIX") {
            config.routes.name_prefix = v;
        }
        if let Some(v) = lookup("ORGSCOPE_ROUTE_KEEP_ALIVE") {
            config.routes.keep_alive = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("ORGSCOPE_ROUTE_KEEP_ALIVE", format!("expected true/false, got '{v}'")))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scope.columns()?;
        if self.routes.layout_component.trim().is_empty() {
            return Err(ConfigError::invalid("layout_component", "must not be empty"));
        }
        if self.routes.name_prefix.trim().is_empty() {
            return Err(ConfigError::invalid("name_prefix", "must not be empty"));
        }
        Ok(())
    }
}

fn parse_param_style(raw: &str) -> Result<ParamStyle, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "literal" => Ok(ParamStyle::Literal),
        "positional" | "?" => Ok(ParamStyle::Positional),
        "numbered" | "$" => Ok(ParamStyle::Numbered),
        other => Err(ConfigError::invalid(
            "ORGSCOPE_PARAM_STYLE",
            format!("expected literal, positional or numbered, got '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_conventional_columns() {
        let config = OrgscopeConfig::from_lookup(lookup(&[])).unwrap();
        let columns = config.scope.columns().unwrap();
        assert_eq!(columns.dept, Some(ColumnRef::new("dept_id")));
        assert_eq!(columns.owner, Some(ColumnRef::new("create_by")));
        assert_eq!(config.routes.projector(), RouteProjector::default());
    }

    #[test]
    fn environment_overrides() {
        let config = OrgscopeConfig::from_lookup(lookup(&[
            ("ORGSCOPE_DEPT_ALIAS", "d"),
            ("ORGSCOPE_OWNER_COLUMN", "created_by"),
            ("ORGSCOPE_OWNER_ALIAS", "u"),
            ("ORGSCOPE_PARAM_STYLE", "Numbered"),
            ("ORGSCOPE_ROUTE_KEEP_ALIVE", "false"),
        ]))
        .unwrap();

        let columns = config.scope.columns().unwrap();
        assert_eq!(columns.dept.unwrap().to_string(), "d.dept_id");
        assert_eq!(columns.owner.unwrap().to_string(), "u.created_by");
        assert_eq!(config.scope.renderer().style(), ParamStyle::Numbered);
        assert!(!config.routes.keep_alive);
    }

    #[test]
    fn rejects_injection_in_column_names() {
        let err = OrgscopeConfig::from_lookup(lookup(&[("ORGSCOPE_DEPT_COLUMN", "dept_id OR 1=1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "dept_column", .. }));

        assert!(OrgscopeConfig::from_lookup(lookup(&[("ORGSCOPE_PARAM_STYLE", "named")])).is_err());
        assert!(OrgscopeConfig::from_lookup(lookup(&[("ORGSCOPE_ROUTE_KEEP_ALIVE", "yes")])).is_err());
    }

    #[test]
    fn json_documents_fill_missing_fields_with_defaults() {
        let config =
            OrgscopeConfig::from_json_str(r#"{"scope":{"deptAlias":"t","paramStyle":"positional"}}"#).unwrap();
        assert_eq!(config.scope.dept_column, "dept_id");
        assert_eq!(config.scope.param_style, ParamStyle::Positional);
        assert_eq!(config.routes.layout_component, "BasicLayout");

        assert!(matches!(OrgscopeConfig::from_json_str("{"), Err(ConfigError::Json(_))));
    }
}
