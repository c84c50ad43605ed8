//! Infrastructure layer: directory storage, configuration and services.

pub mod config;
pub mod directory;
pub mod read_model;
pub mod service;

pub use config::{ConfigError, OrgscopeConfig, RouteSettings, ScopeSettings};
pub use directory::{InMemoryDirectory, RoleRecord, UserRecord};
pub use service::{DataScopeService, DeptService, DeptSource, FixedSession, MenuService, MenuSource};
