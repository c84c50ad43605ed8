//! `orgscope-sys` — system records (departments, menus) and navigation routes.
//!
//! Records here are plain data; loading them is the infra layer's job. Both
//! record kinds implement [`orgscope_core::Hierarchical`] so they assemble
//! into forests directly, and menu forests project into [`RouteRecord`]s.

pub mod dept;
pub mod menu;
pub mod route;

pub use dept::Dept;
pub use menu::{Menu, MenuKind};
pub use route::{RouteMeta, RouteProjector, RouteRecord};
