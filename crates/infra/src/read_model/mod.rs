//! Keyed record storage backing the in-memory directory.

pub mod store;

pub use store::{InMemoryStore, Store};
