//! Entity traits: identity, plus placement in a parent-pointer hierarchy.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity stored as a flat row pointing at its parent.
///
/// Departments and menus both implement this so they can be fed to
/// [`crate::tree::assemble`] without hand-written conversion code.
pub trait Hierarchical: Entity {
    /// Parent identifier; the root sentinel for top-level rows.
    fn parent_id(&self) -> &Self::Id;

    /// Ordering key among siblings (ascending).
    fn sort_key(&self) -> i32;
}
