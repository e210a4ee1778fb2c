use std::hash::Hash;

/// Handle to a resource stored in a [`crate::Pool`].
///
/// The pool never looks inside a handle, it only compares handles with
/// [`Eq`] and [`Hash`]. Every value is a valid handle, including ones such as
/// `0` or `""`. Implemented for every type that is `Eq + Hash + Clone`.
pub trait Resource: Eq + Hash + Clone {}

impl<T: Eq + Hash + Clone> Resource for T {}
