//! Repository façades over one entity type's collection.
//!
//! [`Repository`] blocks the calling thread; [`AsyncRepository`] suspends at
//! every store round trip. The two are operation-for-operation equivalent:
//! both build their reads and updates through the same [`crate::query`]
//! constructors and route every round trip through their own
//! [`crate::retry::RetryPolicy`].

mod blocking;
mod suspending;

pub use blocking::Repository;
pub use suspending::AsyncRepository;
