//! Predicate & projection model.
//!
//! Opaque, composable descriptions of which records (predicate), in what
//! order (ordering + page), and which fields change (update operations),
//! decoupled from any concrete query language. The store adapter is the
//! only place these descriptions are interpreted.

mod find;
mod ordering;
mod predicate;
mod update;

pub use find::FindOptions;
pub use ordering::{Ordering, Page};
pub use predicate::{FieldPredicate, Predicate};
pub use update::{UpdateOp, UpdateSet};
