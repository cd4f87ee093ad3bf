//! Store boundary: collection primitives and providers.
//!
//! The repositories orchestrate these primitives; they never interpret a
//! predicate or update themselves. Adapters for real drivers translate the
//! descriptions into native query syntax; [`MemoryStore`] evaluates them
//! directly and doubles as the test double.

mod memory;

pub use memory::{MemoryCollection, MemoryStore};

use async_trait::async_trait;

use crate::entity::AggregateRoot;
use crate::error::StoreError;
use crate::query::{FindOptions, Predicate, UpdateSet};

/// Blocking primitives one backing collection must offer.
pub trait Collection<T: AggregateRoot>: Send + Sync {
    /// Insert one document. Assigns an id when the entity has none and
    /// returns the persisted entity.
    fn insert_one(&self, entity: T) -> Result<T, StoreError>;

    /// Insert a batch. Atomicity is whatever the store provides; a failure
    /// partway through leaves a store-defined partial state.
    fn insert_many(&self, entities: Vec<T>) -> Result<Vec<T>, StoreError>;

    /// Overwrite the whole document with the given id. A missing id is a
    /// no-op, matching driver replace semantics without upsert.
    fn replace_one(&self, id: &str, entity: &T) -> Result<(), StoreError>;

    /// Delete every document matching the predicate.
    fn delete_many(&self, predicate: &Predicate) -> Result<(), StoreError>;

    /// Find documents: predicate, then sort, then skip/limit, in that order.
    fn find(&self, options: &FindOptions) -> Result<Vec<T>, StoreError>;

    /// Apply a combined update to every matching document. Returns the
    /// store's acknowledgement, not the matched count.
    fn update_many(&self, predicate: &Predicate, update: &UpdateSet) -> Result<bool, StoreError>;

    /// Whether any document matches, without materializing records.
    fn exists(&self, predicate: &Predicate) -> Result<bool, StoreError>;
}

/// Suspending twin of [`Collection`]. Every method is a suspension point;
/// control returns to the caller's scheduler while the round trip is
/// outstanding.
#[async_trait]
pub trait AsyncCollection<T: AggregateRoot>: Send + Sync {
    async fn insert_one(&self, entity: T) -> Result<T, StoreError>;

    async fn insert_many(&self, entities: Vec<T>) -> Result<Vec<T>, StoreError>;

    async fn replace_one(&self, id: &str, entity: &T) -> Result<(), StoreError>;

    async fn delete_many(&self, predicate: &Predicate) -> Result<(), StoreError>;

    async fn find(&self, options: &FindOptions) -> Result<Vec<T>, StoreError>;

    async fn update_many(
        &self,
        predicate: &Predicate,
        update: &UpdateSet,
    ) -> Result<bool, StoreError>;

    async fn exists(&self, predicate: &Predicate) -> Result<bool, StoreError>;
}

/// Resolves an entity type to its backing collection handle.
///
/// Repeated calls for the same type must return handles to the same logical
/// collection. Repositories call this once at construction and share the
/// long-lived handle afterwards; handles must be safe for concurrent use.
pub trait CollectionProvider: Send + Sync {
    type Handle<T: AggregateRoot>: Collection<T>;

    fn collection<T: AggregateRoot>(&self) -> Self::Handle<T>;
}

/// Async counterpart of [`CollectionProvider`].
pub trait AsyncCollectionProvider: Send + Sync {
    type Handle<T: AggregateRoot>: AsyncCollection<T>;

    fn collection<T: AggregateRoot>(&self) -> Self::Handle<T>;
}
