use std::marker::PhantomData;

use serde_json::Value;
use tracing::debug;

use crate::entity::AggregateRoot;
use crate::error::StoreError;
use crate::query::{FindOptions, Ordering, Page, Predicate, UpdateOp, UpdateSet};
use crate::retry::RetryPolicy;
use crate::store::{Collection, CollectionProvider};

/// Blocking repository for one entity type.
///
/// Resolves its collection handle once at construction; every operation
/// runs to completion on the calling thread, with store round trips routed
/// through the repository's retry policy.
pub struct Repository<T, C> {
    collection: C,
    retry: RetryPolicy,
    _marker: PhantomData<T>,
}

impl<T, C> Repository<T, C>
where
    T: AggregateRoot,
    C: Collection<T>,
{
    /// Repository backed by the provider's collection for `T`.
    pub fn new<P>(provider: &P) -> Self
    where
        P: CollectionProvider<Handle<T> = C>,
    {
        debug!(collection = T::COLLECTION, "repository created");
        Repository::with_collection(provider.collection::<T>())
    }

    /// Repository over an already-resolved collection handle.
    pub fn with_collection(collection: C) -> Self {
        Repository {
            collection,
            retry: RetryPolicy::new(),
            _marker: PhantomData,
        }
    }

    // --- Find ---

    /// All records matching `predicate`, in store default order.
    pub fn find(&self, predicate: Predicate) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::filtered(predicate);
        self.retry.execute(|| self.collection.find(&options))
    }

    /// Paged find ordered by id, descending.
    pub fn find_page(&self, predicate: Predicate, page: Page) -> Result<Vec<T>, StoreError> {
        self.find_ordered(predicate, Ordering::default(), page)
    }

    /// Canonical paged, ordered find: `skip = index × size`, `limit = size`.
    pub fn find_ordered(
        &self,
        predicate: Predicate,
        ordering: Ordering,
        page: Page,
    ) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::paged(predicate, ordering, page);
        self.retry.execute(|| self.collection.find(&options))
    }

    // --- FindAll ---

    /// Every record in the collection.
    pub fn find_all(&self) -> Result<Vec<T>, StoreError> {
        self.find(Predicate::all())
    }

    pub fn find_all_page(&self, page: Page) -> Result<Vec<T>, StoreError> {
        self.find_page(Predicate::all(), page)
    }

    pub fn find_all_ordered(&self, ordering: Ordering, page: Page) -> Result<Vec<T>, StoreError> {
        self.find_ordered(Predicate::all(), ordering, page)
    }

    // --- First / Last ---

    /// First record in the collection, by id ascending.
    pub fn first(&self) -> Result<Option<T>, StoreError> {
        self.first_ordered(Predicate::all(), Ordering::default().ascending())
    }

    /// First matching record, by id ascending.
    pub fn first_where(&self, predicate: Predicate) -> Result<Option<T>, StoreError> {
        self.first_ordered(predicate, Ordering::default().ascending())
    }

    /// First matching record under the given ordering: page 0, size 1.
    pub fn first_ordered(
        &self,
        predicate: Predicate,
        ordering: Ordering,
    ) -> Result<Option<T>, StoreError> {
        Ok(self
            .find_ordered(predicate, ordering, Page::first(1))?
            .into_iter()
            .next())
    }

    /// Last record in the collection: first under id descending.
    pub fn last(&self) -> Result<Option<T>, StoreError> {
        self.last_ordered(Predicate::all(), Ordering::default().ascending())
    }

    /// Last matching record, by id.
    pub fn last_where(&self, predicate: Predicate) -> Result<Option<T>, StoreError> {
        self.last_ordered(predicate, Ordering::default().ascending())
    }

    /// "Last" is defined purely as first under the reversed ordering.
    pub fn last_ordered(
        &self,
        predicate: Predicate,
        ordering: Ordering,
    ) -> Result<Option<T>, StoreError> {
        self.first_ordered(predicate, ordering.reverse())
    }

    // --- Get / Any ---

    /// The record with the given id, or `None`. A blank id is rejected
    /// before the store is touched.
    pub fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::BlankId);
        }
        let options = FindOptions::filtered(Predicate::id(id));
        Ok(self
            .retry
            .execute(|| self.collection.find(&options))?
            .into_iter()
            .next())
    }

    /// Whether any record matches, without materializing records.
    pub fn any(&self, predicate: Predicate) -> Result<bool, StoreError> {
        self.retry.execute(|| self.collection.exists(&predicate))
    }

    // --- Insert ---

    /// Persist a new entity; the store-assigned id is written back.
    pub fn insert(&self, entity: &mut T) -> Result<(), StoreError> {
        let inserted = self
            .retry
            .execute(|| self.collection.insert_one(entity.clone()))?;
        *entity = inserted;
        Ok(())
    }

    /// Persist a batch; assigned ids are written back. Batch atomicity is
    /// whatever the store primitive provides.
    pub fn insert_many(&self, entities: &mut [T]) -> Result<(), StoreError> {
        let inserted = self
            .retry
            .execute(|| self.collection.insert_many(entities.to_vec()))?;
        for (slot, persisted) in entities.iter_mut().zip(inserted) {
            *slot = persisted;
        }
        Ok(())
    }

    // --- Replace ---

    /// Whole-document overwrite keyed by the entity's own id.
    pub fn replace(&self, entity: &T) -> Result<(), StoreError> {
        if entity.id().trim().is_empty() {
            return Err(StoreError::BlankId);
        }
        self.retry
            .execute(|| self.collection.replace_one(entity.id(), entity))
    }

    /// Sequential per-entity replace in input order, one at a time. No
    /// rollback: a failure partway through leaves earlier entities replaced
    /// and later ones untouched.
    pub fn replace_many(&self, entities: &[T]) -> Result<(), StoreError> {
        for entity in entities {
            self.replace(entity)?;
        }
        Ok(())
    }

    // --- Update ---

    /// Apply field updates to the record with the given id. Returns the
    /// store's acknowledgement, not whether a record matched.
    pub fn update(&self, id: &str, ops: Vec<UpdateOp>) -> Result<bool, StoreError> {
        self.update_where(Predicate::id(id), ops)
    }

    /// Apply field updates to the record the entity identifies.
    pub fn update_entity(&self, entity: &T, ops: Vec<UpdateOp>) -> Result<bool, StoreError> {
        if entity.id().trim().is_empty() {
            return Err(StoreError::BlankId);
        }
        self.update(entity.id(), ops)
    }

    /// Combine ops into one atomic update, always touching `modified_at`,
    /// and apply it to every matching record.
    pub fn update_where(
        &self,
        predicate: Predicate,
        ops: Vec<UpdateOp>,
    ) -> Result<bool, StoreError> {
        let update = UpdateSet::combine(ops);
        self.retry
            .execute(|| self.collection.update_many(&predicate, &update))
    }

    /// Single-field convenience form of [`update`](Self::update).
    pub fn update_field(
        &self,
        id: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<bool, StoreError> {
        self.update(id, vec![UpdateOp::set(field, value)])
    }

    /// Single-field convenience form of [`update_where`](Self::update_where).
    pub fn update_field_where(
        &self,
        predicate: Predicate,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<bool, StoreError> {
        self.update_where(predicate, vec![UpdateOp::set(field, value)])
    }

    // --- Delete ---

    /// Delete by id; at most one record affected. Deleting an id that no
    /// longer exists is a no-op.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_where(Predicate::id(id))
    }

    /// Delegates to [`delete`](Self::delete) with the entity's id.
    pub fn delete_entity(&self, entity: &T) -> Result<(), StoreError> {
        if entity.id().trim().is_empty() {
            return Err(StoreError::BlankId);
        }
        self.delete(entity.id())
    }

    /// Bulk delete; no affected count is surfaced.
    pub fn delete_where(&self, predicate: Predicate) -> Result<(), StoreError> {
        self.retry
            .execute(|| self.collection.delete_many(&predicate))
    }
}
