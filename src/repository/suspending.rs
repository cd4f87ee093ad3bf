use std::marker::PhantomData;

use serde_json::Value;
use tracing::debug;

use crate::entity::AggregateRoot;
use crate::error::StoreError;
use crate::query::{FindOptions, Ordering, Page, Predicate, UpdateOp, UpdateSet};
use crate::retry::RetryPolicy;
use crate::store::{AsyncCollection, AsyncCollectionProvider};

/// Suspending repository for one entity type.
///
/// Operation-for-operation equivalent to [`crate::Repository`]; every store
/// round trip is a suspension point and no worker thread blocks while a
/// call is outstanding. Retried calls are awaited with the same attempt
/// counting as the blocking façade.
pub struct AsyncRepository<T, C> {
    collection: C,
    retry: RetryPolicy,
    _marker: PhantomData<T>,
}

impl<T, C> AsyncRepository<T, C>
where
    T: AggregateRoot,
    C: AsyncCollection<T>,
{
    /// Repository backed by the provider's collection for `T`.
    pub fn new<P>(provider: &P) -> Self
    where
        P: AsyncCollectionProvider<Handle<T> = C>,
    {
        debug!(collection = T::COLLECTION, "async repository created");
        AsyncRepository::with_collection(provider.collection::<T>())
    }

    /// Repository over an already-resolved collection handle.
    pub fn with_collection(collection: C) -> Self {
        AsyncRepository {
            collection,
            retry: RetryPolicy::new(),
            _marker: PhantomData,
        }
    }

    // --- Find ---

    /// All records matching `predicate`, in store default order.
    pub async fn find(&self, predicate: Predicate) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::filtered(predicate);
        self.retry
            .execute_async(|| self.collection.find(&options))
            .await
    }

    /// Paged find ordered by id, descending.
    pub async fn find_page(&self, predicate: Predicate, page: Page) -> Result<Vec<T>, StoreError> {
        self.find_ordered(predicate, Ordering::default(), page).await
    }

    /// Canonical paged, ordered find: `skip = index × size`, `limit = size`.
    pub async fn find_ordered(
        &self,
        predicate: Predicate,
        ordering: Ordering,
        page: Page,
    ) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::paged(predicate, ordering, page);
        self.retry
            .execute_async(|| self.collection.find(&options))
            .await
    }

    // --- FindAll ---

    /// Every record in the collection.
    pub async fn find_all(&self) -> Result<Vec<T>, StoreError> {
        self.find(Predicate::all()).await
    }

    pub async fn find_all_page(&self, page: Page) -> Result<Vec<T>, StoreError> {
        self.find_page(Predicate::all(), page).await
    }

    pub async fn find_all_ordered(
        &self,
        ordering: Ordering,
        page: Page,
    ) -> Result<Vec<T>, StoreError> {
        self.find_ordered(Predicate::all(), ordering, page).await
    }

    // --- First / Last ---

    /// First record in the collection, by id ascending.
    pub async fn first(&self) -> Result<Option<T>, StoreError> {
        self.first_ordered(Predicate::all(), Ordering::default().ascending())
            .await
    }

    /// First matching record, by id ascending.
    pub async fn first_where(&self, predicate: Predicate) -> Result<Option<T>, StoreError> {
        self.first_ordered(predicate, Ordering::default().ascending())
            .await
    }

    /// First matching record under the given ordering: page 0, size 1.
    pub async fn first_ordered(
        &self,
        predicate: Predicate,
        ordering: Ordering,
    ) -> Result<Option<T>, StoreError> {
        Ok(self
            .find_ordered(predicate, ordering, Page::first(1))
            .await?
            .into_iter()
            .next())
    }

    /// Last record in the collection: first under id descending.
    pub async fn last(&self) -> Result<Option<T>, StoreError> {
        self.last_ordered(Predicate::all(), Ordering::default().ascending())
            .await
    }

    /// Last matching record, by id.
    pub async fn last_where(&self, predicate: Predicate) -> Result<Option<T>, StoreError> {
        self.last_ordered(predicate, Ordering::default().ascending())
            .await
    }

    /// "Last" is defined purely as first under the reversed ordering.
    pub async fn last_ordered(
        &self,
        predicate: Predicate,
        ordering: Ordering,
    ) -> Result<Option<T>, StoreError> {
        self.first_ordered(predicate, ordering.reverse()).await
    }

    // --- Get / Any ---

    /// The record with the given id, or `None`. A blank id is rejected
    /// before the store is touched.
    pub async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::BlankId);
        }
        let options = FindOptions::filtered(Predicate::id(id));
        Ok(self
            .retry
            .execute_async(|| self.collection.find(&options))
            .await?
            .into_iter()
            .next())
    }

    /// Whether any record matches, without materializing records.
    pub async fn any(&self, predicate: Predicate) -> Result<bool, StoreError> {
        self.retry
            .execute_async(|| self.collection.exists(&predicate))
            .await
    }

    // --- Insert ---

    /// Persist a new entity; the store-assigned id is written back.
    pub async fn insert(&self, entity: &mut T) -> Result<(), StoreError> {
        let inserted = self
            .retry
            .execute_async(|| self.collection.insert_one(entity.clone()))
            .await?;
        *entity = inserted;
        Ok(())
    }

    /// Persist a batch; assigned ids are written back. Batch atomicity is
    /// whatever the store primitive provides.
    pub async fn insert_many(&self, entities: &mut [T]) -> Result<(), StoreError> {
        let inserted = self
            .retry
            .execute_async(|| self.collection.insert_many(entities.to_vec()))
            .await?;
        for (slot, persisted) in entities.iter_mut().zip(inserted) {
            *slot = persisted;
        }
        Ok(())
    }

    // --- Replace ---

    /// Whole-document overwrite keyed by the entity's own id.
    pub async fn replace(&self, entity: &T) -> Result<(), StoreError> {
        if entity.id().trim().is_empty() {
            return Err(StoreError::BlankId);
        }
        self.retry
            .execute_async(|| self.collection.replace_one(entity.id(), entity))
            .await
    }

    /// Sequential per-entity replace: each write is awaited before the next
    /// begins, in input order. No rollback on partial failure.
    pub async fn replace_many(&self, entities: &[T]) -> Result<(), StoreError> {
        for entity in entities {
            self.replace(entity).await?;
        }
        Ok(())
    }

    // --- Update ---

    /// Apply field updates to the record with the given id. Returns the
    /// store's acknowledgement, not whether a record matched.
    pub async fn update(&self, id: &str, ops: Vec<UpdateOp>) -> Result<bool, StoreError> {
        self.update_where(Predicate::id(id), ops).await
    }

    /// Apply field updates to the record the entity identifies.
    pub async fn update_entity(&self, entity: &T, ops: Vec<UpdateOp>) -> Result<bool, StoreError> {
        if entity.id().trim().is_empty() {
            return Err(StoreError::BlankId);
        }
        self.update(entity.id(), ops).await
    }

    /// Combine ops into one atomic update, always touching `modified_at`,
    /// and apply it to every matching record.
    pub async fn update_where(
        &self,
        predicate: Predicate,
        ops: Vec<UpdateOp>,
    ) -> Result<bool, StoreError> {
        let update = UpdateSet::combine(ops);
        self.retry
            .execute_async(|| self.collection.update_many(&predicate, &update))
            .await
    }

    /// Single-field convenience form of [`update`](Self::update).
    pub async fn update_field(
        &self,
        id: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<bool, StoreError> {
        self.update(id, vec![UpdateOp::set(field, value)]).await
    }

    /// Single-field convenience form of [`update_where`](Self::update_where).
    pub async fn update_field_where(
        &self,
        predicate: Predicate,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<bool, StoreError> {
        self.update_where(predicate, vec![UpdateOp::set(field, value)])
            .await
    }

    // --- Delete ---

    /// Delete by id; at most one record affected. Deleting an id that no
    /// longer exists is a no-op.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_where(Predicate::id(id)).await
    }

    /// Delegates to [`delete`](Self::delete) with the entity's id.
    pub async fn delete_entity(&self, entity: &T) -> Result<(), StoreError> {
        if entity.id().trim().is_empty() {
            return Err(StoreError::BlankId);
        }
        self.delete(entity.id()).await
    }

    /// Bulk delete; no affected count is surfaced.
    pub async fn delete_where(&self, predicate: Predicate) -> Result<(), StoreError> {
        self.retry
            .execute_async(|| self.collection.delete_many(&predicate))
            .await
    }
}
