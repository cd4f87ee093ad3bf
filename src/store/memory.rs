//! In-memory document store: the reference adapter and test double.
//!
//! Documents are JSON objects grouped by collection name and kept in
//! insertion order, so equal sort keys retain store order. Negative skip or
//! limit values are clamped at zero here; other adapters may do otherwise.
//! Storage is shared through `Arc`, so clones and every handle resolved from
//! one store see the same data.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{
    AsyncCollection, AsyncCollectionProvider, Collection, CollectionProvider,
};
use crate::entity::{fields, AggregateRoot};
use crate::error::StoreError;
use crate::query::{FindOptions, Predicate, UpdateOp, UpdateSet};

type Collections = HashMap<String, Vec<Value>>;

/// In-memory document store implementing both collection providers.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    faults: Arc<Mutex<VecDeque<StoreError>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error to be returned by an upcoming store call. Queued
    /// errors are consumed one per call, before the call touches any data.
    pub fn fail_next(&self, err: StoreError) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push_back(err);
        }
    }

    /// Number of injected errors not yet consumed.
    pub fn pending_faults(&self) -> usize {
        self.faults.lock().map(|f| f.len()).unwrap_or(0)
    }

    fn consume_fault(&self) -> Result<(), StoreError> {
        let mut faults = self.faults.lock().map_err(|_| StoreError::Poisoned)?;
        match faults.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl CollectionProvider for MemoryStore {
    type Handle<T: AggregateRoot> = MemoryCollection<T>;

    fn collection<T: AggregateRoot>(&self) -> MemoryCollection<T> {
        MemoryCollection {
            store: self.clone(),
            name: T::COLLECTION,
            _marker: PhantomData,
        }
    }
}

impl AsyncCollectionProvider for MemoryStore {
    type Handle<T: AggregateRoot> = MemoryCollection<T>;

    fn collection<T: AggregateRoot>(&self) -> MemoryCollection<T> {
        CollectionProvider::collection::<T>(self)
    }
}

/// Typed handle to one in-memory collection.
#[derive(Clone)]
pub struct MemoryCollection<T> {
    store: MemoryStore,
    name: &'static str,
    _marker: PhantomData<T>,
}

impl<T: AggregateRoot> MemoryCollection<T> {
    fn doc_id(doc: &Value) -> &str {
        doc.get(fields::ID).and_then(Value::as_str).unwrap_or("")
    }
}

impl<T: AggregateRoot> Collection<T> for MemoryCollection<T> {
    fn insert_one(&self, mut entity: T) -> Result<T, StoreError> {
        self.store.consume_fault()?;
        if entity.id().trim().is_empty() {
            entity.set_id(Uuid::new_v4().simple().to_string());
        }
        let doc = serde_json::to_value(&entity)?;

        let mut collections = self
            .store
            .collections
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        let docs = collections.entry(self.name.to_string()).or_default();
        if docs.iter().any(|d| Self::doc_id(d) == entity.id()) {
            return Err(StoreError::Duplicate {
                collection: self.name.to_string(),
                id: entity.id().to_string(),
            });
        }
        docs.push(doc);
        Ok(entity)
    }

    fn insert_many(&self, entities: Vec<T>) -> Result<Vec<T>, StoreError> {
        self.store.consume_fault()?;
        let mut collections = self
            .store
            .collections
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        let docs = collections.entry(self.name.to_string()).or_default();

        let mut inserted = Vec::with_capacity(entities.len());
        for mut entity in entities {
            if entity.id().trim().is_empty() {
                entity.set_id(Uuid::new_v4().simple().to_string());
            }
            // A conflict mid-batch leaves earlier documents in place.
            if docs.iter().any(|d| Self::doc_id(d) == entity.id()) {
                return Err(StoreError::Duplicate {
                    collection: self.name.to_string(),
                    id: entity.id().to_string(),
                });
            }
            docs.push(serde_json::to_value(&entity)?);
            inserted.push(entity);
        }
        Ok(inserted)
    }

    fn replace_one(&self, id: &str, entity: &T) -> Result<(), StoreError> {
        self.store.consume_fault()?;
        let doc = serde_json::to_value(entity)?;
        let mut collections = self
            .store
            .collections
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        let docs = collections.entry(self.name.to_string()).or_default();
        if let Some(slot) = docs.iter_mut().find(|d| Self::doc_id(d) == id) {
            *slot = doc;
        }
        Ok(())
    }

    fn delete_many(&self, predicate: &Predicate) -> Result<(), StoreError> {
        self.store.consume_fault()?;
        let mut collections = self
            .store
            .collections
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        if let Some(docs) = collections.get_mut(self.name) {
            docs.retain(|d| !matches(predicate, d));
        }
        Ok(())
    }

    fn find(&self, options: &FindOptions) -> Result<Vec<T>, StoreError> {
        self.store.consume_fault()?;
        let collections = self
            .store
            .collections
            .read()
            .map_err(|_| StoreError::Poisoned)?;

        let mut found: Vec<Value> = collections
            .get(self.name)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches(&options.predicate, d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if let Some(sort) = &options.sort {
            // Stable sort over insertion order; ties keep store order.
            found.sort_by(|a, b| {
                let ordering = compare(
                    field_value(a, &sort.field).unwrap_or(&Value::Null),
                    field_value(b, &sort.field).unwrap_or(&Value::Null),
                )
                .unwrap_or(CmpOrdering::Equal);
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let skip = options.skip.unwrap_or(0).max(0) as usize;
        let iter = found.into_iter().skip(skip);
        let selected: Vec<Value> = match options.limit {
            Some(limit) => iter.take(limit.max(0) as usize).collect(),
            None => iter.collect(),
        };

        selected
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    fn update_many(&self, predicate: &Predicate, update: &UpdateSet) -> Result<bool, StoreError> {
        self.store.consume_fault()?;
        let now = serde_json::to_value(Utc::now())?;
        let mut collections = self
            .store
            .collections
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        if let Some(docs) = collections.get_mut(self.name) {
            for doc in docs.iter_mut().filter(|d| matches(predicate, d)) {
                for op in update.ops() {
                    match op {
                        UpdateOp::Set { field, value } => set_path(doc, field, value.clone()),
                        UpdateOp::Unset { field } => unset_path(doc, field),
                        UpdateOp::CurrentDate { field } => set_path(doc, field, now.clone()),
                    }
                }
            }
        }
        // Acknowledgement, not match count: zero matched documents is still
        // an acknowledged write.
        Ok(true)
    }

    fn exists(&self, predicate: &Predicate) -> Result<bool, StoreError> {
        self.store.consume_fault()?;
        let collections = self
            .store
            .collections
            .read()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(collections
            .get(self.name)
            .map(|docs| docs.iter().any(|d| matches(predicate, d)))
            .unwrap_or(false))
    }
}

#[async_trait]
impl<T: AggregateRoot> AsyncCollection<T> for MemoryCollection<T> {
    async fn insert_one(&self, entity: T) -> Result<T, StoreError> {
        Collection::insert_one(self, entity)
    }

    async fn insert_many(&self, entities: Vec<T>) -> Result<Vec<T>, StoreError> {
        Collection::insert_many(self, entities)
    }

    async fn replace_one(&self, id: &str, entity: &T) -> Result<(), StoreError> {
        Collection::replace_one(self, id, entity)
    }

    async fn delete_many(&self, predicate: &Predicate) -> Result<(), StoreError> {
        Collection::delete_many(self, predicate)
    }

    async fn find(&self, options: &FindOptions) -> Result<Vec<T>, StoreError> {
        Collection::find(self, options)
    }

    async fn update_many(
        &self,
        predicate: &Predicate,
        update: &UpdateSet,
    ) -> Result<bool, StoreError> {
        Collection::update_many(self, predicate, update)
    }

    async fn exists(&self, predicate: &Predicate) -> Result<bool, StoreError> {
        Collection::exists(self, predicate)
    }
}

/// Resolve a dot-separated path inside a document.
fn field_value<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Total order over the comparable JSON scalars; `None` for mixed or
/// non-scalar operands. Missing fields compare as null, which sorts first
/// ascending.
fn compare(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(CmpOrdering::Equal),
        (Value::Null, _) => Some(CmpOrdering::Less),
        (_, Value::Null) => Some(CmpOrdering::Greater),
        (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn matches(predicate: &Predicate, doc: &Value) -> bool {
    let resolved = |field: &str| field_value(doc, field).unwrap_or(&Value::Null);
    match predicate {
        Predicate::All => true,
        Predicate::Eq { field, value } => resolved(field) == value,
        Predicate::Ne { field, value } => resolved(field) != value,
        Predicate::Gt { field, value } => {
            compare(resolved(field), value) == Some(CmpOrdering::Greater)
        }
        Predicate::Gte { field, value } => matches!(
            compare(resolved(field), value),
            Some(CmpOrdering::Greater) | Some(CmpOrdering::Equal)
        ),
        Predicate::Lt { field, value } => compare(resolved(field), value) == Some(CmpOrdering::Less),
        Predicate::Lte { field, value } => matches!(
            compare(resolved(field), value),
            Some(CmpOrdering::Less) | Some(CmpOrdering::Equal)
        ),
        Predicate::And(parts) => parts.iter().all(|p| matches(p, doc)),
        Predicate::Or(parts) => parts.iter().any(|p| matches(p, doc)),
        Predicate::Not(inner) => !matches(inner, doc),
    }
}

/// Set a (possibly nested) field, creating intermediate objects as needed.
fn set_path(doc: &mut Value, path: &str, value: Value) {
    let parts: Vec<&str> = path.split('.').collect();
    let (last, init) = match parts.split_last() {
        Some(split) => split,
        None => return,
    };
    let mut current = doc;
    for part in init {
        let map = match current {
            Value::Object(map) => map,
            _ => return,
        };
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if let Value::Object(map) = current {
        map.insert(last.to_string(), value);
    }
}

fn unset_path(doc: &mut Value, path: &str) {
    let parts: Vec<&str> = path.split('.').collect();
    let (last, init) = match parts.split_last() {
        Some(split) => split,
        None => return,
    };
    let mut current = doc;
    for part in init {
        match current.get_mut(*part) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Value::Object(map) = current {
        map.remove(*last);
    }
}

#[cfg(test)]
mod tests {
    use super::{Collection, CollectionProvider, MemoryCollection, MemoryStore};
    use crate::entity::{AggregateRoot, Identity};
    use crate::error::StoreError;
    use crate::query::{FindOptions, Ordering, Page, Predicate, UpdateOp, UpdateSet};
    use serde_json::Value;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use std::io::{Error as IoError, ErrorKind};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Doc {
        #[serde(flatten)]
        identity: Identity,
        #[serde(default)]
        name: String,
        score: i64,
    }

    impl Doc {
        fn new(name: &str, score: i64) -> Self {
            Doc {
                identity: Identity::new(),
                name: name.to_string(),
                score,
            }
        }
    }

    impl AggregateRoot for Doc {
        const COLLECTION: &'static str = "docs";
        fn id(&self) -> &str {
            &self.identity.id
        }
        fn set_id(&mut self, id: String) {
            self.identity.id = id;
        }
        fn created_at(&self) -> DateTime<Utc> {
            self.identity.created_at
        }
        fn modified_at(&self) -> Option<DateTime<Utc>> {
            self.identity.modified_at
        }
    }

    fn handle(store: &MemoryStore) -> MemoryCollection<Doc> {
        CollectionProvider::collection::<Doc>(store)
    }

    fn seed(coll: &MemoryCollection<Doc>, docs: &[(&str, i64)]) -> Vec<Doc> {
        docs.iter()
            .map(|(name, score)| coll.insert_one(Doc::new(name, *score)).unwrap())
            .collect()
    }

    #[test]
    fn insert_assigns_an_id_when_blank() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        let doc = coll.insert_one(Doc::new("a", 1)).unwrap();
        assert!(!doc.id().is_empty());
    }

    #[test]
    fn insert_keeps_a_caller_provided_id() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        let mut doc = Doc::new("a", 1);
        doc.set_id("fixed".into());
        let doc = coll.insert_one(doc).unwrap();
        assert_eq!(doc.id(), "fixed");
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        let doc = coll.insert_one(Doc::new("a", 1)).unwrap();
        let err = coll.insert_one(doc).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[test]
    fn find_filters_with_predicates() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        seed(&coll, &[("a", 10), ("b", 20), ("c", 30)]);

        let gt = coll
            .find(&FindOptions::filtered(Predicate::field("score").gt(15)))
            .unwrap();
        assert_eq!(gt.len(), 2);

        let both = coll
            .find(&FindOptions::filtered(
                Predicate::field("score").gte(20).and(Predicate::field("name").eq("b")),
            ))
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].name, "b");

        let either = coll
            .find(&FindOptions::filtered(
                Predicate::field("name").eq("a").or(Predicate::field("name").eq("c")),
            ))
            .unwrap();
        assert_eq!(either.len(), 2);

        let negated = coll
            .find(&FindOptions::filtered(Predicate::field("name").eq("a").not()))
            .unwrap();
        assert_eq!(negated.len(), 2);
    }

    #[test]
    fn missing_fields_compare_as_null() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        seed(&coll, &[("a", 10)]);

        let none = coll
            .find(&FindOptions::filtered(Predicate::field("absent").gt(0)))
            .unwrap();
        assert!(none.is_empty());

        let eq_null = coll
            .find(&FindOptions::filtered(
                Predicate::field("absent").eq(Value::Null),
            ))
            .unwrap();
        assert_eq!(eq_null.len(), 1);
    }

    #[test]
    fn sort_respects_direction_and_keeps_ties_in_store_order() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        let seeded = seed(&coll, &[("first", 5), ("second", 5), ("low", 1)]);

        let ascending = coll
            .find(&FindOptions::paged(
                Predicate::all(),
                Ordering::by("score").ascending(),
                Page::first(10),
            ))
            .unwrap();
        assert_eq!(
            ascending.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            ["low", "first", "second"]
        );
        assert_eq!(ascending[1].id(), seeded[0].id());

        let descending = coll
            .find(&FindOptions::paged(
                Predicate::all(),
                Ordering::by("score"),
                Page::first(10),
            ))
            .unwrap();
        assert_eq!(
            descending
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>(),
            ["first", "second", "low"]
        );
    }

    #[test]
    fn skip_and_limit_slice_the_sorted_result() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        seed(&coll, &[("a", 1), ("b", 2), ("c", 3), ("d", 4)]);

        let page = coll
            .find(&FindOptions::paged(
                Predicate::all(),
                Ordering::by("score").ascending(),
                Page::new(1, 2),
            ))
            .unwrap();
        assert_eq!(
            page.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            ["c", "d"]
        );
    }

    #[test]
    fn negative_skip_and_limit_are_clamped() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        seed(&coll, &[("a", 1), ("b", 2)]);

        let clamped_skip = coll
            .find(&FindOptions::paged(
                Predicate::all(),
                Ordering::by("score").ascending(),
                Page::new(-1, 5),
            ))
            .unwrap();
        assert_eq!(clamped_skip.len(), 2);

        let clamped_limit = coll
            .find(&FindOptions::paged(
                Predicate::all(),
                Ordering::by("score").ascending(),
                Page::new(0, -3),
            ))
            .unwrap();
        assert!(clamped_limit.is_empty());
    }

    #[test]
    fn update_sets_fields_and_stamps_modified_at() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        let doc = seed(&coll, &[("a", 10)]).remove(0);

        let before = Utc::now();
        let acknowledged = coll
            .update_many(
                &Predicate::id(doc.id()),
                &UpdateSet::combine(vec![UpdateOp::set("score", 11)]),
            )
            .unwrap();
        assert!(acknowledged);

        let updated = coll
            .find(&FindOptions::filtered(Predicate::id(doc.id())))
            .unwrap()
            .remove(0);
        assert_eq!(updated.score, 11);
        assert!(updated.modified_at().unwrap() >= before);
        assert_eq!(updated.created_at(), doc.created_at());
    }

    #[test]
    fn update_creates_nested_paths_and_unset_removes() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        let doc = seed(&coll, &[("a", 1)]).remove(0);

        coll.update_many(
            &Predicate::id(doc.id()),
            &UpdateSet::combine(vec![
                UpdateOp::set("stats.wins", 3),
                UpdateOp::unset("name"),
            ]),
        )
        .unwrap();

        let updated = coll
            .find(&FindOptions::filtered(
                Predicate::field("stats.wins").eq(3),
            ))
            .unwrap()
            .remove(0);
        // The dropped declared field deserializes to its default; the
        // nested object lands in the catch-all.
        assert_eq!(updated.name, "");
        assert_eq!(updated.identity.extra["stats"]["wins"], 3);
    }

    #[test]
    fn update_with_no_matches_is_still_acknowledged() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        let acknowledged = coll
            .update_many(
                &Predicate::id("missing"),
                &UpdateSet::combine(vec![UpdateOp::set("score", 1)]),
            )
            .unwrap();
        assert!(acknowledged);
    }

    #[test]
    fn delete_many_removes_matches_only() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        seed(&coll, &[("a", 1), ("b", 2), ("c", 3)]);

        coll.delete_many(&Predicate::field("score").lt(3)).unwrap();
        let left = coll.find(&FindOptions::filtered(Predicate::all())).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "c");
    }

    #[test]
    fn replace_overwrites_and_missing_id_is_a_noop() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        let mut doc = seed(&coll, &[("a", 1)]).remove(0);

        doc.score = 99;
        coll.replace_one(doc.id(), &doc).unwrap();
        let found = coll.find(&FindOptions::filtered(Predicate::all())).unwrap();
        assert_eq!(found[0].score, 99);

        coll.replace_one("missing", &doc).unwrap();
        assert_eq!(
            coll.find(&FindOptions::filtered(Predicate::all()))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn exists_does_not_require_matches_to_deserialize() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        seed(&coll, &[("a", 1)]);
        assert!(coll.exists(&Predicate::field("score").eq(1)).unwrap());
        assert!(!coll.exists(&Predicate::field("score").eq(2)).unwrap());
    }

    #[test]
    fn injected_faults_are_consumed_one_per_call() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        store.fail_next(StoreError::connection(IoError::new(
            ErrorKind::ConnectionReset,
            "reset",
        )));

        let err = coll
            .find(&FindOptions::filtered(Predicate::all()))
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.pending_faults(), 0);
        assert!(coll.find(&FindOptions::filtered(Predicate::all())).is_ok());
    }

    #[test]
    fn clones_share_storage() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        seed(&coll, &[("a", 1)]);

        let other = handle(&store.clone());
        assert_eq!(
            other
                .find(&FindOptions::filtered(Predicate::all()))
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn async_handle_sees_the_same_collection() {
        let store = MemoryStore::new();
        let coll = handle(&store);
        seed(&coll, &[("a", 1)]);

        let async_coll: MemoryCollection<Doc> = super::AsyncCollectionProvider::collection(&store);
        let found = super::AsyncCollection::find(&async_coll, &FindOptions::filtered(Predicate::all()))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
