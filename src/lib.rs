//! Typed repositories over document collections.
//!
//! A generic persistence layer for aggregate-root entities: composable
//! predicates, ordering, pagination, partial-field updates, and existence
//! checks, in matching blocking and suspending forms, with bounded
//! immediate retry for transient connection failures.
//!
//! ## Example
//!
//! ```ignore
//! use rootstore::{AggregateRoot, Identity, MemoryStore, Predicate, Repository};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Player {
//!     #[serde(flatten)]
//!     identity: Identity,
//!     name: String,
//!     age: i64,
//! }
//!
//! let store = MemoryStore::new();
//! let players: Repository<Player, _> = Repository::new(&store);
//!
//! let mut carlos = Player::new("Carlos", 30);
//! players.insert(&mut carlos)?;
//! players.update_field(carlos.id(), "age", 31)?;
//! let adults = players.find(Predicate::field("age").gte(18))?;
//! ```

mod entity;
mod error;
mod query;
mod repository;
mod retry;
mod store;

pub use entity::{fields, same_entity, AggregateRoot, Identity};
pub use error::StoreError;
pub use query::{FieldPredicate, FindOptions, Ordering, Page, Predicate, UpdateOp, UpdateSet};
pub use repository::{AsyncRepository, Repository};
pub use retry::RetryPolicy;
pub use store::{
    AsyncCollection, AsyncCollectionProvider, Collection, CollectionProvider, MemoryCollection,
    MemoryStore,
};
