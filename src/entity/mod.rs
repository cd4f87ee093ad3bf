//! Identity model for persisted entities.
//!
//! Every record eligible for independent persistence carries a
//! store-assigned string id, a construction timestamp, and an optional
//! modification timestamp. Entities embed an [`Identity`] block (flattened)
//! and expose it through the [`AggregateRoot`] trait; the repositories are
//! generic over that trait, so domain types never depend on a base struct.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved document field names.
pub mod fields {
    /// Store-assigned unique identifier.
    pub const ID: &str = "id";
    /// Construction timestamp, set exactly once.
    pub const CREATED_AT: &str = "created_at";
    /// Last accepted update; absent until the first update.
    pub const MODIFIED_AT: &str = "modified_at";
}

/// Trait for entity types that can be stored as documents.
pub trait AggregateRoot: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection name backing this entity type.
    const COLLECTION: &'static str;

    /// Store-assigned identifier. Empty until the entity is first inserted.
    fn id(&self) -> &str;

    /// Called by the store when an id is assigned on insert.
    fn set_id(&mut self, id: String);

    /// Stamped at construction, never mutated afterward.
    fn created_at(&self) -> DateTime<Utc>;

    /// Set by every accepted update; `None` until then.
    fn modified_at(&self) -> Option<DateTime<Utc>>;
}

/// Embeddable identity block for aggregate roots.
///
/// Flatten it into the entity struct so the catch-all map picks up any
/// document fields the type does not declare:
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Player {
///     #[serde(flatten)]
///     identity: Identity,
///     name: String,
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Store-assigned id; empty before first persistence.
    #[serde(default)]
    pub id: String,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    /// Undeclared fields found in storage, preserved on round trips so an
    /// update never silently drops unknown data.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    /// New unpersisted identity with `created_at` stamped now.
    pub fn new() -> Self {
        Identity {
            id: String::new(),
            created_at: Utc::now(),
            modified_at: None,
            extra: Map::new(),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Identity {
    /// Equal iff both ids are non-blank and match. Unpersisted identities
    /// are never equal by value, including to themselves.
    fn eq(&self, other: &Self) -> bool {
        !self.id.trim().is_empty() && !other.id.trim().is_empty() && self.id == other.id
    }
}

/// Whether two entities of the same type denote the same persisted record.
pub fn same_entity<T: AggregateRoot>(a: &T, b: &T) -> bool {
    !a.id().trim().is_empty() && !b.id().trim().is_empty() && a.id() == b.id()
}
