use std::io;

use thiserror::Error;

/// Error type for store and repository operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure while talking to the store. The only
    /// retry-eligible variant.
    #[error("store connection failure: {source}")]
    Connection {
        #[source]
        source: io::Error,
    },

    /// The store rejected a predicate, ordering, or update description.
    #[error("malformed query: {0}")]
    Query(String),

    /// Insert conflicted with an existing document id.
    #[error("duplicate document {collection}:{id}")]
    Duplicate { collection: String, id: String },

    /// Document (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blank id was passed where a persisted entity's id is required.
    /// Raised before any store call is attempted.
    #[error("blank id passed to an id-keyed operation")]
    BlankId,

    /// A shared lock in the in-memory adapter was poisoned.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Connection failure caused by an underlying I/O error.
    pub fn connection(source: io::Error) -> Self {
        StoreError::Connection { source }
    }

    /// Whether the retry policy may re-run the failed operation.
    ///
    /// Only transport failures qualify; logical store errors and caller
    /// contract violations are permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Connection { .. })
    }
}
