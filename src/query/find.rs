use serde::{Deserialize, Serialize};

use super::{Ordering, Page, Predicate};

/// The full description of a read: predicate plus optional sort and paging.
///
/// Both repository façades build reads through these constructors, so
/// skip/limit/sort construction lives in exactly one place and the blocking
/// and suspending code paths cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    pub predicate: Predicate,
    pub sort: Option<Ordering>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl FindOptions {
    /// Unpaged read in store default order.
    pub fn filtered(predicate: Predicate) -> Self {
        FindOptions {
            predicate,
            sort: None,
            skip: None,
            limit: None,
        }
    }

    /// Paged, ordered read: `skip = page.index × page.size`, `limit = size`.
    pub fn paged(predicate: Predicate, sort: Ordering, page: Page) -> Self {
        FindOptions {
            predicate,
            sort: Some(sort),
            skip: Some(page.skip()),
            limit: Some(page.limit()),
        }
    }
}
