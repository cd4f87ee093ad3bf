use serde::{Deserialize, Serialize};

use crate::entity::fields;

/// A field selector plus a direction for result ordering.
///
/// Direction defaults to descending. Records sharing the same ordering-field
/// value keep store-defined relative order; no secondary sort key is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    /// Order by `field`, descending.
    pub fn by(field: impl Into<String>) -> Self {
        Ordering {
            field: field.into(),
            descending: true,
        }
    }

    pub fn ascending(mut self) -> Self {
        self.descending = false;
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Same field, opposite direction. "Last" is defined as "first under
    /// the reversed ordering".
    pub fn reverse(mut self) -> Self {
        self.descending = !self.descending;
        self
    }
}

impl Default for Ordering {
    /// The identifier field, descending.
    fn default() -> Self {
        Ordering::by(fields::ID)
    }
}

/// Zero-based page index plus page size.
///
/// Values are passed through to the store unchecked: `skip = index × size`,
/// `limit = size`, and whatever the store does with negative or zero values
/// is the store's business. This layer enforces no upper bound either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub index: i64,
    pub size: i64,
}

impl Page {
    pub fn new(index: i64, size: i64) -> Self {
        Page { index, size }
    }

    /// Page zero of the given size.
    pub fn first(size: i64) -> Self {
        Page::new(0, size)
    }

    pub fn skip(&self) -> i64 {
        self.index.saturating_mul(self.size)
    }

    pub fn limit(&self) -> i64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ordering_is_id_descending() {
        let order = Ordering::default();
        assert_eq!(order.field, "id");
        assert!(order.descending);
    }

    #[test]
    fn reverse_flips_only_the_direction() {
        let order = Ordering::by("age").ascending();
        let reversed = order.clone().reverse();
        assert_eq!(reversed.field, "age");
        assert!(reversed.descending);
        assert_eq!(reversed.reverse(), order);
    }

    #[test]
    fn skip_is_index_times_size() {
        assert_eq!(Page::new(3, 25).skip(), 75);
        assert_eq!(Page::first(10).skip(), 0);
    }

    #[test]
    fn negative_values_pass_through() {
        let page = Page::new(-2, 10);
        assert_eq!(page.skip(), -20);
        assert_eq!(page.limit(), 10);
        assert_eq!(Page::new(0, -5).limit(), -5);
    }
}
