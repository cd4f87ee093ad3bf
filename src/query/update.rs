use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::fields;

/// A single named field change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateOp {
    /// Replace the field's value, creating the path if absent.
    Set { field: String, value: Value },
    /// Remove the field.
    Unset { field: String },
    /// Set the field to the store's current time when the update executes.
    CurrentDate { field: String },
}

impl UpdateOp {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        UpdateOp::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn unset(field: impl Into<String>) -> Self {
        UpdateOp::Unset {
            field: field.into(),
        }
    }

    pub fn current_date(field: impl Into<String>) -> Self {
        UpdateOp::CurrentDate {
            field: field.into(),
        }
    }
}

/// An ordered set of update operations applied as one atomic update.
///
/// [`UpdateSet::combine`] always appends a `modified_at` touch, so every
/// accepted update advances the modification timestamp whether or not the
/// caller's own operations mention it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSet {
    ops: Vec<UpdateOp>,
}

impl UpdateSet {
    pub fn combine(mut ops: Vec<UpdateOp>) -> Self {
        ops.push(UpdateOp::current_date(fields::MODIFIED_AT));
        UpdateSet { ops }
    }

    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }
}
