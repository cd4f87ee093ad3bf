use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::fields;

/// A composable, serializable description of a boolean condition over
/// document fields.
///
/// The access layer never evaluates a predicate itself: adapters translate
/// it into native query syntax, or evaluate it directly in the case of the
/// in-memory store. `All` matches every document and is what an absent
/// filter means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches every document.
    All,
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    Gt { field: String, value: Value },
    Gte { field: String, value: Value },
    Lt { field: String, value: Value },
    Lte { field: String, value: Value },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// The always-matching predicate.
    pub fn all() -> Self {
        Predicate::All
    }

    /// Start a comparison against a field path. Nested fields use dots:
    /// `Predicate::field("address.city").eq("Recife")`.
    pub fn field(path: impl Into<String>) -> FieldPredicate {
        FieldPredicate { path: path.into() }
    }

    /// `id == value`.
    pub fn id(id: impl Into<String>) -> Self {
        Predicate::Eq {
            field: fields::ID.to_string(),
            value: Value::String(id.into()),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut parts) => {
                parts.push(other);
                Predicate::Or(parts)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }
}

/// Builder for a single field comparison.
pub struct FieldPredicate {
    path: String,
}

impl FieldPredicate {
    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        Predicate::Eq {
            field: self.path,
            value: value.into(),
        }
    }

    pub fn ne(self, value: impl Into<Value>) -> Predicate {
        Predicate::Ne {
            field: self.path,
            value: value.into(),
        }
    }

    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        Predicate::Gt {
            field: self.path,
            value: value.into(),
        }
    }

    pub fn gte(self, value: impl Into<Value>) -> Predicate {
        Predicate::Gte {
            field: self.path,
            value: value.into(),
        }
    }

    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        Predicate::Lt {
            field: self.path,
            value: value.into(),
        }
    }

    pub fn lte(self, value: impl Into<Value>) -> Predicate {
        Predicate::Lte {
            field: self.path,
            value: value.into(),
        }
    }
}
