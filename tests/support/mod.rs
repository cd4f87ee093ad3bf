use chrono::{DateTime, Utc};
use rootstore::{AggregateRoot, Identity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    #[serde(flatten)]
    pub identity: Identity,
    pub name: String,
    pub age: i64,
}

impl Player {
    pub fn new(name: &str, age: i64) -> Self {
        Player {
            identity: Identity::new(),
            name: name.to_string(),
            age,
        }
    }
}

impl AggregateRoot for Player {
    const COLLECTION: &'static str = "players";

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
