//! Person entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use datarepo_core::traits::Entity;
use datarepo_core::types::Value;

use crate::address::Address;

/// A person with any number of postal addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Person {
    /// Unique person identifier.
    pub id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email (optional, unique when present).
    pub email: Option<String>,
    /// When the person was created.
    pub created_at: DateTime<Utc>,
    /// Addresses, populated only when an include path loads them.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
}

impl Person {
    /// Build a new person with a fresh id.
    pub fn new(data: CreatePerson) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            created_at: Utc::now(),
            addresses: Vec::new(),
        }
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Person {
    type Key = Uuid;

    fn table_name() -> &'static str {
        "people"
    }

    fn key_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "first_name", "last_name", "email", "created_at"]
    }

    fn key(&self) -> &Uuid {
        &self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            (&self.first_name).into(),
            (&self.last_name).into(),
            self.email.clone().into(),
            self.created_at.into(),
        ]
    }
}

/// Data required to create a new person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePerson {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email (optional).
    pub email: Option<String>,
}

impl CreatePerson {
    /// A person without an email address.
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_follow_column_order() {
        let person = Person::new(CreatePerson::named("Ada", "Lovelace"));
        let values = person.values();
        assert_eq!(values.len(), Person::columns().len());
        assert_eq!(values[0], Value::Uuid(person.id));
        assert_eq!(
            person.column_value("last_name"),
            Some(Value::Text("Lovelace".into()))
        );
        assert_eq!(person.column_value("email"), Some(Value::Null));
        assert_eq!(person.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_addresses_not_serialized_when_not_loaded() {
        let person = Person::new(CreatePerson::named("Alan", "Turing"));
        let json = serde_json::to_value(&person).expect("serialize");
        assert!(json.get("addresses").is_none());
    }
}
