//! Address entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use datarepo_core::traits::Entity;
use datarepo_core::types::Value;

use super::kind::AddressKind;
use crate::person::Person;

/// A postal address belonging to one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Address {
    /// Unique address identifier.
    pub id: Uuid,
    /// Owning person.
    pub person_id: Uuid,
    /// What the address is used for.
    pub kind: AddressKind,
    /// Street and house number.
    pub street: String,
    /// City or town.
    pub city: String,
    /// Postal code (optional).
    pub postal_code: Option<String>,
    /// Owner, populated only by the `person` include.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Box<Person>>,
}

impl Address {
    /// A new address for `person_id` with a fresh id.
    pub fn new(
        person_id: Uuid,
        kind: AddressKind,
        street: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            person_id,
            kind,
            street: street.into(),
            city: city.into(),
            postal_code: None,
            person: None,
        }
    }
}

impl Entity for Address {
    type Key = Uuid;

    fn table_name() -> &'static str {
        "addresses"
    }

    fn key_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "person_id", "kind", "street", "city", "postal_code"]
    }

    fn key(&self) -> &Uuid {
        &self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.person_id.into(),
            self.kind.into(),
            (&self.street).into(),
            (&self.city).into(),
            self.postal_code.clone().into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_is_a_column() {
        let owner = Uuid::new_v4();
        let address = Address::new(owner, AddressKind::Work, "1 Main St", "Springfield");
        assert!(Address::has_column("person_id"));
        assert_eq!(address.column_value("person_id"), Some(Value::Uuid(owner)));
        assert_eq!(address.column_value("kind"), Some(Value::Text("work".into())));
    }
}
