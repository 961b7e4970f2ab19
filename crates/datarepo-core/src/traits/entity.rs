//! Entity marker trait.

use std::fmt;

use crate::types::value::Value;

/// A record type stored in one table and identified by a single key column.
///
/// `columns()` and `values()` must list the same columns in the same order;
/// the key column is one of them. Related records that are loaded through
/// include paths are not columns and must not appear here.
///
/// # Example
///
/// ```ignore
/// impl Entity for Person {
///     type Key = Uuid;
///     fn table_name() -> &'static str { "people" }
///     fn key_column() -> &'static str { "id" }
///     fn columns() -> &'static [&'static str] { &["id", "first_name", "last_name"] }
///     fn key(&self) -> &Uuid { &self.id }
///     fn values(&self) -> Vec<Value> {
///         vec![self.id.into(), (&self.first_name).into(), (&self.last_name).into()]
///     }
/// }
/// ```
pub trait Entity: Send + Sync + Unpin + 'static {
    /// The identifying attribute's type.
    type Key: Clone + Ord + fmt::Debug + Into<Value> + Send + Sync + 'static;

    /// Table the entity is stored in.
    fn table_name() -> &'static str;

    /// Name of the key column.
    fn key_column() -> &'static str;

    /// All persisted columns, key included.
    fn columns() -> &'static [&'static str];

    /// The identifying attribute.
    fn key(&self) -> &Self::Key;

    /// Column values, in `columns()` order.
    fn values(&self) -> Vec<Value>;

    /// The key as a bind value.
    fn key_value(&self) -> Value {
        self.key().clone().into()
    }

    /// Whether `column` is one of this entity's persisted columns.
    fn has_column(column: &str) -> bool {
        Self::columns().contains(&column)
    }

    /// The value of a single named column.
    fn column_value(&self, column: &str) -> Option<Value> {
        let index = Self::columns().iter().position(|c| *c == column)?;
        self.values().into_iter().nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag {
        id: i64,
        label: String,
    }

    impl Entity for Tag {
        type Key = i64;

        fn table_name() -> &'static str {
            "tags"
        }

        fn key_column() -> &'static str {
            "id"
        }

        fn columns() -> &'static [&'static str] {
            &["id", "label"]
        }

        fn key(&self) -> &i64 {
            &self.id
        }

        fn values(&self) -> Vec<Value> {
            vec![self.id.into(), (&self.label).into()]
        }
    }

    #[test]
    fn test_column_lookup() {
        let tag = Tag {
            id: 4,
            label: "rust".into(),
        };
        assert_eq!(tag.key_value(), Value::Integer(4));
        assert_eq!(tag.column_value("label"), Some(Value::Text("rust".into())));
        assert_eq!(tag.column_value("missing"), None);
        assert!(Tag::has_column("id"));
        assert!(!Tag::has_column("ID"));
    }
}
