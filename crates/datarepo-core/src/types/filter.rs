//! Filter types for dynamic query building.
//!
//! A [`Predicate`] is a plain data tree; the database layer walks it and
//! emits SQL with bound parameters. Column names are checked against the
//! entity's column list before any SQL is produced.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// SQL `LIKE` pattern match.
    Like,
    /// Case-insensitive pattern match.
    ILike,
    /// SQL `IN` list membership.
    In,
    /// SQL `IS NULL` check.
    IsNull,
    /// SQL `IS NOT NULL` check.
    IsNotNull,
}

impl FilterOp {
    /// The SQL operator for binary comparisons, `None` for the rest.
    pub fn as_sql(&self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Ne => Some("<>"),
            Self::Gt => Some(">"),
            Self::Gte => Some(">="),
            Self::Lt => Some("<"),
            Self::Lte => Some("<="),
            Self::Like => Some("LIKE"),
            Self::ILike | Self::In | Self::IsNull | Self::IsNotNull => None,
        }
    }
}

/// The right-hand side of a filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single value.
    Single(Value),
    /// A list of values (for `IN`).
    List(Vec<Value>),
    /// No value (for `IS NULL`, `IS NOT NULL`).
    None,
}

/// A single filter condition on a named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    /// The column name to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    pub value: FilterValue,
}

impl FilterField {
    /// Create a new filter field.
    pub fn new(field: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, FilterValue::Single(value.into()))
    }

    /// Shorthand for a case-insensitive pattern filter.
    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(
            field,
            FilterOp::ILike,
            FilterValue::Single(Value::Text(pattern.into())),
        )
    }
}

/// A composable boolean condition over one entity's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// A single column comparison.
    Compare(FilterField),
    /// All children must hold. An empty list is always true.
    And(Vec<Predicate>),
    /// Any child must hold. An empty list is always false.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Conjunction of `self` and `other`, flattening nested `And`s.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other);
                Self::And(children)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Disjunction of `self` and `other`, flattening nested `Or`s.
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Self::Or(mut children) => {
                children.push(other);
                Self::Or(children)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    /// Negation of `self`.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Every column name referenced by this predicate, depth first.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare(field) => out.push(field.field.as_str()),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_columns(out);
                }
            }
            Self::Not(inner) => inner.collect_columns(out),
        }
    }
}

impl From<FilterField> for Predicate {
    fn from(field: FilterField) -> Self {
        Self::Compare(field)
    }
}

/// Start a predicate on the named column: `col("last_name").eq("Smith")`.
pub fn col(name: impl Into<String>) -> Column {
    Column(name.into())
}

/// A column reference used to build [`Predicate`]s.
#[derive(Debug, Clone)]
pub struct Column(String);

impl Column {
    fn single(self, op: FilterOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare(FilterField::new(
            self.0,
            op,
            FilterValue::Single(value.into()),
        ))
    }

    /// `column = value`
    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        self.single(FilterOp::Eq, value)
    }

    /// `column <> value`
    pub fn ne(self, value: impl Into<Value>) -> Predicate {
        self.single(FilterOp::Ne, value)
    }

    /// `column > value`
    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        self.single(FilterOp::Gt, value)
    }

    /// `column >= value`
    pub fn gte(self, value: impl Into<Value>) -> Predicate {
        self.single(FilterOp::Gte, value)
    }

    /// `column < value`
    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        self.single(FilterOp::Lt, value)
    }

    /// `column <= value`
    pub fn lte(self, value: impl Into<Value>) -> Predicate {
        self.single(FilterOp::Lte, value)
    }

    /// `column LIKE pattern`
    pub fn like(self, pattern: impl Into<String>) -> Predicate {
        self.single(FilterOp::Like, Value::Text(pattern.into()))
    }

    /// Case-insensitive `column LIKE pattern`.
    pub fn ilike(self, pattern: impl Into<String>) -> Predicate {
        Predicate::Compare(FilterField::ilike(self.0, pattern))
    }

    /// `column IN (values...)`
    pub fn is_in<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::Compare(FilterField::new(
            self.0,
            FilterOp::In,
            FilterValue::List(values.into_iter().map(Into::into).collect()),
        ))
    }

    /// `column IS NULL`
    pub fn is_null(self) -> Predicate {
        Predicate::Compare(FilterField::new(self.0, FilterOp::IsNull, FilterValue::None))
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(self) -> Predicate {
        Predicate::Compare(FilterField::new(
            self.0,
            FilterOp::IsNotNull,
            FilterValue::None,
        ))
    }
}
