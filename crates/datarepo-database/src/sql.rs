//! SQL text and parameter binding for entity statements.
//!
//! Identifiers cannot be bound, so every column name that reaches SQL text
//! is first checked against `Entity::columns()` and then quoted.

use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{QueryBuilder, Sqlite};

use datarepo_core::error::{AppError, ErrorKind};
use datarepo_core::result::AppResult;
use datarepo_core::traits::Entity;
use datarepo_core::types::{FilterOp, FilterValue, Predicate, SortField, Value};

/// Quote an identifier for SQLite.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Reject column names the entity does not declare.
pub(crate) fn validate_column<E: Entity>(column: &str) -> AppResult<()> {
    if E::has_column(column) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Unknown column '{column}' on table '{}'",
            E::table_name()
        )))
    }
}

/// Validate every column referenced by the predicate.
pub(crate) fn validate_predicate<E: Entity>(predicate: &Predicate) -> AppResult<()> {
    predicate
        .columns()
        .into_iter()
        .try_for_each(validate_column::<E>)
}

/// `SELECT "c1", "c2" FROM "table"`
pub(crate) fn select_clause<E: Entity>() -> String {
    let columns = E::columns()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM {}", quote_ident(E::table_name()))
}

/// ` ORDER BY "col" DIR`
pub(crate) fn push_order_by<E: Entity>(
    builder: &mut QueryBuilder<'_, Sqlite>,
    sort: &SortField,
) -> AppResult<()> {
    validate_column::<E>(&sort.field)?;
    builder
        .push(" ORDER BY ")
        .push(quote_ident(&sort.field))
        .push(" ")
        .push(sort.direction.as_sql());
    Ok(())
}

/// Append `value` as a bound parameter.
pub(crate) fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value.clone() {
        Value::Null => builder.push("NULL"),
        Value::Boolean(v) => builder.push_bind(v),
        Value::Integer(v) => builder.push_bind(v),
        Value::Float(v) => builder.push_bind(v),
        Value::Uuid(v) => builder.push_bind(v),
        Value::Timestamp(v) => builder.push_bind(v),
        Value::Text(v) => builder.push_bind(v),
    };
}

/// Append `"column" IN (?, ?, ...)`; an empty list renders as false.
pub(crate) fn push_in_list(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, values: &[Value]) {
    if values.is_empty() {
        builder.push("0");
        return;
    }
    builder.push(quote_ident(column)).push(" IN (");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(builder, value);
    }
    builder.push(")");
}

/// Append the predicate as a SQL boolean expression. Columns must already
/// be validated.
pub(crate) fn push_predicate(
    builder: &mut QueryBuilder<'_, Sqlite>,
    predicate: &Predicate,
) -> AppResult<()> {
    match predicate {
        Predicate::Compare(field) => {
            let column = quote_ident(&field.field);
            match (field.op, &field.value) {
                (FilterOp::IsNull, _) => {
                    builder.push(column).push(" IS NULL");
                }
                (FilterOp::IsNotNull, _) => {
                    builder.push(column).push(" IS NOT NULL");
                }
                (FilterOp::Eq, FilterValue::Single(Value::Null)) => {
                    builder.push(column).push(" IS NULL");
                }
                (FilterOp::Ne, FilterValue::Single(Value::Null)) => {
                    builder.push(column).push(" IS NOT NULL");
                }
                (op, FilterValue::Single(Value::Null)) => {
                    return Err(AppError::validation(format!(
                        "Operator {op:?} on '{}' cannot compare against NULL",
                        field.field
                    )));
                }
                (FilterOp::In, FilterValue::List(values)) => {
                    push_in_list(builder, &field.field, values);
                }
                (FilterOp::In, FilterValue::Single(value)) => {
                    push_in_list(builder, &field.field, std::slice::from_ref(value));
                }
                (FilterOp::ILike, FilterValue::Single(value)) => {
                    builder.push("lower(").push(column).push(") LIKE lower(");
                    push_value(builder, value);
                    builder.push(")");
                }
                (op, FilterValue::Single(value)) => {
                    let sql_op = op.as_sql().ok_or_else(|| {
                        AppError::new(
                            ErrorKind::Internal,
                            format!("Operator {op:?} has no binary SQL form"),
                        )
                    })?;
                    builder.push(column).push(" ").push(sql_op).push(" ");
                    push_value(builder, value);
                }
                (op, _) => {
                    return Err(AppError::validation(format!(
                        "Operator {op:?} on '{}' requires a single value",
                        field.field
                    )));
                }
            }
        }
        Predicate::And(children) => push_group(builder, children, " AND ", "1")?,
        Predicate::Or(children) => push_group(builder, children, " OR ", "0")?,
        Predicate::Not(inner) => {
            builder.push("NOT (");
            push_predicate(builder, inner)?;
            builder.push(")");
        }
    }
    Ok(())
}

fn push_group(
    builder: &mut QueryBuilder<'_, Sqlite>,
    children: &[Predicate],
    separator: &str,
    empty: &str,
) -> AppResult<()> {
    if children.is_empty() {
        builder.push(empty);
        return Ok(());
    }
    builder.push("(");
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_predicate(builder, child)?;
    }
    builder.push(")");
    Ok(())
}

/// Bind one dynamic value onto a prepared query.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value.clone() {
        Value::Null => query.bind(None::<i64>),
        Value::Boolean(v) => query.bind(v),
        Value::Integer(v) => query.bind(v),
        Value::Float(v) => query.bind(v),
        Value::Uuid(v) => query.bind(v),
        Value::Timestamp(v) => query.bind(v),
        Value::Text(v) => query.bind(v),
    }
}

/// `INSERT INTO "t" ("c1", ...) VALUES (?, ...)` with values in column order.
pub(crate) fn insert_statement<E: Entity>(entity: &E) -> (String, Vec<Value>) {
    let columns = E::columns();
    let names = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_ident(E::table_name())
    );
    (sql, entity.values())
}

/// `UPDATE "t" SET "c1" = ?, ... WHERE "key" = ?`, non-key columns first.
pub(crate) fn update_statement<E: Entity>(entity: &E) -> (String, Vec<Value>) {
    let key_column = E::key_column();
    let mut assignments = Vec::new();
    let mut values = Vec::new();
    for (column, value) in E::columns().iter().zip(entity.values()) {
        if *column == key_column {
            continue;
        }
        assignments.push(format!("{} = ?", quote_ident(column)));
        values.push(value);
    }
    if assignments.is_empty() {
        // Key-only tables: a no-op assignment still reports the matched row.
        assignments.push(format!("{0} = {0}", quote_ident(key_column)));
    }
    values.push(entity.key_value());
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_ident(E::table_name()),
        assignments.join(", "),
        quote_ident(key_column)
    );
    (sql, values)
}

/// `DELETE FROM "t" WHERE "key" = ?`
pub(crate) fn delete_statement<E: Entity>(entity: &E) -> (String, Vec<Value>) {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(E::table_name()),
        quote_ident(E::key_column())
    );
    (sql, vec![entity.key_value()])
}

/// Map a sqlx error into [`AppError`], classifying key collisions as conflicts.
pub(crate) fn db_error(message: &str, err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
        {
            AppError::with_source(
                ErrorKind::Conflict,
                format!("{message}: {}", db_err.message()),
                err,
            )
        }
        _ => AppError::with_source(ErrorKind::Database, format!("{message}: {err}"), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datarepo_core::types::col;

    struct Note {
        id: i64,
        body: String,
        pinned: bool,
    }

    impl Entity for Note {
        type Key = i64;

        fn table_name() -> &'static str {
            "notes"
        }

        fn key_column() -> &'static str {
            "id"
        }

        fn columns() -> &'static [&'static str] {
            &["id", "body", "pinned"]
        }

        fn key(&self) -> &i64 {
            &self.id
        }

        fn values(&self) -> Vec<Value> {
            vec![self.id.into(), (&self.body).into(), self.pinned.into()]
        }
    }

    fn note() -> Note {
        Note {
            id: 3,
            body: "hello".into(),
            pinned: true,
        }
    }

    fn render(predicate: &Predicate) -> String {
        let mut builder = QueryBuilder::<Sqlite>::new("");
        push_predicate(&mut builder, predicate).expect("render");
        builder.sql().to_string()
    }

    #[test]
    fn test_select_clause_quotes_identifiers() {
        assert_eq!(
            select_clause::<Note>(),
            r#"SELECT "id", "body", "pinned" FROM "notes""#
        );
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_insert_statement() {
        let (sql, values) = insert_statement(&note());
        assert_eq!(
            sql,
            r#"INSERT INTO "notes" ("id", "body", "pinned") VALUES (?, ?, ?)"#
        );
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_update_statement_puts_key_last() {
        let (sql, values) = update_statement(&note());
        assert_eq!(
            sql,
            r#"UPDATE "notes" SET "body" = ?, "pinned" = ? WHERE "id" = ?"#
        );
        assert_eq!(values.last(), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_delete_statement() {
        let (sql, values) = delete_statement(&note());
        assert_eq!(sql, r#"DELETE FROM "notes" WHERE "id" = ?"#);
        assert_eq!(values, vec![Value::Integer(3)]);
    }

    #[test]
    fn test_predicate_rendering() {
        let p = col("body").ilike("he%").and(col("pinned").eq(true).not());
        assert_eq!(
            render(&p),
            r#"(lower("body") LIKE lower(?) AND NOT ("pinned" = ?))"#
        );
        assert_eq!(render(&col("id").is_in(Vec::<i64>::new())), "0");
        assert_eq!(render(&Predicate::Or(vec![])), "0");
        assert_eq!(render(&Predicate::And(vec![])), "1");
        assert_eq!(render(&col("body").is_null()), r#""body" IS NULL"#);
    }

    #[test]
    fn test_null_comparisons_render_as_null_checks() {
        assert_eq!(render(&col("body").eq(None::<String>)), r#""body" IS NULL"#);
        assert_eq!(
            render(&col("body").ne(None::<String>)),
            r#""body" IS NOT NULL"#
        );

        let mut builder = QueryBuilder::<Sqlite>::new("");
        let err = push_predicate(&mut builder, &col("body").gt(None::<i64>))
            .expect_err("ordering against NULL");
        assert!(err.is(ErrorKind::Validation));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let err = validate_predicate::<Note>(&col("body").eq("x").and(col("nope").eq(1)))
            .expect_err("should reject");
        assert!(err.is(ErrorKind::Validation));
    }
}
