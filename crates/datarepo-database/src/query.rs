//! Query descriptors: predicate, sort, window, and include paths.

use std::fmt;
use std::sync::Arc;

use sqlx::{QueryBuilder, Sqlite};

use datarepo_core::result::AppResult;
use datarepo_core::traits::Entity;
use datarepo_core::types::{Predicate, SortField, Window};

use crate::include::Include;
use crate::sql::{push_order_by, push_predicate, select_clause, validate_predicate};

type Matcher<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Everything needed to run one read against one entity's table.
///
/// Built fluently and consumed by a single repository call:
///
/// ```ignore
/// let query = Query::<Person>::new()
///     .filter(col("last_name").eq("Hancock"))
///     .order_by("first_name")
///     .skip(10)
///     .take(5)
///     .include(include::addresses());
/// ```
pub struct Query<E: Entity> {
    predicate: Option<Predicate>,
    matcher: Option<Matcher<E>>,
    sort: Option<SortField>,
    window: Window,
    includes: Vec<Include<E>>,
}

impl<E: Entity> Query<E> {
    /// A query matching every row, in store order, without includes.
    pub fn new() -> Self {
        Self {
            predicate: None,
            matcher: None,
            sort: None,
            window: Window::default(),
            includes: Vec::new(),
        }
    }

    /// Add a SQL predicate. Repeated calls are combined with `AND`.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Add an in-memory predicate evaluated on materialized rows.
    ///
    /// When set, the window is applied after this filter rather than in SQL,
    /// so every row passing the SQL predicate is read.
    pub fn matching(mut self, matcher: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.matcher = Some(match self.matcher.take() {
            Some(existing) => Arc::new(move |e: &E| existing(e) && matcher(e)),
            None => Arc::new(matcher),
        });
        self
    }

    /// Sort by a single column.
    pub fn order_by(mut self, sort: impl Into<SortField>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Skip the first `n` rows.
    pub fn skip(mut self, n: u64) -> Self {
        self.window.skip = Some(n);
        self
    }

    /// Return at most `n` rows.
    pub fn take(mut self, n: u64) -> Self {
        self.window.take = Some(n);
        self
    }

    /// Replace the whole skip/take window.
    pub fn window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Eagerly load the given include path.
    pub fn include(mut self, include: Include<E>) -> Self {
        self.includes.push(include);
        self
    }

    /// Eagerly load every given include path.
    pub fn includes(mut self, includes: impl IntoIterator<Item = Include<E>>) -> Self {
        self.includes.extend(includes);
        self
    }

    /// The SQL predicate, if any.
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// The sort, if any.
    pub fn sort(&self) -> Option<&SortField> {
        self.sort.as_ref()
    }

    /// The skip/take window.
    pub fn current_window(&self) -> Window {
        self.window
    }

    /// Include paths in request order.
    pub fn include_list(&self) -> &[Include<E>] {
        &self.includes
    }

    /// Names of the include paths in request order.
    pub fn include_paths(&self) -> Vec<&str> {
        self.includes.iter().map(Include::path).collect()
    }

    /// Whether an in-memory predicate is set.
    pub fn has_matcher(&self) -> bool {
        self.matcher.is_some()
    }

    /// Evaluate the in-memory predicate; `true` when none is set.
    pub fn matches(&self, entity: &E) -> bool {
        self.matcher.as_ref().is_none_or(|m| m(entity))
    }

    /// Build the `SELECT` for this query. The window is rendered only when
    /// `windowed` is set.
    pub(crate) fn build_select(&self, windowed: bool) -> AppResult<QueryBuilder<'static, Sqlite>> {
        let mut builder = QueryBuilder::<Sqlite>::new(select_clause::<E>());

        if let Some(predicate) = &self.predicate {
            validate_predicate::<E>(predicate)?;
            builder.push(" WHERE ");
            push_predicate(&mut builder, predicate)?;
        }

        if let Some(sort) = &self.sort {
            push_order_by::<E>(&mut builder, sort)?;
        }

        if windowed && !self.window.is_unbounded() {
            // SQLite only accepts OFFSET after LIMIT; -1 means unlimited.
            let take = self.window.take.map_or(-1, to_sql_int);
            let skip = self.window.skip.map_or(0, to_sql_int);
            builder.push(" LIMIT ");
            builder.push_bind(take);
            builder.push(" OFFSET ");
            builder.push_bind(skip);
        }

        Ok(builder)
    }
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl<E: Entity> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            matcher: self.matcher.clone(),
            sort: self.sort.clone(),
            window: self.window,
            includes: self.includes.clone(),
        }
    }
}

impl<E: Entity> fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &E::table_name())
            .field("predicate", &self.predicate)
            .field("matcher", &self.matcher.is_some())
            .field("sort", &self.sort)
            .field("window", &self.window)
            .field("includes", &self.include_paths())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datarepo_core::error::ErrorKind;
    use datarepo_core::types::{Value, col};

    struct Item {
        id: i64,
        name: String,
    }

    impl Entity for Item {
        type Key = i64;

        fn table_name() -> &'static str {
            "items"
        }

        fn key_column() -> &'static str {
            "id"
        }

        fn columns() -> &'static [&'static str] {
            &["id", "name"]
        }

        fn key(&self) -> &i64 {
            &self.id
        }

        fn values(&self) -> Vec<Value> {
            vec![self.id.into(), (&self.name).into()]
        }
    }

    #[test]
    fn test_select_without_anything() {
        let builder = Query::<Item>::new().build_select(true).expect("build");
        assert_eq!(builder.sql(), r#"SELECT "id", "name" FROM "items""#);
    }

    #[test]
    fn test_select_with_filter_sort_and_window() {
        let query = Query::<Item>::new()
            .filter(col("name").like("a%"))
            .filter(col("id").gt(3))
            .order_by("name")
            .skip(2)
            .take(3);
        let builder = query.build_select(true).expect("build");
        assert_eq!(
            builder.sql(),
            r#"SELECT "id", "name" FROM "items" WHERE ("name" LIKE ? AND "id" > ?) ORDER BY "name" ASC LIMIT ? OFFSET ?"#
        );

        let unwindowed = query.build_select(false).expect("build");
        assert!(!unwindowed.sql().contains("LIMIT"));
    }

    #[test]
    fn test_unknown_sort_column_rejected() {
        let err = Query::<Item>::new()
            .order_by("price")
            .build_select(true)
            .err()
            .expect("should reject");
        assert!(err.is(ErrorKind::Validation));
    }

    #[test]
    fn test_matchers_combine() {
        let query = Query::<Item>::new()
            .matching(|i| i.id > 1)
            .matching(|i| i.name.starts_with('b'));
        assert!(query.has_matcher());
        assert!(query.matches(&Item {
            id: 2,
            name: "bolt".into()
        }));
        assert!(!query.matches(&Item {
            id: 1,
            name: "bolt".into()
        }));
        assert!(Query::<Item>::new().matches(&Item {
            id: 0,
            name: String::new()
        }));
    }
}
