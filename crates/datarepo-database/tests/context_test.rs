//! Integration tests for the context factory and unit-of-work.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use datarepo_core::config::DatabaseConfig;
use datarepo_core::error::ErrorKind;
use datarepo_core::result::AppResult;
use datarepo_core::types::col;
use datarepo_database::context::ChangeKind;
use datarepo_database::{Context, DataContext, DatabasePool, Query, SqliteContextFactory};

use helpers::{Author, Book, MIGRATOR, TestDb};

#[tokio::test]
async fn test_staged_changes_apply_only_on_save() {
    let db = TestDb::new().await;
    let mut writer = db.factory.create_instance().await.unwrap();
    let mut reader = db.factory.create_instance().await.unwrap();

    writer.add(&Author::new(1, "Asimov"));
    writer.add(&Book::new(1, 1, "Foundation", 1951));
    assert_eq!(writer.pending_changes().len(), 2);
    assert_eq!(writer.pending_changes()[0].kind, ChangeKind::Added);
    assert!(!reader.any::<Author>(None).await.unwrap());

    assert_eq!(writer.save_changes().await.unwrap(), 2);
    assert!(writer.pending_changes().is_empty());
    assert_eq!(reader.count::<Book>(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_raw_statements_share_the_context_connection() {
    let db = TestDb::new().await;
    db.seed_library().await;
    let mut context = db.factory.create_instance().await.unwrap();

    let result = sqlx::query("UPDATE authors SET country = ? WHERE country IS NULL")
        .bind("US")
        .execute(context.connection())
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);

    let in_us = context
        .count::<Author>(Some(&col("country").eq("US")))
        .await
        .unwrap();
    assert_eq!(in_us, 1);
}

#[tokio::test]
async fn test_save_with_nothing_staged_returns_zero() {
    let db = TestDb::new().await;
    let mut context = db.factory.create_instance().await.unwrap();
    assert_eq!(context.save_changes().await.unwrap(), 0);
}

#[tokio::test]
async fn test_discard_changes() {
    let db = TestDb::new().await;
    let mut context = db.factory.create_instance().await.unwrap();

    context.add(&Author::new(1, "Discarded"));
    context.discard_changes();
    assert_eq!(context.save_changes().await.unwrap(), 0);
    assert_eq!(context.count::<Author>(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_save_rolls_back_everything() {
    let db = TestDb::new().await;
    db.seed_authors(1).await;
    let mut context = db.factory.create_instance().await.unwrap();

    context.add(&Author::new(2, "Fine"));
    context.add(&Author::new(1, "Duplicate"));
    let err = context.save_changes().await.expect_err("duplicate key");
    assert!(err.is(ErrorKind::Conflict));
    assert!(context.pending_changes().is_empty());

    assert!(!context.any::<Author>(Some(&col("id").eq(2))).await.unwrap());
}

#[tokio::test]
async fn test_update_and_remove_report_affected_rows() {
    let db = TestDb::new().await;
    db.seed_authors(3).await;
    let mut context = db.factory.create_instance().await.unwrap();

    context.update(&Author::new(1, "one"));
    context.update(&Author::new(50, "nobody"));
    context.remove(&Author::new(3, "author-03"));
    assert_eq!(context.save_changes().await.unwrap(), 2);

    let rows = context
        .fetch(&Query::<Author>::new().order_by("id"))
        .await
        .unwrap();
    let names: Vec<&str> = rows.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["one", "author-02"]);
}

#[tokio::test]
async fn test_single_or_default_loads_includes() {
    let db = TestDb::new().await;
    db.seed_library().await;
    let mut context = db.factory.create_instance().await.unwrap();

    let author = context
        .single_or_default(&col("name").eq("Le Guin"), &[Author::with_books()])
        .await
        .unwrap()
        .expect("Le Guin");
    assert_eq!(author.books.len(), 1);
    assert_eq!(author.books[0].title, "A Wizard of Earthsea");
}

struct LibrarySeeder {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl datarepo_database::Seeder for LibrarySeeder {
    async fn seed(&self, context: &mut Context) -> AppResult<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if context.any::<Author>(None).await? {
            return Ok(());
        }
        context.add(&Author::new(1, "Herbert"));
        context.add(&Book::new(1, 1, "Dune", 1965));
        Ok(())
    }
}

#[tokio::test]
async fn test_seeder_runs_once_per_factory() {
    let runs = Arc::new(AtomicUsize::new(0));
    let pool = DatabasePool::connect(&DatabaseConfig::new("sqlite::memory:"))
        .await
        .unwrap();
    let factory = SqliteContextFactory::new(pool)
        .with_migrator(&MIGRATOR)
        .with_seeder(LibrarySeeder {
            runs: Arc::clone(&runs),
        });

    let mut first = factory.create_instance().await.unwrap();
    assert_eq!(first.count::<Book>(None).await.unwrap(), 1);
    drop(first);

    let mut second = factory.create_instance().await.unwrap();
    assert_eq!(second.count::<Author>(None).await.unwrap(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}
