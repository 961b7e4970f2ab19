//! Shared fixtures for the database integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::FromRow;
use sqlx::migrate::Migrator;
use tempfile::TempDir;

use datarepo_core::config::DatabaseConfig;
use datarepo_core::traits::Entity;
use datarepo_core::types::Value;
use datarepo_database::{
    ContextRepository, DatabasePool, EntityRepository, Include, SqliteContextFactory,
};

/// Schema for the test entities.
pub static MIGRATOR: Migrator = sqlx::migrate!("tests/migrations");

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    #[sqlx(skip)]
    pub books: Vec<Book>,
}

impl Author {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            country: None,
            books: Vec::new(),
        }
    }

    pub fn with_books() -> Include<Author> {
        Include::has_many::<Book>("books", "author_id", |author: &mut Author, books: Vec<Book>| {
            author.books = books;
        })
    }
}

impl Entity for Author {
    type Key = i64;

    fn table_name() -> &'static str {
        "authors"
    }

    fn key_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name", "country"]
    }

    fn key(&self) -> &i64 {
        &self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            (&self.name).into(),
            self.country.clone().into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Book {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub year: i64,
    #[sqlx(skip)]
    pub author: Option<Author>,
}

impl Book {
    pub fn new(id: i64, author_id: i64, title: &str, year: i64) -> Self {
        Self {
            id,
            author_id,
            title: title.to_string(),
            year,
            author: None,
        }
    }

    pub fn with_author() -> Include<Book> {
        Include::belongs_to::<Author>(
            "author",
            |book: &Book| Some(book.author_id),
            |book: &mut Book, author: Option<Author>| book.author = author,
        )
    }
}

impl Entity for Book {
    type Key = i64;

    fn table_name() -> &'static str {
        "books"
    }

    fn key_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "author_id", "title", "year"]
    }

    fn key(&self) -> &i64 {
        &self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.author_id.into(),
            (&self.title).into(),
            self.year.into(),
        ]
    }
}

/// A migrated SQLite database in a temporary directory.
pub struct TestDb {
    pub factory: Arc<SqliteContextFactory>,
    _dir: TempDir,
}

impl TestDb {
    /// Create a fresh, empty database.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("test.db").display());

        let pool = DatabasePool::connect(&DatabaseConfig::new(url))
            .await
            .expect("Failed to connect to test database");
        let factory = SqliteContextFactory::new(pool).with_migrator(&MIGRATOR);

        Self {
            factory: Arc::new(factory),
            _dir: dir,
        }
    }

    pub fn repo(&self) -> ContextRepository {
        ContextRepository::from_shared(Arc::clone(&self.factory))
    }

    pub fn authors(&self) -> EntityRepository<Author> {
        EntityRepository::from_shared(Arc::clone(&self.factory))
    }

    pub fn books(&self) -> EntityRepository<Book> {
        EntityRepository::from_shared(Arc::clone(&self.factory))
    }

    /// Insert two authors with three books between them.
    pub async fn seed_library(&self) {
        let mut tolkien = Author::new(1, "Tolkien");
        tolkien.country = Some("UK".into());
        let le_guin = Author::new(2, "Le Guin");
        let ok = self
            .repo()
            .create(&[tolkien, le_guin])
            .await
            .expect("seed authors");
        assert!(ok);

        let ok = self
            .repo()
            .create(&[
                Book::new(10, 1, "The Hobbit", 1937),
                Book::new(11, 1, "The Silmarillion", 1977),
                Book::new(20, 2, "A Wizard of Earthsea", 1968),
            ])
            .await
            .expect("seed books");
        assert!(ok);
    }

    /// Insert `n` authors with ids `1..=n` named `author-01`, `author-02`, ...
    pub async fn seed_authors(&self, n: i64) {
        let authors: Vec<Author> = (1..=n)
            .map(|i| Author::new(i, &format!("author-{i:02}")))
            .collect();
        let ok = self.repo().create(&authors).await.expect("seed authors");
        assert!(ok);
    }
}
