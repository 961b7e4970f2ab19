//! Integration tests for the blocking repository facade.

mod helpers;

use datarepo_core::config::DatabaseConfig;
use datarepo_core::error::ErrorKind;
use datarepo_core::types::{PageRequest, col};
use datarepo_database::{BlockingRepository, Query};

use helpers::{Author, MIGRATOR};

fn connect(dir: &tempfile::TempDir) -> BlockingRepository<Author> {
    let url = format!("sqlite://{}", dir.path().join("blocking.db").display());
    BlockingRepository::connect(&DatabaseConfig::new(url), &MIGRATOR).expect("connect")
}

#[test]
fn test_blocking_crud_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let authors = connect(&dir);

    assert!(
        authors
            .insert(&[Author::new(1, "Woolf"), Author::new(2, "Austen")])
            .unwrap()
    );
    assert!(authors.exists(&1).unwrap());
    assert_eq!(authors.count(None).unwrap(), 2);

    let mut woolf = authors.get(&1, &[]).unwrap().expect("author 1");
    woolf.country = Some("UK".into());
    assert!(authors.update(std::slice::from_ref(&woolf)).unwrap());
    assert_eq!(
        authors.get(&1, &[]).unwrap().expect("author 1").country,
        Some("UK".into())
    );

    assert!(authors.delete(&[woolf]).unwrap());
    assert!(!authors.exists(&1).unwrap());
    assert!(!authors.update(&[Author::new(1, "Woolf")]).unwrap());
}

#[test]
fn test_blocking_queries_match_async_contract() {
    let dir = tempfile::tempdir().unwrap();
    let authors = connect(&dir);
    let batch: Vec<Author> = (1..=6)
        .map(|i| Author::new(i, &format!("author-{i:02}")))
        .collect();
    assert!(authors.insert(&batch).unwrap());

    let rows = authors
        .find(Query::new().order_by("name").skip(2).take(3))
        .unwrap();
    assert_eq!(rows.iter().map(|a| a.id).collect::<Vec<_>>(), vec![3, 4, 5]);

    assert!(authors.any(col("name").like("author-0%")).unwrap());
    assert_eq!(authors.all(&[]).unwrap().len(), 6);

    let page = authors
        .find_page(Query::new().order_by("id"), &PageRequest::new(2, 4))
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages, 2);

    let err = authors
        .get_where(col("id").gt(0), &[])
        .expect_err("six matches");
    assert!(err.is(ErrorKind::AmbiguousMatch));
}
