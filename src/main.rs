//! DataRepo demo.
//!
//! Loads configuration, opens the database (migrating and seeding it on
//! first use), and runs a few queries through the generic repositories.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use datarepo_core::config::AppConfig;
use datarepo_core::error::{AppError, ErrorKind};
use datarepo_core::types::{PageRequest, col};
use datarepo_database::{Query, Repository, SqliteContextFactory};
use datarepo_entity::{Address, AddressKind, MIGRATOR, Person};
use datarepo_entity::person::CreatePerson;
use datarepo_service::person::include;
use datarepo_service::{NewAddress, PeopleSeeder, PersonRepository, PersonService};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("DATAREPO_CONFIG") {
        Ok(path) => AppConfig::from_file(&path),
        Err(_) => {
            let env = std::env::var("DATAREPO_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DataRepo demo v{}", env!("CARGO_PKG_VERSION"));

    create_data_directory(&config.database.url).await?;

    let factory = SqliteContextFactory::connect(&config.database, &MIGRATOR)
        .await?
        .with_seeder(PeopleSeeder);
    let factory = Arc::new(factory);

    let repo = Arc::new(PersonRepository::new(Arc::clone(&factory)));
    let service = PersonService::new(Arc::clone(&repo));

    let hancocks = service.get_persons_by_last_name("Hancock").await?;
    for person in &hancocks {
        let cities: Vec<&str> = person.addresses.iter().map(|a| a.city.as_str()).collect();
        tracing::info!(name = %person.full_name(), ?cities, "Found Hancock");
    }

    let email = format!("demo+{}@example.com", uuid::Uuid::new_v4().simple());
    let mut data = CreatePerson::named("Demo", "User");
    data.email = Some(email);
    let person = service
        .register(
            data,
            vec![NewAddress {
                kind: AddressKind::Work,
                street: "1 Infinite Loop".into(),
                city: "Cupertino".into(),
                postal_code: Some("95014".into()),
            }],
        )
        .await?;

    let work_addresses = repo
        .addresses()
        .find(
            Query::<Address>::new()
                .filter(col("kind").eq(AddressKind::Work))
                .include(include::owner()),
        )
        .await?;
    tracing::info!(count = work_addresses.len(), "Work addresses");

    let page = service.list(&PageRequest::new(1, 3)).await?;
    tracing::info!(
        total = page.total_items,
        pages = page.total_pages,
        first_page = ?page.items.iter().map(Person::full_name).collect::<Vec<_>>(),
        "People"
    );

    service.remove(person.id).await?;
    let remaining = repo.people().count(None).await?;
    tracing::info!(remaining, "Demo person removed");

    factory.pool().close().await;
    Ok(())
}

/// Create the parent directory of a file-backed database URL.
async fn create_data_directory(url: &str) -> Result<(), AppError> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to create data directory '{}'", parent.display()),
                e,
            )
        })?;
    }
    Ok(())
}
