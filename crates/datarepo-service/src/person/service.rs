//! Person use cases: registration, lookup, renaming, removal.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use datarepo_core::error::AppError;
use datarepo_core::types::{PageRequest, PageResponse};
use datarepo_database::{DataContext, Repository, SqliteContextFactory};
use datarepo_entity::person::CreatePerson;
use datarepo_entity::{Address, Person};

use super::repository::PersonRepository;

/// Handles person registration and lookup.
pub struct PersonService<F: DataContext = SqliteContextFactory> {
    /// Person repository.
    repo: Arc<PersonRepository<F>>,
}

/// A new address to register with a person.
#[derive(Debug, Clone)]
pub struct NewAddress {
    /// What the address is used for.
    pub kind: datarepo_entity::AddressKind,
    /// Street and house number.
    pub street: String,
    /// City or town.
    pub city: String,
    /// Postal code (optional).
    pub postal_code: Option<String>,
}

impl<F: DataContext> PersonService<F> {
    /// Creates a new person service.
    pub fn new(repo: Arc<PersonRepository<F>>) -> Self {
        Self { repo }
    }

    /// Registers a person with their addresses.
    pub async fn register(
        &self,
        mut data: CreatePerson,
        addresses: Vec<NewAddress>,
    ) -> Result<Person, AppError> {
        validate_name("First name", &data.first_name)?;
        validate_name("Last name", &data.last_name)?;
        data.first_name = data.first_name.trim().to_string();
        data.last_name = data.last_name.trim().to_string();

        if let Some(email) = data.email.take() {
            let email = email.trim().to_lowercase();
            if !email.contains('@') || !email.contains('.') {
                return Err(AppError::validation("Invalid email format"));
            }
            if self.repo.find_by_email(&email).await?.is_some() {
                return Err(AppError::conflict("Email is already in use"));
            }
            data.email = Some(email);
        }

        let mut person = Person::new(data);
        let addresses: Vec<Address> = addresses
            .into_iter()
            .map(|a| {
                let mut address = Address::new(person.id, a.kind, a.street, a.city);
                address.postal_code = a.postal_code;
                address
            })
            .collect();

        if !self.repo.create_with_addresses(&person, &addresses).await? {
            return Err(AppError::internal("Person was not fully stored"));
        }

        info!(person_id = %person.id, name = %person.full_name(), "Person registered");
        person.addresses = addresses;
        Ok(person)
    }

    /// Gets a person with their addresses.
    pub async fn get_person(&self, id: Uuid) -> Result<Person, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Person {id} not found")))
    }

    /// Gets everyone with the given last name.
    pub async fn get_persons_by_last_name(&self, last_name: &str) -> Result<Vec<Person>, AppError> {
        self.repo.find_by_last_name(last_name.trim()).await
    }

    /// Gets everyone with an address in the given city.
    pub async fn get_persons_in_city(&self, city: &str) -> Result<Vec<Person>, AppError> {
        self.repo.find_by_city(city.trim()).await
    }

    /// Lists people a page at a time.
    pub async fn list(&self, page: &PageRequest) -> Result<PageResponse<Person>, AppError> {
        self.repo.list(page).await
    }

    /// Changes a person's name.
    pub async fn rename(
        &self,
        id: Uuid,
        first_name: &str,
        last_name: &str,
    ) -> Result<Person, AppError> {
        validate_name("First name", first_name)?;
        validate_name("Last name", last_name)?;

        let mut person = self.get_person(id).await?;
        person.first_name = first_name.trim().to_string();
        person.last_name = last_name.trim().to_string();

        if !self.repo.people().update(std::slice::from_ref(&person)).await? {
            return Err(AppError::not_found(format!("Person {id} not found")));
        }

        info!(person_id = %id, "Person renamed");
        Ok(person)
    }

    /// Removes a person and their addresses.
    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let person = self.get_person(id).await?;
        if !self.repo.delete_with_addresses(&person).await? {
            return Err(AppError::not_found(format!("Person {id} not found")));
        }

        info!(person_id = %id, "Person removed");
        Ok(())
    }
}

impl<F: DataContext> Clone for PersonService<F> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<F: DataContext> std::fmt::Debug for PersonService<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonService")
            .field("repo", &self.repo)
            .finish()
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}
