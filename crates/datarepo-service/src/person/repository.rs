//! Person repository: the generic repositories plus person-specific queries.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use datarepo_core::result::AppResult;
use datarepo_core::types::{PageRequest, PageResponse, SortField, col};
use datarepo_database::{
    DataContext, EntityRepository, Query, Repository, SqliteContextFactory,
};
use datarepo_entity::{Address, Person};

use super::include;

/// Repository for people and their addresses.
pub struct PersonRepository<F: DataContext = SqliteContextFactory> {
    factory: Arc<F>,
    people: EntityRepository<Person, F>,
    addresses: EntityRepository<Address, F>,
}

impl<F: DataContext> PersonRepository<F> {
    /// Create a person repository over a shared factory.
    pub fn new(factory: Arc<F>) -> Self {
        Self {
            people: EntityRepository::from_shared(Arc::clone(&factory)),
            addresses: EntityRepository::from_shared(Arc::clone(&factory)),
            factory,
        }
    }

    /// The generic repository for [`Person`].
    pub fn people(&self) -> &EntityRepository<Person, F> {
        &self.people
    }

    /// The generic repository for [`Address`].
    pub fn addresses(&self) -> &EntityRepository<Address, F> {
        &self.addresses
    }

    /// Find a person by id, with addresses.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Person>> {
        self.people.get(&id, &[include::addresses()]).await
    }

    /// Find a person by email. Stored emails are lowercase.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Person>> {
        self.people
            .get_where(col("email").eq(email.to_lowercase()), &[])
            .await
    }

    /// Everyone with the given last name, ordered by first name, with
    /// addresses.
    pub async fn find_by_last_name(&self, last_name: &str) -> AppResult<Vec<Person>> {
        self.people
            .find(
                Query::new()
                    .filter(col("last_name").eq(last_name))
                    .order_by("first_name")
                    .include(include::addresses()),
            )
            .await
    }

    /// Everyone with at least one address in `city`, ordered by last name.
    pub async fn find_by_city(&self, city: &str) -> AppResult<Vec<Person>> {
        let city = city.to_lowercase();
        self.people
            .find(
                Query::new()
                    .order_by("last_name")
                    .include(include::addresses())
                    .matching(move |p: &Person| {
                        p.addresses.iter().any(|a| a.city.to_lowercase() == city)
                    }),
            )
            .await
    }

    /// A page of people ordered by last name.
    pub async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Person>> {
        self.people
            .find_page(Query::new().order_by(SortField::asc("last_name")), page)
            .await
    }

    /// Insert a person together with their addresses in one transaction.
    pub async fn create_with_addresses(
        &self,
        person: &Person,
        addresses: &[Address],
    ) -> AppResult<bool> {
        let mut context = self.factory.create_instance().await?;
        context.add(person);
        for address in addresses {
            context.add(address);
        }

        let submitted = 1 + addresses.len() as u64;
        let affected = context.save_changes().await?;
        if affected < submitted {
            warn!(person_id = %person.id, submitted, affected, "Person partially created");
            return Ok(false);
        }

        debug!(person_id = %person.id, addresses = addresses.len(), "Person created");
        Ok(true)
    }

    /// Delete a person and every address they own in one transaction.
    pub async fn delete_with_addresses(&self, person: &Person) -> AppResult<bool> {
        let mut context = self.factory.create_instance().await?;
        let owned = context
            .fetch(&Query::<Address>::new().filter(col("person_id").eq(person.id)))
            .await?;
        for address in &owned {
            context.remove(address);
        }
        context.remove(person);

        let submitted = 1 + owned.len() as u64;
        let affected = context.save_changes().await?;
        Ok(affected >= submitted)
    }
}

impl<F: DataContext> Clone for PersonRepository<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            people: self.people.clone(),
            addresses: self.addresses.clone(),
        }
    }
}

impl<F: DataContext> std::fmt::Debug for PersonRepository<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonRepository").finish_non_exhaustive()
    }
}
