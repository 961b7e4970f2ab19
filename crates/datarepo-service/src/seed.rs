//! Sample data for a freshly migrated database.

use async_trait::async_trait;
use tracing::info;

use datarepo_core::result::AppResult;
use datarepo_database::{Context, Seeder};
use datarepo_entity::person::CreatePerson;
use datarepo_entity::{Address, AddressKind, Person};

/// Seeds a handful of people and addresses into an empty `people` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeopleSeeder;

const PEOPLE: &[(&str, &str, &str, &str)] = &[
    ("Herbie", "Hancock", "Chicago", "7 Maiden Lane"),
    ("Jessica", "Hancock", "Boston", "12 Harbor Way"),
    ("Ella", "Fitzgerald", "Newport News", "3 Riverside Dr"),
    ("Miles", "Davis", "Alton", "40 State St"),
    ("Nina", "Simone", "Tryon", "9 Mill Rd"),
];

#[async_trait]
impl Seeder for PeopleSeeder {
    async fn seed(&self, context: &mut Context) -> AppResult<()> {
        if context.any::<Person>(None).await? {
            info!("People already present, skipping seed");
            return Ok(());
        }

        for (first, last, city, street) in PEOPLE {
            let person = Person::new(CreatePerson::named(*first, *last));
            let address = Address::new(person.id, AddressKind::Home, *street, *city);
            context.add(&person);
            context.add(&address);
        }

        info!(people = PEOPLE.len(), "Staged sample people");
        Ok(())
    }
}
