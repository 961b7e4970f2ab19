//! Include paths between people and their addresses.

use uuid::Uuid;

use datarepo_database::Include;
use datarepo_entity::{Address, Person};

/// Every address of each person.
pub fn addresses() -> Include<Person> {
    Include::has_many::<Address>("addresses", "person_id", attach_addresses)
}

/// The owning person of each address.
pub fn owner() -> Include<Address> {
    Include::belongs_to::<Person>("person", owner_key, attach_owner)
}

fn attach_addresses(person: &mut Person, addresses: Vec<Address>) {
    person.addresses = addresses;
}

fn owner_key(address: &Address) -> Option<Uuid> {
    Some(address.person_id)
}

fn attach_owner(address: &mut Address, person: Option<Person>) {
    address.person = person.map(Box::new);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_paths_are_named() {
        assert_eq!(addresses().path(), "addresses");
        assert_eq!(owner().path(), "person");
    }
}
