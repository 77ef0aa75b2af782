use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::consts::EntityId;

/// A person document. The id doubles as the document key, clients may send it
/// as either `_id` or `personId`, a missing id is generated.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "_id", alias = "personId", default)]
    pub person_id: EntityId,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub age: u32,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub addresses: Vec<Address>,
}

/// Owned by its person, has no identity of its own
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
}

impl Person {
    pub fn new(person_id: &str, first_name: &str, age: u32) -> Self {
        Person {
            person_id: EntityId(person_id.to_string()),
            first_name: first_name.to_string(),
            last_name: None,
            age,
            hobbies: vec![],
            addresses: vec![],
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn with_cities(self, cities: &[&str]) -> Self {
        cities
            .iter()
            .fold(self, |person, city| person.with_address(Address::new(city)))
    }

    pub fn new_test() -> Self {
        Person::new("1", "Full Name", 30).with_cities(&["NYC"])
    }
}

impl Address {
    pub fn new(city: &str) -> Self {
        Address {
            address1: None,
            address2: None,
            city: city.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

// An unwound person carries a single address object instead of a list
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
