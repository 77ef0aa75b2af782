use serde::{Deserialize, Serialize};

use crate::{
    consts::consts::{ADDRESSES_FIELD, AGE_FIELD, CITY_PATH, ID_FIELD},
    database::collection::{
        pipeline::{Accumulator, ProjectField, Source, Stage},
        query::SortKey,
    },
    model::person::Person,
};

const OLDEST_PERSON_FIELD: &str = "oldestPerson";
const POPULATION_COUNT_FIELD: &str = "popCount";

/// Oldest resident of every city a person has an address in. The document is
/// unwound once per address, so a person counts for each of their cities.
pub fn oldest_person_by_city_pipeline() -> Vec<Stage> {
    vec![
        Stage::unwind(ADDRESSES_FIELD),
        Stage::sort(vec![SortKey::descending(AGE_FIELD)]),
        Stage::group(
            CITY_PATH,
            vec![(OLDEST_PERSON_FIELD, Accumulator::First(Source::Root))],
        ),
    ]
}

/// Number of (person, address) pairs per city, largest first
pub fn population_by_city_pipeline() -> Vec<Stage> {
    vec![
        Stage::unwind(ADDRESSES_FIELD),
        Stage::group(CITY_PATH, vec![(POPULATION_COUNT_FIELD, Accumulator::Count)]),
        Stage::sort(vec![SortKey::descending(POPULATION_COUNT_FIELD)]),
        Stage::project(vec![
            ProjectField::alias("city", ID_FIELD),
            ProjectField::alias("count", POPULATION_COUNT_FIELD),
            ProjectField::exclude(ID_FIELD),
        ]),
    ]
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OldestPersonByCity {
    #[serde(rename(deserialize = "_id"))]
    pub city: String,
    /// Only carries the address of this city
    pub oldest_person: Person,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CityPopulation {
    pub city: String,
    pub count: usize,
}
