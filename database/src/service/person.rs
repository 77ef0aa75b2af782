use std::sync::Arc;

use crate::{
    consts::consts::{
        EntityId, ADDRESSES_FIELD, AGE_FIELD, FIRST_NAME_FIELD, PERSON_COLLECTION,
    },
    database::{
        collection::{
            collection::ApplyErrors,
            filter::Filter,
            query::{Projection, Query},
        },
        database::DatabaseError,
        store::DocumentStore,
    },
    model::person::Person,
};

use super::{
    aggregation::{
        oldest_person_by_city_pipeline, population_by_city_pipeline, CityPopulation,
        OldestPersonByCity,
    },
    error::{decode, decode_all, ServiceError, ServiceResult},
    search::{compose, Page, SearchCriteria},
};

/// Person reads, writes and analytics on top of a document store. Holds no
/// state of its own, every call goes to the store.
pub struct PersonService {
    store: Arc<dyn DocumentStore>,
}

impl PersonService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persons are never overwritten, saving an existing id is a conflict
    #[tracing::instrument(skip(self, person), fields(person_id = %person.person_id))]
    pub fn save(&self, person: Person) -> ServiceResult<EntityId> {
        if self
            .store
            .find_by_id(PERSON_COLLECTION, &person.person_id)?
            .is_some()
        {
            log::warn!("Person already exists: {}", person.person_id);
            return Err(ServiceError::AlreadyExists(person.person_id));
        }

        let document =
            serde_json::to_value(&person).map_err(|e| ServiceError::Decode(e.to_string()))?;

        // The pre-check can race with another save, the store has the final word
        match self.store.insert(PERSON_COLLECTION, document) {
            Ok(id) => Ok(id),
            Err(DatabaseError::Apply(ApplyErrors::DuplicateKey(id))) => {
                Err(ServiceError::AlreadyExists(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_by_id(&self, id: &EntityId) -> ServiceResult<Option<Person>> {
        self.store
            .find_by_id(PERSON_COLLECTION, id)?
            .map(decode)
            .transpose()
    }

    /// Case-sensitive prefix match on the first name
    pub fn find_by_name_prefix(&self, prefix: &str) -> ServiceResult<Vec<Person>> {
        let query = Query::new(Filter::starts_with(FIRST_NAME_FIELD, prefix));

        decode_all(self.store.find_matching(PERSON_COLLECTION, query)?)
    }

    /// `min < age < max`, returned persons have no addresses
    pub fn find_by_age_range(&self, min_age: u32, max_age: u32) -> ServiceResult<Vec<Person>> {
        let query = Query::new(Filter::between_exclusive(
            AGE_FIELD,
            min_age.into(),
            max_age.into(),
        ))
        .set_projection(Projection::Exclude(vec![ADDRESSES_FIELD.to_string()]));

        decode_all(self.store.find_matching(PERSON_COLLECTION, query)?)
    }

    #[tracing::instrument(skip(self))]
    pub fn search(&self, criteria: &SearchCriteria) -> ServiceResult<Page<Person>> {
        let search_query = compose(criteria);

        let content: Vec<Person> = decode_all(
            self.store
                .find_matching(PERSON_COLLECTION, search_query.page_query())?,
        )?;

        let total_elements = match search_query.page.total_from_content(content.len()) {
            Some(total_elements) => total_elements,
            None => self
                .store
                .count_matching(PERSON_COLLECTION, search_query.filter.clone())?,
        };

        log::debug!(
            "Search [Page: {}, Returned: {}, Total: {}]",
            search_query.page.page,
            content.len(),
            total_elements
        );

        Ok(Page::new(content, &search_query.page, total_elements))
    }

    /// Deleting a missing person succeeds
    pub fn delete(&self, id: &EntityId) -> ServiceResult<()> {
        if !self.store.delete_by_id(PERSON_COLLECTION, id)? {
            log::debug!("Delete of missing person: {}", id);
        }

        Ok(())
    }

    pub fn oldest_person_by_city(&self) -> ServiceResult<Vec<OldestPersonByCity>> {
        decode_all(
            self.store
                .run_pipeline(PERSON_COLLECTION, oldest_person_by_city_pipeline())?,
        )
    }

    pub fn population_by_city(&self) -> ServiceResult<Vec<CityPopulation>> {
        decode_all(
            self.store
                .run_pipeline(PERSON_COLLECTION, population_by_city_pipeline())?,
        )
    }
}
