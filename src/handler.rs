use std::sync::Arc;

use database::{
    consts::consts::{EntityId, DEFAULT_PAGE_SIZE},
    database::{collection::query::SortKey, database::Database},
    model::person::Person,
    service::{
        error::{ServiceError, ServiceResult},
        person::PersonService,
        photo::PhotoService,
        search::{PageRequest, SearchCriteria},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One request per line, e.g. `{"op": "get", "id": "p-1"}`
#[derive(Deserialize, Debug)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    Save {
        person: Person,
    },
    Get {
        id: EntityId,
    },
    Delete {
        id: EntityId,
    },
    FindByNamePrefix {
        prefix: String,
    },
    #[serde(rename_all = "camelCase")]
    FindByAgeRange {
        min_age: u32,
        max_age: u32,
    },
    Search(SearchRequest),
    OldestPersonByCity,
    PopulationByCity,
    StorePhoto {
        title: String,
        data: Vec<u8>,
    },
    GetPhoto {
        id: EntityId,
    },
    Snapshot,
    /// Drops every collection, its snapshot and the transaction log
    Reset,
    Stats,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    name: Option<String>,
    min_age: Option<u32>,
    max_age: Option<u32>,
    city: Option<String>,
    page: usize,
    size: Option<usize>,
    /// `field` or `field,direction`
    sort: Vec<String>,
}

impl TryFrom<SearchRequest> for SearchCriteria {
    type Error = ServiceError;

    fn try_from(request: SearchRequest) -> Result<Self, Self::Error> {
        let sort = request
            .sort
            .iter()
            .map(|sort| {
                sort.parse::<SortKey>()
                    .map_err(|_| ServiceError::Validation(format!("Invalid sort: {}", sort)))
            })
            .collect::<ServiceResult<Vec<SortKey>>>()?;

        let page = PageRequest::new(request.page, request.size.unwrap_or(DEFAULT_PAGE_SIZE))
            .set_sort(sort);

        Ok(SearchCriteria {
            name_prefix: request.name,
            min_age: request.min_age,
            max_age: request.max_age,
            city: request.city,
            page,
        })
    }
}

#[derive(Serialize, Debug)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

fn error_kind(error: &ServiceError) -> &'static str {
    match error {
        ServiceError::AlreadyExists(_) => "conflict",
        ServiceError::NotFound(_) => "not_found",
        ServiceError::Validation(_) => "bad_request",
        ServiceError::Decode(_) | ServiceError::Store(_) => "internal",
    }
}

fn ok<T: Serialize>(value: T) -> ServiceResult<Value> {
    serde_json::to_value(value).map_err(|e| ServiceError::Decode(e.to_string()))
}

/// Routes requests to the person and photo services
pub struct Handler {
    database: Arc<Database>,
    people: PersonService,
    photos: PhotoService,
}

impl Handler {
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            people: PersonService::new(database.clone()),
            photos: PhotoService::new(database.blob_storage()),
            database,
        }
    }

    /// Always produces a response, malformed requests included
    pub fn handle_line(&self, line: &str) -> Value {
        let result = serde_json::from_str::<Request>(line)
            .map_err(|e| ServiceError::Validation(e.to_string()))
            .and_then(|request| self.dispatch(request));

        match result {
            Ok(value) => json!({ "ok": value }),
            Err(error) => {
                let kind = error_kind(&error);

                if kind == "internal" {
                    log::warn!("Request failed: {}", error);
                }

                json!({
                    "error": ErrorBody {
                        kind,
                        message: error.to_string(),
                    }
                })
            }
        }
    }

    fn dispatch(&self, request: Request) -> ServiceResult<Value> {
        match request {
            Request::Save { person } => ok(self.people.save(person)?),
            Request::Get { id } => match self.people.find_by_id(&id)? {
                Some(person) => ok(person),
                None => Err(ServiceError::NotFound(id)),
            },
            Request::Delete { id } => ok(self.people.delete(&id)?),
            Request::FindByNamePrefix { prefix } => ok(self.people.find_by_name_prefix(&prefix)?),
            Request::FindByAgeRange { min_age, max_age } => {
                ok(self.people.find_by_age_range(min_age, max_age)?)
            }
            Request::Search(search) => {
                let criteria = SearchCriteria::try_from(search)?;
                criteria.validate()?;

                ok(self.people.search(&criteria)?)
            }
            Request::OldestPersonByCity => ok(self.people.oldest_person_by_city()?),
            Request::PopulationByCity => ok(self.people.population_by_city()?),
            Request::StorePhoto { title, data } => ok(self.photos.store(&title, data)?),
            Request::GetPhoto { id } => ok(self.photos.retrieve(&id)?),
            Request::Snapshot => ok(json!({ "rows": self.database.snapshot()? })),
            Request::Reset => {
                log::warn!("Resetting database on request");

                ok(json!({ "droppedRows": self.database.reset_database_state()? }))
            }
            Request::Stats => ok(self
                .database
                .database_stats()?
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect::<serde_json::Map<String, Value>>()),
        }
    }
}
