use crate::{
    consts::consts::EntityId,
    model::{
        document::Document,
        statement::{Statement, StatementResult},
    },
};

use super::{
    collection::{filter::Filter, pipeline::Stage, query::Query},
    database::{Database, DatabaseError},
};

/// Document operations the services rely on, addressed by collection name
pub trait DocumentStore: Send + Sync {
    fn insert(&self, collection: &str, document: Document) -> Result<EntityId, DatabaseError>;

    fn find_by_id(&self, collection: &str, id: &EntityId)
        -> Result<Option<Document>, DatabaseError>;

    fn find_matching(&self, collection: &str, query: Query) -> Result<Vec<Document>, DatabaseError>;

    fn count_matching(&self, collection: &str, filter: Filter) -> Result<usize, DatabaseError>;

    fn run_pipeline(
        &self,
        collection: &str,
        stages: Vec<Stage>,
    ) -> Result<Vec<Document>, DatabaseError>;

    /// Returns whether a document was removed, deleting a missing id is not an error
    fn delete_by_id(&self, collection: &str, id: &EntityId) -> Result<bool, DatabaseError>;
}

impl DocumentStore for Database {
    fn insert(&self, collection: &str, document: Document) -> Result<EntityId, DatabaseError> {
        match self.process_statement(collection, Statement::Insert(document))? {
            StatementResult::Inserted(id) => Ok(id),
            other => Err(unexpected("Inserted", other)),
        }
    }

    fn find_by_id(
        &self,
        collection: &str,
        id: &EntityId,
    ) -> Result<Option<Document>, DatabaseError> {
        match self.process_statement(collection, Statement::Get(id.clone()))? {
            StatementResult::Single(document) => Ok(document),
            other => Err(unexpected("Single", other)),
        }
    }

    fn find_matching(&self, collection: &str, query: Query) -> Result<Vec<Document>, DatabaseError> {
        match self.process_statement(collection, Statement::Find(query))? {
            StatementResult::List(documents) => Ok(documents),
            other => Err(unexpected("List", other)),
        }
    }

    fn count_matching(&self, collection: &str, filter: Filter) -> Result<usize, DatabaseError> {
        match self.process_statement(collection, Statement::Count(filter))? {
            StatementResult::Count(count) => Ok(count),
            other => Err(unexpected("Count", other)),
        }
    }

    fn run_pipeline(
        &self,
        collection: &str,
        stages: Vec<Stage>,
    ) -> Result<Vec<Document>, DatabaseError> {
        match self.process_statement(collection, Statement::Aggregate(stages))? {
            StatementResult::List(documents) => Ok(documents),
            other => Err(unexpected("List", other)),
        }
    }

    fn delete_by_id(&self, collection: &str, id: &EntityId) -> Result<bool, DatabaseError> {
        match self.process_statement(collection, Statement::Remove(id.clone()))? {
            StatementResult::Removed(removed) => Ok(removed),
            other => Err(unexpected("Removed", other)),
        }
    }
}

fn unexpected(expected: &'static str, actual: StatementResult) -> DatabaseError {
    DatabaseError::UnexpectedResult {
        expected,
        actual: actual.kind(),
    }
}
