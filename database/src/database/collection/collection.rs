use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use thiserror::Error;

use crate::{
    consts::consts::{DocumentSequence, EntityId, ID_FIELD},
    model::{
        document::Document,
        statement::{Statement, StatementResult},
    },
};

use super::{pipeline, query};

#[derive(Error, Debug, PartialEq)]
pub enum ApplyErrors {
    // CRUD - CREATE
    #[error("Cannot create, duplicate key: {0}")]
    DuplicateKey(EntityId),

    #[error("Cannot create, document is not an object")]
    DocumentIsNotAnObject,

    #[error("Cannot create, document key must be a string: {0}")]
    InvalidIdentifier(String),

    // Routing
    #[error("Statement cannot be applied as a mutation: {0}")]
    NotAMutation(String),

    #[error("Statement cannot be run as a query: {0}")]
    NotAQuery(String),
}

/// Documents of a single collection.
///
/// Rows are kept in insertion order, which is the order every scan, and so
/// every query and pipeline, sees them in.
#[derive(Debug, Default)]
pub struct DocumentCollection {
    pub rows: BTreeMap<DocumentSequence, Document>,
    pub unique_id_index: HashMap<EntityId, DocumentSequence>,
    next_sequence: DocumentSequence,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            unique_id_index: HashMap::new(),
            next_sequence: DocumentSequence::new_first_sequence(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Applies a mutation statement
    pub fn apply(&mut self, statement: Statement) -> Result<StatementResult, ApplyErrors> {
        let statement_result = match statement {
            Statement::Insert(document) => StatementResult::Inserted(self.insert(document)?),
            Statement::Remove(id) => StatementResult::Removed(self.remove(&id)),
            Statement::Get(_)
            | Statement::Find(_)
            | Statement::Count(_)
            | Statement::Aggregate(_) => {
                return Err(ApplyErrors::NotAMutation(statement.log_format()))
            }
        };

        Ok(statement_result)
    }

    /// Runs a read-only statement
    pub fn query_statement(&self, statement: Statement) -> Result<StatementResult, ApplyErrors> {
        let statement_result = match statement {
            Statement::Get(id) => StatementResult::Single(
                self.unique_id_index
                    .get(&id)
                    .and_then(|sequence| self.rows.get(sequence))
                    .cloned(),
            ),
            Statement::Find(find) => {
                StatementResult::List(query::execute(self.rows.values(), &find))
            }
            Statement::Count(filter) => {
                StatementResult::Count(query::count(self.rows.values(), &filter))
            }
            Statement::Aggregate(stages) => {
                let documents: Vec<Document> = self.rows.values().cloned().collect();

                StatementResult::List(pipeline::run(documents, &stages))
            }
            Statement::Insert(_) | Statement::Remove(_) => {
                return Err(ApplyErrors::NotAQuery(statement.log_format()))
            }
        };

        Ok(statement_result)
    }

    /// Used when restoring from a snapshot, documents are expected in collection order
    pub fn restore_collection(&mut self, documents: Vec<Document>) -> Result<usize, ApplyErrors> {
        let count = documents.len();

        for document in documents {
            self.insert(document)?;
        }

        Ok(count)
    }

    /// Every document in collection order
    pub fn documents(&self) -> Vec<Document> {
        self.rows.values().cloned().collect()
    }

    // The unique id index is the authoritative guard against duplicate keys,
    // a key is generated when the document has none.
    fn insert(&mut self, mut document: Document) -> Result<EntityId, ApplyErrors> {
        let fields = document
            .as_object_mut()
            .ok_or(ApplyErrors::DocumentIsNotAnObject)?;

        let id = match fields.get(ID_FIELD) {
            Some(Value::String(id)) => EntityId(id.clone()),
            Some(other) => return Err(ApplyErrors::InvalidIdentifier(other.to_string())),
            None => {
                let id = EntityId::new();
                fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
                id
            }
        };

        if self.unique_id_index.contains_key(&id) {
            return Err(ApplyErrors::DuplicateKey(id));
        }

        let sequence = self.next_sequence;
        self.next_sequence = sequence.increment();

        self.rows.insert(sequence, document);
        self.unique_id_index.insert(id.clone(), sequence);

        Ok(id)
    }

    fn remove(&mut self, id: &EntityId) -> bool {
        match self.unique_id_index.remove(id) {
            Some(sequence) => self.rows.remove(&sequence).is_some(),
            None => false,
        }
    }
}
