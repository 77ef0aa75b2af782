use crate::{
    consts::consts::EntityId,
    database::collection::{filter::Filter, pipeline::Stage, query::Query},
};

use super::document::Document;

/// A single request against one collection
#[derive(Clone, Debug)]
pub enum Statement {
    Insert(Document),
    Get(EntityId),
    Find(Query),
    Count(Filter),
    Aggregate(Vec<Stage>),
    Remove(EntityId),
}

impl Statement {
    pub fn is_mutation(&self) -> bool {
        match self {
            Statement::Insert(_) | Statement::Remove(_) => true,
            Statement::Get(_)
            | Statement::Find(_)
            | Statement::Count(_)
            | Statement::Aggregate(_) => false,
        }
    }

    /// Prints complex statements in a more readable format, documents are
    /// summarised rather than printed whole
    pub fn log_format(&self) -> String {
        match self {
            Statement::Insert(document) => format!(
                "Insert({})",
                document
                    .get(crate::consts::consts::ID_FIELD)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "<generated>".to_string())
            ),
            Statement::Aggregate(stages) => format!(
                "Aggregate([{}])",
                stages
                    .iter()
                    .map(|stage| stage.name())
                    .collect::<Vec<&str>>()
                    .join(" -> ")
            ),
            _ => format!("{:?}", self),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementResult {
    Inserted(EntityId),
    Single(Option<Document>),
    List(Vec<Document>),
    Count(usize),
    Removed(bool),
}

impl StatementResult {
    pub fn kind(&self) -> &'static str {
        match self {
            StatementResult::Inserted(_) => "Inserted",
            StatementResult::Single(_) => "Single",
            StatementResult::List(_) => "List",
            StatementResult::Count(_) => "Count",
            StatementResult::Removed(_) => "Removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::database::collection::{pipeline::Stage, query::SortKey};

    #[test]
    fn only_insert_and_remove_mutate() {
        assert!(Statement::Insert(json!({})).is_mutation());
        assert!(Statement::Remove(EntityId::from("1")).is_mutation());
        assert!(!Statement::Find(Query::all()).is_mutation());
        assert!(!Statement::Count(Filter::All).is_mutation());
        assert!(!Statement::Aggregate(vec![]).is_mutation());
        assert!(!Statement::Get(EntityId::from("1")).is_mutation());
    }

    #[test]
    fn log_format_summarises_documents_and_pipelines() {
        let insert = Statement::Insert(json!({ "_id": "p-1", "firstName": "Ada" }));
        let aggregate = Statement::Aggregate(vec![
            Stage::unwind("addresses"),
            Stage::sort(vec![SortKey::descending("age")]),
        ]);

        assert_eq!(insert.log_format(), "Insert(\"p-1\")");
        assert_eq!(aggregate.log_format(), "Aggregate([unwind -> sort])");
    }
}
