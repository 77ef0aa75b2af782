use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{
    consts::consts::ID_FIELD,
    model::document::{lookup, remove_path, set_path, Document},
};

use super::query::{sort_documents, SortKey};

/// A single step of an aggregation pipeline. Stages are plain data, the
/// collection interprets them in order over a stream of documents.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    /// Emits one copy of the document per element of the array at the path,
    /// with the array replaced by that element
    Unwind(String),
    Sort(Vec<SortKey>),
    Group(Group),
    Project(Vec<ProjectField>),
}

/// Partitions the stream by the value at `key`. Each output document holds the
/// key under `_id` plus one field per accumulator.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub key: String,
    pub accumulators: Vec<(String, Accumulator)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Accumulator {
    /// Value from the first document the group sees
    First(Source),
    Count,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// The whole document
    Root,
    Field(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProjectField {
    Include(String),
    Alias { name: String, source: String },
    Exclude(String),
}

impl Stage {
    pub fn unwind(path: &str) -> Self {
        Stage::Unwind(path.to_string())
    }

    pub fn sort(keys: Vec<SortKey>) -> Self {
        Stage::Sort(keys)
    }

    pub fn group(key: &str, accumulators: Vec<(&str, Accumulator)>) -> Self {
        Stage::Group(Group {
            key: key.to_string(),
            accumulators: accumulators
                .into_iter()
                .map(|(name, accumulator)| (name.to_string(), accumulator))
                .collect(),
        })
    }

    pub fn project(fields: Vec<ProjectField>) -> Self {
        Stage::Project(fields)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Unwind(_) => "unwind",
            Stage::Sort(_) => "sort",
            Stage::Group(_) => "group",
            Stage::Project(_) => "project",
        }
    }
}

impl ProjectField {
    pub fn alias(name: &str, source: &str) -> Self {
        ProjectField::Alias {
            name: name.to_string(),
            source: source.to_string(),
        }
    }

    pub fn exclude(field: &str) -> Self {
        ProjectField::Exclude(field.to_string())
    }
}

/// Runs the stages in order. Documents are owned copies, the collection they
/// came from is never touched.
#[tracing::instrument(skip(documents))]
pub fn run(documents: Vec<Document>, stages: &[Stage]) -> Vec<Document> {
    stages.iter().fold(documents, |documents, stage| {
        let input_count = documents.len();

        let output = match stage {
            Stage::Unwind(path) => unwind(documents, path),
            Stage::Sort(keys) => {
                let mut documents = documents;
                sort_documents(&mut documents, keys);
                documents
            }
            Stage::Group(group_stage) => group(documents, group_stage),
            Stage::Project(fields) => documents
                .into_iter()
                .map(|document| project(document, fields))
                .collect(),
        };

        log::debug!(
            "Stage [{}] [In: {}, Out: {}]",
            stage.name(),
            input_count,
            output.len()
        );

        output
    })
}

// Missing, null and empty arrays produce nothing. A scalar is passed through as
// if it were a one element array.
fn unwind(documents: Vec<Document>, path: &str) -> Vec<Document> {
    let mut output = Vec::with_capacity(documents.len());

    for document in documents {
        match lookup(&document, path) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    let mut copy = document.clone();

                    if set_path(&mut copy, path, item) {
                        output.push(copy);
                    }
                }
            }
            Some(_) => output.push(document),
        }
    }

    output
}

// Groups come out in the order their key was first seen
fn group(documents: Vec<Document>, group: &Group) -> Vec<Document> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Map<String, Value>> = vec![];

    for document in documents {
        let key = lookup(&document, &group.key).unwrap_or(Value::Null);

        // serde_json::Value is not hashable, its canonical string form is
        let position = *positions.entry(key.to_string()).or_insert_with(|| {
            let mut output = Map::new();
            output.insert(ID_FIELD.to_string(), key.clone());
            groups.push(output);
            groups.len() - 1
        });

        let output = &mut groups[position];

        for (name, accumulator) in &group.accumulators {
            match accumulator {
                Accumulator::First(source) => {
                    if !output.contains_key(name) {
                        let value = match source {
                            Source::Root => document.clone(),
                            Source::Field(path) => lookup(&document, path).unwrap_or(Value::Null),
                        };

                        output.insert(name.clone(), value);
                    }
                }
                Accumulator::Count => {
                    let count = output.get(name).and_then(Value::as_u64).unwrap_or(0);

                    output.insert(name.clone(), Value::from(count + 1));
                }
            }
        }
    }

    groups.into_iter().map(Value::Object).collect()
}

// Any include or alias switches to inclusion mode, where only `_id` and the
// named fields survive. Exclusions are applied last.
fn project(document: Document, fields: &[ProjectField]) -> Document {
    let inclusion = fields
        .iter()
        .any(|field| !matches!(field, ProjectField::Exclude(_)));

    let mut output = match inclusion {
        false => document,
        true => {
            let mut output = Value::Object(Map::new());

            if let Some(id) = lookup(&document, ID_FIELD) {
                set_path(&mut output, ID_FIELD, id);
            }

            for field in fields {
                let (name, source) = match field {
                    ProjectField::Include(path) => (path, path),
                    ProjectField::Alias { name, source } => (name, source),
                    ProjectField::Exclude(_) => continue,
                };

                if let Some(value) = lookup(&document, source) {
                    set_path(&mut output, name, value);
                }
            }

            output
        }
    };

    for field in fields {
        if let ProjectField::Exclude(path) = field {
            remove_path(&mut output, path);
        }
    }

    output
}
