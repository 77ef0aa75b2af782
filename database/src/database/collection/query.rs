use std::{cmp::Ordering, str::FromStr};

use strum::{Display, EnumString};

use crate::model::document::{compare_values, lookup, remove_path, Document};

use super::filter::Filter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SortDirection {
    #[strum(serialize = "asc")]
    Ascending,
    #[strum(serialize = "desc")]
    Descending,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: &str) -> Self {
        SortKey {
            field: field.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: &str) -> Self {
        SortKey {
            field: field.to_string(),
            direction: SortDirection::Descending,
        }
    }
}

/// Parses `field` or `field,direction`, e.g. `age,desc`
impl FromStr for SortKey {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(',') {
            Some((field, direction)) => Ok(SortKey {
                field: field.trim().to_string(),
                direction: SortDirection::from_str(direction.trim())?,
            }),
            None => Ok(SortKey::ascending(s.trim())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Projection {
    #[default]
    All,
    /// Drops the listed (dotted) fields from every returned document
    Exclude(Vec<String>),
}

/// A find request against a single collection
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub projection: Projection,
    pub sort: Vec<SortKey>,
    pub skip: usize,
    pub limit: Option<usize>,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            projection: Projection::All,
            sort: vec![],
            skip: 0,
            limit: None,
        }
    }

    pub fn all() -> Self {
        Self::new(Filter::All)
    }

    pub fn set_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn set_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn set_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn set_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// Runs a query over documents given in collection order: filter, sort, skip,
/// limit then projection
#[tracing::instrument(skip(documents))]
pub fn execute<'a>(
    documents: impl Iterator<Item = &'a Document>,
    query: &Query,
) -> Vec<Document> {
    let mut matching: Vec<Document> = documents
        .filter(|document| query.filter.matches(document))
        .cloned()
        .collect();

    sort_documents(&mut matching, &query.sort);

    let page = matching
        .into_iter()
        .skip(query.skip)
        .take(query.limit.unwrap_or(usize::MAX));

    match &query.projection {
        Projection::All => page.collect(),
        Projection::Exclude(fields) => page
            .map(|mut document| {
                for field in fields {
                    remove_path(&mut document, field);
                }

                document
            })
            .collect(),
    }
}

#[tracing::instrument(skip(documents))]
pub fn count<'a>(documents: impl Iterator<Item = &'a Document>, filter: &Filter) -> usize {
    documents.filter(|document| filter.matches(document)).count()
}

/// Stable sort, documents with equal keys keep their relative order
pub fn sort_documents(documents: &mut Vec<Document>, sort: &[SortKey]) {
    if sort.is_empty() {
        return;
    }

    // Extract the keys once rather than on every comparison
    let mut keyed: Vec<(Vec<Option<Document>>, Document)> = documents
        .drain(..)
        .map(|document| {
            let keys = sort
                .iter()
                .map(|key| lookup(&document, &key.field))
                .collect();

            (keys, document)
        })
        .collect();

    keyed.sort_by(|(left, _), (right, _)| compare_keys(left, right, sort));

    documents.extend(keyed.into_iter().map(|(_, document)| document));
}

fn compare_keys(
    left: &[Option<Document>],
    right: &[Option<Document>],
    sort: &[SortKey],
) -> Ordering {
    left.iter()
        .zip(right.iter())
        .zip(sort.iter())
        .map(|((left, right), key)| {
            let ordering = compare_values(left.as_ref(), right.as_ref());

            match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        })
        .find(|ordering| ordering != &Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn people() -> Vec<Document> {
        vec![
            json!({ "_id": "a", "firstName": "Ann", "age": 40, "addresses": [{ "city": "NYC" }] }),
            json!({ "_id": "b", "firstName": "Bob", "age": 55, "addresses": [{ "city": "NYC" }] }),
            json!({ "_id": "c", "firstName": "Cat", "age": 30, "addresses": [{ "city": "LA" }] }),
            json!({ "_id": "d", "firstName": "Dan", "age": 40, "addresses": [] }),
        ]
    }

    fn ids(documents: &[Document]) -> Vec<&str> {
        documents
            .iter()
            .map(|document| document["_id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn without_sort_keeps_collection_order() {
        let documents = people();

        let result = execute(documents.iter(), &Query::all());

        assert_eq!(ids(&result), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let documents = people();

        let query = Query::all().set_sort(vec![SortKey::descending("age")]);
        let result = execute(documents.iter(), &query);

        assert_eq!(ids(&result), vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn sort_on_secondary_key() {
        let documents = people();

        let query = Query::all().set_sort(vec![
            SortKey::ascending("age"),
            SortKey::descending("firstName"),
        ]);
        let result = execute(documents.iter(), &query);

        assert_eq!(ids(&result), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn skip_and_limit_apply_after_filter_and_sort() {
        let documents = people();

        let query = Query::new(Filter::between_inclusive("age", 35, 60))
            .set_sort(vec![SortKey::ascending("firstName")])
            .set_skip(1)
            .set_limit(1);
        let result = execute(documents.iter(), &query);

        assert_eq!(ids(&result), vec!["b"]);
    }

    #[test]
    fn skip_past_the_end_is_empty() {
        let documents = people();

        let result = execute(documents.iter(), &Query::all().set_skip(10));

        assert!(result.is_empty());
    }

    #[test]
    fn exclude_projection_drops_fields() {
        let documents = people();

        let query = Query::new(Filter::equals("_id", "a"))
            .set_projection(Projection::Exclude(vec!["addresses".to_string()]));
        let result = execute(documents.iter(), &query);

        assert_eq!(result, vec![json!({ "_id": "a", "firstName": "Ann", "age": 40 })]);
    }

    #[test]
    fn count_ignores_skip_and_limit() {
        let documents = people();

        assert_eq!(count(documents.iter(), &Filter::equals("addresses.city", "NYC")), 2);
        assert_eq!(count(documents.iter(), &Filter::All), 4);
    }

    #[test]
    fn sort_key_parses_field_and_direction() {
        assert_eq!("age,desc".parse::<SortKey>().unwrap(), SortKey::descending("age"));
        assert_eq!("age, ASC".parse::<SortKey>().unwrap(), SortKey::ascending("age"));
        assert_eq!("firstName".parse::<SortKey>().unwrap(), SortKey::ascending("firstName"));
        assert!("age,sideways".parse::<SortKey>().is_err());
    }
}
