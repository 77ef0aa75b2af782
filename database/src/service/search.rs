use serde::Serialize;

use crate::{
    consts::consts::{AGE_FIELD, CITY_PATH, DEFAULT_PAGE_SIZE, FIRST_NAME_FIELD},
    database::collection::{
        filter::Filter,
        query::{Query, SortKey},
    },
};

use super::error::{ServiceError, ServiceResult};

/// Page index (0-based), page size and sort order of a paginated read
#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: Vec<SortKey>,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            sort: vec![],
        }
    }

    pub fn set_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Total number of matches when the fetched page already tells us, that
    /// is a first page that is not full or a non-empty partial page. `None`
    /// means the matches have to be counted.
    pub fn total_from_content(&self, content_len: usize) -> Option<usize> {
        let offset = self.offset();

        if offset == 0 {
            return (self.size > content_len).then_some(content_len);
        }

        (content_len != 0 && self.size > content_len).then_some(offset + content_len)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// Optional search parameters, an absent parameter does not constrain the result
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchCriteria {
    pub name_prefix: Option<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub city: Option<String>,
    pub page: PageRequest,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl SearchCriteria {
    pub fn set_name_prefix(mut self, name_prefix: &str) -> Self {
        self.name_prefix = Some(name_prefix.to_string());
        self
    }

    pub fn set_age_range(mut self, min_age: u32, max_age: u32) -> Self {
        self.min_age = Some(min_age);
        self.max_age = Some(max_age);
        self
    }

    pub fn set_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    pub fn set_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Not enforced by search itself, callers decide whether to reject
    pub fn validate(&self) -> ServiceResult<()> {
        if let (Some(min_age), Some(max_age)) = (self.min_age, self.max_age) {
            if min_age > max_age {
                return Err(ServiceError::Validation(format!(
                    "minAge ({}) must not be greater than maxAge ({})",
                    min_age, max_age
                )));
            }
        }

        if self.page.size == 0 {
            return Err(ServiceError::Validation(
                "page size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Combined predicate plus the page to fetch
#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    pub filter: Filter,
    pub page: PageRequest,
}

impl SearchQuery {
    /// The find request for the requested page only
    pub fn page_query(&self) -> Query {
        Query::new(self.filter.clone())
            .set_sort(self.page.sort.clone())
            .set_skip(self.page.offset())
            .set_limit(self.page.size)
    }
}

type CriterionBuilder = fn(&SearchCriteria) -> Option<Filter>;

const CRITERIA: [CriterionBuilder; 3] = [name_criterion, age_criterion, city_criterion];

/// ANDs together a predicate for every parameter present in the criteria
pub fn compose(criteria: &SearchCriteria) -> SearchQuery {
    let filters = CRITERIA
        .iter()
        .filter_map(|criterion| criterion(criteria))
        .collect();

    SearchQuery {
        filter: Filter::all_of(filters),
        page: criteria.page.clone(),
    }
}

fn name_criterion(criteria: &SearchCriteria) -> Option<Filter> {
    criteria
        .name_prefix
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|name| Filter::contains_ignore_case(FIRST_NAME_FIELD, name))
}

fn age_criterion(criteria: &SearchCriteria) -> Option<Filter> {
    match (criteria.min_age, criteria.max_age) {
        (Some(min_age), Some(max_age)) => Some(Filter::between_inclusive(
            AGE_FIELD,
            min_age.into(),
            max_age.into(),
        )),
        _ => None,
    }
}

fn city_criterion(criteria: &SearchCriteria) -> Option<Filter> {
    criteria
        .city
        .as_deref()
        .filter(|city| !city.is_empty())
        .map(|city| Filter::equals(CITY_PATH, city))
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page_request: &PageRequest, total_elements: usize) -> Self {
        let total_pages = match page_request.size {
            0 => 1,
            size => total_elements.div_ceil(size),
        };

        Page {
            content,
            page: page_request.page,
            size: page_request.size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    mod compose {
        use super::*;

        #[test]
        fn no_criteria_matches_everything() {
            let query = compose(&SearchCriteria::default());

            assert_eq!(query.filter, Filter::All);
            assert_eq!(query.page, PageRequest::default());
        }

        #[test]
        fn single_criterion_is_not_wrapped() {
            let query = compose(&SearchCriteria::default().set_city("NYC"));

            assert_eq!(query.filter, Filter::equals("addresses.city", "NYC"));
        }

        #[test]
        fn every_present_criterion_is_combined() {
            let criteria = SearchCriteria::default()
                .set_name_prefix("An")
                .set_age_range(20, 40)
                .set_city("NYC");

            let query = compose(&criteria);

            assert_eq!(
                query.filter,
                Filter::And(vec![
                    Filter::contains_ignore_case("firstName", "An"),
                    Filter::between_inclusive("age", 20, 40),
                    Filter::equals("addresses.city", "NYC"),
                ])
            );
        }

        #[test]
        fn empty_strings_and_half_age_ranges_do_not_constrain() {
            let criteria = SearchCriteria {
                name_prefix: Some(String::new()),
                min_age: Some(20),
                max_age: None,
                city: Some(String::new()),
                page: PageRequest::default(),
            };

            assert_eq!(compose(&criteria).filter, Filter::All);
        }

        #[test]
        fn page_query_skips_whole_pages() {
            let criteria = SearchCriteria::default()
                .set_page(PageRequest::new(2, 5).set_sort(vec![SortKey::ascending("age")]));

            let query = compose(&criteria).page_query();

            assert_eq!(query.skip, 10);
            assert_eq!(query.limit, Some(5));
            assert_eq!(query.sort, vec![SortKey::ascending("age")]);
        }
    }

    mod validate {
        use super::*;

        #[test]
        fn inverted_age_range_is_rejected() {
            let criteria = SearchCriteria::default().set_age_range(50, 10);

            assert!(matches!(
                criteria.validate(),
                Err(ServiceError::Validation(_))
            ));
        }

        #[test]
        fn zero_page_size_is_rejected() {
            let criteria = SearchCriteria::default().set_page(PageRequest::new(0, 0));

            assert!(matches!(
                criteria.validate(),
                Err(ServiceError::Validation(_))
            ));
        }

        #[test]
        fn equal_bounds_are_valid() {
            assert!(SearchCriteria::default()
                .set_age_range(30, 30)
                .validate()
                .is_ok());
        }
    }

    #[rstest]
    // First page not full, content is everything
    #[case(0, 20, 3, Some(3))]
    // First page full, there may be more
    #[case(0, 3, 3, None)]
    // Partial later page
    #[case(2, 10, 4, Some(24))]
    // Empty later page, we cannot tell
    #[case(5, 10, 0, None)]
    // Full later page
    #[case(1, 10, 10, None)]
    fn total_from_content(
        #[case] page: usize,
        #[case] size: usize,
        #[case] content_len: usize,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(
            PageRequest::new(page, size).total_from_content(content_len),
            expected
        );
    }

    #[rstest]
    #[case(0, 0)]
    #[case(20, 1)]
    #[case(21, 2)]
    #[case(40, 2)]
    fn total_pages_rounds_up(#[case] total_elements: usize, #[case] expected: usize) {
        let page: Page<()> = Page::new(vec![], &PageRequest::new(0, 20), total_elements);

        assert_eq!(page.total_pages, expected);
    }
}
