//! Query description: equality and array-contains filters, one ordering
//! field and an optional limit.

use std::cmp::Ordering;

use serde_json::Value;

use super::Document;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value
    Eq(String, Value),
    /// Array field contains the value
    ArrayContains(String, Value),
}

impl Filter {
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Eq(field, expected) => document.field(field) == Some(expected),
            Filter::ArrayContains(field, expected) => match document.field(field) {
                Some(Value::Array(items)) => items.contains(expected),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters
            .push(Filter::ArrayContains(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(document))
    }

    /// Filters, sorts and truncates `documents` in place of a backend.
    pub fn apply<'a>(&self, documents: impl IntoIterator<Item = &'a Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = documents
            .into_iter()
            .filter(|document| self.matches(document))
            .cloned()
            .collect();

        if let Some((field, direction)) = &self.order_by {
            matched.sort_by(|a, b| {
                let ordering = compare(a.field(field), b.field(field));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Orders missing < null < bool < number < string; other types compare equal.
/// RFC 3339 UTC timestamps therefore sort chronologically.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
