//! Filter clauses and the wire shape the admin UI submits.
//!
//! Structured filters arrive keyed by field, then by an opaque filter index
//! the UI uses to round-trip its widgets:
//!
//! ```json
//! { "name": { "0055": { "o": "like", "v": "ann" } },
//!   "age":  { "0107": { "o": "between", "v": ["18", "65"] } } }
//! ```
//!
//! The index only keeps several filters on one field apart; it never reaches
//! the compiler.

use indexmap::IndexMap;
use serde::Deserialize;
use smol_str::SmolStr;

use crate::catalog::DEFAULT_OPERATOR;
use crate::value::RawValue;

/// Structured filters by field name, then by filter index.
pub type FilterDescriptor = IndexMap<String, IndexMap<String, FilterDump>>;

/// One submitted filter widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterDump {
    /// The operator, `"o"`.
    #[serde(rename = "o", default)]
    pub operator: Option<String>,
    /// The value, `"v"`.
    #[serde(rename = "v", default)]
    pub value: RawValue,
}

/// One logical filter intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    /// A free-text query across all queryable fields.
    Query(String),
    /// A structured filter on one field.
    Field {
        /// The targeted field.
        field: SmolStr,
        /// The operator.
        operator: String,
        /// The raw value.
        value: RawValue,
    },
}

impl FilterClause {
    /// Create a free-text query clause.
    pub fn query(text: impl Into<String>) -> Self {
        Self::Query(text.into())
    }

    /// Create a structured filter clause.
    pub fn field(
        field: impl Into<SmolStr>,
        operator: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        Self::Field {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// The targeted field, for structured filters.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Query(_) => None,
            Self::Field { field, .. } => Some(field.as_str()),
        }
    }

    /// Parse structured clauses straight from a JSON descriptor.
    pub fn from_json(json: &str) -> serde_json::Result<Vec<Self>> {
        let descriptor: FilterDescriptor = serde_json::from_str(json)?;
        Ok(parse_filters(&descriptor, DEFAULT_OPERATOR))
    }
}

/// Flatten a descriptor into clauses, in submission order.
///
/// Filters without an operator get `default_operator`.
pub fn parse_filters(descriptor: &FilterDescriptor, default_operator: &str) -> Vec<FilterClause> {
    descriptor
        .iter()
        .flat_map(|(field, dumps)| {
            dumps.values().map(move |dump| FilterClause::Field {
                field: SmolStr::new(field),
                operator: dump
                    .operator
                    .clone()
                    .unwrap_or_else(|| default_operator.to_string()),
                value: dump.value.clone(),
            })
        })
        .collect()
}

/// Everything a list request asks to filter by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterRequest {
    /// Free-text query.
    #[serde(default)]
    pub query: Option<String>,
    /// Structured filters.
    #[serde(default)]
    pub filters: FilterDescriptor,
    /// Restrict to these primary keys.
    #[serde(default)]
    pub bulk_ids: Option<RawValue>,
}

impl FilterRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add a structured filter under the next free index.
    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        let dumps = self.filters.entry(field.into()).or_default();
        let index = format!("{:04}", dumps.len());
        dumps.insert(
            index,
            FilterDump {
                operator: Some(operator.into()),
                value: value.into(),
            },
        );
        self
    }

    /// Restrict to the given primary keys.
    pub fn with_bulk_ids(mut self, ids: impl Into<RawValue>) -> Self {
        self.bulk_ids = Some(ids.into());
        self
    }

    /// All clauses of the request, query first.
    pub fn clauses(&self, default_operator: &str) -> Vec<FilterClause> {
        let mut clauses = Vec::new();
        if let Some(query) = &self.query {
            clauses.push(FilterClause::query(query.clone()));
        }
        clauses.extend(parse_filters(&self.filters, default_operator));
        clauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_wire_shape() {
        let clauses = FilterClause::from_json(
            r#"{
                "name": { "0055": { "o": "like", "v": "ann" } },
                "age": {
                    "0107": { "o": "between", "v": ["18", "65"] },
                    "0108": { "v": "30" }
                },
                "nickname": { "0200": { "o": "_null" } }
            }"#,
        )
        .unwrap();

        assert_eq!(
            clauses,
            vec![
                FilterClause::field("name", "like", "ann"),
                FilterClause::field("age", "between", vec!["18", "65"]),
                FilterClause::field("age", "default", "30"),
                FilterClause::field("nickname", "_null", RawValue::default()),
            ]
        );
    }

    #[test]
    fn test_numbers_in_payload() {
        let clauses = FilterClause::from_json(r#"{ "age": { "1": { "o": "between", "v": [18, 65] } } }"#)
            .unwrap();
        assert_eq!(clauses, vec![FilterClause::field("age", "between", vec!["18", "65"])]);
    }

    #[test]
    fn test_request_builder() {
        let request = FilterRequest::new()
            .with_query("ann")
            .with_filter("age", "between", vec!["18", "65"])
            .with_filter("age", "_not_null", "");

        let clauses = request.clauses(DEFAULT_OPERATOR);
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0], FilterClause::query("ann"));
        assert_eq!(clauses[2].field_name(), Some("age"));
        assert_eq!(request.filters["age"].len(), 2);
    }

    #[test]
    fn test_request_from_json() {
        let request: FilterRequest = serde_json::from_str(
            r#"{ "query": "ann", "bulk_ids": ["1", "2"], "filters": { "team": { "0": { "v": "3" } } } }"#,
        )
        .unwrap();
        assert_eq!(request.query.as_deref(), Some("ann"));
        assert_eq!(request.bulk_ids, Some(RawValue::from(vec!["1", "2"])));
        assert_eq!(request.clauses("like")[1], FilterClause::field("team", "like", "3"));
    }
}
