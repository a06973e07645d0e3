//! Bound literals and raw filter values.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A typed literal bound to a placeholder in a compiled predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

/// An untyped value as submitted by the admin UI.
///
/// Scalars arrive as strings; range operators send a sequence. Numbers and
/// booleans in the JSON payload are accepted and kept in their textual form,
/// and `null` or a missing value is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum RawValue {
    /// A single token.
    Scalar(String),
    /// A sequence of tokens.
    List(Vec<String>),
}

impl RawValue {
    /// The scalar token, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// Blank means empty or whitespace-only; a list is blank when it is empty.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Scalar(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    /// Check whether this scalar equals `token`.
    pub fn is_token(&self, token: &str) -> bool {
        self.as_scalar() == Some(token)
    }

    /// All tokens, wrapping a scalar in a one-element slice.
    pub fn tokens(&self) -> &[String] {
        match self {
            Self::Scalar(s) => std::slice::from_ref(s),
            Self::List(items) => items,
        }
    }
}

impl Default for RawValue {
    fn default() -> Self {
        Self::Scalar(String::new())
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Scalar(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Scalar(v)
    }
}

impl<S: Into<String>> From<Vec<S>> for RawValue {
    fn from(v: Vec<S>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;

        fn token(v: Value) -> String {
            match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
            }
        }

        match v {
            Value::Array(items) => Self::List(items.into_iter().map(token).collect()),
            other => Self::Scalar(token(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_filter_value_from() {
        assert_eq!(FilterValue::from(42i32), FilterValue::Int(42));
        assert_eq!(FilterValue::from("hello"), FilterValue::String("hello".to_string()));
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));
    }

    #[test]
    fn test_raw_value_from_json() {
        assert_eq!(RawValue::from(json!("ann")), RawValue::from("ann"));
        assert_eq!(RawValue::from(json!(18)), RawValue::from("18"));
        assert_eq!(RawValue::from(json!(null)), RawValue::default());
        assert_eq!(
            RawValue::from(json!(["18", 65])),
            RawValue::from(vec!["18", "65"])
        );
    }

    #[test]
    fn test_raw_value_blank() {
        assert!(RawValue::default().is_blank());
        assert!(RawValue::from("   ").is_blank());
        assert!(RawValue::List(vec![]).is_blank());
        assert!(!RawValue::from(vec![""]).is_blank());
        assert!(!RawValue::from("x").is_blank());
    }

    #[test]
    fn test_raw_value_tokens() {
        assert_eq!(RawValue::from("a").tokens(), ["a".to_string()]);
        assert_eq!(RawValue::from(vec!["a", "b"]).tokens().len(), 2);
        assert!(RawValue::from("_null").is_token("_null"));
        assert!(!RawValue::from(vec!["_null"]).is_token("_null"));
    }
}
