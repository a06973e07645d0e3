//! Error types for filter compilation.
//!
//! Malformed filter input is not an error in the default lenient mode: it
//! compiles to "no predicate" and the clause is skipped. The variants below
//! cover configuration loading, failures of the external collaborators, and
//! the diagnostics surfaced when [`CompileMode::Strict`] is selected.
//!
//! [`CompileMode::Strict`]: crate::config::CompileMode::Strict

// The fields are read by the derive macros.
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while building a filtered scope.
#[derive(Error, Debug, Diagnostic)]
pub enum FilterError {
    /// Error reading a configuration file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(prax_admin::filter::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing TOML configuration.
    #[error("failed to parse filter configuration")]
    #[diagnostic(code(prax_admin::filter::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// The field catalog could not answer a lookup.
    #[error("field catalog unavailable: {message}")]
    #[diagnostic(code(prax_admin::filter::catalog))]
    Catalog { message: String },

    /// The prepared scope rejected an appended predicate or join.
    #[error("scope rejected update: {message}")]
    #[diagnostic(code(prax_admin::filter::scope))]
    Scope { message: String },

    /// A structured filter named a field that is not filterable.
    #[error("unknown filter field `{field}`")]
    #[diagnostic(
        code(prax_admin::filter::unknown_field),
        help("only fields marked filterable in the catalog accept structured filters")
    )]
    UnknownField { field: String },

    /// A value could not be interpreted for the column type.
    #[error("invalid value for `{column}`: {message}")]
    #[diagnostic(code(prax_admin::filter::invalid_value))]
    InvalidValue { column: String, message: String },

    /// The operator is not recognized for the column type.
    #[error("operator `{operator}` is not supported for `{column}`")]
    #[diagnostic(code(prax_admin::filter::unsupported_operator))]
    UnsupportedOperator { column: String, operator: String },

    /// A list value was given to an operator that expects a scalar.
    #[error("operator `{operator}` on `{column}` expects a single value")]
    #[diagnostic(
        code(prax_admin::filter::ambiguous_value),
        help("use the `between` operator for ranges")
    )]
    AmbiguousValue { column: String, operator: String },
}

impl FilterError {
    /// Create a catalog failure.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a scope failure.
    pub fn scope(message: impl Into<String>) -> Self {
        Self::Scope {
            message: message.into(),
        }
    }

    /// Check whether this error comes from an external collaborator.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Catalog { .. } | Self::Scope { .. })
    }

    /// Check whether this error is a strict-mode input diagnostic.
    pub fn is_input_diagnostic(&self) -> bool {
        matches!(
            self,
            Self::UnknownField { .. }
                | Self::InvalidValue { .. }
                | Self::UnsupportedOperator { .. }
                | Self::AmbiguousValue { .. }
        )
    }
}
