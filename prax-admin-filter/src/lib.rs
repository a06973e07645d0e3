//! # prax-admin-filter
//!
//! Compiles admin list-view filters into parameterized SQL predicates.
//!
//! A list request carries a free-text query, structured per-field filters
//! and an optional set of primary keys. Each becomes one OR-group of
//! column predicates; the groups are AND-folded into a query scope:
//!
//! - [`PredicateCompiler`] turns one column, operator and raw value into a
//!   [`CompiledFragment`], or drops the column
//! - [`ClauseAggregator`] gathers the alternatives of one clause from a
//!   [`FieldCatalog`]
//! - [`ScopeComposer`] folds groups into any [`PreparedScope`] and requests
//!   the joins the surviving predicates need
//! - [`FilterPipeline`] runs a whole [`FilterRequest`]
//!
//! ## Filtering a scope
//!
//! ```rust
//! use prax_admin_filter::{
//!     ColumnDescriptor, FieldSpec, FilterConfig, FilterPipeline, FilterRequest, FilterValue,
//!     StaticCatalog, TypeTag,
//! };
//!
//! let catalog = StaticCatalog::new()
//!     .field(FieldSpec::column("name", TypeTag::String))
//!     .field(
//!         FieldSpec::new("team", TypeTag::BelongsToAssociation)
//!             .searchable(ColumnDescriptor::new("teams.name", TypeTag::String)),
//!     );
//! let pipeline = FilterPipeline::from_config(&FilterConfig::default(), catalog);
//!
//! let request = FilterRequest::new()
//!     .with_filter("name", "starts_with", "Ann")
//!     .with_filter("team", "is", "reds");
//! let scope = pipeline.to_sql_scope(&request).unwrap();
//!
//! let (sql, params) = scope.to_sql();
//! assert_eq!(sql, "(LOWER(name) ILIKE $1) AND (LOWER(teams.name) ILIKE $2)");
//! assert_eq!(params, [FilterValue::from("ann%"), FilterValue::from("reds")]);
//! assert_eq!(scope.joins().collect::<Vec<_>>(), ["teams"]);
//! ```
//!
//! ## Compiling a single column
//!
//! ```rust
//! use prax_admin_filter::{
//!     CalendarRangeResolver, ColumnDescriptor, DatabaseType, PredicateCompiler, RawValue, TypeTag,
//! };
//!
//! let compiler = PredicateCompiler::new(DatabaseType::MySQL, CalendarRangeResolver::default());
//! let column = ColumnDescriptor::new("players.retired", TypeTag::Boolean);
//!
//! let fragment = compiler.compile(&column, "default", &RawValue::from("false")).unwrap();
//! assert_eq!(
//!     fragment.render(DatabaseType::MySQL, 0),
//!     "(players.retired IS NULL OR players.retired = ?)"
//! );
//!
//! // A value the column cannot use contributes nothing.
//! assert!(compiler.compile(&column, "default", &RawValue::from("maybe")).is_none());
//! ```
//!
//! ## Strict mode
//!
//! Malformed input is skipped silently by default. With
//! [`CompileMode::Strict`], structured filters that produce nothing fail
//! with a [`FilterError`] diagnostic instead:
//!
//! ```rust
//! use prax_admin_filter::{
//!     CompileMode, FieldSpec, FilterConfig, FilterError, FilterPipeline, FilterRequest,
//!     StaticCatalog, TypeTag,
//! };
//!
//! let config = FilterConfig::default().with_mode(CompileMode::Strict);
//! let catalog = StaticCatalog::new().field(FieldSpec::column("age", TypeTag::Integer));
//! let pipeline = FilterPipeline::from_config(&config, catalog);
//!
//! let err = pipeline
//!     .to_sql_scope(&FilterRequest::new().with_filter("age", "default", "forty"))
//!     .unwrap_err();
//! assert!(matches!(err, FilterError::InvalidValue { .. }));
//! ```

pub mod aggregate;
pub mod catalog;
pub mod column;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod range;
pub mod scope;
pub mod sentinel;
pub mod sql;
pub mod value;

pub use aggregate::{ClauseAggregator, OrGroup};
pub use catalog::{DEFAULT_OPERATOR, FieldCatalog, FieldSpec, StaticCatalog};
pub use column::{ColumnDescriptor, DISABLED_COLUMN_TYPES, TypeTag};
pub use compiler::{CompileResult, Dropped, PredicateCompiler};
pub use config::{AdminConfig, CompileMode, FilterConfig};
pub use descriptor::{FilterClause, FilterDescriptor, FilterDump, FilterRequest, parse_filters};
pub use error::{FilterError, FilterResult};
pub use pipeline::FilterPipeline;
pub use range::{CalendarRangeResolver, DEFAULT_DATE_FORMAT, DateRange, RangeResolver};
pub use scope::{PreparedScope, ScopeComposer, SqlScope};
pub use sentinel::Sentinel;
pub use sql::{CompiledFragment, DatabaseType, FragmentBuilder};
pub use value::{FilterValue, RawValue};
