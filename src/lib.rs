//! # Prax Admin
//!
//! Filter and search scopes for generic admin panels built on Prax.
//!
//! An admin list view lets its user type a free-text query, stack
//! structured filters on individual fields and narrow to a handful of
//! selected records. This crate turns that request into a parameterized SQL
//! condition for PostgreSQL, MySQL or SQLite.
//!
//! ## Quick Start
//!
//! ```rust
//! use prax_admin::prelude::*;
//!
//! let catalog = StaticCatalog::new()
//!     .field(FieldSpec::column("email", TypeTag::String))
//!     .field(FieldSpec::column("signed_up", TypeTag::Date).queryable(false));
//!
//! let config = AdminConfig::from_str(
//!     r#"
//!     [filter]
//!     dialect = "sqlite"
//!     "#,
//! )
//! .unwrap();
//! let pipeline = FilterPipeline::from_config(&config.filter, catalog);
//!
//! let request = FilterRequest::new()
//!     .with_query("@example.com")
//!     .with_filter("signed_up", "_not_null", "");
//! let (sql, params) = pipeline.to_sql_scope(&request).unwrap().where_clause();
//!
//! assert_eq!(sql, " WHERE (LOWER(email) LIKE ?) AND (signed_up IS NOT NULL)");
//! assert_eq!(params.len(), 1);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Filter compilation.
pub mod filter {
    pub use prax_admin_filter::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use prax_admin_filter::{
        AdminConfig, ColumnDescriptor, CompileMode, FieldCatalog, FieldSpec, FilterConfig,
        FilterError, FilterPipeline, FilterRequest, FilterValue, PreparedScope, SqlScope,
        StaticCatalog, TypeTag,
    };
}

// Re-export key types at the crate root
pub use prax_admin_filter::{AdminConfig, FilterError, FilterPipeline, FilterRequest, logging};
