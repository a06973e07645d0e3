//! Folding OR-groups into the request's query scope.

use indexmap::IndexSet;
use smol_str::SmolStr;
use tracing::debug;

use crate::aggregate::OrGroup;
use crate::error::FilterResult;
use crate::sql::{CompiledFragment, DatabaseType};
use crate::value::FilterValue;

/// The downstream query scope.
///
/// Predicates appended with [`and_where`] combine with AND. Errors mean the
/// scope itself failed; they are propagated untouched.
///
/// [`and_where`]: PreparedScope::and_where
pub trait PreparedScope {
    /// Narrow the scope by a predicate.
    fn and_where(&mut self, predicate: CompiledFragment) -> FilterResult<()>;

    /// Ensure the given tables are joined.
    fn references(&mut self, tables: &[&str]) -> FilterResult<()>;
}

impl<S: PreparedScope + ?Sized> PreparedScope for &mut S {
    fn and_where(&mut self, predicate: CompiledFragment) -> FilterResult<()> {
        (**self).and_where(predicate)
    }

    fn references(&mut self, tables: &[&str]) -> FilterResult<()> {
        (**self).references(tables)
    }
}

/// Threads a scope through clause-by-clause narrowing.
///
/// ```rust
/// use prax_admin_filter::{OrGroup, ScopeComposer, SqlScope};
///
/// let scope = ScopeComposer::new(SqlScope::postgres())
///     .fold(OrGroup::new())
///     .and_then(ScopeComposer::finish)
///     .unwrap();
/// assert!(scope.is_unfiltered());
/// ```
#[derive(Debug)]
pub struct ScopeComposer<S> {
    scope: S,
    tables: IndexSet<SmolStr>,
    folded: usize,
}

impl<S: PreparedScope> ScopeComposer<S> {
    /// Start composing onto `scope`.
    pub fn new(scope: S) -> Self {
        Self {
            scope,
            tables: IndexSet::new(),
            folded: 0,
        }
    }

    /// AND-fold one group into the scope.
    ///
    /// An empty group leaves the scope untouched, as though its clause had
    /// not been given.
    pub fn fold(mut self, group: OrGroup) -> FilterResult<Self> {
        if group.is_empty() {
            debug!("skipping empty filter group");
            return Ok(self);
        }

        self.tables.extend(group.referenced_tables());
        let alternatives = group.len();
        if let Some(fragment) = group.into_fragment() {
            debug!(alternatives, params = fragment.params().len(), "folding filter group");
            self.scope.and_where(fragment)?;
            self.folded += 1;
        }
        Ok(self)
    }

    /// Groups folded so far.
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// Request the joins and hand the scope back.
    pub fn finish(mut self) -> FilterResult<S> {
        if !self.tables.is_empty() {
            let tables: Vec<&str> = self.tables.iter().map(SmolStr::as_str).collect();
            debug!(?tables, "requesting joins");
            self.scope.references(&tables)?;
        }
        Ok(self.scope)
    }
}

/// A scope that renders to a SQL `WHERE` condition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlScope {
    db_type: DatabaseType,
    predicates: Vec<CompiledFragment>,
    joins: IndexSet<SmolStr>,
}

impl SqlScope {
    /// Create an unfiltered scope for a dialect.
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            predicates: Vec::new(),
            joins: IndexSet::new(),
        }
    }

    /// Create a PostgreSQL scope.
    pub fn postgres() -> Self {
        Self::new(DatabaseType::PostgreSQL)
    }

    /// Create a MySQL scope.
    pub fn mysql() -> Self {
        Self::new(DatabaseType::MySQL)
    }

    /// Create a SQLite scope.
    pub fn sqlite() -> Self {
        Self::new(DatabaseType::SQLite)
    }

    /// The predicates, in the order they were appended.
    pub fn predicates(&self) -> &[CompiledFragment] {
        &self.predicates
    }

    /// Tables that must be joined, in first-requested order.
    pub fn joins(&self) -> impl Iterator<Item = &str> {
        self.joins.iter().map(SmolStr::as_str)
    }

    /// Check if no predicate was appended.
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render the condition and its parameters. An unfiltered scope renders
    /// as `TRUE`.
    pub fn to_sql(&self) -> (String, Vec<FilterValue>) {
        if self.predicates.is_empty() {
            return ("TRUE".to_string(), Vec::new());
        }

        let mut params = Vec::new();
        let parts: Vec<_> = self
            .predicates
            .iter()
            .map(|p| {
                let sql = p.render(self.db_type, params.len());
                params.extend_from_slice(p.params());
                sql
            })
            .collect();
        (parts.join(" AND "), params)
    }

    /// Render a full `WHERE` clause, or an empty string when unfiltered.
    pub fn where_clause(&self) -> (String, Vec<FilterValue>) {
        if self.predicates.is_empty() {
            return (String::new(), Vec::new());
        }
        let (sql, params) = self.to_sql();
        (format!(" WHERE {}", sql), params)
    }
}

impl PreparedScope for SqlScope {
    fn and_where(&mut self, predicate: CompiledFragment) -> FilterResult<()> {
        self.predicates.push(predicate);
        Ok(())
    }

    fn references(&mut self, tables: &[&str]) -> FilterResult<()> {
        self.joins.extend(tables.iter().map(|t| SmolStr::new(t)));
        Ok(())
    }
}
