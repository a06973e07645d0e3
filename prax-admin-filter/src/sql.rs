//! SQL generation utilities.
//!
//! Predicates are assembled from trusted text (column paths from the catalog
//! and fixed keywords) and bound values. The two never mix: a fragment keeps
//! the text between placeholders in separate segments, so there is no way to
//! splice a value into the SQL string.

use std::borrow::Cow;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::column::ColumnDescriptor;
use crate::value::FilterValue;

/// The SQL dialect of the downstream store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    #[serde(alias = "postgres")]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    #[serde(alias = "sqlite3")]
    SQLite,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> Cow<'static, str> {
        match self {
            Self::PostgreSQL => Cow::Owned(format!("${}", index)),
            Self::MySQL | Self::SQLite => Cow::Borrowed("?"),
        }
    }

    /// The case-insensitive match operator.
    ///
    /// PostgreSQL has `ILIKE`; elsewhere `LIKE` against a lower-cased column
    /// and value does the same job.
    pub fn like_operator(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "ILIKE",
            Self::MySQL | Self::SQLite => "LIKE",
        }
    }

    /// Get the dialect name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }
}

/// A compiled, parameterized boolean predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFragment {
    /// SQL text between placeholders; always one longer than `params`.
    parts: Vec<String>,
    params: Vec<FilterValue>,
    tables: IndexSet<SmolStr>,
}

impl CompiledFragment {
    /// The SQL template with positional `?` placeholders.
    pub fn template(&self) -> String {
        self.parts.join("?")
    }

    /// The values bound to the placeholders, in order.
    pub fn params(&self) -> &[FilterValue] {
        &self.params
    }

    /// Tables named by qualified columns in this fragment.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(SmolStr::as_str)
    }

    /// Render the template for a dialect, numbering placeholders after
    /// `param_offset` already-bound values.
    pub fn render(&self, db_type: DatabaseType, param_offset: usize) -> String {
        let mut sql = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                sql.push_str(&db_type.placeholder(param_offset + i));
            }
            sql.push_str(part);
        }
        sql
    }

    /// Combine fragments with OR.
    ///
    /// Returns `None` for an empty input. A single fragment is returned
    /// unchanged; several are joined and wrapped in parentheses.
    pub fn any(fragments: impl IntoIterator<Item = CompiledFragment>) -> Option<Self> {
        let mut fragments = fragments.into_iter();
        let first = fragments.next()?;
        let Some(second) = fragments.next() else {
            return Some(first);
        };

        let mut builder = FragmentBuilder::new();
        builder.push("(");
        builder.append(first);
        for fragment in std::iter::once(second).chain(fragments) {
            builder.push(" OR ");
            builder.append(fragment);
        }
        builder.push(")");
        Some(builder.build())
    }
}

/// A builder for predicate fragments.
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    parts: Vec<String>,
    params: Vec<FilterValue>,
    tables: IndexSet<SmolStr>,
}

impl FragmentBuilder {
    /// Create a new fragment builder.
    pub fn new() -> Self {
        Self {
            parts: vec![String::new()],
            params: Vec::new(),
            tables: IndexSet::new(),
        }
    }

    /// Push a literal SQL string.
    ///
    /// Only fixed keywords belong here; values go through [`push_param`].
    ///
    /// [`push_param`]: FragmentBuilder::push_param
    pub fn push(&mut self, sql: &'static str) -> &mut Self {
        self.tail().push_str(sql);
        self
    }

    /// Push a column path and record the table it references.
    pub fn push_column(&mut self, column: &ColumnDescriptor) -> &mut Self {
        if let Some(table) = column.table() {
            self.tables.insert(SmolStr::new(table));
        }
        self.tail().push_str(column.path());
        self
    }

    /// Push a column path wrapped in `LOWER(...)`.
    pub fn push_lower_column(&mut self, column: &ColumnDescriptor) -> &mut Self {
        self.push("LOWER(").push_column(column).push(")")
    }

    /// Push a placeholder bound to `value`.
    pub fn push_param(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.params.push(value.into());
        self.parts.push(String::new());
        self
    }

    /// Push placeholders for each value, separated by `, `.
    pub fn push_params(&mut self, values: impl IntoIterator<Item = FilterValue>) -> &mut Self {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_param(value);
        }
        self
    }

    /// Append a whole fragment, placeholders and tables included.
    pub fn append(&mut self, fragment: CompiledFragment) -> &mut Self {
        let mut parts = fragment.parts.into_iter();
        if let Some(head) = parts.next() {
            self.tail().push_str(&head);
        }
        self.parts.extend(parts);
        self.params.extend(fragment.params);
        self.tables.extend(fragment.tables);
        self
    }

    /// Build the fragment.
    pub fn build(self) -> CompiledFragment {
        CompiledFragment {
            parts: self.parts,
            params: self.params,
            tables: self.tables,
        }
    }

    fn tail(&mut self) -> &mut String {
        if self.parts.is_empty() {
            self.parts.push(String::new());
        }
        let last = self.parts.len() - 1;
        &mut self.parts[last]
    }
}

impl Default for FragmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
