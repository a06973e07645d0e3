//! Field metadata consumed by the compiler.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::trace;

use crate::column::{ColumnDescriptor, TypeTag};
use crate::error::FilterResult;

/// Operator used when a filter gives none.
pub const DEFAULT_OPERATOR: &str = "default";

/// A logical field of an admin list view.
///
/// Deserialized specs go through [`FieldSpec::searchable`] too, so
/// unsearchable columns never survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldSpecDef")]
pub struct FieldSpec {
    name: SmolStr,
    declared_type: TypeTag,
    search_operator: SmolStr,
    searchable_columns: Vec<ColumnDescriptor>,
    queryable: bool,
    filterable: bool,
}

/// Wire form of [`FieldSpec`].
#[derive(Deserialize)]
struct FieldSpecDef {
    name: SmolStr,
    declared_type: TypeTag,
    #[serde(default = "default_operator")]
    search_operator: SmolStr,
    #[serde(default)]
    searchable_columns: Vec<ColumnDescriptor>,
    #[serde(default = "default_true")]
    queryable: bool,
    #[serde(default = "default_true")]
    filterable: bool,
}

impl From<FieldSpecDef> for FieldSpec {
    fn from(def: FieldSpecDef) -> Self {
        def.searchable_columns
            .into_iter()
            .fold(FieldSpec::new(def.name, def.declared_type), FieldSpec::searchable)
            .search_operator(def.search_operator)
            .queryable(def.queryable)
            .filterable(def.filterable)
    }
}

fn default_operator() -> SmolStr {
    SmolStr::new_static(DEFAULT_OPERATOR)
}

fn default_true() -> bool {
    true
}

impl FieldSpec {
    /// Create a field with no searchable columns.
    pub fn new(name: impl Into<SmolStr>, declared_type: TypeTag) -> Self {
        Self {
            name: name.into(),
            declared_type,
            search_operator: default_operator(),
            searchable_columns: Vec::new(),
            queryable: true,
            filterable: true,
        }
    }

    /// Create a field searched through its own column.
    pub fn column(name: impl Into<SmolStr>, declared_type: TypeTag) -> Self {
        let name = name.into();
        let column = ColumnDescriptor::new(name.clone(), declared_type);
        Self::new(name, declared_type).searchable(column)
    }

    /// Add a searchable column.
    ///
    /// Columns whose type filters cannot search are skipped.
    pub fn searchable(mut self, column: ColumnDescriptor) -> Self {
        if column.declared_type().is_searchable() {
            self.searchable_columns.push(column);
        } else {
            trace!(field = %self.name, column = %column, "skipping unsearchable column");
        }
        self
    }

    /// Set the operator used for free-text queries.
    pub fn search_operator(mut self, operator: impl Into<SmolStr>) -> Self {
        self.search_operator = operator.into();
        self
    }

    /// Include or exclude the field from free-text queries.
    pub fn queryable(mut self, queryable: bool) -> Self {
        self.queryable = queryable;
        self
    }

    /// Include or exclude the field from structured filters.
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type of the field.
    pub fn declared_type(&self) -> TypeTag {
        self.declared_type
    }

    /// The operator used for free-text queries.
    pub fn default_operator(&self) -> &str {
        &self.search_operator
    }

    /// The columns searched for this field, alternatives of one another.
    pub fn searchable_columns(&self) -> &[ColumnDescriptor] {
        &self.searchable_columns
    }

    /// Whether free-text queries search this field.
    pub fn is_queryable(&self) -> bool {
        self.queryable
    }

    /// Whether structured filters may target this field.
    pub fn is_filterable(&self) -> bool {
        self.filterable
    }
}

/// Source of field metadata.
///
/// Errors mean the catalog itself is unavailable; an unknown field is
/// `Ok(None)`.
pub trait FieldCatalog {
    /// Look up a filterable field by name.
    fn lookup(&self, field_name: &str) -> FilterResult<Option<FieldSpec>>;

    /// All fields searched by free-text queries, in display order.
    fn queryable_fields(&self) -> FilterResult<Vec<FieldSpec>>;

    /// The primary key column.
    fn primary_key(&self) -> FilterResult<ColumnDescriptor> {
        Ok(ColumnDescriptor::new("id", TypeTag::Integer))
    }
}

impl<C: FieldCatalog + ?Sized> FieldCatalog for &C {
    fn lookup(&self, field_name: &str) -> FilterResult<Option<FieldSpec>> {
        (**self).lookup(field_name)
    }

    fn queryable_fields(&self) -> FilterResult<Vec<FieldSpec>> {
        (**self).queryable_fields()
    }

    fn primary_key(&self) -> FilterResult<ColumnDescriptor> {
        (**self).primary_key()
    }
}

/// An in-memory catalog built once from model metadata.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    fields: IndexMap<SmolStr, FieldSpec>,
    primary_key: Option<ColumnDescriptor>,
}

impl StaticCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any field of the same name.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Set the primary key column.
    pub fn with_primary_key(mut self, column: ColumnDescriptor) -> Self {
        self.primary_key = Some(column);
        self
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the catalog has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<FieldSpec> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::field)
    }
}

impl FieldCatalog for StaticCatalog {
    fn lookup(&self, field_name: &str) -> FilterResult<Option<FieldSpec>> {
        Ok(self
            .fields
            .get(field_name)
            .filter(|field| field.filterable)
            .cloned())
    }

    fn queryable_fields(&self) -> FilterResult<Vec<FieldSpec>> {
        Ok(self
            .fields
            .values()
            .filter(|field| field.queryable)
            .cloned()
            .collect())
    }

    fn primary_key(&self) -> FilterResult<ColumnDescriptor> {
        Ok(self
            .primary_key
            .clone()
            .unwrap_or_else(|| ColumnDescriptor::new("id", TypeTag::Integer)))
    }
}
