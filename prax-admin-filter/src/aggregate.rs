//! Combining column predicates into one OR-group per clause.

use indexmap::IndexSet;
use smol_str::SmolStr;
use tracing::trace;

use crate::catalog::FieldCatalog;
use crate::column::TypeTag;
use crate::compiler::{Dropped, PredicateCompiler, parse_integer};
use crate::config::CompileMode;
use crate::descriptor::FilterClause;
use crate::error::{FilterError, FilterResult};
use crate::range::RangeResolver;
use crate::sql::{CompiledFragment, FragmentBuilder};
use crate::value::{FilterValue, RawValue};

/// The alternatives of one clause; any one of them satisfies it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrGroup {
    alternatives: Vec<CompiledFragment>,
}

impl OrGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alternative.
    pub fn push(&mut self, fragment: CompiledFragment) {
        self.alternatives.push(fragment);
    }

    /// The alternatives, in catalog order.
    pub fn alternatives(&self) -> &[CompiledFragment] {
        &self.alternatives
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// An empty group constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Tables referenced by any alternative, deduplicated.
    pub fn referenced_tables(&self) -> IndexSet<SmolStr> {
        self.alternatives
            .iter()
            .flat_map(CompiledFragment::referenced_tables)
            .map(SmolStr::new)
            .collect()
    }

    /// Join the alternatives with OR. `None` when the group is empty.
    pub fn into_fragment(self) -> Option<CompiledFragment> {
        CompiledFragment::any(self.alternatives)
    }
}

impl FromIterator<CompiledFragment> for OrGroup {
    fn from_iter<I: IntoIterator<Item = CompiledFragment>>(iter: I) -> Self {
        Self {
            alternatives: iter.into_iter().collect(),
        }
    }
}

/// Turns clauses into OR-groups using the catalog and the compiler.
#[derive(Debug, Clone)]
pub struct ClauseAggregator<C, R> {
    catalog: C,
    compiler: PredicateCompiler<R>,
}

impl<C: FieldCatalog, R: RangeResolver> ClauseAggregator<C, R> {
    /// Create a new aggregator.
    pub fn new(catalog: C, compiler: PredicateCompiler<R>) -> Self {
        Self { catalog, compiler }
    }

    /// The compiler in use.
    pub fn compiler(&self) -> &PredicateCompiler<R> {
        &self.compiler
    }

    /// Build the OR-group for a clause.
    pub fn aggregate(&self, clause: &FilterClause) -> FilterResult<OrGroup> {
        match clause {
            FilterClause::Query(text) => self.query_group(text),
            FilterClause::Field {
                field,
                operator,
                value,
            } => self.field_group(field, operator, value),
        }
    }

    /// One group over every column of every queryable field, each compiled
    /// with its field's default operator.
    ///
    /// Free-text queries never fail in strict mode: most columns cannot
    /// match arbitrary text and are expected to drop out.
    pub fn query_group(&self, text: &str) -> FilterResult<OrGroup> {
        let value = RawValue::from(text);
        let mut group = OrGroup::new();
        for field in self.catalog.queryable_fields()? {
            for column in field.searchable_columns() {
                if let Some(fragment) = self.compiler.compile(column, field.default_operator(), &value) {
                    group.push(fragment);
                }
            }
        }
        Ok(group)
    }

    /// The group for one structured filter: the field's columns are
    /// alternatives of each other.
    ///
    /// An unknown field is an empty group, or [`FilterError::UnknownField`]
    /// in strict mode.
    pub fn field_group(&self, field_name: &str, operator: &str, value: &RawValue) -> FilterResult<OrGroup> {
        let strict = self.compiler.mode() == CompileMode::Strict;
        let Some(field) = self.catalog.lookup(field_name)? else {
            trace!(field = field_name, "unknown filter field");
            if strict {
                return Err(FilterError::UnknownField {
                    field: field_name.to_string(),
                });
            }
            return Ok(OrGroup::new());
        };

        let mut group = OrGroup::new();
        let mut rejection: Option<(Dropped, usize)> = None;
        for (i, column) in field.searchable_columns().iter().enumerate() {
            match self.compiler.try_compile(column, operator, value) {
                Ok(fragment) => group.push(fragment),
                Err(reason) if !reason.is_benign() && rejection.is_none() => {
                    rejection = Some((reason, i));
                }
                Err(_) => {}
            }
        }

        if strict && group.is_empty() {
            if let Some((reason, i)) = rejection {
                return Err(reason.into_error(&field.searchable_columns()[i], operator));
            }
        }
        Ok(group)
    }

    /// Restrict to a set of primary keys.
    ///
    /// Integer keys must round-trip; others are bound as strings. Ids that
    /// do not parse are skipped. When none are left the group matches no
    /// row: a selection never widens to the whole table.
    pub fn bulk_ids_group(&self, ids: &RawValue) -> FilterResult<OrGroup> {
        let primary_key = self.catalog.primary_key()?;
        let values: Vec<FilterValue> = ids
            .tokens()
            .iter()
            .filter(|id| !id.trim().is_empty())
            .filter_map(|id| match primary_key.declared_type() {
                TypeTag::Integer => parse_integer(id).map(FilterValue::Int),
                _ => Some(FilterValue::String(id.clone())),
            })
            .collect();

        let mut b = FragmentBuilder::new();
        if values.is_empty() {
            trace!(ids = ids.tokens().len(), "no usable bulk ids");
            b.push("(1 = 0)");
        } else {
            b.push("(").push_column(&primary_key).push(" IN (").push_params(values).push("))");
        }
        Ok(std::iter::once(b.build()).collect())
    }
}
