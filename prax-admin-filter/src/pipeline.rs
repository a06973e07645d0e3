//! End-to-end application of a filter request to a scope.

use tracing::debug;

use crate::aggregate::ClauseAggregator;
use crate::catalog::FieldCatalog;
use crate::compiler::PredicateCompiler;
use crate::config::FilterConfig;
use crate::descriptor::{FilterClause, FilterRequest};
use crate::error::FilterResult;
use crate::range::{CalendarRangeResolver, RangeResolver};
use crate::scope::{PreparedScope, ScopeComposer, SqlScope};

/// Applies filter requests against one model's catalog.
///
/// ```rust
/// use prax_admin_filter::{
///     FieldSpec, FilterConfig, FilterPipeline, FilterRequest, SqlScope, StaticCatalog, TypeTag,
/// };
///
/// let catalog = StaticCatalog::new()
///     .field(FieldSpec::column("name", TypeTag::String))
///     .field(FieldSpec::column("age", TypeTag::Integer));
/// let pipeline = FilterPipeline::from_config(&FilterConfig::default(), catalog);
///
/// let request = FilterRequest::new().with_filter("age", "between", vec!["18", "65"]);
/// let scope = pipeline.apply(SqlScope::postgres(), &request).unwrap();
/// assert_eq!(scope.to_sql().0, "(age BETWEEN $1 AND $2)");
/// ```
#[derive(Debug, Clone)]
pub struct FilterPipeline<C, R = CalendarRangeResolver> {
    aggregator: ClauseAggregator<C, R>,
    default_operator: String,
}

impl<C: FieldCatalog> FilterPipeline<C> {
    /// Build a pipeline from configuration.
    pub fn from_config(config: &FilterConfig, catalog: C) -> Self {
        let compiler = PredicateCompiler::new(config.dialect, config.range_resolver()).with_mode(config.mode);
        Self::new(compiler, catalog).with_default_operator(config.default_operator.clone())
    }
}

impl<C: FieldCatalog, R: RangeResolver> FilterPipeline<C, R> {
    /// Create a pipeline from a compiler and a catalog.
    pub fn new(compiler: PredicateCompiler<R>, catalog: C) -> Self {
        Self {
            aggregator: ClauseAggregator::new(catalog, compiler),
            default_operator: crate::catalog::DEFAULT_OPERATOR.to_string(),
        }
    }

    /// Set the operator given to structured filters that carry none.
    pub fn with_default_operator(mut self, operator: impl Into<String>) -> Self {
        self.default_operator = operator.into();
        self
    }

    /// Narrow `scope` by everything `request` asks for.
    ///
    /// Bulk ids fold first, then the free-text query, then each structured
    /// filter in submission order.
    pub fn apply<S: PreparedScope>(&self, scope: S, request: &FilterRequest) -> FilterResult<S> {
        let mut composer = ScopeComposer::new(scope);
        if let Some(ids) = &request.bulk_ids {
            composer = composer.fold(self.aggregator.bulk_ids_group(ids)?)?;
        }
        let composer = self.fold_clauses(composer, &request.clauses(&self.default_operator))?;
        debug!(groups = composer.folded(), "filter request applied");
        composer.finish()
    }

    /// Narrow `scope` by a list of clauses.
    pub fn apply_clauses<S: PreparedScope>(&self, scope: S, clauses: &[FilterClause]) -> FilterResult<S> {
        self.fold_clauses(ScopeComposer::new(scope), clauses)?.finish()
    }

    /// Apply `request` to a fresh [`SqlScope`] of the compiler's dialect.
    pub fn to_sql_scope(&self, request: &FilterRequest) -> FilterResult<SqlScope> {
        self.apply(SqlScope::new(self.aggregator.compiler().db_type()), request)
    }

    fn fold_clauses<S: PreparedScope>(
        &self,
        composer: ScopeComposer<S>,
        clauses: &[FilterClause],
    ) -> FilterResult<ScopeComposer<S>> {
        clauses.iter().try_fold(composer, |composer, clause| {
            composer.fold(self.aggregator.aggregate(clause)?)
        })
    }
}
