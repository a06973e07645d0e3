//! Per-column predicate compilation.
//!
//! [`PredicateCompiler::compile`] turns one column, operator and raw value
//! into at most one parameterized predicate. Input it cannot interpret is
//! not an error: the column simply contributes nothing. The reason is kept
//! in [`Dropped`] so that strict mode can report it.

use std::fmt;

use tracing::trace;

use crate::column::{ColumnDescriptor, TypeTag};
use crate::config::CompileMode;
use crate::error::FilterError;
use crate::range::{self, RangeResolver, range_bound, range_elements};
use crate::sentinel::Sentinel;
use crate::sql::{CompiledFragment, DatabaseType, FragmentBuilder};
use crate::value::{FilterValue, RawValue};

/// Why a column produced no predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dropped {
    /// The operator or value was `_discard`.
    Discarded,
    /// No value was given.
    Blank,
    /// The value does not parse for the column type.
    Unparseable,
    /// The operator means nothing for the column type.
    UnsupportedOperator,
    /// The column type cannot be filtered.
    UnsupportedType,
    /// A list was given where a single value is expected.
    AmbiguousValue,
}

impl Dropped {
    /// Benign drops mean "nothing was asked", not "something was wrong".
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Discarded | Self::Blank)
    }

    /// Convert to the strict-mode diagnostic.
    pub fn into_error(self, column: &ColumnDescriptor, operator: &str) -> FilterError {
        let column_name = column.path().to_string();
        match self {
            Self::UnsupportedOperator => FilterError::UnsupportedOperator {
                column: column_name,
                operator: operator.to_string(),
            },
            Self::AmbiguousValue => FilterError::AmbiguousValue {
                column: column_name,
                operator: operator.to_string(),
            },
            Self::UnsupportedType => FilterError::InvalidValue {
                column: column_name,
                message: format!("{} columns cannot be filtered", column.declared_type()),
            },
            Self::Discarded | Self::Blank | Self::Unparseable => FilterError::InvalidValue {
                column: column_name,
                message: format!("not a valid {} value", column.declared_type()),
            },
        }
    }
}

impl fmt::Display for Dropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Discarded => "discarded",
            Self::Blank => "blank",
            Self::Unparseable => "unparseable",
            Self::UnsupportedOperator => "unsupported operator",
            Self::UnsupportedType => "unsupported type",
            Self::AmbiguousValue => "ambiguous value",
        };
        f.write_str(s)
    }
}

/// Result of compiling one column.
pub type CompileResult = Result<CompiledFragment, Dropped>;

/// Compiles column-level predicates for one dialect.
#[derive(Debug, Clone)]
pub struct PredicateCompiler<R> {
    db_type: DatabaseType,
    mode: CompileMode,
    resolver: R,
}

impl<R: RangeResolver> PredicateCompiler<R> {
    /// Create a lenient compiler.
    pub fn new(db_type: DatabaseType, resolver: R) -> Self {
        Self {
            db_type,
            mode: CompileMode::Lenient,
            resolver,
        }
    }

    /// Set the compile mode.
    pub fn with_mode(mut self, mode: CompileMode) -> Self {
        self.mode = mode;
        self
    }

    /// The dialect predicates are compiled for.
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// The compile mode.
    pub fn mode(&self) -> CompileMode {
        self.mode
    }

    /// Compile a predicate, or `None` when the column contributes nothing.
    pub fn compile(
        &self,
        column: &ColumnDescriptor,
        operator: &str,
        value: &RawValue,
    ) -> Option<CompiledFragment> {
        self.try_compile(column, operator, value).ok()
    }

    /// Compile a predicate, keeping the reason when there is none.
    pub fn try_compile(
        &self,
        column: &ColumnDescriptor,
        operator: &str,
        value: &RawValue,
    ) -> CompileResult {
        let result = self.dispatch(column, operator, value);
        if let Err(reason) = &result {
            trace!(column = %column, operator, %reason, "column dropped");
        }
        result
    }

    fn dispatch(&self, column: &ColumnDescriptor, operator: &str, value: &RawValue) -> CompileResult {
        match Sentinel::classify(operator, value) {
            Sentinel::Discard => return Err(Dropped::Discarded),
            Sentinel::NoSentinel => {}
            sentinel => return sentinel.predicate(column).ok_or(Dropped::Discarded),
        }

        match column.declared_type() {
            TypeTag::Boolean => boolean(column, value),
            TypeTag::Integer | TypeTag::Decimal | TypeTag::Float => {
                self.numeric(column, operator, value)
            }
            TypeTag::BelongsToAssociation => foreign_key(column, value),
            TypeTag::String | TypeTag::Text => self.text(column, operator, value),
            TypeTag::Date => self.temporal(column, operator, value, false),
            TypeTag::Datetime => self.temporal(column, operator, value, true),
            TypeTag::Enum => membership(column, value),
            TypeTag::Serialized | TypeTag::Unsupported => Err(Dropped::UnsupportedType),
        }
    }

    fn numeric(&self, column: &ColumnDescriptor, operator: &str, value: &RawValue) -> CompileResult {
        let tag = column.declared_type();
        match value {
            RawValue::Scalar(s) => {
                if value.is_blank() {
                    return Err(Dropped::Blank);
                }
                let literal = parse_numeric(s, tag).ok_or(Dropped::Unparseable)?;
                Ok(equality(column, literal))
            }
            RawValue::List(_) if operator == "between" => {
                let (begin, end) = range_elements(value).ok_or(Dropped::Unparseable)?;
                let start = parse_numeric(begin, tag);
                let finish = parse_numeric(end, tag);
                range_bound(column, start, finish).ok_or_else(|| {
                    if begin.trim().is_empty() && end.trim().is_empty() {
                        Dropped::Blank
                    } else {
                        Dropped::Unparseable
                    }
                })
            }
            RawValue::List(items) => {
                if items.is_empty() {
                    return Err(Dropped::Blank);
                }
                if self.mode == CompileMode::Strict {
                    return Err(Dropped::AmbiguousValue);
                }
                // Lenient: only the first element is considered.
                let literal = parse_numeric(&items[0], tag).ok_or(Dropped::Unparseable)?;
                Ok(equality(column, literal))
            }
        }
    }

    fn text(&self, column: &ColumnDescriptor, operator: &str, value: &RawValue) -> CompileResult {
        if value.is_blank() {
            return Err(Dropped::Blank);
        }
        let needle = value.as_scalar().ok_or(Dropped::Unparseable)?.to_lowercase();
        let pattern = match operator {
            "default" | "like" => format!("%{}%", needle),
            "starts_with" => format!("{}%", needle),
            "ends_with" => format!("%{}", needle),
            "is" | "=" => needle,
            _ => return Err(Dropped::UnsupportedOperator),
        };

        let mut b = FragmentBuilder::new();
        b.push("(").push_lower_column(column).push(" ");
        b.push(self.db_type.like_operator()).push(" ").push_param(pattern).push(")");
        Ok(b.build())
    }

    fn temporal(
        &self,
        column: &ColumnDescriptor,
        operator: &str,
        value: &RawValue,
        datetime: bool,
    ) -> CompileResult {
        let (start, end) = self.resolver.resolve(operator, value);
        let (start, end) = if datetime {
            (
                start.and_then(range::start_of_day).map(FilterValue::DateTime),
                end.and_then(range::end_of_day).map(FilterValue::DateTime),
            )
        } else {
            (start.map(FilterValue::Date), end.map(FilterValue::Date))
        };

        range_bound(column, start, end).ok_or_else(|| {
            if value.tokens().iter().all(|t| t.trim().is_empty()) {
                Dropped::Blank
            } else {
                Dropped::Unparseable
            }
        })
    }
}

fn equality(column: &ColumnDescriptor, literal: FilterValue) -> CompiledFragment {
    let mut b = FragmentBuilder::new();
    b.push("(").push_column(column).push(" = ").push_param(literal).push(")");
    b.build()
}

fn boolean(column: &ColumnDescriptor, value: &RawValue) -> CompileResult {
    if value.is_blank() {
        return Err(Dropped::Blank);
    }
    let mut b = FragmentBuilder::new();
    match value.as_scalar() {
        Some("false" | "f" | "0") => {
            b.push("(").push_column(column).push(" IS NULL OR ");
            b.push_column(column).push(" = ").push_param(false).push(")");
        }
        Some("true" | "t" | "1") => {
            b.push("(").push_column(column).push(" = ").push_param(true).push(")");
        }
        _ => return Err(Dropped::Unparseable),
    }
    Ok(b.build())
}

fn foreign_key(column: &ColumnDescriptor, value: &RawValue) -> CompileResult {
    if value.is_blank() {
        return Err(Dropped::Blank);
    }
    let id = value
        .as_scalar()
        .and_then(parse_integer)
        .ok_or(Dropped::Unparseable)?;
    Ok(equality(column, FilterValue::Int(id)))
}

fn membership(column: &ColumnDescriptor, value: &RawValue) -> CompileResult {
    if value.is_blank() {
        return Err(Dropped::Blank);
    }
    let values = value.tokens().iter().map(|t| FilterValue::String(t.clone()));

    let mut b = FragmentBuilder::new();
    b.push("(").push_column(column).push(" IN (").push_params(values).push("))");
    Ok(b.build())
}

/// Parse an integer that formats back to exactly the same string.
///
/// Rejects `"12abc"` and `"1,000"`, and also `"007"` and `"+5"`.
pub fn parse_integer(s: &str) -> Option<i64> {
    let v: i64 = s.parse().ok()?;
    (v.to_string() == s).then_some(v)
}

/// Parse a finite float that formats back to exactly the same string.
///
/// Both the shortest form (`"1.5"`, `"42"`) and the form with a trailing
/// `.0` (`"42.0"`) count as round-tripping; `"1.50"` does not.
pub fn parse_float(s: &str) -> Option<f64> {
    let v: f64 = s.parse().ok()?;
    if !v.is_finite() {
        return None;
    }
    (v.to_string() == s || format!("{:?}", v) == s).then_some(v)
}

/// Largest magnitude below which every integer is exactly an `f64`.
const MAX_EXACT_FLOAT_INT: i64 = 1 << 53;

/// Parse a numeric literal for a numeric type tag.
///
/// Integer columns take only integers. Decimal and float columns take
/// either an integer or a float string, bound as a float. Integers beyond
/// 2^53 would bind a different value than was typed and are rejected.
pub fn parse_numeric(s: &str, tag: TypeTag) -> Option<FilterValue> {
    match tag {
        TypeTag::Integer => parse_integer(s).map(FilterValue::Int),
        TypeTag::Decimal | TypeTag::Float => match parse_integer(s) {
            Some(v) if v.unsigned_abs() <= MAX_EXACT_FLOAT_INT as u64 => {
                Some(FilterValue::Float(v as f64))
            }
            Some(_) => None,
            None => parse_float(s).map(FilterValue::Float),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::CalendarRangeResolver;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn compiler() -> PredicateCompiler<CalendarRangeResolver> {
        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        PredicateCompiler::new(
            DatabaseType::PostgreSQL,
            CalendarRangeResolver::default().with_today(today),
        )
    }

    fn col(path: &str, tag: TypeTag) -> ColumnDescriptor {
        ColumnDescriptor::new(path, tag)
    }

    fn compile(tag: TypeTag, operator: &str, value: impl Into<RawValue>) -> CompileResult {
        compiler().try_compile(&col("c", tag), operator, &value.into())
    }

    #[test]
    fn test_round_trip_integer() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-3"), Some(-3));
        assert_eq!(parse_integer("42.0"), None);
        assert_eq!(parse_integer("4a2"), None);
        assert_eq!(parse_integer("007"), None);
        assert_eq!(parse_integer("+5"), None);
        assert_eq!(parse_integer(" 5"), None);
    }

    #[test]
    fn test_round_trip_float() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float("42.0"), Some(42.0));
        assert_eq!(parse_float("1.50"), None);
        assert_eq!(parse_float("12abc"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("inf"), None);
    }

    #[test]
    fn test_integer_scalar() {
        let fragment = compile(TypeTag::Integer, "default", "42").unwrap();
        assert_eq!(fragment.template(), "(c = ?)");
        assert_eq!(fragment.params(), [FilterValue::Int(42)]);

        assert_eq!(compile(TypeTag::Integer, "default", "42.0"), Err(Dropped::Unparseable));
        assert_eq!(compile(TypeTag::Integer, "default", "4a2"), Err(Dropped::Unparseable));
        assert_eq!(compile(TypeTag::Integer, "default", ""), Err(Dropped::Blank));
    }

    #[test]
    fn test_float_scalar() {
        let fragment = compile(TypeTag::Float, "default", "42").unwrap();
        assert_eq!(fragment.params(), [FilterValue::Float(42.0)]);

        let fragment = compile(TypeTag::Decimal, "default", "2.25").unwrap();
        assert_eq!(fragment.params(), [FilterValue::Float(2.25)]);

        assert_eq!(compile(TypeTag::Decimal, "default", "1.50"), Err(Dropped::Unparseable));
    }

    #[test]
    fn test_float_rejects_inexact_integers() {
        assert_eq!(
            parse_numeric("9007199254740992", TypeTag::Decimal),
            Some(FilterValue::Float(9007199254740992.0))
        );
        assert_eq!(
            parse_numeric("-9007199254740992", TypeTag::Float),
            Some(FilterValue::Float(-9007199254740992.0))
        );
        assert_eq!(parse_numeric("9007199254740993", TypeTag::Decimal), None);
        assert_eq!(compile(TypeTag::Float, "default", "9223372036854775807"), Err(Dropped::Unparseable));

        // Integer columns bind the exact value.
        assert_eq!(
            parse_numeric("9007199254740993", TypeTag::Integer),
            Some(FilterValue::Int(9007199254740993))
        );
    }

    #[test]
    fn test_numeric_between() {
        let fragment = compile(TypeTag::Integer, "between", vec!["18", "65"]).unwrap();
        assert_eq!(fragment.template(), "(c BETWEEN ? AND ?)");
        assert_eq!(fragment.params(), [FilterValue::Int(18), FilterValue::Int(65)]);

        let fragment = compile(TypeTag::Integer, "between", vec!["", "18", ""]).unwrap();
        assert_eq!(fragment.template(), "(c >= ?)");

        let fragment = compile(TypeTag::Float, "between", vec!["x", "9.5"]).unwrap();
        assert_eq!(fragment.template(), "(c <= ?)");
        assert_eq!(fragment.params(), [FilterValue::Float(9.5)]);

        assert_eq!(compile(TypeTag::Integer, "between", vec!["", ""]), Err(Dropped::Blank));
        assert_eq!(compile(TypeTag::Integer, "between", vec!["a", "b"]), Err(Dropped::Unparseable));
        assert_eq!(compile(TypeTag::Integer, "between", vec!["1"]), Err(Dropped::Unparseable));
    }

    #[test]
    fn test_numeric_list_without_between() {
        let fragment = compile(TypeTag::Integer, "default", vec!["7", "9"]).unwrap();
        assert_eq!(fragment.template(), "(c = ?)");
        assert_eq!(fragment.params(), [FilterValue::Int(7)]);

        assert_eq!(compile(TypeTag::Integer, "default", vec!["x", "9"]), Err(Dropped::Unparseable));

        let strict = compiler().with_mode(CompileMode::Strict);
        let result = strict.try_compile(&col("c", TypeTag::Integer), "default", &vec!["7", "9"].into());
        assert_eq!(result, Err(Dropped::AmbiguousValue));
    }

    #[test]
    fn test_boolean() {
        let fragment = compile(TypeTag::Boolean, "default", "f").unwrap();
        assert_eq!(fragment.template(), "(c IS NULL OR c = ?)");
        assert_eq!(fragment.params(), [FilterValue::Bool(false)]);

        let fragment = compile(TypeTag::Boolean, "default", "1").unwrap();
        assert_eq!(fragment.template(), "(c = ?)");
        assert_eq!(fragment.params(), [FilterValue::Bool(true)]);

        assert_eq!(compile(TypeTag::Boolean, "default", "yes"), Err(Dropped::Unparseable));
        assert_eq!(compile(TypeTag::Boolean, "default", "TRUE"), Err(Dropped::Unparseable));
    }

    #[test]
    fn test_belongs_to() {
        let fragment = compile(TypeTag::BelongsToAssociation, "default", "12").unwrap();
        assert_eq!(fragment.params(), [FilterValue::Int(12)]);
        assert_eq!(compile(TypeTag::BelongsToAssociation, "default", " "), Err(Dropped::Blank));
        assert_eq!(compile(TypeTag::BelongsToAssociation, "default", "12b"), Err(Dropped::Unparseable));
    }

    #[test]
    fn test_string_operators() {
        let cases = [
            ("default", "%ann%"),
            ("like", "%ann%"),
            ("starts_with", "ann%"),
            ("ends_with", "%ann"),
            ("is", "ann"),
            ("=", "ann"),
        ];
        for (operator, expected) in cases {
            let fragment = compile(TypeTag::String, operator, "Ann").unwrap();
            assert_eq!(fragment.template(), "(LOWER(c) ILIKE ?)");
            assert_eq!(fragment.params(), [FilterValue::String(expected.to_string())]);
        }

        assert_eq!(compile(TypeTag::Text, "regex", "Ann"), Err(Dropped::UnsupportedOperator));
        assert_eq!(compile(TypeTag::Text, "like", ""), Err(Dropped::Blank));
    }

    #[test]
    fn test_string_like_operator_per_dialect() {
        let compiler = PredicateCompiler::new(DatabaseType::SQLite, CalendarRangeResolver::default());
        let fragment = compiler
            .compile(&col("name", TypeTag::String), "is", &"ann".into())
            .unwrap();
        assert_eq!(fragment.template(), "(LOWER(name) LIKE ?)");
    }

    #[test]
    fn test_user_value_never_in_template() {
        let hostile = "'; DROP TABLE players; --";
        for tag in [TypeTag::String, TypeTag::Text, TypeTag::Enum] {
            let fragment = compile(tag, "default", hostile).unwrap();
            assert!(!fragment.template().contains("DROP"));
            assert_eq!(fragment.params().len(), 1);
        }
    }

    #[test]
    fn test_date() {
        let fragment = compile(TypeTag::Date, "today", "").unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        assert_eq!(fragment.template(), "(c BETWEEN ? AND ?)");
        assert_eq!(fragment.params(), [FilterValue::Date(today), FilterValue::Date(today)]);

        let fragment = compile(TypeTag::Date, "between", vec!["03/01/2024", ""]).unwrap();
        assert_eq!(fragment.template(), "(c >= ?)");

        assert_eq!(compile(TypeTag::Date, "default", ""), Err(Dropped::Blank));
        assert_eq!(compile(TypeTag::Date, "default", "soon"), Err(Dropped::Unparseable));
    }

    #[test]
    fn test_datetime_widens_to_whole_days() {
        let fragment = compile(TypeTag::Datetime, "default", "03/01/2024").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            fragment.params(),
            [
                FilterValue::DateTime(day.and_hms_opt(0, 0, 0).unwrap()),
                FilterValue::DateTime(day.and_hms_micro_opt(23, 59, 59, 999_999).unwrap()),
            ]
        );

        let fragment = compile(TypeTag::Datetime, "between", vec!["", "03/01/2024"]).unwrap();
        assert_eq!(fragment.template(), "(c <= ?)");
        assert_eq!(
            fragment.params(),
            [FilterValue::DateTime(day.and_hms_micro_opt(23, 59, 59, 999_999).unwrap())]
        );
    }

    #[test]
    fn test_enum() {
        let fragment = compile(TypeTag::Enum, "default", vec!["active", "pending"]).unwrap();
        assert_eq!(fragment.template(), "(c IN (?, ?))");
        assert_eq!(
            fragment.params(),
            [FilterValue::from("active"), FilterValue::from("pending")]
        );

        let fragment = compile(TypeTag::Enum, "default", "active").unwrap();
        assert_eq!(fragment.template(), "(c IN (?))");

        assert_eq!(compile(TypeTag::Enum, "default", Vec::<String>::new()), Err(Dropped::Blank));
    }

    #[test]
    fn test_unsupported_types() {
        assert_eq!(compile(TypeTag::Serialized, "default", "x"), Err(Dropped::UnsupportedType));
        assert_eq!(compile(TypeTag::Unsupported, "default", "x"), Err(Dropped::UnsupportedType));
    }

    #[test]
    fn test_sentinels_override_type() {
        let tags = [
            TypeTag::Boolean,
            TypeTag::Integer,
            TypeTag::Decimal,
            TypeTag::Float,
            TypeTag::String,
            TypeTag::Text,
            TypeTag::Date,
            TypeTag::Datetime,
            TypeTag::Enum,
            TypeTag::BelongsToAssociation,
            TypeTag::Serialized,
            TypeTag::Unsupported,
        ];
        for tag in tags {
            let fragment = compile(tag, "default", "_blank").unwrap();
            assert_eq!(fragment.template(), "(c IS NULL OR c = '')");
            assert!(fragment.params().is_empty());

            let fragment = compile(tag, "_null", "").unwrap();
            assert_eq!(fragment.template(), "(c IS NULL)");
            assert!(fragment.params().is_empty());

            assert_eq!(compile(tag, "_discard", "42"), Err(Dropped::Discarded));
        }
    }

    #[test]
    fn test_idempotent() {
        let c = compiler();
        let column = col("players.name", TypeTag::String);
        let value = RawValue::from("Ann");
        assert_eq!(c.compile(&column, "like", &value), c.compile(&column, "like", &value));
    }

    #[test]
    fn test_dropped_into_error() {
        let column = col("age", TypeTag::Integer);
        let err = Dropped::UnsupportedOperator.into_error(&column, "regex");
        assert!(matches!(err, FilterError::UnsupportedOperator { .. }));
        assert!(Dropped::Blank.is_benign());
        assert!(!Dropped::Unparseable.is_benign());
    }
}
