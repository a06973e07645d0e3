//! Range bounds shared by numeric `between` and temporal filters.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Weekday};

use crate::column::ColumnDescriptor;
use crate::sql::{CompiledFragment, FragmentBuilder};
use crate::value::{FilterValue, RawValue};

/// The default date format of the admin UI (`mm/dd/yyyy`).
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// A pair of optional calendar-day bounds.
pub type DateRange = (Option<NaiveDate>, Option<NaiveDate>);

/// Build an inclusive range predicate from optional bounds.
///
/// Both bounds give `BETWEEN`, a single bound gives `>=` or `<=`, and no
/// bound gives no predicate.
pub fn range_bound(
    column: &ColumnDescriptor,
    start: Option<FilterValue>,
    end: Option<FilterValue>,
) -> Option<CompiledFragment> {
    let mut b = FragmentBuilder::new();
    b.push("(").push_column(column);
    match (start, end) {
        (Some(start), Some(end)) => {
            b.push(" BETWEEN ").push_param(start).push(" AND ").push_param(end);
        }
        (Some(start), None) => {
            b.push(" >= ").push_param(start);
        }
        (None, Some(end)) => {
            b.push(" <= ").push_param(end);
        }
        (None, None) => return None,
    }
    b.push(")");
    Some(b.build())
}

/// The first instant of a calendar day.
pub fn start_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

/// The last instant of a calendar day, to microsecond precision.
pub fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_micro_opt(23, 59, 59, 999_999)
}

/// The bounding elements of a range value.
///
/// `[begin, end]` and the UI's `[value, begin, end]` form are recognized;
/// any other shape has no bounds.
pub fn range_elements(value: &RawValue) -> Option<(&str, &str)> {
    match value {
        RawValue::List(items) => match items.as_slice() {
            [begin, end] | [_, begin, end] => Some((begin.as_str(), end.as_str())),
            _ => None,
        },
        RawValue::Scalar(_) => None,
    }
}

/// Turns a temporal operator and value into calendar-day bounds.
pub trait RangeResolver {
    /// Resolve `(operator, value)` to a `(start, end)` pair. Either bound
    /// may be absent.
    fn resolve(&self, operator: &str, value: &RawValue) -> DateRange;
}

impl<R: RangeResolver + ?Sized> RangeResolver for &R {
    fn resolve(&self, operator: &str, value: &RawValue) -> DateRange {
        (**self).resolve(operator, value)
    }
}

/// Resolves the admin UI's date operators against a reference day.
///
/// | Operator     | Bounds                                |
/// |--------------|---------------------------------------|
/// | `between`    | the two given dates                   |
/// | `today`      | today to today                        |
/// | `yesterday`  | yesterday to yesterday                |
/// | `this_week`  | Monday to Sunday of the current week  |
/// | `last_week`  | Monday to Sunday of the previous week |
/// | anything else| the first given date, as a single day |
#[derive(Debug, Clone)]
pub struct CalendarRangeResolver {
    date_format: String,
    today: Option<NaiveDate>,
}

impl CalendarRangeResolver {
    /// Create a resolver parsing dates with `date_format`.
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
            today: None,
        }
    }

    /// Pin the reference day instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The date format in use.
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn parse(&self, token: &str) -> Option<NaiveDate> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(token, &self.date_format).ok()
    }

    fn week_of(day: NaiveDate) -> DateRange {
        let week = day.week(Weekday::Mon);
        (week.checked_first_day(), week.checked_last_day())
    }
}

impl Default for CalendarRangeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl RangeResolver for CalendarRangeResolver {
    fn resolve(&self, operator: &str, value: &RawValue) -> DateRange {
        match operator {
            "between" => match range_elements(value) {
                Some((begin, end)) => (self.parse(begin), self.parse(end)),
                None => (None, None),
            },
            "today" => {
                let today = self.today();
                (Some(today), Some(today))
            }
            "yesterday" => {
                let yesterday = self.today().pred_opt();
                (yesterday, yesterday)
            }
            "this_week" => Self::week_of(self.today()),
            "last_week" => match self.today().checked_sub_signed(Duration::weeks(1)) {
                Some(day) => Self::week_of(day),
                None => (None, None),
            },
            _ => {
                let day = value.tokens().first().and_then(|token| self.parse(token));
                (day, day)
            }
        }
    }
}
