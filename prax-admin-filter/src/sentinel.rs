//! Type-independent null and blank checks.
//!
//! A sentinel token may arrive in either the operator or the value slot.
//! The UI keeps a previously chosen operator in its markup while a later
//! value overrides it, so both slots are checked, in a fixed priority order.

use crate::column::ColumnDescriptor;
use crate::sql::{CompiledFragment, FragmentBuilder};
use crate::value::RawValue;

/// The outcome of checking an operator/value pair for sentinel tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// `_discard`: the pair was cancelled and contributes nothing.
    Discard,
    /// `_blank`: null or the empty string.
    IsBlankOrNull,
    /// `_present`: neither null nor the empty string.
    IsPresent,
    /// `_null`.
    IsNull,
    /// `_not_null`.
    IsNotNull,
    /// `_empty`: the empty string.
    IsEmptyString,
    /// `_not_empty`: anything but the empty string.
    IsNotEmptyString,
    /// No sentinel; compile by type.
    NoSentinel,
}

/// Tokens in priority order.
const TOKENS: &[(&str, Sentinel)] = &[
    ("_discard", Sentinel::Discard),
    ("_blank", Sentinel::IsBlankOrNull),
    ("_present", Sentinel::IsPresent),
    ("_null", Sentinel::IsNull),
    ("_not_null", Sentinel::IsNotNull),
    ("_empty", Sentinel::IsEmptyString),
    ("_not_empty", Sentinel::IsNotEmptyString),
];

impl Sentinel {
    /// Classify an operator/value pair. The first token matching either
    /// slot wins.
    pub fn classify(operator: &str, value: &RawValue) -> Self {
        TOKENS
            .iter()
            .find(|(token, _)| operator == *token || value.is_token(token))
            .map_or(Self::NoSentinel, |(_, sentinel)| *sentinel)
    }

    /// The reserved token for this sentinel.
    pub fn token(&self) -> Option<&'static str> {
        TOKENS
            .iter()
            .find(|(_, sentinel)| sentinel == self)
            .map(|(token, _)| *token)
    }

    /// Build the predicate for `column`.
    ///
    /// `Discard` and `NoSentinel` have no predicate. The others bind no
    /// values at all.
    pub fn predicate(&self, column: &ColumnDescriptor) -> Option<CompiledFragment> {
        let mut b = FragmentBuilder::new();
        match self {
            Self::Discard | Self::NoSentinel => return None,
            Self::IsBlankOrNull => {
                b.push("(").push_column(column).push(" IS NULL OR ");
                b.push_column(column).push(" = '')");
            }
            Self::IsPresent => {
                b.push("(").push_column(column).push(" IS NOT NULL AND ");
                b.push_column(column).push(" != '')");
            }
            Self::IsNull => {
                b.push("(").push_column(column).push(" IS NULL)");
            }
            Self::IsNotNull => {
                b.push("(").push_column(column).push(" IS NOT NULL)");
            }
            Self::IsEmptyString => {
                b.push("(").push_column(column).push(" = '')");
            }
            Self::IsNotEmptyString => {
                b.push("(").push_column(column).push(" != '')");
            }
        }
        Some(b.build())
    }
}
