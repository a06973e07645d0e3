//! Column descriptors and declared type tags.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Column types no admin filter can search.
pub const DISABLED_COLUMN_TYPES: &[&str] =
    &["tsvector", "blob", "binary", "spatial", "hstore", "geometry"];

/// Declared scalar type of a searchable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// Boolean column.
    Boolean,
    /// Integer column.
    Integer,
    /// Fixed-point decimal column.
    Decimal,
    /// Floating point column.
    Float,
    /// Short string column.
    String,
    /// Long text column.
    Text,
    /// Calendar date column.
    Date,
    /// Date and time column.
    #[serde(alias = "timestamp")]
    Datetime,
    /// Enumerated values column.
    Enum,
    /// Foreign key of a belongs-to association.
    BelongsToAssociation,
    /// Serialized blob of structured data.
    Serialized,
    /// Any type filters cannot search.
    Unsupported,
}

impl TypeTag {
    /// Map a column type name reported by the persistence layer.
    ///
    /// Disabled and unknown types map to [`TypeTag::Unsupported`].
    pub fn from_sql_type(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty()
            || DISABLED_COLUMN_TYPES.contains(&name.as_str())
            || name.ends_with("_array")
        {
            return Self::Unsupported;
        }

        match name.as_str() {
            "boolean" | "bool" => Self::Boolean,
            "integer" | "int" | "bigint" | "smallint" => Self::Integer,
            "decimal" | "numeric" => Self::Decimal,
            "float" | "double" | "real" => Self::Float,
            "string" | "varchar" | "char" => Self::String,
            "text" => Self::Text,
            "date" => Self::Date,
            "datetime" | "timestamp" => Self::Datetime,
            "enum" => Self::Enum,
            "belongs_to_association" => Self::BelongsToAssociation,
            "serialized" => Self::Serialized,
            _ => Self::Unsupported,
        }
    }

    /// Numeric tags share the round-trip parsing rule.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Decimal | Self::Float)
    }

    /// Whether filters can target this tag at all.
    pub fn is_searchable(&self) -> bool {
        !matches!(self, Self::Serialized | Self::Unsupported)
    }

    /// Get the tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::String => "string",
            Self::Text => "text",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Enum => "enum",
            Self::BelongsToAssociation => "belongs_to_association",
            Self::Serialized => "serialized",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A searchable column: its path in the query and its declared type.
///
/// The path is either `table.column` or a bare `column`. It comes from
/// catalog metadata and is trusted; user input never reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    qualified_path: SmolStr,
    declared_type: TypeTag,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(qualified_path: impl Into<SmolStr>, declared_type: TypeTag) -> Self {
        Self {
            qualified_path: qualified_path.into(),
            declared_type,
        }
    }

    /// The column path as it appears in SQL.
    pub fn path(&self) -> &str {
        &self.qualified_path
    }

    /// The declared type.
    pub fn declared_type(&self) -> TypeTag {
        self.declared_type
    }

    /// The table part of a qualified path.
    pub fn table(&self) -> Option<&str> {
        self.qualified_path
            .split_once('.')
            .map(|(table, _)| table)
            .filter(|table| !table.is_empty())
    }

    /// The column part of the path.
    pub fn column(&self) -> &str {
        self.qualified_path
            .split_once('.')
            .map_or(self.path(), |(_, column)| column)
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_path)
    }
}
