//! Configuration file parsing for `prax-admin.toml`.
//!
//! ```toml
//! [filter]
//! dialect = "postgresql"
//! mode = "lenient"
//! date_format = "%m/%d/%Y"
//!
//! [environments.test.filter]
//! mode = "strict"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_OPERATOR;
use crate::error::{FilterError, FilterResult};
use crate::range::{CalendarRangeResolver, DEFAULT_DATE_FORMAT};
use crate::sql::DatabaseType;

/// How malformed filter input is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    /// Malformed input contributes no predicate and is otherwise ignored.
    #[default]
    Lenient,
    /// Malformed structured filters fail with a diagnostic.
    Strict,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Filter compilation settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl AdminConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> FilterResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FilterError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> FilterResult<Self> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| FilterError::TomlError { source: e })
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(filter) = overrides.filter {
                if let Some(dialect) = filter.dialect {
                    self.filter.dialect = dialect;
                }
                if let Some(mode) = filter.mode {
                    self.filter.mode = mode;
                }
                if let Some(date_format) = filter.date_format {
                    self.filter.date_format = date_format;
                }
            }
        }
        self
    }
}

/// Filter compilation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// SQL dialect of the store; fixes the placeholder style and the
    /// case-insensitive match operator.
    #[serde(default)]
    pub dialect: DatabaseType,

    /// Lenient or strict handling of malformed input.
    #[serde(default)]
    pub mode: CompileMode,

    /// strftime format of dates typed into the UI.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Operator for structured filters that give none.
    #[serde(default = "default_operator")]
    pub default_operator: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            dialect: DatabaseType::default(),
            mode: CompileMode::default(),
            date_format: default_date_format(),
            default_operator: default_operator(),
        }
    }
}

impl FilterConfig {
    /// Create the default settings for a dialect.
    pub fn for_dialect(dialect: DatabaseType) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Set the compile mode.
    pub fn with_mode(mut self, mode: CompileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the date resolver for these settings.
    pub fn range_resolver(&self) -> CalendarRangeResolver {
        CalendarRangeResolver::new(self.date_format.clone())
    }
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_operator() -> String {
    DEFAULT_OPERATOR.to_string()
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Filter overrides.
    pub filter: Option<FilterOverride>,
}

/// Filter configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterOverride {
    /// Override the dialect.
    pub dialect: Option<DatabaseType>,

    /// Override the compile mode.
    pub mode: Option<CompileMode>,

    /// Override the date format.
    pub date_format: Option<String>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
fn expand_env_vars(content: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern");
    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
