//! Integration tests for `prax-admin.toml` loading.

use std::io::Write;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use prax_admin::filter::{
    AdminConfig, CompileMode, DatabaseType, FieldSpec, FilterError, FilterPipeline, FilterRequest,
    FilterValue, StaticCatalog, TypeTag,
};

#[test]
fn test_config_minimal() {
    let config = AdminConfig::from_str("").unwrap();
    assert_eq!(config.filter.dialect, DatabaseType::PostgreSQL);
    assert_eq!(config.filter.mode, CompileMode::Lenient);
    assert!(config.environments.is_empty());
}

#[test]
fn test_config_full() {
    let config = AdminConfig::from_str(
        r#"
        [filter]
        dialect = "mysql"
        mode = "strict"
        date_format = "%d.%m.%Y"
        default_operator = "starts_with"

        [environments.development.filter]
        mode = "lenient"

        [environments.ci.filter]
        dialect = "sqlite3"
        "#,
    )
    .unwrap();

    assert_eq!(config.filter.dialect, DatabaseType::MySQL);
    assert_eq!(config.filter.mode, CompileMode::Strict);
    assert_eq!(config.filter.date_format, "%d.%m.%Y");
    assert_eq!(config.filter.default_operator, "starts_with");
    assert_eq!(config.environments.len(), 2);

    let dev = config.clone().with_environment("development");
    assert_eq!(dev.filter.mode, CompileMode::Lenient);
    assert_eq!(dev.filter.dialect, DatabaseType::MySQL);

    let ci = config.clone().with_environment("ci");
    assert_eq!(ci.filter.dialect, DatabaseType::SQLite);
    assert_eq!(ci.filter.mode, CompileMode::Strict);

    let unknown = config.with_environment("production");
    assert_eq!(unknown.filter.dialect, DatabaseType::MySQL);
}

#[test]
fn test_config_rejects_bad_values() {
    for toml in [
        "[filter]\ndialect = \"oracle\"\n",
        "[filter]\nmode = \"paranoid\"\n",
        "[filters]\nmode = \"strict\"\n",
    ] {
        let err = AdminConfig::from_str(toml).unwrap_err();
        assert!(matches!(err, FilterError::TomlError { .. }), "accepted: {toml}");
    }
}

#[test]
fn test_config_from_file() {
    let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(temp_file, "[filter]\ndialect = \"sqlite\"\ndate_format = \"%Y-%m-%d\"").unwrap();

    let config = AdminConfig::from_file(temp_file.path()).unwrap();
    assert_eq!(config.filter.dialect, DatabaseType::SQLite);
    assert_eq!(config.filter.date_format, "%Y-%m-%d");
}

#[test]
fn test_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = AdminConfig::from_file(dir.path().join("prax-admin.toml")).unwrap_err();
    assert!(matches!(err, FilterError::IoError { .. }));
}

#[test]
fn test_config_env_expansion() {
    // SAFETY: This test runs single-threaded and we clean up after
    unsafe {
        std::env::set_var("PRAX_ADMIN_IT_MODE", "strict");
    }
    let config = AdminConfig::from_str("[filter]\nmode = \"${PRAX_ADMIN_IT_MODE}\"\n").unwrap();
    unsafe {
        std::env::remove_var("PRAX_ADMIN_IT_MODE");
    }
    assert_eq!(config.filter.mode, CompileMode::Strict);
}

#[test]
fn test_config_drives_pipeline() {
    let config = AdminConfig::from_str(
        r#"
        [filter]
        dialect = "sqlite"
        date_format = "%Y-%m-%d"
        default_operator = "ends_with"
        "#,
    )
    .unwrap();
    let catalog = StaticCatalog::new()
        .field(FieldSpec::column("email", TypeTag::String))
        .field(FieldSpec::column("born_on", TypeTag::Date));
    let pipeline = FilterPipeline::from_config(&config.filter, catalog);

    let request: FilterRequest = serde_json::from_str(
        r#"{ "filters": {
            "email": { "1": { "v": "@example.com" } },
            "born_on": { "2": { "o": "between", "v": ["1990-01-01", "1999-12-31"] } }
        } }"#,
    )
    .unwrap();
    let (sql, params) = pipeline.to_sql_scope(&request).unwrap().to_sql();
    assert_eq!(sql, "(LOWER(email) LIKE ?) AND (born_on BETWEEN ? AND ?)");
    assert_eq!(params[0], FilterValue::from("%@example.com"));
}
