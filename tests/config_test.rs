use std::fs;
use tallview::config::{AppConfig, ColorConfig, ConfigManager, DatasetConfig, FiltersConfig};
use tallview::dataset::LoadOptions;
use tallview::{Args, Session};
use tempfile::TempDir;

mod common;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn no_args() -> Args {
    Args {
        path: None,
        delimiter: None,
        infer_schema_length: None,
        debug: false,
        generate_config: false,
        force: false,
    }
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.dataset.path, None);
    assert_eq!(config.dataset.file_name, "NotesDeTall.xlsx - Table 1.csv");
    assert_eq!(config.dataset.drop_columns, vec!["Digit".to_string()]);
    assert_eq!(config.filters.institution_column, "Universitat");
    assert_eq!(config.filters.city_column, "Ciutat");
    assert_eq!(config.filters.all_label, "Totes");
    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert_eq!(config.theme.colors.selector_active, "yellow");
    assert!(!config.debug.enabled);
    assert_eq!(config.debug.log_file, "tallview.log");
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");

    assert!(config_path.exists());
    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[dataset]"));
    assert!(content.contains("[filters]"));
    assert!(content.contains("[theme.colors]"));
    assert!(content.contains("version = \"0.1\""));
}

#[test]
fn test_written_template_loads_as_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.write_default_config(false).unwrap();

    let loaded = AppConfig::load_from(&config_manager)
        .expect("Template should parse")
        .expect("Template should exist");
    loaded.validate().expect("Template should validate");

    let defaults = AppConfig::default();
    assert_eq!(loaded.dataset.file_name, defaults.dataset.file_name);
    assert_eq!(loaded.filters.all_label, defaults.filters.all_label);
    assert_eq!(
        loaded.performance.event_poll_interval_ms,
        defaults.performance.event_poll_interval_ms
    );
}

#[test]
fn test_write_config_without_force_fails_if_exists() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    config_manager
        .write_default_config(false)
        .expect("First write should succeed");

    let result = config_manager.write_default_config(false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));
}

#[test]
fn test_write_config_with_force_overwrites() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager.config_path("config.toml");
    config_manager.ensure_config_dir().unwrap();
    fs::write(&config_path, "version = \"0.1\"\n").unwrap();

    let written = config_manager
        .write_default_config(true)
        .expect("Write with force should succeed");
    assert_eq!(written, config_path);
    assert!(fs::read_to_string(&written).unwrap().contains("[dataset]"));
}

#[test]
fn test_load_from_missing_file_is_none() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    assert!(AppConfig::load_from(&config_manager).unwrap().is_none());
}

#[test]
fn test_load_config_with_no_file() {
    let test_app_name = format!("tallview_test_{}", std::process::id());
    let config = AppConfig::load(&test_app_name).expect("Should load default config");
    assert_eq!(config.version, "0.1");
    assert_eq!(config.filters.all_label, "Totes");
}

#[test]
fn test_load_and_merge_minimal_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(
        config_manager.config_path("config.toml"),
        r#"
version = "0.1"

[dataset]
delimiter = 59

[filters]
all_label = "All"
"#,
    )
    .unwrap();

    let user = AppConfig::load_from(&config_manager).unwrap().unwrap();
    let mut config = AppConfig::default();
    config.merge(user);

    assert_eq!(config.dataset.delimiter, Some(59));
    assert_eq!(config.filters.all_label, "All");
    // untouched sections keep their defaults
    assert_eq!(config.filters.city_column, "Ciutat");
    assert_eq!(config.dataset.drop_columns, vec!["Digit".to_string()]);
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_config_reports_path() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(
        config_manager.config_path("config.toml"),
        "[filters\nall_label = ",
    )
    .unwrap();

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_validate_config_invalid_version() {
    let config = AppConfig {
        version: "1.0".to_string(),
        ..Default::default()
    };
    let result = config.validate();
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Unsupported config version"));
}

#[test]
fn test_validate_rejects_zero_values() {
    let mut config = AppConfig::default();
    config.performance.event_poll_interval_ms = 0;
    assert!(config
        .validate()
        .unwrap_err()
        .to_string()
        .contains("event_poll_interval_ms must be greater than 0"));

    let mut config = AppConfig::default();
    config.dataset.infer_schema_length = Some(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_blank_filter_settings() {
    let mut config = AppConfig::default();
    config.filters.city_column = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.filters.all_label = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_unknown_color() {
    let mut config = AppConfig::default();
    config.theme.colors.error = "not_a_color".to_string();
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("Invalid color value for 'error'"));
}

#[test]
fn test_merge_does_not_override_with_defaults() {
    let mut base = DatasetConfig {
        delimiter: Some(b';'),
        drop_columns: vec![],
        ..Default::default()
    };
    base.merge(DatasetConfig::default());
    assert_eq!(base.delimiter, Some(b';'));
    assert!(base.drop_columns.is_empty());

    let mut colors = ColorConfig {
        primary: "blue".to_string(),
        ..Default::default()
    };
    colors.merge(ColorConfig {
        error: "magenta".to_string(),
        ..Default::default()
    });
    assert_eq!(colors.primary, "blue");
    assert_eq!(colors.error, "magenta");
    assert_eq!(colors.dimmed, "dark_gray");
}

#[test]
fn test_configured_columns_drive_session() {
    let (_dir, path) = common::scores_csv();
    let filters = FiltersConfig {
        institution_column: "Estudi".to_string(),
        city_column: "Ciutat".to_string(),
        all_label: "Tots".to_string(),
    };
    let mut session = Session::from_config(&filters);
    let config = AppConfig::default();
    session
        .load(&path, &LoadOptions::from_args_and_config(&no_args(), &config.dataset))
        .unwrap();

    assert_eq!(session.fields().collect::<Vec<_>>(), vec!["Estudi", "Ciutat"]);
    let options = session.filter_options("Estudi").unwrap();
    assert_eq!(options.labels()[0], "Tots");
    assert!(options.tokens().contains(&"Dret".to_string()));
}

#[test]
fn test_configured_drop_columns_are_honoured() {
    let (_dir, path) = common::scores_csv();
    let dataset_config = DatasetConfig {
        drop_columns: vec!["Estudi".to_string(), "Missing".to_string()],
        ..Default::default()
    };
    let opts = LoadOptions::from_args_and_config(&no_args(), &dataset_config);
    let mut session = Session::new(["Universitat"], "Totes");
    session.load(&path, &opts).unwrap();
    assert_eq!(
        session.dataset().unwrap().column_names(),
        vec!["Digit", "Universitat", "Ciutat", "Nota"]
    );
}
