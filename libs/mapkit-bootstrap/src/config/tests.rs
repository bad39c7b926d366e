use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.host.home_dir, "");
    assert_eq!(config.host.settings_file, "Config/settings.json");
    assert_eq!(config.host.frame_rate, 30);
    assert_eq!(config.host.trace_capacity, 256);

    assert_eq!(config.container.duplicate_bindings, DuplicatePolicy::Overwrite);
    assert_eq!(config.bootstrap.slow_plugin_warn_ms, 500);

    let logging = config.logging.as_ref().unwrap();
    let default = logging.get("default").unwrap();
    assert_eq!(default.console_level, "info");
    assert_eq!(default.file, "logs/mapkit.log");
}

#[test]
fn test_yaml_serialization() {
    let config = AppConfig::default();
    let yaml = config.to_yaml().expect("Failed to serialize to YAML");

    assert!(yaml.contains("host:"));
    assert!(yaml.contains("container:"));
    assert!(yaml.contains("bootstrap:"));
    assert!(yaml.contains("logging:"));
    assert!(yaml.contains("duplicate_bindings: overwrite"));
}

#[test]
fn test_layered_loading_yaml_only() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("host.yaml");
    let home = temp_dir.path().join("home");

    let yaml_content = format!(
        r#"
host:
  home_dir: "{}"
  data_dir: "/srv/maps"
  settings_file: "Config/berlin.json"
  frame_rate: 60

container:
  duplicate_bindings: reject

bootstrap:
  slow_plugin_warn_ms: 0
"#,
        home.display()
    );

    fs::write(&config_path, yaml_content).expect("Failed to write config file");

    let config = AppConfig::load_layered(&config_path).expect("Failed to load config");

    assert_eq!(PathBuf::from(&config.host.home_dir), home);
    assert!(home.exists(), "home_dir must be created during load");
    assert_eq!(config.data_dir(), PathBuf::from("/srv/maps"));
    assert_eq!(config.host.settings_file, "Config/berlin.json");
    assert_eq!(config.host.frame_rate, 60);
    assert_eq!(config.host.trace_capacity, 256);
    assert_eq!(config.container.duplicate_bindings, DuplicatePolicy::Reject);
    assert_eq!(config.bootstrap.slow_plugin_warn_ms, 0);
    assert!(config.logging.is_none());
}

#[test]
fn test_layered_loading_keeps_defaults_for_missing_sections() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("minimal.yaml");

    let yaml_content = format!(
        r#"
host:
  home_dir: "{}"
"#,
        temp_dir.path().display()
    );
    fs::write(&config_path, yaml_content).expect("Failed to write config file");

    let config = AppConfig::load_layered(&config_path).expect("Failed to load config");

    assert_eq!(config.host.settings_file, "Config/settings.json");
    assert_eq!(config.host.frame_rate, 30);
    assert_eq!(config.container.duplicate_bindings, DuplicatePolicy::Overwrite);
    assert_eq!(config.bootstrap.slow_plugin_warn_ms, 500);
    assert_eq!(config.data_dir(), PathBuf::from("."));
}

#[test]
fn test_relative_home_dir_is_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("bad.yaml");
    fs::write(&config_path, "host:\n  home_dir: \"relative/home\"\n").unwrap();

    let err = AppConfig::load_layered(&config_path).unwrap_err();
    assert!(
        format!("{err:#}").contains("home_dir"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn test_cli_overrides() {
    let mut config = AppConfig::default();

    let args = CliArgs {
        settings: Some("Config/demo.json".to_string()),
        frame_rate: Some(120),
        verbose: 2,
        ..CliArgs::default()
    };

    config.apply_cli_overrides(&args);

    assert_eq!(config.host.settings_file, "Config/demo.json");
    assert_eq!(config.host.frame_rate, 120);
    let logging = config.logging.as_ref().unwrap();
    assert_eq!(logging["default"].console_level, "trace");
}

#[test]
fn test_cli_overrides_verbose_levels() {
    let test_cases = vec![
        (0, "info"),  // Default, no change
        (1, "debug"), // One -v
        (2, "trace"), // Two -v
        (3, "trace"), // Three+ -v (capped at trace)
    ];

    for (verbose_level, expected_log_level) in test_cases {
        let mut config = AppConfig::default();
        let args = CliArgs {
            verbose: verbose_level,
            ..CliArgs::default()
        };

        config.apply_cli_overrides(&args);

        let logging = config.logging.as_ref().unwrap();
        assert_eq!(
            logging["default"].console_level, expected_log_level,
            "Failed for verbose level {verbose_level}"
        );
    }
}

#[test]
fn test_cli_overrides_insert_logging_when_absent() {
    let mut config = AppConfig {
        logging: None,
        ..AppConfig::default()
    };
    config.apply_cli_overrides(&CliArgs {
        verbose: 1,
        ..CliArgs::default()
    });

    let logging = config.logging.as_ref().unwrap();
    assert_eq!(logging["default"].console_level, "debug");
}

#[test]
fn test_unknown_duplicate_policy_fails() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("policy.yaml");
    let yaml_content = format!(
        "host:\n  home_dir: \"{}\"\ncontainer:\n  duplicate_bindings: sometimes\n",
        temp_dir.path().display()
    );
    fs::write(&config_path, yaml_content).unwrap();

    assert!(AppConfig::load_layered(&config_path).is_err());
}

#[test]
fn test_empty_bootstrap_section_keeps_slow_plugin_default() {
    let section: BootstrapConfig = serde_yaml::from_str("{}").expect("Failed to parse section");
    assert_eq!(
        section.slow_plugin_warn_ms,
        BootstrapConfig::default().slow_plugin_warn_ms
    );
    assert_eq!(section.slow_plugin_warn_ms, 500);
}
