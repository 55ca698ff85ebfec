use literal_sync::load_config::{load_config, PAGES_DIR_ENV, VIRTUAL_DOMAINS_DIR_ENV};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var(PAGES_DIR_ENV);
    env::remove_var(VIRTUAL_DOMAINS_DIR_ENV);
}

#[test]
#[serial]
fn test_load_config_defaults_without_file() {
    clear_env();
    let config = load_config(None).expect("Defaults should load");

    assert_eq!(config.output.pages_dir, PathBuf::from("extracted_literals"));
    assert_eq!(
        config.output.virtual_domains_dir,
        PathBuf::from("extracted_virtual_domains")
    );
    assert_eq!(config.discovery.root, PathBuf::from("."));
    assert_eq!(config.discovery.pattern, r"\.json$");
}

#[test]
#[serial]
fn test_load_config_reads_yaml_sections() {
    clear_env();
    let config_yaml = r#"
output:
  pages_dir: ./out/pages
  virtual_domains_dir: ./out/vd
discovery:
  root: ./exports
  pattern: "^pages/.*\\.json$"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(Some(config_file.path())).expect("Config should load");

    assert_eq!(config.output.pages_dir, PathBuf::from("./out/pages"));
    assert_eq!(config.output.virtual_domains_dir, PathBuf::from("./out/vd"));
    assert_eq!(config.discovery.root, PathBuf::from("./exports"));
    assert_eq!(config.discovery.pattern, r"^pages/.*\.json$");

    let round_trip = config.round_trip_config();
    assert_eq!(round_trip.pages_output_dir, PathBuf::from("./out/pages"));
}

#[test]
#[serial]
fn test_load_config_partial_sections_fall_back_to_defaults() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "output:\n  pages_dir: only_pages\n").unwrap();

    let config = load_config(Some(config_file.path())).expect("Config should load");

    assert_eq!(config.output.pages_dir, PathBuf::from("only_pages"));
    assert_eq!(
        config.output.virtual_domains_dir,
        PathBuf::from("extracted_virtual_domains")
    );
    assert_eq!(config.discovery.pattern, r"\.json$");
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(
        config_file.path(),
        "output:\n  pages_dir: from_file\n  virtual_domains_dir: vd_from_file\n",
    )
    .unwrap();
    env::set_var(PAGES_DIR_ENV, "from_env");
    env::set_var(VIRTUAL_DOMAINS_DIR_ENV, "   ");

    let config = load_config(Some(config_file.path())).expect("Config should load");
    clear_env();

    assert_eq!(config.output.pages_dir, PathBuf::from("from_env"));
    // Blank values are ignored.
    assert_eq!(config.output.virtual_domains_dir, PathBuf::from("vd_from_file"));
}

#[test]
#[serial]
fn test_load_config_errors() {
    clear_env();
    struct TestCase {
        name: &'static str,
        content: Option<&'static str>,
        expected: &'static str,
    }

    let cases = vec![
        TestCase {
            name: "missing file",
            content: None,
            expected: "Failed to read config file",
        },
        TestCase {
            name: "not yaml",
            content: Some("output: [unclosed"),
            expected: "Failed to parse config YAML",
        },
        TestCase {
            name: "wrong shape",
            content: Some("output:\n  pages_dir:\n    - a\n    - b\n"),
            expected: "Failed to parse config YAML",
        },
    ];

    for case in cases {
        let config_file = NamedTempFile::new().expect("temp file");
        let path = config_file.path().to_path_buf();
        match case.content {
            Some(content) => write(&path, content).unwrap(),
            None => drop(config_file),
        }

        let err = load_config(Some(path.as_path())).expect_err(case.name);
        assert!(
            err.to_string().contains(case.expected),
            "{}: unexpected error {err}",
            case.name
        );
    }
}
