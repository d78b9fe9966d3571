use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn site_fixture_loads_and_reads_stylesheet() {
    let config = mansite::load_config(fixture("site.yml")).expect("fixture should load");
    assert_eq!(config.stylesheet, Some(fixture("custom.css")));
    assert_eq!(config.background.as_deref(), Some("200"));
    assert_eq!(config.text.as_deref(), Some("40"));
    assert_eq!(config.accent.as_deref(), Some("310"));
    assert_eq!(config.escape_text, Some(false));

    let options = config.render_options().expect("stylesheet should load");
    assert_eq!(options.stylesheet, "body { font-family: serif; }\n");
}

#[test]
fn invalid_site_fixture_fails_schema() {
    let err = mansite::load_config(fixture("invalid_site.yml"))
        .expect_err("invalid fixture should fail schema validation");
    assert!(matches!(err, mansite::MansiteError::Schema(_)));
}

#[test]
fn missing_config_is_io_error() {
    let err = mansite::load_config(fixture("missing.yml")).expect_err("missing file");
    assert!(matches!(err, mansite::MansiteError::Io { .. }));
}

#[test]
fn external_schema_is_used() {
    let mut schema_path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    schema_path.push(format!("mansite-schema-{nanos}.yml"));
    fs::write(&schema_path, "type: object\nrequired: [stylesheet, favicon]\n")
        .expect("schema write");

    let result = mansite::load_config_with_schema(fixture("site.yml"), &schema_path);
    let _ = fs::remove_file(&schema_path);
    let err = result.expect_err("external schema should require favicon");
    assert!(matches!(err, mansite::MansiteError::Schema(_)));
}
