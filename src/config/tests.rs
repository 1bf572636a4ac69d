use std::io::Write;

use super::*;

fn raw_with_endpoint() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.search.endpoint = Some("https://rt.example/Admin/RightsDebugger".to_string());
    raw
}

#[test]
fn defaults_follow_the_form() {
    let settings = Settings::from_raw(raw_with_endpoint()).expect("valid settings");

    assert_eq!(settings.search.method, SearchMethod::Get);
    assert_eq!(settings.search.timeout, Duration::from_secs(30));
    assert_eq!(settings.revoke.timeout, Duration::from_secs(30));
    assert_eq!(settings.search.term_field, "q");
    assert_eq!(settings.search.fields, vec![FormField::search("q", "")]);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn endpoint_is_required() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("missing endpoint");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "search.endpoint",
            ..
        }
    ));
}

#[test]
fn endpoint_must_be_http() {
    let mut raw = RawSettings::default();
    raw.search.endpoint = Some("ftp://rt.example/search".to_string());
    let err = Settings::from_raw(raw).expect_err("bad scheme");
    assert!(err.to_string().contains("scheme"));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = raw_with_endpoint();
    raw.revoke.timeout_seconds = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "revoke.timeout_seconds",
            ..
        }
    ));
}

#[test]
fn unknown_method_is_rejected() {
    let mut raw = raw_with_endpoint();
    raw.search.method = Some("PATCH".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_endpoint();
    raw.search.timeout_seconds = Some(10);
    raw.logging.level = Some("info".to_string());

    let overrides = ConsoleOverrides {
        method: Some("post".to_string()),
        search_timeout_seconds: Some(5),
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.search.method, SearchMethod::Post);
    assert_eq!(settings.search.timeout, Duration::from_secs(5));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn cli_fields_replace_configured_fields() {
    let args = CliArgs::parse_from([
        "rights-debugger",
        "--endpoint",
        "https://rt.example/search",
        "--field",
        "q=alice",
        "--field",
        "object=queue:General",
        "--fixed-field",
        "limit=50",
    ]);

    let mut raw = RawSettings::default();
    raw.search.fields = Some(vec![FormField::search("principal", "")]);
    raw.apply_overrides(&args.overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.search.fields,
        vec![
            FormField::search("q", "alice"),
            FormField::search("object", "queue:General"),
            FormField::fixed("limit", "50"),
        ]
    );
}

#[test]
fn malformed_field_argument_is_rejected() {
    let result = CliArgs::try_parse_from(["rights-debugger", "--field", "novalue"]);
    assert!(result.is_err());
    assert!(cli::parse_field_pair("=x").is_err());
}

#[test]
fn settings_load_from_config_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tmp file");
    write!(
        file,
        r#"
[search]
endpoint = "https://rt.example/Admin/Tools/RightsDebugger.html"
method = "post"
term_field = "principal"

[[search.fields]]
name = "principal"

[[search.fields]]
name = "format"
value = "json"
search = false

[revoke]
timeout_seconds = 12
"#
    )
    .expect("write config");

    let args = CliArgs::parse_from([
        "rights-debugger",
        "--config-file",
        file.path().to_str().expect("utf-8 path"),
    ]);
    let settings = load(&args).expect("settings");

    assert_eq!(settings.search.method, SearchMethod::Post);
    assert_eq!(settings.search.term_field, "principal");
    assert_eq!(
        settings.search.fields,
        vec![
            FormField::search("principal", ""),
            FormField::fixed("format", "json"),
        ]
    );
    assert_eq!(settings.revoke.timeout, Duration::from_secs(12));
}
