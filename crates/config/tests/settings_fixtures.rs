//! Integration tests for loading settings fixtures from disk.

use confhub_config::{
    CURRENT_SETTINGS_VERSION, ENV_DEFAULT_DIR, ENV_REMOTE_ENABLED, EngineEnv,
    load_engine_settings_from_path,
};
use confhub_shared::ErrorCode;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn fixture(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

#[test]
fn loads_json_fixture_and_normalizes() -> Result<(), Box<dyn Error>> {
    let path = fixture("settings.valid.json");
    let settings = load_engine_settings_from_path(Some(&path), &EngineEnv::default())?;

    assert_eq!(settings.version, CURRENT_SETTINGS_VERSION);
    assert_eq!(settings.remote_base_url(), Some("http://localhost:5500"));
    assert_eq!(settings.remote_timeout(), Duration::from_millis(3_000));
    assert_eq!(
        settings.default_project_id().map(confhub_domain::ProjectId::as_str),
        Some("fay")
    );
    assert_eq!(settings.default_dir(), PathBuf::from("/srv/fay"));
    assert!(!settings.storage.backups);
    assert_eq!(settings.storage.system_file_name.as_ref(), "system.conf");
    Ok(())
}

#[test]
fn loads_toml_fixture() -> Result<(), Box<dyn Error>> {
    let path = fixture("settings.valid.toml");
    let settings = load_engine_settings_from_path(Some(&path), &EngineEnv::default())?;

    assert_eq!(settings.remote_base_url(), None);
    assert_eq!(settings.storage.system_file_name.as_ref(), "fay.ini");
    assert_eq!(settings.storage.user_file_name.as_ref(), "fay.json");
    Ok(())
}

#[test]
fn env_overrides_apply_on_top_of_the_file() -> Result<(), Box<dyn Error>> {
    let path = fixture("settings.valid.toml");
    let map: BTreeMap<String, String> = [
        (ENV_REMOTE_ENABLED.to_string(), "true".to_string()),
        (ENV_DEFAULT_DIR.to_string(), "/tmp/confhub".to_string()),
    ]
    .into_iter()
    .collect();
    let env = EngineEnv::from_map(&map)?;
    let settings = load_engine_settings_from_path(Some(&path), &env)?;

    assert_eq!(
        settings.remote_base_url(),
        Some("https://config.example.com")
    );
    assert_eq!(settings.default_dir(), PathBuf::from("/tmp/confhub"));
    Ok(())
}

#[test]
fn invalid_fixtures_surface_typed_errors() -> Result<(), Box<dyn Error>> {
    let cases = [
        ("settings.invalid-timeout.json", "invalid_timeout"),
        ("settings.unknown-field.toml", "invalid_toml"),
        ("settings.missing.json", "settings_file_not_found"),
    ];

    for (name, code) in cases {
        let path = fixture(name);
        let error = load_engine_settings_from_path(Some(&path), &EngineEnv::default())
            .err()
            .ok_or_else(|| std::io::Error::other(format!("expected failure for {name}")))?;
        assert_eq!(error.code, ErrorCode::new("config", code), "fixture {name}");
    }
    Ok(())
}

#[test]
fn settings_written_to_a_temp_dir_round_trip() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("confhub.json");
    let mut settings = confhub_config::EngineSettings::default();
    settings.remote.base_url = Some("http://127.0.0.1:5500".into());
    settings.remote.api_key = Some("sk-secret".into());
    std::fs::write(&path, confhub_config::to_pretty_json(&settings)?)?;

    let loaded = load_engine_settings_from_path(Some(&path), &EngineEnv::default())?;
    assert_eq!(loaded.remote_base_url(), Some("http://127.0.0.1:5500"));
    // the written form is redacted, so the key does not round-trip.
    assert_ne!(
        loaded.api_key().map(confhub_shared::SecretString::expose),
        Some("sk-secret")
    );
    Ok(())
}
