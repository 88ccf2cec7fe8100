use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults_to_echo_without_upstream() {
    let settings = Settings::default();
    assert_eq!(settings.bind_addr, "127.0.0.1:8787");
    assert_eq!(settings.max_upload_bytes, 10 * 1024 * 1024);
    assert_eq!(settings.effective_mode(), UpstreamMode::Echo);
}

#[test]
fn file_settings_override_defaults() {
    let mut settings = Settings::default();
    apply_file_settings(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
upstream_url = "http://engine.internal/v1/stylize"
upstream_timeout_secs = 45
max_upload_bytes = 1024
"#,
    );
    assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    assert_eq!(
        settings.upstream_url.as_deref(),
        Some("http://engine.internal/v1/stylize")
    );
    assert_eq!(settings.upstream_timeout, Some(Duration::from_secs(45)));
    assert_eq!(settings.max_upload_bytes, 1024);
    assert_eq!(settings.effective_mode(), UpstreamMode::Http);
}

#[test]
fn env_overrides_file_and_prefixed_names_win() {
    let mut settings = Settings::default();
    apply_file_settings(&mut settings, r#"bind_addr = "0.0.0.0:9000""#);
    apply_env_settings(
        &mut settings,
        env_from(&[
            ("RELAY_BIND", "127.0.0.1:1"),
            ("APP__BIND_ADDR", "127.0.0.1:2"),
            ("UPSTREAM_URL", "http://engine/a"),
            ("APP__UPSTREAM_MODE", "disabled"),
            ("APP__MAX_UPLOAD_BYTES", "not-a-number"),
        ]),
    );
    assert_eq!(settings.bind_addr, "127.0.0.1:2");
    assert_eq!(settings.upstream_url.as_deref(), Some("http://engine/a"));
    assert_eq!(settings.effective_mode(), UpstreamMode::Disabled);
    assert_eq!(settings.max_upload_bytes, 10 * 1024 * 1024);
}

#[test]
fn blank_upstream_url_is_treated_as_unset() {
    let mut settings = Settings::default();
    apply_env_settings(&mut settings, env_from(&[("UPSTREAM_URL", "   ")]));
    assert_eq!(settings.upstream_url, None);
}

#[test]
fn garbage_file_keeps_defaults() {
    let mut settings = Settings::default();
    apply_file_settings(&mut settings, "this is = = not toml");
    assert_eq!(settings, Settings::default());
}

#[test]
fn parses_modes_case_insensitively() {
    assert_eq!(UpstreamMode::parse(" HTTP "), Some(UpstreamMode::Http));
    assert_eq!(UpstreamMode::parse("echo"), Some(UpstreamMode::Echo));
    assert_eq!(UpstreamMode::parse("off"), Some(UpstreamMode::Disabled));
    assert_eq!(UpstreamMode::parse("magic"), None);
}

#[test]
fn layered_load_reads_file_then_env() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("ghibli_relay_settings_{suffix}.toml"));
    fs::write(&path, "upstream_url = \"http://engine/from-file\"\nmax_upload_bytes = 2048\n")
        .expect("write settings");

    let settings = load_settings_with(&path, env_from(&[("APP__MAX_UPLOAD_BYTES", "4096")]));
    assert_eq!(settings.upstream_url.as_deref(), Some("http://engine/from-file"));
    assert_eq!(settings.max_upload_bytes, 4096);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn missing_settings_file_falls_back_to_defaults() {
    let settings = load_settings_with(Path::new("/definitely/missing/relay.toml"), env_from(&[]));
    assert_eq!(settings, Settings::default());
}

#[test]
fn unknown_env_mode_keeps_mode_from_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("ghibli_relay_mode_{suffix}.toml"));
    fs::write(&path, "upstream_mode = \"disabled\"\n").expect("write settings");

    let settings = load_settings_with(&path, env_from(&[("APP__UPSTREAM_MODE", "disable")]));
    assert_eq!(settings.upstream_mode, Some(UpstreamMode::Disabled));
    assert_eq!(settings.effective_mode(), UpstreamMode::Disabled);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn unknown_file_mode_keeps_default_inference() {
    let mut settings = Settings::default();
    apply_file_settings(
        &mut settings,
        "upstream_url = \"http://engine/a\"\nupstream_mode = \"htp\"\n",
    );
    assert_eq!(settings.upstream_mode, None);
    assert_eq!(settings.effective_mode(), UpstreamMode::Http);
}
