use std::{collections::HashMap, fs, path::Path, time::Duration};

use shared::protocol::ADVISORY_MAX_UPLOAD_BYTES;

pub const SETTINGS_FILE: &str = "relay.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMode {
    /// Forward uploads to `upstream_url`.
    Http,
    /// Return the upload unchanged. Local demos only.
    Echo,
    /// Refuse every transform with 503.
    Disabled,
}

impl UpstreamMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "echo" => Some(Self::Echo),
            "disabled" | "off" => Some(Self::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub upstream_url: Option<String>,
    pub upstream_mode: Option<UpstreamMode>,
    pub upstream_timeout: Option<Duration>,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".into(),
            upstream_url: None,
            upstream_mode: None,
            upstream_timeout: None,
            max_upload_bytes: ADVISORY_MAX_UPLOAD_BYTES,
        }
    }
}

impl Settings {
    /// Explicit mode wins; otherwise a configured upstream URL means `Http`, and no URL means `Echo`.
    pub fn effective_mode(&self) -> UpstreamMode {
        match (self.upstream_mode, &self.upstream_url) {
            (Some(mode), _) => mode,
            (None, Some(_)) => UpstreamMode::Http,
            (None, None) => UpstreamMode::Echo,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_with(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then the settings file if it can be read, then env overrides.
fn load_settings_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();
    match fs::read_to_string(path) {
        Ok(raw) => apply_file_settings(&mut settings, &raw),
        Err(err) => tracing::debug!(path = %path.display(), %err, "relay settings file not loaded"),
    }
    apply_env_settings(&mut settings, lookup);
    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        tracing::warn!("ignoring unparseable relay settings file");
        return;
    };
    let text = |key: &str| match file_cfg.get(key) {
        Some(toml::Value::String(v)) => Some(v.clone()),
        Some(toml::Value::Integer(v)) => Some(v.to_string()),
        _ => None,
    };

    if let Some(v) = text("bind_addr") {
        settings.bind_addr = v;
    }
    if let Some(v) = text("upstream_url") {
        settings.upstream_url = non_empty(v);
    }
    if let Some(v) = text("upstream_mode") {
        apply_mode(settings, "upstream_mode", &v);
    }
    if let Some(v) = text("upstream_timeout_secs").and_then(|v| v.parse::<u64>().ok()) {
        settings.upstream_timeout = Some(Duration::from_secs(v));
    }
    if let Some(v) = text("max_upload_bytes").and_then(|v| v.parse::<usize>().ok()) {
        settings.max_upload_bytes = v;
    }
}

fn apply_env_settings(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("RELAY_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = lookup("UPSTREAM_URL") {
        settings.upstream_url = non_empty(v);
    }
    if let Some(v) = lookup("APP__UPSTREAM_URL") {
        settings.upstream_url = non_empty(v);
    }

    if let Some(v) = lookup("APP__UPSTREAM_MODE") {
        apply_mode(settings, "APP__UPSTREAM_MODE", &v);
    }

    if let Some(v) = lookup("APP__UPSTREAM_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.upstream_timeout = Some(Duration::from_secs(parsed));
        }
    }

    if let Some(v) = lookup("APP__MAX_UPLOAD_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_upload_bytes = parsed;
        }
    }
}

/// An unknown mode keeps whatever an earlier layer chose.
fn apply_mode(settings: &mut Settings, source: &str, raw: &str) {
    match UpstreamMode::parse(raw) {
        Some(mode) => settings.upstream_mode = Some(mode),
        None => tracing::warn!(
            source,
            value = raw,
            kept = ?settings.upstream_mode,
            "ignoring unknown upstream mode"
        ),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
