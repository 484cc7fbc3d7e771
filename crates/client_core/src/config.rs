use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

use crate::notify::FeedbackDurations;

pub const DEFAULT_SETTINGS_FILE: &str = "studio.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub request_timeout: Duration,
    pub feedback: FeedbackDurations,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8443".into(),
            request_timeout: Duration::from_secs(10),
            feedback: FeedbackDurations::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_ms: Option<u64>,
    error_feedback_ms: Option<u64>,
    success_feedback_ms: Option<u64>,
    info_feedback_ms: Option<u64>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then `path` if it exists, then environment overrides read
/// through `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring malformed settings file"),
        }
    }

    if let Some(v) = env("STUDIO_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(ms) = env_millis(&env, "STUDIO_REQUEST_TIMEOUT_MS") {
        settings.request_timeout = ms;
    }
    if let Some(ms) = env_millis(&env, "STUDIO_ERROR_FEEDBACK_MS") {
        settings.feedback.error = ms;
    }
    if let Some(ms) = env_millis(&env, "STUDIO_SUCCESS_FEEDBACK_MS") {
        settings.feedback.success = ms;
    }
    if let Some(ms) = env_millis(&env, "STUDIO_INFO_FEEDBACK_MS") {
        settings.feedback.info = ms;
    }

    settings
}

fn apply_file(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(ms) = file_cfg.request_timeout_ms {
        settings.request_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = file_cfg.error_feedback_ms {
        settings.feedback.error = Duration::from_millis(ms);
    }
    if let Some(ms) = file_cfg.success_feedback_ms {
        settings.feedback.success = Duration::from_millis(ms);
    }
    if let Some(ms) = file_cfg.info_feedback_ms {
        settings.feedback.info = Duration::from_millis(ms);
    }
}

fn env_millis(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = env(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!(key, value = %raw, "ignoring non-numeric duration override");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
