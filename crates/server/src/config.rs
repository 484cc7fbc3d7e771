use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::book::Seed;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub seed_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8443".into(),
            seed_path: None,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("seed_path") {
                settings.seed_path = Some(PathBuf::from(v));
            }
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("SCENE_SEED_PATH") {
        settings.seed_path = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__SEED_PATH") {
        settings.seed_path = Some(PathBuf::from(v));
    }

    settings
}

/// Reads the configured seed file, or falls back to the demo board.
pub fn load_seed(seed_path: Option<&Path>) -> anyhow::Result<Seed> {
    let Some(path) = seed_path else {
        info!("no seed file configured; using demo scenes");
        return Ok(Seed::demo());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file '{}'", path.display()))?;
    let seed = Seed::from_json(&raw)
        .with_context(|| format!("seed file '{}' is not valid scene json", path.display()))?;
    info!(
        path = %path.display(),
        scenes = seed.scenes.len(),
        productions = seed.productions.len(),
        "loaded scene seed"
    );
    Ok(seed)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
