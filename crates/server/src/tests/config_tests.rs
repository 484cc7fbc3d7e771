use super::{load_seed, load_settings_from, Settings};

use std::{
    collections::HashMap,
    env, fs,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_path(name: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("scene_server_{suffix}_{name}"))
}

#[test]
fn defaults_without_file_or_env() {
    let settings = load_settings_from(Path::new("/no/such/server.toml"), |_| None);
    let defaults = Settings::default();
    assert_eq!(settings.server_bind, defaults.server_bind);
    assert_eq!(settings.seed_path, None);
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let path = temp_path("server.toml");
    fs::write(
        &path,
        "bind_addr = \"0.0.0.0:9000\"\nseed_path = \"file-seed.json\"\n",
    )
    .expect("write");
    let vars: HashMap<&str, &str> = [
        ("SERVER_BIND", "127.0.0.1:7000"),
        ("APP__BIND_ADDR", "127.0.0.1:7001"),
        ("SCENE_SEED_PATH", "env-seed.json"),
    ]
    .into_iter()
    .collect();

    let settings = load_settings_from(&path, |key| vars.get(key).map(|v| v.to_string()));
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.server_bind, "127.0.0.1:7001");
    assert_eq!(settings.seed_path.as_deref(), Some(Path::new("env-seed.json")));
}

#[test]
fn file_values_apply_without_env() {
    let path = temp_path("server.toml");
    fs::write(&path, "bind_addr = \"0.0.0.0:9000\"\n").expect("write");

    let settings = load_settings_from(&path, |_| None);
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.server_bind, "0.0.0.0:9000");
}

#[test]
fn missing_seed_path_uses_demo_board() {
    let seed = load_seed(None).expect("demo");
    assert!(!seed.scenes.is_empty());
    assert!(!seed.productions.is_empty());
}

#[test]
fn unreadable_or_invalid_seed_is_an_error() {
    let missing = temp_path("missing.json");
    let err = load_seed(Some(missing.as_path())).expect_err("missing file");
    assert!(err.to_string().contains("failed to read seed file"));

    let invalid = temp_path("invalid.json");
    fs::write(&invalid, "{ \"scenes\": [{ \"id\": \"s\", \"title\": \"T\", \"step\": 9 }] }")
        .expect("write");
    let err = load_seed(Some(invalid.as_path())).expect_err("step out of range");
    fs::remove_file(&invalid).expect("cleanup");
    assert!(err.to_string().contains("not valid scene json"));
}
