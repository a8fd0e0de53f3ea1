use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use shared::protocol::{DEFAULT_CHAT_MODEL, DEFAULT_TRANSCRIPTION_MODEL};
use tracing::warn;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub openai_api_key: Option<String>,
    pub transcription_base_url: String,
    pub transcription_model: String,
    pub chat_model: String,
    pub static_dir: PathBuf,
    pub max_audio_bytes: usize,
    pub upstream_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            openai_api_key: None,
            transcription_base_url: "https://api.openai.com/v1".into(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.into(),
            chat_model: DEFAULT_CHAT_MODEL.into(),
            static_dir: PathBuf::from("./static"),
            max_audio_bytes: 25 * 1024 * 1024,
            upstream_timeout_seconds: 120,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

/// Defaults, then the flat key/value file at `path`, then `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable settings file"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("OPENAI_API_KEY") {
        settings.openai_api_key = Some(v);
    }
    if let Some(v) = env("APP__OPENAI_API_KEY") {
        settings.openai_api_key = Some(v);
    }

    if let Some(v) = env("TRANSCRIPTION_BASE_URL") {
        settings.transcription_base_url = v;
    }
    if let Some(v) = env("TRANSCRIPTION_MODEL") {
        settings.transcription_model = v;
    }
    if let Some(v) = env("CHAT_MODEL") {
        settings.chat_model = v;
    }
    if let Some(v) = env("STATIC_DIR") {
        settings.static_dir = PathBuf::from(v);
    }

    if let Some(v) = env("APP__MAX_AUDIO_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_audio_bytes = parsed;
        }
    }
    if let Some(v) = env("APP__UPSTREAM_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.upstream_timeout_seconds = parsed;
        }
    }

    if settings
        .openai_api_key
        .as_deref()
        .is_some_and(|key| key.trim().is_empty())
    {
        settings.openai_api_key = None;
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("transcription_base_url") {
        settings.transcription_base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("transcription_model") {
        settings.transcription_model = v.clone();
    }
    if let Some(v) = file_cfg.get("chat_model") {
        settings.chat_model = v.clone();
    }
    if let Some(v) = file_cfg.get("static_dir") {
        settings.static_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("max_audio_bytes") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_audio_bytes = parsed;
        }
    }
}

/// Warns when the panorama directory is missing; the server still starts
/// and answers `/transcribe`.
pub fn check_static_dir(static_dir: &Path) -> bool {
    let exists = static_dir.is_dir();
    if !exists {
        warn!(
            static_dir = %static_dir.display(),
            "static directory not found; panorama images will 404"
        );
    }
    exists
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
