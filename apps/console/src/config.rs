use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub database_url: String,
    pub cache_ttl_seconds: u64,
    pub page_size: usize,
    pub export_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api/".into(),
            database_url: "sqlite://./data/console.db".into(),
            cache_ttl_seconds: 600,
            page_size: 10,
            export_dir: PathBuf::from("./exports"),
        }
    }
}

impl Settings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// Keys accepted in `console.toml`; anything missing keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    database_url: Option<String>,
    cache_ttl_seconds: Option<u64>,
    page_size: Option<usize>,
    export_dir: Option<PathBuf>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new(CONFIG_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    let file_cfg = match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable config file");
            return;
        }
    };

    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.cache_ttl_seconds {
        settings.cache_ttl_seconds = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v.max(1);
    }
    if let Some(v) = file_cfg.export_dir {
        settings.export_dir = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("APP__CACHE_TTL_SECONDS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.cache_ttl_seconds = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__CACHE_TTL_SECONDS"),
        }
    }

    if let Some(v) = lookup("APP__PAGE_SIZE") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.page_size = parsed.max(1),
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__PAGE_SIZE"),
        }
    }

    if let Some(v) = lookup("APP__EXPORT_DIR") {
        settings.export_dir = PathBuf::from(v);
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
