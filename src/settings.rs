use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "docview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Base URL of the document API the viewer talks to
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Listen address for `docview serve`
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,

    /// Directory with PDFs served under `/mock-documents/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<PathBuf>,

    /// Overall timeout for one fetch; no timeout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_secs: Option<u64>,

    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_delay_min_ms() -> u64 {
    200
}

fn default_delay_max_ms() -> u64 {
    1000
}

fn default_theme() -> String {
    "Oceanic Next".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            server_url: default_server_url(),
            bind: default_bind(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
            documents_dir: None,
            fetch_timeout_secs: None,
            theme: default_theme(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn parse_settings(content: &str) -> Result<Settings, serde_yaml::Error> {
    serde_yaml::from_str::<Settings>(content)
}

pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str("\n# Document API used by the viewer\n");
    content.push_str(&format!("server_url: {}\n", yaml_scalar(&settings.server_url)));
    content.push_str(&format!("fetch_timeout_secs: {}\n", match settings.fetch_timeout_secs {
        Some(secs) => secs.to_string(),
        None => "~".to_string(),
    }));
    content.push_str("\n# Mock API server (`docview serve`)\n");
    content.push_str(&format!("bind: {}\n", yaml_scalar(&settings.bind)));
    content.push_str(&format!("delay_min_ms: {}\n", settings.delay_min_ms));
    content.push_str(&format!("delay_max_ms: {}\n", settings.delay_max_ms));
    match &settings.documents_dir {
        Some(dir) => content.push_str(&format!(
            "documents_dir: {}\n",
            yaml_scalar(&dir.to_string_lossy())
        )),
        None => content.push_str("# documents_dir: \"/path/to/mock-documents\"\n"),
    }
    content.push_str("\n# \"Oceanic Next\" or \"Catppuccin Mocha\"\n");
    content.push_str(&format!("theme: {}\n", yaml_scalar(&settings.theme)));

    content
}

/// A string as a YAML scalar, quoted and escaped where needed
fn yaml_scalar(value: &str) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("'{}'", value.replace('\'', "''")))
}

fn update(f: impl FnOnce(&mut Settings)) {
    match SETTINGS.write() {
        Ok(mut settings) => f(&mut *settings),
        Err(poisoned) => f(&mut *poisoned.into_inner()),
    }
}

// Overrides from the command line; not written back to the file

pub fn set_server_url(url: String) {
    update(|s| s.server_url = url);
}

pub fn set_bind(bind: String) {
    update(|s| s.bind = bind);
}

pub fn set_documents_dir(dir: PathBuf) {
    update(|s| s.documents_dir = Some(dir));
}

// Public API for accessing settings

pub fn get_server_url() -> String {
    SETTINGS
        .read()
        .map(|s| s.server_url.clone())
        .unwrap_or_else(|_| default_server_url())
}

pub fn get_bind() -> String {
    SETTINGS
        .read()
        .map(|s| s.bind.clone())
        .unwrap_or_else(|_| default_bind())
}

pub fn get_delay_ms() -> std::ops::Range<u64> {
    SETTINGS
        .read()
        .map(|s| s.delay_min_ms..s.delay_max_ms)
        .unwrap_or_else(|_| default_delay_min_ms()..default_delay_max_ms())
}

pub fn get_documents_dir() -> Option<PathBuf> {
    SETTINGS.read().ok().and_then(|s| s.documents_dir.clone())
}

pub fn get_fetch_timeout() -> Option<Duration> {
    SETTINGS
        .read()
        .ok()
        .and_then(|s| s.fetch_timeout_secs)
        .map(Duration::from_secs)
}

pub fn get_theme_name() -> String {
    SETTINGS
        .read()
        .map(|s| s.theme.clone())
        .unwrap_or_else(|_| default_theme())
}
