use crate::error::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const HOME_ENV_VAR: &str = "NEURODOC_HOME";

/// Client configuration, read from `config.toml` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the search service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_search_path")]
    pub search_path: String,

    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Delay between two revealed characters of a textual response
    #[serde(default = "default_reveal_interval_ms")]
    pub reveal_interval_ms: u64,

    /// How long a notification stays visible
    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,

    /// Keep search history in `history.json` across restarts
    #[serde(default = "default_true")]
    pub persist_history: bool,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_search_path() -> String {
    "/search/api_search".to_string()
}

fn default_upload_path() -> String {
    "/upload/".to_string()
}

fn default_reveal_interval_ms() -> u64 {
    30
}

fn default_notification_ttl_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            upload_path: default_upload_path(),
            reveal_interval_ms: default_reveal_interval_ms(),
            notification_ttl_ms: default_notification_ttl_ms(),
            persist_history: default_true(),
        }
    }
}

impl ClientConfig {
    /// Loads `config.toml` from `data_dir`. A missing file yields the defaults.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILENAME);
        let config = match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(&self.base_url)
            .map_err(|err| ConfigError::Invalid(format!("base_url `{}`: {err}", self.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "base_url `{}` is not a hierarchical URL",
                self.base_url
            )));
        }
        if self.reveal_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "reveal_interval_ms must be > 0".to_string(),
            ));
        }
        if self.notification_ttl_ms == 0 {
            return Err(ConfigError::Invalid(
                "notification_ttl_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn search_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint(&self.search_path)
    }

    pub fn upload_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint(&self.upload_path)
    }

    /// Appends `path` to `base_url`, keeping any path prefix the base carries.
    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let prefix = format!("{}/", base.path());
            base.set_path(&prefix);
        }
        base.join(path.trim_start_matches('/'))
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

/// `$NEURODOC_HOME` when set, otherwise `<platform config dir>/neurodoc`.
pub fn find_data_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = std::env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::config_dir()
        .map(|dir| dir.join("neurodoc"))
        .ok_or(ConfigError::NoDataDir)
}
