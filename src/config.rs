use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const CONFIG_PATH: &str = "~/.config/marktplatz/config.json";

pub const DEFAULT_BASE_URL: &str = "https://my.living-apps.de/rest";
pub const DEFAULT_APP_ID: &str = "69973d478f87c3d22d5c7258";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Ambient configuration. The session itself is established elsewhere;
/// this crate only carries the cookie it is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub app_id: String,
    pub session_cookie: Option<String>,
    pub anthropic_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_owned(),
            app_id: DEFAULT_APP_ID.to_owned(),
            session_cookie: None,
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_owned(),
            anthropic_api_key: None,
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_owned(),
        }
    }
}

impl Config {
    /// Environment wins over the config file for secrets.
    fn with_env(mut self, cookie: Option<String>, api_key: Option<String>) -> Self {
        if let Some(cookie) = cookie.filter(|v| !v.is_empty()) {
            self.session_cookie = Some(cookie);
        }
        if let Some(key) = api_key.filter(|v| !v.is_empty()) {
            self.anthropic_api_key = Some(key);
        }
        self
    }
}

/// A missing config file is not an error, an unreadable one is.
pub fn read() -> Result<Config> {
    let path = config_path()?;
    let config = read_if_found(&path)?
        .map(|raw| {
            serde_json::from_str::<Config>(&raw)
                .with_context(|| format!("Error de-serialising config file {}", path.display()))
        })
        .unwrap_or_else(|| Ok(Config::default()))?;
    Ok(config.with_env(
        env_var("MARKTPLATZ_SESSION_COOKIE"),
        env_var("ANTHROPIC_API_KEY"),
    ))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn read_if_found(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(c) => Ok(Some(c)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn config_path() -> Result<PathBuf> {
    let path = shellexpand::full(CONFIG_PATH)
        .with_context(|| format!("Config file path {} is invalid", CONFIG_PATH))?;
    Ok(PathBuf::from(path.as_ref()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_point_at_the_hosted_services() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://my.living-apps.de/rest");
        assert_eq!(config.app_id, "69973d478f87c3d22d5c7258");
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn partial_config_files_fall_back_per_key() {
        let config: Config =
            serde_json::from_str(r#"{"app_id":"other-app"}"#).unwrap();
        assert_eq!(config.app_id, "other-app");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn env_overrides_file_values_but_not_with_empty_strings() {
        let base = Config {
            session_cookie: Some("file-cookie".to_owned()),
            ..Config::default()
        };
        let config = base
            .clone()
            .with_env(Some("env-cookie".to_owned()), Some("env-key".to_owned()));
        assert_eq!(config.session_cookie.as_deref(), Some("env-cookie"));
        assert_eq!(config.anthropic_api_key.as_deref(), Some("env-key"));

        let config = base.with_env(Some(String::new()), None);
        assert_eq!(config.session_cookie.as_deref(), Some("file-cookie"));
        assert!(config.anthropic_api_key.is_none());
    }
}
