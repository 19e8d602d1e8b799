use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths;

pub const DEFAULT_SCOPES: &str = "repo user:email";
pub const DEFAULT_LOGIN_BASE_URL: &str = "https://github.com";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;
pub const DEFAULT_BRANCH: &str = "main";

const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GitHub client id is not configured (set GITHUB_CLIENT_ID or client_id in config)")]
    MissingClientId,

    #[error("max_poll_attempts must be at least 1")]
    InvalidPollAttempts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OAuth app client id used for the device flow
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_scopes")]
    pub scopes: String,
    #[serde(default)]
    pub http_proxy: String,
    #[serde(default)]
    pub https_proxy: String,
    #[serde(default)]
    pub http_proxy_auth: Option<ProxyAuth>,
    #[serde(default)]
    pub https_proxy_auth: Option<ProxyAuth>,
    #[serde(default = "default_login_base_url")]
    pub github_login_base_url: String,
    #[serde(default = "default_api_base_url")]
    pub github_api_base_url: String,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Transient-failure retries for HTTP calls. Zero keeps every call single-shot.
    #[serde(default)]
    pub http_max_retries: u32,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub private_repos: bool,
    #[serde(default)]
    pub open_browser: bool,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

fn default_scopes() -> String {
    DEFAULT_SCOPES.to_string()
}

fn default_login_base_url() -> String {
    DEFAULT_LOGIN_BASE_URL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_max_poll_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl Default for Config {
    fn default() -> Self {
        Config {
            client_id: String::new(),
            scopes: default_scopes(),
            http_proxy: String::new(),
            https_proxy: String::new(),
            http_proxy_auth: None,
            https_proxy_auth: None,
            github_login_base_url: default_login_base_url(),
            github_api_base_url: default_api_base_url(),
            max_poll_attempts: default_max_poll_attempts(),
            http_max_retries: 0,
            default_branch: default_branch(),
            private_repos: false,
            open_browser: false,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load from ~/.chat_archiver/config.json, falling back to ./config.toml,
    /// then apply environment overrides.
    pub fn new() -> Self {
        let mut config = Self::load_from(&paths::config_json_path(), Path::new(CONFIG_FILE_PATH));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn load_from(json_path: &Path, toml_path: &Path) -> Self {
        if json_path.exists() {
            match std::fs::read_to_string(json_path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<Config>(&content).map_err(|e| e.to_string())
                }) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring {}: {}", json_path.display(), e),
            }
        }

        if toml_path.exists() {
            match std::fs::read_to_string(toml_path)
                .map_err(|e| e.to_string())
                .and_then(|content| toml::from_str::<Config>(&content).map_err(|e| e.to_string()))
            {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring {}: {}", toml_path.display(), e),
            }
        }

        Config::default()
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup("GITHUB_CLIENT_ID") {
            self.client_id = client_id.trim().to_string();
        }
        if let Some(scopes) = lookup("GITHUB_SCOPES") {
            self.scopes = scopes;
        }
        if let Some(http_proxy) = lookup("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Some(https_proxy) = lookup("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
        if let Some(url) = lookup("GITHUB_LOGIN_BASE_URL") {
            self.github_login_base_url = url;
        }
        if let Some(url) = lookup("GITHUB_API_BASE_URL") {
            self.github_api_base_url = url;
        }
        if let Some(attempts) = lookup("CHAT_ARCHIVER_MAX_POLL_ATTEMPTS")
            .and_then(|value| value.trim().parse::<u32>().ok())
        {
            self.max_poll_attempts = attempts;
        }
        if let Some(dir) = lookup("CHAT_ARCHIVER_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(open) = lookup("CHAT_ARCHIVER_OPEN_BROWSER") {
            self.open_browser = parse_bool_env(&open);
        }
        if let Some(private) = lookup("CHAT_ARCHIVER_PRIVATE_REPOS") {
            self.private_repos = parse_bool_env(&private);
        }
    }

    /// Directory holding storage.json
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(paths::archiver_dir)
    }

    /// Checks the settings the device flow cannot run without
    pub fn validate_for_auth(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if self.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidPollAttempts);
        }
        Ok(())
    }

    pub fn scope_list(&self) -> Vec<String> {
        self.scopes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_bool_env_true_values() {
        for value in ["1", "true", "TRUE", " yes ", "Y", "on"] {
            assert!(parse_bool_env(value), "value {value:?} should be true");
        }
    }

    #[test]
    fn parse_bool_env_false_values() {
        for value in ["0", "false", "no", "off", "", "  "] {
            assert!(!parse_bool_env(value), "value {value:?} should be false");
        }
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("none.json"), &dir.path().join("none.toml"));
        assert_eq!(config.scopes, DEFAULT_SCOPES);
        assert_eq!(config.max_poll_attempts, 120);
        assert_eq!(config.default_branch, "main");
        assert!(!config.private_repos);
    }

    #[test]
    fn json_takes_precedence_over_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_path = dir.path().join("config.json");
        let toml_path = dir.path().join("config.toml");
        std::fs::write(&json_path, r#"{"client_id":"from-json"}"#).expect("write json");
        std::fs::write(&toml_path, "client_id = \"from-toml\"\n").expect("write toml");

        let config = Config::load_from(&json_path, &toml_path);
        assert_eq!(config.client_id, "from-json");
        assert_eq!(config.github_api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn invalid_json_falls_back_to_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_path = dir.path().join("config.json");
        let toml_path = dir.path().join("config.toml");
        std::fs::write(&json_path, "{not json").expect("write json");
        std::fs::write(&toml_path, "client_id = \"from-toml\"\nmax_poll_attempts = 10\n")
            .expect("write toml");

        let config = Config::load_from(&json_path, &toml_path);
        assert_eq!(config.client_id, "from-toml");
        assert_eq!(config.max_poll_attempts, 10);
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GITHUB_CLIENT_ID", " Iv1.abc "),
            ("CHAT_ARCHIVER_MAX_POLL_ATTEMPTS", "7"),
            ("CHAT_ARCHIVER_OPEN_BROWSER", "yes"),
            ("CHAT_ARCHIVER_DATA_DIR", "/tmp/archive"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.client_id, "Iv1.abc");
        assert_eq!(config.max_poll_attempts, 7);
        assert!(config.open_browser);
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/archive"));
    }

    #[test]
    fn unparsable_attempts_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == "CHAT_ARCHIVER_MAX_POLL_ATTEMPTS").then(|| "lots".to_string())
        });
        assert_eq!(config.max_poll_attempts, DEFAULT_MAX_POLL_ATTEMPTS);
    }

    #[test]
    fn validate_requires_client_id() {
        let mut config = Config::default();
        assert!(matches!(
            config.validate_for_auth(),
            Err(ConfigError::MissingClientId)
        ));

        config.client_id = "Iv1.abc".to_string();
        assert!(config.validate_for_auth().is_ok());

        config.max_poll_attempts = 0;
        assert!(matches!(
            config.validate_for_auth(),
            Err(ConfigError::InvalidPollAttempts)
        ));
    }

    #[test]
    fn scope_list_splits_on_spaces_and_commas() {
        let mut config = Config::default();
        config.scopes = "repo, user:email  gist".to_string();
        assert_eq!(config.scope_list(), vec!["repo", "user:email", "gist"]);
    }
}
