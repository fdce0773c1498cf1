//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/katello-system/config.toml` (or `--config <FILE>`)
//! 3. Environment variables: `KATELLO_*` prefix, `__` between section and key
//! 4. Command line flags (applied by the CLI layer)

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Connection settings for the Katello server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    /// API base URL, e.g. `https://katello.example.com/katello/api`
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Accept invalid TLS certificates
    pub insecure: bool,
    /// Per-request timeout in seconds (none = reqwest default)
    pub timeout_secs: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: "https://localhost/katello/api".into(),
            username: None,
            password: None,
            insecure: false,
            timeout_secs: None,
        }
    }
}

/// Fallback values for options omitted on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultSettings {
    pub org: Option<String>,
}

/// Remote task polling.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskSettings {
    /// Give up waiting after this many seconds (none = wait until the task ends)
    pub timeout_secs: Option<u64>,
}

impl TaskSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Unified configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub defaults: DefaultSettings,
    pub tasks: TaskSettings,
    /// Directory binary reports are saved to
    pub report_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            defaults: DefaultSettings::default(),
            tasks: TaskSettings::default(),
            report_dir: PathBuf::from("."),
        }
    }
}

/// Raw server section for intermediate parsing (Option = "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawServerSettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub insecure: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub server: RawServerSettings,
    pub defaults: DefaultSettings,
    pub tasks: TaskSettings,
    pub report_dir: Option<PathBuf>,
}

/// Get the XDG config directory.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "katello-system").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        let raw = self.report_dir.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.report_dir = PathBuf::from(expanded);
    }

    /// Overlay a config file: specified values win, everything else is kept.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let server = &overlay.server;
        Self {
            server: ServerSettings {
                url: server.url.clone().unwrap_or_else(|| self.server.url.clone()),
                username: server
                    .username
                    .clone()
                    .or_else(|| self.server.username.clone()),
                password: server
                    .password
                    .clone()
                    .or_else(|| self.server.password.clone()),
                insecure: server.insecure.unwrap_or(self.server.insecure),
                timeout_secs: server.timeout_secs.or(self.server.timeout_secs),
            },
            defaults: DefaultSettings {
                org: overlay
                    .defaults
                    .org
                    .clone()
                    .or_else(|| self.defaults.org.clone()),
            },
            tasks: TaskSettings {
                timeout_secs: overlay.tasks.timeout_secs.or(self.tasks.timeout_secs),
            },
            report_dir: overlay
                .report_dir
                .clone()
                .unwrap_or_else(|| self.report_dir.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// `config_file` replaces the global config location; it must exist when given.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        current = current.merge_with(&load_raw_settings(&global_path)?);
                    }
                }
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply KATELLO_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("KATELLO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("server.url") {
            settings.server.url = val;
        }
        if let Ok(val) = config.get_string("server.username") {
            settings.server.username = Some(val);
        }
        if let Ok(val) = config.get_string("server.password") {
            settings.server.password = Some(val);
        }
        if let Ok(val) = config.get_bool("server.insecure") {
            settings.server.insecure = val;
        }
        if let Ok(val) = config.get_int("server.timeout_secs") {
            settings.server.timeout_secs = u64::try_from(val).ok();
        }
        if let Ok(val) = config.get_string("defaults.org") {
            settings.defaults.org = Some(val);
        }
        if let Ok(val) = config.get_int("tasks.timeout_secs") {
            settings.tasks.timeout_secs = u64::try_from(val).ok();
        }
        if let Ok(val) = config.get_string("report_dir") {
            settings.report_dir = PathBuf::from(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML, password masked.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        let mut shown = self.clone();
        if shown.server.password.is_some() {
            shown.server.password = Some("********".into());
        }
        toml::to_string_pretty(&shown).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# katello-system configuration
#
# Locations (by precedence, lowest to highest):
#   File: ~/.config/katello-system/config.toml (or --config FILE)
#   Env:  KATELLO_<SECTION>__<KEY>, e.g. KATELLO_SERVER__URL
#   CLI:  --url, --username, --password, --task-timeout

# Directory pdf reports are written to
# report_dir = "."

[server]
# url = "https://katello.example.com/katello/api"
# username = "admin"
# password = "admin"
# insecure = false
# timeout_secs = 60

[defaults]
# Organization used when --org is omitted
# org = "ACME_Corporation"

[tasks]
# Stop waiting for remote package tasks after this many seconds
# timeout_secs = 600
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
