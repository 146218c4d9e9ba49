//! Shared configuration for the ARC tools.
//!
//! TOML profiles, access-token resolution (env + keyring + plaintext),
//! and translation to `arc_core::ClientConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use arc_core::{BackendConfig, ClientConfig};

/// Keyring service name; entries are keyed `"<profile>/access-token"`.
pub const KEYRING_SERVICE: &str = "arc";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-call RPC timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The deployed script endpoint.
    #[default]
    Script,
    /// In-process mock backend.
    Mock,
}

/// A named server profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub backend: BackendKind,

    /// Script endpoint URL (required for the script backend).
    pub url: Option<String>,

    /// Override the default RPC timeout.
    pub timeout_ms: Option<u64>,

    /// Simulated latency for the mock backend.
    pub mock_latency_ms: Option<u64>,

    /// Access token (plaintext; prefer keyring or env var).
    pub access_token: Option<String>,

    /// Environment variable holding the access token.
    pub access_token_env: Option<String>,
}

impl Config {
    /// Name of the profile to use: the explicit one, else the default, else `"default"`.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("app", "arc", "arc").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("arc");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + `ARC_*` environment variables (`__` separates nesting,
/// e.g. `ARC_PROFILES__LOCAL__URL`). A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ARC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the access token from the credential chain. `None` means the
/// endpoint is called without authorization.
pub fn resolve_access_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's access_token_env → env var lookup
    if let Some(ref env_name) = profile.access_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/access-token")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .access_token
        .as_ref()
        .map(|token| SecretString::from(token.clone()))
}

/// Build a `ClientConfig` from a profile with no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let timeout = Duration::from_millis(profile.timeout_ms.unwrap_or(defaults.timeout_ms));

    let backend = match profile.backend {
        BackendKind::Script => {
            let raw = profile.url.as_deref().ok_or_else(|| ConfigError::Validation {
                field: "url".into(),
                reason: "required for the script backend".into(),
            })?;
            let url = raw.parse().map_err(|_| ConfigError::Validation {
                field: "url".into(),
                reason: format!("invalid URL: {raw}"),
            })?;
            BackendConfig::Script {
                url,
                access_token: resolve_access_token(profile, profile_name),
            }
        }
        BackendKind::Mock => BackendConfig::Mock {
            latency: Duration::from_millis(profile.mock_latency_ms.unwrap_or(300)),
        },
    };

    Ok(ClientConfig { backend, timeout })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
default_profile = "staging"

[defaults]
output = "json"
timeout_ms = 8000

[profiles.staging]
url = "https://script.example.com/macros/s/abc/exec"
access_token_env = "CARGO_PKG_NAME"

[profiles.offline]
backend = "mock"
mock_latency_ms = 0
timeout_ms = 250
"#;

    fn sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn loads_profiles_and_defaults() {
        let cfg = sample();
        assert_eq!(cfg.profile_name(None), "staging");
        assert_eq!(cfg.profile_name(Some("offline")), "offline");
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.color, "auto");
        assert_eq!(cfg.profile("offline").unwrap().backend, BackendKind::Mock);
        assert!(matches!(
            cfg.profile("nope"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout_ms, 5000);
    }

    #[test]
    fn script_profile_resolves_token_from_env() {
        // cargo sets CARGO_PKG_NAME for test processes.
        let cfg = sample();
        let client =
            profile_to_client_config(cfg.profile("staging").unwrap(), "staging", &cfg.defaults)
                .unwrap();

        assert_eq!(client.timeout, Duration::from_millis(8000));
        match client.backend {
            BackendConfig::Script { url, access_token } => {
                assert_eq!(url.host_str(), Some("script.example.com"));
                assert_eq!(access_token.unwrap().expose_secret(), "arc-config");
            }
            BackendConfig::Mock { .. } => panic!("expected script backend"),
        }
    }

    #[test]
    fn mock_profile_needs_no_url() {
        let cfg = sample();
        let client =
            profile_to_client_config(cfg.profile("offline").unwrap(), "offline", &cfg.defaults)
                .unwrap();
        assert_eq!(client.timeout, Duration::from_millis(250));
        assert!(matches!(
            client.backend,
            BackendConfig::Mock { latency } if latency.is_zero()
        ));
    }

    #[test]
    fn script_profile_without_url_is_rejected() {
        let err = profile_to_client_config(&Profile::default(), "bare", &Defaults::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid url: required for the script backend");
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "local".into(),
            Profile {
                backend: BackendKind::Mock,
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile("local").unwrap().backend, BackendKind::Mock);
    }
}
