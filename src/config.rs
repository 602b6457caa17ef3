// ABOUTME: Configuration loading for threadchat.
// ABOUTME: Reads ~/.threadchat/config.toml and resolves API key, assistant id, and login from env.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::auth::Credentials;
use crate::gateway::{DEFAULT_BASE_URL, GatewayConfig, PollPolicy};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub poll: PollConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    /// Profile used when no `--assistant` flag is given.
    pub default_assistant: String,
    pub assistants: HashMap<String, AssistantProfile>,
}

impl Default for Config {
    fn default() -> Self {
        let mut assistants = HashMap::new();
        assistants.insert("default".to_string(), AssistantProfile::default());
        Self {
            api: ApiConfig::default(),
            poll: PollConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            default_assistant: "default".to_string(),
            assistants,
        }
    }
}

/// Hosted API connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

/// Shortest allowed gap between run status checks.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Run status polling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Raised to `MIN_POLL_INTERVAL_MS` when lower.
    pub interval_ms: u64,
    /// 0 polls without a ceiling.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            interval_ms: policy.interval.as_millis() as u64,
            max_attempts: policy.max_attempts.unwrap_or(0),
        }
    }
}

impl PollConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms.max(MIN_POLL_INTERVAL_MS)),
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
        }
    }
}

/// Where saved threads live.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub threads_dir: Option<PathBuf>,
}

/// Login gate credentials. Unset means no login prompt.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// One selectable assistant. `id` wins over `id_env` when both are set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantProfile {
    pub id: Option<String>,
    pub id_env: Option<String>,
    /// Banner shown when the chat opens.
    pub title: Option<String>,
}

impl Default for AssistantProfile {
    fn default() -> Self {
        Self {
            id: None,
            id_env: Some("ASSISTANT_ID".to_string()),
            title: None,
        }
    }
}

impl Config {
    /// Load config from ~/.threadchat/config.toml, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Base directory for config, secrets, and saved threads.
    pub fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".threadchat")
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    /// Path to the secrets env file loaded at startup.
    pub fn secrets_env_path() -> PathBuf {
        Self::base_dir().join(".env")
    }

    /// Directory holding saved threads.
    pub fn threads_dir(&self) -> PathBuf {
        self.storage
            .threads_dir
            .clone()
            .unwrap_or_else(|| Self::base_dir().join("saved_threads"))
    }

    /// Name of the profile to use, given an optional CLI override.
    pub fn profile_name<'a>(&'a self, selected: Option<&'a str>) -> &'a str {
        selected.unwrap_or(&self.default_assistant)
    }

    pub fn profile(&self, name: &str) -> anyhow::Result<&AssistantProfile> {
        self.assistants.get(name).with_context(|| {
            let mut known: Vec<&str> = self.assistants.keys().map(String::as_str).collect();
            known.sort_unstable();
            format!(
                "Unknown assistant profile: '{}'. Configured: {}",
                name,
                known.join(", ")
            )
        })
    }

    /// Resolve the gateway settings for a profile, reading secrets through `env`.
    pub fn gateway_config(
        &self,
        profile_name: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<GatewayConfig> {
        let profile = self.profile(profile_name)?;
        let api_key = env(&self.api.api_key_env)
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("API key not set: export {}", self.api.api_key_env))?;
        let assistant_id = profile
            .id
            .clone()
            .or_else(|| profile.id_env.as_deref().and_then(&env))
            .filter(|id| !id.trim().is_empty())
            .with_context(|| match &profile.id_env {
                Some(var) => format!(
                    "No assistant id for profile '{}': set `id` in config or export {}",
                    profile_name, var
                ),
                None => format!("No assistant id for profile '{}'", profile_name),
            })?;

        Ok(GatewayConfig {
            api_key,
            base_url: self.api.base_url.clone(),
            assistant_id,
            poll: self.poll.policy(),
            request_timeout: Duration::from_secs(self.api.request_timeout_seconds),
        })
    }

    /// Login credentials from config, with THREADCHAT_USERNAME/PASSWORD taking precedence.
    pub fn credentials(&self, env: impl Fn(&str) -> Option<String>) -> Option<Credentials> {
        let username = env("THREADCHAT_USERNAME").or_else(|| self.auth.username.clone())?;
        let password = env("THREADCHAT_PASSWORD").or_else(|| self.auth.password.clone())?;
        Some(Credentials::new(username, password))
    }
}

/// Environment lookup used outside tests.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.openai.com/v1");
        assert_eq!(config.poll.interval_ms, 1000);
        assert_eq!(config.poll.max_attempts, 600);
        assert_eq!(config.default_assistant, "default");
        assert!(config.assistants.contains_key("default"));
    }

    #[test]
    fn parse_config_toml() {
        let toml_str = r#"
default_assistant = "interreg"

[api]
base_url = "http://localhost:8080/v1"
request_timeout_seconds = 10

[poll]
interval_ms = 250
max_attempts = 0

[storage]
threads_dir = "/var/lib/threadchat"

[auth]
username = "analyst"
password = "hunter2"

[assistants.interreg]
id_env = "Interreg_assistant"
title = "Interreg Assistant"

[assistants.ecosystem]
id = "asst_eco"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080/v1");
        assert_eq!(config.api.api_key_env, "OPENAI_API_KEY");
        assert_eq!(
            config.poll.policy(),
            PollPolicy {
                interval: Duration::from_millis(250),
                max_attempts: None,
            }
        );
        assert_eq!(config.threads_dir(), PathBuf::from("/var/lib/threadchat"));
        assert_eq!(config.assistants.len(), 2);
        assert_eq!(config.profile_name(None), "interreg");
        assert_eq!(config.profile_name(Some("ecosystem")), "ecosystem");
    }

    #[test]
    fn parse_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[poll]\ninterval_ms = 2000\n").unwrap();
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.max_attempts, 600);
        assert_eq!(config.api.request_timeout_seconds, 30);
        assert!(config.threads_dir().ends_with("saved_threads"));
    }

    #[test]
    fn zero_interval_is_raised_to_floor() {
        let config: Config = toml::from_str("[poll]\ninterval_ms = 0\nmax_attempts = 0\n").unwrap();
        let policy = config.poll.policy();
        assert_eq!(policy.interval, Duration::from_millis(MIN_POLL_INTERVAL_MS));
        assert_eq!(policy.max_attempts, None);

        let config: Config = toml::from_str("[poll]\ninterval_ms = 250\n").unwrap();
        assert_eq!(config.poll.policy().interval, Duration::from_millis(250));
    }

    #[test]
    fn load_from_missing_path_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_assistant, "default");
    }

    #[test]
    fn load_from_invalid_toml_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[poll\ninterval_ms = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn gateway_config_reads_key_and_assistant_from_env() {
        let config = Config::default();
        let gateway = config
            .gateway_config(
                "default",
                env_of(&[("OPENAI_API_KEY", "sk-live"), ("ASSISTANT_ID", "asst_9")]),
            )
            .unwrap();
        assert_eq!(gateway.api_key, "sk-live");
        assert_eq!(gateway.assistant_id, "asst_9");
        assert_eq!(gateway.poll, PollPolicy::default());
        assert_eq!(gateway.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn explicit_assistant_id_wins_over_env() {
        let mut config = Config::default();
        config.assistants.insert(
            "pinned".to_string(),
            AssistantProfile {
                id: Some("asst_pinned".to_string()),
                id_env: Some("ASSISTANT_ID".to_string()),
                title: None,
            },
        );
        let gateway = config
            .gateway_config(
                "pinned",
                env_of(&[("OPENAI_API_KEY", "sk"), ("ASSISTANT_ID", "asst_env")]),
            )
            .unwrap();
        assert_eq!(gateway.assistant_id, "asst_pinned");
    }

    #[test]
    fn missing_key_or_assistant_errors() {
        let config = Config::default();
        let err = config
            .gateway_config("default", env_of(&[("ASSISTANT_ID", "asst_9")]))
            .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let err = config
            .gateway_config("default", env_of(&[("OPENAI_API_KEY", "sk")]))
            .unwrap_err();
        assert!(err.to_string().contains("ASSISTANT_ID"));
    }

    #[test]
    fn unknown_profile_errors() {
        let config = Config::default();
        let err = config
            .gateway_config("nope", env_of(&[("OPENAI_API_KEY", "sk")]))
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn credentials_env_overrides_config() {
        let mut config = Config::default();
        assert!(config.credentials(env_of(&[])).is_none());

        config.auth.username = Some("analyst".to_string());
        config.auth.password = Some("from-config".to_string());
        let creds = config
            .credentials(env_of(&[("THREADCHAT_PASSWORD", "from-env")]))
            .unwrap();
        assert!(creds.verify("analyst", "from-env"));
        assert!(!creds.verify("analyst", "from-config"));
    }
}
