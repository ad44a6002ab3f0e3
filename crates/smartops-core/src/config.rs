use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SmartOpsError};
use crate::types::OperationalWindow;

/// Top-level configuration for the SmartOps service.
///
/// Loaded from `~/.smartops/config.toml` by default. Each section corresponds
/// to one stage of the command pipeline or a cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmartOpsConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub guardrails: GuardrailConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl SmartOpsConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SmartOpsConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SmartOpsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let g = &self.guardrails;
        if g.window_start_hour >= g.window_end_hour || g.window_end_hour > 24 {
            return Err(SmartOpsError::Config(format!(
                "Invalid operational window: {:02}:00-{:02}:00",
                g.window_start_hour, g.window_end_hour
            )));
        }
        if self.llm.history_turns == 0 {
            return Err(SmartOpsError::Config(
                "llm.history_turns must be at least 1".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 || self.execution.executor_timeout_secs == 0 {
            return Err(SmartOpsError::Config(
                "Timeouts must be greater than zero".to_string(),
            ));
        }
        if self.execution.fallback_job_label.trim().is_empty() {
            return Err(SmartOpsError::Config(
                "execution.fallback_job_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite operation log.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.smartops/data".to_string(),
            log_level: "info".to_string(),
            port: 8000,
        }
    }
}

/// Language-model classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub api_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on a single classifier call.
    pub timeout_secs: u64,
    /// Number of prior conversation turns forwarded to the model.
    pub history_turns: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.1,
            timeout_secs: 30,
            history_turns: 6,
        }
    }
}

/// Business rules applied to proposed actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailConfig {
    /// First hour of the operational window (inclusive).
    pub window_start_hour: u32,
    /// Hour at which the operational window closes (exclusive).
    pub window_end_hour: u32,
    /// Recipient domains that may never be contacted.
    pub blocked_domains: Vec<String>,
    /// Keywords marking a plain-text reply as outside the service's domain.
    pub out_of_scope_keywords: Vec<String>,
}

impl GuardrailConfig {
    pub fn window(&self) -> OperationalWindow {
        OperationalWindow::new(self.window_start_hour, self.window_end_hour)
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            window_start_hour: 8,
            window_end_hour: 18,
            blocked_domains: vec!["temporary-mail.com".to_string(), "spam.org".to_string()],
            out_of_scope_keywords: [
                "weather", "recipe", "joke", "poem", "song", "lyrics", "movie", "sports",
                "football", "stock price", "bitcoin", "crypto", "horoscope", "homework",
                "write code", "translate",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Settings for the confirmation/execution path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Upper bound on a single executor call.
    pub executor_timeout_secs: u64,
    /// Longest command accepted by the analyze endpoint, in characters.
    pub max_command_length: usize,
    /// Label used in derived job identities when no recipient is known.
    pub fallback_job_label: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            executor_timeout_secs: 10,
            max_command_length: 2000,
            fallback_job_label: "general".to_string(),
        }
    }
}

/// Background dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How long the dispatcher sleeps when no job is pending.
    pub idle_poll_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { idle_poll_secs: 60 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Requests allowed per second across the operations routes.
    pub max_requests_per_sec: u64,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
    /// Extra browser origins allowed by CORS, besides the server's own.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_requests_per_sec: 100,
            body_limit_bytes: 1024 * 1024,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = SmartOpsConfig::default();
        assert_eq!(config.general.port, 8000);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.history_turns, 6);
        assert_eq!(config.guardrails.window_start_hour, 8);
        assert_eq!(config.guardrails.window_end_hour, 18);
        assert!(config.guardrails.blocked_domains.contains(&"spam.org".to_string()));
        assert_eq!(config.execution.fallback_job_label, "general");
        assert_eq!(config.scheduler.idle_poll_secs, 60);
        assert_eq!(config.server.max_requests_per_sec, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_config() {
        let content = r#"
[general]
port = 9100

[guardrails]
window_start_hour = 9
window_end_hour = 17
blocked_domains = ["evil.test"]
"#;
        let file = create_temp_config(content);
        let config = SmartOpsConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 9100);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.guardrails.window_start_hour, 9);
        assert_eq!(config.guardrails.blocked_domains, vec!["evil.test"]);
        // Untouched sections keep their defaults.
        assert!(!config.guardrails.out_of_scope_keywords.is_empty());
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_load_rejects_inverted_window() {
        let content = r#"
[guardrails]
window_start_hour = 18
window_end_hour = 8
"#;
        let file = create_temp_config(content);
        let err = SmartOpsConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, SmartOpsError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let mut config = SmartOpsConfig::default();
        config.llm.history_turns = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = SmartOpsConfig::default();
        config.execution.executor_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = SmartOpsConfig::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert_eq!(config.general.port, 8000);
    }

    #[test]
    fn test_load_or_default_invalid_toml() {
        let file = create_temp_config("this is not [valid toml");
        let config = SmartOpsConfig::load_or_default(file.path());
        assert_eq!(config.guardrails.window_end_hour, 18);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SmartOpsConfig::default();
        config.general.port = 4242;
        config.guardrails.blocked_domains.push("junk.example".to_string());
        config.save(&path).unwrap();

        let loaded = SmartOpsConfig::load(&path).unwrap();
        assert_eq!(loaded.general.port, 4242);
        assert!(loaded
            .guardrails
            .blocked_domains
            .contains(&"junk.example".to_string()));
    }

    #[test]
    fn test_guardrail_window() {
        let window = GuardrailConfig::default().window();
        assert_eq!(window.start_hour(), 8);
        assert_eq!(window.end_hour(), 18);
    }
}
