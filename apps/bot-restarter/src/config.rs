//! Restarter configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SESSION_NAME: &str = "mev-arb-bot";
pub const DEFAULT_BOT_COMMAND: &str = "cargo run -r --bin arb start-bot \
     --use-db-simulator --max-recent-arbs 5 --workers 10 --num-simulators 18 \
     --preload-path /home/ubuntu/sui/pool_related_ids.txt";
pub const DEFAULT_INTERVAL_SECS: u64 = 3 * 60 * 60;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 60;
pub const DEFAULT_LOG_FILE: &str = "bot_restarter.log";
/// Upper bound for `interval_secs` and `retry_delay_secs` (one year).
pub const MAX_DELAY_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Restarter configuration, loadable from JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestarterConfig {
    /// tmux session that hosts the bot
    pub session_name: String,
    /// Command typed into the session to start the bot
    pub command: String,
    /// Environment assignments prefixed to the command
    pub env: BTreeMap<String, String>,
    /// Seconds between restarts
    pub interval_secs: u64,
    /// Seconds to wait after a failed restart before trying again
    pub retry_delay_secs: u64,
    /// Log file written alongside console output; None disables it
    pub log_file: Option<String>,
    /// tmux executable
    pub tmux_bin: String,
    /// Directory new sessions start in
    pub working_dir: Option<String>,
}

impl Default for RestarterConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("ENABLE_RECORD_POOL_RELATED_ID".to_string(), "1".to_string());

        Self {
            session_name: DEFAULT_SESSION_NAME.to_string(),
            command: DEFAULT_BOT_COMMAND.to_string(),
            env,
            interval_secs: DEFAULT_INTERVAL_SECS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            log_file: Some(DEFAULT_LOG_FILE.to_string()),
            tmux_bin: "tmux".to_string(),
            working_dir: None,
        }
    }
}

impl RestarterConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_name.trim().is_empty() {
            return Err(ConfigError::Invalid("session_name is empty".into()));
        }
        if self.session_name.contains(['.', ':']) {
            return Err(ConfigError::Invalid(format!(
                "session_name {:?} may not contain '.' or ':'",
                self.session_name
            )));
        }
        if self.command.trim().is_empty() {
            return Err(ConfigError::Invalid("command is empty".into()));
        }
        check_delay("interval_secs", self.interval_secs)?;
        check_delay("retry_delay_secs", self.retry_delay_secs)?;
        if let Some(bad) = self.env.keys().find(|k| !is_env_name(k)) {
            return Err(ConfigError::Invalid(format!("bad env variable name {:?}", bad)));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// The line typed into the shell: `KEY=value ... <command>`.
    pub fn full_command(&self) -> String {
        let mut parts: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, shell_quote(v)))
            .collect();
        parts.push(self.command.trim().to_string());
        parts.join(" ")
    }
}

fn check_delay(field: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 || secs > MAX_DELAY_SECS {
        return Err(ConfigError::Invalid(format!(
            "{} must be between 1 and {}, got {}",
            field, MAX_DELAY_SECS, secs
        )));
    }
    Ok(())
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Single-quote `value` for a POSIX shell unless it is plainly safe.
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@%+".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_full_command() {
        let config = RestarterConfig::default();
        assert_eq!(
            config.full_command(),
            "ENABLE_RECORD_POOL_RELATED_ID=1 cargo run -r --bin arb start-bot \
             --use-db-simulator --max-recent-arbs 5 --workers 10 --num-simulators 18 \
             --preload-path /home/ubuntu/sui/pool_related_ids.txt"
        );
        assert_eq!(config.interval(), Duration::from_secs(10_800));
        assert_eq!(config.retry_delay(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RestarterConfig::from_json(
            r#"{"session_name": "arb", "interval_secs": 600, "env": {"RUST_LOG": "info,arb=debug"}}"#,
        )
        .unwrap();

        assert_eq!(config.session_name, "arb");
        assert_eq!(config.interval_secs, 600);
        assert_eq!(config.command, DEFAULT_BOT_COMMAND);
        assert_eq!(config.log_file.as_deref(), Some(DEFAULT_LOG_FILE));
        assert!(config
            .full_command()
            .starts_with("RUST_LOG=info,arb=debug cargo run"));
        assert!(!config.env.contains_key("ENABLE_RECORD_POOL_RELATED_ID"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("1"), "1");
        assert_eq!(shell_quote("/home/ubuntu"), "/home/ubuntu");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RestarterConfig::default();
        config.session_name = "bot:1".into();
        assert!(config.validate().is_err());

        let mut config = RestarterConfig::default();
        config.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = RestarterConfig::default();
        config.interval_secs = 10_000_000_000_000;
        assert!(config.validate().is_err());

        let mut config = RestarterConfig::default();
        config.interval_secs = MAX_DELAY_SECS;
        assert!(config.validate().is_ok());

        let config = RestarterConfig::from_json(r#"{"retry_delay_secs": 0}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry_delay_secs"));

        let mut config = RestarterConfig::default();
        config.env.insert("1BAD".into(), "x".into());
        assert!(config.validate().is_err());

        let mut config = RestarterConfig::default();
        config.command = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = RestarterConfig::load(Path::new("/nonexistent/restarter.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_bad_json() {
        let path = std::env::temp_dir().join(format!("restarter-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = RestarterConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
