use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub relay: RelayConfig,
    pub llm: LlmConfig,
    pub workforce: WorkforceConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Outbound operator channel. Optional: when disabled, block notifications
/// and alert broadcasts stay in the conversation log only.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub enabled: bool,
    pub bot_token: Option<SecretString>,
    pub channel: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_reply_tokens: u32,
}

#[derive(Clone, Debug)]
pub struct WorkforceConfig {
    pub admins: Vec<String>,
    pub duty_roster: Vec<String>,
    pub reflection_context_entries: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub relay_enabled: Option<bool>,
    pub relay_bot_token: Option<String>,
    pub relay_channel: Option<String>,
    pub admins: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://opsforce.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            relay: RelayConfig { enabled: false, bot_token: None, channel: None },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 8,
                max_reply_tokens: 150,
            },
            workforce: WorkforceConfig {
                admins: vec!["founder".to_string()],
                duty_roster: Vec::new(),
                reflection_context_entries: 3,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("opsforce.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(relay) = patch.relay {
            if let Some(enabled) = relay.enabled {
                self.relay.enabled = enabled;
            }
            if let Some(bot_token_value) = relay.bot_token {
                self.relay.bot_token = Some(secret_value(bot_token_value));
            }
            if let Some(channel) = relay.channel {
                self.relay.channel = Some(channel);
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_reply_tokens) = llm.max_reply_tokens {
                self.llm.max_reply_tokens = max_reply_tokens;
            }
        }

        if let Some(workforce) = patch.workforce {
            if let Some(admins) = workforce.admins {
                self.workforce.admins = admins;
            }
            if let Some(duty_roster) = workforce.duty_roster {
                self.workforce.duty_roster = duty_roster;
            }
            if let Some(entries) = workforce.reflection_context_entries {
                self.workforce.reflection_context_entries = entries;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("OPSFORCE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("OPSFORCE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("OPSFORCE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("OPSFORCE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("OPSFORCE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("OPSFORCE_RELAY_ENABLED") {
            self.relay.enabled = parse_bool("OPSFORCE_RELAY_ENABLED", &value)?;
        }
        if let Some(value) = read_env("OPSFORCE_RELAY_BOT_TOKEN") {
            self.relay.bot_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("OPSFORCE_RELAY_CHANNEL") {
            self.relay.channel = Some(value);
        }

        if let Some(value) = read_env("OPSFORCE_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("OPSFORCE_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("OPSFORCE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("OPSFORCE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("OPSFORCE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("OPSFORCE_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("OPSFORCE_LLM_MAX_REPLY_TOKENS") {
            self.llm.max_reply_tokens = parse_u32("OPSFORCE_LLM_MAX_REPLY_TOKENS", &value)?;
        }

        if let Some(value) = read_env("OPSFORCE_WORKFORCE_ADMINS") {
            self.workforce.admins = parse_list(&value);
        }
        if let Some(value) = read_env("OPSFORCE_WORKFORCE_DUTY_ROSTER") {
            self.workforce.duty_roster = parse_list(&value);
        }
        if let Some(value) = read_env("OPSFORCE_WORKFORCE_REFLECTION_CONTEXT_ENTRIES") {
            self.workforce.reflection_context_entries =
                parse_u32("OPSFORCE_WORKFORCE_REFLECTION_CONTEXT_ENTRIES", &value)?;
        }

        if let Some(value) = read_env("OPSFORCE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("OPSFORCE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("OPSFORCE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("OPSFORCE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("OPSFORCE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("OPSFORCE_LOGGING_LEVEL").or_else(|| read_env("OPSFORCE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("OPSFORCE_LOGGING_FORMAT").or_else(|| read_env("OPSFORCE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(enabled) = overrides.relay_enabled {
            self.relay.enabled = enabled;
        }
        if let Some(bot_token) = overrides.relay_bot_token {
            self.relay.bot_token = Some(secret_value(bot_token));
        }
        if let Some(channel) = overrides.relay_channel {
            self.relay.channel = Some(channel);
        }
        if let Some(admins) = overrides.admins {
            self.workforce.admins = admins;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_relay(&self.relay)?;
        validate_llm(&self.llm)?;
        validate_workforce(&self.workforce)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("opsforce.toml"), PathBuf::from("config/opsforce.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_relay(relay: &RelayConfig) -> Result<(), ConfigError> {
    if !relay.enabled {
        return Ok(());
    }

    let bot_token = relay
        .bot_token
        .as_ref()
        .map(|token| token.expose_secret().to_owned())
        .unwrap_or_default();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "relay.bot_token is required when relay.enabled is true".to_string(),
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        return Err(ConfigError::Validation(
            "relay.bot_token must start with `xoxb-`. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions".to_string(),
        ));
    }

    let channel_missing =
        relay.channel.as_ref().map(|channel| channel.trim().is_empty()).unwrap_or(true);
    if channel_missing {
        return Err(ConfigError::Validation(
            "relay.channel is required when relay.enabled is true".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.max_reply_tokens == 0 {
        return Err(ConfigError::Validation(
            "llm.max_reply_tokens must be greater than zero".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_workforce(workforce: &WorkforceConfig) -> Result<(), ConfigError> {
    if workforce.admins.is_empty() {
        return Err(ConfigError::Validation(
            "workforce.admins must name at least one alert recipient".to_string(),
        ));
    }

    if workforce.admins.iter().any(|admin| admin.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "workforce.admins must not contain blank entries".to_string(),
        ));
    }

    if workforce.reflection_context_entries > 50 {
        return Err(ConfigError::Validation(
            "workforce.reflection_context_entries must be at most 50".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    relay: Option<RelayPatch>,
    llm: Option<LlmPatch>,
    workforce: Option<WorkforcePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RelayPatch {
    enabled: Option<bool>,
    bot_token: Option<String>,
    channel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_reply_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkforcePatch {
    admins: Option<Vec<String>>,
    duty_roster: Option<Vec<String>>,
    reflection_context_entries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_a_config_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(!config.relay.enabled, "relay should be disabled by default")?;
        ensure(config.workforce.admins == vec!["founder".to_string()], "default admin is founder")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_RELAY_BOT_TOKEN", "xoxb-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("opsforce.toml");
            fs::write(
                &path,
                r##"
[relay]
enabled = true
bot_token = "${TEST_RELAY_BOT_TOKEN}"
channel = "#founder-alerts"
"##,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let token = config
                .relay
                .bot_token
                .as_ref()
                .map(|token| token.expose_secret().to_owned())
                .unwrap_or_default();
            ensure(token == "xoxb-from-env", "bot token should be loaded from environment")?;
            ensure(
                config.relay.channel.as_deref() == Some("#founder-alerts"),
                "channel should come from the file",
            )
        })();

        clear_vars(&["TEST_RELAY_BOT_TOKEN"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("OPSFORCE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("OPSFORCE_WORKFORCE_ADMINS", "U-founder, U-cto");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("opsforce.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.workforce.admins == vec!["U-founder".to_string(), "U-cto".to_string()],
                "env admin list should win over defaults",
            )
        })();

        clear_vars(&["OPSFORCE_DATABASE_URL", "OPSFORCE_WORKFORCE_ADMINS"]);
        result
    }

    #[test]
    fn enabled_relay_requires_token_and_channel() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("OPSFORCE_RELAY_ENABLED", "true");
        env::set_var("OPSFORCE_RELAY_BOT_TOKEN", "bad-token");
        env::set_var("OPSFORCE_RELAY_CHANNEL", "#ops");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("relay.bot_token")
            );
            ensure(has_message, "validation failure should mention relay.bot_token")
        })();

        clear_vars(&["OPSFORCE_RELAY_ENABLED", "OPSFORCE_RELAY_BOT_TOKEN", "OPSFORCE_RELAY_CHANNEL"]);
        result
    }

    #[test]
    fn blank_admin_list_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                admins: Some(Vec::new()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure".to_string()),
            Err(error) => error,
        };

        ensure(
            matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("workforce.admins")
            ),
            "validation failure should mention workforce.admins",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("OPSFORCE_LLM_PROVIDER", "openai");
        env::set_var("OPSFORCE_LLM_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")
        })();

        clear_vars(&["OPSFORCE_LLM_PROVIDER", "OPSFORCE_LLM_API_KEY"]);
        result
    }
}
