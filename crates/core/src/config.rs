use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_RESTART_KEYWORDS: [&str; 4] = ["hi", "hello", "start", "restart"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub sessions: SessionsConfig,
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub messages: MessagesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    /// JSON or TOML plan file; the embedded catalog is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SessionsConfig {
    pub idle_ttl_secs: Option<u64>,
    pub sweep_interval_secs: u64,
}

impl SessionsConfig {
    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl_secs.and_then(|secs| i64::try_from(secs).ok()).map(Duration::seconds)
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub shared_secret: Option<SecretString>,
    pub restart_keywords: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct MessagesConfig {
    pub locale: Locale,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    En,
    He,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::He];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::He => "he",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
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
    pub catalog_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub locale: Option<Locale>,
    pub server_port: Option<u16>,
    pub idle_ttl_secs: Option<u64>,
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
            catalog: CatalogConfig::default(),
            sessions: SessionsConfig { idle_ttl_secs: None, sweep_interval_secs: 60 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
            },
            webhook: WebhookConfig {
                shared_secret: None,
                restart_keywords: DEFAULT_RESTART_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            },
            messages: MessagesConfig { locale: Locale::En },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
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

impl std::str::FromStr for Locale {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "he" | "hebrew" => Ok(Self::He),
            other => Err(ConfigError::Validation(format!(
                "unsupported messages.locale `{other}` (expected en|he)"
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("voltwiz.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The config file `load` would read, if any.
    pub fn resolved_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
        resolve_config_path(explicit_path)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(sessions) = patch.sessions {
            if let Some(idle_ttl_secs) = sessions.idle_ttl_secs {
                self.sessions.idle_ttl_secs = Some(idle_ttl_secs);
            }
            if let Some(sweep_interval_secs) = sessions.sweep_interval_secs {
                self.sessions.sweep_interval_secs = sweep_interval_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(webhook) = patch.webhook {
            if let Some(shared_secret) = webhook.shared_secret {
                self.webhook.shared_secret = Some(shared_secret.into());
            }
            if let Some(restart_keywords) = webhook.restart_keywords {
                self.webhook.restart_keywords = normalize_keywords(restart_keywords);
            }
        }

        if let Some(messages) = patch.messages {
            if let Some(locale) = messages.locale {
                self.messages.locale = locale;
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
        if let Some(value) = read_env("VOLTWIZ_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("VOLTWIZ_SESSIONS_IDLE_TTL_SECS") {
            self.sessions.idle_ttl_secs = Some(parse_u64("VOLTWIZ_SESSIONS_IDLE_TTL_SECS", &value)?);
        }
        if let Some(value) = read_env("VOLTWIZ_SESSIONS_SWEEP_INTERVAL_SECS") {
            self.sessions.sweep_interval_secs =
                parse_u64("VOLTWIZ_SESSIONS_SWEEP_INTERVAL_SECS", &value)?;
        }

        if let Some(value) = read_env("VOLTWIZ_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("VOLTWIZ_SERVER_PORT") {
            self.server.port = parse_u16("VOLTWIZ_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("VOLTWIZ_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("VOLTWIZ_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("VOLTWIZ_WEBHOOK_SHARED_SECRET") {
            self.webhook.shared_secret = Some(value.into());
        }
        if let Some(value) = read_env("VOLTWIZ_WEBHOOK_RESTART_KEYWORDS") {
            self.webhook.restart_keywords =
                normalize_keywords(value.split(',').map(str::to_string).collect());
        }

        if let Some(value) = read_env("VOLTWIZ_MESSAGES_LOCALE") {
            self.messages.locale = value.parse()?;
        }

        let log_level =
            read_env("VOLTWIZ_LOGGING_LEVEL").or_else(|| read_env("VOLTWIZ_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("VOLTWIZ_LOGGING_FORMAT").or_else(|| read_env("VOLTWIZ_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(locale) = overrides.locale {
            self.messages.locale = locale;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(idle_ttl_secs) = overrides.idle_ttl_secs {
            self.sessions.idle_ttl_secs = Some(idle_ttl_secs);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_sessions(&self.sessions)?;
        validate_server(&self.server)?;
        validate_webhook(&self.webhook)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("voltwiz.toml"), PathBuf::from("config/voltwiz.toml")]
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
        if ch != '$' || !matches!(chars.peek(), Some('{')) {
            output.push(ch);
            continue;
        }
        chars.next();

        let mut key = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(next) => key.push(next),
                None => return Err(ConfigError::UnterminatedInterpolation),
            }
        }
        let value =
            env::var(&key).map_err(|_| ConfigError::MissingEnvInterpolation { var: key })?;
        output.push_str(&value);
    }

    Ok(output)
}

fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    let Some(path) = &catalog.path else {
        return Ok(());
    };
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") | Some("toml") => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "catalog.path `{}` must point to a .json or .toml file",
            path.display()
        ))),
    }
}

fn validate_sessions(sessions: &SessionsConfig) -> Result<(), ConfigError> {
    if sessions.idle_ttl_secs == Some(0) {
        return Err(ConfigError::Validation(
            "sessions.idle_ttl_secs must be greater than zero; omit it to keep sessions forever"
                .to_string(),
        ));
    }
    if sessions.sweep_interval_secs == 0 || sessions.sweep_interval_secs > 86_400 {
        return Err(ConfigError::Validation(
            "sessions.sweep_interval_secs must be in range 1..=86400".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_webhook(webhook: &WebhookConfig) -> Result<(), ConfigError> {
    if let Some(secret) = &webhook.shared_secret {
        if secret.expose_secret().trim().len() < 8 {
            return Err(ConfigError::Validation(
                "webhook.shared_secret must be at least 8 characters when set".to_string(),
            ));
        }
    }

    if webhook.restart_keywords.is_empty() {
        return Err(ConfigError::Validation(
            "webhook.restart_keywords must contain at least one keyword (e.g. `hi`)".to_string(),
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

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    sessions: Option<SessionsPatch>,
    server: Option<ServerPatch>,
    webhook: Option<WebhookPatch>,
    messages: Option<MessagesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionsPatch {
    idle_ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPatch {
    shared_secret: Option<String>,
    restart_keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagesPatch {
    locale: Option<Locale>,
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
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, Locale, LogFormat};

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
    fn defaults_are_valid_without_any_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/voltwiz.toml")),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.catalog.path.is_none(), "embedded catalog is the default")?;
        ensure(config.sessions.idle_ttl().is_none(), "sessions never expire by default")?;
        ensure(config.messages.locale == Locale::En, "default locale should be english")?;
        ensure(
            config.webhook.restart_keywords.iter().any(|keyword| keyword == "hello"),
            "hello restarts the conversation by default",
        )
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/voltwiz.toml")),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "require_file should surface the missing path",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_VOLTWIZ_SECRET", "webhook-secret-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("voltwiz.toml");
            fs::write(
                &path,
                r#"
[webhook]
shared_secret = "${TEST_VOLTWIZ_SECRET}"
restart_keywords = ["Hi", " start ", ""]

[messages]
locale = "he"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let secret = config
                .webhook
                .shared_secret
                .as_ref()
                .map(|secret| secret.expose_secret().to_string());
            ensure(
                secret.as_deref() == Some("webhook-secret-from-env"),
                "shared secret should be interpolated from environment",
            )?;
            ensure(
                config.webhook.restart_keywords == vec!["hi".to_string(), "start".to_string()],
                "restart keywords should be trimmed, lowercased and non-empty",
            )?;
            ensure(config.messages.locale == Locale::He, "locale should come from file")
        })();

        clear_vars(&["TEST_VOLTWIZ_SECRET"]);
        result
    }

    #[test]
    fn unresolved_interpolation_fails() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("voltwiz.toml");
        fs::write(&path, "[catalog]\npath = \"${VOLTWIZ_TEST_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(result, Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "VOLTWIZ_TEST_UNSET_VAR"),
            "unset interpolation variable should be named in the error",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOLTWIZ_LOG_LEVEL", "warn");
        env::set_var("VOLTWIZ_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["VOLTWIZ_LOG_LEVEL", "VOLTWIZ_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOLTWIZ_SERVER_PORT", "7000");
        env::set_var("VOLTWIZ_SESSIONS_IDLE_TTL_SECS", "900");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("voltwiz.toml");
            fs::write(
                &path,
                r#"
[catalog]
path = "plans-from-file.json"

[server]
port = 6000
bind_address = "0.0.0.0"

[sessions]
idle_ttl_secs = 60

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    catalog_path: Some(PathBuf::from("plans-from-override.toml")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == Some(PathBuf::from("plans-from-override.toml")),
                "override catalog path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.server.port == 7000, "env port should win over file")?;
            ensure(config.server.bind_address == "0.0.0.0", "file bind address should apply")?;
            ensure(config.sessions.idle_ttl_secs == Some(900), "env ttl should win over file")?;
            Ok(())
        })();

        clear_vars(&["VOLTWIZ_SERVER_PORT", "VOLTWIZ_SESSIONS_IDLE_TTL_SECS"]);
        result
    }

    #[test]
    fn invalid_env_number_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOLTWIZ_SERVER_PORT", "not-a-port");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["VOLTWIZ_SERVER_PORT"]);

        ensure(
            matches!(result, Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "VOLTWIZ_SERVER_PORT"),
            "bad port should name the env key",
        )
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOLTWIZ_CATALOG_PATH", "plans.yaml");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("catalog.path")
            );
            ensure(has_message, "validation failure should mention catalog.path")
        })();

        clear_vars(&["VOLTWIZ_CATALOG_PATH"]);
        result
    }

    #[test]
    fn zero_ttl_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { idle_ttl_secs: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        });
        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("idle_ttl_secs")),
            "zero ttl should be rejected",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOLTWIZ_WEBHOOK_SHARED_SECRET", "super-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("super-secret-value"),
                "debug output should not contain the webhook secret",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["VOLTWIZ_WEBHOOK_SHARED_SECRET"]);
        result
    }
}
