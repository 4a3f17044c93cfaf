use std::env;
use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use toml::Value;
use voltwiz_core::config::AppConfig;

use super::{config_file, load_config, CommandResult, EXIT_CONFIG};

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };

    let file_path = config_file(config_path);
    let file_doc = file_path.as_deref().and_then(load_config_file_doc);

    let mut lines = vec![
        "effective config (source precedence: override > env > file > default):".to_string()
    ];
    for field in fields(&config) {
        let source = field_source(&field, file_doc.as_ref(), file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    CommandResult::text(lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let optional = |value: Option<String>| value.unwrap_or_else(|| "<unset>".to_string());

    vec![
        Field {
            key: "catalog.path",
            env_keys: &["VOLTWIZ_CATALOG_PATH"],
            value: config
                .catalog
                .path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<embedded>".to_string()),
        },
        Field {
            key: "sessions.idle_ttl_secs",
            env_keys: &["VOLTWIZ_SESSIONS_IDLE_TTL_SECS"],
            value: optional(config.sessions.idle_ttl_secs.map(|secs| secs.to_string())),
        },
        Field {
            key: "sessions.sweep_interval_secs",
            env_keys: &["VOLTWIZ_SESSIONS_SWEEP_INTERVAL_SECS"],
            value: config.sessions.sweep_interval_secs.to_string(),
        },
        Field {
            key: "server.bind_address",
            env_keys: &["VOLTWIZ_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key: "server.port",
            env_keys: &["VOLTWIZ_SERVER_PORT", "PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key: "server.graceful_shutdown_secs",
            env_keys: &["VOLTWIZ_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        Field {
            key: "webhook.shared_secret",
            env_keys: &["VOLTWIZ_WEBHOOK_SHARED_SECRET"],
            value: optional(
                config.webhook.shared_secret.as_ref().map(|secret| redact(secret.expose_secret())),
            ),
        },
        Field {
            key: "webhook.restart_keywords",
            env_keys: &["VOLTWIZ_WEBHOOK_RESTART_KEYWORDS"],
            value: config.webhook.restart_keywords.join(","),
        },
        Field {
            key: "messages.locale",
            env_keys: &["VOLTWIZ_MESSAGES_LOCALE"],
            value: config.messages.locale.to_string(),
        },
        Field {
            key: "logging.level",
            env_keys: &["VOLTWIZ_LOGGING_LEVEL", "VOLTWIZ_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env_keys: &["VOLTWIZ_LOGGING_FORMAT", "VOLTWIZ_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
        },
    ]
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(field: &Field, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = file_doc {
        if contains_path(doc, field.key) {
            let file_path = file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps the first two characters of long secrets so operators can tell them apart.
fn redact(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() >= 12 {
        let prefix: String = trimmed.chars().take(2).collect();
        return format!("{prefix}***");
    }
    "<redacted>".to_string()
}
