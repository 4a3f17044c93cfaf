use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use rust_decimal::Decimal;
use serde_json::Value;
use voltwiz_cli::commands::recommend::{PriorityArg, RecommendArgs};
use voltwiz_cli::commands::{catalog, config, doctor, recommend};

fn recommend_args(smart_meter: bool, priority: PriorityArg, min_discount: i64) -> RecommendArgs {
    RecommendArgs {
        smart_meter,
        priority,
        window: None,
        min_discount: Decimal::from(min_discount),
        json: true,
    }
}

#[test]
fn recommend_json_picks_highest_discount_for_smart_meter_owner() {
    with_env(&[], || {
        let result = recommend::run(None, &recommend_args(true, PriorityArg::MaxDiscount, 15));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["recommendation"]["vendor"], "Amisragaz");
        assert_eq!(payload["recommendation"]["plan_name"], "Night Saver");
    });
}

#[test]
fn recommend_time_specific_without_window_uses_evening_hours() {
    with_env(&[], || {
        let result = recommend::run(None, &recommend_args(false, PriorityArg::TimeSpecific, 0));

        let payload = parse_payload(&result.output);
        assert_eq!(payload["recommendation"]["plan_name"], "Evening Basic");
    });
}

#[test]
fn recommend_reports_no_match_when_floor_is_too_high() {
    with_env(&[], || {
        let result = recommend::run(None, &recommend_args(true, PriorityArg::MaxDiscount, 50));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "no_match");
        assert!(payload["recommendation"].is_null());

        let mut args = recommend_args(true, PriorityArg::MaxDiscount, 50);
        args.json = false;
        let text = recommend::run(None, &args);
        assert!(text.output.contains("couldn't find any suitable providers"));
    });
}

#[test]
fn recommend_text_uses_configured_locale() {
    with_env(&[("VOLTWIZ_MESSAGES_LOCALE", "he")], || {
        let mut args = recommend_args(true, PriorityArg::MaxDiscount, 0);
        args.json = false;
        let result = recommend::run(None, &args);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("Amisragaz - Night Saver"));
        assert!(!result.output.contains("Recommended Provider"));
    });
}

#[test]
fn catalog_json_lists_embedded_plans() {
    with_env(&[], || {
        let result = catalog::run(None, true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["source"], "embedded");
        assert_eq!(payload["plan_count"], 6);
        assert_eq!(payload["plans"].as_array().map(Vec::len), Some(6));
    });
}

#[test]
fn catalog_reads_plans_from_configured_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plans.json");
    write(
        &path,
        r#"{"providers":[{"name":"Solo","vendor":"One Co","discount_pct":9.5,"hours":null,"requires_smart_meter":false}]}"#,
    );

    with_env(&[("VOLTWIZ_CATALOG_PATH", path.to_str().expect("utf8 path"))], || {
        let result = catalog::run(None, false);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("1 plans"));
        assert!(result.output.contains("- One Co - Solo (9.5% discount, All day)"));
        assert!(result.output.contains("mean discount: 9.5%"));
    });
}

#[test]
fn catalog_failure_uses_catalog_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plans.json");
    write(&path, r#"{"plans":[]}"#);

    with_env(&[("VOLTWIZ_CATALOG_PATH", path.to_str().expect("utf8 path"))], || {
        let result = catalog::run(None, true);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "catalog_load");
    });
}

#[test]
fn config_redacts_shared_secret_and_names_env_source() {
    with_env(&[("VOLTWIZ_WEBHOOK_SHARED_SECRET", "sk-0123456789abcdef")], || {
        let result = config::run(None);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains(
            "- webhook.shared_secret = sk*** (source: env (VOLTWIZ_WEBHOOK_SHARED_SECRET))"
        ));
        assert!(!result.output.contains("0123456789abcdef"));
        assert!(result.output.contains("- server.port = 5000 (source: default)"));
    });
}

#[test]
fn config_attributes_values_to_explicit_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("voltwiz.toml");
    write(&path, "[server]\nport = 8080\n\n[messages]\nlocale = \"he\"\n");

    with_env(&[], || {
        let result = config::run(Some(&path));
        let expected_source = format!("file ({})", path.display());

        assert!(result.output.contains(&format!("- server.port = 8080 (source: {expected_source})")));
        assert!(result.output.contains(&format!("- messages.locale = he (source: {expected_source})")));
        assert!(result.output.contains("- logging.level = info (source: default)"));
    });
}

#[test]
fn missing_explicit_config_file_is_a_config_failure() {
    with_env(&[], || {
        let result = config::run(Some(Path::new("/nonexistent/voltwiz.toml")));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_with_defaults() {
    with_env(&[], || {
        let result = doctor::run(None, true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        let names: Vec<&str> = payload["checks"]
            .as_array()
            .expect("checks")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(names, ["config_validation", "plan_catalog", "message_templates"]);
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("VOLTWIZ_MESSAGES_LOCALE", "fr")], || {
        let result = doctor::run(None, false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] plan_catalog:"));
        assert!(result.output.contains("- [skip] message_templates:"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn write(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write fixture");
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "VOLTWIZ_CATALOG_PATH",
        "VOLTWIZ_SESSIONS_IDLE_TTL_SECS",
        "VOLTWIZ_SESSIONS_SWEEP_INTERVAL_SECS",
        "VOLTWIZ_SERVER_BIND_ADDRESS",
        "VOLTWIZ_SERVER_PORT",
        "PORT",
        "VOLTWIZ_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "VOLTWIZ_WEBHOOK_SHARED_SECRET",
        "VOLTWIZ_WEBHOOK_RESTART_KEYWORDS",
        "VOLTWIZ_MESSAGES_LOCALE",
        "VOLTWIZ_LOGGING_LEVEL",
        "VOLTWIZ_LOGGING_FORMAT",
        "VOLTWIZ_LOG_LEVEL",
        "VOLTWIZ_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
