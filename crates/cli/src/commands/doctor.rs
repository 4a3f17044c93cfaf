use std::path::Path;

use serde::Serialize;
use voltwiz_chat::MessageCatalog;
use voltwiz_core::config::AppConfig;
use voltwiz_core::Catalog;

use super::{load_config, CommandResult};

const EXIT_DOCTOR_FAILED: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(config_path: Option<&Path>, json_output: bool) -> CommandResult {
    let report = build_report(config_path);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_DOCTOR_FAILED };

    if json_output {
        let mut result = CommandResult::json("doctor", &report);
        if result.exit_code == 0 {
            result.exit_code = exit_code;
        }
        return result;
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(config_path: Option<&Path>) -> DoctorReport {
    let mut checks = Vec::new();

    match load_config(config_path) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_catalog(&config));
            checks.push(check_message_templates(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["plan_catalog", "message_templates"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    let source = config
        .catalog
        .path
        .as_deref()
        .map(|path| format!("`{}`", path.display()))
        .unwrap_or_else(|| "embedded catalog".to_string());

    match Catalog::load_or_embedded(config.catalog.path.as_deref()) {
        Ok(catalog) => DoctorCheck {
            name: "plan_catalog",
            status: CheckStatus::Pass,
            details: format!(
                "{} plans loaded from {source}, mean discount {:.1}%",
                catalog.len(),
                catalog.mean_discount_pct()
            ),
        },
        Err(error) => DoctorCheck {
            name: "plan_catalog",
            status: CheckStatus::Fail,
            details: format!("{source}: {error}"),
        },
    }
}

fn check_message_templates(config: &AppConfig) -> DoctorCheck {
    let locale = config.messages.locale;
    match MessageCatalog::new(locale).and_then(|messages| messages.verify()) {
        Ok(rendered) => DoctorCheck {
            name: "message_templates",
            status: CheckStatus::Pass,
            details: format!("{rendered} `{locale}` templates rendered"),
        },
        Err(error) => DoctorCheck {
            name: "message_templates",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
