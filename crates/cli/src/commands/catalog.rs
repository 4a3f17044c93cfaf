use std::path::Path;

use rust_decimal::Decimal;
use serde::Serialize;
use voltwiz_core::{Catalog, Plan};

use super::{load_config, CommandResult, EXIT_CATALOG, EXIT_CONFIG};

#[derive(Debug, Serialize)]
struct CatalogReport<'a> {
    command: &'static str,
    status: &'static str,
    source: String,
    plan_count: usize,
    mean_discount_pct: Decimal,
    plans: &'a [Plan],
}

pub fn run(config_path: Option<&Path>, json_output: bool) -> CommandResult {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("catalog", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };
    let source = config
        .catalog
        .path
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "embedded".to_string());
    let catalog = match Catalog::load_or_embedded(config.catalog.path.as_deref()) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure("catalog", "catalog_load", error.to_string(), EXIT_CATALOG)
        }
    };

    if json_output {
        let report = CatalogReport {
            command: "catalog",
            status: "ok",
            source,
            plan_count: catalog.len(),
            mean_discount_pct: catalog.mean_discount_pct(),
            plans: catalog.plans(),
        };
        return CommandResult::json("catalog", &report);
    }

    let mut lines = vec![format!("catalog ({source}): {} plans", catalog.len())];
    for plan in catalog.plans() {
        let meter = if plan.requires_smart_meter { ", smart meter required" } else { "" };
        lines.push(format!("- {plan}{meter}"));
    }
    lines.push(format!("mean discount: {:.1}%", catalog.mean_discount_pct()));
    CommandResult::text(lines.join("\n"))
}
