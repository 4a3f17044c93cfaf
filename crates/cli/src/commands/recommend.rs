use std::path::Path;

use clap::{ArgAction, Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use voltwiz_chat::MessageCatalog;
use voltwiz_core::flows;
use voltwiz_core::recommendation::RecommendationSummary;
use voltwiz_core::{
    Catalog, DeterministicRecommendationEngine, HourWindow, Preferences, Priority,
    RecommendationEngine,
};

use super::{load_config, CommandResult, EXIT_CATALOG, EXIT_CONFIG, EXIT_MESSAGES};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    MaxDiscount,
    TimeSpecific,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::MaxDiscount => Priority::MaxDiscount,
            PriorityArg::TimeSpecific => Priority::TimeSpecific,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct RecommendArgs {
    #[arg(long, value_name = "yes|no", action = ArgAction::Set, required = true, value_parser = parse_yes_no, help = "Whether a smart meter is installed or can be installed")]
    pub smart_meter: bool,
    #[arg(long, value_enum, help = "What matters most")]
    pub priority: PriorityArg,
    #[arg(long, value_name = "START-END", value_parser = parse_window, help = "Preferred discount hours, e.g. 18-22 (time-specific only; defaults to 18-22)")]
    pub window: Option<HourWindow>,
    #[arg(long, value_name = "PCT", value_parser = parse_min_discount, default_value = "0", help = "Minimum acceptable discount percentage")]
    pub min_discount: Decimal,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

impl RecommendArgs {
    pub fn preferences(&self) -> Preferences {
        Preferences {
            has_smart_meter: self.smart_meter,
            priority: self.priority.into(),
            discount_window: match self.priority {
                PriorityArg::MaxDiscount => None,
                PriorityArg::TimeSpecific => self.window,
            },
            min_discount_pct: self.min_discount,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecommendReport<'a> {
    command: &'static str,
    status: &'static str,
    preferences: &'a Preferences,
    recommendation: Option<&'a RecommendationSummary>,
}

pub fn run(config_path: Option<&Path>, args: &RecommendArgs) -> CommandResult {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "recommend",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };
    let catalog = match Catalog::load_or_embedded(config.catalog.path.as_deref()) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure("recommend", "catalog_load", error.to_string(), EXIT_CATALOG)
        }
    };

    let preferences = args.preferences();
    let summary = DeterministicRecommendationEngine.summarize(&catalog, &preferences);

    if args.json {
        let report = RecommendReport {
            command: "recommend",
            status: if summary.is_some() { "ok" } else { "no_match" },
            preferences: &preferences,
            recommendation: summary.as_ref(),
        };
        return CommandResult::json("recommend", &report);
    }

    let rendered = MessageCatalog::new(config.messages.locale).and_then(|messages| match &summary {
        Some(summary) => messages.recommendation_text(summary),
        None => messages.no_plan().map(|message| message.fallback_text),
    });
    match rendered {
        Ok(text) => CommandResult::text(text),
        Err(error) => {
            CommandResult::failure("recommend", "message_templates", error.to_string(), EXIT_MESSAGES)
        }
    }
}

fn parse_yes_no(raw: &str) -> Result<bool, String> {
    flows::parse_yes_no(raw).map_err(|_| format!("expected yes or no, got `{}`", raw.trim()))
}

fn parse_window(raw: &str) -> Result<HourWindow, String> {
    let (start, end) =
        raw.split_once('-').ok_or_else(|| format!("expected START-END, got `{raw}`"))?;
    let start = start.trim().parse::<u8>().map_err(|_| format!("invalid start hour `{start}`"))?;
    let end = end.trim().parse::<u8>().map_err(|_| format!("invalid end hour `{end}`"))?;
    HourWindow::try_from((start, end)).map_err(|error| error.to_string())
}

fn parse_min_discount(raw: &str) -> Result<Decimal, String> {
    let value = raw.trim().parse::<Decimal>().map_err(|_| format!("invalid percentage `{raw}`"))?;
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(format!("minimum discount must be between 0 and 100, got {value}"));
    }
    Ok(value)
}
