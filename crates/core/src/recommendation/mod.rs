pub mod format;
pub mod scoring;

use tracing::debug;

use crate::catalog::Catalog;
use crate::domain::plan::Plan;
use crate::domain::preferences::Preferences;

pub use format::{format_recommendation, ChoiceBasis, NextStep, RecommendationSummary};
pub use scoring::{overlap_hours, score_eligible, select_best, ScoredPlan};

pub trait RecommendationEngine: Send + Sync {
    fn recommend<'a>(&self, catalog: &'a Catalog, prefs: &Preferences) -> Option<&'a Plan>;

    fn summarize(&self, catalog: &Catalog, prefs: &Preferences) -> Option<RecommendationSummary> {
        self.recommend(catalog, prefs).map(|plan| RecommendationSummary::new(catalog, plan, prefs))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicRecommendationEngine;

impl RecommendationEngine for DeterministicRecommendationEngine {
    fn recommend<'a>(&self, catalog: &'a Catalog, prefs: &Preferences) -> Option<&'a Plan> {
        get_recommendation(catalog, prefs)
    }
}

/// Best eligible plan for `prefs`, or `None` when no plan passes the
/// smart-meter and minimum-discount gates.
pub fn get_recommendation<'a>(catalog: &'a Catalog, prefs: &Preferences) -> Option<&'a Plan> {
    let scored = score_eligible(catalog, prefs);
    let selected = select_best(&scored);
    debug!(
        event_name = "recommendation.selected",
        eligible = scored.len(),
        priority = ?prefs.priority,
        plan = selected.map(|plan| plan.name.as_str()).unwrap_or("-"),
        "recommendation evaluated"
    );
    selected
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        format_recommendation, get_recommendation, DeterministicRecommendationEngine, NextStep,
        RecommendationEngine, RecommendationSummary,
    };
    use crate::catalog::Catalog;
    use crate::domain::plan::{HourWindow, Plan};
    use crate::domain::preferences::Preferences;

    fn two_plan_catalog() -> Catalog {
        Catalog::new(vec![
            Plan {
                name: "GreenPower".to_owned(),
                vendor: "Green Energy Co".to_owned(),
                discount_pct: Decimal::new(15, 0),
                hours: None,
                requires_smart_meter: true,
            },
            Plan {
                name: "Basic".to_owned(),
                vendor: "Basic Power".to_owned(),
                discount_pct: Decimal::new(10, 0),
                hours: Some(HourWindow::try_from((18, 22)).expect("window")),
                requires_smart_meter: false,
            },
        ])
        .expect("catalog")
    }

    fn evening() -> HourWindow {
        HourWindow::try_from((18, 22)).expect("window")
    }

    #[test]
    fn max_discount_with_smart_meter_picks_highest_discount() {
        let catalog = two_plan_catalog();
        let prefs = Preferences::max_discount(true, Decimal::new(5, 0));
        let plan = get_recommendation(&catalog, &prefs).expect("a plan");
        assert_eq!(plan.name, "GreenPower");
    }

    #[test]
    fn smart_meter_gate_removes_plans_before_scoring() {
        let catalog = two_plan_catalog();
        let prefs = Preferences::time_specific(false, evening(), Decimal::new(5, 0));
        let plan = get_recommendation(&catalog, &prefs).expect("a plan");
        assert_eq!(plan.name, "Basic");
    }

    #[test]
    fn minimum_discount_above_every_plan_yields_none() {
        let catalog = two_plan_catalog();
        let prefs = Preferences::max_discount(true, Decimal::new(20, 0));
        assert_eq!(get_recommendation(&catalog, &prefs), None);
        assert_eq!(DeterministicRecommendationEngine.summarize(&catalog, &prefs), None);
    }

    #[test]
    fn zero_scores_still_select_the_first_eligible_plan() {
        let catalog = Catalog::new(vec![
            Plan {
                name: "Morning".to_owned(),
                vendor: "A".to_owned(),
                discount_pct: Decimal::new(12, 0),
                hours: Some(HourWindow::try_from((6, 9)).expect("window")),
                requires_smart_meter: false,
            },
            Plan {
                name: "Noon".to_owned(),
                vendor: "B".to_owned(),
                discount_pct: Decimal::new(20, 0),
                hours: Some(HourWindow::try_from((11, 14)).expect("window")),
                requires_smart_meter: false,
            },
        ])
        .expect("catalog");
        let prefs = Preferences::time_specific(false, evening(), Decimal::ZERO);
        let plan = get_recommendation(&catalog, &prefs).expect("non-empty eligible set");
        assert_eq!(plan.name, "Morning");
    }

    #[test]
    fn all_day_plan_gets_full_credit_for_time_specific_users() {
        let catalog = two_plan_catalog();
        let prefs = Preferences::time_specific(true, evening(), Decimal::ZERO);
        let plan = get_recommendation(&catalog, &prefs).expect("a plan");
        assert_eq!(plan.name, "Basic", "4h * 10% outscores the 15% all-day plan");
    }

    #[test]
    fn summary_reports_delta_against_catalog_mean() {
        let catalog = two_plan_catalog();
        let prefs = Preferences::max_discount(true, Decimal::ZERO);
        let plan = get_recommendation(&catalog, &prefs).expect("a plan");
        let summary = RecommendationSummary::new(&catalog, plan, &prefs);

        assert_eq!(summary.delta_vs_mean_pct, Decimal::new(25, 1));
        assert_eq!(summary.signed_delta(), "+2.5");
        assert!(summary.is_above_mean());
        assert_eq!(
            summary.next_steps,
            vec![
                NextStep::ContactVendor {
                    vendor: "Green Energy Co".to_owned(),
                    plan: "GreenPower".to_owned()
                },
                NextStep::InstallSmartMeter,
                NextStep::EnjoyAllDayDiscount,
            ]
        );
    }

    #[test]
    fn formatted_text_mentions_hours_and_hints() {
        let catalog = two_plan_catalog();
        let prefs = Preferences::time_specific(false, evening(), Decimal::ZERO);
        let plan = get_recommendation(&catalog, &prefs).expect("a plan");
        let text = format_recommendation(&catalog, plan, &prefs);

        assert!(text.starts_with("Recommended Provider: Basic Power - Basic"));
        assert!(text.contains("- Hours: 18:00-22:00"));
        assert!(text.contains("- Smart Meter Required: No"));
        assert!(text.contains("- Compared to average: -2.5%"));
        assert!(text.contains("Best discount during your preferred hours"));
        assert!(text.contains("No smart meter required"));
        assert!(text.contains("Optimize your usage during discount hours (18:00-22:00)"));
    }
}
