use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::domain::plan::{HourWindow, Plan, HOURS_PER_DAY};
use crate::domain::preferences::{Preferences, Priority};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoredPlan<'a> {
    pub plan: &'a Plan,
    pub score: Decimal,
}

pub fn is_eligible(plan: &Plan, prefs: &Preferences) -> bool {
    (!plan.requires_smart_meter || prefs.has_smart_meter)
        && plan.discount_pct >= prefs.min_discount_pct
}

/// Hours shared by two daily windows, measured on the 24-hour circle.
pub fn overlap_hours(plan_hours: HourWindow, desired: HourWindow) -> u8 {
    let (plan_start, plan_end) = plan_hours.normalized();
    let (desired_start, desired_end) = desired.normalized();
    let day = i16::from(HOURS_PER_DAY);

    let total: i16 = [-day, 0, day]
        .into_iter()
        .map(|shift| {
            let start = i16::from(plan_start).max(i16::from(desired_start) + shift);
            let end = i16::from(plan_end).min(i16::from(desired_end) + shift);
            (end - start).max(0)
        })
        .sum();
    u8::try_from(total.min(day)).unwrap_or(HOURS_PER_DAY)
}

pub fn score(plan: &Plan, prefs: &Preferences) -> Decimal {
    match (prefs.priority, plan.hours) {
        (Priority::MaxDiscount, _) | (Priority::TimeSpecific, None) => plan.discount_pct,
        (Priority::TimeSpecific, Some(hours)) => {
            Decimal::from(overlap_hours(hours, prefs.effective_window())) * plan.discount_pct
        }
    }
}

/// Eligible plans with their scores, in catalog order.
pub fn score_eligible<'a>(catalog: &'a Catalog, prefs: &Preferences) -> Vec<ScoredPlan<'a>> {
    catalog
        .plans()
        .iter()
        .filter(|plan| is_eligible(plan, prefs))
        .map(|plan| ScoredPlan { plan, score: score(plan, prefs) })
        .collect()
}

/// First plan holding the strictly highest score.
pub fn select_best<'a>(scored: &[ScoredPlan<'a>]) -> Option<&'a Plan> {
    let mut best: Option<&ScoredPlan<'a>> = None;
    for candidate in scored {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|scored| scored.plan)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{overlap_hours, score, select_best, ScoredPlan};
    use crate::domain::plan::{HourWindow, Plan};
    use crate::domain::preferences::Preferences;

    fn window(start: u8, end: u8) -> HourWindow {
        HourWindow::try_from((start, end)).expect("window")
    }

    fn plan(name: &str, discount: i64, hours: Option<HourWindow>) -> Plan {
        Plan {
            name: name.to_owned(),
            vendor: "Vendor".to_owned(),
            discount_pct: Decimal::new(discount, 0),
            hours,
            requires_smart_meter: false,
        }
    }

    #[test]
    fn identical_evening_windows_overlap_four_hours() {
        assert_eq!(overlap_hours(window(18, 22), window(18, 22)), 4);
    }

    #[test]
    fn night_plan_covers_early_morning_window() {
        assert_eq!(overlap_hours(window(23, 7), window(0, 6)), 6);
        assert_eq!(overlap_hours(window(0, 6), window(23, 7)), 6);
    }

    #[test]
    fn disjoint_and_partial_windows() {
        assert_eq!(overlap_hours(window(7, 17), window(18, 22)), 0);
        assert_eq!(overlap_hours(window(16, 20), window(18, 22)), 2);
        assert_eq!(overlap_hours(window(22, 2), window(23, 1)), 2);
        assert_eq!(overlap_hours(window(5, 5), window(18, 22)), 4);
    }

    #[test]
    fn time_specific_score_multiplies_overlap_by_discount() {
        let prefs = Preferences::time_specific(false, window(18, 22), Decimal::ZERO);
        assert_eq!(score(&plan("Evening", 10, Some(window(18, 22))), &prefs), Decimal::new(40, 0));
        assert_eq!(score(&plan("AllDay", 7, None), &prefs), Decimal::new(7, 0));
        assert_eq!(score(&plan("Day", 15, Some(window(7, 17))), &prefs), Decimal::ZERO);
    }

    #[test]
    fn ties_keep_the_first_catalog_entry() {
        let first = plan("First", 10, None);
        let second = plan("Second", 10, None);
        let scored = vec![
            ScoredPlan { plan: &first, score: Decimal::ZERO },
            ScoredPlan { plan: &second, score: Decimal::ZERO },
        ];
        assert_eq!(select_best(&scored).map(|plan| plan.name.as_str()), Some("First"));
        assert_eq!(select_best(&[]), None);
    }
}
