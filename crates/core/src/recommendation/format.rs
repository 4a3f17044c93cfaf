use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::domain::plan::{HourWindow, Plan};
use crate::domain::preferences::{Preferences, Priority};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceBasis {
    HighestDiscount,
    PreferredHours,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum NextStep {
    ContactVendor { vendor: String, plan: String },
    InstallSmartMeter,
    NoSmartMeterNeeded,
    ShiftUsageToDiscountHours { hours: HourWindow },
    EnjoyAllDayDiscount,
}

/// Everything a transport needs to render a recommendation in its own language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub vendor: String,
    pub plan_name: String,
    pub discount_pct: Decimal,
    pub hours: Option<HourWindow>,
    pub requires_smart_meter: bool,
    /// Plan discount minus the catalog mean, rounded to one decimal place.
    pub delta_vs_mean_pct: Decimal,
    pub basis: ChoiceBasis,
    pub next_steps: Vec<NextStep>,
}

impl RecommendationSummary {
    pub fn new(catalog: &Catalog, plan: &Plan, prefs: &Preferences) -> Self {
        let delta_vs_mean_pct = (plan.discount_pct - catalog.mean_discount_pct())
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        let basis = match prefs.priority {
            Priority::MaxDiscount => ChoiceBasis::HighestDiscount,
            Priority::TimeSpecific => ChoiceBasis::PreferredHours,
        };

        let mut next_steps = vec![NextStep::ContactVendor {
            vendor: plan.vendor.clone(),
            plan: plan.name.clone(),
        }];
        next_steps.push(if plan.requires_smart_meter {
            NextStep::InstallSmartMeter
        } else {
            NextStep::NoSmartMeterNeeded
        });
        next_steps.push(match plan.hours {
            Some(hours) => NextStep::ShiftUsageToDiscountHours { hours },
            None => NextStep::EnjoyAllDayDiscount,
        });

        Self {
            vendor: plan.vendor.clone(),
            plan_name: plan.name.clone(),
            discount_pct: plan.discount_pct,
            hours: plan.hours,
            requires_smart_meter: plan.requires_smart_meter,
            delta_vs_mean_pct,
            basis,
            next_steps,
        }
    }

    pub fn hours_label(&self) -> String {
        match self.hours {
            Some(hours) => hours.to_string(),
            None => "All day".to_owned(),
        }
    }

    pub fn is_above_mean(&self) -> bool {
        self.delta_vs_mean_pct > Decimal::ZERO
    }

    /// Delta against the catalog mean with an explicit sign, e.g. `+2.5`.
    pub fn signed_delta(&self) -> String {
        let delta = self.delta_vs_mean_pct;
        let sign = if delta < Decimal::ZERO { '-' } else { '+' };
        format!("{sign}{:.1}", delta.abs())
    }
}

impl fmt::Display for RecommendationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.hours_label();
        writeln!(f, "Recommended Provider: {} - {}", self.vendor, self.plan_name)?;
        writeln!(f)?;
        writeln!(f, "Plan Details:")?;
        writeln!(f, "- Discount: {:.1}%", self.discount_pct)?;
        writeln!(f, "- Hours: {hours}")?;
        writeln!(
            f,
            "- Smart Meter Required: {}",
            if self.requires_smart_meter { "Yes" } else { "No" }
        )?;
        writeln!(f)?;
        writeln!(f, "Why This Plan:")?;
        match self.basis {
            ChoiceBasis::HighestDiscount => {
                writeln!(f, "- Best discount percentage: {:.1}%", self.discount_pct)?
            }
            ChoiceBasis::PreferredHours => writeln!(
                f,
                "- Best discount during your preferred hours: {:.1}% ({hours})",
                self.discount_pct
            )?,
        }
        writeln!(f, "- Compared to average: {}%", self.signed_delta())?;
        writeln!(f)?;
        write!(f, "Next Steps:")?;
        for step in &self.next_steps {
            write!(f, "\n- {step}")?;
        }
        Ok(())
    }
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContactVendor { vendor, plan } => {
                write!(f, "Contact {vendor} to sign up for the '{plan}' plan")
            }
            Self::InstallSmartMeter => f.write_str("Make sure to install a smart meter"),
            Self::NoSmartMeterNeeded => f.write_str("No smart meter required"),
            Self::ShiftUsageToDiscountHours { hours } => {
                write!(f, "Optimize your usage during discount hours ({hours})")
            }
            Self::EnjoyAllDayDiscount => f.write_str("Enjoy discounts all day"),
        }
    }
}

pub fn format_recommendation(catalog: &Catalog, plan: &Plan, prefs: &Preferences) -> String {
    RecommendationSummary::new(catalog, plan, prefs).to_string()
}
