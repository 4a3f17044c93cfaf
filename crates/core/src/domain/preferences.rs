use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::plan::{Hour, HourWindow};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    MaxDiscount,
    TimeSpecific,
}

/// Answers collected so far in one session. Fields stay `None` until answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub has_smart_meter: Option<bool>,
    pub priority: Option<Priority>,
    pub discount_window: Option<HourWindow>,
    pub min_discount_pct: Decimal,
}

impl Default for PreferenceRecord {
    fn default() -> Self {
        Self {
            has_smart_meter: None,
            priority: None,
            discount_window: None,
            min_discount_pct: Decimal::ZERO,
        }
    }
}

impl PreferenceRecord {
    pub fn is_blank(&self) -> bool {
        self == &Self::default()
    }

    pub fn commit_window(&mut self, start: Hour, end: Hour) {
        self.discount_window = Some(HourWindow::new(start, end));
    }
}

/// A fully answered preference record, ready for recommendation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub has_smart_meter: bool,
    pub priority: Priority,
    pub discount_window: Option<HourWindow>,
    pub min_discount_pct: Decimal,
}

impl Preferences {
    pub fn max_discount(has_smart_meter: bool, min_discount_pct: Decimal) -> Self {
        Self {
            has_smart_meter,
            priority: Priority::MaxDiscount,
            discount_window: None,
            min_discount_pct,
        }
    }

    pub fn time_specific(
        has_smart_meter: bool,
        discount_window: HourWindow,
        min_discount_pct: Decimal,
    ) -> Self {
        Self {
            has_smart_meter,
            priority: Priority::TimeSpecific,
            discount_window: Some(discount_window),
            min_discount_pct,
        }
    }

    /// Desired window for time-specific scoring, falling back to the evening window.
    pub fn effective_window(&self) -> HourWindow {
        self.discount_window.unwrap_or(HourWindow::EVENING)
    }
}

impl TryFrom<&PreferenceRecord> for Preferences {
    type Error = DomainError;

    fn try_from(record: &PreferenceRecord) -> Result<Self, Self::Error> {
        let has_smart_meter = record.has_smart_meter.ok_or_else(|| {
            DomainError::InvariantViolation("smart meter answer is missing".to_owned())
        })?;
        let priority = record
            .priority
            .ok_or_else(|| DomainError::InvariantViolation("priority answer is missing".to_owned()))?;
        if priority == Priority::TimeSpecific && record.discount_window.is_none() {
            return Err(DomainError::InvariantViolation(
                "time-specific priority requires a complete discount window".to_owned(),
            ));
        }

        Ok(Self {
            has_smart_meter,
            priority,
            discount_window: record.discount_window,
            min_discount_pct: record.min_discount_pct,
        })
    }
}
