use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const HOURS_PER_DAY: u8 = 24;

/// Hour of day in `0..=23`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Hour(u8);

impl Hour {
    pub fn new(value: u8) -> Result<Self, DomainError> {
        if value < HOURS_PER_DAY {
            Ok(Self(value))
        } else {
            Err(DomainError::HourOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Hour {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hour> for u8 {
    fn from(hour: Hour) -> Self {
        hour.0
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00", self.0)
    }
}

/// A daily window of hours. When `end <= start` the window wraps past midnight,
/// so `(23, 7)` covers the night and `(5, 5)` covers the whole day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct HourWindow {
    pub start: Hour,
    pub end: Hour,
}

impl HourWindow {
    /// Used when a time-specific preference arrives without explicit hours.
    pub const EVENING: HourWindow = HourWindow { start: Hour(18), end: Hour(22) };

    pub fn new(start: Hour, end: Hour) -> Self {
        Self { start, end }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end <= self.start
    }

    /// `(start, end)` on a linear axis where `end` has been pushed past 24 for
    /// wrapping windows.
    pub fn normalized(&self) -> (u8, u8) {
        let start = self.start.value();
        let end = self.end.value();
        if self.wraps_midnight() {
            (start, end + HOURS_PER_DAY)
        } else {
            (start, end)
        }
    }

    pub fn len_hours(&self) -> u8 {
        let (start, end) = self.normalized();
        end - start
    }
}

impl TryFrom<(u8, u8)> for HourWindow {
    type Error = DomainError;

    fn try_from((start, end): (u8, u8)) -> Result<Self, Self::Error> {
        Ok(Self::new(Hour::new(start)?, Hour::new(end)?))
    }
}

impl From<HourWindow> for (u8, u8) {
    fn from(window: HourWindow) -> Self {
        (window.start.value(), window.end.value())
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub vendor: String,
    pub discount_pct: Decimal,
    #[serde(default)]
    pub hours: Option<HourWindow>,
    pub requires_smart_meter: bool,
}

impl Plan {
    pub fn is_all_day(&self) -> bool {
        self.hours.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation("plan name must not be blank".to_owned()));
        }
        if self.vendor.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "plan `{}` has a blank vendor",
                self.name
            )));
        }
        if self.discount_pct < Decimal::ZERO || self.discount_pct > Decimal::ONE_HUNDRED {
            return Err(DomainError::InvariantViolation(format!(
                "plan `{}` discount_pct must be in range 0..=100, got {}",
                self.name, self.discount_pct
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = match &self.hours {
            Some(window) => window.to_string(),
            None => "All day".to_owned(),
        };
        write!(f, "{} - {} ({:.1}% discount, {hours})", self.vendor, self.name, self.discount_pct)
    }
}
