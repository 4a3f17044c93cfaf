use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::plan::Hour;
use crate::domain::preferences::Priority;
use crate::flows::states::{Answer, Question};

const YES_TOKENS: [&str; 4] = ["yes", "y", "true", "1"];
const NO_TOKENS: [&str; 4] = ["no", "n", "false", "0"];

/// Why a raw answer was not accepted. The pending question stays open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    ExpectedYesNo,
    ExpectedPriorityChoice,
    InvalidHour,
    NegativeDiscount,
    DiscountAboveMaximum,
    InvalidDiscount,
    NoPendingQuestion,
}

impl Rejection {
    pub fn key(self) -> &'static str {
        match self {
            Self::ExpectedYesNo => "expected_yes_no",
            Self::ExpectedPriorityChoice => "expected_priority_choice",
            Self::InvalidHour => "invalid_hour",
            Self::NegativeDiscount => "negative_discount",
            Self::DiscountAboveMaximum => "discount_above_maximum",
            Self::InvalidDiscount => "invalid_discount",
            Self::NoPendingQuestion => "no_pending_question",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parses untrusted text against the question it answers.
pub fn parse_answer(question: Question, raw: &str) -> Result<Answer, Rejection> {
    let normalized = raw.trim().to_lowercase();
    match question {
        Question::SmartMeter => parse_yes_no(&normalized).map(Answer::SmartMeter),
        Question::Priority => match normalized.as_str() {
            "1" => Ok(Answer::Priority(Priority::MaxDiscount)),
            "2" => Ok(Answer::Priority(Priority::TimeSpecific)),
            _ => Err(Rejection::ExpectedPriorityChoice),
        },
        Question::DiscountStart => parse_hour(&normalized).map(Answer::DiscountStart),
        Question::DiscountEnd => parse_hour(&normalized).map(Answer::DiscountEnd),
        Question::MinDiscount => parse_min_discount(&normalized).map(Answer::MinDiscount),
    }
}

/// Accepts `yes/y/true/1` and `no/n/false/0`, ignoring case and surrounding space.
pub fn parse_yes_no(raw: &str) -> Result<bool, Rejection> {
    let token = raw.trim().to_lowercase();
    let token = token.as_str();
    if YES_TOKENS.contains(&token) {
        Ok(true)
    } else if NO_TOKENS.contains(&token) {
        Ok(false)
    } else {
        Err(Rejection::ExpectedYesNo)
    }
}

fn parse_hour(token: &str) -> Result<Hour, Rejection> {
    let value = token.parse::<u8>().map_err(|_| Rejection::InvalidHour)?;
    Hour::new(value).map_err(|_| Rejection::InvalidHour)
}

fn parse_min_discount(token: &str) -> Result<Decimal, Rejection> {
    if token.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let token = token.strip_suffix('%').unwrap_or(token).trim_end();
    let value = Decimal::from_str(token).map_err(|_| Rejection::InvalidDiscount)?;
    if value.is_sign_negative() && !value.is_zero() {
        Err(Rejection::NegativeDiscount)
    } else if value > Decimal::ONE_HUNDRED {
        Err(Rejection::DiscountAboveMaximum)
    } else {
        Ok(value)
    }
}
