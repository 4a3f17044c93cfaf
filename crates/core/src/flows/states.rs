use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::plan::Hour;
use crate::domain::preferences::Priority;

/// Position of a session in the preference-gathering conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Initial,
    AskingSmartMeter,
    AskingPriority,
    AskingDiscountStart,
    AskingDiscountEnd,
    AskingMinDiscount,
    Completed,
}

impl ConversationState {
    pub const ALL: [ConversationState; 7] = [
        Self::Initial,
        Self::AskingSmartMeter,
        Self::AskingPriority,
        Self::AskingDiscountStart,
        Self::AskingDiscountEnd,
        Self::AskingMinDiscount,
        Self::Completed,
    ];

    /// The question awaiting an answer in this state, if any.
    pub fn pending_question(self) -> Option<Question> {
        match self {
            Self::AskingSmartMeter => Some(Question::SmartMeter),
            Self::AskingPriority => Some(Question::Priority),
            Self::AskingDiscountStart => Some(Question::DiscountStart),
            Self::AskingDiscountEnd => Some(Question::DiscountEnd),
            Self::AskingMinDiscount => Some(Question::MinDiscount),
            Self::Initial | Self::Completed => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::AskingSmartMeter => "asking_smart_meter",
            Self::AskingPriority => "asking_priority",
            Self::AskingDiscountStart => "asking_discount_start",
            Self::AskingDiscountEnd => "asking_discount_end",
            Self::AskingMinDiscount => "asking_min_discount",
            Self::Completed => "completed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Question {
    SmartMeter,
    Priority,
    DiscountStart,
    DiscountEnd,
    MinDiscount,
}

impl Question {
    pub fn key(self) -> &'static str {
        match self {
            Self::SmartMeter => "smart_meter",
            Self::Priority => "priority",
            Self::DiscountStart => "discount_start",
            Self::DiscountEnd => "discount_end",
            Self::MinDiscount => "min_discount",
        }
    }
}

/// A parsed, validated answer to one [`Question`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "question", content = "value", rename_all = "snake_case")]
pub enum Answer {
    SmartMeter(bool),
    Priority(Priority),
    DiscountStart(Hour),
    DiscountEnd(Hour),
    MinDiscount(Decimal),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationEvent {
    Started,
    Answered(Answer),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    Ask(Question),
    StoreAnswer,
    HoldDiscountStart,
    CommitDiscountWindow,
    Recommend,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: ConversationState,
    pub to: ConversationState,
    pub event: ConversationEvent,
    pub actions: Vec<FlowAction>,
}
