use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::domain::preferences::Priority;
use crate::flows::states::{
    Answer, ConversationEvent, ConversationState, FlowAction, Question, TransitionOutcome,
};

pub trait FlowDefinition {
    fn initial_state(&self) -> ConversationState;
    fn transition(
        &self,
        current: ConversationState,
        event: &ConversationEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// The preference-gathering conversation: smart meter, priority, optional
/// discount window, minimum discount.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdvisorFlow;

impl FlowDefinition for AdvisorFlow {
    fn initial_state(&self) -> ConversationState {
        ConversationState::Initial
    }

    fn transition(
        &self,
        current: ConversationState,
        event: &ConversationEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_advisor(current, event)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> ConversationState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: ConversationState,
        event: &ConversationEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: ConversationState,
        event: &ConversationEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => sink.emit(
                audit
                    .event(
                        "conversation.transition_applied",
                        AuditCategory::Conversation,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event)),
            ),
            Err(error) => sink.emit(
                audit
                    .event(
                        "conversation.transition_rejected",
                        AuditCategory::Conversation,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
            ),
        }
        result
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: ConversationState, event: ConversationEvent },
}

fn transition_advisor(
    current: ConversationState,
    event: &ConversationEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use ConversationEvent::{Answered, Started};
    use ConversationState::{
        AskingDiscountEnd, AskingDiscountStart, AskingMinDiscount, AskingPriority,
        AskingSmartMeter, Completed, Initial,
    };
    use FlowAction::{Ask, CommitDiscountWindow, HoldDiscountStart, Recommend, StoreAnswer};

    let (to, actions) = match (current, event) {
        (Initial, Started) => (AskingSmartMeter, vec![Ask(Question::SmartMeter)]),
        (AskingSmartMeter, Answered(Answer::SmartMeter(_))) => {
            (AskingPriority, vec![StoreAnswer, Ask(Question::Priority)])
        }
        (AskingPriority, Answered(Answer::Priority(Priority::TimeSpecific))) => {
            (AskingDiscountStart, vec![StoreAnswer, Ask(Question::DiscountStart)])
        }
        (AskingPriority, Answered(Answer::Priority(Priority::MaxDiscount))) => {
            (AskingMinDiscount, vec![StoreAnswer, Ask(Question::MinDiscount)])
        }
        (AskingDiscountStart, Answered(Answer::DiscountStart(_))) => {
            (AskingDiscountEnd, vec![HoldDiscountStart, Ask(Question::DiscountEnd)])
        }
        (AskingDiscountEnd, Answered(Answer::DiscountEnd(_))) => {
            (AskingMinDiscount, vec![CommitDiscountWindow, Ask(Question::MinDiscount)])
        }
        (AskingMinDiscount, Answered(Answer::MinDiscount(_))) => {
            (Completed, vec![StoreAnswer, Recommend])
        }
        _ => {
            return Err(FlowTransitionError::InvalidTransition { state: current, event: *event });
        }
    };

    Ok(TransitionOutcome { from: current, to, event: *event, actions })
}
