pub mod answers;
pub mod engine;
pub mod states;

pub use answers::{parse_answer, parse_yes_no, Rejection};
pub use engine::{AdvisorFlow, FlowDefinition, FlowEngine, FlowTransitionError};
pub use states::{
    Answer, ConversationEvent, ConversationState, FlowAction, Question, TransitionOutcome,
};
