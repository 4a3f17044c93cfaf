pub mod audit;
pub mod catalog;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod recommendation;
pub mod sessions;

pub use catalog::{Catalog, CatalogError};
pub use conversation::{AnswerOutcome, ConversationEngine, ConversationError, Turn};
pub use domain::plan::{Hour, HourWindow, Plan};
pub use domain::preferences::{PreferenceRecord, Preferences, Priority};
pub use domain::user::UserId;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{ConversationState, Question, Rejection};
pub use recommendation::{
    format_recommendation, get_recommendation, DeterministicRecommendationEngine,
    RecommendationEngine, RecommendationSummary,
};
pub use sessions::{InMemorySessionStore, Session, SessionStore, SessionStoreError};
