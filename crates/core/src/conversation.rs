use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, TracingAuditSink};
use crate::domain::preferences::Preferences;
use crate::domain::user::UserId;
use crate::errors::{ApplicationError, DomainError};
use crate::flows::{
    parse_answer, AdvisorFlow, Answer, ConversationEvent, ConversationState, FlowAction,
    FlowEngine, FlowTransitionError, Question, Rejection,
};
use crate::recommendation::RecommendationSummary;
use crate::sessions::{
    acquire, InMemorySessionStore, Session, SessionLocks, SessionStore, SessionStoreError,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<ConversationError> for ApplicationError {
    fn from(value: ConversationError) -> Self {
        match value {
            ConversationError::Store(error) => Self::SessionStore(error.to_string()),
            ConversationError::Flow(error) => Self::Domain(DomainError::FlowTransition(error)),
            ConversationError::Domain(error) => Self::Domain(error),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Accepted { state: ConversationState },
    Rejected { reason: Rejection },
}

impl AnswerOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Drives one conversation per user through the advisor flow.
pub struct ConversationEngine {
    flow: FlowEngine<AdvisorFlow>,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    audit: Arc<dyn AuditSink>,
    idle_ttl: Option<Duration>,
}

impl Default for ConversationEngine {
    fn default() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()), Arc::new(TracingAuditSink))
    }
}

impl ConversationEngine {
    pub fn new(store: Arc<dyn SessionStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            flow: FlowEngine::new(AdvisorFlow),
            store,
            locks: SessionLocks::new(),
            audit,
            idle_ttl: None,
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Option<Duration>) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    /// Runs `turn` while holding the user's session lock. Every read and write
    /// made through the [`Turn`] sees the same session, and concurrent turns for
    /// that user wait until this one returns.
    pub fn with_turn<T>(
        &self,
        user_id: &UserId,
        correlation_id: &str,
        turn: impl FnOnce(&Turn<'_>) -> T,
    ) -> T {
        let handle = self.locks.handle(user_id);
        let _guard = acquire(&handle);
        turn(&Turn { engine: self, user_id, audit: self.audit_context(user_id, correlation_id) })
    }

    pub fn get_or_create_session(&self, user_id: &UserId) -> Result<Session, ConversationError> {
        self.with_turn(user_id, &fresh_correlation_id(), |turn| turn.session())
    }

    /// Question awaiting an answer. Starts the conversation when the session is
    /// new; repeated calls return the same question until it is answered.
    pub fn next_question(&self, user_id: &UserId) -> Result<Option<Question>, ConversationError> {
        self.with_turn(user_id, &fresh_correlation_id(), |turn| turn.next_question())
    }

    pub fn process_answer(
        &self,
        user_id: &UserId,
        raw: &str,
    ) -> Result<AnswerOutcome, ConversationError> {
        self.with_turn(user_id, &fresh_correlation_id(), |turn| turn.process_answer(raw))
    }

    pub fn state(&self, user_id: &UserId) -> Result<ConversationState, ConversationError> {
        Ok(self.get_or_create_session(user_id)?.state)
    }

    pub fn is_complete(&self, user_id: &UserId) -> Result<bool, ConversationError> {
        Ok(self.state(user_id)? == ConversationState::Completed)
    }

    /// The finished preferences, or `None` while questions remain.
    pub fn completed_record(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Preferences>, ConversationError> {
        self.with_turn(user_id, &fresh_correlation_id(), |turn| turn.completed_record())
    }

    pub fn reset(&self, user_id: &UserId) -> Result<Session, ConversationError> {
        self.with_turn(user_id, &fresh_correlation_id(), |turn| turn.reset())
    }

    /// Removes sessions idle for longer than the configured TTL. Without a
    /// TTL nothing expires.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, ConversationError> {
        let Some(ttl) = self.idle_ttl else {
            return Ok(0);
        };
        let removed = self.store.remove_idle_since(now - ttl)?;
        let pruned_locks = self.locks.prune();
        if removed > 0 {
            info!(
                event_name = "session.expired_purged",
                removed,
                pruned_locks,
                ttl_secs = ttl.num_seconds(),
                "purged idle sessions"
            );
        }
        Ok(removed)
    }

    pub fn session_count(&self) -> Result<usize, ConversationError> {
        Ok(self.store.len()?)
    }

    fn load_or_create(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        audit: &AuditContext,
    ) -> Result<Session, ConversationError> {
        if let Some(session) = self.store.load(user_id)? {
            if !self.is_expired(&session, now) {
                return Ok(session);
            }
            debug!(
                event_name = "session.expired_on_load",
                session_id = %user_id,
                correlation_id = %audit.correlation_id,
                "replacing expired session"
            );
        }

        let session = Session::new(user_id.clone(), now);
        self.store.save(session.clone())?;
        self.audit.emit(audit.event("session.created", AuditCategory::Session, AuditOutcome::Success));
        Ok(session)
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        self.idle_ttl.is_some_and(|ttl| session.is_idle_since(now - ttl))
    }

    fn audit_context(&self, user_id: &UserId, correlation_id: &str) -> AuditContext {
        AuditContext::new(Some(user_id.clone()), None, correlation_id, "conversation-engine")
    }
}

/// One user's session, locked for the duration of
/// [`ConversationEngine::with_turn`].
pub struct Turn<'a> {
    engine: &'a ConversationEngine,
    user_id: &'a UserId,
    audit: AuditContext,
}

impl Turn<'_> {
    pub fn user_id(&self) -> &UserId {
        self.user_id
    }

    pub fn correlation_id(&self) -> &str {
        &self.audit.correlation_id
    }

    pub fn session(&self) -> Result<Session, ConversationError> {
        self.engine.load_or_create(self.user_id, Utc::now(), &self.audit)
    }

    pub fn state(&self) -> Result<ConversationState, ConversationError> {
        Ok(self.session()?.state)
    }

    pub fn next_question(&self) -> Result<Option<Question>, ConversationError> {
        let engine = self.engine;
        let now = Utc::now();
        let mut session = engine.load_or_create(self.user_id, now, &self.audit)?;

        if session.state == ConversationState::Initial {
            let outcome = engine.flow.apply_with_audit(
                session.state,
                &ConversationEvent::Started,
                engine.audit.as_ref(),
                &self.audit,
            )?;
            session.state = outcome.to;
            session.touch(now);
            engine.store.save(session.clone())?;
        }

        Ok(session.state.pending_question())
    }

    pub fn process_answer(&self, raw: &str) -> Result<AnswerOutcome, ConversationError> {
        let engine = self.engine;
        let now = Utc::now();
        let mut session = engine.load_or_create(self.user_id, now, &self.audit)?;

        let parsed = match session.state.pending_question() {
            Some(question) => parse_answer(question, raw),
            None => Err(Rejection::NoPendingQuestion),
        };
        let answer = match parsed {
            Ok(answer) => answer,
            Err(reason) => {
                engine.audit.emit(
                    self.audit
                        .event(
                            "conversation.answer_rejected",
                            AuditCategory::Conversation,
                            AuditOutcome::Rejected,
                        )
                        .with_metadata("state", session.state.as_str())
                        .with_metadata("reason", reason.key()),
                );
                session.touch(now);
                engine.store.save(session)?;
                return Ok(AnswerOutcome::Rejected { reason });
            }
        };

        let outcome = engine.flow.apply_with_audit(
            session.state,
            &ConversationEvent::Answered(answer),
            engine.audit.as_ref(),
            &self.audit,
        )?;
        apply_actions(&mut session, &outcome.actions, answer)?;
        session.state = outcome.to;
        session.touch(now);
        engine.store.save(session)?;

        debug!(
            event_name = "conversation.answer_accepted",
            session_id = %self.user_id,
            correlation_id = %self.audit.correlation_id,
            from = outcome.from.as_str(),
            to = outcome.to.as_str(),
            "answer accepted"
        );
        Ok(AnswerOutcome::Accepted { state: outcome.to })
    }

    pub fn completed_record(&self) -> Result<Option<Preferences>, ConversationError> {
        let session = self.session()?;
        if session.state != ConversationState::Completed {
            return Ok(None);
        }
        Ok(Some(Preferences::try_from(&session.record)?))
    }

    pub fn reset(&self) -> Result<Session, ConversationError> {
        let session = Session::new(self.user_id.clone(), Utc::now());
        self.engine.store.save(session.clone())?;
        self.engine.audit.emit(self.audit.event(
            "session.reset",
            AuditCategory::Session,
            AuditOutcome::Success,
        ));
        Ok(session)
    }

    /// Audits the plan chosen for the completed record, or the lack of one.
    pub fn record_recommendation(&self, summary: Option<&RecommendationSummary>) {
        let event = match summary {
            Some(summary) => self
                .audit
                .event(
                    "recommendation.selected",
                    AuditCategory::Recommendation,
                    AuditOutcome::Success,
                )
                .with_metadata("vendor", summary.vendor.as_str())
                .with_metadata("plan", summary.plan_name.as_str())
                .with_metadata("discount_pct", summary.discount_pct.to_string()),
            None => self.audit.event(
                "recommendation.no_match",
                AuditCategory::Recommendation,
                AuditOutcome::Rejected,
            ),
        };
        self.engine.audit.emit(event);
    }
}

fn fresh_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Writes an accepted answer into the session as the transition's actions
/// direct. `Ask` and `Recommend` leave the session alone: the resulting state
/// already names the next question or marks the record complete.
fn apply_actions(
    session: &mut Session,
    actions: &[FlowAction],
    answer: Answer,
) -> Result<(), DomainError> {
    for action in actions {
        match (*action, answer) {
            (FlowAction::StoreAnswer, Answer::SmartMeter(has_smart_meter)) => {
                session.record.has_smart_meter = Some(has_smart_meter);
            }
            (FlowAction::StoreAnswer, Answer::Priority(priority)) => {
                session.record.priority = Some(priority);
                session.record.discount_window = None;
            }
            (FlowAction::StoreAnswer, Answer::MinDiscount(min_discount_pct)) => {
                session.record.min_discount_pct = min_discount_pct;
            }
            (FlowAction::HoldDiscountStart, Answer::DiscountStart(start)) => {
                session.pending_window_start = Some(start);
            }
            (FlowAction::CommitDiscountWindow, Answer::DiscountEnd(end)) => {
                let start = session.pending_window_start.take().ok_or_else(|| {
                    DomainError::InvariantViolation(
                        "discount window end answered before its start".to_owned(),
                    )
                })?;
                session.record.commit_window(start, end);
            }
            (FlowAction::Ask(_) | FlowAction::Recommend, _) => {}
            (action, answer) => {
                return Err(DomainError::InvariantViolation(format!(
                    "{action:?} cannot apply {answer:?}"
                )));
            }
        }
    }
    Ok(())
}
