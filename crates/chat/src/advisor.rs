use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use voltwiz_core::config::AppConfig;
use voltwiz_core::errors::ApplicationError;
use voltwiz_core::{
    AnswerOutcome, Catalog, ConversationEngine, ConversationError, ConversationState,
    DeterministicRecommendationEngine, RecommendationEngine, Turn, UserId,
};

use crate::blocks::{MessageTemplate, ANSWER_ACTION_ID, RESTART_ACTION_ID};
use crate::commands::{classify_text, ChatCommand, Inbound, RestartKeywords};
use crate::events::{ConversationService, EventContext, EventHandlerError};
use crate::messages::{MessageCatalog, MessageError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdvisorError {
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error(transparent)]
    Messages(#[from] MessageError),
}

impl From<AdvisorError> for ApplicationError {
    fn from(value: AdvisorError) -> Self {
        match value {
            AdvisorError::Conversation(error) => error.into(),
            AdvisorError::Messages(error) => Self::Configuration(error.to_string()),
        }
    }
}

/// Turns inbound chat text into replies: commands and restart keywords,
/// answers to the pending question, and the final recommendation.
pub struct AdvisorService {
    conversations: ConversationEngine,
    catalog: Arc<Catalog>,
    recommender: Arc<dyn RecommendationEngine>,
    messages: MessageCatalog,
    restart: RestartKeywords,
}

impl AdvisorService {
    pub fn new(
        conversations: ConversationEngine,
        catalog: Arc<Catalog>,
        messages: MessageCatalog,
    ) -> Self {
        Self {
            conversations,
            catalog,
            recommender: Arc::new(DeterministicRecommendationEngine),
            messages,
            restart: RestartKeywords::default(),
        }
    }

    pub fn from_config(config: &AppConfig, catalog: Arc<Catalog>) -> Result<Self, AdvisorError> {
        let conversations = ConversationEngine::default().with_idle_ttl(config.sessions.idle_ttl());
        let messages = MessageCatalog::new(config.messages.locale)?;
        Ok(Self::new(conversations, catalog, messages).with_restart_keywords(RestartKeywords::new(
            config.webhook.restart_keywords.iter().cloned(),
        )))
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn RecommendationEngine>) -> Self {
        self.recommender = recommender;
        self
    }

    pub fn with_restart_keywords(mut self, restart: RestartKeywords) -> Self {
        self.restart = restart;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    pub fn conversations(&self) -> &ConversationEngine {
        &self.conversations
    }

    pub fn active_sessions(&self) -> Result<usize, AdvisorError> {
        Ok(self.conversations.session_count()?)
    }

    /// Drops sessions idle past the configured TTL.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AdvisorError> {
        Ok(self.conversations.purge_expired(now)?)
    }

    pub fn handle_text(
        &self,
        user_id: &UserId,
        text: &str,
    ) -> Result<Vec<MessageTemplate>, AdvisorError> {
        self.handle_text_in(user_id, text, &EventContext::generated())
    }

    /// One inbound message as a single turn: the pending question is read,
    /// the answer parsed and stored, and the reply chosen under one session lock.
    pub fn handle_text_in(
        &self,
        user_id: &UserId,
        text: &str,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, AdvisorError> {
        match classify_text(text, &self.restart) {
            Inbound::Command(command) => self.handle_command_in(user_id, &command, ctx),
            Inbound::Answer(raw) => self
                .conversations
                .with_turn(user_id, &ctx.correlation_id, |turn| self.answer(turn, &raw)),
        }
    }

    pub fn handle_command(
        &self,
        user_id: &UserId,
        command: &ChatCommand,
    ) -> Result<Vec<MessageTemplate>, AdvisorError> {
        self.handle_command_in(user_id, command, &EventContext::generated())
    }

    pub fn handle_command_in(
        &self,
        user_id: &UserId,
        command: &ChatCommand,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, AdvisorError> {
        debug!(
            event_name = "advisor.command",
            session_id = %user_id,
            correlation_id = %ctx.correlation_id,
            command = command.as_str(),
            "chat command received"
        );
        let notice = match command {
            ChatCommand::Start => self.messages.welcome()?,
            ChatCommand::Reset => self.messages.reset_notice()?,
            ChatCommand::Help => return Ok(vec![self.messages.help()?]),
            ChatCommand::Unknown { name } => return Ok(vec![self.messages.unknown_command(name)?]),
        };
        self.conversations.with_turn(user_id, &ctx.correlation_id, |turn| self.restart(turn, notice))
    }

    /// Quick-reply buttons carry canonical answer values; the restart button
    /// behaves like `/start`. Unknown actions produce no reply.
    pub fn handle_button(
        &self,
        user_id: &UserId,
        action_id: &str,
        value: Option<&str>,
    ) -> Result<Vec<MessageTemplate>, AdvisorError> {
        self.handle_button_in(user_id, action_id, value, &EventContext::generated())
    }

    pub fn handle_button_in(
        &self,
        user_id: &UserId,
        action_id: &str,
        value: Option<&str>,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, AdvisorError> {
        match action_id {
            RESTART_ACTION_ID => self.handle_command_in(user_id, &ChatCommand::Start, ctx),
            ANSWER_ACTION_ID => self.conversations.with_turn(user_id, &ctx.correlation_id, |turn| {
                self.answer(turn, value.unwrap_or_default())
            }),
            _ => Ok(Vec::new()),
        }
    }

    fn restart(
        &self,
        turn: &Turn<'_>,
        notice: MessageTemplate,
    ) -> Result<Vec<MessageTemplate>, AdvisorError> {
        turn.reset()?;
        let mut replies = vec![notice];
        if let Some(question) = turn.next_question()? {
            replies.push(self.messages.question(question)?);
        }
        info!(
            event_name = "advisor.conversation_started",
            session_id = %turn.user_id(),
            correlation_id = %turn.correlation_id(),
            "conversation started"
        );
        Ok(replies)
    }

    fn answer(&self, turn: &Turn<'_>, raw: &str) -> Result<Vec<MessageTemplate>, AdvisorError> {
        let question = match turn.state()? {
            ConversationState::Completed => return Ok(vec![self.messages.completed()?]),
            ConversationState::Initial => return self.restart(turn, self.messages.welcome()?),
            pending => pending.pending_question(),
        };
        let canonical = match question {
            Some(question) => self.messages.canonical_answer(question, raw),
            None => raw.trim().to_owned(),
        };

        match turn.process_answer(&canonical)? {
            AnswerOutcome::Rejected { reason } => {
                let mut replies = vec![self.messages.rejection(reason)?];
                if let Some(question) = turn.next_question()? {
                    replies.push(self.messages.question(question)?);
                }
                Ok(replies)
            }
            AnswerOutcome::Accepted { state: ConversationState::Completed } => self.conclude(turn),
            AnswerOutcome::Accepted { .. } => match turn.next_question()? {
                Some(question) => Ok(vec![self.messages.question(question)?]),
                None => self.conclude(turn),
            },
        }
    }

    fn conclude(&self, turn: &Turn<'_>) -> Result<Vec<MessageTemplate>, AdvisorError> {
        let Some(preferences) = turn.completed_record()? else {
            return Ok(vec![self.messages.completed()?]);
        };

        let summary = self.recommender.summarize(&self.catalog, &preferences);
        turn.record_recommendation(summary.as_ref());
        let headline = match summary {
            Some(summary) => {
                info!(
                    event_name = "advisor.recommendation_sent",
                    session_id = %turn.user_id(),
                    correlation_id = %turn.correlation_id(),
                    vendor = %summary.vendor,
                    plan = %summary.plan_name,
                    "recommendation sent"
                );
                self.messages.recommendation(&summary)?
            }
            None => {
                info!(
                    event_name = "advisor.no_plan",
                    session_id = %turn.user_id(),
                    correlation_id = %turn.correlation_id(),
                    "no eligible plan"
                );
                self.messages.no_plan()?
            }
        };
        Ok(vec![headline, self.messages.restart_hint()?])
    }
}

fn user_id(raw: &str) -> Result<UserId, EventHandlerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(EventHandlerError::InvalidEnvelope("event carries no user id".to_owned()));
    }
    Ok(UserId::new(raw))
}

#[async_trait]
impl ConversationService for AdvisorService {
    async fn on_message(
        &self,
        user: &str,
        text: &str,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, EventHandlerError> {
        Ok(self.handle_text_in(&user_id(user)?, text, ctx)?)
    }

    async fn on_button(
        &self,
        user: &str,
        action_id: &str,
        value: Option<&str>,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, EventHandlerError> {
        Ok(self.handle_button_in(&user_id(user)?, action_id, value, ctx)?)
    }

    async fn on_command(
        &self,
        user: &str,
        command: &ChatCommand,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, EventHandlerError> {
        Ok(self.handle_command_in(&user_id(user)?, command, ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use voltwiz_core::config::Locale;
    use voltwiz_core::{Catalog, ConversationEngine, ConversationState, UserId};

    use super::AdvisorService;
    use crate::blocks::{MessageTemplate, RESTART_ACTION_ID};
    use crate::commands::{ChatCommand, RestartKeywords};
    use crate::messages::MessageCatalog;

    fn advisor(locale: Locale) -> AdvisorService {
        AdvisorService::new(
            ConversationEngine::default(),
            Arc::new(Catalog::embedded().expect("embedded catalog")),
            MessageCatalog::new(locale).expect("messages"),
        )
    }

    fn texts(replies: &[MessageTemplate]) -> Vec<&str> {
        replies.iter().map(|reply| reply.fallback_text.as_str()).collect()
    }

    fn say(advisor: &AdvisorService, user: &UserId, text: &str) -> Vec<MessageTemplate> {
        advisor.handle_text(user, text).expect("turn")
    }

    #[test]
    fn restart_keyword_welcomes_and_asks_first_question() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("+15550001");

        let replies = say(&advisor, &user, "hi");

        let texts = texts(&replies);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("Welcome"));
        assert!(texts[1].contains("smart meter"));
        assert_eq!(advisor.conversations().state(&user).expect("state"), ConversationState::AskingSmartMeter);
    }

    #[test]
    fn first_message_from_unknown_user_starts_the_conversation() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("u-new");

        let replies = say(&advisor, &user, "yes");

        assert!(texts(&replies)[0].contains("Welcome"));
        assert_eq!(advisor.conversations().state(&user).expect("state"), ConversationState::AskingSmartMeter);
    }

    #[test]
    fn max_discount_conversation_ends_with_recommendation_and_hint() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("u1");
        say(&advisor, &user, "start");

        assert!(texts(&say(&advisor, &user, "yes"))[0].contains("important"));
        assert!(texts(&say(&advisor, &user, "1"))[0].contains("minimum acceptable discount"));
        let replies = say(&advisor, &user, "none");

        let texts = texts(&replies);
        assert!(texts[0].contains("Recommended Provider: Amisragaz - Night Saver"));
        assert_eq!(texts[1], "To start over, just send 'hi' or 'start'.");
        assert!(advisor.conversations().is_complete(&user).expect("complete"));
    }

    #[test]
    fn time_specific_conversation_collects_window() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("u2");
        say(&advisor, &user, "hello");
        say(&advisor, &user, "no");
        assert!(texts(&say(&advisor, &user, "2"))[0].contains("start"));
        assert!(texts(&say(&advisor, &user, "18"))[0].contains("end"));
        say(&advisor, &user, "22");
        let replies = say(&advisor, &user, "0");

        assert!(texts(&replies)[0].contains("Recommended Provider: Basic Power - Evening Basic"));
    }

    #[test]
    fn invalid_answer_gets_corrective_prompt_and_same_question() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("u3");
        say(&advisor, &user, "hi");

        let replies = say(&advisor, &user, "maybe");

        let texts = texts(&replies);
        assert!(texts[0].contains("Please answer 'yes' or 'no'"));
        assert!(texts[1].contains("smart meter"));
        assert_eq!(advisor.conversations().state(&user).expect("state"), ConversationState::AskingSmartMeter);
    }

    #[test]
    fn unreachable_minimum_yields_no_plan_message() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("u4");
        for text in ["hi", "yes", "1"] {
            say(&advisor, &user, text);
        }

        let replies = say(&advisor, &user, "50");

        assert!(texts(&replies)[0].contains("couldn't find any suitable providers"));
    }

    #[test]
    fn completed_session_replies_with_start_over_hint() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("u5");
        for text in ["hi", "yes", "1", ""] {
            say(&advisor, &user, text);
        }

        let replies = say(&advisor, &user, "thanks");

        assert!(texts(&replies)[0].contains("To start over"));
    }

    #[test]
    fn hebrew_conversation_accepts_localized_yes() {
        let advisor = advisor(Locale::He);
        let user = UserId::from("tg-1");
        let replies = say(&advisor, &user, "/start");
        assert!(texts(&replies)[0].contains("VoltWiz"));

        let replies = say(&advisor, &user, "כן");

        assert!(texts(&replies)[0].contains("מה הכי חשוב לכם"));
        assert_eq!(advisor.conversations().state(&user).expect("state"), ConversationState::AskingPriority);
    }

    #[test]
    fn reset_and_help_commands() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("u6");
        say(&advisor, &user, "hi");
        say(&advisor, &user, "yes");

        let replies = advisor.handle_command(&user, &ChatCommand::Reset).expect("reset");
        assert!(texts(&replies)[0].contains("reset"));
        assert_eq!(advisor.conversations().state(&user).expect("state"), ConversationState::AskingSmartMeter);

        let replies = say(&advisor, &user, "/help");
        assert!(texts(&replies)[0].contains("/reset"));
        assert_eq!(advisor.conversations().state(&user).expect("state"), ConversationState::AskingSmartMeter);
    }

    #[test]
    fn buttons_answer_and_restart() {
        let advisor = advisor(Locale::En);
        let user = UserId::from("u7");
        let first = say(&advisor, &user, "hi");
        let yes = first[1].buttons().next().expect("yes button");

        let replies = advisor
            .handle_button(&user, &yes.action_id, yes.value.as_deref())
            .expect("button answer");
        assert!(texts(&replies)[0].contains("important"));

        let replies = advisor.handle_button(&user, RESTART_ACTION_ID, None).expect("restart");
        assert!(texts(&replies)[0].contains("Welcome"));
        assert!(advisor.handle_button(&user, "other.v1", None).expect("ignored").is_empty());
    }

    #[test]
    fn custom_restart_keywords_replace_defaults() {
        let advisor = advisor(Locale::En).with_restart_keywords(RestartKeywords::new(["go"]));
        let user = UserId::from("u8");
        say(&advisor, &user, "go");
        say(&advisor, &user, "yes");

        let replies = say(&advisor, &user, "hi");

        assert!(texts(&replies)[0].contains("Please enter either 1"));
    }
}
