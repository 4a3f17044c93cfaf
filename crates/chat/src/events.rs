use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    advisor::{AdvisorError, AdvisorService},
    blocks::MessageTemplate,
    commands::{command_from_name, ChatCommand},
};

/// One inbound event from a chat transport. `channel` names the transport
/// (`sms`, `api`, `cli`, ...) and is only used for logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    pub envelope_id: String,
    pub channel: String,
    pub event: ChatEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    Message(MessageEvent),
    ButtonPress(ButtonPressEvent),
    Command(CommandEvent),
    Unsupported { event_type: String },
}

impl ChatEvent {
    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::Message(_) => ChatEventType::Message,
            Self::ButtonPress(_) => ChatEventType::ButtonPress,
            Self::Command(_) => ChatEventType::Command,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    Message,
    ButtonPress,
    Command,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub user_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonPressEvent {
    pub user_id: String,
    pub action_id: String,
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEvent {
    pub user_id: String,
    pub command: String,
    pub args: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl EventContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }

    pub fn generated() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Vec<MessageTemplate>),
    Processed,
    Ignored,
}

impl HandlerResult {
    pub fn into_replies(self) -> Vec<MessageTemplate> {
        match self {
            Self::Responded(replies) => replies,
            Self::Processed | Self::Ignored => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Advisor(#[from] AdvisorError),
    #[error("invalid chat envelope: {0}")]
    InvalidEnvelope(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let event_type = envelope.event.event_type();
        let Some(handler) = self.handlers.get(&event_type) else {
            debug!(
                event_name = "chat.event_ignored",
                correlation_id = %ctx.correlation_id,
                channel = %envelope.channel,
                event_type = ?event_type,
                "no handler registered"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Dispatcher wired to one advisor for messages, button presses and commands.
pub fn advisor_dispatcher(advisor: Arc<AdvisorService>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(Arc::clone(&advisor)));
    dispatcher.register(ButtonPressHandler::new(Arc::clone(&advisor)));
    dispatcher.register(CommandHandler::new(advisor));
    dispatcher
}

/// What the handlers need from a conversation backend.
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn on_message(
        &self,
        user: &str,
        text: &str,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, EventHandlerError>;

    async fn on_button(
        &self,
        user: &str,
        action_id: &str,
        value: Option<&str>,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, EventHandlerError>;

    async fn on_command(
        &self,
        user: &str,
        command: &ChatCommand,
        ctx: &EventContext,
    ) -> Result<Vec<MessageTemplate>, EventHandlerError>;
}

fn responded(replies: Vec<MessageTemplate>) -> HandlerResult {
    if replies.is_empty() {
        HandlerResult::Processed
    } else {
        HandlerResult::Responded(replies)
    }
}

pub struct MessageHandler<S> {
    service: Arc<S>,
}

impl<S> MessageHandler<S>
where
    S: ConversationService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for MessageHandler<S>
where
    S: ConversationService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::Message
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let replies = self.service.on_message(&event.user_id, &event.text, ctx).await?;
        Ok(responded(replies))
    }
}

pub struct ButtonPressHandler<S> {
    service: Arc<S>,
}

impl<S> ButtonPressHandler<S>
where
    S: ConversationService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for ButtonPressHandler<S>
where
    S: ConversationService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::ButtonPress
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::ButtonPress(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let replies = self
            .service
            .on_button(&event.user_id, &event.action_id, event.value.as_deref(), ctx)
            .await?;
        Ok(responded(replies))
    }
}

pub struct CommandHandler<S> {
    service: Arc<S>,
}

impl<S> CommandHandler<S>
where
    S: ConversationService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for CommandHandler<S>
where
    S: ConversationService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::Command
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::Command(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let command = command_from_name(&event.command);
        let replies = self.service.on_command(&event.user_id, &command, ctx).await?;
        Ok(responded(replies))
    }
}
