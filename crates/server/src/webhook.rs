//! Inbound chat endpoints: an SMS-gateway webhook answering with TwiML-style
//! XML, and a JSON endpoint returning structured reply templates.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;
use voltwiz_chat::events::{DispatchError, EventHandlerError, MessageEvent};
use voltwiz_chat::{AdvisorService, ChatEnvelope, ChatEvent, EventContext, EventDispatcher, MessageTemplate};
use voltwiz_core::errors::{ApplicationError, InterfaceError};

pub const SECRET_HEADER: &str = "x-voltwiz-secret";

#[derive(Clone)]
pub struct WebhookState {
    dispatcher: Arc<EventDispatcher>,
    advisor: Arc<AdvisorService>,
    shared_secret: Option<Arc<SecretString>>,
}

impl WebhookState {
    pub fn new(
        dispatcher: Arc<EventDispatcher>,
        advisor: Arc<AdvisorService>,
        shared_secret: Option<SecretString>,
    ) -> Self {
        Self { dispatcher, advisor, shared_secret: shared_secret.map(Arc::new) }
    }

    fn authorize(&self, headers: &HeaderMap, correlation_id: &str) -> Result<(), InterfaceError> {
        let Some(expected) = &self.shared_secret else {
            return Ok(());
        };
        let provided = headers.get(SECRET_HEADER).and_then(|value| value.to_str().ok());
        if provided == Some(expected.expose_secret()) {
            return Ok(());
        }
        warn!(
            event_name = "webhook.unauthorized",
            correlation_id,
            header_present = provided.is_some(),
            "rejected webhook request without a valid shared secret"
        );
        Err(InterfaceError::Unauthorized {
            message: format!("missing or invalid `{SECRET_HEADER}` header"),
            correlation_id: correlation_id.to_owned(),
        })
    }
}

/// SMS gateway form fields.
#[derive(Clone, Debug, Deserialize)]
pub struct SmsForm {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiMessageRequest {
    pub user_id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiMessageResponse {
    pub correlation_id: String,
    pub replies: Vec<MessageTemplate>,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody<'a> {
    error: &'a str,
    detail: String,
    correlation_id: &'a str,
}

/// `InterfaceError` rendered as a JSON HTTP response.
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ApiErrorBody {
            error: self.0.user_message(),
            detail: self.0.to_string(),
            correlation_id: self.0.correlation_id(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", post(sms_webhook))
        .route("/api/messages", post(api_messages))
        .with_state(state)
}

fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn interface_error(error: DispatchError, correlation_id: &str) -> InterfaceError {
    match error {
        DispatchError::Handler(EventHandlerError::InvalidEnvelope(message)) => {
            InterfaceError::BadRequest { message, correlation_id: correlation_id.to_owned() }
        }
        DispatchError::Handler(EventHandlerError::Advisor(error)) => {
            ApplicationError::from(error).into_interface(correlation_id)
        }
    }
}

async fn dispatch_message(
    state: &WebhookState,
    channel: &str,
    user_id: &str,
    text: &str,
    ctx: &EventContext,
) -> Result<Vec<MessageTemplate>, InterfaceError> {
    if user_id.trim().is_empty() {
        return Err(InterfaceError::BadRequest {
            message: "sender id is required".to_owned(),
            correlation_id: ctx.correlation_id.clone(),
        });
    }

    let envelope = ChatEnvelope {
        envelope_id: Uuid::new_v4().to_string(),
        channel: channel.to_owned(),
        event: ChatEvent::Message(MessageEvent {
            user_id: user_id.to_owned(),
            text: text.to_owned(),
        }),
    };
    let result = state.dispatcher.dispatch(&envelope, ctx).await.map_err(|error| {
        error!(
            event_name = "webhook.dispatch_failed",
            correlation_id = %ctx.correlation_id,
            channel,
            error = %error,
            "chat dispatch failed"
        );
        interface_error(error, &ctx.correlation_id)
    })?;
    let replies = result.into_replies();
    info!(
        event_name = "webhook.message_handled",
        correlation_id = %ctx.correlation_id,
        channel,
        replies = replies.len(),
        "inbound message handled"
    );
    Ok(replies)
}

async fn sms_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Form(form): Form<SmsForm>,
) -> Response {
    let ctx = EventContext::generated();
    if let Err(error) = state.authorize(&headers, &ctx.correlation_id) {
        return (status_for(&error), error.user_message()).into_response();
    }

    let texts = match dispatch_message(&state, "sms", &form.from, &form.body, &ctx).await {
        Ok(replies) => replies.into_iter().map(|reply| reply.fallback_text).collect(),
        Err(error @ InterfaceError::BadRequest { .. }) => {
            return (status_for(&error), error.user_message()).into_response();
        }
        Err(_) => {
            // The sender still gets a reply; the failure is already logged.
            let text = state
                .advisor
                .messages()
                .error(&ctx.correlation_id)
                .map(|message| message.fallback_text)
                .unwrap_or_else(|_| "Sorry, something went wrong.".to_owned());
            vec![text]
        }
    };

    ([(header::CONTENT_TYPE, "application/xml")], messaging_response(&texts)).into_response()
}

async fn api_messages(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(request): Json<ApiMessageRequest>,
) -> Result<Json<ApiMessageResponse>, ApiError> {
    let ctx = EventContext::generated();
    state.authorize(&headers, &ctx.correlation_id).map_err(ApiError)?;

    let replies = dispatch_message(&state, "api", &request.user_id, &request.text, &ctx)
        .await
        .map_err(ApiError)?;
    Ok(Json(ApiMessageResponse { correlation_id: ctx.correlation_id, replies }))
}

/// `<Response>` document with one `<Message>` per reply.
pub fn messaging_response(texts: &[String]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
    for text in texts {
        xml.push_str("<Message>");
        xml.push_str(&escape_xml(text));
        xml.push_str("</Message>");
    }
    xml.push_str("</Response>");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
