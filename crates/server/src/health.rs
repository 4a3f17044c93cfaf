use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use voltwiz_chat::AdvisorService;

#[derive(Clone)]
pub struct HealthState {
    advisor: Arc<AdvisorService>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub sessions: HealthCheck,
    pub plans: usize,
    pub active_sessions: usize,
    pub checked_at: String,
}

pub fn router(advisor: Arc<AdvisorService>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { advisor })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let plans = state.advisor.catalog().len();
    let catalog = HealthCheck {
        status: "ready",
        detail: format!(
            "{plans} plans loaded, mean discount {:.1}%",
            state.advisor.catalog().mean_discount_pct()
        ),
    };
    let (sessions, active_sessions) = match state.advisor.active_sessions() {
        Ok(count) => {
            (HealthCheck { status: "ready", detail: format!("{count} active sessions") }, count)
        }
        Err(error) => (
            HealthCheck { status: "degraded", detail: format!("session store check failed: {error}") },
            0,
        ),
    };
    let ready = sessions.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("voltwiz-server ({} messages)", state.advisor.messages().locale()),
        },
        catalog,
        sessions,
        plans,
        active_sessions,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
