//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use pulse_engine::{Action, ActionOutcome, ActionReport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::scheduler::ScheduleConfig;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub dry_run: bool,
    pub generator_enabled: bool,
    pub sentiment_degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub account: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
    pub ledger_size: usize,
    pub schedule: ScheduleConfig,
    pub last_outcomes: Vec<ActionOutcome>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        dry_run: state.dry_run,
        generator_enabled: state.agent.generator_enabled(),
        sentiment_degraded: state.agent.sentiment_degraded(),
    })
}

/// Ledger size and the last outcome of every action
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let now = Utc::now();
    Json(StatusResponse {
        account: state.agent.account().handle.clone(),
        started_at: state.started_at,
        uptime_secs: (now - state.started_at).num_seconds(),
        ledger_size: state.agent.ledger().len(),
        schedule: (*state.schedule).clone(),
        last_outcomes: state.agent.outcomes(),
    })
}

/// Run an action now, outside its schedule
pub async fn trigger_action(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionReport>, ApiError> {
    let action = Action::ALL
        .into_iter()
        .find(|a| a.as_str() == name)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Unknown action '{name}'"),
                    code: "UNKNOWN_ACTION".into(),
                }),
            )
        })?;

    tracing::info!(action = %action, "Manual trigger");
    let mut rng = StdRng::from_entropy();
    state.agent.run(action, &mut rng).await.map(Json).ok_or_else(|| {
        let error = state
            .agent
            .outcomes()
            .into_iter()
            .find(|o| o.action == action)
            .and_then(|o| o.error)
            .unwrap_or_else(|| "Action failed".into());
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error,
                code: "ACTION_FAILED".into(),
            }),
        )
    })
}
