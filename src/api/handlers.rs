//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::state::AppState;
use super::responses::{ApiResponse, HealthResponse, SetTimeRequest, StatusResponse};

/// Handle POST /set - Configure the duration and stop any alert
pub async fn set_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetTimeRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.configure(request.minutes) {
        Ok(view) => {
            info!("Set endpoint called - duration {} minutes", view.configured_minutes);
            let message = format!("Timer set to {} minutes", view.configured_minutes);
            Ok(Json(ApiResponse::new(message, view)))
        }
        Err(e) => {
            error!("Failed to configure timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /toggle - Start or pause the countdown
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    match state.toggle_run() {
        Ok(view) => {
            let message = if view.ringing {
                "Timer is ringing; reset or set a new time".to_string()
            } else if view.running {
                "Timer started".to_string()
            } else {
                "Timer paused".to_string()
            };
            Ok(Json(ApiResponse::new(message, view)))
        }
        Err(e) => {
            error!("Failed to toggle timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /reset - Restore the configured duration and stop any alert
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reset() {
        Ok(view) => {
            info!("Reset endpoint called - back to {}", view.display);
            Ok(Json(ApiResponse::new("Timer reset".to_string(), view)))
        }
        Err(e) => {
            error!("Failed to reset timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return the current clock and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.get_view() {
        Ok(view) => view,
        Err(e) => {
            error!("Failed to get timer view: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
