//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::{
    controller::{Controller, DONE_ALARM},
    messages::Message,
    panel::PanelView,
};
use super::responses::{ApiResponse, HealthResponse, StatusResponse};

/// Handle POST /message - Deliver an inter-context message to the daemon
pub async fn message_handler(
    State(controller): State<Arc<Controller>>,
    Json(message): Json<Message>,
) -> (StatusCode, Json<ApiResponse>) {
    info!("Received {} message", message.kind());
    match controller.handle_message(message).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::accepted(format!("{} handled", message.kind()))),
        ),
        Err(e) if e.is_rejection() => {
            warn!("Rejected {} message: {}", message.kind(), e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::rejected(e.to_string())),
            )
        }
        Err(e) => {
            error!("Failed to handle {} message: {}", message.kind(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::rejected(e.to_string())),
            )
        }
    }
}

/// Handle GET /events - Stream daemon pushes to a listening panel
pub async fn events_handler(
    State(controller): State<Arc<Controller>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Panel subscribed to pushes");
    let rx = controller.state.events.subscribe();

    let pushes = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let data = serde_json::to_string(&message).unwrap_or_default();
                    let event = Event::default().event(message.kind()).data(data);
                    return Some((Ok(event), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Panel stream skipped {} pushes", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(pushes).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Return the record and what it means right now
pub async fn status_handler(
    State(controller): State<Arc<Controller>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let state = &controller.state;
    let record = match state.record() {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to read timer record: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        record,
        view: PanelView::derive(record.state(), state.now()),
        badge: state.badge.text(),
        alarm: controller.alarm(DONE_ALARM),
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
