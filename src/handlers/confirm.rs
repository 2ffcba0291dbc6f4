use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::errors::AppError;
use crate::models::{CalendarEvent, ConfirmRequest, ConfirmResponse, CreatedEvent, Meeting};
use crate::state::AppState;

pub async fn confirm(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "malformed confirm request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ConfirmResponse::Error {
                    message: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    tracing::info!(summary = %req.event.summary, start = %req.event.start, "confirm event");

    let mut event = req.event;
    if event.timezone.is_none() {
        event.timezone = Some(state.config.timezone.name().to_string());
    }

    match state
        .calendar
        .create_event(&event, req.token_dict.as_ref())
        .await
    {
        Ok(created) => {
            tracing::info!(event_id = %created.id, "event created");
            record_meeting(&state, &event, &created);
            Json(ConfirmResponse::Ok { created }).into_response()
        }
        Err(e) => {
            match &e {
                AppError::Config(_) => tracing::error!(error = %e, "invalid calendar credentials"),
                _ => tracing::error!(error = %e, "failed to create event"),
            }
            e.into_response()
        }
    }
}

/// The event already exists at the provider, so a storage failure is only logged.
fn record_meeting(state: &AppState, event: &CalendarEvent, created: &CreatedEvent) {
    let meeting = Meeting {
        id: uuid::Uuid::new_v4().to_string(),
        event_id: created.id.clone(),
        summary: event.summary.clone(),
        start: event.start,
        end: event.end,
        timezone: event.timezone.clone().unwrap_or_default(),
        created_at: Utc::now().naive_utc(),
    };

    if let Err(e) = state.repository.save_meeting(&meeting) {
        tracing::error!(error = %e, event_id = %created.id, "failed to record meeting");
    }
}
