use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::models::{ProposeRequest, ProposeResponse};
use crate::state::AppState;

/// Always 200; failures are reported through the `status` field.
pub async fn propose(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProposeRequest>, JsonRejection>,
) -> Json<ProposeResponse> {
    let prompt = match payload {
        Ok(Json(req)) => req.prompt,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "malformed propose request");
            return Json(ProposeResponse::Error {
                message: rejection.body_text(),
            });
        }
    };

    match state.proposals.propose(&prompt, state.config.slot_count) {
        Ok(result) => Json(ProposeResponse::Ok(result)),
        Err(e) => {
            tracing::error!(error = %e, "propose failed");
            Json(ProposeResponse::Error {
                message: e.to_string(),
            })
        }
    }
}
