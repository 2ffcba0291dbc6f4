use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Could not parse a date from the request.")]
    NoDateResolved,

    #[error("Invalid OAuth config: {0}")]
    Config(String),

    #[error("Google API error: {0}")]
    Gateway(String),

    #[error("{0}")]
    Transport(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoDateResolved => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::BAD_REQUEST,
            AppError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "status": "error", "message": self.to_string() });
        (self.status_code(), axum::Json(body)).into_response()
    }
}
