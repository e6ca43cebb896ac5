use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use yatube_types::api::ErrorPage;

/// Failures a handler can end with. Anything unexpected is `Internal` and is
/// logged but never shown to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound => "not_found".to_string(),
            ApiError::Unauthorized => "unauthorized".to_string(),
            ApiError::Conflict(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "server_error".to_string()
            }
        };

        (
            status,
            Json(ErrorPage {
                error: message,
                path: None,
            }),
        )
            .into_response()
    }
}
