//! Redirects and the 404 / 500 pages.

use std::any::Any;

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use yatube_types::api::ErrorPage;

use crate::error::ApiError;

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn post_url(username: &str, post_id: i64) -> String {
    format!("/{}/{}/", username, post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/{}/", username)
}

/// Router fallback for paths no route matches.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Rewrites every 404, whichever layer produced it, into the not-found page
/// naming the requested path.
pub async fn page_not_found(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    if response.status() != StatusCode::NOT_FOUND {
        return response;
    }

    (
        StatusCode::NOT_FOUND,
        Json(ErrorPage {
            error: "not_found".to_string(),
            path: Some(path),
        }),
    )
        .into_response()
}

/// Response for a handler that panicked.
pub fn server_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorPage {
            error: "server_error".to_string(),
            path: None,
        }),
    )
        .into_response()
}
