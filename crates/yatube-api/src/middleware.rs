use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Uri, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::warn;

use yatube_types::api::Claims;

use crate::pages::redirect;
use crate::state::{AppState, with_db};

/// Where unauthenticated visitors are sent.
pub const LOGIN_URL: &str = "/auth/login/";

/// Extract and validate the JWT from the Authorization header.
pub fn decode_claims(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// Characters escaped in the `next` parameter. Slashes stay readable.
const NEXT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The login page, with `next` pointing back at the full requested path.
pub fn login_redirect(uri: &Uri) -> Response {
    let full_path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    redirect(&format!(
        "{}?next={}",
        LOGIN_URL,
        utf8_percent_encode(full_path, NEXT_SET)
    ))
}

/// Lets the request through with its `Claims` attached, or redirects to the
/// login page. A token whose user no longer exists counts as no token.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(claims) = decode_claims(req.headers(), &state.jwt_secret) else {
        return login_redirect(req.uri());
    };

    let user_id = claims.sub.to_string();
    match with_db(&state, move |db| db.get_user_by_id(&user_id)).await {
        Ok(Some(_)) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Ok(None) => {
            warn!("Token for deleted user {} ({})", claims.username, claims.sub);
            login_redirect(req.uri())
        }
        Err(e) => e.into_response(),
    }
}

/// The requester's claims on pages that guests may also see.
#[derive(Debug, Clone)]
pub struct MaybeClaims(pub Option<Claims>);

impl FromRequestParts<AppState> for MaybeClaims {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeClaims(decode_claims(&parts.headers, &state.jwt_secret)))
    }
}
