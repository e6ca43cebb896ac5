use axum::{
    Extension, Json,
    extract::{Path, State},
    response::Response,
};
use tracing::{debug, info};

use yatube_db::PostFilter;
use yatube_types::api::{Claims, FollowPage};

use crate::error::ApiError;
use crate::pages::{profile_url, redirect};
use crate::pagination::PageQuery;
use crate::posts::load_feed;
use crate::state::{AppState, with_db};

/// Posts by every author the requester follows.
pub async fn follow_index(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: PageQuery,
) -> Result<Json<FollowPage>, ApiError> {
    let filter = PostFilter::FollowedBy(claims.sub.to_string());
    let page = load_feed(&state, filter, query.page).await?;
    Ok(Json(FollowPage { page }))
}

async fn author_id(state: &AppState, username: String) -> Result<String, ApiError> {
    let user = with_db(state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(user.id)
}

/// Following twice, or following oneself, changes nothing.
pub async fn profile_follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    let author_id = author_id(&state, username.clone()).await?;
    let user_id = claims.sub.to_string();

    if author_id == user_id {
        debug!("{} tried to follow themselves", claims.username);
    } else if with_db(&state, move |db| db.follow(&user_id, &author_id)).await? {
        info!("{} now follows {}", claims.username, username);
    }

    Ok(redirect(&profile_url(&username)))
}

/// Unfollowing an author one does not follow changes nothing.
pub async fn profile_unfollow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    let author_id = author_id(&state, username.clone()).await?;
    let user_id = claims.sub.to_string();

    if with_db(&state, move |db| db.unfollow(&user_id, &author_id)).await? {
        info!("{} unfollowed {}", claims.username, username);
    }

    Ok(redirect(&profile_url(&username)))
}
