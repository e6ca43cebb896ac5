use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::info;

use yatube_db::models::PostRow;
use yatube_types::api::{BoundForm, Claims, CommentsPage};

use crate::error::ApiError;
use crate::forms::CommentSubmission;
use crate::pages::{post_url, redirect};
use crate::posts::find_post;
use crate::render;
use crate::state::{AppState, with_db};

async fn comments_page(
    state: &AppState,
    row: PostRow,
    form: BoundForm,
) -> Result<CommentsPage, ApiError> {
    let post_id = row.id;
    let comments = with_db(state, move |db| db.list_comments(post_id)).await?;
    Ok(CommentsPage {
        post: render::post(row),
        comments: comments.into_iter().map(render::comment).collect(),
        form,
    })
}

pub async fn add_comment_form(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Json<CommentsPage>, ApiError> {
    let row = find_post(&state, &username, &post_id).await?;
    Ok(Json(comments_page(&state, row, BoundForm::default()).await?))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((username, post_id)): Path<(String, String)>,
    Form(submission): Form<CommentSubmission>,
) -> Result<Response, ApiError> {
    let row = find_post(&state, &username, &post_id).await?;

    let text = match submission.clean() {
        Ok(text) => text,
        Err(form) => return Ok(Json(comments_page(&state, row, form).await?).into_response()),
    };

    let (id, author_id) = (row.id, claims.sub.to_string());
    let comment_id = with_db(&state, move |db| db.create_comment(id, &author_id, &text)).await?;
    info!("Comment {} on post {} by {}", comment_id, id, claims.username);

    Ok(redirect(&post_url(&username, id)))
}
