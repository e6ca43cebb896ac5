use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use yatube_db::PostFilter;
use yatube_db::models::PostRow;
use yatube_types::api::{
    BoundForm, Claims, GroupPage, IndexPage, Page, PostFormPage, PostPage, ProfilePage,
};
use yatube_types::models::{Group, Post};

use crate::error::ApiError;
use crate::forms::{self, CleanPost, ImageChange, PostSubmission};
use crate::middleware::MaybeClaims;
use crate::pages::{post_url, redirect};
use crate::pagination::{PageQuery, Paginator};
use crate::render;
use crate::state::{AppState, with_db};

/// One page of the posts matching `filter`, newest first.
pub(crate) async fn load_feed(
    state: &AppState,
    filter: PostFilter,
    raw_page: Option<String>,
) -> Result<Page<Post>, ApiError> {
    let per_page = state.page_size;
    let (window, rows) = with_db(state, move |db| {
        let count = db.count_posts(&filter)?;
        let window = Paginator::new(count, per_page).get_page(raw_page.as_deref());
        let rows = db.list_posts(&filter, window.limit, window.offset)?;
        Ok((window, rows))
    })
    .await?;

    Ok(window.into_page(rows.into_iter().map(render::post).collect()))
}

/// The post with `raw_id` if `username` is its author; anything else is a 404.
pub(crate) async fn find_post(
    state: &AppState,
    username: &str,
    raw_id: &str,
) -> Result<PostRow, ApiError> {
    let post_id: i64 = raw_id.parse().map_err(|_| ApiError::NotFound)?;
    let row = with_db(state, move |db| db.get_post(post_id))
        .await?
        .ok_or(ApiError::NotFound)?;

    if row.author_username != username {
        return Err(ApiError::NotFound);
    }
    Ok(row)
}

async fn load_groups(state: &AppState) -> Result<Vec<Group>, ApiError> {
    let rows = with_db(state, |db| db.list_groups()).await?;
    Ok(rows.into_iter().map(render::group).collect())
}

pub async fn index(
    State(state): State<AppState>,
    query: PageQuery,
) -> Result<Json<IndexPage>, ApiError> {
    let page = load_feed(&state, PostFilter::All, query.page).await?;
    Ok(Json(IndexPage { page }))
}

pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: PageQuery,
) -> Result<Json<GroupPage>, ApiError> {
    let group = with_db(&state, move |db| db.get_group_by_slug(&slug))
        .await?
        .ok_or(ApiError::NotFound)?;

    let page = load_feed(&state, PostFilter::Group(group.id), query.page).await?;
    Ok(Json(GroupPage {
        group: render::group(group),
        page,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    query: PageQuery,
    MaybeClaims(claims): MaybeClaims,
) -> Result<Json<ProfilePage>, ApiError> {
    let viewer = claims.map(|c| c.sub.to_string());
    let (user, stats, following) = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_username(&username)? else {
            return Ok(None);
        };
        let stats = db.get_author_stats(&user.id)?;
        let following = match viewer {
            Some(viewer) => db.is_following(&viewer, &user.id)?,
            None => false,
        };
        Ok(Some((user, stats, following)))
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    let page = load_feed(&state, PostFilter::Author(user.id), query.page).await?;
    Ok(Json(ProfilePage {
        author: render::author(user.username, stats),
        following,
        page,
    }))
}

pub async fn post_view(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Json<PostPage>, ApiError> {
    let row = find_post(&state, &username, &post_id).await?;

    let (id, author_id) = (row.id, row.author_id.clone());
    let (stats, comments) = with_db(&state, move |db| {
        Ok((db.get_author_stats(&author_id)?, db.list_comments(id)?))
    })
    .await?;

    Ok(Json(PostPage {
        author: render::author(row.author_username.clone(), stats),
        post: render::post(row),
        comments: comments.into_iter().map(render::comment).collect(),
        form: BoundForm::default(),
    }))
}

pub async fn new_post_form(State(state): State<AppState>) -> Result<Json<PostFormPage>, ApiError> {
    Ok(Json(PostFormPage {
        form: BoundForm::default(),
        is_new: true,
        post: None,
        groups: load_groups(&state).await?,
    }))
}

pub async fn new_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    submission: PostSubmission,
) -> Result<Response, ApiError> {
    let groups = load_groups(&state).await?;
    let CleanPost {
        text,
        group_id,
        image,
    } = match submission.clean(&groups) {
        Ok(clean) => clean,
        Err(form) => {
            return Ok(Json(PostFormPage {
                form,
                is_new: true,
                post: None,
                groups,
            })
            .into_response());
        }
    };

    let image = match image {
        ImageChange::Replace(image) => Some(state.media.save_post_image(&image).await?),
        ImageChange::Keep | ImageChange::Clear => None,
    };

    let author_id = claims.sub.to_string();
    let saved = image.clone();
    let post_id = match with_db(&state, move |db| {
        db.create_post(&author_id, &text, group_id, image.as_deref())
    })
    .await
    {
        Ok(id) => id,
        Err(e) => {
            if let Some(path) = saved {
                state.media.discard(&path).await;
            }
            return Err(e);
        }
    };
    info!("Post {} created by {}", post_id, claims.username);

    Ok(redirect("/"))
}

pub async fn post_edit_form(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let row = find_post(&state, &username, &post_id).await?;
    if row.author_id != claims.sub.to_string() {
        return Ok(redirect(&post_url(&username, row.id)));
    }

    let form = forms::post_initial(&row.text, row.group_id);
    Ok(Json(PostFormPage {
        form,
        is_new: false,
        post: Some(render::post(row)),
        groups: load_groups(&state).await?,
    })
    .into_response())
}

pub async fn post_edit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((username, post_id)): Path<(String, String)>,
    submission: PostSubmission,
) -> Result<Response, ApiError> {
    let row = find_post(&state, &username, &post_id).await?;
    let target = post_url(&username, row.id);
    if row.author_id != claims.sub.to_string() {
        warn!("{} tried to edit post {} of {}", claims.username, row.id, username);
        return Ok(redirect(&target));
    }

    let groups = load_groups(&state).await?;
    let CleanPost {
        text,
        group_id,
        image,
    } = match submission.clean(&groups) {
        Ok(clean) => clean,
        Err(form) => {
            return Ok(Json(PostFormPage {
                form,
                is_new: false,
                post: Some(render::post(row)),
                groups,
            })
            .into_response());
        }
    };

    let (image, uploaded) = match image {
        ImageChange::Keep => (row.image.clone(), None),
        ImageChange::Clear => (None, None),
        ImageChange::Replace(image) => {
            let path = state.media.save_post_image(&image).await?;
            (Some(path.clone()), Some(path))
        }
    };

    let id = row.id;
    if let Err(e) =
        with_db(&state, move |db| db.update_post(id, &text, group_id, image.as_deref())).await
    {
        if let Some(path) = uploaded {
            state.media.discard(&path).await;
        }
        return Err(e);
    }
    info!("Post {} edited by {}", id, claims.username);

    Ok(redirect(&target))
}
