use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{about, auth, cache, comments, follows, pages, posts};

/// Every page of the site. Static segments win over `{username}`, so a user
/// named like a static page ("new", "follow", "group") has no reachable profile.
pub fn router(state: AppState) -> Router {
    let index = get(posts::index).layer(middleware::from_fn_with_state(
        state.clone(),
        cache::cache_page,
    ));

    let public_routes = Router::new()
        .route("/", index)
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/login/", get(auth::login_page).post(auth::login))
        .route("/about/author/", get(about::author))
        .route("/about/tech/", get(about::tech))
        .route("/{username}/", get(posts::profile))
        .route("/{username}/{post_id}/", get(posts::post_view));

    let protected_routes = Router::new()
        .route("/new/", get(posts::new_post_form).post(posts::new_post))
        .route("/follow/", get(follows::follow_index))
        .route(
            "/{username}/{post_id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route(
            "/{username}/{post_id}/comment/",
            get(comments::add_comment_form).post(comments::add_comment),
        )
        .route("/{username}/follow/", get(follows::profile_follow))
        .route("/{username}/unfollow/", get(follows::profile_unfollow))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/media", ServeDir::new(state.media.root()))
        .fallback(pages::not_found)
        .layer(middleware::from_fn(pages::page_not_found))
        .layer(CatchPanicLayer::custom(pages::server_error))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
