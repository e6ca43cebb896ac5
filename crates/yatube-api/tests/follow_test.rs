mod common;

use axum::http::StatusCode;

use common::{TestApp, assert_redirect, body_json};
use yatube_types::api::{FollowPage, ProfilePage};

#[tokio::test]
async fn follow_feed_shows_only_followed_authors() {
    let app = TestApp::new();
    let follower = app.user("Follower");
    let bystander = app.user("Bystander");
    let author = app.user("LionUser");
    let other = app.user("TigerUser");
    app.post(&author, "from the followed author", None);
    app.post(&other, "from someone else", None);

    let response = app.get("/LionUser/follow/", Some(&follower)).await;
    assert_redirect(&response, "/LionUser/");

    let page: FollowPage = body_json(app.get("/follow/", Some(&follower)).await).await;
    let texts: Vec<&str> = page.page.object_list.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["from the followed author"]);

    let page: FollowPage = body_json(app.get("/follow/", Some(&bystander)).await).await;
    assert!(page.page.object_list.is_empty());
    assert_eq!(page.page.num_pages, 1);
}

#[tokio::test]
async fn follow_feed_requires_login() {
    let app = TestApp::new();
    app.user("LionUser");

    assert_redirect(
        &app.get("/follow/", None).await,
        "/auth/login/?next=/follow/",
    );
    assert_redirect(
        &app.get("/LionUser/follow/", None).await,
        "/auth/login/?next=/LionUser/follow/",
    );
}

#[tokio::test]
async fn login_redirect_keeps_the_requested_page() {
    let app = TestApp::new();

    assert_redirect(
        &app.get("/follow/?page=2", None).await,
        "/auth/login/?next=/follow/%3Fpage%3D2",
    );
}

#[tokio::test]
async fn following_twice_or_self_changes_nothing() {
    let app = TestApp::new();
    let follower = app.user("Follower");
    let author = app.user("LionUser");

    app.get("/LionUser/follow/", Some(&follower)).await;
    app.get("/LionUser/follow/", Some(&follower)).await;
    assert_redirect(
        &app.get("/LionUser/follow/", Some(&author)).await,
        "/LionUser/",
    );

    let stats = app.state.db.get_author_stats(&author.id).unwrap();
    assert_eq!(stats.followers, 1);
    assert!(!app.state.db.is_following(&author.id, &author.id).unwrap());
}

#[tokio::test]
async fn unfollow_removes_posts_from_feed() {
    let app = TestApp::new();
    let follower = app.user("Follower");
    let author = app.user("LionUser");
    app.post(&author, "lion post", None);

    app.get("/LionUser/follow/", Some(&follower)).await;
    let response = app.get("/LionUser/unfollow/", Some(&follower)).await;
    assert_redirect(&response, "/LionUser/");

    assert!(!app.state.db.is_following(&follower.id, &author.id).unwrap());
    let page: FollowPage = body_json(app.get("/follow/", Some(&follower)).await).await;
    assert_eq!(page.page.count, 0);

    // Unfollowing again is harmless.
    let response = app.get("/LionUser/unfollow/", Some(&follower)).await;
    assert_redirect(&response, "/LionUser/");
}

#[tokio::test]
async fn profile_reports_following_state() {
    let app = TestApp::new();
    let follower = app.user("Follower");
    app.user("LionUser");

    let page: ProfilePage = body_json(app.get("/LionUser/", Some(&follower)).await).await;
    assert!(!page.following);

    app.get("/LionUser/follow/", Some(&follower)).await;
    let page: ProfilePage = body_json(app.get("/LionUser/", Some(&follower)).await).await;
    assert!(page.following);
    assert_eq!(page.author.followers_count, 1);

    let page: ProfilePage = body_json(app.get("/LionUser/", None).await).await;
    assert!(!page.following);

    let me: ProfilePage = body_json(app.get("/Follower/", None).await).await;
    assert_eq!(me.author.following_count, 1);
}

#[tokio::test]
async fn following_unknown_author_is_not_found() {
    let app = TestApp::new();
    let follower = app.user("Follower");

    let response = app.get("/nobody/follow/", Some(&follower)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
