mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;

use common::{PAGE_SIZE, TestApp, body_bytes, body_json};
use yatube_types::api::{AboutPage, ErrorPage, GroupPage, IndexPage, PostPage, ProfilePage};

#[tokio::test]
async fn public_pages_are_available_to_guests() {
    let app = TestApp::new();
    let author = app.user("LionUser");
    let group = app.group("Lion", "lion");
    let post = app.post(&author, "Some text about lions", Some(group));

    for url in [
        "/".to_string(),
        "/group/lion/".to_string(),
        "/LionUser/".to_string(),
        format!("/LionUser/{}/", post),
        "/about/author/".to_string(),
        "/about/tech/".to_string(),
    ] {
        let response = app.get(&url, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", url);
    }
}

#[tokio::test]
async fn index_lists_post_with_author_and_group() {
    let app = TestApp::new();
    let author = app.user("LionUser");
    let group = app.group("Lion", "lion");
    app.post(&author, "Some text about lions", Some(group));

    let page: IndexPage = body_json(app.get("/", None).await).await;
    let first = &page.page.object_list[0];
    assert_eq!(first.text, "Some text about lions");
    assert_eq!(first.author, "LionUser");
    assert_eq!(first.group.as_ref().unwrap().slug, "lion");
    assert_eq!(page.page.count, 1);
}

#[tokio::test]
async fn feeds_paginate_with_remainder_on_last_page() {
    let spare = 2;
    for url in ["/", "/group/lion/", "/LionUser/"] {
        let app = TestApp::new();
        let author = app.user("LionUser");
        let group = app.group("Lion", "lion");
        for i in 0..PAGE_SIZE + spare {
            app.post(&author, &format!("post {}", i), Some(group));
        }

        let first: Value = body_json(app.get(url, None).await).await;
        assert_eq!(
            first["page"]["object_list"].as_array().unwrap().len(),
            PAGE_SIZE,
            "{}",
            url
        );
        assert_eq!(first["page"]["has_next"], true);

        let second: Value = body_json(app.get(&format!("{}?page=2", url), None).await).await;
        assert_eq!(
            second["page"]["object_list"].as_array().unwrap().len(),
            spare,
            "{}",
            url
        );

        // Beyond range clamps to the last page.
        let beyond: Value = body_json(app.get(&format!("{}?page=99", url), None).await).await;
        assert_eq!(beyond["page"]["number"], 2);
        assert_eq!(beyond["page"]["object_list"].as_array().unwrap().len(), spare);
    }
}

#[tokio::test]
async fn repeated_page_parameter_uses_last_value() {
    let app = TestApp::new();
    let author = app.user("LionUser");
    let group = app.group("Lion", "lion");
    for i in 0..PAGE_SIZE + 2 {
        app.post(&author, &format!("post {}", i), Some(group));
    }

    for url in ["/?page=1&page=2", "/group/lion/?page=1&page=2", "/LionUser/?page=1&page=2"] {
        let response = app.get(url, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", url);
        let page: Value = body_json(response).await;
        assert_eq!(page["page"]["number"], 2, "{}", url);
    }

    let response = app.get("/group/missing/?page=1&page=2", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn first_page_holds_newest_posts() {
    let app = TestApp::new();
    let author = app.user("LionUser");
    for i in 0..PAGE_SIZE + 1 {
        app.post(&author, &format!("post {}", i), None);
    }

    let page: ProfilePage = body_json(app.get("/LionUser/", None).await).await;
    assert_eq!(page.page.object_list[0].text, format!("post {}", PAGE_SIZE));
    assert_eq!(page.author.posts_count, (PAGE_SIZE + 1) as i64);
    assert!(!page.following);

    let last: ProfilePage = body_json(app.get("/LionUser/?page=2", None).await).await;
    assert_eq!(last.page.object_list[0].text, "post 0");
}

#[tokio::test]
async fn group_feed_only_shows_group_posts() {
    let app = TestApp::new();
    let author = app.user("LionUser");
    let lions = app.group("Lion", "lion");
    let tigers = app.group("Tiger", "tiger");
    app.post(&author, "lion post", Some(lions));
    app.post(&author, "tiger post", Some(tigers));
    app.post(&author, "no group", None);

    let page: GroupPage = body_json(app.get("/group/tiger/", None).await).await;
    assert_eq!(page.group.title, "Tiger");
    let texts: Vec<&str> = page.page.object_list.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["tiger post"]);
}

#[tokio::test]
async fn post_view_shows_post_author_and_comments() {
    let app = TestApp::new();
    let author = app.user("LionUser");
    let reader = app.user("Reader");
    let post = app.post(&author, "Some text about lions", None);
    app.state.db.create_comment(post, &reader.id, "first").unwrap();
    app.state.db.create_comment(post, &reader.id, "second").unwrap();

    let page: PostPage = body_json(app.get(&format!("/LionUser/{}/", post), None).await).await;
    assert_eq!(page.post.id, post);
    assert_eq!(page.post.comments_count, 2);
    assert_eq!(page.author.username, "LionUser");
    assert_eq!(page.author.posts_count, 1);
    let comments: Vec<&str> = page.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(comments, vec!["second", "first"]);
    assert!(page.form.is_valid());
}

#[tokio::test]
async fn missing_entities_are_not_found() {
    let app = TestApp::new();
    let author = app.user("LionUser");
    app.user("Other");
    let post = app.post(&author, "text", None);

    for url in [
        "/group/missing/".to_string(),
        "/nobody/".to_string(),
        format!("/LionUser/{}/", post + 1),
        format!("/Other/{}/", post),
        "/LionUser/abc/".to_string(),
        "/unexisting/page/at/all/".to_string(),
    ] {
        let response = app.get(&url, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", url);
        let page: ErrorPage = body_json(response).await;
        assert_eq!(page.error, "not_found");
        assert_eq!(page.path.as_deref(), Some(url.as_str()));
    }
}

#[tokio::test]
async fn index_is_cached_across_writes() {
    let app = TestApp::new();
    let author = app.user("LionUser");
    app.post(&author, "Test cache post", None);

    let before = body_bytes(app.get("/", None).await).await;
    app.post(&author, "Test cache post 2", None);
    let after = body_bytes(app.get("/", None).await).await;

    assert_eq!(before, after);

    // Other feeds are not cached.
    let profile: ProfilePage = body_json(app.get("/LionUser/", None).await).await;
    assert_eq!(profile.page.count, 2);
}

#[tokio::test]
async fn index_cache_expires() {
    let app = TestApp::with_cache_ttl(Duration::from_millis(100));
    let author = app.user("LionUser");
    app.post(&author, "Test cache post", None);

    let before: IndexPage = body_json(app.get("/", None).await).await;
    app.post(&author, "Test cache post 2", None);
    tokio::time::sleep(Duration::from_millis(400)).await;
    let after: IndexPage = body_json(app.get("/", None).await).await;

    assert_eq!(before.page.count, 1);
    assert_eq!(after.page.count, 2);
}

#[tokio::test]
async fn uploaded_images_are_served_from_media() {
    let app = TestApp::new();
    let author = app.user("LionUser");

    let response = app
        .post_multipart(
            "/new/",
            Some(&author),
            &[("text", "with picture")],
            Some(common::SMALL_GIF),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let page: ProfilePage = body_json(app.get("/LionUser/", None).await).await;
    let url = page.page.object_list[0].image.clone().unwrap();
    assert!(url.starts_with("/media/posts/"));

    let image = app.get(&url, None).await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(body_bytes(image).await, common::SMALL_GIF);
}

#[tokio::test]
async fn about_pages_have_titles() {
    let app = TestApp::new();
    for url in ["/about/author/", "/about/tech/"] {
        let page: AboutPage = body_json(app.get(url, None).await).await;
        assert!(!page.title.is_empty());
    }
}
