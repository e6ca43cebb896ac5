#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use yatube_api::auth::create_token;
use yatube_api::cache::PageCache;
use yatube_api::media::MediaStore;
use yatube_api::{AppState, AppStateInner, router};
use yatube_db::Database;

pub const SECRET: &str = "test-secret";
pub const PAGE_SIZE: usize = 10;

pub const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

const BOUNDARY: &str = "yatube-test-boundary";

pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_cache_ttl(Duration::from_secs(1200))
    }

    pub fn with_cache_ttl(ttl: Duration) -> Self {
        let media = tempfile::tempdir().unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: SECRET.to_string(),
            page_size: PAGE_SIZE,
            media: MediaStore::new(media.path()),
            index_cache: PageCache::new(ttl),
        });
        let router = router(state.clone());
        Self {
            state,
            router,
            media,
        }
    }

    pub fn user(&self, username: &str) -> TestUser {
        let id = Uuid::new_v4();
        self.state
            .db
            .create_user(&id.to_string(), username, "unused-hash")
            .unwrap();
        TestUser {
            id: id.to_string(),
            username: username.to_string(),
            token: create_token(SECRET, id, username).unwrap(),
        }
    }

    pub fn group(&self, title: &str, slug: &str) -> i64 {
        self.state
            .db
            .create_group(title, slug, "Lions fans are here")
            .unwrap()
    }

    pub fn post(&self, author: &TestUser, text: &str, group: Option<i64>) -> i64 {
        self.state
            .db
            .create_post(&author.id, text, group, None)
            .unwrap()
    }

    /// Number of uploaded post images on disk.
    pub fn stored_images(&self) -> usize {
        std::fs::read_dir(self.media.path().join("posts"))
            .map(|dir| dir.count())
            .unwrap_or(0)
    }

    pub fn post_text(&self, id: i64) -> String {
        self.state.db.get_post(id).unwrap().unwrap().text
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str, user: Option<&TestUser>) -> Response<Body> {
        let req = authorized(Request::get(uri), user)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        user: Option<&TestUser>,
        body: &str,
    ) -> Response<Body> {
        let req = authorized(Request::post(uri), user)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        user: Option<&TestUser>,
        fields: &[(&str, &str)],
        image: Option<&[u8]>,
    ) -> Response<Body> {
        let req = authorized(Request::post(uri), user)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, image)))
            .unwrap();
        self.send(req).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }
}

fn authorized(
    builder: axum::http::request::Builder,
    user: Option<&TestUser>,
) -> axum::http::request::Builder {
    match user {
        Some(user) => builder.header(header::AUTHORIZATION, format!("Bearer {}", user.token)),
        None => builder,
    }
}

fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"small.gif\"\r\nContent-Type: image/gif\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(response), to);
}
