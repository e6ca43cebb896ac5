use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Author, Comment, Group, Post};

// -- JWT Claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

/// Where unauthenticated requests are sent; `next` is the page to return to.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginPage {
    pub next: Option<String>,
}

// -- Listings --

/// One page of an ordered listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub object_list: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexPage {
    pub page: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupPage {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfilePage {
    pub author: Author,
    /// Whether the requester follows this author; always false for guests.
    pub following: bool,
    pub page: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowPage {
    pub page: Page<Post>,
}

// -- Post detail & forms --

/// Submitted values and per-field validation messages of a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundForm {
    pub values: BTreeMap<String, String>,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl BoundForm {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostPage {
    pub post: Post,
    pub author: Author,
    pub comments: Vec<Comment>,
    pub form: BoundForm,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostFormPage {
    pub form: BoundForm,
    pub is_new: bool,
    /// The post being edited; absent on the creation form.
    pub post: Option<Post>,
    /// Choices for the `group` field.
    pub groups: Vec<Group>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentsPage {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub form: BoundForm,
}

// -- Misc pages --

#[derive(Debug, Serialize, Deserialize)]
pub struct AboutPage {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPage {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
