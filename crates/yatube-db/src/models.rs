//! Database row types. These map directly to SQLite rows.
//! Distinct from yatube-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct GroupRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post joined with its author's username and its group, if any.
pub struct PostRow {
    pub id: i64,
    pub text: String,
    pub pub_date: String,
    pub author_id: String,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
    pub comments_count: i64,
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub author_id: String,
    pub author_username: String,
    pub text: String,
    pub created: String,
}

/// Counters shown on an author's profile.
pub struct AuthorStats {
    pub posts: i64,
    pub followers: i64,
    pub following: i64,
}
