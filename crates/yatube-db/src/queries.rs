use crate::Database;
use crate::models::{AuthorStats, CommentRow, GroupRow, PostRow, UserRow};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

/// Which posts a feed shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(String),
    /// Posts by every author the given user follows.
    FollowedBy(String),
}

impl PostFilter {
    fn where_clause(&self) -> (&'static str, Option<Value>) {
        match self {
            PostFilter::All => ("", None),
            PostFilter::Group(id) => ("WHERE p.group_id = ?", Some(Value::Integer(*id))),
            PostFilter::Author(id) => ("WHERE p.author_id = ?", Some(Value::Text(id.clone()))),
            PostFilter::FollowedBy(id) => (
                "WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)",
                Some(Value::Text(id.clone())),
            ),
        }
    }
}

const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.author_id, u.username,
            p.group_id, g.slug, g.title, p.image,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN post_groups g ON g.id = p.group_id";

impl Database {
    // -- Users --

    /// Returns false, inserting nothing, when `username` is already taken.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO NOTHING",
                (id, username, password_hash),
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Deletes a user together with their posts, comments and follow edges.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    pub fn get_author_stats(&self, user_id: &str) -> Result<AuthorStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM posts WHERE author_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE author_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_id = ?1)",
                [user_id],
                |row| {
                    Ok(AuthorStats {
                        posts: row.get(0)?,
                        followers: row.get(1)?,
                        following: row.get(2)?,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    // -- Groups --

    pub fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
                (title, slug, description),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_group(&self, id: i64) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, slug, description FROM post_groups WHERE id = ?1",
                    [id],
                    group_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_group_by_slug(&self, slug: &str) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1",
                    [slug],
                    group_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title")?;
            let rows = stmt
                .query_map([], group_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes a group; its posts stay and lose their group.
    pub fn delete_group(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            Ok(conn.execute("DELETE FROM post_groups WHERE id = ?1", [id])? > 0)
        })
    }

    // -- Posts --

    pub fn create_post(
        &self,
        author_id: &str,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (author_id, text, group_id, image) VALUES (?1, ?2, ?3, ?4)",
                params![author_id, text, group_id, image],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Replaces the editable fields of a post. Author and pub_date never change.
    pub fn update_post(
        &self,
        id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET text = ?1, group_id = ?2, image = ?3 WHERE id = ?4",
                params![text, group_id, image, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("{POST_SELECT} WHERE p.id = ?1");
            let row = conn.query_row(&sql, [id], post_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn count_posts(&self, filter: &PostFilter) -> Result<usize> {
        self.with_conn(|conn| {
            let (clause, param) = filter.where_clause();
            let sql = format!("SELECT COUNT(*) FROM posts p {clause}");
            let count: i64 = conn.query_row(&sql, params_from_iter(param), |r| r.get(0))?;
            Ok(usize::try_from(count)?)
        })
    }

    /// Newest-first slice of the posts matching `filter`.
    pub fn list_posts(
        &self,
        filter: &PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let (clause, param) = filter.where_clause();
            let sql = format!(
                "{POST_SELECT} {clause} ORDER BY p.pub_date DESC, p.id DESC LIMIT ? OFFSET ?"
            );
            let mut values: Vec<Value> = param.into_iter().collect();
            values.push(Value::Integer(i64::try_from(limit)?));
            values.push(Value::Integer(i64::try_from(offset)?));

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values), post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes a post and its comments.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0))
    }

    // -- Comments --

    pub fn create_comment(&self, post_id: i64, author_id: &str, text: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, author_id, text) VALUES (?1, ?2, ?3)",
                params![post_id, author_id, text],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.author_id, u.username, c.text, c.created
                 FROM comments c
                 JOIN users u ON u.id = c.author_id
                 WHERE c.post_id = ?1
                 ORDER BY c.created DESC, c.id DESC",
            )?;
            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        author_id: row.get(2)?,
                        author_username: row.get(3)?,
                        text: row.get(4)?,
                        created: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Follows --

    /// Adds the `user -> author` edge. Returns false if it already existed.
    pub fn follow(&self, user_id: &str, author_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO follows (user_id, author_id) VALUES (?1, ?2)",
                (user_id, author_id),
            )?;
            Ok(inserted > 0)
        })
    }

    /// Removes the `user -> author` edge. Returns false if there was none.
    pub fn unfollow(&self, user_id: &str, author_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
                (user_id, author_id),
            )?;
            Ok(removed > 0)
        })
    }

    pub fn is_following(&self, user_id: &str, author_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ?1 AND author_id = ?2)",
                (user_id, author_id),
                |r| r.get(0),
            )?;
            Ok(exists)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, username, password, created_at FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row.get(4)?,
        group_id: row.get(5)?,
        group_slug: row.get(6)?,
        group_title: row.get(7)?,
        image: row.get(8)?,
        comments_count: row.get(9)?,
    })
}
