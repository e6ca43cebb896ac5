//! Conversions from database rows into the models pages are built from.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use yatube_db::models::{AuthorStats, CommentRow, GroupRow, PostRow};
use yatube_types::models::{Author, Comment, Group, GroupSummary, Post};

use crate::media;

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS.SSS" without timezone.
pub fn parse_timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, what, e);
            DateTime::default()
        })
}

pub fn post(row: PostRow) -> Post {
    let group = match (row.group_id, row.group_slug, row.group_title) {
        (Some(id), Some(slug), Some(title)) => Some(GroupSummary { id, slug, title }),
        _ => None,
    };

    Post {
        pub_date: parse_timestamp(&row.pub_date, &format!("post {}", row.id)),
        id: row.id,
        text: row.text,
        author: row.author_username,
        group,
        image: row.image.as_deref().map(media::url_for),
        comments_count: row.comments_count,
    }
}

pub fn comment(row: CommentRow) -> Comment {
    Comment {
        created: parse_timestamp(&row.created, &format!("comment {}", row.id)),
        id: row.id,
        post_id: row.post_id,
        author: row.author_username,
        text: row.text,
    }
}

pub fn group(row: GroupRow) -> Group {
    Group {
        id: row.id,
        title: row.title,
        slug: row.slug,
        description: row.description,
    }
}

pub fn author(username: String, stats: AuthorStats) -> Author {
    Author {
        username,
        posts_count: stats.posts,
        followers_count: stats.followers,
        following_count: stats.following,
    }
}
