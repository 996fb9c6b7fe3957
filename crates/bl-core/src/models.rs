//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Blog.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length for titles and names.
pub const MAX_FIELD_LENGTH: usize = 256;

/// Maximum length of a comment body.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// A registered identity. Authentication lives elsewhere; we only keep
/// what profile pages show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A thematic section (e.g. /category/travel/).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// The URL slug; unique across categories
    pub slug: String,
    /// Hiding a category hides every post in it
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Where a post was written. Purely descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// A blog publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    /// May lie in the future for scheduled publications
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    /// Set once at creation, never reassigned
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Opaque reference handed out by the media collaborator
    pub image: Option<String>,
}

impl Post {
    /// Whether the post is readable by everybody at `now`.
    ///
    /// `category` must be the post's own category (or `None` when it has
    /// none); a missing category never hides a post.
    pub fn is_live(&self, category: Option<&Category>, now: DateTime<Utc>) -> bool {
        self.is_published
            && self.pub_date <= now
            && category.map_or(true, |c| c.is_published)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A post as returned by the entity store, with whatever enrichment the
/// query asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub post: Post,
    /// Present when the query joined related records
    pub author: Option<User>,
    pub category: Option<Category>,
    pub location: Option<Location>,
    /// Present when the query annotated comment counts
    pub comment_count: Option<i64>,
}

impl PostView {
    pub fn bare(post: Post) -> Self {
        Self {
            post,
            author: None,
            category: None,
            location: None,
            comment_count: None,
        }
    }
}

/// A comment joined with its author, for detail pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: User,
}
