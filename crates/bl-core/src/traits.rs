//! # Core Traits (Ports)
//!
//! Any store plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Category, Comment, CommentView, Location, Post, PostView, User};
use crate::query::PostQuery;

/// Data persistence contract for the blog's entities.
///
/// Post queries are executed exactly as composed: every filter applies,
/// rows come back ordered by `pub_date` then `id`, both descending.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlogRepo: Send + Sync {
    // User Operations
    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, user: User) -> anyhow::Result<()>;
    async fn update_user(&self, user: User) -> anyhow::Result<()>;

    // Reference Data
    async fn get_category(&self, slug: &str) -> anyhow::Result<Option<Category>>;
    async fn get_category_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>>;
    async fn create_category(&self, category: Category) -> anyhow::Result<()>;
    async fn get_location(&self, id: Uuid) -> anyhow::Result<Option<Location>>;
    async fn create_location(&self, location: Location) -> anyhow::Result<()>;

    // Post Operations
    async fn query_posts(&self, query: &PostQuery) -> anyhow::Result<Vec<PostView>>;
    /// Ignores the query's limit and offset.
    async fn count_posts(&self, query: &PostQuery) -> anyhow::Result<i64>;
    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn create_post(&self, post: Post) -> anyhow::Result<()>;
    async fn update_post(&self, post: Post) -> anyhow::Result<()>;
    /// Removes the post together with its comments.
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<()>;

    // Comment Operations
    /// Oldest first.
    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentView>>;
    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()>;
    async fn update_comment(&self, comment: Comment) -> anyhow::Result<()>;
    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<()>;
}
