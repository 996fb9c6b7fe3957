//! # bl-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `bl-core` domain models, and translates composed `PostQuery`s
//! into SQL.

use std::str::FromStr;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bl_core::error::AppError;
use bl_core::models::{Category, Comment, CommentView, Location, Post, PostView, User};
use bl_core::query::{PostFilter, PostQuery};
use bl_core::traits::BlogRepo;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

pub struct SqliteBlogRepo {
    pool: SqlitePool,
}

const POST_COLUMNS: &str = "p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at, \
     p.author_id, p.category_id, p.location_id, p.image";

const RELATED_COLUMNS: &str = ", u.username AS author_username, u.first_name AS author_first_name, \
     u.last_name AS author_last_name, u.email AS author_email, u.created_at AS author_created_at, \
     c.title AS category_title, c.description AS category_description, c.slug AS category_slug, \
     c.is_published AS category_is_published, c.created_at AS category_created_at, \
     l.name AS location_name, l.is_published AS location_is_published, \
     l.created_at AS location_created_at";

const COMMENT_COUNT_COLUMN: &str =
    ", (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count";

impl SqliteBlogRepo {
    /// Connects with the default pool size and brings the schema up to date.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::with_max_connections(url, 5).await
    }

    /// Connects and brings the schema up to date.
    ///
    /// In-memory databases live and die with their connection, so for those
    /// the pool is pinned to a single connection that never expires and
    /// `max_connections` is ignored.
    pub async fn with_max_connections(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("sqlite store ready at {url}");

        Ok(Self { pool })
    }
}

// Timestamps are stored as integer microseconds.
fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_micros(micros: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| anyhow!("timestamp out of range: {micros}"))
}

/// Writes addressed to a single row fail with `NotFound` when nothing matched.
fn expect_one_row(affected: u64, entity: &str, id: Uuid) -> anyhow::Result<()> {
    if affected == 0 {
        return Err(AppError::not_found(entity, id).into());
    }
    Ok(())
}

fn user_from_row(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        created_at: from_micros(row.try_get("created_at")?)?,
    })
}

/// Reads a user joined under the `author_` prefix.
fn author_from_row(row: &SqliteRow, id: Uuid) -> anyhow::Result<User> {
    Ok(User {
        id,
        username: row.try_get("author_username")?,
        first_name: row.try_get("author_first_name")?,
        last_name: row.try_get("author_last_name")?,
        email: row.try_get("author_email")?,
        created_at: from_micros(row.try_get("author_created_at")?)?,
    })
}

fn category_from_row(row: &SqliteRow) -> anyhow::Result<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        slug: row.try_get("slug")?,
        is_published: row.try_get("is_published")?,
        created_at: from_micros(row.try_get("created_at")?)?,
    })
}

fn location_from_row(row: &SqliteRow) -> anyhow::Result<Location> {
    Ok(Location {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        is_published: row.try_get("is_published")?,
        created_at: from_micros(row.try_get("created_at")?)?,
    })
}

fn post_from_row(row: &SqliteRow) -> anyhow::Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        pub_date: from_micros(row.try_get("pub_date")?)?,
        is_published: row.try_get("is_published")?,
        created_at: from_micros(row.try_get("created_at")?)?,
        author_id: row.try_get("author_id")?,
        category_id: row.try_get("category_id")?,
        location_id: row.try_get("location_id")?,
        image: row.try_get("image")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> anyhow::Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        author_id: row.try_get("author_id")?,
        post_id: row.try_get("post_id")?,
        created_at: from_micros(row.try_get("created_at")?)?,
    })
}

fn post_view_from_row(row: &SqliteRow, query: &PostQuery) -> anyhow::Result<PostView> {
    let post = post_from_row(row)?;
    let mut view = PostView::bare(post);

    if query.join_related {
        view.author = Some(author_from_row(row, view.post.author_id)?);
        view.category = match view.post.category_id {
            Some(id) => Some(Category {
                id,
                title: row.try_get("category_title")?,
                description: row.try_get("category_description")?,
                slug: row.try_get("category_slug")?,
                is_published: row.try_get("category_is_published")?,
                created_at: from_micros(row.try_get("category_created_at")?)?,
            }),
            None => None,
        };
        view.location = match view.post.location_id {
            Some(id) => Some(Location {
                id,
                name: row.try_get("location_name")?,
                is_published: row.try_get("location_is_published")?,
                created_at: from_micros(row.try_get("location_created_at")?)?,
            }),
            None => None,
        };
    }
    if query.with_comment_count {
        view.comment_count = Some(row.try_get("comment_count")?);
    }
    Ok(view)
}

/// The category join is always present so category filters can apply.
fn push_from(qb: &mut QueryBuilder<'_, Sqlite>, join_related: bool) {
    qb.push(" FROM posts p LEFT JOIN categories c ON c.id = p.category_id");
    if join_related {
        qb.push(" JOIN users u ON u.id = p.author_id LEFT JOIN locations l ON l.id = p.location_id");
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filters: &[PostFilter]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            PostFilter::Id(id) => {
                qb.push("p.id = ").push_bind(*id);
            }
            PostFilter::Author(id) => {
                qb.push("p.author_id = ").push_bind(*id);
            }
            PostFilter::CategorySlug(slug) => {
                qb.push("c.slug = ").push_bind(slug.clone());
            }
            PostFilter::Published => {
                qb.push("p.is_published = 1");
            }
            PostFilter::PublishedBy(at) => {
                qb.push("p.pub_date <= ").push_bind(to_micros(*at));
            }
            PostFilter::CategoryPublished => {
                qb.push("(p.category_id IS NULL OR c.is_published = 1)");
            }
        }
    }
}

#[async_trait]
impl BlogRepo for SqliteBlogRepo {
    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO users (id, username, first_name, last_name, email, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(user.id)
            .bind(user.username)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.email)
            .bind(to_micros(user.created_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Usernames are fixed; only the profile fields change.
    async fn update_user(&self, user: User) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE users SET first_name = ?, last_name = ?, email = ? WHERE id = ?")
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.email)
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected(), "User", user.id)
    }

    async fn get_category(&self, slug: &str) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn get_category_by_id(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn create_category(&self, category: Category) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO categories (id, title, description, slug, is_published, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(category.id)
            .bind(category.title)
            .bind(category.description)
            .bind(category.slug)
            .bind(category.is_published)
            .bind(to_micros(category.created_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_location(&self, id: Uuid) -> anyhow::Result<Option<Location>> {
        let row = sqlx::query("SELECT * FROM locations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(location_from_row).transpose()
    }

    async fn create_location(&self, location: Location) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO locations (id, name, is_published, created_at) VALUES (?, ?, ?, ?)")
            .bind(location.id)
            .bind(location.name)
            .bind(location.is_published)
            .bind(to_micros(location.created_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_posts(&self, query: &PostQuery) -> anyhow::Result<Vec<PostView>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        if query.join_related {
            qb.push(RELATED_COLUMNS);
        }
        if query.with_comment_count {
            qb.push(COMMENT_COUNT_COLUMN);
        }
        push_from(&mut qb, query.join_related);
        push_filters(&mut qb, &query.filters);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC");

        // SQLite wants a LIMIT before any OFFSET; -1 means unbounded.
        if query.limit.is_some() || query.offset.is_some() {
            qb.push(" LIMIT ")
                .push_bind(query.limit.unwrap_or(-1))
                .push(" OFFSET ")
                .push_bind(query.offset.unwrap_or(0));
        }

        log::debug!("query_posts: {}", qb.sql());
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(|row| post_view_from_row(row, query)).collect()
    }

    async fn count_posts(&self, query: &PostQuery) -> anyhow::Result<i64> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*)");
        push_from(&mut qb, false);
        push_filters(&mut qb, &query.filters);

        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(post_from_row).transpose()
    }

    async fn create_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO posts (id, title, text, pub_date, is_published, created_at, author_id, category_id, location_id, image) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)")
            .bind(post.id)
            .bind(post.title)
            .bind(post.text)
            .bind(to_micros(post.pub_date))
            .bind(post.is_published)
            .bind(to_micros(post.created_at))
            .bind(post.author_id)
            .bind(post.category_id)
            .bind(post.location_id)
            .bind(post.image)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The author and creation time are never rewritten.
    async fn update_post(&self, post: Post) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE posts SET title = ?, text = ?, pub_date = ?, is_published = ?, category_id = ?, location_id = ?, image = ? WHERE id = ?")
            .bind(post.title)
            .bind(post.text)
            .bind(to_micros(post.pub_date))
            .bind(post.is_published)
            .bind(post.category_id)
            .bind(post.location_id)
            .bind(post.image)
            .bind(post.id)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected(), "Post", post.id)
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected(), "Post", id)
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentView>> {
        let rows = sqlx::query(
            "SELECT cm.id, cm.text, cm.author_id, cm.post_id, cm.created_at, \
                    u.username AS author_username, u.first_name AS author_first_name, \
                    u.last_name AS author_last_name, u.email AS author_email, \
                    u.created_at AS author_created_at \
             FROM comments cm JOIN users u ON u.id = cm.author_id \
             WHERE cm.post_id = ? ORDER BY cm.created_at ASC, cm.id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let comment = comment_from_row(row)?;
                let author = author_from_row(row, comment.author_id)?;
                Ok::<_, anyhow::Error>(CommentView { comment, author })
            })
            .collect()
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO comments (id, text, author_id, post_id, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(comment.id)
            .bind(comment.text)
            .bind(comment.author_id)
            .bind(comment.post_id)
            .bind(to_micros(comment.created_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_comment(&self, comment: Comment) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(comment.text)
            .bind(comment.id)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected(), "Comment", comment.id)
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected(), "Comment", id)
    }
}
