//! # Forms
//!
//! Submitted form data and its validation. Validation trims text fields,
//! enforces length limits in characters and checks that referenced
//! categories and locations exist.

use bl_core::clock::Clock;
use bl_core::error::{AppError, Result};
use bl_core::models::{Post, MAX_COMMENT_LENGTH, MAX_FIELD_LENGTH};
use bl_core::traits::BlogRepo;
use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;
use uuid::Uuid;

pub const MAX_NAME_LENGTH: usize = 150;

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::ValidationError(msg.into())
}

fn required(field: &str, value: &str, max: Option<usize>) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(invalid(format!("{field} must be at most {max} characters")));
        }
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    /// Defaults to "now"; a future date schedules the post
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub location: Option<Uuid>,
    #[serde(default)]
    pub image: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A validated `PostForm`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostForm {
    /// Checks lengths and that referenced category and location exist.
    pub async fn validate(self, repo: &dyn BlogRepo, clock: &dyn Clock) -> Result<PostFields> {
        let title = required("title", &self.title, Some(MAX_FIELD_LENGTH))?;
        let text = required("text", &self.text, None)?;

        if let Some(id) = self.category {
            if repo.get_category_by_id(id).await?.is_none() {
                return Err(invalid(format!("unknown category {id}")));
            }
        }
        if let Some(id) = self.location {
            if repo.get_location(id).await?.is_none() {
                return Err(invalid(format!("unknown location {id}")));
            }
        }

        let image = self.image.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        Ok(PostFields {
            title,
            text,
            pub_date: self
                .pub_date
                .map(|at| at.trunc_subsecs(6))
                .unwrap_or_else(|| clock.now()),
            is_published: self.is_published,
            category_id: self.category,
            location_id: self.location,
            image,
        })
    }
}

impl PostFields {
    pub fn into_post(self, author_id: Uuid, created_at: DateTime<Utc>) -> Post {
        Post {
            id: Uuid::now_v7(),
            title: self.title,
            text: self.text,
            pub_date: self.pub_date,
            is_published: self.is_published,
            created_at,
            author_id,
            category_id: self.category_id,
            location_id: self.location_id,
            image: self.image,
        }
    }

    /// Overwrites the editable fields; id, author and creation time stay.
    pub fn apply_to(self, post: Post) -> Post {
        Post {
            title: self.title,
            text: self.text,
            pub_date: self.pub_date,
            is_published: self.is_published,
            category_id: self.category_id,
            location_id: self.location_id,
            image: self.image,
            ..post
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String> {
        required("comment", &self.text, Some(MAX_COMMENT_LENGTH))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl ProfileForm {
    pub fn validate(self) -> Result<ProfileForm> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let email = self.email.trim().to_string();

        for (field, value) in [("first name", &first_name), ("last name", &last_name)] {
            if value.chars().count() > MAX_NAME_LENGTH {
                return Err(invalid(format!(
                    "{field} must be at most {MAX_NAME_LENGTH} characters"
                )));
            }
        }
        if !email.is_empty() {
            match email.split_once('@') {
                Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
                _ => return Err(invalid(format!("invalid email address {email}"))),
            }
        }

        Ok(ProfileForm {
            first_name,
            last_name,
            email,
        })
    }
}
