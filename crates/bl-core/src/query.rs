//! # Post Queries
//!
//! A `PostQuery` is a conjunction of filters plus the enrichment flags the
//! entity store should honour. Builders only ever append: a filter added
//! later narrows the result, it never replaces an earlier one.
//!
//! Results are always ordered by `pub_date` descending, ties broken by
//! `id` descending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, Post};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostFilter {
    Id(Uuid),
    Author(Uuid),
    /// Unknown slugs match nothing
    CategorySlug(String),
    /// `is_published == true`
    Published,
    /// `pub_date <= at`
    PublishedBy(DateTime<Utc>),
    /// No category, or a published one
    CategoryPublished,
}

impl PostFilter {
    fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        match self {
            PostFilter::Id(id) => post.id == *id,
            PostFilter::Author(id) => post.author_id == *id,
            PostFilter::CategorySlug(slug) => category.is_some_and(|c| &c.slug == slug),
            PostFilter::Published => post.is_published,
            PostFilter::PublishedBy(at) => post.pub_date <= *at,
            PostFilter::CategoryPublished => category.map_or(true, |c| c.is_published),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostQuery {
    pub filters: Vec<PostFilter>,
    /// Attach author, category and location to each row
    pub join_related: bool,
    /// Attach the number of comments to each row
    pub with_comment_count: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PostQuery {
    /// Every post, no enrichment.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::all().filter(PostFilter::Id(id))
    }

    pub fn by_author(author_id: Uuid) -> Self {
        Self::all().filter(PostFilter::Author(author_id))
    }

    pub fn in_category(slug: &str) -> Self {
        Self::all().filter(PostFilter::CategorySlug(slug.to_string()))
    }

    /// Appends a filter. Duplicates are skipped.
    pub fn filter(mut self, filter: PostFilter) -> Self {
        if !self.filters.contains(&filter) {
            self.filters.push(filter);
        }
        self
    }

    /// Restricts the query to one page. `page` is 1-based.
    pub fn paginate(mut self, page: u32, per_page: u32) -> Self {
        let page = i64::from(page.max(1));
        let per_page = i64::from(per_page.max(1));
        self.limit = Some(per_page);
        self.offset = Some((page - 1) * per_page);
        self
    }

    /// Drops pagination, e.g. for counting.
    pub fn unpaged(&self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    /// In-memory evaluation of the filter conjunction. `category` must be
    /// the post's own category. Store adapters must agree with this.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        self.filters.iter().all(|f| f.matches(post, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn post(author_id: Uuid, category_id: Option<Uuid>) -> Post {
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        Post {
            id: Uuid::now_v7(),
            title: "Spring in the hills".into(),
            text: "...".into(),
            pub_date: at,
            is_published: true,
            created_at: at,
            author_id,
            category_id,
            location_id: None,
            image: None,
        }
    }

    fn category(slug: &str, is_published: bool) -> Category {
        Category {
            id: Uuid::now_v7(),
            title: slug.to_uppercase(),
            description: String::new(),
            slug: slug.into(),
            is_published,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filters_are_conjunctive() {
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let p = post(alice, None);

        assert!(PostQuery::by_author(alice).matches(&p, None));
        let both = PostQuery::by_author(alice).filter(PostFilter::Author(bob));
        assert!(!both.matches(&p, None));
        assert_eq!(both.filters.len(), 2);
    }

    #[test]
    fn duplicate_filters_are_collapsed() {
        let q = PostQuery::all()
            .filter(PostFilter::Published)
            .filter(PostFilter::Published);
        assert_eq!(q.filters, vec![PostFilter::Published]);
    }

    #[test]
    fn category_slug_needs_a_category() {
        let travel = category("travel", true);
        let mut p = post(Uuid::now_v7(), Some(travel.id));
        let q = PostQuery::in_category("travel");
        assert!(q.matches(&p, Some(&travel)));

        p.category_id = None;
        assert!(!q.matches(&p, None));
        assert!(!PostQuery::in_category("nope").matches(&p, Some(&travel)));
    }

    #[test]
    fn missing_category_passes_category_published() {
        let p = post(Uuid::now_v7(), None);
        let q = PostQuery::all().filter(PostFilter::CategoryPublished);
        assert!(q.matches(&p, None));
        assert!(!q.matches(&p, Some(&category("hidden", false))));
    }

    #[test]
    fn published_by_is_inclusive() {
        let p = post(Uuid::now_v7(), None);
        let at = p.pub_date;
        assert!(PostQuery::all().filter(PostFilter::PublishedBy(at)).matches(&p, None));
        let before = PostQuery::all().filter(PostFilter::PublishedBy(at - Duration::seconds(1)));
        assert!(!before.matches(&p, None));
    }

    #[test]
    fn paginate_clamps_and_offsets() {
        let q = PostQuery::all().paginate(3, 10);
        assert_eq!((q.limit, q.offset), (Some(10), Some(20)));

        let q = PostQuery::all().paginate(0, 10);
        assert_eq!(q.offset, Some(0));

        assert_eq!(q.unpaged().limit, None);
    }
}
