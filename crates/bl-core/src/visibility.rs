//! # Visibility Policy
//!
//! Decides which posts a viewer may read. The policy composes filters on
//! top of whatever the caller already restricted; the entity store runs
//! the resulting query.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::query::{PostFilter, PostQuery};

/// Who is looking, and whose profile (if any) they are looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewContext {
    /// `None` for anonymous visitors
    pub viewer: Option<Uuid>,
    pub target_author: Option<Uuid>,
}

impl ViewContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn viewer(viewer: Option<Uuid>) -> Self {
        Self {
            viewer,
            target_author: None,
        }
    }

    /// Scopes the view to one author's posts.
    pub fn for_author(mut self, author_id: Uuid) -> Self {
        self.target_author = Some(author_id);
        self
    }

    /// A signed-in user looking at their own posts.
    pub fn is_self_view(&self) -> bool {
        matches!((self.viewer, self.target_author), (Some(v), Some(a)) if v == a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityOptions {
    pub include_unpublished: bool,
    pub join_related: bool,
    pub with_comment_count: bool,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            include_unpublished: false,
            join_related: true,
            with_comment_count: true,
        }
    }
}

/// Narrows `base` to the posts `ctx` may see.
///
/// Unless unpublished posts are included (explicitly, or because the
/// viewer is looking at their own profile) a post must be published, have
/// a `pub_date` no later than `clock.now()`, and sit in a published
/// category or none at all. "Now" is read on every call.
pub fn select_visible_posts(
    base: PostQuery,
    ctx: &ViewContext,
    options: VisibilityOptions,
    clock: &dyn Clock,
) -> PostQuery {
    let mut query = base;
    query.join_related = options.join_related;
    query.with_comment_count = options.with_comment_count;

    if let Some(author_id) = ctx.target_author {
        query = query.filter(PostFilter::Author(author_id));
    }

    let include_unpublished = options.include_unpublished || ctx.is_self_view();
    if !include_unpublished {
        query = query
            .filter(PostFilter::Published)
            .filter(PostFilter::PublishedBy(clock.now()))
            .filter(PostFilter::CategoryPublished);
    }

    log::debug!(
        "visible posts for viewer={:?} target={:?}: {} filter(s), drafts={}",
        ctx.viewer,
        ctx.target_author,
        query.filters.len(),
        include_unpublished
    );
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Category, Post};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn post(author_id: Uuid) -> Post {
        Post {
            id: Uuid::now_v7(),
            title: "Notes".into(),
            text: "body".into(),
            pub_date: noon() - Duration::hours(1),
            is_published: true,
            created_at: noon() - Duration::days(1),
            author_id,
            category_id: None,
            location_id: None,
            image: None,
        }
    }

    fn hidden_category() -> Category {
        Category {
            id: Uuid::now_v7(),
            title: "News".into(),
            description: String::new(),
            slug: "news".into(),
            is_published: false,
            created_at: noon(),
        }
    }

    #[test]
    fn drafts_hidden_from_others_but_not_from_author() {
        let clock = FixedClock::new(noon());
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();
        let mut draft = post(alice);
        draft.is_published = false;

        let opts = VisibilityOptions::default();
        let anon = select_visible_posts(PostQuery::all(), &ViewContext::anonymous(), opts, &clock);
        assert!(!anon.matches(&draft, None));

        let bob_on_alice = ViewContext::viewer(Some(bob)).for_author(alice);
        let q = select_visible_posts(PostQuery::all(), &bob_on_alice, opts, &clock);
        assert!(!q.matches(&draft, None));

        let alice_on_alice = ViewContext::viewer(Some(alice)).for_author(alice);
        let q = select_visible_posts(PostQuery::all(), &alice_on_alice, opts, &clock);
        assert!(q.matches(&draft, None));
    }

    #[test]
    fn future_post_appears_once_its_time_comes() {
        let clock = FixedClock::new(noon());
        let mut scheduled = post(Uuid::now_v7());
        scheduled.pub_date = noon() + Duration::minutes(30);
        let ctx = ViewContext::anonymous();

        let before = select_visible_posts(PostQuery::all(), &ctx, Default::default(), &clock);
        assert!(!before.matches(&scheduled, None));

        clock.advance(Duration::minutes(30));
        let after = select_visible_posts(PostQuery::all(), &ctx, Default::default(), &clock);
        assert!(after.matches(&scheduled, None));
    }

    #[test]
    fn unpublished_category_hides_published_post() {
        let clock = FixedClock::new(noon());
        let news = hidden_category();
        let mut p = post(Uuid::now_v7());
        p.category_id = Some(news.id);

        let q = select_visible_posts(PostQuery::all(), &ViewContext::anonymous(), Default::default(), &clock);
        assert!(!q.matches(&p, Some(&news)));
        assert!(q.matches(&post(Uuid::now_v7()), None));
    }

    #[test]
    fn composes_on_top_of_base_filters() {
        let clock = FixedClock::new(noon());
        let alice = Uuid::now_v7();
        let base = PostQuery::by_author(alice);

        let q = select_visible_posts(base, &ViewContext::anonymous(), Default::default(), &clock);
        assert_eq!(q.filters[0], PostFilter::Author(alice));
        assert!(q.matches(&post(alice), None));
        assert!(!q.matches(&post(Uuid::now_v7()), None));
    }

    #[test]
    fn include_unpublished_skips_the_live_filters() {
        let clock = FixedClock::new(noon());
        let opts = VisibilityOptions {
            include_unpublished: true,
            join_related: false,
            with_comment_count: false,
        };
        let q = select_visible_posts(PostQuery::all(), &ViewContext::anonymous(), opts, &clock);
        assert!(q.filters.is_empty());
        assert!(!q.join_related);
        assert!(!q.with_comment_count);
    }

    #[test]
    fn defaults_enrich_results() {
        let clock = FixedClock::new(noon());
        let q = select_visible_posts(PostQuery::all(), &ViewContext::anonymous(), Default::default(), &clock);
        assert!(q.join_related);
        assert!(q.with_comment_count);
        assert!(q.filters.contains(&PostFilter::PublishedBy(noon())));
    }

    #[test]
    fn identical_calls_build_identical_queries() {
        let clock = FixedClock::new(noon());
        let ctx = ViewContext::viewer(Some(Uuid::now_v7()));
        let a = select_visible_posts(PostQuery::in_category("travel"), &ctx, Default::default(), &clock);
        let b = select_visible_posts(PostQuery::in_category("travel"), &ctx, Default::default(), &clock);
        assert_eq!(a, b);
    }
}
