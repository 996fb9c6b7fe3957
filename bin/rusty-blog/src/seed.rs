//! Demo content: one post of each visibility state.

use anyhow::Result;
use bl_core::models::{Category, Location, User};
use bl_pages::forms::{CommentForm, PostForm};
use bl_pages::{self as pages, AppState};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

fn user(username: &str, first_name: &str, now: DateTime<Utc>) -> User {
    User {
        id: Uuid::now_v7(),
        username: username.to_string(),
        first_name: first_name.to_string(),
        last_name: String::new(),
        email: format!("{username}@example.com"),
        created_at: now,
    }
}

fn category(slug: &str, title: &str, is_published: bool, now: DateTime<Utc>) -> Category {
    Category {
        id: Uuid::now_v7(),
        title: title.to_string(),
        description: format!("Posts about {}", title.to_lowercase()),
        slug: slug.to_string(),
        is_published,
        created_at: now,
    }
}

fn post(title: &str, text: &str) -> PostForm {
    PostForm {
        title: title.to_string(),
        text: text.to_string(),
        pub_date: None,
        is_published: true,
        category: None,
        location: None,
        image: None,
    }
}

pub async fn run(state: &AppState) -> Result<()> {
    if state.repo.get_user_by_username("alice").await?.is_some() {
        log::info!("demo data already present, nothing to do");
        return Ok(());
    }

    let now = state.clock.now();
    let alice = user("alice", "Alice", now);
    let bob = user("bob", "Bob", now);
    state.repo.create_user(alice.clone()).await?;
    state.repo.create_user(bob.clone()).await?;

    let travel = category("travel", "Travel", true, now);
    let news = category("news", "News", false, now);
    state.repo.create_category(travel.clone()).await?;
    state.repo.create_category(news.clone()).await?;

    let lisbon = Location {
        id: Uuid::now_v7(),
        name: "Lisbon".to_string(),
        is_published: true,
        created_at: now,
    };
    state.repo.create_location(lisbon.clone()).await?;

    pages::create_post(
        state,
        &alice,
        PostForm {
            category: Some(travel.id),
            location: Some(lisbon.id),
            pub_date: Some(now - Duration::days(2)),
            ..post("Tram 28", "Up and down the hills all afternoon.")
        },
    )
    .await?;
    pages::create_post(
        state,
        &alice,
        PostForm {
            is_published: false,
            ..post("Half-finished", "Notes for a post that is not ready.")
        },
    )
    .await?;
    pages::create_post(
        state,
        &bob,
        PostForm {
            pub_date: Some(now + Duration::days(1)),
            ..post("Tomorrow", "Scheduled for tomorrow morning.")
        },
    )
    .await?;
    pages::create_post(
        state,
        &bob,
        PostForm {
            category: Some(news.id),
            pub_date: Some(now - Duration::hours(3)),
            ..post("Embargoed", "Filed under a hidden category.")
        },
    )
    .await?;
    pages::create_post(state, &bob, post("Hello", "Bob's first post.")).await?;

    let feed = pages::index(state, None, 1).await?;
    for view in &feed.items {
        pages::add_comment(
            state,
            &bob,
            view.post.id,
            CommentForm { text: "Nice read!".to_string() },
        )
        .await?;
    }

    log::info!(
        "seeded 2 users, 2 categories, 5 posts ({} publicly visible)",
        feed.total_items
    );
    Ok(())
}
