//! # bl-pages Handlers
//!
//! This module coordinates the flow between page requests and Core traits.
//! Each flow makes one policy decision (visibility or authorization) and
//! the persistence calls around it.

use bl_core::authorization::{authorize_mutation, Decision, Redirect};
use bl_core::error::{AppError, Result};
use bl_core::models::{Category, Comment, CommentView, Post, PostView, User};
use bl_core::query::PostQuery;
use bl_core::visibility::{select_visible_posts, ViewContext, VisibilityOptions};
use serde::Serialize;
use uuid::Uuid;

use crate::forms::{CommentForm, PostForm, ProfileForm};
use crate::pagination::{clamp_page, Page};
use crate::AppState;

/// What a mutation flow asks the presentation layer to do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MutationOutcome {
    Completed(Redirect),
    /// The actor is not the author; nothing was changed.
    Denied(Redirect),
}

impl MutationOutcome {
    pub fn redirect(&self) -> &Redirect {
        match self {
            MutationOutcome::Completed(r) | MutationOutcome::Denied(r) => r,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub posts: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub user: User,
    pub posts: Page<PostView>,
}

/// Runs the visibility policy over `base` and fetches one page of it.
async fn visible_page(
    state: &AppState,
    base: PostQuery,
    ctx: &ViewContext,
    page: u32,
) -> Result<Page<PostView>> {
    let query = select_visible_posts(base, ctx, VisibilityOptions::default(), state.clock.as_ref());
    let total = state.repo.count_posts(&query).await?;
    let number = clamp_page(page, total, state.posts_per_page);

    let items = state
        .repo
        .query_posts(&query.paginate(number, state.posts_per_page))
        .await?;
    Ok(Page::new(items, number, state.posts_per_page, total))
}

/// A single post as `viewer` may see it: the author always, everybody
/// else only while it is live.
async fn visible_post(state: &AppState, viewer: Option<Uuid>, post_id: Uuid) -> Result<PostView> {
    let post = load_post(state, post_id).await?;
    let ctx = ViewContext::viewer(viewer).for_author(post.author_id);
    let query = select_visible_posts(
        PostQuery::by_id(post_id),
        &ctx,
        VisibilityOptions::default(),
        state.clock.as_ref(),
    );

    state
        .repo
        .query_posts(&query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("Post", post_id))
}

async fn load_post(state: &AppState, post_id: Uuid) -> Result<Post> {
    state
        .repo
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post", post_id))
}

/// Comments are addressed through their post; a mismatch is a miss.
async fn load_comment(state: &AppState, post_id: Uuid, comment_id: Uuid) -> Result<Comment> {
    state
        .repo
        .get_comment(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| AppError::not_found("Comment", comment_id))
}

fn denied(actor: &User, what: &str, id: Uuid, redirect: Redirect) -> MutationOutcome {
    log::warn!("{} may not change {what} {id}; redirecting to {}", actor.username, redirect.path());
    MutationOutcome::Denied(redirect)
}

/// Renders the front page listing.
pub async fn index(state: &AppState, viewer: Option<Uuid>, page: u32) -> Result<Page<PostView>> {
    visible_page(state, PostQuery::all(), &ViewContext::viewer(viewer), page).await
}

/// Renders a category listing (e.g. /category/travel/).
pub async fn category_posts(
    state: &AppState,
    viewer: Option<Uuid>,
    slug: &str,
    page: u32,
) -> Result<CategoryPage> {
    let category = state
        .repo
        .get_category(slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or_else(|| AppError::not_found("Category", slug))?;

    let posts = visible_page(state, PostQuery::in_category(slug), &ViewContext::viewer(viewer), page).await?;
    Ok(CategoryPage { category, posts })
}

pub async fn post_detail(state: &AppState, viewer: Option<Uuid>, post_id: Uuid) -> Result<PostDetail> {
    let post = visible_post(state, viewer, post_id).await?;
    let comments = state.repo.list_comments(post_id).await?;
    Ok(PostDetail { post, comments })
}

/// Renders a user's page. The owner also sees drafts and scheduled posts.
pub async fn profile(
    state: &AppState,
    viewer: Option<Uuid>,
    username: &str,
    page: u32,
) -> Result<ProfilePage> {
    let user = state
        .repo
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found("User", username))?;

    let ctx = ViewContext::viewer(viewer).for_author(user.id);
    let posts = visible_page(state, PostQuery::all(), &ctx, page).await?;
    Ok(ProfilePage { user, posts })
}

/// Users can only ever edit their own profile.
pub async fn edit_profile(state: &AppState, actor: &User, form: ProfileForm) -> Result<Redirect> {
    let form = form.validate()?;
    let updated = User {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        ..actor.clone()
    };
    state.repo.update_user(updated).await?;

    log::info!("{} updated their profile", actor.username);
    Ok(Redirect::Profile(actor.username.clone()))
}

pub async fn create_post(state: &AppState, actor: &User, form: PostForm) -> Result<Redirect> {
    let fields = form.validate(state.repo.as_ref(), state.clock.as_ref()).await?;
    let post = fields.into_post(actor.id, state.clock.now());
    let post_id = post.id;
    state.repo.create_post(post).await?;

    log::info!("{} created post {post_id}", actor.username);
    Ok(Redirect::Profile(actor.username.clone()))
}

pub async fn edit_post(
    state: &AppState,
    actor: &User,
    post_id: Uuid,
    form: PostForm,
) -> Result<MutationOutcome> {
    let post = load_post(state, post_id).await?;
    if let Decision::Deny { redirect } = authorize_mutation(&post, actor) {
        return Ok(denied(actor, "post", post_id, redirect));
    }

    let fields = form.validate(state.repo.as_ref(), state.clock.as_ref()).await?;
    state.repo.update_post(fields.apply_to(post)).await?;

    log::info!("{} edited post {post_id}", actor.username);
    Ok(MutationOutcome::Completed(Redirect::PostDetail(post_id)))
}

pub async fn delete_post(state: &AppState, actor: &User, post_id: Uuid) -> Result<MutationOutcome> {
    let post = load_post(state, post_id).await?;
    if let Decision::Deny { redirect } = authorize_mutation(&post, actor) {
        return Ok(denied(actor, "post", post_id, redirect));
    }

    state.repo.delete_post(post_id).await?;

    log::info!("{} deleted post {post_id}", actor.username);
    Ok(MutationOutcome::Completed(Redirect::Profile(actor.username.clone())))
}

/// Anyone signed in may comment on a post they can see.
pub async fn add_comment(
    state: &AppState,
    actor: &User,
    post_id: Uuid,
    form: CommentForm,
) -> Result<Redirect> {
    visible_post(state, Some(actor.id), post_id).await?;
    let text = form.validate()?;

    let comment = Comment {
        id: Uuid::now_v7(),
        text,
        author_id: actor.id,
        post_id,
        created_at: state.clock.now(),
    };
    let comment_id = comment.id;
    state.repo.create_comment(comment).await?;

    log::info!("{} commented {comment_id} on post {post_id}", actor.username);
    Ok(Redirect::PostDetail(post_id))
}

pub async fn edit_comment(
    state: &AppState,
    actor: &User,
    post_id: Uuid,
    comment_id: Uuid,
    form: CommentForm,
) -> Result<MutationOutcome> {
    let comment = load_comment(state, post_id, comment_id).await?;
    if let Decision::Deny { redirect } = authorize_mutation(&comment, actor) {
        return Ok(denied(actor, "comment", comment_id, redirect));
    }

    let text = form.validate()?;
    state.repo.update_comment(Comment { text, ..comment }).await?;

    log::info!("{} edited comment {comment_id}", actor.username);
    Ok(MutationOutcome::Completed(Redirect::PostDetail(post_id)))
}

pub async fn delete_comment(
    state: &AppState,
    actor: &User,
    post_id: Uuid,
    comment_id: Uuid,
) -> Result<MutationOutcome> {
    let comment = load_comment(state, post_id, comment_id).await?;
    if let Decision::Deny { redirect } = authorize_mutation(&comment, actor) {
        return Ok(denied(actor, "comment", comment_id, redirect));
    }

    state.repo.delete_comment(comment_id).await?;

    log::info!("{} deleted comment {comment_id}", actor.username);
    Ok(MutationOutcome::Completed(Redirect::PostDetail(post_id)))
}
