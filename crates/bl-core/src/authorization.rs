//! # Authorization Policy
//!
//! Only the author may edit or delete a post or comment. There is no
//! staff override here; the admin surface authorizes on its own.
//!
//! A denial is a navigation decision, not a failure: the actor is sent to
//! the public page of the resource.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Comment, Post, User};

/// A navigational target for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Redirect {
    Index,
    PostDetail(Uuid),
    Category(String),
    Profile(String),
}

impl Redirect {
    pub fn path(&self) -> String {
        match self {
            Redirect::Index => "/".to_string(),
            Redirect::PostDetail(id) => format!("/posts/{id}/"),
            Redirect::Category(slug) => format!("/category/{slug}/"),
            Redirect::Profile(username) => format!("/profile/{username}/"),
        }
    }
}

/// Anything with a single owning author and a public page.
pub trait Authored {
    fn author_id(&self) -> Uuid;
    fn public_view(&self) -> Redirect;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }

    fn public_view(&self) -> Redirect {
        Redirect::PostDetail(self.id)
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }

    /// Comments have no page of their own.
    fn public_view(&self) -> Redirect {
        Redirect::PostDetail(self.post_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allow,
    Deny { redirect: Redirect },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Allows the mutation iff `actor` wrote `resource`.
pub fn authorize_mutation<R: Authored + ?Sized>(resource: &R, actor: &User) -> Decision {
    if resource.author_id() == actor.id {
        Decision::Allow
    } else {
        Decision::Deny {
            redirect: resource.public_view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str) -> User {
        User {
            id: Uuid::now_v7(),
            username: name.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: format!("{name}@example.com"),
            created_at: Utc::now(),
        }
    }

    fn post_by(author: &User) -> Post {
        Post {
            id: Uuid::now_v7(),
            title: "t".into(),
            text: "x".into(),
            pub_date: Utc::now(),
            is_published: false,
            created_at: Utc::now(),
            author_id: author.id,
            category_id: None,
            location_id: None,
            image: None,
        }
    }

    #[test]
    fn author_may_mutate_own_post() {
        let alice = user("alice");
        assert_eq!(authorize_mutation(&post_by(&alice), &alice), Decision::Allow);
    }

    #[test]
    fn others_are_sent_to_the_post_page() {
        let alice = user("alice");
        let bob = user("bob");
        let post = post_by(&alice);

        let decision = authorize_mutation(&post, &bob);
        assert_eq!(
            decision,
            Decision::Deny {
                redirect: Redirect::PostDetail(post.id)
            }
        );
        assert!(!decision.is_allowed());
    }

    #[test]
    fn comment_denial_points_at_its_post() {
        let alice = user("alice");
        let bob = user("bob");
        let post = post_by(&alice);
        let comment = Comment {
            id: Uuid::now_v7(),
            text: "nice".into(),
            author_id: bob.id,
            post_id: post.id,
            created_at: Utc::now(),
        };

        assert!(authorize_mutation(&comment, &bob).is_allowed());
        // Owning the post grants nothing over its comments.
        assert_eq!(
            authorize_mutation(&comment, &alice),
            Decision::Deny {
                redirect: Redirect::PostDetail(post.id)
            }
        );
    }

    #[test]
    fn same_username_different_identity_is_denied() {
        let alice = user("alice");
        let impostor = user("alice");
        assert!(!authorize_mutation(&post_by(&alice), &impostor).is_allowed());
    }

    #[test]
    fn redirect_paths() {
        let id = Uuid::nil();
        assert_eq!(Redirect::Index.path(), "/");
        assert_eq!(
            Redirect::PostDetail(id).path(),
            "/posts/00000000-0000-0000-0000-000000000000/"
        );
        assert_eq!(Redirect::Category("news".into()).path(), "/category/news/");
        assert_eq!(Redirect::Profile("alice".into()).path(), "/profile/alice/");
    }
}
