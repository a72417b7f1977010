//! Nested field resolvers.
//!
//! Every reference is resolved by id at the time the field is read, never
//! cached on the parent record.

use postboard_core::{Comment, Post, Store, User};

use crate::error::ResolverError;

/// Resolves relationship fields on `User`, `Post` and `Comment`.
pub struct FieldResolver<'a> {
    store: &'a Store,
}

impl<'a> FieldResolver<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `User.posts`: every post by the user, published or not.
    pub fn user_posts(&self, user: &User) -> Vec<Post> {
        self.store.posts_by_author(&user.id)
    }

    /// `User.comments`
    pub fn user_comments(&self, user: &User) -> Vec<Comment> {
        self.store.comments_by_author(&user.id)
    }

    /// `Post.author`
    pub fn post_author(&self, post: &Post) -> Result<User, ResolverError> {
        self.store.user_by_id(&post.author).ok_or_else(|| {
            ResolverError::not_found(format!("author {} of post {} not found", post.author, post.id))
        })
    }

    /// `Post.comments`
    pub fn post_comments(&self, post: &Post) -> Vec<Comment> {
        self.store.comments_by_post(&post.id)
    }

    /// `Comment.author`
    pub fn comment_author(&self, comment: &Comment) -> Result<User, ResolverError> {
        self.store.user_by_id(&comment.author).ok_or_else(|| {
            ResolverError::not_found(format!(
                "author {} of comment {} not found",
                comment.author, comment.id
            ))
        })
    }

    /// `Comment.post`
    pub fn comment_post(&self, comment: &Comment) -> Result<Post, ResolverError> {
        self.store.post_by_id(&comment.post).ok_or_else(|| {
            ResolverError::not_found(format!(
                "post {} of comment {} not found",
                comment.post, comment.id
            ))
        })
    }
}
