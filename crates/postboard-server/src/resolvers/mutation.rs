//! Mutation root.

use postboard_core::{
    Comment, CommentId, CreateCommentInput, CreatePostInput, CreateUserInput, Post, PostId, Store,
    UpdateCommentInput, UpdatePostInput, UpdateUserInput, User, UserId,
};

use crate::error::ResolverError;

/// Resolves the mutation root fields.
///
/// Each call maps straight onto one store mutation; store errors are
/// translated into [`ResolverError`] codes.
pub struct MutationResolver<'a> {
    store: &'a Store,
}

impl<'a> MutationResolver<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn create_user(&self, data: CreateUserInput) -> Result<User, ResolverError> {
        Ok(self.store.create_user(data)?)
    }

    pub fn update_user(&self, id: &UserId, data: UpdateUserInput) -> Result<User, ResolverError> {
        Ok(self.store.update_user(id, data)?)
    }

    pub fn delete_user(&self, id: &UserId) -> Result<User, ResolverError> {
        Ok(self.store.delete_user(id)?)
    }

    pub fn create_post(&self, data: CreatePostInput) -> Result<Post, ResolverError> {
        Ok(self.store.create_post(data)?)
    }

    pub fn update_post(&self, id: &PostId, data: UpdatePostInput) -> Result<Post, ResolverError> {
        Ok(self.store.update_post(id, data)?)
    }

    pub fn delete_post(&self, id: &PostId) -> Result<Post, ResolverError> {
        Ok(self.store.delete_post(id)?)
    }

    pub fn create_comment(&self, data: CreateCommentInput) -> Result<Comment, ResolverError> {
        Ok(self.store.create_comment(data)?)
    }

    pub fn update_comment(
        &self,
        id: &CommentId,
        data: UpdateCommentInput,
    ) -> Result<Comment, ResolverError> {
        Ok(self.store.update_comment(id, data)?)
    }

    pub fn delete_comment(&self, id: &CommentId) -> Result<Comment, ResolverError> {
        Ok(self.store.delete_comment(id)?)
    }
}
