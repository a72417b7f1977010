//! Mutation operations on the store.

use super::cascade::CascadePlanner;
use super::changes::{ChangeSet, Record, RecordKey};
use super::tables::Tables;
use super::Store;
use crate::bus::{ChangeEvent, CommentMutation, PostMutation};
use crate::error::{ConflictError, NotFoundError, Result};
use crate::model::{
    Comment, CommentId, CreateCommentInput, CreatePostInput, CreateUserInput, Post, PostId,
    UpdateCommentInput, UpdatePostInput, UpdateUserInput, User, UserId,
};

impl Store {
    // ========== Users ==========

    /// Create a user. Fails if the email is already in use.
    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let mut tables = self.tables.write();

        if !tables.email_available(&input.email, None) {
            return Err(ConflictError::EmailTaken(input.email).into());
        }

        let user = User {
            id: UserId::generate(),
            name: input.name,
            email: input.email,
            age: input.age,
        };

        self.commit(&mut tables, ChangeSet::new().put(Record::User(user.clone())), Vec::new())?;
        tracing::debug!(user_id = %user.id, "user created");

        Ok(user)
    }

    /// Apply the supplied fields to a user.
    pub fn update_user(&self, id: &UserId, input: UpdateUserInput) -> Result<User> {
        let mut tables = self.tables.write();

        let mut user = tables
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::User(id.clone()))?;

        if let Some(email) = input.email {
            if !tables.email_available(&email, Some(id)) {
                return Err(ConflictError::EmailTaken(email).into());
            }
            user.email = email;
        }
        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(age) = input.age {
            user.age = age;
        }

        self.commit(&mut tables, ChangeSet::new().put(Record::User(user.clone())), Vec::new())?;
        tracing::debug!(user_id = %user.id, "user updated");

        Ok(user)
    }

    /// Delete a user with their posts and every affected comment.
    ///
    /// Returns the removed user.
    pub fn delete_user(&self, id: &UserId) -> Result<User> {
        let mut tables = self.tables.write();

        let (user, plan) = CascadePlanner::new(&tables).plan_user_delete(id)?;
        self.commit(&mut tables, plan.to_changes(), plan.events())?;

        tracing::debug!(
            user_id = %user.id,
            posts = plan.posts.len(),
            comments = plan.comments.len(),
            affected = plan.affected_count(),
            "user deleted"
        );

        Ok(user)
    }

    // ========== Posts ==========

    /// Create a post by an existing user.
    ///
    /// Published posts are announced as `CREATED` on the post topic.
    pub fn create_post(&self, input: CreatePostInput) -> Result<Post> {
        let mut tables = self.tables.write();

        if !tables.users.contains_key(&input.author) {
            return Err(NotFoundError::User(input.author).into());
        }

        let post = Post {
            id: PostId::generate(),
            title: input.title,
            body: input.body,
            published: input.published,
            author: input.author,
        };

        let events = if post.published {
            vec![ChangeEvent::post(PostMutation::Created, post.clone())]
        } else {
            Vec::new()
        };

        self.commit(&mut tables, ChangeSet::new().put(Record::Post(post.clone())), events)?;
        tracing::debug!(post_id = %post.id, author = %post.author, published = post.published, "post created");

        Ok(post)
    }

    /// Apply the supplied fields to a post.
    ///
    /// Announces `PUBLISHED` or `UNPUBLISHED` when the flag flips, `UPDATED`
    /// when a published post changes otherwise, and nothing for a draft or
    /// an update that changes no field.
    pub fn update_post(&self, id: &PostId, input: UpdatePostInput) -> Result<Post> {
        let mut tables = self.tables.write();

        let original = tables
            .posts
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::Post(id.clone()))?;

        let mut post = original.clone();
        if let Some(title) = input.title {
            post.title = title;
        }
        if let Some(body) = input.body {
            post.body = body;
        }
        if let Some(published) = input.published {
            post.published = published;
        }

        let mutation = match (original.published, post.published) {
            (false, true) => Some(PostMutation::Published),
            (true, false) => Some(PostMutation::Unpublished),
            (true, true) if post != original => Some(PostMutation::Updated),
            _ => None,
        };
        let events = mutation
            .map(|mutation| ChangeEvent::post(mutation, post.clone()))
            .into_iter()
            .collect();

        self.commit(&mut tables, ChangeSet::new().put(Record::Post(post.clone())), events)?;
        tracing::debug!(post_id = %post.id, mutation = ?mutation, "post updated");

        Ok(post)
    }

    /// Delete a post and its comments.
    ///
    /// A published post is announced as `DELETED`; a draft is removed silently.
    pub fn delete_post(&self, id: &PostId) -> Result<Post> {
        let mut tables = self.tables.write();

        let (post, plan) = CascadePlanner::new(&tables).plan_post_delete(id)?;
        self.commit(&mut tables, plan.to_changes(), plan.events())?;

        tracing::debug!(post_id = %post.id, comments = plan.comments.len(), "post deleted");

        Ok(post)
    }

    // ========== Comments ==========

    /// Comment on a published post.
    pub fn create_comment(&self, input: CreateCommentInput) -> Result<Comment> {
        let mut tables = self.tables.write();

        if !tables.users.contains_key(&input.author) {
            return Err(NotFoundError::User(input.author).into());
        }
        if !tables.posts.get(&input.post).is_some_and(|post| post.published) {
            return Err(NotFoundError::PostNotEligible(input.post).into());
        }

        let comment = Comment {
            id: CommentId::generate(),
            text: input.text,
            author: input.author,
            post: input.post,
        };

        let events = vec![ChangeEvent::comment(CommentMutation::Created, comment.clone())];
        self.commit(&mut tables, ChangeSet::new().put(Record::Comment(comment.clone())), events)?;
        tracing::debug!(comment_id = %comment.id, post_id = %comment.post, "comment created");

        Ok(comment)
    }

    /// Apply the supplied fields to a comment.
    pub fn update_comment(&self, id: &CommentId, input: UpdateCommentInput) -> Result<Comment> {
        let mut tables = self.tables.write();

        let mut comment = tables
            .comments
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::Comment(id.clone()))?;

        if let Some(text) = input.text {
            comment.text = text;
        }

        let events = vec![ChangeEvent::comment(CommentMutation::Updated, comment.clone())];
        self.commit(&mut tables, ChangeSet::new().put(Record::Comment(comment.clone())), events)?;
        tracing::debug!(comment_id = %comment.id, "comment updated");

        Ok(comment)
    }

    /// Delete a comment.
    pub fn delete_comment(&self, id: &CommentId) -> Result<Comment> {
        let mut tables = self.tables.write();

        let comment = tables
            .comments
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::Comment(id.clone()))?;

        let events = vec![ChangeEvent::comment(CommentMutation::Deleted, comment.clone())];
        self.commit(
            &mut tables,
            ChangeSet::new().remove(RecordKey::Comment(comment.id.clone())),
            events,
        )?;
        tracing::debug!(comment_id = %comment.id, post_id = %comment.post, "comment deleted");

        Ok(comment)
    }

    /// Commit a validated change set, then announce it.
    ///
    /// The backing store is written first; if that fails the tables are left
    /// untouched and nothing is published.
    fn commit(&self, tables: &mut Tables, changes: ChangeSet, events: Vec<ChangeEvent>) -> Result<()> {
        if let Some(backing) = &self.backing {
            backing.commit(&changes)?;
        }

        tables.apply(&changes);
        debug_assert_eq!(tables.check_invariants(), Ok(()));
        tracing::trace!(records = changes.len(), events = events.len(), "change set committed");

        for event in events {
            self.bus.publish_event(event);
        }

        Ok(())
    }
}
