//! Core error types.

use thiserror::Error;

use crate::model::{CommentId, PostId, UserId};

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core store errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced entity is absent or not eligible for the operation.
    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// A uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),

    /// Backing storage error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization error in the backing store.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Persisted data does not satisfy the store invariants.
    #[error("corrupt data: {0}")]
    Corrupt(#[from] InvariantViolation),
}

impl Error {
    /// Whether this error reports a missing or ineligible entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether this error reports a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Missing-entity errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    /// No user with this ID.
    #[error("user {0} not found")]
    User(UserId),

    /// No post with this ID.
    #[error("post {0} not found")]
    Post(PostId),

    /// No comment with this ID.
    #[error("comment {0} not found")]
    Comment(CommentId),

    /// The post is absent or unpublished, so it cannot be commented on or watched.
    #[error("post {0} not found or not published")]
    PostNotEligible(PostId),
}

/// Uniqueness violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    /// Another user already owns this email.
    #[error("email {0} already in use")]
    EmailTaken(String),
}

/// A broken store invariant, reported by [`crate::Store::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A post references a user that does not exist.
    #[error("post {post} references missing author {author}")]
    DanglingPostAuthor { post: PostId, author: UserId },

    /// A comment references a user that does not exist.
    #[error("comment {comment} references missing author {author}")]
    DanglingCommentAuthor { comment: CommentId, author: UserId },

    /// A comment references a post that does not exist.
    #[error("comment {comment} references missing post {post}")]
    DanglingCommentPost { comment: CommentId, post: PostId },

    /// Two users share an email.
    #[error("email {email} shared by users {first} and {second}")]
    DuplicateEmail {
        email: String,
        first: UserId,
        second: UserId,
    },

    /// The email index disagrees with the user table.
    #[error("email index entry {email} is stale")]
    StaleEmailIndex { email: String },

    /// A record is stored under a key that does not match its ID.
    #[error("record key {key} does not match its id")]
    MismatchedKey { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err: Error = NotFoundError::User(UserId::from("u1")).into();
        assert!(err.is_not_found());
        assert!(!err.is_conflict());

        let err: Error = ConflictError::EmailTaken("a@b.c".to_string()).into();
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "conflict: email a@b.c already in use");
    }

    #[test]
    fn test_post_not_eligible_is_not_found() {
        let err: Error = NotFoundError::PostNotEligible(PostId::from("p1")).into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: post p1 not found or not published");
    }
}
