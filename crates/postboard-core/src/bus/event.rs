//! Topics and change events carried by the bus.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Comment, Post, PostId};

/// A named channel on the notification bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Lifecycle of every published post (`"post"`).
    Posts,
    /// Comments on one post (`"comment:<postId>"`).
    Comments(PostId),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Posts => f.write_str("post"),
            Topic::Comments(post) => write!(f, "comment:{}", post),
        }
    }
}

/// Kind of change to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostMutation {
    Created,
    Updated,
    Published,
    Unpublished,
    Deleted,
}

/// Kind of change to a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentMutation {
    Created,
    Updated,
    Deleted,
}

/// A post change delivered on [`Topic::Posts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEvent {
    pub mutation: PostMutation,
    pub data: Post,
}

/// A comment change delivered on [`Topic::Comments`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEvent {
    pub mutation: CommentMutation,
    pub data: Comment,
}

/// Any event carried by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeEvent {
    Post(PostEvent),
    Comment(CommentEvent),
}

impl ChangeEvent {
    /// Build a post event.
    pub fn post(mutation: PostMutation, data: Post) -> Self {
        ChangeEvent::Post(PostEvent { mutation, data })
    }

    /// Build a comment event.
    pub fn comment(mutation: CommentMutation, data: Comment) -> Self {
        ChangeEvent::Comment(CommentEvent { mutation, data })
    }

    /// The topic this event belongs on.
    pub fn topic(&self) -> Topic {
        match self {
            ChangeEvent::Post(_) => Topic::Posts,
            ChangeEvent::Comment(event) => Topic::Comments(event.data.post.clone()),
        }
    }

    pub fn as_post(&self) -> Option<&PostEvent> {
        match self {
            ChangeEvent::Post(event) => Some(event),
            ChangeEvent::Comment(_) => None,
        }
    }

    pub fn as_comment(&self) -> Option<&CommentEvent> {
        match self {
            ChangeEvent::Comment(event) => Some(event),
            ChangeEvent::Post(_) => None,
        }
    }
}
