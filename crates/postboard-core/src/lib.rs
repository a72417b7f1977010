//! Postboard Core - Entity store and notification bus.
//!
//! This crate provides the data layer for Postboard: a relational store of
//! users, posts and comments with foreign-key checks and cascading deletes,
//! and a topic-keyed bus that streams post and comment changes to live
//! subscribers.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod bus;
pub mod error;
pub mod model;
pub mod store;

pub use bus::{
    CancelHandle, ChangeEvent, CommentEvent, CommentMutation, NotificationBus, PostEvent,
    PostMutation, SharedBus, Subscription, Topic, DEFAULT_SUBSCRIPTION_CAPACITY,
};
pub use error::{ConflictError, Error, InvariantViolation, NotFoundError, Result};
pub use model::{
    Comment, CommentId, CreateCommentInput, CreatePostInput, CreateUserInput, Post, PostId,
    UpdateCommentInput, UpdatePostInput, UpdateUserInput, User, UserId,
};
pub use store::{SharedStore, Store, StoreConfig, StoreStats};
