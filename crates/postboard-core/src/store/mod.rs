//! Entity store: users, posts and comments with integrity-checked mutations.
//!
//! All tables sit behind one reader-writer lock. Queries take a read lock and
//! never fail. Mutations take the write lock, validate foreign keys and
//! uniqueness, then commit one [`ChangeSet`](changes::ChangeSet) (to the
//! optional sled backing first, then to memory) and publish their change
//! events before releasing the lock.

mod backing;
mod cascade;
mod changes;
mod mutation;
mod tables;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bus::{NotificationBus, SharedBus, Subscription, Topic, DEFAULT_SUBSCRIPTION_CAPACITY};
use crate::error::{InvariantViolation, NotFoundError, Result};
use crate::model::{advance_id_clock, Comment, CommentId, Post, PostId, User, UserId};

use backing::SledBacking;
use tables::Tables;

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory of the sled backing. `None` keeps everything in memory.
    pub data_path: Option<PathBuf>,

    /// Events buffered per subscriber before the oldest are dropped.
    pub subscription_capacity: usize,
}

impl StoreConfig {
    /// Purely in-memory store.
    pub fn in_memory() -> Self {
        Self {
            data_path: None,
            subscription_capacity: DEFAULT_SUBSCRIPTION_CAPACITY,
        }
    }

    /// Store persisted under `path`.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: Some(path.into()),
            ..Self::in_memory()
        }
    }

    /// Set the per-subscriber buffer depth.
    pub fn with_subscription_capacity(mut self, capacity: usize) -> Self {
        self.subscription_capacity = capacity.max(1);
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.data_path.is_some()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
}

/// The entity store.
pub struct Store {
    tables: RwLock<Tables>,
    backing: Option<SledBacking>,
    bus: SharedBus,
}

impl Store {
    /// Create an empty in-memory store publishing on `bus`.
    pub fn new(bus: SharedBus) -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
            backing: None,
            bus,
        }
    }

    /// Create an empty in-memory store with its own bus.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(NotificationBus::new()))
    }

    /// Open a store from configuration, loading persisted records if any.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let bus = Arc::new(NotificationBus::with_capacity(config.subscription_capacity));

        let Some(path) = &config.data_path else {
            return Ok(Self::new(bus));
        };

        let backing = SledBacking::open(path)?;
        let tables = backing.load()?;
        tables.check_invariants()?;

        // New ids must sort after every persisted one, even if the clock moved back
        let newest = [
            tables.users.keys().next_back().map(UserId::as_str),
            tables.posts.keys().next_back().map(PostId::as_str),
            tables.comments.keys().next_back().map(CommentId::as_str),
        ];
        for id in newest.into_iter().flatten() {
            advance_id_clock(id);
        }

        tracing::info!(
            path = %path.display(),
            users = tables.users.len(),
            posts = tables.posts.len(),
            comments = tables.comments.len(),
            "store loaded"
        );

        Ok(Self {
            tables: RwLock::new(tables),
            backing: Some(backing),
            bus,
        })
    }

    /// The bus mutations publish on.
    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }

    pub fn is_persistent(&self) -> bool {
        self.backing.is_some()
    }

    /// Flush the backing store. No-op in memory.
    pub fn flush(&self) -> Result<()> {
        match &self.backing {
            Some(backing) => backing.flush(),
            None => Ok(()),
        }
    }

    // ========== Queries ==========

    /// All users, or those whose name contains `filter` (case-insensitive).
    pub fn list_users(&self, filter: Option<&str>) -> Vec<User> {
        let tables = self.tables.read();
        match normalize_filter(filter) {
            None => tables.users.values().cloned().collect(),
            Some(needle) => tables
                .users
                .values()
                .filter(|user| contains_ignore_case(&user.name, &needle))
                .cloned()
                .collect(),
        }
    }

    /// All posts, or those whose title or body contains `filter` (case-insensitive).
    pub fn list_posts(&self, filter: Option<&str>) -> Vec<Post> {
        let tables = self.tables.read();
        match normalize_filter(filter) {
            None => tables.posts.values().cloned().collect(),
            Some(needle) => tables
                .posts
                .values()
                .filter(|post| {
                    contains_ignore_case(&post.title, &needle)
                        || contains_ignore_case(&post.body, &needle)
                })
                .cloned()
                .collect(),
        }
    }

    pub fn list_comments(&self) -> Vec<Comment> {
        self.tables.read().comments.values().cloned().collect()
    }

    pub fn posts_by_author(&self, user_id: &UserId) -> Vec<Post> {
        self.tables.read().posts_by_author(user_id).cloned().collect()
    }

    pub fn comments_by_author(&self, user_id: &UserId) -> Vec<Comment> {
        self.tables
            .read()
            .comments_by_author(user_id)
            .cloned()
            .collect()
    }

    pub fn comments_by_post(&self, post_id: &PostId) -> Vec<Comment> {
        self.tables.read().comments_by_post(post_id).cloned().collect()
    }

    pub fn user_by_id(&self, id: &UserId) -> Option<User> {
        self.tables.read().users.get(id).cloned()
    }

    pub fn post_by_id(&self, id: &PostId) -> Option<Post> {
        self.tables.read().posts.get(id).cloned()
    }

    pub fn comment_by_id(&self, id: &CommentId) -> Option<Comment> {
        self.tables.read().comments.get(id).cloned()
    }

    /// Look a user up through the unique email index.
    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let tables = self.tables.read();
        tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned()
    }

    pub fn stats(&self) -> StoreStats {
        let tables = self.tables.read();
        StoreStats {
            users: tables.users.len(),
            posts: tables.posts.len(),
            comments: tables.comments.len(),
        }
    }

    /// Re-check every referential and uniqueness invariant.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        self.tables.read().check_invariants()
    }

    // ========== Subscriptions ==========

    /// Subscribe to the lifecycle of published posts.
    pub fn subscribe_posts(&self) -> Subscription {
        self.bus.subscribe(Topic::Posts)
    }

    /// Subscribe to comment changes on a post.
    ///
    /// Fails if the post is absent or unpublished. The check is made once,
    /// here; later unpublishing does not end the subscription.
    pub fn subscribe_comments(&self, post_id: &PostId) -> Result<Subscription> {
        // Held across subscribe so the post cannot vanish in between
        let tables = self.tables.read();
        match tables.posts.get(post_id) {
            Some(post) if post.published => Ok(self.bus.subscribe(Topic::Comments(post_id.clone()))),
            _ => Err(NotFoundError::PostNotEligible(post_id.clone()).into()),
        }
    }
}

/// Shared store handle.
pub type SharedStore = Arc<Store>;

/// Lowercased filter, or `None` when absent or empty.
fn normalize_filter(filter: Option<&str>) -> Option<String> {
    filter
        .filter(|needle| !needle.is_empty())
        .map(str::to_lowercase)
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}
