//! Entity records, identifiers and mutation inputs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, never-reused identifier.
            pub(crate) fn generate() -> Self {
                Self(generate_id())
            }

            /// Borrow the identifier as a string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`User`].
    UserId
);
entity_id!(
    /// Identifier of a [`Post`].
    PostId
);
entity_id!(
    /// Identifier of a [`Comment`].
    CommentId
);

/// Timestamp of the most recently issued or loaded identifier.
static ID_CLOCK: AtomicU64 = AtomicU64::new(0);

/// Generate a 32-character hex identifier.
///
/// The first 8 bytes are a big-endian timestamp in nanoseconds and the last
/// 8 a process-wide counter. The timestamp never goes backwards: if the wall
/// clock is behind the last issued (or loaded, see [`advance_id_clock`])
/// identifier, it continues from there, so identifiers sort in creation order.
fn generate_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();

    let mut last = ID_CLOCK.load(Ordering::SeqCst);
    let timestamp = loop {
        let next = now.max(last.saturating_add(1));
        match ID_CLOCK.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => break next,
            Err(actual) => last = actual,
        }
    };
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);

    let mut id = [0u8; 16];
    id[..8].copy_from_slice(&timestamp.to_be_bytes());
    id[8..].copy_from_slice(&counter.to_be_bytes());
    hex::encode(id)
}

/// Make later identifiers sort after `id`, which was loaded from storage.
///
/// Identifiers not produced by the generator are ignored.
pub(crate) fn advance_id_clock(id: &str) {
    let timestamp = id
        .get(..16)
        .filter(|_| id.len() == 32)
        .and_then(|prefix| u64::from_str_radix(prefix, 16).ok());
    if let Some(timestamp) = timestamp {
        ID_CLOCK.fetch_max(timestamp, Ordering::SeqCst);
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
}

/// A post written by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub author: UserId,
}

/// A comment left by a user on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: UserId,
    pub post: PostId,
}

/// Deserialize a present field as `Some`, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Arguments for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<i32>,
}

impl CreateUserInput {
    /// Create input with the required fields.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age: None,
        }
    }

    /// Set the age.
    pub fn with_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }
}

/// Partial update of a user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// `Some(None)` clears the age.
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Option<i32>>,
}

impl UpdateUserInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_age(mut self, age: Option<i32>) -> Self {
        self.age = Some(age);
        self
    }
}

/// Arguments for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub body: String,
    pub published: bool,
    pub author: UserId,
}

impl CreatePostInput {
    /// Create input for a post by `author`.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        published: bool,
        author: UserId,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            published,
            author,
        }
    }
}

/// Partial update of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePostInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

impl UpdatePostInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }
}

/// Arguments for creating a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommentInput {
    pub text: String,
    pub author: UserId,
    pub post: PostId,
}

impl CreateCommentInput {
    pub fn new(text: impl Into<String>, author: UserId, post: PostId) -> Self {
        Self {
            text: text.into(),
            author,
            post,
        }
    }
}

/// Partial update of a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCommentInput {
    #[serde(default)]
    pub text: Option<String>,
}

impl UpdateCommentInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}
