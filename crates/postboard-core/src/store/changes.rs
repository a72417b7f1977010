//! Change sets: the unit of commit for every mutation.

use crate::error::{Error, Result};
use crate::model::{Comment, CommentId, Post, PostId, User, UserId};

const USER_PREFIX: &str = "user/";
const POST_PREFIX: &str = "post/";
const COMMENT_PREFIX: &str = "comment/";

/// Key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum RecordKey {
    User(UserId),
    Post(PostId),
    Comment(CommentId),
}

impl RecordKey {
    /// Encode as `user/<id>`, `post/<id>` or `comment/<id>`.
    pub(crate) fn encode(&self) -> Vec<u8> {
        match self {
            RecordKey::User(id) => format!("{}{}", USER_PREFIX, id),
            RecordKey::Post(id) => format!("{}{}", POST_PREFIX, id),
            RecordKey::Comment(id) => format!("{}{}", COMMENT_PREFIX, id),
        }
        .into_bytes()
    }

    pub(crate) fn decode(bytes: &[u8]) -> Option<Self> {
        let key = std::str::from_utf8(bytes).ok()?;
        if let Some(id) = key.strip_prefix(USER_PREFIX) {
            Some(RecordKey::User(UserId::from(id)))
        } else if let Some(id) = key.strip_prefix(POST_PREFIX) {
            Some(RecordKey::Post(PostId::from(id)))
        } else {
            key.strip_prefix(COMMENT_PREFIX)
                .map(|id| RecordKey::Comment(CommentId::from(id)))
        }
    }
}

/// A full record to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Record {
    User(User),
    Post(Post),
    Comment(Comment),
}

impl Record {
    pub(crate) fn key(&self) -> RecordKey {
        match self {
            Record::User(user) => RecordKey::User(user.id.clone()),
            Record::Post(post) => RecordKey::Post(post.id.clone()),
            Record::Comment(comment) => RecordKey::Comment(comment.id.clone()),
        }
    }

    /// Serialize the record body (the key carries the kind).
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            Record::User(user) => serde_json::to_vec(user)?,
            Record::Post(post) => serde_json::to_vec(post)?,
            Record::Comment(comment) => serde_json::to_vec(comment)?,
        };
        Ok(bytes)
    }

    /// Decode a record body stored under `key`.
    pub(crate) fn from_bytes(key: &RecordKey, bytes: &[u8]) -> Result<Self> {
        let record = match key {
            RecordKey::User(_) => Record::User(serde_json::from_slice(bytes)?),
            RecordKey::Post(_) => Record::Post(serde_json::from_slice(bytes)?),
            RecordKey::Comment(_) => Record::Comment(serde_json::from_slice(bytes)?),
        };
        if &record.key() != key {
            return Err(Error::Serialization(format!(
                "record stored under {} carries a different id",
                String::from_utf8_lossy(&key.encode())
            )));
        }
        Ok(record)
    }
}

/// Records to remove and records to write, applied together.
///
/// Removals are applied before writes.
#[derive(Debug, Default, Clone)]
pub(crate) struct ChangeSet {
    pub(crate) removes: Vec<RecordKey>,
    pub(crate) puts: Vec<Record>,
}

impl ChangeSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put(mut self, record: Record) -> Self {
        self.puts.push(record);
        self
    }

    pub(crate) fn remove(mut self, key: RecordKey) -> Self {
        self.removes.push(key);
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.removes.len() + self.puts.len()
    }
}
