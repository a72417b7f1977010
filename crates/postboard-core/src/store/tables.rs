//! In-memory tables and the invariant checks that guard them.

use std::collections::{BTreeMap, HashMap};

use super::changes::{ChangeSet, Record, RecordKey};
use crate::error::InvariantViolation;
use crate::model::{Comment, CommentId, Post, PostId, User, UserId};

/// The three entity collections plus the unique email index.
///
/// Maps are ordered by ID, which is creation order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Tables {
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) posts: BTreeMap<PostId, Post>,
    pub(crate) comments: BTreeMap<CommentId, Comment>,
    /// email -> owning user
    pub(crate) emails: HashMap<String, UserId>,
}

impl Tables {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether `email` is free for `user` (unused, or already theirs).
    pub(crate) fn email_available(&self, email: &str, user: Option<&UserId>) -> bool {
        match self.emails.get(email) {
            Some(owner) => Some(owner) == user,
            None => true,
        }
    }

    pub(crate) fn posts_by_author<'a>(&'a self, author: &'a UserId) -> impl Iterator<Item = &'a Post> {
        self.posts.values().filter(move |post| &post.author == author)
    }

    pub(crate) fn comments_by_author<'a>(
        &'a self,
        author: &'a UserId,
    ) -> impl Iterator<Item = &'a Comment> {
        self.comments
            .values()
            .filter(move |comment| &comment.author == author)
    }

    pub(crate) fn comments_by_post<'a>(&'a self, post: &'a PostId) -> impl Iterator<Item = &'a Comment> {
        self.comments
            .values()
            .filter(move |comment| &comment.post == post)
    }

    /// Apply a change set: removals first, then writes.
    pub(crate) fn apply(&mut self, changes: &ChangeSet) {
        for key in &changes.removes {
            self.remove(key);
        }
        for record in &changes.puts {
            self.put(record.clone());
        }
    }

    pub(crate) fn put(&mut self, record: Record) {
        match record {
            Record::User(user) => {
                if let Some(previous) = self.users.get(&user.id) {
                    if previous.email != user.email {
                        self.emails.remove(&previous.email);
                    }
                }
                self.emails.insert(user.email.clone(), user.id.clone());
                self.users.insert(user.id.clone(), user);
            }
            Record::Post(post) => {
                self.posts.insert(post.id.clone(), post);
            }
            Record::Comment(comment) => {
                self.comments.insert(comment.id.clone(), comment);
            }
        }
    }

    fn remove(&mut self, key: &RecordKey) {
        match key {
            RecordKey::User(id) => {
                if let Some(user) = self.users.remove(id) {
                    self.emails.remove(&user.email);
                }
            }
            RecordKey::Post(id) => {
                self.posts.remove(id);
            }
            RecordKey::Comment(id) => {
                self.comments.remove(id);
            }
        }
    }

    /// Verify referential integrity and email uniqueness.
    pub(crate) fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for post in self.posts.values() {
            if !self.users.contains_key(&post.author) {
                return Err(InvariantViolation::DanglingPostAuthor {
                    post: post.id.clone(),
                    author: post.author.clone(),
                });
            }
        }

        for comment in self.comments.values() {
            if !self.users.contains_key(&comment.author) {
                return Err(InvariantViolation::DanglingCommentAuthor {
                    comment: comment.id.clone(),
                    author: comment.author.clone(),
                });
            }
            if !self.posts.contains_key(&comment.post) {
                return Err(InvariantViolation::DanglingCommentPost {
                    comment: comment.id.clone(),
                    post: comment.post.clone(),
                });
            }
        }

        self.check_emails()
    }

    fn check_emails(&self) -> Result<(), InvariantViolation> {
        let mut seen: HashMap<&str, &UserId> = HashMap::with_capacity(self.users.len());
        for user in self.users.values() {
            if let Some(first) = seen.insert(&user.email, &user.id) {
                return Err(InvariantViolation::DuplicateEmail {
                    email: user.email.clone(),
                    first: first.clone(),
                    second: user.id.clone(),
                });
            }
            if self.emails.get(&user.email) != Some(&user.id) {
                return Err(InvariantViolation::StaleEmailIndex {
                    email: user.email.clone(),
                });
            }
        }

        if self.emails.len() != self.users.len() {
            let stale = self
                .emails
                .keys()
                .find(|email| !seen.contains_key(email.as_str()))
                .cloned()
                .unwrap_or_default();
            return Err(InvariantViolation::StaleEmailIndex { email: stale });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> User {
        User {
            id: UserId::from(id),
            name: id.to_string(),
            email: email.to_string(),
            age: None,
        }
    }

    fn post(id: &str, author: &str) -> Post {
        Post {
            id: PostId::from(id),
            title: id.to_string(),
            body: String::new(),
            published: true,
            author: UserId::from(author),
        }
    }

    #[test]
    fn test_put_user_maintains_email_index() {
        let mut tables = Tables::new();
        tables.put(Record::User(user("u1", "a@x.io")));
        assert!(!tables.email_available("a@x.io", None));
        assert!(tables.email_available("a@x.io", Some(&UserId::from("u1"))));

        tables.put(Record::User(user("u1", "b@x.io")));
        assert!(tables.email_available("a@x.io", None));
        assert!(tables.check_invariants().is_ok());
    }

    #[test]
    fn test_dangling_post_author_detected() {
        let mut tables = Tables::new();
        tables.put(Record::Post(post("p1", "ghost")));

        assert_eq!(
            tables.check_invariants(),
            Err(InvariantViolation::DanglingPostAuthor {
                post: PostId::from("p1"),
                author: UserId::from("ghost"),
            })
        );
    }

    #[test]
    fn test_duplicate_email_detected() {
        let mut tables = Tables::new();
        tables.users.insert(UserId::from("u1"), user("u1", "same@x.io"));
        tables.users.insert(UserId::from("u2"), user("u2", "same@x.io"));
        tables
            .emails
            .insert("same@x.io".to_string(), UserId::from("u1"));

        assert!(matches!(
            tables.check_invariants(),
            Err(InvariantViolation::DuplicateEmail { .. })
        ));
    }

    #[test]
    fn test_apply_removes_before_puts() {
        let mut tables = Tables::new();
        tables.put(Record::User(user("u1", "a@x.io")));

        let changes = ChangeSet::new()
            .remove(RecordKey::User(UserId::from("u1")))
            .put(Record::User(user("u2", "a@x.io")));
        tables.apply(&changes);

        assert_eq!(tables.users.len(), 1);
        assert_eq!(tables.emails.get("a@x.io"), Some(&UserId::from("u2")));
        assert!(tables.check_invariants().is_ok());
    }
}
