//! Cascade planning for delete operations.
//!
//! Deleting a user removes their posts, their comments, and every comment on
//! a removed post. Deleting a post removes its comments. The planner only
//! reads the tables; the resulting plan is committed as one change set.

use std::collections::BTreeMap;

use super::changes::{ChangeSet, RecordKey};
use super::tables::Tables;
use crate::bus::{ChangeEvent, CommentMutation, PostMutation};
use crate::error::{NotFoundError, Result};
use crate::model::{Comment, CommentId, Post, PostId, User, UserId};

/// Everything a delete will remove.
#[derive(Debug, Default, Clone)]
pub(crate) struct CascadePlan {
    pub(crate) users: Vec<User>,
    pub(crate) posts: Vec<Post>,
    pub(crate) comments: BTreeMap<CommentId, Comment>,
}

impl CascadePlan {
    /// Total number of records removed.
    pub(crate) fn affected_count(&self) -> usize {
        self.users.len() + self.posts.len() + self.comments.len()
    }

    pub(crate) fn to_changes(&self) -> ChangeSet {
        let mut changes = ChangeSet::new();
        for id in self.comments.keys() {
            changes = changes.remove(RecordKey::Comment(id.clone()));
        }
        for post in &self.posts {
            changes = changes.remove(RecordKey::Post(post.id.clone()));
        }
        for user in &self.users {
            changes = changes.remove(RecordKey::User(user.id.clone()));
        }
        changes
    }

    /// Notifications for the removal: comment deletions first, then
    /// deletions of published posts.
    pub(crate) fn events(&self) -> Vec<ChangeEvent> {
        let comments = self
            .comments
            .values()
            .map(|comment| ChangeEvent::comment(CommentMutation::Deleted, comment.clone()));
        let posts = self
            .posts
            .iter()
            .filter(|post| post.published)
            .map(|post| ChangeEvent::post(PostMutation::Deleted, post.clone()));
        comments.chain(posts).collect()
    }
}

/// Computes cascade plans against a snapshot of the tables.
pub(crate) struct CascadePlanner<'a> {
    tables: &'a Tables,
}

impl<'a> CascadePlanner<'a> {
    pub(crate) fn new(tables: &'a Tables) -> Self {
        Self { tables }
    }

    /// Plan the removal of a user and everything that depends on it.
    pub(crate) fn plan_user_delete(&self, id: &UserId) -> Result<(User, CascadePlan)> {
        let user = self
            .tables
            .users
            .get(id)
            .ok_or_else(|| NotFoundError::User(id.clone()))?;

        let mut plan = CascadePlan::default();
        for post in self.tables.posts_by_author(id) {
            self.collect_post(post, &mut plan);
        }
        for comment in self.tables.comments_by_author(id) {
            plan.comments
                .entry(comment.id.clone())
                .or_insert_with(|| comment.clone());
        }
        plan.users.push(user.clone());

        Ok((user.clone(), plan))
    }

    /// Plan the removal of a post and its comments.
    pub(crate) fn plan_post_delete(&self, id: &PostId) -> Result<(Post, CascadePlan)> {
        let post = self
            .tables
            .posts
            .get(id)
            .ok_or_else(|| NotFoundError::Post(id.clone()))?;

        let mut plan = CascadePlan::default();
        self.collect_post(post, &mut plan);
        Ok((post.clone(), plan))
    }

    fn collect_post(&self, post: &Post, plan: &mut CascadePlan) {
        for comment in self.tables.comments_by_post(&post.id) {
            plan.comments
                .entry(comment.id.clone())
                .or_insert_with(|| comment.clone());
        }
        plan.posts.push(post.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::changes::Record;

    fn fixture() -> Tables {
        let mut tables = Tables::new();
        for (id, email) in [("u1", "a@x.io"), ("u2", "b@x.io")] {
            tables.put(Record::User(User {
                id: UserId::from(id),
                name: id.to_string(),
                email: email.to_string(),
                age: None,
            }));
        }
        for (id, author, published) in [("p1", "u1", true), ("p2", "u1", false), ("p3", "u2", true)] {
            tables.put(Record::Post(Post {
                id: PostId::from(id),
                title: id.to_string(),
                body: String::new(),
                published,
                author: UserId::from(author),
            }));
        }
        // c1: u2 on p1 (removed via post), c2: u1 on p3 (removed via author),
        // c3: u2 on p3 (survives)
        for (id, author, post) in [("c1", "u2", "p1"), ("c2", "u1", "p3"), ("c3", "u2", "p3")] {
            tables.put(Record::Comment(Comment {
                id: CommentId::from(id),
                text: id.to_string(),
                author: UserId::from(author),
                post: PostId::from(post),
            }));
        }
        tables
    }

    #[test]
    fn test_user_delete_cascades_posts_and_comments() {
        let tables = fixture();
        let (user, plan) = CascadePlanner::new(&tables)
            .plan_user_delete(&UserId::from("u1"))
            .unwrap();
        assert_eq!(user.id, UserId::from("u1"));

        let posts: Vec<_> = plan.posts.iter().map(|p| p.id.as_str()).collect();
        let comments: Vec<_> = plan.comments.keys().map(|c| c.as_str()).collect();
        assert_eq!(posts, vec!["p1", "p2"]);
        assert_eq!(comments, vec!["c1", "c2"]);
        assert_eq!(plan.affected_count(), 5);

        let mut after = tables.clone();
        after.apply(&plan.to_changes());
        assert!(after.check_invariants().is_ok());
        assert_eq!(after.comments.len(), 1);
        assert_eq!(after.posts.len(), 1);
    }

    #[test]
    fn test_user_delete_events_skip_unpublished_posts() {
        let tables = fixture();
        let (_, plan) = CascadePlanner::new(&tables)
            .plan_user_delete(&UserId::from("u1"))
            .unwrap();

        let events = plan.events();
        assert_eq!(events.len(), 3);
        assert!(events[0].as_comment().is_some());
        assert!(events[1].as_comment().is_some());
        let post = events[2].as_post().unwrap();
        assert_eq!(post.mutation, PostMutation::Deleted);
        assert_eq!(post.data.id, PostId::from("p1"));
    }

    #[test]
    fn test_post_delete_cascades_comments() {
        let tables = fixture();
        let (post, plan) = CascadePlanner::new(&tables)
            .plan_post_delete(&PostId::from("p3"))
            .unwrap();
        assert_eq!(post.id, PostId::from("p3"));

        assert_eq!(plan.posts.len(), 1);
        assert_eq!(plan.comments.len(), 2);
        assert!(plan.users.is_empty());
    }

    #[test]
    fn test_missing_targets() {
        let tables = fixture();
        let planner = CascadePlanner::new(&tables);

        assert!(planner.plan_user_delete(&UserId::from("nope")).is_err());
        assert!(planner.plan_post_delete(&PostId::from("nope")).is_err());
    }
}
