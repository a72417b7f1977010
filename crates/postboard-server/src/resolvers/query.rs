//! Query root.

use postboard_core::{Comment, Post, PostId, Store, User, UserId};

/// Resolves the read-only root fields.
pub struct QueryResolver<'a> {
    store: &'a Store,
}

impl<'a> QueryResolver<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Users whose name contains `query`, case-insensitive. All users when
    /// `query` is absent or empty.
    pub fn users(&self, query: Option<&str>) -> Vec<User> {
        self.store.list_users(query)
    }

    /// Posts whose title or body contains `query`, case-insensitive.
    pub fn posts(&self, query: Option<&str>) -> Vec<Post> {
        self.store.list_posts(query)
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.store.list_comments()
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        self.store.user_by_id(id)
    }

    pub fn post(&self, id: &PostId) -> Option<Post> {
        self.store.post_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postboard_core::{CreatePostInput, CreateUserInput};

    #[test]
    fn test_query_root() {
        let store = Store::in_memory();
        let ann = store
            .create_user(CreateUserInput::new("Ann", "ann@x.io"))
            .unwrap();
        store
            .create_user(CreateUserInput::new("Bob", "bob@x.io"))
            .unwrap();
        let draft = store
            .create_post(CreatePostInput::new("Draft", "wip", false, ann.id.clone()))
            .unwrap();

        let query = QueryResolver::new(&store);
        assert_eq!(query.users(None).len(), 2);
        assert_eq!(query.users(Some("AN")).len(), 1);
        assert_eq!(query.posts(None).len(), 1);
        assert!(query.posts(Some("nope")).is_empty());
        assert!(query.comments().is_empty());
        assert_eq!(query.user(&ann.id), Some(ann));
        assert_eq!(query.post(&draft.id), Some(draft));
        assert_eq!(query.user(&UserId::from("missing")), None);
    }
}
