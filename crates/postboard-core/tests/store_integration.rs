//! End-to-end tests for the store and its notifications.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use postboard_core::{
    CommentMutation, CreateCommentInput, CreatePostInput, CreateUserInput, PostMutation, Store,
    StoreConfig, UpdatePostInput,
};

#[tokio::test]
async fn test_update_then_delete_author_scenario() {
    let store = Store::in_memory();

    let ann = store
        .create_user(CreateUserInput::new("Ann", "ann@x.io"))
        .unwrap();
    let post = store
        .create_post(CreatePostInput::new("T", "B", true, ann.id.clone()))
        .unwrap();
    store
        .create_comment(CreateCommentInput::new("first", ann.id.clone(), post.id.clone()))
        .unwrap();

    let mut posts = store.subscribe_posts();

    store
        .update_post(&post.id, UpdatePostInput::new().with_body("B2"))
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), posts.next())
        .await
        .unwrap()
        .unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["mutation"], "UPDATED");
    assert_eq!(json["data"]["body"], "B2");
    assert_eq!(json["data"]["published"], true);
    assert_eq!(json["data"]["title"], "T");

    store.delete_user(&ann.id).unwrap();

    assert!(store.post_by_id(&post.id).is_none());
    assert!(store.comments_by_post(&post.id).is_empty());
    assert!(store.list_comments().is_empty());

    let event = posts.next().await.unwrap();
    let event = event.as_post().unwrap();
    assert_eq!(event.mutation, PostMutation::Deleted);
    assert_eq!(event.data.id, post.id);
}

#[tokio::test]
async fn test_publish_reaches_only_current_subscribers() {
    let store = Store::in_memory();
    let ann = store
        .create_user(CreateUserInput::new("Ann", "ann@x.io"))
        .unwrap();
    let post = store
        .create_post(CreatePostInput::new("T", "B", false, ann.id))
        .unwrap();

    let mut first = store.subscribe_posts();
    let mut second = store.subscribe_posts();

    store
        .update_post(&post.id, UpdatePostInput::new().with_published(true))
        .unwrap();

    let mut late = store.subscribe_posts();

    for sub in [&mut first, &mut second] {
        let event = sub.next().await.unwrap();
        assert_eq!(event.as_post().unwrap().mutation, PostMutation::Published);
        assert!(sub.try_next().is_none());
    }
    assert!(late.try_next().is_none());
}

#[tokio::test]
async fn test_cancelled_subscription_receives_nothing() {
    let store = Store::in_memory();
    let ann = store
        .create_user(CreateUserInput::new("Ann", "ann@x.io"))
        .unwrap();
    let post = store
        .create_post(CreatePostInput::new("T", "B", true, ann.id.clone()))
        .unwrap();

    let mut sub = store.subscribe_comments(&post.id).unwrap();
    sub.cancel();
    sub.cancel();

    store
        .create_comment(CreateCommentInput::new("hi", ann.id, post.id))
        .unwrap();

    assert!(sub.next().await.is_none());
    assert!(sub.is_cancelled());
}

#[tokio::test]
async fn test_comment_subscriber_in_separate_task() {
    let store = Arc::new(Store::in_memory());
    let ann = store
        .create_user(CreateUserInput::new("Ann", "ann@x.io"))
        .unwrap();
    let post = store
        .create_post(CreatePostInput::new("T", "B", true, ann.id.clone()))
        .unwrap();

    let mut sub = store.subscribe_comments(&post.id).unwrap();
    let cancel = sub.cancel_handle();
    let consumer = tokio::spawn(async move {
        let mut texts = Vec::new();
        while let Some(event) = sub.next().await {
            let event = event.as_comment().unwrap().clone();
            assert_eq!(event.mutation, CommentMutation::Created);
            texts.push(event.data.text);
            if texts.len() == 3 {
                break;
            }
        }
        texts
    });

    for text in ["a", "b", "c"] {
        store
            .create_comment(CreateCommentInput::new(text, ann.id.clone(), post.id.clone()))
            .unwrap();
    }

    let texts = tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(texts, vec!["a", "b", "c"]);
    cancel.cancel();
}

#[test]
fn test_readers_never_see_dangling_references() {
    let store = Arc::new(Store::in_memory());
    let ann = store
        .create_user(CreateUserInput::new("Ann", "ann@x.io"))
        .unwrap();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for round in 0..50 {
                let user = store
                    .create_user(CreateUserInput::new("W", format!("w{}@x.io", round)))
                    .unwrap();
                let post = store
                    .create_post(CreatePostInput::new("P", "", true, user.id.clone()))
                    .unwrap();
                store
                    .create_comment(CreateCommentInput::new("c", ann.id.clone(), post.id))
                    .unwrap();
                store.delete_user(&user.id).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    assert!(store.check_invariants().is_ok());
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(store.stats().users, 1);
    assert_eq!(store.stats().posts, 0);
    assert_eq!(store.stats().comments, 0);
}

#[test]
fn test_failed_mutations_leave_persisted_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::persistent(dir.path());

    {
        let store = Store::open(&config).unwrap();
        let ann = store
            .create_user(CreateUserInput::new("Ann", "ann@x.io"))
            .unwrap();
        let draft = store
            .create_post(CreatePostInput::new("D", "", false, ann.id.clone()))
            .unwrap();

        assert!(store
            .create_user(CreateUserInput::new("Dup", "ann@x.io"))
            .is_err());
        assert!(store
            .create_comment(CreateCommentInput::new("x", ann.id, draft.id))
            .is_err());
        store.flush().unwrap();
    }

    let store = Store::open(&config).unwrap();
    let stats = store.stats();
    assert_eq!((stats.users, stats.posts, stats.comments), (1, 1, 0));
    assert!(store.check_invariants().is_ok());
}
