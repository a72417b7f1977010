//! Randomized mutation sequences: invariants hold after every step and
//! rejected mutations change nothing.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use postboard_core::{
    Comment, CommentId, CreateCommentInput, CreatePostInput, CreateUserInput, Post, PostId, Store,
    UpdateCommentInput, UpdatePostInput, UpdateUserInput, User, UserId,
};

const EMAILS: &[&str] = &["a@x.io", "b@x.io", "c@x.io", "d@x.io", "e@x.io"];

#[derive(Debug, PartialEq)]
struct Snapshot {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

fn snapshot(store: &Store) -> Snapshot {
    Snapshot {
        users: store.list_users(None),
        posts: store.list_posts(None),
        comments: store.list_comments(),
    }
}

/// Pick an existing ID most of the time, otherwise an unknown one.
fn pick<T: Clone>(rng: &mut StdRng, existing: &[T], unknown: T) -> T {
    if rng.gen_bool(0.85) {
        existing.choose(rng).cloned().unwrap_or(unknown)
    } else {
        unknown
    }
}

fn run_sequence(seed: u64, steps: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let store = Store::in_memory();

    for _ in 0..steps {
        let before = snapshot(&store);
        let user_ids: Vec<UserId> = before.users.iter().map(|u| u.id.clone()).collect();
        let post_ids: Vec<PostId> = before.posts.iter().map(|p| p.id.clone()).collect();
        let comment_ids: Vec<CommentId> = before.comments.iter().map(|c| c.id.clone()).collect();
        let ghost_user = UserId::from("ghost-user");
        let ghost_post = PostId::from("ghost-post");
        let ghost_comment = CommentId::from("ghost-comment");

        let result = match rng.gen_range(0..9) {
            0 => store
                .create_user(CreateUserInput::new("u", *EMAILS.choose(&mut rng).unwrap()))
                .map(drop),
            1 => {
                let id = pick(&mut rng, &user_ids, ghost_user);
                let mut input = UpdateUserInput::new();
                if rng.gen_bool(0.5) {
                    input = input.with_email(*EMAILS.choose(&mut rng).unwrap());
                }
                if rng.gen_bool(0.5) {
                    input = input.with_age(Some(rng.gen_range(1..99)));
                }
                store.update_user(&id, input).map(drop)
            }
            2 => {
                let id = pick(&mut rng, &user_ids, ghost_user);
                let expected = expected_user_cascade(&before, &id);
                let result = store.delete_user(&id).map(drop);
                if result.is_ok() {
                    assert_user_cascade(&before, &snapshot(&store), &id, expected);
                }
                result
            }
            3 => {
                let author = pick(&mut rng, &user_ids, ghost_user);
                store
                    .create_post(CreatePostInput::new("t", "b", rng.gen_bool(0.6), author))
                    .map(drop)
            }
            4 => {
                let id = pick(&mut rng, &post_ids, ghost_post);
                let mut input = UpdatePostInput::new().with_body("changed");
                if rng.gen_bool(0.5) {
                    input = input.with_published(rng.gen_bool(0.5));
                }
                store.update_post(&id, input).map(drop)
            }
            5 => {
                let id = pick(&mut rng, &post_ids, ghost_post);
                store.delete_post(&id).map(drop)
            }
            6 => {
                let author = pick(&mut rng, &user_ids, ghost_user);
                let post = pick(&mut rng, &post_ids, ghost_post);
                store
                    .create_comment(CreateCommentInput::new("c", author, post))
                    .map(drop)
            }
            7 => {
                let id = pick(&mut rng, &comment_ids, ghost_comment);
                store
                    .update_comment(&id, UpdateCommentInput::new().with_text("edited"))
                    .map(drop)
            }
            _ => {
                let id = pick(&mut rng, &comment_ids, ghost_comment);
                store.delete_comment(&id).map(drop)
            }
        };

        if let Err(err) = result {
            assert!(err.is_not_found() || err.is_conflict(), "unexpected error: {}", err);
            assert_eq!(snapshot(&store), before, "failed mutation changed state: {}", err);
        }
        store
            .check_invariants()
            .unwrap_or_else(|violation| panic!("seed {}: {}", seed, violation));
    }
}

struct ExpectedCascade {
    posts: HashSet<PostId>,
    comments: HashSet<CommentId>,
}

fn expected_user_cascade(before: &Snapshot, user: &UserId) -> ExpectedCascade {
    let posts: HashSet<PostId> = before
        .posts
        .iter()
        .filter(|p| &p.author == user)
        .map(|p| p.id.clone())
        .collect();
    let comments = before
        .comments
        .iter()
        .filter(|c| &c.author == user || posts.contains(&c.post))
        .map(|c| c.id.clone())
        .collect();
    ExpectedCascade { posts, comments }
}

fn assert_user_cascade(before: &Snapshot, after: &Snapshot, user: &UserId, expected: ExpectedCascade) {
    let remaining_users: Vec<_> = before.users.iter().filter(|u| &u.id != user).cloned().collect();
    let remaining_posts: Vec<_> = before
        .posts
        .iter()
        .filter(|p| !expected.posts.contains(&p.id))
        .cloned()
        .collect();
    let remaining_comments: Vec<_> = before
        .comments
        .iter()
        .filter(|c| !expected.comments.contains(&c.id))
        .cloned()
        .collect();

    assert_eq!(after.users, remaining_users);
    assert_eq!(after.posts, remaining_posts);
    assert_eq!(after.comments, remaining_comments);
}

#[test]
fn test_random_sequences_preserve_invariants() {
    for seed in 0..25 {
        run_sequence(seed, 300);
    }
}
