//! Demo dataset.

use postboard_core::{CreateCommentInput, CreatePostInput, CreateUserInput, Store};

use crate::error::Error;

struct DemoUser {
    name: &'static str,
    email: &'static str,
    age: Option<i32>,
}

struct DemoPost {
    title: &'static str,
    body: &'static str,
    published: bool,
    author: usize,
}

struct DemoComment {
    text: &'static str,
    author: usize,
    post: usize,
}

const USERS: &[DemoUser] = &[
    DemoUser {
        name: "Davide",
        email: "davide@example.com",
        age: Some(27),
    },
    DemoUser {
        name: "Michele",
        email: "michele@example.com",
        age: None,
    },
    DemoUser {
        name: "Tiziano",
        email: "tiziano@example.com",
        age: None,
    },
];

const POSTS: &[DemoPost] = &[
    DemoPost {
        title: "GraphQL 101",
        body: "This is how to use GraphQL...",
        published: true,
        author: 0,
    },
    DemoPost {
        title: "GraphQL 201",
        body: "This is an advanced GraphQL post...",
        published: false,
        author: 0,
    },
    DemoPost {
        title: "Programming Music",
        body: "",
        published: false,
        author: 1,
    },
];

const COMMENTS: &[DemoComment] = &[
    DemoComment {
        text: "This worked well for me. Thanks!",
        author: 0,
        post: 0,
    },
    DemoComment {
        text: "Glad you enjoyed it.",
        author: 0,
        post: 0,
    },
    DemoComment {
        text: "This did no work.",
        author: 1,
        post: 1,
    },
    DemoComment {
        text: "Nevermind. I got it to work.",
        author: 2,
        post: 2,
    },
];

/// Counts of records created by [`load_demo_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
    /// Comments left out because their post is unpublished.
    pub skipped_comments: usize,
}

/// Load the demo users, posts and comments through the regular mutation
/// path, so every record satisfies the store's rules.
pub fn load_demo_data(store: &Store) -> Result<SeedSummary, Error> {
    let mut summary = SeedSummary::default();

    let mut users = Vec::with_capacity(USERS.len());
    for demo in USERS {
        let mut input = CreateUserInput::new(demo.name, demo.email);
        if let Some(age) = demo.age {
            input = input.with_age(age);
        }
        users.push(store.create_user(input)?);
        summary.users += 1;
    }

    let mut posts = Vec::with_capacity(POSTS.len());
    for demo in POSTS {
        let author = users[demo.author].id.clone();
        posts.push(store.create_post(CreatePostInput::new(
            demo.title,
            demo.body,
            demo.published,
            author,
        ))?);
        summary.posts += 1;
    }

    for demo in COMMENTS {
        let post = &posts[demo.post];
        if !post.published {
            tracing::debug!(post_id = %post.id, "skipping demo comment on unpublished post");
            summary.skipped_comments += 1;
            continue;
        }
        store.create_comment(CreateCommentInput::new(
            demo.text,
            users[demo.author].id.clone(),
            post.id.clone(),
        ))?;
        summary.comments += 1;
    }

    tracing::info!(
        users = summary.users,
        posts = summary.posts,
        comments = summary.comments,
        "demo data loaded"
    );

    Ok(summary)
}
