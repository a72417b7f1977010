//! Postboard Server library.
//!
//! This crate wires the core store into a resolution layer: a typed context,
//! query, mutation and subscription resolvers, the nested field resolvers
//! that walk relationships, and process configuration.

pub mod config;
pub mod context;
pub mod error;
pub mod resolvers;
pub mod seed;

pub use config::{Args, ServerConfig};
pub use context::Context;
pub use error::{Error, ErrorCode, ResolverError};
pub use resolvers::{FieldResolver, MutationResolver, QueryResolver, SubscriptionResolver};
pub use seed::{load_demo_data, SeedSummary};
