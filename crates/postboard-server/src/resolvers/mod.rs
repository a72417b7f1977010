//! Resolvers for the query, mutation and subscription roots, and for the
//! nested fields that walk relationships between records.

mod fields;
mod mutation;
mod query;
mod subscription;

pub use fields::FieldResolver;
pub use mutation::MutationResolver;
pub use query::QueryResolver;
pub use subscription::SubscriptionResolver;
