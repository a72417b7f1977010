//! Notification bus for post and comment change events.
//!
//! Mutations on the [`crate::Store`] publish [`ChangeEvent`]s on a
//! [`Topic`]; each live [`Subscription`] receives the events published on its
//! topic after it subscribed, in publish order.

mod event;
mod manager;
mod subscription;

pub use event::{ChangeEvent, CommentEvent, CommentMutation, PostEvent, PostMutation, Topic};
pub use manager::{NotificationBus, SharedBus, DEFAULT_SUBSCRIPTION_CAPACITY};
pub use subscription::{CancelHandle, Subscription};
