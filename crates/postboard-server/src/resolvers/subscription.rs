//! Subscription root.

use postboard_core::{PostId, Store, Subscription};

use crate::error::ResolverError;

/// Resolves the subscription root fields into live [`Subscription`]s.
pub struct SubscriptionResolver<'a> {
    store: &'a Store,
}

impl<'a> SubscriptionResolver<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Lifecycle events of published posts.
    pub fn post(&self) -> Subscription {
        let subscription = self.store.subscribe_posts();
        tracing::debug!(subscription_id = subscription.id(), "post subscription opened");
        subscription
    }

    /// Comment events for one post. The post must exist and be published.
    pub fn comment(&self, post_id: &PostId) -> Result<Subscription, ResolverError> {
        let subscription = self.store.subscribe_comments(post_id)?;
        tracing::debug!(
            subscription_id = subscription.id(),
            post_id = %post_id,
            "comment subscription opened"
        );
        Ok(subscription)
    }
}
