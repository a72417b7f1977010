//! Field-resolution context.

use std::sync::Arc;

use postboard_core::{SharedBus, SharedStore, Store};

use crate::resolvers::{FieldResolver, MutationResolver, QueryResolver, SubscriptionResolver};

/// Per-request context handed to every resolver.
///
/// Cloning is cheap; every clone shares the same store and bus.
#[derive(Clone)]
pub struct Context {
    store: SharedStore,
}

impl Context {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Context over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(Store::in_memory()))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn bus(&self) -> &SharedBus {
        self.store.bus()
    }

    pub fn query(&self) -> QueryResolver<'_> {
        QueryResolver::new(&self.store)
    }

    pub fn mutation(&self) -> MutationResolver<'_> {
        MutationResolver::new(&self.store)
    }

    pub fn subscription(&self) -> SubscriptionResolver<'_> {
        SubscriptionResolver::new(&self.store)
    }

    pub fn fields(&self) -> FieldResolver<'_> {
        FieldResolver::new(&self.store)
    }
}
