use crate::types::push::Subscription;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory registry of push subscriptions, keyed by endpoint and kept in
/// insertion order. Nothing survives a restart; clients re-register on their
/// next page load.
#[derive(Debug, Default)]
pub struct SubscriptionStore {
    entries: Mutex<Vec<Subscription>>,
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, endpoint: &str) -> bool {
        self.entries()
            .iter()
            .any(|subscription| subscription.endpoint == endpoint)
    }

    /// Stores `subscription` unless its endpoint is already known. The check
    /// and the insert share one critical section. Returns `true` when the
    /// subscription was inserted.
    pub fn add(&self, subscription: Subscription) -> bool {
        let mut entries = self.entries();
        if entries
            .iter()
            .any(|existing| existing.endpoint == subscription.endpoint)
        {
            return false;
        }
        entries.push(subscription);
        true
    }

    pub fn get(&self, endpoint: &str) -> Option<Subscription> {
        self.entries()
            .iter()
            .find(|subscription| subscription.endpoint == endpoint)
            .cloned()
    }

    pub fn all(&self) -> Vec<Subscription> {
        self.entries().clone()
    }

    pub fn remove(&self, endpoint: &str) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|subscription| subscription.endpoint != endpoint);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Subscription>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
