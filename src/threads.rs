//! Thread correlation and deduplication.
//!
//! Maps a domain entity to the Slack thread it already owns, so related
//! events render as replies in one conversation. Per entity the lifecycle
//! is Unbound → Bound(handle), terminal once bound: `bind_thread` is a
//! first-writer-wins no-op when a binding exists, and bindings are never
//! deleted. The correlator also owns the two dedup markers: the one-shot
//! new-order claim and the short-lived attribute-burst suppression window.

use crate::error::NotifierResult;
use crate::events::ProductSnapshot;
use crate::store::MetaStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default suppression window for attribute-change bursts
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_secs(60);

/// Entity kinds that participate in thread correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Order,
    Product,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Order => "order",
            EntityKind::Product => "product",
        }
    }
}

/// Resolves and persists thread handles and dedup markers
pub struct ThreadCorrelator {
    store: Arc<dyn MetaStore>,
    key_prefix: String,
    suppression_window: Duration,
}

impl ThreadCorrelator {
    pub fn new(store: Arc<dyn MetaStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            suppression_window: DEFAULT_SUPPRESSION_WINDOW,
        }
    }

    /// Override the suppression window (tests use short windows)
    pub fn with_suppression_window(mut self, window: Duration) -> Self {
        self.suppression_window = window;
        self
    }

    fn thread_key(&self, kind: EntityKind, id: u64) -> String {
        format!("{}thread:{}:{id}", self.key_prefix, kind.as_str())
    }

    fn notified_key(&self, order_id: u64) -> String {
        format!("{}notified:order:{order_id}", self.key_prefix)
    }

    fn suppress_key(&self, product_id: u64) -> String {
        format!("{}suppress:product:{product_id}", self.key_prefix)
    }

    /// The correlation id a product threads under: variations share their
    /// parent's thread
    pub fn product_thread_id(product: &ProductSnapshot) -> u64 {
        product.parent_id.unwrap_or(product.id)
    }

    /// Look up the thread handle bound to an entity, if any
    pub async fn resolve_thread(
        &self,
        kind: EntityKind,
        id: u64,
    ) -> NotifierResult<Option<String>> {
        self.store.get(&self.thread_key(kind, id)).await
    }

    /// Bind a thread handle to an entity. First writer wins; a lost race
    /// or an existing binding is a silent no-op.
    pub async fn bind_thread(
        &self,
        kind: EntityKind,
        id: u64,
        handle: &str,
    ) -> NotifierResult<()> {
        let written = self
            .store
            .put_if_absent(&self.thread_key(kind, id), handle)
            .await?;
        if !written {
            debug!(
                entity_kind = kind.as_str(),
                entity_id = id,
                "thread binding already exists, keeping the first"
            );
        }
        Ok(())
    }

    /// Claim the one-shot new-order notification marker.
    ///
    /// Set atomically with a timestamp before any network call; returns
    /// `false` when another lifecycle trigger already claimed this order.
    pub async fn claim_order_notification(&self, order_id: u64) -> NotifierResult<bool> {
        let stamp = chrono::Utc::now().timestamp().to_string();
        self.store
            .put_if_absent(&self.notified_key(order_id), &stamp)
            .await
    }

    /// Check the attribute-burst suppression marker for a product, arming
    /// it when absent. Returns `true` when the event should be suppressed.
    pub async fn attribute_burst_suppressed(&self, product_id: u64) -> NotifierResult<bool> {
        let key = self.suppress_key(product_id);
        if self.store.exists(&key).await? {
            return Ok(true);
        }
        self.store
            .put_with_ttl(&key, "1", self.suppression_window)
            .await?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryMetaStore;
    use serde_json::json;

    fn correlator() -> ThreadCorrelator {
        ThreadCorrelator::new(Arc::new(MemoryMetaStore::new()), "wsn:")
    }

    #[tokio::test]
    async fn test_resolve_unbound_entity() {
        let correlator = correlator();
        let thread = correlator
            .resolve_thread(EntityKind::Order, 42)
            .await
            .unwrap();
        assert_eq!(thread, None);
    }

    #[tokio::test]
    async fn test_bind_then_resolve() {
        let correlator = correlator();
        correlator
            .bind_thread(EntityKind::Product, 7, "1609459200.000100")
            .await
            .unwrap();
        let thread = correlator
            .resolve_thread(EntityKind::Product, 7)
            .await
            .unwrap();
        assert_eq!(thread, Some("1609459200.000100".to_string()));
    }

    #[tokio::test]
    async fn test_binding_never_overwritten() {
        let correlator = correlator();
        correlator
            .bind_thread(EntityKind::Order, 9, "first.ts")
            .await
            .unwrap();
        correlator
            .bind_thread(EntityKind::Order, 9, "second.ts")
            .await
            .unwrap();
        let thread = correlator.resolve_thread(EntityKind::Order, 9).await.unwrap();
        assert_eq!(thread, Some("first.ts".to_string()));
    }

    #[tokio::test]
    async fn test_kinds_do_not_collide() {
        let correlator = correlator();
        correlator
            .bind_thread(EntityKind::Order, 5, "order.ts")
            .await
            .unwrap();
        let thread = correlator
            .resolve_thread(EntityKind::Product, 5)
            .await
            .unwrap();
        assert_eq!(thread, None);
    }

    #[tokio::test]
    async fn test_order_claim_is_one_shot() {
        let correlator = correlator();
        assert!(correlator.claim_order_notification(1001).await.unwrap());
        assert!(!correlator.claim_order_notification(1001).await.unwrap());
        // A different order is unaffected
        assert!(correlator.claim_order_notification(1002).await.unwrap());
    }

    #[tokio::test]
    async fn test_variation_resolves_to_parent() {
        let parent: ProductSnapshot = serde_json::from_value(json!({"id": 3})).unwrap();
        let variation: ProductSnapshot =
            serde_json::from_value(json!({"id": 9, "parent_id": 3})).unwrap();

        assert_eq!(ThreadCorrelator::product_thread_id(&parent), 3);
        assert_eq!(ThreadCorrelator::product_thread_id(&variation), 3);
    }

    #[tokio::test]
    async fn test_suppression_window() {
        let correlator = ThreadCorrelator::new(Arc::new(MemoryMetaStore::new()), "wsn:")
            .with_suppression_window(Duration::from_millis(50));

        // First event arms the marker, second is suppressed
        assert!(!correlator.attribute_burst_suppressed(7).await.unwrap());
        assert!(correlator.attribute_burst_suppressed(7).await.unwrap());

        // After the window expires the next event passes again
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!correlator.attribute_burst_suppressed(7).await.unwrap());
    }
}
