//! Event routing.
//!
//! For each lifecycle event the router checks the category's enablement
//! toggle, builds the payload, resolves the entity's thread, delivers,
//! and binds the new thread handle when this was the entity's first send.
//! Settings are snapshotted once at dispatch start; a reload never takes
//! effect mid-event.
//!
//! Delivery failures are terminal for the notification but invisible to
//! the event source: [`EventRouter::dispatch`] logs and swallows every
//! error, so the triggering operation can never fail because a
//! notification did.

use crate::config::NotificationToggles;
use crate::error::NotifierResult;
use crate::events::{
    CustomerSnapshot, NotificationEvent, OrderSnapshot, PostSnapshot, ProductSnapshot,
    ReviewSnapshot,
};
use crate::format;
use crate::slack::{Category, SlackClient};
use crate::threads::{EntityKind, ThreadCorrelator};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Source of the per-category enablement toggles.
///
/// The router reads one snapshot per event; implementations may swap the
/// underlying settings between events.
pub trait SettingsSource: Send + Sync {
    fn toggles(&self) -> NotificationToggles;
}

/// Settings held in memory, replaceable at runtime
pub struct StaticSettings {
    toggles: RwLock<NotificationToggles>,
}

impl StaticSettings {
    pub fn new(toggles: NotificationToggles) -> Self {
        Self {
            toggles: RwLock::new(toggles),
        }
    }

    /// Replace the toggles; takes effect at the next dispatch
    pub fn replace(&self, toggles: NotificationToggles) {
        *self.toggles.write() = toggles;
    }
}

impl SettingsSource for StaticSettings {
    fn toggles(&self) -> NotificationToggles {
        self.toggles.read().clone()
    }
}

/// What happened to a dispatched event
#[derive(Debug)]
enum Outcome {
    Sent { ts: String },
    Skipped(&'static str),
}

/// Routes lifecycle events through the formatter, correlator, and client
pub struct EventRouter {
    settings: Arc<dyn SettingsSource>,
    correlator: ThreadCorrelator,
    client: SlackClient,
}

impl EventRouter {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        correlator: ThreadCorrelator,
        client: SlackClient,
    ) -> Self {
        Self {
            settings,
            correlator,
            client,
        }
    }

    /// Handle one event. Never fails: errors are logged and dropped.
    pub async fn dispatch(&self, event: NotificationEvent) {
        let kind = event.kind();
        match self.handle(event).await {
            Ok(Outcome::Sent { ts }) => {
                debug!(event = kind, ts = %ts, "notification delivered");
            }
            Ok(Outcome::Skipped(reason)) => {
                debug!(event = kind, reason, "notification skipped");
            }
            Err(e) => {
                warn!(event = kind, error = %e, "notification dropped");
            }
        }
    }

    /// Send the manual test message to the general channel
    pub async fn send_test_message(&self) -> NotifierResult<String> {
        let payload = format::test_message();
        self.client
            .send(&payload.text, &payload.blocks, None, Category::General)
            .await
    }

    async fn handle(&self, event: NotificationEvent) -> NotifierResult<Outcome> {
        let toggles = self.settings.toggles();

        match event {
            NotificationEvent::NewOrder { order } => self.new_order(&toggles, order).await,
            NotificationEvent::OrderStatusChanged {
                order,
                old_status,
                new_status,
            } => {
                self.order_status_changed(&toggles, order, &old_status, &new_status)
                    .await
            }
            NotificationEvent::LowStock { product } => {
                if !toggles.low_stock {
                    return Ok(Outcome::Skipped("category disabled"));
                }
                let payload = format::low_stock(&product);
                self.send_product_threaded(&product, payload, Category::Products)
                    .await
            }
            NotificationEvent::NoStock { product } => {
                if !toggles.no_stock {
                    return Ok(Outcome::Skipped("category disabled"));
                }
                let payload = format::no_stock(&product, toggles.show_product_notice);
                self.send_product_threaded(&product, payload, Category::Products)
                    .await
            }
            NotificationEvent::BackorderChanged {
                product,
                stock_status,
            } => {
                if !toggles.backorder {
                    return Ok(Outcome::Skipped("category disabled"));
                }
                if stock_status != "onbackorder" {
                    return Ok(Outcome::Skipped("not a backorder transition"));
                }
                let payload = format::backorder(&product);
                // Backorder alerts go to the orders channel but thread with
                // the product's other inventory messages
                self.send_product_threaded(&product, payload, Category::Orders)
                    .await
            }
            NotificationEvent::ProductChanged { product, created } => {
                self.product_changed(&toggles, product, created).await
            }
            NotificationEvent::StockSet { product } => self.stock_set(&toggles, product).await,
            NotificationEvent::AttributeChanged { product, .. } => {
                self.attribute_changed(&toggles, product).await
            }
            NotificationEvent::NewPost { post } => self.new_post(&toggles, post).await,
            NotificationEvent::NewCustomer { customer } => {
                self.new_customer(&toggles, customer).await
            }
            NotificationEvent::NewReview { review } => self.new_review(&toggles, review).await,
        }
    }

    /// New order: claim the idempotency marker before anything else, so a
    /// burst of lifecycle triggers for one order produces one send.
    async fn new_order(
        &self,
        toggles: &NotificationToggles,
        order: OrderSnapshot,
    ) -> NotifierResult<Outcome> {
        if !self.correlator.claim_order_notification(order.id).await? {
            return Ok(Outcome::Skipped("order already notified"));
        }
        if !toggles.new_order {
            return Ok(Outcome::Skipped("category disabled"));
        }

        if self
            .correlator
            .resolve_thread(EntityKind::Order, order.id)
            .await?
            .is_some()
        {
            return Ok(Outcome::Skipped("order thread already exists"));
        }

        let payload = format::new_order(&order);
        let ts = self
            .client
            .send(&payload.text, &payload.blocks, None, Category::Orders)
            .await?;
        self.correlator
            .bind_thread(EntityKind::Order, order.id, &ts)
            .await?;
        Ok(Outcome::Sent { ts })
    }

    /// Status changes always post as a new top-level message, never as a
    /// reply in the order's thread.
    async fn order_status_changed(
        &self,
        toggles: &NotificationToggles,
        order: OrderSnapshot,
        old_status: &str,
        new_status: &str,
    ) -> NotifierResult<Outcome> {
        if old_status == new_status {
            return Ok(Outcome::Skipped("status unchanged"));
        }
        if !toggles.status_change {
            return Ok(Outcome::Skipped("category disabled"));
        }

        let payload = format::order_status_changed(&order, old_status, new_status);
        let ts = self
            .client
            .send(&payload.text, &payload.blocks, None, Category::Orders)
            .await?;
        Ok(Outcome::Sent { ts })
    }

    async fn product_changed(
        &self,
        toggles: &NotificationToggles,
        product: ProductSnapshot,
        created: bool,
    ) -> NotifierResult<Outcome> {
        if !toggles.new_product {
            return Ok(Outcome::Skipped("category disabled"));
        }
        if !product.published {
            return Ok(Outcome::Skipped("product not published"));
        }

        let payload = format::product_changed(&product, created);
        self.send_product_threaded(&product, payload, Category::Products)
            .await
    }

    /// Missing-details check on stock set; always a top-level message
    async fn stock_set(
        &self,
        toggles: &NotificationToggles,
        product: ProductSnapshot,
    ) -> NotifierResult<Outcome> {
        if !toggles.missing_details {
            return Ok(Outcome::Skipped("category disabled"));
        }

        let mut missing = Vec::new();
        if !product.has_weight {
            missing.push("weight".to_string());
        }
        if !product.has_dimensions {
            missing.push("dimensions".to_string());
        }
        if missing.is_empty() {
            return Ok(Outcome::Skipped("product details complete"));
        }

        let payload = format::missing_details(&product, &missing);
        let ts = self
            .client
            .send(&payload.text, &payload.blocks, None, Category::Products)
            .await?;
        Ok(Outcome::Sent { ts })
    }

    /// Attribute changes share one suppression window per product, so a
    /// burst of near-simultaneous field updates yields one notification.
    async fn attribute_changed(
        &self,
        toggles: &NotificationToggles,
        product: ProductSnapshot,
    ) -> NotifierResult<Outcome> {
        if self
            .correlator
            .attribute_burst_suppressed(product.id)
            .await?
        {
            return Ok(Outcome::Skipped("within suppression window"));
        }
        if !toggles.new_product {
            return Ok(Outcome::Skipped("category disabled"));
        }
        if !product.published {
            return Ok(Outcome::Skipped("product not published"));
        }

        let payload = format::product_changed(&product, false);
        self.send_product_threaded(&product, payload, Category::Products)
            .await
    }

    async fn new_post(
        &self,
        toggles: &NotificationToggles,
        post: PostSnapshot,
    ) -> NotifierResult<Outcome> {
        if !toggles.new_post {
            return Ok(Outcome::Skipped("category disabled"));
        }
        let payload = format::new_post(&post);
        let ts = self
            .client
            .send(&payload.text, &payload.blocks, None, Category::General)
            .await?;
        Ok(Outcome::Sent { ts })
    }

    async fn new_customer(
        &self,
        toggles: &NotificationToggles,
        customer: CustomerSnapshot,
    ) -> NotifierResult<Outcome> {
        if !toggles.new_customer {
            return Ok(Outcome::Skipped("category disabled"));
        }
        if !customer.is_customer() {
            return Ok(Outcome::Skipped("not a customer account"));
        }
        let payload = format::new_customer(&customer);
        let ts = self
            .client
            .send(&payload.text, &payload.blocks, None, Category::General)
            .await?;
        Ok(Outcome::Sent { ts })
    }

    async fn new_review(
        &self,
        toggles: &NotificationToggles,
        review: ReviewSnapshot,
    ) -> NotifierResult<Outcome> {
        if !review.approved {
            return Ok(Outcome::Skipped("review not approved"));
        }
        if !toggles.new_review {
            return Ok(Outcome::Skipped("category disabled"));
        }
        let payload = format::new_review(&review);
        let ts = self
            .client
            .send(&payload.text, &payload.blocks, None, Category::Products)
            .await?;
        Ok(Outcome::Sent { ts })
    }

    /// Shared path for product-correlated sends: resolve the (parent)
    /// product's thread, deliver, and bind when this created the thread.
    async fn send_product_threaded(
        &self,
        product: &ProductSnapshot,
        payload: format::MessagePayload,
        category: Category,
    ) -> NotifierResult<Outcome> {
        let thread_id = ThreadCorrelator::product_thread_id(product);
        let existing = self
            .correlator
            .resolve_thread(EntityKind::Product, thread_id)
            .await?;

        let ts = self
            .client
            .send(
                &payload.text,
                &payload.blocks,
                existing.as_deref(),
                category,
            )
            .await?;

        if existing.is_none() {
            self.correlator
                .bind_thread(EntityKind::Product, thread_id, &ts)
                .await?;
        }
        Ok(Outcome::Sent { ts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelConfig, SlackConfig};
    use crate::store::MemoryMetaStore;
    use serde_json::json;

    /// Router pointed at an unroutable address; any network attempt fails,
    /// so reaching the client at all turns the outcome into an error.
    fn offline_router(toggles: NotificationToggles) -> EventRouter {
        let slack = SlackConfig {
            token: "xoxb-test".to_string(),
            api_base_url: "http://127.0.0.1:9".to_string(),
        };
        let channels = ChannelConfig {
            orders: "C-ORDERS".to_string(),
            products: "C-PRODUCTS".to_string(),
            general: "C-GENERAL".to_string(),
        };
        EventRouter::new(
            Arc::new(StaticSettings::new(toggles)),
            ThreadCorrelator::new(Arc::new(MemoryMetaStore::new()), "wsn:"),
            SlackClient::new(reqwest::Client::new(), &slack, &channels),
        )
    }

    fn order(id: u64) -> OrderSnapshot {
        serde_json::from_value(json!({"id": id})).unwrap()
    }

    fn product(id: u64) -> ProductSnapshot {
        serde_json::from_value(json!({"id": id, "name": "Desk"})).unwrap()
    }

    #[tokio::test]
    async fn test_unchanged_status_skipped_before_delivery() {
        let router = offline_router(NotificationToggles::default());
        let outcome = router
            .order_status_changed(
                &NotificationToggles::default(),
                order(1),
                "processing",
                "processing",
            )
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped("status unchanged")));
    }

    #[tokio::test]
    async fn test_disabled_category_skipped_before_delivery() {
        let toggles = NotificationToggles {
            low_stock: false,
            ..NotificationToggles::default()
        };
        let router = offline_router(toggles.clone());
        let outcome = router
            .handle(NotificationEvent::LowStock {
                product: product(7),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped("category disabled")));
    }

    #[tokio::test]
    async fn test_non_customer_registration_skipped() {
        let router = offline_router(NotificationToggles::default());
        let customer: CustomerSnapshot = serde_json::from_value(json!({
            "id": 1, "username": "admin2", "roles": ["administrator"]
        }))
        .unwrap();
        let outcome = router
            .handle(NotificationEvent::NewCustomer { customer })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped("not a customer account")));
    }

    #[tokio::test]
    async fn test_unapproved_review_skipped() {
        let router = offline_router(NotificationToggles::default());
        let review: ReviewSnapshot = serde_json::from_value(json!({
            "id": 4, "author": "sam", "content": "ok", "approved": false
        }))
        .unwrap();
        let outcome = router
            .handle(NotificationEvent::NewReview { review })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped("review not approved")));
    }

    #[tokio::test]
    async fn test_complete_details_skipped() {
        let router = offline_router(NotificationToggles::default());
        let mut product = product(7);
        product.has_weight = true;
        product.has_dimensions = true;
        let outcome = router
            .handle(NotificationEvent::StockSet { product })
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            Outcome::Skipped("product details complete")
        ));
    }

    #[tokio::test]
    async fn test_non_backorder_transition_skipped() {
        let router = offline_router(NotificationToggles::default());
        let outcome = router
            .handle(NotificationEvent::BackorderChanged {
                product: product(7),
                stock_status: "instock".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            Outcome::Skipped("not a backorder transition")
        ));
    }

    #[tokio::test]
    async fn test_duplicate_new_order_skipped_without_delivery() {
        let router = offline_router(NotificationToggles::default());
        // First dispatch claims the marker, then fails at the socket
        let result = router
            .handle(NotificationEvent::NewOrder { order: order(1001) })
            .await;
        assert!(result.is_err());

        // Second dispatch is stopped by the marker before the client
        let outcome = router
            .handle(NotificationEvent::NewOrder { order: order(1001) })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped("order already notified")));
    }

    #[tokio::test]
    async fn test_settings_swap_applies_to_next_dispatch() {
        let settings = Arc::new(StaticSettings::new(NotificationToggles::default()));
        let slack = SlackConfig {
            token: "xoxb-test".to_string(),
            api_base_url: "http://127.0.0.1:9".to_string(),
        };
        let channels = ChannelConfig {
            orders: "C-ORDERS".to_string(),
            products: "C-PRODUCTS".to_string(),
            general: "C-GENERAL".to_string(),
        };
        let router = EventRouter::new(
            settings.clone(),
            ThreadCorrelator::new(Arc::new(MemoryMetaStore::new()), "wsn:"),
            SlackClient::new(reqwest::Client::new(), &slack, &channels),
        );

        settings.replace(NotificationToggles {
            low_stock: false,
            ..NotificationToggles::default()
        });
        let outcome = router
            .handle(NotificationEvent::LowStock {
                product: product(7),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped("category disabled")));
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let router = offline_router(NotificationToggles::default());
        // The network call fails, but dispatch must not surface it
        router
            .dispatch(NotificationEvent::NewPost {
                post: serde_json::from_value(json!({"id": 1, "title": "Hello"})).unwrap(),
            })
            .await;
    }
}
