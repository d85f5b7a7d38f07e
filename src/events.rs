//! Domain event model.
//!
//! A [`NotificationEvent`] is the typed form of one storefront lifecycle
//! callback: the hook glue on the platform side posts these as tagged JSON
//! bodies. Each variant carries a snapshot of the source entity with every
//! field the formatter needs, so handling an event requires no further
//! lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A storefront lifecycle event, tagged by kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// An order was placed (may fire from several lifecycle hooks)
    NewOrder { order: OrderSnapshot },
    /// An order moved between statuses
    OrderStatusChanged {
        order: OrderSnapshot,
        old_status: String,
        new_status: String,
    },
    /// A product crossed its low-stock threshold
    LowStock { product: ProductSnapshot },
    /// A product ran out of stock
    NoStock { product: ProductSnapshot },
    /// A product's stock status changed (backorder detection)
    BackorderChanged {
        product: ProductSnapshot,
        stock_status: String,
    },
    /// A product was published or updated (including variations)
    ProductChanged {
        product: ProductSnapshot,
        created: bool,
    },
    /// A product's stock level was set; drives the missing-details check
    StockSet { product: ProductSnapshot },
    /// A pricing or inventory attribute changed on a product
    AttributeChanged {
        product: ProductSnapshot,
        attribute: String,
    },
    /// A blog post was published
    NewPost { post: PostSnapshot },
    /// A new customer account was registered
    NewCustomer { customer: CustomerSnapshot },
    /// A product review was submitted
    NewReview { review: ReviewSnapshot },
}

impl NotificationEvent {
    /// Stable kind name, used for logging and dispatch summaries
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::NewOrder { .. } => "new_order",
            NotificationEvent::OrderStatusChanged { .. } => "order_status_changed",
            NotificationEvent::LowStock { .. } => "low_stock",
            NotificationEvent::NoStock { .. } => "no_stock",
            NotificationEvent::BackorderChanged { .. } => "backorder_changed",
            NotificationEvent::ProductChanged { .. } => "product_changed",
            NotificationEvent::StockSet { .. } => "stock_set",
            NotificationEvent::AttributeChanged { .. } => "attribute_changed",
            NotificationEvent::NewPost { .. } => "new_post",
            NotificationEvent::NewCustomer { .. } => "new_customer",
            NotificationEvent::NewReview { .. } => "new_review",
        }
    }
}

/// One order line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
    pub total: f64,
}

/// Snapshot of an order at event time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: u64,
    /// Display order number; usually the id, but plugins can override it
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub shipping_total: f64,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Formatted billing address; may contain `<br>` markup
    #[serde(default)]
    pub billing_address: String,
    /// Formatted shipping address; empty when shipping equals billing
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub coupon_codes: Vec<String>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    /// Customer-entered order notes; may contain markup
    #[serde(default)]
    pub customer_notes: Vec<String>,
    /// Link to the order's admin edit screen
    #[serde(default)]
    pub admin_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Snapshot of a product (or product variation) at event time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: u64,
    /// Parent product id when this snapshot is a variation
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub name: String,
    /// Attribute summary for variations, e.g. "Blue / XL"
    #[serde(default)]
    pub variation_label: Option<String>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub edit_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub has_weight: bool,
    #[serde(default)]
    pub has_dimensions: bool,
    #[serde(default = "default_true")]
    pub published: bool,
}

impl ProductSnapshot {
    /// True when this snapshot is a variation of a parent product
    pub fn is_variation(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Display title; variations render as "Parent – Attributes"
    pub fn display_name(&self) -> String {
        match &self.variation_label {
            Some(label) if !label.is_empty() => format!("{} – {}", self.name, label),
            _ => self.name.clone(),
        }
    }
}

/// Snapshot of a published blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSnapshot {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub permalink: String,
}

/// Snapshot of a newly registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl CustomerSnapshot {
    /// Only accounts carrying the `customer` role trigger notifications
    pub fn is_customer(&self) -> bool {
        self.roles.iter().any(|r| r == "customer")
    }
}

/// Snapshot of a product review comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    pub id: u64,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_permalink: String,
    #[serde(default)]
    pub author: String,
    /// Review body; may contain markup
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub approved: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_event_deserialization() {
        let body = json!({
            "type": "new_review",
            "review": {
                "id": 42,
                "product_name": "Walnut Desk",
                "author": "jane",
                "content": "Great desk",
                "approved": true
            }
        });

        let event: NotificationEvent = serde_json::from_value(body).unwrap();
        assert_eq!(event.kind(), "new_review");
        match event {
            NotificationEvent::NewReview { review } => {
                assert_eq!(review.product_name, "Walnut Desk");
                assert!(review.approved);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_product_snapshot_defaults() {
        let product: ProductSnapshot = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(product.id, 7);
        assert!(product.published);
        assert!(!product.is_variation());
        assert_eq!(product.currency, "USD");
    }

    #[test]
    fn test_variation_display_name() {
        let product = ProductSnapshot {
            parent_id: Some(3),
            name: "Hoodie".to_string(),
            variation_label: Some("Blue / XL".to_string()),
            ..serde_json::from_value(serde_json::json!({"id": 9})).unwrap()
        };
        assert!(product.is_variation());
        assert_eq!(product.display_name(), "Hoodie – Blue / XL");
    }

    #[test]
    fn test_customer_role_check() {
        let customer = CustomerSnapshot {
            id: 1,
            username: "sam".to_string(),
            email: "sam@example.com".to_string(),
            roles: vec!["subscriber".to_string()],
        };
        assert!(!customer.is_customer());
    }

    #[test]
    fn test_unknown_event_type_rejected() {
        let body = json!({"type": "order_deleted", "order": {"id": 1}});
        assert!(serde_json::from_value::<NotificationEvent>(body).is_err());
    }
}
