//! WooCommerce to Slack notification service.
//!
//! Translates store lifecycle events (orders, inventory, catalog edits,
//! reviews, posts, registrations) into formatted Slack messages,
//! correlates related events into per-entity threads, and delivers them
//! fire-and-forget through the Slack Web API.
//!
//! # Architecture
//!
//! - **Event intake** ([`handlers`]): HTTP endpoint accepting typed
//!   lifecycle events
//! - **Router** ([`router`]): enablement checks, deduplication, and the
//!   per-event delivery flow
//! - **Formatter** ([`format`]): event snapshots to Block Kit payloads
//! - **Correlator** ([`threads`]): per-entity thread bindings and dedup
//!   markers over a pluggable [`store::MetaStore`]
//! - **Client** ([`slack`]): `chat.postMessage` delivery

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod handlers;
pub mod router;
pub mod service;
pub mod slack;
pub mod store;
pub mod threads;

pub use config::NotifierConfig;
pub use error::{NotifierError, NotifierResult};
pub use events::NotificationEvent;
pub use router::EventRouter;
pub use service::NotifierService;

use serde::{Deserialize, Serialize};

/// Service version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name used in logs and the HTTP user agent
pub const SERVICE_NAME: &str = "woo-slack-notifier";

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub service: String,
    pub version: String,
    /// Whether a token and at least one channel are configured
    pub delivery_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert_eq!(SERVICE_NAME, "woo-slack-notifier");
    }
}
