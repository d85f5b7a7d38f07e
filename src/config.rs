//! Configuration for the Slack notifier service.
//!
//! Settings are loaded from environment variables with the `WSN_` prefix,
//! optionally merged with a config file named by `WSN_CONFIG_FILE`. The
//! delivery target (bot token plus one channel per category) and the
//! per-category enablement toggles live here; components receive their
//! slice of the configuration at construction.

use serde::{Deserialize, Serialize};
use url::Url;

/// Main configuration structure for the notifier service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Redis configuration for correlation state
    pub redis: RedisConfig,
    /// Slack delivery configuration
    pub slack: SlackConfig,
    /// Destination channel per notification category
    pub channels: ChannelConfig,
    /// Per-category enablement toggles
    pub notifications: NotificationToggles,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 8010)
    pub port: u16,
    /// Outbound request timeout in seconds (default: 30)
    pub request_timeout: u64,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL; empty string disables Redis and the service
    /// falls back to an in-process store
    pub url: String,
    /// Key prefix for all correlation keys
    pub key_prefix: String,
}

/// Slack delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Slack bot token (xoxb-); blank means delivery is unconfigured
    pub token: String,
    /// Slack API base URL
    pub api_base_url: String,
}

/// One destination channel id per notification category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel for order notifications
    pub orders: String,
    /// Channel for product and inventory notifications
    pub products: String,
    /// Channel for general notifications (posts, customers, tests)
    pub general: String,
}

/// Enablement flag per notification kind.
///
/// A disabled kind is a silent no-op: no formatting, no correlation
/// lookups, no network calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationToggles {
    pub new_order: bool,
    pub status_change: bool,
    pub low_stock: bool,
    pub no_stock: bool,
    pub backorder: bool,
    pub new_product: bool,
    /// Prepend the "Inventory Alert" notice block to out-of-stock messages
    pub show_product_notice: bool,
    pub missing_details: bool,
    pub new_review: bool,
    pub new_post: bool,
    pub new_customer: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            redis: RedisConfig::default(),
            slack: SlackConfig::default(),
            channels: ChannelConfig::default(),
            notifications: NotificationToggles::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8010,
            request_timeout: 30,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key_prefix: "wsn:".to_string(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base_url: "https://slack.com/api".to_string(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            orders: String::new(),
            products: String::new(),
            general: String::new(),
        }
    }
}

impl Default for NotificationToggles {
    fn default() -> Self {
        Self {
            new_order: true,
            status_change: true,
            low_stock: true,
            no_stock: true,
            backorder: true,
            new_product: true,
            show_product_notice: false,
            missing_details: true,
            new_review: true,
            new_post: true,
            new_customer: true,
        }
    }
}

impl NotifierConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut cfg = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8010)?
            .set_default("server.request_timeout", 30)?
            .set_default("redis.url", "")?
            .set_default("redis.key_prefix", "wsn:")?
            .set_default("slack.token", "")?
            .set_default("slack.api_base_url", "https://slack.com/api")?
            .set_default("channels.orders", "")?
            .set_default("channels.products", "")?
            .set_default("channels.general", "")?
            .set_default("notifications.new_order", true)?
            .set_default("notifications.status_change", true)?
            .set_default("notifications.low_stock", true)?
            .set_default("notifications.no_stock", true)?
            .set_default("notifications.backorder", true)?
            .set_default("notifications.new_product", true)?
            .set_default("notifications.show_product_notice", false)?
            .set_default("notifications.missing_details", true)?
            .set_default("notifications.new_review", true)?
            .set_default("notifications.new_post", true)?
            .set_default("notifications.new_customer", true)?
            // The "_" separator means env vars can only address keys whose
            // final segment is a single word (WSN_SLACK_TOKEN,
            // WSN_CHANNELS_ORDERS, WSN_REDIS_URL). Underscore-bearing keys
            // like the notification toggles are set via WSN_CONFIG_FILE.
            .add_source(config::Environment::with_prefix("WSN").separator("_"));

        // Load from optional config file
        if let Ok(config_path) = std::env::var("WSN_CONFIG_FILE") {
            cfg = cfg.add_source(config::File::with_name(&config_path).required(false));
        }

        cfg.build()?.try_deserialize()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        Url::parse(&self.slack.api_base_url)
            .map_err(|e| format!("Invalid Slack API base URL: {e}"))?;

        if !self.redis.url.is_empty() {
            Url::parse(&self.redis.url).map_err(|e| format!("Invalid Redis URL: {e}"))?;
        }

        Ok(())
    }

    /// True when the delivery target is usable for at least one category
    pub fn delivery_configured(&self) -> bool {
        !self.slack.token.trim().is_empty()
            && (!self.channels.orders.trim().is_empty()
                || !self.channels.products.trim().is_empty()
                || !self.channels.general.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NotifierConfig::default();
        assert_eq!(config.server.port, 8010);
        assert_eq!(config.slack.api_base_url, "https://slack.com/api");
        assert!(config.notifications.new_order);
        assert!(!config.notifications.show_product_notice);
        assert!(!config.delivery_configured());
    }

    #[test]
    fn test_config_validation() {
        let mut config = NotifierConfig::default();
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());
        config.server.port = 8010;

        config.slack.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
        config.slack.api_base_url = "https://slack.com/api".to_string();

        config.redis.url = "redis://localhost:6379".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_sets_underscore_keys() {
        let dir = std::env::temp_dir().join("wsn-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("notifier.toml");
        std::fs::write(
            &path,
            "[notifications]\nnew_product = false\n\n[redis]\nkey_prefix = \"shop-a:\"\n",
        )
        .unwrap();

        std::env::set_var("WSN_CONFIG_FILE", path.to_str().unwrap());
        let config = NotifierConfig::from_env().unwrap();
        std::env::remove_var("WSN_CONFIG_FILE");

        assert!(!config.notifications.new_product);
        assert_eq!(config.redis.key_prefix, "shop-a:");
        // Untouched keys keep their defaults
        assert!(config.notifications.new_order);
        assert_eq!(config.server.port, 8010);
    }

    #[test]
    fn test_delivery_configured() {
        let mut config = NotifierConfig::default();
        config.slack.token = "xoxb-test".to_string();
        assert!(!config.delivery_configured());

        config.channels.general = "C123".to_string();
        assert!(config.delivery_configured());
    }
}
