//! Notification service entry point.

use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use woo_slack_notifier::{NotifierConfig, NotifierService, SERVICE_NAME, VERSION};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WSN_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info,woo_slack_notifier=debug"));

    let format = env::var("WSN_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    match format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

fn log_enabled_categories(config: &NotifierConfig) {
    let toggles = &config.notifications;
    let enabled: Vec<&str> = [
        ("new_order", toggles.new_order),
        ("status_change", toggles.status_change),
        ("low_stock", toggles.low_stock),
        ("no_stock", toggles.no_stock),
        ("backorder", toggles.backorder),
        ("new_product", toggles.new_product),
        ("missing_details", toggles.missing_details),
        ("new_review", toggles.new_review),
        ("new_post", toggles.new_post),
        ("new_customer", toggles.new_customer),
    ]
    .iter()
    .filter(|(_, on)| *on)
    .map(|(name, _)| *name)
    .collect();

    info!(enabled = ?enabled, "notification categories");

    if !config.delivery_configured() {
        info!("Slack delivery not configured, all sends will be dropped");
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    info!(version = VERSION, "starting {SERVICE_NAME}");

    let config = match NotifierConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    log_enabled_categories(&config);

    let service = match NotifierService::new(config).await {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "failed to initialize service");
            std::process::exit(1);
        }
    };

    if let Err(e) = service.start().await {
        error!(error = %e, "service terminated with error");
        std::process::exit(1);
    }
}
