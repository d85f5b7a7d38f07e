//! Service wiring and lifecycle.
//!
//! [`NotifierService::new`] validates configuration and assembles the
//! store, correlator, client, and router; [`NotifierService::start`]
//! binds the HTTP listener and serves until SIGINT or SIGTERM.

use crate::config::NotifierConfig;
use crate::error::{NotifierError, NotifierResult};
use crate::handlers;
use crate::router::{EventRouter, StaticSettings};
use crate::slack::SlackClient;
use crate::store::{MemoryMetaStore, MetaStore, RedisMetaStore};
use crate::threads::ThreadCorrelator;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state handed to every handler
pub struct AppState {
    pub config: NotifierConfig,
    pub router: EventRouter,
}

/// The notification service
pub struct NotifierService {
    config: NotifierConfig,
    state: Arc<AppState>,
}

impl NotifierService {
    /// Assemble the service from validated configuration
    pub async fn new(config: NotifierConfig) -> NotifierResult<Self> {
        config.validate().map_err(NotifierError::configuration)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.server.request_timeout))
            .user_agent(format!("{}/{}", crate::SERVICE_NAME, crate::VERSION))
            .build()?;

        let store: Arc<dyn MetaStore> = if config.redis.url.is_empty() {
            warn!("no Redis URL configured, correlation state is in-memory and per-process");
            Arc::new(MemoryMetaStore::new())
        } else {
            let store = RedisMetaStore::connect(&config.redis.url).await?;
            info!("connected to Redis");
            Arc::new(store)
        };

        let correlator = ThreadCorrelator::new(store, config.redis.key_prefix.clone());
        let client = SlackClient::new(http, &config.slack, &config.channels);
        let settings = Arc::new(StaticSettings::new(config.notifications.clone()));
        let router = EventRouter::new(settings, correlator, client);

        let state = Arc::new(AppState {
            config: config.clone(),
            router,
        });

        Ok(Self { config, state })
    }

    /// Serve until shutdown is requested
    pub async fn start(self) -> NotifierResult<()> {
        let app = build_app(self.state);

        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| NotifierError::internal(format!("failed to bind {addr}: {e}")))?;

        info!(address = %addr, "notification service listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| NotifierError::internal(format!("server error: {e}")))?;

        info!("notification service stopped");
        Ok(())
    }
}

/// Assemble the HTTP application over shared state
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/events", post(handlers::ingest_event))
        .route("/test", post(handlers::send_test))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .unwrap_or_else(|e| warn!(error = %e, "failed to install Ctrl+C handler"));
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
